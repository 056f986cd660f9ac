// Archivo: query_builder.rs
// Propósito: convertir `FilterCriteria` en SQL parametrizado. El texto SQL se
// arma solo con fragmentos fijos, la lista de columnas permitidas y las dos
// direcciones de orden; cada valor del cliente viaja como parámetro.
use crate::filter_criteria::FilterCriteria;

/// Dialecto SQL del almacén que ejecutará la consulta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
  Postgres,
  Sqlite,
}

/// Valor ligado a un placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
  Text(String),
  Float(f64),
  BigInt(i64),
  /// Conjunto de textos enviado como un único parámetro (`text[]` en
  /// Postgres, arreglo JSON en SQLite).
  TextSet(Vec<String>),
}

/// Consulta lista para ejecutar: texto SQL y parámetros en orden de
/// placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
  pub sql: String,
  pub params: Vec<QueryParam>,
}

const LIST_SELECT: &str = "SELECT m.chembl_id AS chembl_id, m.pref_name AS pref_name, m.molecule_type AS \
                           molecule_type, CAST(m.max_phase AS DOUBLE PRECISION) AS max_phase, CAST(p.full_mwt AS \
                           DOUBLE PRECISION) AS full_mwt, CAST(p.alogp AS DOUBLE PRECISION) AS alogp, CAST(p.hbd AS \
                           INTEGER) AS hbd, CAST(p.hba AS INTEGER) AS hba";
const LIST_FROM: &str = " FROM molecule_dictionary m JOIN compound_properties p ON m.molregno = p.molregno WHERE 1=1";
const DETAIL_FROM: &str = ", s.canonical_smiles AS canonical_smiles FROM molecule_dictionary m JOIN \
                           compound_properties p ON m.molregno = p.molregno JOIN compound_structures s ON m.molregno \
                           = s.molregno";
const AGGREGATE_SQL: &str = "SELECT m.molecule_type AS molecule_type, COUNT(*) AS count FROM molecule_dictionary m \
                             GROUP BY m.molecule_type ORDER BY m.molecule_type";

/// Acumula parámetros y devuelve el placeholder del dialecto.
struct ParamWriter {
  dialect: SqlDialect,
  params: Vec<QueryParam>,
}

impl ParamWriter {
  fn new(dialect: SqlDialect) -> Self {
    Self { dialect,
           params: Vec::new() }
  }

  fn push(&mut self, param: QueryParam) -> String {
    self.params.push(param);
    match self.dialect {
      SqlDialect::Postgres => format!("${}", self.params.len()),
      SqlDialect::Sqlite => "?".to_string(),
    }
  }
}

/// Constructor de consultas sin estado.
#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder {
  dialect: SqlDialect,
}

impl QueryBuilder {
  pub fn new(dialect: SqlDialect) -> Self {
    Self { dialect }
  }

  pub fn dialect(&self) -> SqlDialect {
    self.dialect
  }

  /// Consulta del listado. Los filtros activos se añaden siempre en el mismo
  /// orden: nombre, peso mínimo, peso máximo, tipos; luego ORDER BY y
  /// LIMIT/OFFSET como últimos dos parámetros.
  pub fn list_query(&self, criteria: &FilterCriteria) -> BuiltQuery {
    let mut w = ParamWriter::new(self.dialect);
    let mut sql = String::with_capacity(512);
    sql.push_str(LIST_SELECT);
    sql.push_str(LIST_FROM);

    if let Some(name) = criteria.name_substring.as_deref() {
      let pattern = format!("%{}%", name);
      let like = self.case_insensitive_like();
      let a = w.push(QueryParam::Text(pattern.clone()));
      let b = w.push(QueryParam::Text(pattern));
      sql.push_str(&format!(" AND (m.pref_name {like} {a} OR m.chembl_id {like} {b})"));
    }
    if let Some(min) = criteria.min_weight {
      let ph = w.push(QueryParam::Float(min));
      sql.push_str(&format!(" AND p.full_mwt >= {ph}"));
    }
    if let Some(max) = criteria.max_weight {
      let ph = w.push(QueryParam::Float(max));
      sql.push_str(&format!(" AND p.full_mwt <= {ph}"));
    }
    if !criteria.molecule_types.is_empty() {
      let ph = w.push(QueryParam::TextSet(criteria.molecule_types.iter().cloned().collect()));
      match self.dialect {
        SqlDialect::Postgres => sql.push_str(&format!(" AND m.molecule_type = ANY({ph})")),
        SqlDialect::Sqlite => sql.push_str(&format!(" AND m.molecule_type IN (SELECT value FROM json_each({ph}))")),
      }
    }

    sql.push_str(" ORDER BY ");
    sql.push_str(criteria.sort_column.qualified());
    sql.push(' ');
    sql.push_str(criteria.sort_direction.as_sql());

    let limit = w.push(QueryParam::BigInt(criteria.limit()));
    let offset = w.push(QueryParam::BigInt(criteria.offset()));
    sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}"));

    BuiltQuery { sql,
                 params: w.params }
  }

  /// Búsqueda exacta por `chembl_id` incluyendo la estructura.
  pub fn detail_query(&self, chembl_id: &str) -> BuiltQuery {
    let mut w = ParamWriter::new(self.dialect);
    let ph = w.push(QueryParam::Text(chembl_id.to_string()));
    let sql = format!("{LIST_SELECT}{DETAIL_FROM} WHERE m.chembl_id = {ph}");
    BuiltQuery { sql,
                 params: w.params }
  }

  /// Conteo de compuestos agrupado por tipo de molécula.
  pub fn aggregate_query(&self) -> BuiltQuery {
    BuiltQuery { sql: AGGREGATE_SQL.to_string(),
                 params: Vec::new() }
  }

  fn case_insensitive_like(&self) -> &'static str {
    match self.dialect {
      SqlDialect::Postgres => "ILIKE",
      // LIKE en SQLite ya ignora mayúsculas para ASCII.
      SqlDialect::Sqlite => "LIKE",
    }
  }
}
