use crate::schema;
use chem_catalog::{BuiltQuery, CatalogError, CatalogStore, CompoundDetail, CompoundSummary, QueryParam, Result,
                   SqlDialect, TypeCount};
#[cfg(feature = "pg")]
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_builder::{BoxedSqlQuery, SqlQuery};
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::result::Error as DieselError;
use diesel::sql_types::{BigInt, Double, Integer, Nullable, Text};
use diesel::sqlite::Sqlite;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::{debug, info};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");
pub const DEFAULT_POOL_SIZE: u32 = 4;

type SqlitePool = Pool<ConnectionManager<SqliteConnection>>;
#[cfg(feature = "pg")]
type PgPool = Pool<ConnectionManager<PgConnection>>;

enum CatalogPool {
  Sqlite(SqlitePool),
  #[cfg(feature = "pg")]
  Postgres(PgPool),
}

/// PRAGMAs aplicados a cada conexión SQLite al salir del pool.
#[derive(Debug)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
  fn on_acquire(&self, conn: &mut SqliteConnection) -> std::result::Result<(), diesel::r2d2::Error> {
    diesel::sql_query("PRAGMA busy_timeout = 5000;").execute(conn).map_err(diesel::r2d2::Error::QueryError)?;
    diesel::sql_query("PRAGMA journal_mode = WAL;").execute(conn).map_err(diesel::r2d2::Error::QueryError)?;
    Ok(())
  }
}

// Filas Diesel de las consultas del catálogo (sql_query + QueryableByName).
#[derive(Debug, QueryableByName)]
struct SummaryRow {
  #[diesel(sql_type = Text)]
  chembl_id: String,
  #[diesel(sql_type = Nullable<Text>)]
  pref_name: Option<String>,
  #[diesel(sql_type = Nullable<Text>)]
  molecule_type: Option<String>,
  #[diesel(sql_type = Nullable<Double>)]
  max_phase: Option<f64>,
  #[diesel(sql_type = Nullable<Double>)]
  full_mwt: Option<f64>,
  #[diesel(sql_type = Nullable<Double>)]
  alogp: Option<f64>,
  #[diesel(sql_type = Nullable<Integer>)]
  hbd: Option<i32>,
  #[diesel(sql_type = Nullable<Integer>)]
  hba: Option<i32>,
}

#[derive(Debug, QueryableByName)]
struct DetailRow {
  #[diesel(embed)]
  summary: SummaryRow,
  #[diesel(sql_type = Nullable<Text>)]
  canonical_smiles: Option<String>,
}

#[derive(Debug, QueryableByName)]
struct TypeCountRow {
  #[diesel(sql_type = Nullable<Text>)]
  molecule_type: Option<String>,
  #[diesel(sql_type = BigInt)]
  count: i64,
}

impl From<SummaryRow> for CompoundSummary {
  fn from(r: SummaryRow) -> Self {
    CompoundSummary { chembl_id: r.chembl_id,
                      preferred_name: r.pref_name,
                      molecule_type: r.molecule_type,
                      max_phase: r.max_phase,
                      molecular_weight: r.full_mwt,
                      log_p: r.alogp,
                      hydrogen_bond_donors: r.hbd,
                      hydrogen_bond_acceptors: r.hba }
  }
}

impl From<DetailRow> for CompoundDetail {
  fn from(r: DetailRow) -> Self {
    CompoundDetail { summary: r.summary.into(),
                     canonical_smiles: r.canonical_smiles }
  }
}

impl From<TypeCountRow> for TypeCount {
  fn from(r: TypeCountRow) -> Self {
    TypeCount { molecule_type: r.molecule_type,
                count: r.count }
  }
}

/// Filas de un compuesto para sembrar el catálogo (pruebas y demos).
#[derive(Debug, Clone)]
pub struct NewCompound {
  pub molregno: i64,
  pub chembl_id: String,
  pub pref_name: Option<String>,
  pub molecule_type: Option<String>,
  pub max_phase: Option<f64>,
  pub full_mwt: Option<f64>,
  pub alogp: Option<f64>,
  pub hbd: Option<i32>,
  pub hba: Option<i32>,
  pub canonical_smiles: Option<String>,
}

impl NewCompound {
  pub fn new(molregno: i64, chembl_id: &str, molecule_type: &str, full_mwt: f64) -> Self {
    Self { molregno,
           chembl_id: chembl_id.to_string(),
           pref_name: None,
           molecule_type: Some(molecule_type.to_string()),
           max_phase: None,
           full_mwt: Some(full_mwt),
           alogp: None,
           hbd: None,
           hba: None,
           canonical_smiles: None }
  }

  pub fn with_name(mut self, name: &str) -> Self {
    self.pref_name = Some(name.to_string());
    self
  }

  pub fn with_smiles(mut self, smiles: &str) -> Self {
    self.canonical_smiles = Some(smiles.to_string());
    self
  }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = schema::molecule_dictionary)]
struct MoleculeRow<'a> {
  molregno: i64,
  pref_name: Option<&'a str>,
  chembl_id: &'a str,
  max_phase: Option<f64>,
  molecule_type: Option<&'a str>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = schema::compound_properties)]
struct PropertiesRow {
  molregno: i64,
  full_mwt: Option<f64>,
  alogp: Option<f64>,
  hbd: Option<i32>,
  hba: Option<i32>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = schema::compound_structures)]
struct StructureRow<'a> {
  molregno: i64,
  canonical_smiles: Option<&'a str>,
}

fn map_db_err<T>(res: std::result::Result<T, DieselError>) -> Result<T> {
  res.map_err(|e| CatalogError::Execution(format!("db: {}", e)))
}

fn pool_err(e: r2d2::Error) -> CatalogError {
  CatalogError::Execution(format!("pool: {}", e))
}

fn bind_sqlite(query: &BuiltQuery) -> Result<BoxedSqlQuery<'static, Sqlite, SqlQuery>> {
  let mut q = diesel::sql_query(query.sql.clone()).into_boxed::<Sqlite>();
  for param in &query.params {
    q = match param {
      QueryParam::Text(v) => q.bind::<Text, _>(v.clone()),
      QueryParam::Float(v) => q.bind::<Double, _>(*v),
      QueryParam::BigInt(v) => q.bind::<BigInt, _>(*v),
      // SQLite no tiene arreglos: el conjunto viaja como un arreglo JSON y la
      // consulta lo expande con json_each.
      QueryParam::TextSet(vs) => q.bind::<Text, _>(serde_json::to_string(vs)?),
    };
  }
  Ok(q)
}

#[cfg(feature = "pg")]
fn bind_pg(query: &BuiltQuery) -> Result<BoxedSqlQuery<'static, Pg, SqlQuery>> {
  use diesel::sql_types::Array;
  let mut q = diesel::sql_query(query.sql.clone()).into_boxed::<Pg>();
  for param in &query.params {
    q = match param {
      QueryParam::Text(v) => q.bind::<Text, _>(v.clone()),
      QueryParam::Float(v) => q.bind::<Double, _>(*v),
      QueryParam::BigInt(v) => q.bind::<BigInt, _>(*v),
      QueryParam::TextSet(vs) => q.bind::<Array<Text>, _>(vs.clone()),
    };
  }
  Ok(q)
}

// Ejecuta la consulta ligada sobre el backend del pool y carga filas `$row`.
macro_rules! load_rows {
  ($pool:expr, $query:expr, $row:ty) => {
    match $pool {
      CatalogPool::Sqlite(pool) => {
        let mut conn = pool.get().map_err(pool_err)?;
        map_db_err(bind_sqlite($query)?.load::<$row>(&mut conn))
      }
      #[cfg(feature = "pg")]
      CatalogPool::Postgres(pool) => {
        let mut conn = pool.get().map_err(pool_err)?;
        map_db_err(bind_pg($query)?.load::<$row>(&mut conn))
      }
    }
  };
}

// Igual que `load_rows!` pero con una conexión cualquiera del pool.
macro_rules! with_conn {
  ($pool:expr, |$conn:ident| $body:expr) => {
    match $pool {
      CatalogPool::Sqlite(pool) => {
        let mut $conn = pool.get().map_err(pool_err)?;
        $body
      }
      #[cfg(feature = "pg")]
      CatalogPool::Postgres(pool) => {
        let mut $conn = pool.get().map_err(pool_err)?;
        $body
      }
    }
  };
}

/// Almacén Diesel que implementa `CatalogStore` sobre un pool r2d2.
pub struct DieselCatalogStore {
  pool: CatalogPool,
}

impl DieselCatalogStore {
  /// Abre (o crea) una base SQLite y aplica las migraciones embebidas.
  pub fn new_sqlite(database_url: &str, pool_size: u32) -> Result<Self> {
    let url = sqlite_path(database_url);
    let manager = ConnectionManager::<SqliteConnection>::new(url);
    let pool = Pool::builder().max_size(pool_size.max(1))
                              .connection_customizer(Box::new(SqlitePragmas))
                              .build(manager)
                              .map_err(pool_err)?;
    let store = DieselCatalogStore { pool: CatalogPool::Sqlite(pool) };
    store.run_migrations()?;
    debug!("catálogo SQLite listo en {}", url);
    Ok(store)
  }

  /// Conecta a un catálogo Postgres ya aprovisionado (no migra).
  #[cfg(feature = "pg")]
  pub fn new_postgres(database_url: &str, pool_size: u32) -> Result<Self> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder().max_size(pool_size.max(1)).build(manager).map_err(pool_err)?;
    Ok(DieselCatalogStore { pool: CatalogPool::Postgres(pool) })
  }

  /// Elige el backend según el esquema de la URL.
  pub fn open(database_url: &str, pool_size: u32) -> Result<Self> {
    if is_postgres_url(database_url) {
      return Self::open_postgres(database_url, pool_size);
    }
    Self::new_sqlite(database_url, pool_size)
  }

  #[cfg(feature = "pg")]
  fn open_postgres(database_url: &str, pool_size: u32) -> Result<Self> {
    Self::new_postgres(database_url, pool_size)
  }

  #[cfg(not(feature = "pg"))]
  fn open_postgres(_database_url: &str, _pool_size: u32) -> Result<Self> {
    Err(CatalogError::Execution("chem-persistence se compiló sin la feature 'pg'; habilítela para usar Postgres".into()))
  }

  /// Aplica las migraciones embebidas pendientes.
  pub fn run_migrations(&self) -> Result<()> {
    let applied = with_conn!(&self.pool, |conn| {
      conn.run_pending_migrations(MIGRATIONS)
          .map(|v| v.len())
          .map_err(|e| CatalogError::Execution(format!("migraciones: {}", e)))?
    });
    if applied > 0 {
      info!("{} migraciones aplicadas al catálogo", applied);
    }
    Ok(())
  }

  /// Inserta las tres filas de un compuesto en una transacción.
  pub fn insert_compound(&self, compound: &NewCompound) -> Result<()> {
    let molecule = MoleculeRow { molregno: compound.molregno,
                                 pref_name: compound.pref_name.as_deref(),
                                 chembl_id: &compound.chembl_id,
                                 max_phase: compound.max_phase,
                                 molecule_type: compound.molecule_type.as_deref() };
    let properties = PropertiesRow { molregno: compound.molregno,
                                     full_mwt: compound.full_mwt,
                                     alogp: compound.alogp,
                                     hbd: compound.hbd,
                                     hba: compound.hba };
    let structure = StructureRow { molregno: compound.molregno,
                                   canonical_smiles: compound.canonical_smiles.as_deref() };
    with_conn!(&self.pool, |conn| {
      map_db_err(conn.transaction::<_, DieselError, _>(|conn| {
                       diesel::insert_into(schema::molecule_dictionary::table).values(&molecule).execute(conn)?;
                       diesel::insert_into(schema::compound_properties::table).values(&properties).execute(conn)?;
                       diesel::insert_into(schema::compound_structures::table).values(&structure).execute(conn)?;
                       Ok(())
                     }))
    })
  }

  pub fn insert_compounds(&self, compounds: &[NewCompound]) -> Result<()> {
    for c in compounds {
      self.insert_compound(c)?;
    }
    Ok(())
  }
}

impl CatalogStore for DieselCatalogStore {
  fn dialect(&self) -> SqlDialect {
    match &self.pool {
      CatalogPool::Sqlite(_) => SqlDialect::Sqlite,
      #[cfg(feature = "pg")]
      CatalogPool::Postgres(_) => SqlDialect::Postgres,
    }
  }

  fn load_summaries(&self, query: &BuiltQuery) -> Result<Vec<CompoundSummary>> {
    let rows: Vec<SummaryRow> = load_rows!(&self.pool, query, SummaryRow)?;
    Ok(rows.into_iter().map(Into::into).collect())
  }

  fn load_details(&self, query: &BuiltQuery) -> Result<Vec<CompoundDetail>> {
    let rows: Vec<DetailRow> = load_rows!(&self.pool, query, DetailRow)?;
    Ok(rows.into_iter().map(Into::into).collect())
  }

  fn load_type_counts(&self, query: &BuiltQuery) -> Result<Vec<TypeCount>> {
    let rows: Vec<TypeCountRow> = load_rows!(&self.pool, query, TypeCountRow)?;
    Ok(rows.into_iter().map(Into::into).collect())
  }
}

/// Ruta del archivo SQLite: sin el esquema `sqlite://` o `sqlite:`.
fn sqlite_path(url: &str) -> &str {
  url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:")).unwrap_or(url)
}

fn is_postgres_url(url: &str) -> bool {
  let l = url.to_lowercase();
  l.starts_with("postgres://") || l.starts_with("postgresql://")
}

/// Construye el almacén a partir del entorno (`CHEM_DB_URL` o
/// `DATABASE_URL`, y `CATALOG_POOL_SIZE`).
pub fn new_from_env() -> Result<DieselCatalogStore> {
  dotenvy::dotenv().ok();
  let url = std::env::var("CHEM_DB_URL").or_else(|_| std::env::var("DATABASE_URL"))
                                        .map_err(|_| {
                                          CatalogError::Execution("CHEM_DB_URL / DATABASE_URL no definido".into())
                                        })?;
  let pool_size = std::env::var("CATALOG_POOL_SIZE").ok()
                                                    .and_then(|s| s.trim().parse::<u32>().ok())
                                                    .unwrap_or(DEFAULT_POOL_SIZE);
  DieselCatalogStore::open(&url, pool_size)
}
