// Archivo: filter_criteria.rs
// Propósito: traducir los parámetros crudos de un listado (strings opcionales)
// a un `FilterCriteria` tipado. Todo valor inválido se normaliza al valor por
// defecto; nada de lo que llega aquí se rechaza.
use indexmap::IndexSet;
use log::debug;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 100;
pub const DEFAULT_MAX_PAGE_SIZE: i64 = 1000;

/// Columnas por las que se permite ordenar. Es la única vía por la que un
/// valor del cliente influye en el texto SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
  #[default]
  ChemblId,
  PreferredName,
  MolecularWeight,
  MoleculeType,
}

impl SortColumn {
  /// Resuelve la clave pública (`chembl_id`, `name`, `molecular_weight`,
  /// `type`). Cualquier otra cosa devuelve `None`.
  pub fn from_key(key: &str) -> Option<Self> {
    match key {
      "chembl_id" => Some(Self::ChemblId),
      "name" => Some(Self::PreferredName),
      "molecular_weight" => Some(Self::MolecularWeight),
      "type" => Some(Self::MoleculeType),
      _ => None,
    }
  }

  /// Columna calificada dentro del join `m`/`p`.
  pub fn qualified(&self) -> &'static str {
    match self {
      Self::ChemblId => "m.chembl_id",
      Self::PreferredName => "m.pref_name",
      Self::MolecularWeight => "p.full_mwt",
      Self::MoleculeType => "m.molecule_type",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
  #[default]
  Asc,
  Desc,
}

impl SortDirection {
  /// `asc`/`desc` sin distinguir mayúsculas; el resto cae en `Asc`.
  pub fn parse_or_default(raw: Option<&str>) -> Self {
    match raw {
      Some(s) if s.trim().eq_ignore_ascii_case("DESC") => Self::Desc,
      _ => Self::Asc,
    }
  }

  pub fn as_sql(&self) -> &'static str {
    match self {
      Self::Asc => "ASC",
      Self::Desc => "DESC",
    }
  }
}

/// Parámetros de un listado tal como llegan del transporte (query string).
/// Todos son texto: la conversión la hace `FilterCriteria::from_request`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingRequest {
  pub name: Option<String>,
  pub min_weight: Option<String>,
  pub max_weight: Option<String>,
  pub molecule_types: Option<String>,
  pub sort_by: Option<String>,
  pub order: Option<String>,
  pub page: Option<String>,
  pub limit: Option<String>,
}

/// Criterios de búsqueda ya normalizados.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
  pub name_substring: Option<String>,
  pub min_weight: Option<f64>,
  pub max_weight: Option<f64>,
  pub molecule_types: IndexSet<String>,
  pub sort_column: SortColumn,
  pub sort_direction: SortDirection,
  page: i64,
  page_size: i64,
}

impl Default for FilterCriteria {
  fn default() -> Self {
    Self { name_substring: None,
           min_weight: None,
           max_weight: None,
           molecule_types: IndexSet::new(),
           sort_column: SortColumn::default(),
           sort_direction: SortDirection::default(),
           page: 1,
           page_size: DEFAULT_PAGE_SIZE }
  }
}

impl FilterCriteria {
  pub fn new() -> Self {
    Self::default()
  }

  /// Construye los criterios a partir de la petición cruda. `max_page_size`
  /// acota el `limit` pedido por el cliente.
  pub fn from_request(req: &ListingRequest, max_page_size: i64) -> Self {
    let mut criteria = Self::new();
    if let Some(name) = req.name.as_deref() {
      criteria = criteria.with_name(name);
    }
    criteria.min_weight = parse_weight("min_weight", req.min_weight.as_deref());
    criteria.max_weight = parse_weight("max_weight", req.max_weight.as_deref());
    if let Some(types) = req.molecule_types.as_deref() {
      criteria = criteria.with_molecule_types(types.split(','));
    }
    criteria.sort_column = req.sort_by.as_deref().and_then(SortColumn::from_key).unwrap_or_default();
    criteria.sort_direction = SortDirection::parse_or_default(req.order.as_deref());
    criteria.with_page(parse_positive(req.page.as_deref()).unwrap_or(1))
            .with_page_size(parse_positive(req.limit.as_deref()).unwrap_or(DEFAULT_PAGE_SIZE), max_page_size)
  }

  /// Filtro por nombre o identificador. Cadenas vacías no filtran.
  pub fn with_name(mut self, name: &str) -> Self {
    self.name_substring = if name.trim().is_empty() { None } else { Some(name.to_string()) };
    self
  }

  pub fn with_weight_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
    self.min_weight = min;
    self.max_weight = max;
    self
  }

  /// Conjunto de tipos (OR). Se recortan espacios, se descartan vacíos y
  /// duplicados conservando el orden de aparición.
  pub fn with_molecule_types<I, S>(mut self, types: I) -> Self
    where I: IntoIterator<Item = S>,
          S: AsRef<str>
  {
    self.molecule_types = types.into_iter()
                               .map(|t| t.as_ref().trim().to_string())
                               .filter(|t| !t.is_empty())
                               .collect();
    self
  }

  pub fn with_sort(mut self, column: SortColumn, direction: SortDirection) -> Self {
    self.sort_column = column;
    self.sort_direction = direction;
    self
  }

  /// Páginas no positivas se normalizan a 1.
  pub fn with_page(mut self, page: i64) -> Self {
    self.page = if page < 1 { 1 } else { page };
    self
  }

  /// Tamaños no positivos usan el valor por defecto; los que exceden
  /// `max_page_size` se recortan.
  pub fn with_page_size(mut self, page_size: i64, max_page_size: i64) -> Self {
    let size = if page_size < 1 { DEFAULT_PAGE_SIZE } else { page_size };
    self.page_size = size.min(max_page_size.max(1));
    self
  }

  pub fn page(&self) -> i64 {
    self.page
  }

  pub fn limit(&self) -> i64 {
    self.page_size
  }

  pub fn offset(&self) -> i64 {
    (self.page - 1).saturating_mul(self.page_size)
  }
}

fn parse_weight(field: &str, raw: Option<&str>) -> Option<f64> {
  let raw = raw?.trim();
  if raw.is_empty() {
    return None;
  }
  match raw.parse::<f64>() {
    Ok(v) if v.is_finite() => Some(v),
    _ => {
      debug!("{} ignorado: valor no numérico {:?}", field, raw);
      None
    }
  }
}

fn parse_positive(raw: Option<&str>) -> Option<i64> {
  raw.and_then(|s| s.trim().parse::<i64>().ok()).filter(|v| *v > 0)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn req() -> ListingRequest {
    ListingRequest::default()
  }

  #[test]
  fn defaults_when_request_is_empty() {
    let c = FilterCriteria::from_request(&req(), DEFAULT_MAX_PAGE_SIZE);
    assert_eq!(c, FilterCriteria::default());
    assert_eq!(c.limit(), 100);
    assert_eq!(c.offset(), 0);
  }

  #[test]
  fn unknown_sort_key_falls_back_to_identifier() {
    let r = ListingRequest { sort_by: Some("1=1".into()),
                             ..req() };
    let c = FilterCriteria::from_request(&r, DEFAULT_MAX_PAGE_SIZE);
    assert_eq!(c.sort_column, SortColumn::ChemblId);
    assert_eq!(SortColumn::from_key("molecular_weight"), Some(SortColumn::MolecularWeight));
    assert_eq!(SortColumn::from_key("type").unwrap().qualified(), "m.molecule_type");
  }

  #[test]
  fn order_is_case_insensitive_and_defaults_to_asc() {
    assert_eq!(SortDirection::parse_or_default(Some("desc")), SortDirection::Desc);
    assert_eq!(SortDirection::parse_or_default(Some("DESC")), SortDirection::Desc);
    assert_eq!(SortDirection::parse_or_default(Some("asc")), SortDirection::Asc);
    assert_eq!(SortDirection::parse_or_default(Some("DESC; DROP TABLE x")), SortDirection::Asc);
    assert_eq!(SortDirection::parse_or_default(None), SortDirection::Asc);
  }

  #[test]
  fn limit_zero_or_garbage_uses_default_page_size() {
    for raw in ["0", "-5", "abc", ""] {
      let r = ListingRequest { limit: Some(raw.into()),
                               ..req() };
      assert_eq!(FilterCriteria::from_request(&r, DEFAULT_MAX_PAGE_SIZE).limit(), DEFAULT_PAGE_SIZE, "{raw}");
    }
  }

  #[test]
  fn limit_is_clamped_to_maximum() {
    let r = ListingRequest { limit: Some("50000".into()),
                             ..req() };
    assert_eq!(FilterCriteria::from_request(&r, 1000).limit(), 1000);
  }

  #[test]
  fn negative_page_is_coerced_to_first_page() {
    let r = ListingRequest { page: Some("-3".into()),
                             limit: Some("10".into()),
                             ..req() };
    let c = FilterCriteria::from_request(&r, DEFAULT_MAX_PAGE_SIZE);
    assert_eq!(c.page(), 1);
    assert_eq!(c.offset(), 0);
  }

  #[test]
  fn offset_follows_page_and_limit() {
    let c = FilterCriteria::new().with_page(3).with_page_size(25, DEFAULT_MAX_PAGE_SIZE);
    assert_eq!(c.offset(), 50);
  }

  #[test]
  fn molecule_types_are_split_trimmed_and_deduplicated() {
    let r = ListingRequest { molecule_types: Some("Small molecule, Biologic,,Small molecule".into()),
                             ..req() };
    let c = FilterCriteria::from_request(&r, DEFAULT_MAX_PAGE_SIZE);
    let types: Vec<&str> = c.molecule_types.iter().map(|s| s.as_str()).collect();
    assert_eq!(types, vec!["Small molecule", "Biologic"]);
  }

  #[test]
  fn weights_that_do_not_parse_are_ignored() {
    let r = ListingRequest { min_weight: Some("heavy".into()),
                             max_weight: Some(" 500.5 ".into()),
                             ..req() };
    let c = FilterCriteria::from_request(&r, DEFAULT_MAX_PAGE_SIZE);
    assert_eq!(c.min_weight, None);
    assert_eq!(c.max_weight, Some(500.5));
  }

  #[test]
  fn blank_name_does_not_filter() {
    let r = ListingRequest { name: Some("   ".into()),
                             ..req() };
    assert_eq!(FilterCriteria::from_request(&r, DEFAULT_MAX_PAGE_SIZE).name_substring, None);
  }
}
