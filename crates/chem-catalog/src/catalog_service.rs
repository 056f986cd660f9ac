// Archivo: catalog_service.rs
// Propósito: operaciones de lectura del catálogo (listado filtrado y búsqueda
// puntual) sobre un `CatalogStore` inyectado.
use crate::compound::{CompoundDetail, CompoundSummary};
use crate::errors::{CatalogError, Result};
use crate::filter_criteria::{FilterCriteria, ListingRequest, DEFAULT_MAX_PAGE_SIZE};
use crate::query_builder::QueryBuilder;
use crate::CatalogStore;
use log::error;
use serde::Serialize;
use std::sync::Arc;

/// Respuesta del listado para la capa de transporte.
///
/// `total_records` se lee de la primera fila de la propia página. La consulta
/// paginada no proyecta ninguna columna de total, así que con filas el valor
/// queda ausente (`None`, omitido en JSON) y solo una página vacía reporta
/// `Some(0)`. Inexactitud conocida: nunca es el total de coincidencias.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingPage {
  pub data: Vec<CompoundSummary>,
  #[serde(rename = "totalRecords", skip_serializing_if = "Option::is_none")]
  pub total_records: Option<i64>,
}

impl ListingPage {
  pub fn from_rows(rows: Vec<CompoundSummary>) -> Self {
    let total_records = match rows.first() {
      // La fila no trae columna de total.
      Some(_) => None,
      None => Some(0),
    };
    Self { data: rows,
           total_records }
  }
}

/// Catálogo de compuestos. No guarda estado propio más allá del almacén
/// compartido, así que puede clonarse y usarse desde varias tareas.
#[derive(Clone)]
pub struct CompoundCatalog {
  store: Arc<dyn CatalogStore>,
  builder: QueryBuilder,
  max_page_size: i64,
}

impl CompoundCatalog {
  pub fn new(store: Arc<dyn CatalogStore>) -> Self {
    let builder = QueryBuilder::new(store.dialect());
    Self { store,
           builder,
           max_page_size: DEFAULT_MAX_PAGE_SIZE }
  }

  pub fn with_max_page_size(mut self, max_page_size: i64) -> Self {
    self.max_page_size = max_page_size.max(1);
    self
  }

  pub fn max_page_size(&self) -> i64 {
    self.max_page_size
  }

  pub fn store(&self) -> Arc<dyn CatalogStore> {
    self.store.clone()
  }

  /// Página de compuestos que cumplen los criterios.
  pub fn list(&self, criteria: &FilterCriteria) -> Result<Vec<CompoundSummary>> {
    let query = self.builder.list_query(criteria);
    self.store.load_summaries(&query).map_err(|e| {
                                        error!("listado de compuestos falló: {}", e);
                                        e
                                      })
  }

  /// Punto de entrada del transporte: normaliza la petición cruda y arma la
  /// respuesta con `totalRecords`.
  pub fn list_from_request(&self, req: &ListingRequest) -> Result<ListingPage> {
    let criteria = FilterCriteria::from_request(req, self.max_page_size);
    Ok(ListingPage::from_rows(self.list(&criteria)?))
  }

  /// Compuesto por `chembl_id` exacto, o `NotFound`.
  pub fn get_one(&self, chembl_id: &str) -> Result<CompoundDetail> {
    let query = self.builder.detail_query(chembl_id);
    let rows = self.store.load_details(&query).map_err(|e| {
                                                 error!("detalle de {} falló: {}", chembl_id, e);
                                                 e
                                               })?;
    rows.into_iter().next().ok_or_else(|| CatalogError::NotFound(chembl_id.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog_stubs::{sample_compound, StubCatalogStore};
  use crate::query_builder::QueryParam;

  fn catalog() -> (Arc<StubCatalogStore>, CompoundCatalog) {
    let store = Arc::new(StubCatalogStore::with_compounds(vec![sample_compound("CHEMBL1", "Small molecule", 150.0),
                                                               sample_compound("CHEMBL2", "Biologic", 500.0)]));
    (store.clone(), CompoundCatalog::new(store))
  }

  #[test]
  fn get_one_returns_not_found_for_unknown_identifier() {
    let (_, cat) = catalog();
    assert_eq!(cat.get_one("CHEMBL999"), Err(CatalogError::NotFound("CHEMBL999".into())));
  }

  #[test]
  fn get_one_returns_detail_with_structure() {
    let (_, cat) = catalog();
    let d = cat.get_one("CHEMBL2").unwrap();
    assert_eq!(d.chembl_id(), "CHEMBL2");
    assert!(d.canonical_smiles.is_some());
  }

  #[test]
  fn execution_faults_are_surfaced_unchanged() {
    let (store, cat) = catalog();
    store.fail_next(1);
    let err = cat.list(&FilterCriteria::new()).unwrap_err();
    assert!(matches!(err, CatalogError::Execution(_)));
    assert!(cat.list(&FilterCriteria::new()).is_ok());
  }

  #[test]
  fn request_limit_is_clamped_by_catalog_maximum() {
    let (store, cat) = catalog();
    let cat = cat.with_max_page_size(50);
    let req = ListingRequest { limit: Some("500".into()),
                               ..Default::default() };
    cat.list_from_request(&req).unwrap();
    let q = store.last_query().unwrap();
    assert_eq!(q.params, vec![QueryParam::BigInt(50), QueryParam::BigInt(0)]);
  }

  #[test]
  fn total_records_is_absent_when_the_page_has_rows() {
    // Inexactitud conocida: con 2 coincidencias y limit=1 no hay total.
    let (_, cat) = catalog();
    let req = ListingRequest { limit: Some("1".into()),
                               ..Default::default() };
    let page = cat.list_from_request(&req).unwrap();
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.total_records, None);

    let empty = ListingRequest { page: Some("9".into()),
                                 ..Default::default() };
    assert_eq!(cat.list_from_request(&empty).unwrap().total_records, Some(0));
  }

  #[test]
  fn listing_page_serializes_total_records_in_camel_case() {
    let v = serde_json::to_value(ListingPage::from_rows(vec![])).unwrap();
    assert_eq!(v, serde_json::json!({"data": [], "totalRecords": 0}));

    let rows = vec![sample_compound("CHEMBL1", "Small molecule", 150.0).summary];
    let v = serde_json::to_value(ListingPage::from_rows(rows)).unwrap();
    assert!(v.get("totalRecords").is_none());
    assert_eq!(v["data"].as_array().map(Vec::len), Some(1));
  }

  #[test]
  fn catalog_exposes_its_store_and_page_cap() {
    let (store, cat) = catalog();
    assert_eq!(cat.max_page_size(), DEFAULT_MAX_PAGE_SIZE);
    assert_eq!(cat.clone().with_max_page_size(0).max_page_size(), 1);
    cat.store().load_summaries(&QueryBuilder::new(cat.store().dialect()).list_query(&FilterCriteria::new())).unwrap();
    assert_eq!(store.calls(), 1);
  }
}
