use crate::compound::{CompoundDetail, CompoundSummary, TypeCount};
use crate::errors::Result;
use crate::query_builder::{BuiltQuery, SqlDialect};

/// Capacidad de ejecución de consultas sobre el catálogo relacional.
///
/// Las implementaciones deben admitir llamadas concurrentes arbitrarias; el
/// pool de conexiones es responsabilidad del almacén, no de quien consulta.
/// Cualquier fallo de conexión o de ejecución se devuelve como
/// `CatalogError::Execution` y no se reintenta.
pub trait CatalogStore: Send + Sync {
  /// Dialecto con el que deben construirse las consultas para este almacén.
  fn dialect(&self) -> SqlDialect;

  /// Ejecuta una consulta de listado y devuelve las filas tal cual.
  fn load_summaries(&self, query: &BuiltQuery) -> Result<Vec<CompoundSummary>>;

  /// Ejecuta una consulta de detalle (resumen + estructura).
  fn load_details(&self, query: &BuiltQuery) -> Result<Vec<CompoundDetail>>;

  /// Ejecuta el agregado por tipo de molécula.
  fn load_type_counts(&self, query: &BuiltQuery) -> Result<Vec<TypeCount>>;
}
