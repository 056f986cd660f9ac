// Archivo: errors.rs
// Propósito: errores del catálogo de compuestos y alias `Result<T>`.
use thiserror::Error;

/// Errores que el catálogo expone a la capa de transporte.
///
/// Los valores de filtro mal formados nunca llegan aquí: se normalizan a
/// sus valores por defecto al construir `FilterCriteria`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CatalogError {
  /// Búsqueda puntual sin coincidencias.
  #[error("Compuesto no encontrado: {0}")]
  NotFound(String),
  /// Fallo al comunicarse con el almacén o al ejecutar la consulta.
  #[error("Error de ejecución: {0}")]
  Execution(String),
  #[error("Error de serialización: {0}")]
  Serialization(String),
}

impl From<serde_json::Error> for CatalogError {
  fn from(e: serde_json::Error) -> Self {
    Self::Serialization(e.to_string())
  }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
