//! Catálogo de compuestos químicos: criterios de búsqueda, construcción de
//! consultas parametrizadas y el servicio de lectura sobre un almacén
//! relacional inyectado (`CatalogStore`).
//!
//! Este crate no depende de ningún driver de base de datos; la
//! implementación Diesel vive en `chem-persistence`.

mod catalog_service;
mod catalog_store;
mod catalog_stubs;
mod compound;
mod errors;
mod filter_criteria;
mod query_builder;

pub use catalog_service::{CompoundCatalog, ListingPage};
pub use catalog_store::CatalogStore;
pub use catalog_stubs::{sample_compound, StubCatalogStore};
pub use compound::{CompoundDetail, CompoundSummary, TypeCount};
pub use errors::{CatalogError, Result};
pub use filter_criteria::{FilterCriteria, ListingRequest, SortColumn, SortDirection, DEFAULT_MAX_PAGE_SIZE,
                          DEFAULT_PAGE_SIZE};
pub use query_builder::{BuiltQuery, QueryBuilder, QueryParam, SqlDialect};
