//! Persistencia Diesel del catálogo de compuestos.
//! Este archivo expone el módulo `schema` y reexporta el almacén Diesel que
//! implementa `chem_catalog::CatalogStore`. La implementación detallada está
//! en `catalog_persistence.rs`.

mod catalog_persistence;
pub mod schema;

pub use catalog_persistence::{new_from_env, DieselCatalogStore, NewCompound, DEFAULT_POOL_SIZE, MIGRATIONS};
