// Configuración del binario leída del entorno (con soporte para `.env`).
use std::time::Duration;

pub const DEFAULT_BROADCAST_INTERVAL_MS: u64 = 5000;

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogSettings {
  pub broadcast_interval: Duration,
  pub max_page_size: i64,
}

impl Default for CatalogSettings {
  fn default() -> Self {
    Self { broadcast_interval: Duration::from_millis(DEFAULT_BROADCAST_INTERVAL_MS),
           max_page_size: chem_catalog::DEFAULT_MAX_PAGE_SIZE }
  }
}

impl CatalogSettings {
  /// `CATALOG_BROADCAST_INTERVAL_MS` y `CATALOG_MAX_PAGE_SIZE`; valores
  /// ausentes o no positivos usan el valor por defecto.
  pub fn from_env() -> Self {
    dotenvy::dotenv().ok();
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  fn from_lookup<F>(lookup: F) -> Self
    where F: Fn(&str) -> Option<String>
  {
    let defaults = Self::default();
    let interval_ms = lookup("CATALOG_BROADCAST_INTERVAL_MS").and_then(|s| s.trim().parse::<u64>().ok())
                                                             .filter(|v| *v > 0)
                                                             .unwrap_or(DEFAULT_BROADCAST_INTERVAL_MS);
    let max_page_size = lookup("CATALOG_MAX_PAGE_SIZE").and_then(|s| s.trim().parse::<i64>().ok())
                                                       .filter(|v| *v > 0)
                                                       .unwrap_or(defaults.max_page_size);
    Self { broadcast_interval: Duration::from_millis(interval_ms),
           max_page_size }
  }
}
