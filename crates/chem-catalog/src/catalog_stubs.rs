// Archivo: catalog_stubs.rs
// Propósito: almacén en memoria para pruebas y wiring rápido. No interpreta
// los filtros SQL: solo pagina con los dos últimos parámetros, resuelve el
// detalle por el identificador ligado y agrupa por tipo.
use crate::compound::{CompoundDetail, CompoundSummary, TypeCount};
use crate::errors::{CatalogError, Result};
use crate::query_builder::{BuiltQuery, QueryParam, SqlDialect};
use crate::CatalogStore;
use indexmap::IndexMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Compuesto de ejemplo con propiedades mínimas.
pub fn sample_compound(chembl_id: &str, molecule_type: &str, weight: f64) -> CompoundDetail {
  CompoundDetail { summary: CompoundSummary { chembl_id: chembl_id.to_string(),
                                              preferred_name: Some(format!("{} name", chembl_id)),
                                              molecule_type: Some(molecule_type.to_string()),
                                              max_phase: None,
                                              molecular_weight: Some(weight),
                                              log_p: None,
                                              hydrogen_bond_donors: Some(0),
                                              hydrogen_bond_acceptors: Some(0) },
                   canonical_smiles: Some("C".to_string()) }
}

/// Almacén en memoria con fallos programables y registro de consultas.
pub struct StubCatalogStore {
  compounds: Mutex<Vec<CompoundDetail>>,
  queries: Mutex<Vec<BuiltQuery>>,
  pending_failures: AtomicUsize,
  calls: AtomicUsize,
  delay: Mutex<Option<Duration>>,
}

impl StubCatalogStore {
  pub fn new() -> Self {
    Self::with_compounds(Vec::new())
  }

  pub fn with_compounds(compounds: Vec<CompoundDetail>) -> Self {
    Self { compounds: Mutex::new(compounds),
           queries: Mutex::new(Vec::new()),
           pending_failures: AtomicUsize::new(0),
           calls: AtomicUsize::new(0),
           delay: Mutex::new(None) }
  }

  pub fn insert(&self, compound: CompoundDetail) {
    self.compounds.lock().unwrap_or_else(|e| e.into_inner()).push(compound);
  }

  /// Las próximas `n` ejecuciones fallan con `CatalogError::Execution`.
  pub fn fail_next(&self, n: usize) {
    self.pending_failures.store(n, Ordering::SeqCst);
  }

  /// Cada ejecución bloquea el hilo durante `delay` (simula una consulta
  /// lenta).
  pub fn set_delay(&self, delay: Option<Duration>) {
    *self.delay.lock().unwrap_or_else(|e| e.into_inner()) = delay;
  }

  /// Número total de ejecuciones, incluidas las fallidas.
  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  pub fn last_query(&self) -> Option<BuiltQuery> {
    self.queries.lock().unwrap_or_else(|e| e.into_inner()).last().cloned()
  }

  fn execute(&self, query: &BuiltQuery) -> Result<()> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    self.queries.lock().unwrap_or_else(|e| e.into_inner()).push(query.clone());
    let delay = *self.delay.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(d) = delay {
      std::thread::sleep(d);
    }
    let failed = self.pending_failures
                     .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                     .is_ok();
    if failed {
      return Err(CatalogError::Execution("stub: fallo programado".into()));
    }
    Ok(())
  }

  fn snapshot(&self) -> Vec<CompoundDetail> {
    self.compounds.lock().unwrap_or_else(|e| e.into_inner()).clone()
  }
}

impl Default for StubCatalogStore {
  fn default() -> Self {
    Self::new()
  }
}

impl CatalogStore for StubCatalogStore {
  fn dialect(&self) -> SqlDialect {
    SqlDialect::Postgres
  }

  fn load_summaries(&self, query: &BuiltQuery) -> Result<Vec<CompoundSummary>> {
    self.execute(query)?;
    let (limit, offset) = match query.params.as_slice() {
      [.., QueryParam::BigInt(limit), QueryParam::BigInt(offset)] => (*limit as usize, *offset as usize),
      _ => (usize::MAX, 0),
    };
    let mut rows: Vec<CompoundSummary> = self.snapshot().into_iter().map(|c| c.summary).collect();
    rows.sort_by(|a, b| a.chembl_id.cmp(&b.chembl_id));
    Ok(rows.into_iter().skip(offset).take(limit).collect())
  }

  fn load_details(&self, query: &BuiltQuery) -> Result<Vec<CompoundDetail>> {
    self.execute(query)?;
    let id = match query.params.first() {
      Some(QueryParam::Text(id)) => id.clone(),
      _ => return Err(CatalogError::Execution("stub: detalle sin identificador".into())),
    };
    Ok(self.snapshot().into_iter().filter(|c| c.summary.chembl_id == id).collect())
  }

  fn load_type_counts(&self, query: &BuiltQuery) -> Result<Vec<TypeCount>> {
    self.execute(query)?;
    let mut groups: IndexMap<Option<String>, i64> = IndexMap::new();
    for c in self.snapshot() {
      *groups.entry(c.summary.molecule_type).or_insert(0) += 1;
    }
    groups.sort_keys();
    Ok(groups.into_iter()
             .map(|(molecule_type, count)| TypeCount { molecule_type, count })
             .collect())
  }
}
