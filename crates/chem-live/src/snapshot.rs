use chem_catalog::TypeCount;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Nombre del evento con el que se empuja el agregado a los suscriptores.
pub const CHART_UPDATE_EVENT: &str = "chartUpdate";

/// Agregado `molecule_type -> count` calculado en un tick concreto de una
/// suscripción. No se persiste.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateSnapshot {
  pub tick: u64,
  pub computed_at: DateTime<Utc>,
  pub counts: Vec<TypeCount>,
}

impl AggregateSnapshot {
  pub fn new(tick: u64, counts: Vec<TypeCount>) -> Self {
    Self { tick,
           computed_at: Utc::now(),
           counts }
  }

  pub fn count_for(&self, molecule_type: Option<&str>) -> Option<i64> {
    self.counts.iter().find(|c| c.molecule_type.as_deref() == molecule_type).map(|c| c.count)
  }

  pub fn total(&self) -> i64 {
    self.counts.iter().map(|c| c.count).sum()
  }

  /// Sobre para el canal del cliente: `{"event": "chartUpdate", "data": [...]}`.
  pub fn to_chart_update(&self) -> ChartUpdate<'_> {
    ChartUpdate { event: CHART_UPDATE_EVENT,
                  data: &self.counts }
  }
}

#[derive(Debug, Serialize)]
pub struct ChartUpdate<'a> {
  pub event: &'static str,
  pub data: &'a [TypeCount],
}
