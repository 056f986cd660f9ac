// Archivo: broadcaster.rs
// Propósito: empujar periódicamente el conteo por tipo de molécula a cada
// suscriptor. Cada suscripción tiene su propio temporizador y calcula su
// propio snapshot; no hay un planificador compartido.
use crate::snapshot::AggregateSnapshot;
use crate::subscription::{Delivery, Registry, RegistryEntry, SnapshotSender, Subscription, SubscriptionSink};
use chem_catalog::{CatalogError, CatalogStore, QueryBuilder, Result, TypeCount};
use dashmap::DashMap;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use uuid::Uuid;

pub const DEFAULT_BROADCAST_INTERVAL: Duration = Duration::from_secs(5);
/// Periodo mínimo aceptado; un intervalo nulo no puede armar un temporizador.
pub const MIN_BROADCAST_INTERVAL: Duration = Duration::from_millis(1);

/// Mantiene el conjunto de suscripciones vivas y arranca una tarea por cada
/// una.
pub struct AggregateBroadcaster {
  store: Arc<dyn CatalogStore>,
  builder: QueryBuilder,
  interval: Duration,
  subscriptions: Registry,
}

impl AggregateBroadcaster {
  /// `interval` por debajo de `MIN_BROADCAST_INTERVAL` se eleva a ese
  /// mínimo.
  pub fn new(store: Arc<dyn CatalogStore>, interval: Duration) -> Self {
    if interval < MIN_BROADCAST_INTERVAL {
      warn!("intervalo {:?} demasiado corto; se usa {:?}", interval, MIN_BROADCAST_INTERVAL);
    }
    let interval = interval.max(MIN_BROADCAST_INTERVAL);
    let builder = QueryBuilder::new(store.dialect());
    Self { store,
           builder,
           interval,
           subscriptions: Arc::new(DashMap::new()) }
  }

  pub fn with_default_interval(store: Arc<dyn CatalogStore>) -> Self {
    Self::new(store, DEFAULT_BROADCAST_INTERVAL)
  }

  pub fn interval(&self) -> Duration {
    self.interval
  }

  /// Registra `sink` y arma su temporizador. El primer snapshot llega tras
  /// un intervalo completo. Debe llamarse dentro de un runtime tokio.
  pub fn subscribe(&self, sink: SnapshotSender) -> Subscription {
    let id = Uuid::new_v4();
    let slot = Arc::new(SubscriptionSink::new(sink));
    // La entrada se reserva antes de arrancar la tarea: su `remove` final
    // espera a que la inserción termine.
    let entry = self.subscriptions.entry(id);
    let task = tokio::spawn(run_subscription(id,
                                             self.store.clone(),
                                             self.builder,
                                             self.interval,
                                             slot.clone(),
                                             self.subscriptions.clone()));
    entry.insert(RegistryEntry { abort: task.abort_handle(),
                                 sink: slot.clone() });
    info!("suscripción {} creada (intervalo {:?})", id, self.interval);
    Subscription::new(id, task, slot, self.subscriptions.clone())
  }

  /// Número de suscripciones con temporizador vivo.
  pub fn active_subscriptions(&self) -> usize {
    self.subscriptions.len()
  }

  /// Cancela todas las suscripciones vivas y cierra sus canales. Los handles
  /// que sigan existiendo quedan inactivos.
  pub fn shutdown(&self) {
    let ids: Vec<Uuid> = self.subscriptions.iter().map(|e| *e.key()).collect();
    for id in ids {
      if let Some((_, entry)) = self.subscriptions.remove(&id) {
        entry.release();
      }
    }
    info!("broadcaster detenido");
  }

  /// Calcula un snapshot fuera de cualquier suscripción (tick 0), útil para
  /// el primer pintado de un cliente.
  pub async fn compute_snapshot(&self) -> Result<AggregateSnapshot> {
    let counts = load_counts(self.store.clone(), self.builder).await?;
    Ok(AggregateSnapshot::new(0, counts))
  }
}

impl Drop for AggregateBroadcaster {
  fn drop(&mut self) {
    self.shutdown();
  }
}

async fn load_counts(store: Arc<dyn CatalogStore>, builder: QueryBuilder) -> Result<Vec<TypeCount>> {
  tokio::task::spawn_blocking(move || store.load_type_counts(&builder.aggregate_query()))
    .await
    .map_err(|e| CatalogError::Execution(format!("spawn_blocking join error: {}", e)))?
}

async fn run_subscription(id: Uuid,
                          store: Arc<dyn CatalogStore>,
                          builder: QueryBuilder,
                          period: Duration,
                          sink: Arc<SubscriptionSink>,
                          registry: Registry) {
  let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
  ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
  let mut tick: u64 = 0;
  loop {
    ticker.tick().await;
    tick += 1;
    match load_counts(store.clone(), builder).await {
      Ok(counts) => match sink.deliver(AggregateSnapshot::new(tick, counts)) {
        Delivery::Delivered | Delivery::Skipped => {}
        Delivery::Closed => {
          debug!("canal de la suscripción {} cerrado; se detiene", id);
          break;
        }
      },
      // El fallo de un tick no termina la suscripción: el siguiente tick
      // vuelve a consultar.
      Err(e) => error!("tick {} de la suscripción {} falló: {}", tick, id, e),
    }
  }
  registry.remove(&id);
}
