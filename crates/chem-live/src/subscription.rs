// Archivo: subscription.rs
// Propósito: el handle que liga una conexión con su entrega periódica. Es
// dueño exclusivo de su tarea (temporizador) y la cancela al liberarse.
use crate::snapshot::AggregateSnapshot;
use dashmap::DashMap;
use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::{AbortHandle, JoinHandle};
use uuid::Uuid;

/// Capacidad del canal de snapshots por suscriptor.
pub const SNAPSHOT_CHANNEL_CAPACITY: usize = 16;

pub type SnapshotSender = mpsc::Sender<AggregateSnapshot>;
pub type SnapshotReceiver = mpsc::Receiver<AggregateSnapshot>;

/// Entrada del registro: lo necesario para liberar una suscripción sin su
/// handle.
pub(crate) struct RegistryEntry {
  pub(crate) abort: AbortHandle,
  pub(crate) sink: Arc<SubscriptionSink>,
}

impl RegistryEntry {
  /// Cierra el canal del suscriptor y cancela su temporizador.
  pub(crate) fn release(&self) {
    self.sink.close();
    self.abort.abort();
  }
}

/// Registro de suscripciones vivas del broadcaster.
pub(crate) type Registry = Arc<DashMap<Uuid, RegistryEntry>>;

/// Canal de salida de una conexión.
pub fn snapshot_channel() -> (SnapshotSender, SnapshotReceiver) {
  mpsc::channel(SNAPSHOT_CHANNEL_CAPACITY)
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Delivery {
  Delivered,
  /// El suscriptor no consume; se descarta este snapshot.
  Skipped,
  Closed,
}

/// Ranura compartida entre la tarea y el handle. Al liberar la suscripción
/// el emisor se retira bajo el mismo lock que usa la entrega, así que ningún
/// snapshot sale después de `unsubscribe`.
pub(crate) struct SubscriptionSink {
  sender: Mutex<Option<SnapshotSender>>,
}

impl SubscriptionSink {
  pub(crate) fn new(sender: SnapshotSender) -> Self {
    Self { sender: Mutex::new(Some(sender)) }
  }

  pub(crate) fn deliver(&self, snapshot: AggregateSnapshot) -> Delivery {
    let guard = self.sender.lock().unwrap_or_else(|e| e.into_inner());
    let Some(sender) = guard.as_ref() else {
      return Delivery::Closed;
    };
    match sender.try_send(snapshot) {
      Ok(()) => Delivery::Delivered,
      Err(TrySendError::Full(s)) => {
        debug!("suscriptor saturado, se descarta el tick {}", s.tick);
        Delivery::Skipped
      }
      Err(TrySendError::Closed(_)) => Delivery::Closed,
    }
  }

  pub(crate) fn close(&self) {
    self.sender.lock().unwrap_or_else(|e| e.into_inner()).take();
  }
}

/// Suscripción activa al agregado en vivo.
///
/// `unsubscribe` es idempotente y también se ejecuta al soltar el handle,
/// de modo que cerrar la conexión basta para liberar el temporizador.
pub struct Subscription {
  id: Uuid,
  task: JoinHandle<()>,
  sink: Arc<SubscriptionSink>,
  registry: Registry,
  released: AtomicBool,
}

impl Subscription {
  pub(crate) fn new(id: Uuid, task: JoinHandle<()>, sink: Arc<SubscriptionSink>, registry: Registry) -> Self {
    Self { id,
           task,
           sink,
           registry,
           released: AtomicBool::new(false) }
  }

  pub fn id(&self) -> Uuid {
    self.id
  }

  /// `false` tras `unsubscribe` o si la tarea terminó porque el cliente
  /// cerró su canal.
  pub fn is_active(&self) -> bool {
    !self.released.load(Ordering::Acquire) && !self.task.is_finished()
  }

  /// Cancela el temporizador y libera el canal. Una consulta ya en vuelo
  /// puede terminar, pero su resultado se descarta.
  pub fn unsubscribe(&self) {
    if self.released.swap(true, Ordering::AcqRel) {
      return;
    }
    self.sink.close();
    self.task.abort();
    self.registry.remove(&self.id);
    info!("suscripción {} liberada", self.id);
  }
}

impl Drop for Subscription {
  fn drop(&mut self) {
    self.unsubscribe();
  }
}

impl std::fmt::Debug for Subscription {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscription")
     .field("id", &self.id)
     .field("active", &self.is_active())
     .finish()
  }
}
