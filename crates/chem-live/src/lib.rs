//! Agregado en vivo del catálogo: cada conexión suscrita recibe cada
//! `interval` el conteo de compuestos por tipo de molécula.

mod broadcaster;
mod snapshot;
mod subscription;

pub use broadcaster::{AggregateBroadcaster, DEFAULT_BROADCAST_INTERVAL, MIN_BROADCAST_INTERVAL};
pub use snapshot::{AggregateSnapshot, ChartUpdate, CHART_UPDATE_EVENT};
pub use subscription::{snapshot_channel, SnapshotReceiver, SnapshotSender, Subscription, SNAPSHOT_CHANNEL_CAPACITY};
