use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::model::CatalogEvent;

const CHANNEL_CAPACITY: usize = 256;

/// Broadcast hub for catalog changes, one channel per property.
pub struct NotifyHub {
    channels: DashMap<String, broadcast::Sender<CatalogEvent>>,
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Subscribe to changes of a property. Creates the channel if needed.
    pub fn subscribe(&self, property_id: &str) -> broadcast::Receiver<CatalogEvent> {
        let sender = self
            .channels
            .entry(property_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Send a notification. No-op if nobody is listening.
    pub fn send(&self, event: CatalogEvent) {
        if let Some(sender) = self.channels.get(event.property_id()) {
            let _ = sender.send(event);
        }
    }

    /// Drop a channel once its property is gone. Open receivers see the
    /// channel close.
    pub fn remove(&self, property_id: &str) {
        self.channels.remove(property_id);
    }
}
