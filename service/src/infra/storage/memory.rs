//! In-memory [`Storage`] implementation.

use std::{collections::HashMap, sync::Arc};

use common::operations::{Delete, Insert, Select};
use tokio::sync::{broadcast, RwLock};
use tracerr::Traced;

use super::{Error, Event, Events, Key, Storage, EVENTS_CAPACITY};

/// In-memory [`Storage`].
///
/// All the clones share the same entries and the same [`Event`] bus, so
/// each clone behaves like a separate view over one persistent storage.
#[derive(Clone, Debug)]
pub struct Memory {
    /// Stored entries.
    entries: Arc<RwLock<HashMap<Key, String>>>,

    /// Bus publishing [`Event`]s of this [`Memory`] storage.
    events: broadcast::Sender<Event>,
}

impl Default for Memory {
    fn default() -> Self {
        Self {
            entries: Arc::default(),
            events: broadcast::channel(EVENTS_CAPACITY).0,
        }
    }
}

impl Memory {
    /// Creates a new empty [`Memory`] storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Events for Memory {
    fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }
}

impl Storage<Select<Key>> for Memory {
    type Ok = Option<String>;
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Select(key): Select<Key>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.entries.read().await.get(&key).cloned())
    }
}

impl Storage<Insert<(Key, String)>> for Memory {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Insert((key, value)): Insert<(Key, String)>,
    ) -> Result<Self::Ok, Self::Err> {
        let old = self.entries.write().await.insert(key, value.clone());
        if old.as_ref() != Some(&value) {
            // No receivers is not an error.
            _ = self.events.send(Event {
                key,
                value: Some(value),
            });
        }
        Ok(())
    }
}

impl Storage<Delete<Key>> for Memory {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Delete(key): Delete<Key>,
    ) -> Result<Self::Ok, Self::Err> {
        if self.entries.write().await.remove(&key).is_some() {
            _ = self.events.send(Event { key, value: None });
        }
        Ok(())
    }
}
