//! File-backed [`Storage`] implementation.

use std::{collections::BTreeMap, io, path::PathBuf, sync::Arc};

use common::operations::{Delete, Insert, Select};
use tokio::{
    fs,
    sync::{broadcast, Mutex},
};
use tracerr::Traced;
use tracing as log;

use super::{Error, Event, Events, Key, Storage, EVENTS_CAPACITY};

/// [`Storage`] persisting its entries as a JSON object in a file.
///
/// Entries with unknown names are preserved. [`Event`]s are published to
/// the subscribers of this [`File`] storage (and its clones) only.
#[derive(Clone, Debug)]
pub struct File {
    /// Path to the file.
    path: Arc<PathBuf>,

    /// Lock serializing read-modify-write cycles over the file.
    lock: Arc<Mutex<()>>,

    /// Bus publishing [`Event`]s of this [`File`] storage.
    events: broadcast::Sender<Event>,
}

/// Contents of a [`File`] storage.
type Entries = BTreeMap<String, String>;

impl File {
    /// Creates a new [`File`] storage backed by the provided `path`.
    ///
    /// The file is not touched until the first operation.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
            lock: Arc::default(),
            events: broadcast::channel(EVENTS_CAPACITY).0,
        }
    }

    /// Reads all the entries of this [`File`] storage.
    ///
    /// Missing file is read as having no entries.
    async fn read(&self) -> Result<Entries, Traced<Error>> {
        match fs::read(&*self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Entries::new()),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(tracerr::from_and_wrap!(=> Error)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Ok(Entries::new())
            }
            Err(e) => Err(tracerr::new!(Error::from(e))),
        }
    }

    /// Writes all the `entries` into this [`File`] storage.
    ///
    /// The file is replaced at once, so readers never observe it partially
    /// written.
    async fn write(&self, entries: &Entries) -> Result<(), Traced<Error>> {
        let bytes = serde_json::to_vec_pretty(entries)
            .map_err(tracerr::from_and_wrap!(=> Error))?;
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)
                    .await
                    .map_err(tracerr::from_and_wrap!(=> Error))?;
            }
        }
        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        fs::write(&tmp, bytes)
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))?;
        fs::rename(&tmp, &*self.path)
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))?;
        log::trace!("written `{}`", self.path.display());
        Ok(())
    }
}

impl Events for File {
    fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }
}

impl Storage<Select<Key>> for File {
    type Ok = Option<String>;
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Select(key): Select<Key>,
    ) -> Result<Self::Ok, Self::Err> {
        let _guard = self.lock.lock().await;
        Ok(self
            .read()
            .await
            .map_err(tracerr::wrap!())?
            .remove(key.as_str()))
    }
}

impl Storage<Insert<(Key, String)>> for File {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Insert((key, value)): Insert<(Key, String)>,
    ) -> Result<Self::Ok, Self::Err> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read().await.map_err(tracerr::wrap!())?;
        let old = entries.insert(key.as_str().to_owned(), value.clone());
        if old.as_ref() == Some(&value) {
            return Ok(());
        }
        self.write(&entries).await.map_err(tracerr::wrap!())?;

        _ = self.events.send(Event {
            key,
            value: Some(value),
        });
        Ok(())
    }
}

impl Storage<Delete<Key>> for File {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Delete(key): Delete<Key>,
    ) -> Result<Self::Ok, Self::Err> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read().await.map_err(tracerr::wrap!())?;
        if entries.remove(key.as_str()).is_none() {
            return Ok(());
        }
        self.write(&entries).await.map_err(tracerr::wrap!())?;

        _ = self.events.send(Event { key, value: None });
        Ok(())
    }
}
