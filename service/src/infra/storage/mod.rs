//! [`Storage`]-related implementations.

#[cfg(feature = "file-storage")]
pub mod file;
pub mod memory;
mod token;

use common::operations::{Delete, Insert, Select};
use derive_more::{Display, Error as StdError, From};
use tokio::sync::broadcast;
use tracerr::Traced;

#[cfg(feature = "file-storage")]
pub use self::file::File;
pub use self::{memory::Memory, token::TokenStore};

/// Persistent key-value storage operation.
pub use common::Handler as Storage;

/// Capacity of the [`Event`] bus of [`Storage`] implementations.
const EVENTS_CAPACITY: usize = 16;

/// Key of a [`Storage`] entry.
///
/// Names are stable, as other instances sharing the same [`Storage`] rely on
/// them to observe changes.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Key {
    /// Bearer token of the current session.
    #[display("token")]
    Token,

    /// Cached projection of the current user.
    #[display("user")]
    User,
}

impl Key {
    /// Returns the stable name of this [`Key`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::User => "user",
        }
    }
}

/// Mutation of a [`Storage`] entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Event {
    /// [`Key`] of the mutated entry.
    pub key: Key,

    /// New value of the entry, or [`None`] if it was removed.
    pub value: Option<String>,
}

/// Source of [`Storage`] mutation [`Event`]s.
pub trait Events {
    /// Subscribes to all the [`Event`]s happening after this call.
    fn subscribe(&self) -> broadcast::Receiver<Event>;
}

/// [`Storage`] able to keep a session: read, write and remove entries by
/// [`Key`], and notify about these mutations.
pub trait Store:
    Storage<Select<Key>, Ok = Option<String>, Err = Traced<Error>>
    + Storage<Insert<(Key, String)>, Ok = (), Err = Traced<Error>>
    + Storage<Delete<Key>, Ok = (), Err = Traced<Error>>
    + Events
{
}

impl<T> Store for T where
    T: Storage<Select<Key>, Ok = Option<String>, Err = Traced<Error>>
        + Storage<Insert<(Key, String)>, Ok = (), Err = Traced<Error>>
        + Storage<Delete<Key>, Ok = (), Err = Traced<Error>>
        + Events
{
}

/// [`Storage`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// I/O operation failed.
    #[display("I/O operation failed: {_0}")]
    Io(std::io::Error),

    /// Stored contents cannot be (de)serialized.
    #[display("Malformed storage contents: {_0}")]
    Json(serde_json::Error),
}
