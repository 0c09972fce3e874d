//! Background [`Task`]s definitions.

mod background;
pub mod sync_session;

/// Long-running [`Task`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Task;

pub use self::{
    background::{Background, TaskError},
    sync_session::SyncSession,
};
