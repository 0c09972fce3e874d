//! [`Command`] definition.

pub mod login;
pub mod logout;
pub mod restore_session;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    login::Login, logout::Logout, restore_session::RestoreSession,
};
