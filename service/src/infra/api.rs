//! Remote authentication [`Api`] definitions.

use secrecy::SecretBox;

#[cfg(doc)]
use crate::domain::User;
use crate::domain::user::{self, session::Token};

/// Remote API operation.
pub use common::Handler as Api;

/// Exchanges [`User`] credentials for a [`Token`].
#[derive(Clone, Debug)]
pub struct Login {
    /// [`user::Username`] of a [`User`].
    pub username: user::Username,

    /// [`user::Password`] of a [`User`].
    pub password: SecretBox<user::Password>,
}

/// Output of a [`Login`] [`Api`] call.
#[derive(Clone, Debug)]
pub struct LoginOutput {
    /// Issued [`Token`].
    pub token: Token,
}

/// Ends the current remote session.
#[derive(Clone, Copy, Debug)]
pub struct Logout;
