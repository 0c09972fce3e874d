//! Application provides a command-line client of the HR dashboard session
//! [`Service`].

#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod args;
pub mod cli;
pub mod config;
mod context;
pub mod error;

use tracing as log;
// Used in binary.
use tracing_subscriber as _;

pub use self::{
    args::Args,
    config::Config,
    context::Context,
    error::{AsError, Error},
};

/// [`Storage`] the session is kept in.
///
/// [`Storage`]: service::infra::Storage
pub type Storage = service::infra::storage::File;

/// Remote [`Api`] of the [`Service`].
///
/// [`Api`]: service::infra::Api
pub type Api = service::infra::http::Factory<Storage>;

/// [`Service`] with filled infrastructure dependencies.
///
/// [`Service`]: service::Service
pub type Service = service::Service<Api, Storage, Navigator>;

/// [`Navigator`] reporting the routes to navigate to in the log.
///
/// [`Navigator`]: service::infra::Navigator
#[derive(Clone, Copy, Debug, Default)]
pub struct Navigator;

impl service::infra::Navigator for Navigator {
    fn navigate(&self, path: &str) {
        log::info!("navigating to `{path}`");
    }
}
