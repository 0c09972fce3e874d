//! Service contains the session logic of the HR dashboard: authenticating
//! [`User`]s against the remote API, keeping their session token and
//! exposing the current session state.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
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

pub mod command;
pub mod domain;
pub mod infra;
pub mod query;
pub mod task;

use std::{error::Error, sync::Arc};

use common::operations::{By, Start};
use smart_default::SmartDefault;
use tokio::sync::{broadcast, watch, Mutex};
use tracing as log;

use crate::{
    domain::{user::Role, User},
    infra::{
        storage::{self, Events},
        TokenStore,
    },
};

pub use self::{command::Command, query::Query, task::Task};

/// [`Service`] configuration.
#[derive(Clone, Debug, SmartDefault)]
pub struct Config {
    /// Route to navigate to after a successful login.
    #[default("/".to_owned())]
    pub home_route: String,

    /// Route to navigate to after a logout.
    #[default("/login".to_owned())]
    pub login_route: String,
}

/// State of the current session.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum State {
    /// Session has not been read from the storage yet.
    #[default]
    Loading,

    /// Valid [`User`] is present.
    Authenticated(User),

    /// There is no [`User`].
    Unauthenticated,
}

impl State {
    /// Returns the authenticated [`User`], if any.
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            Self::Loading | Self::Unauthenticated => None,
        }
    }

    /// Indicates whether this [`State`] is [`State::Authenticated`].
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// Checks whether the current [`User`] has the provided [`Role`].
    ///
    /// Always `false` without a [`User`].
    #[must_use]
    pub fn has_role(&self, role: &Role) -> bool {
        self.user().is_some_and(|u| u.has_role(role))
    }

    /// Checks whether the current [`User`] has at least one of the provided
    /// [`Role`]s.
    ///
    /// Always `false` without a [`User`].
    pub fn has_any_role<'r>(
        &self,
        roles: impl IntoIterator<Item = &'r Role>,
    ) -> bool {
        self.user().is_some_and(|u| u.has_any_role(roles))
    }
}

/// Session service.
#[derive(Debug)]
pub struct Service<Api, S, Nav> {
    /// Configuration of this [`Service`].
    config: Config,

    /// Remote [`Api`] of this [`Service`].
    ///
    /// [`Api`]: infra::Api
    api: Api,

    /// [`TokenStore`] of this [`Service`].
    store: TokenStore<S>,

    /// [`Navigator`] of this [`Service`].
    ///
    /// [`Navigator`]: infra::Navigator
    navigator: Nav,

    /// Current [`State`] of the session.
    state: Arc<watch::Sender<State>>,

    /// Guard of login/logout operations in flight.
    in_flight: Arc<Mutex<()>>,
}

impl<Api, S, Nav> Clone for Service<Api, S, Nav>
where
    Api: Clone,
    S: Clone,
    Nav: Clone,
{
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            api: self.api.clone(),
            store: self.store.clone(),
            navigator: self.navigator.clone(),
            state: Arc::clone(&self.state),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<Api, S, Nav> Service<Api, S, Nav> {
    /// Creates a new [`Service`] with the provided parameters.
    ///
    /// The returned [`task::Background`] keeps this [`Service`] in sync with
    /// the changes made to the `storage` by other [`Service`]s sharing it.
    /// The [`Service`] stays in [`State::Loading`] until
    /// [`command::RestoreSession`] is executed.
    pub fn new(
        config: Config,
        api: Api,
        storage: S,
        navigator: Nav,
    ) -> (Self, task::Background)
    where
        S: Events,
        Self: Task<
                Start<
                    By<task::SyncSession, broadcast::Receiver<storage::Event>>,
                >,
                Ok = (),
                Err: Error + 'static,
            > + Clone
            + 'static,
    {
        let events = storage.subscribe();
        let this = Self {
            config,
            api,
            store: TokenStore::new(storage),
            navigator,
            state: Arc::new(watch::channel(State::Loading).0),
            in_flight: Arc::new(Mutex::new(())),
        };

        let mut bg = task::Background::default();
        let svc = this.clone();
        bg.spawn(async move { svc.execute(Start(By::new(events))).await });

        (this, bg)
    }

    /// Returns [`Config`] of this [`Service`].
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the remote [`Api`] of this [`Service`].
    ///
    /// [`Api`]: infra::Api
    #[must_use]
    pub fn api(&self) -> &Api {
        &self.api
    }

    /// Returns [`TokenStore`] of this [`Service`].
    #[must_use]
    pub fn store(&self) -> &TokenStore<S> {
        &self.store
    }

    /// Returns [`Navigator`] of this [`Service`].
    ///
    /// [`Navigator`]: infra::Navigator
    #[must_use]
    pub fn navigator(&self) -> &Nav {
        &self.navigator
    }

    /// Returns a snapshot of the current [`State`].
    #[must_use]
    pub fn state(&self) -> State {
        self.state.borrow().clone()
    }

    /// Subscribes to the [`State`] changes of this [`Service`].
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<State> {
        self.state.subscribe()
    }

    /// Indicates whether the session is being read, or a login/logout is in
    /// flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        *self.state.borrow() == State::Loading
            || self.in_flight.try_lock().is_err()
    }

    /// Replaces the current [`State`], notifying subscribers if it changes.
    fn set_state(&self, state: State) {
        _ = self.state.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            log::debug!("session state: {current:?} -> {state:?}");
            *current = state;
            true
        });
    }
}
