//! [`Context`]-related definitions.

use service::{infra::TokenStore, task::Background};

use crate::{config, Api, Config, Navigator, Service, Storage};

/// Application context, owning the shared resources.
#[derive(Clone, Debug)]
pub struct Context {
    /// [`Service`] instance.
    service: Service,

    /// Factory of the shared HTTP client.
    http: Api,
}

impl Context {
    /// Creates a new [`Context`] out of the provided [`Config`].
    ///
    /// The returned [`Background`] must be run for the [`Service`] to track
    /// the session changes made through other [`Context`]s sharing the same
    /// storage.
    #[must_use]
    pub fn new(config: Config) -> (Self, Background) {
        let Config {
            api,
            storage: config::Storage { path },
            routes,
            log: _,
        } = config;

        let storage = Storage::new(path);
        let http = Api::new(api.into(), TokenStore::new(storage.clone()));
        let (service, background) =
            Service::new(routes.into(), http.clone(), storage, Navigator);

        (Self { service, http }, background)
    }

    /// Returns [`Service`] instance of this [`Context`].
    #[must_use]
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Returns the factory of the shared HTTP client.
    #[must_use]
    pub fn http(&self) -> &Api {
        &self.http
    }
}
