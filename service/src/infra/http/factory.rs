//! [`Factory`] of the shared [`Client`].

use std::sync::Arc;

use tokio::sync::RwLock;
use tracerr::Traced;
use tracing as log;

use crate::infra::{Api, TokenStore};

use super::{Client, Config, Error};

/// Factory lazily constructing a single shared [`Client`].
///
/// All the clones of a [`Factory`] share the same [`Client`] instance.
#[derive(Debug)]
pub struct Factory<S> {
    /// [`Config`] of the [`Client`] to construct.
    config: Config,

    /// [`TokenStore`] the [`Client`] reads bearer tokens from.
    store: TokenStore<S>,

    /// Constructed [`Client`], if any.
    client: Arc<RwLock<Option<Arc<Client<S>>>>>,
}

impl<S: Clone> Clone for Factory<S> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            store: self.store.clone(),
            client: Arc::clone(&self.client),
        }
    }
}

impl<S> Factory<S> {
    /// Creates a new [`Factory`] of [`Client`]s with the provided [`Config`].
    ///
    /// No [`Client`] is constructed until [`Factory::client()`] is called.
    #[must_use]
    pub fn new(config: Config, store: TokenStore<S>) -> Self {
        Self {
            config,
            store,
            client: Arc::new(RwLock::new(None)),
        }
    }

    /// Returns the [`Config`] of this [`Factory`].
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Drops the shared [`Client`], so the next [`Factory::client()`] call
    /// constructs a fresh one with fresh interceptors.
    pub async fn reset(&self) {
        if self.client.write().await.take().is_some() {
            log::debug!("shared HTTP client has been reset");
        }
    }
}

impl<S: Clone> Factory<S> {
    /// Returns the shared [`Client`], constructing it on the first call.
    ///
    /// # Errors
    ///
    /// If the [`Client`] cannot be constructed.
    pub async fn client(&self) -> Result<Arc<Client<S>>, Traced<Error>> {
        if let Some(client) = &*self.client.read().await {
            return Ok(Arc::clone(client));
        }

        let mut guard = self.client.write().await;
        if let Some(client) = &*guard {
            return Ok(Arc::clone(client));
        }
        let created = Arc::new(
            Client::new(&self.config, self.store.clone())
                .map_err(tracerr::wrap!())?,
        );
        log::debug!("shared HTTP client created for `{}`", created.base_url());
        *guard = Some(Arc::clone(&created));

        Ok(created)
    }
}

impl<S, Args> Api<Args> for Factory<S>
where
    S: Clone,
    Client<S>: Api<Args, Err = Traced<Error>>,
{
    type Ok = <Client<S> as Api<Args>>::Ok;
    type Err = Traced<Error>;

    async fn execute(&self, args: Args) -> Result<Self::Ok, Self::Err> {
        self.client()
            .await
            .map_err(tracerr::wrap!())?
            .execute(args)
            .await
            .map_err(tracerr::wrap!())
    }
}

#[cfg(test)]
mod spec {
    use std::sync::Arc;

    use crate::infra::{storage::Memory, TokenStore};

    use super::{Config, Factory};

    #[tokio::test]
    async fn returns_same_client_until_reset() {
        let factory =
            Factory::new(Config::default(), TokenStore::new(Memory::new()));

        let first = factory.client().await.unwrap();
        let second = factory.client().await.unwrap();
        let from_clone = factory.clone().client().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &from_clone));

        factory.reset().await;
        let fresh = factory.client().await.unwrap();
        assert!(!Arc::ptr_eq(&first, &fresh));
        assert!(Arc::ptr_eq(&fresh, &factory.client().await.unwrap()));
    }

    #[tokio::test]
    async fn does_not_cache_failures() {
        let factory = Factory::new(
            Config {
                base_url: "::".to_owned(),
                ..Config::default()
            },
            TokenStore::new(Memory::new()),
        );

        assert!(factory.client().await.is_err());
        assert!(factory.client().await.is_err());
    }
}
