//! [`TokenStore`] definition.

use common::operations::{Delete, Insert, Select};
use tracerr::Traced;

use crate::domain::{user::session::Token, User};

use super::{Error, Key, Store};

/// Store of a session [`Token`] and the cached [`User`] decoded from it.
///
/// No validation is performed on write.
#[derive(Clone, Debug)]
pub struct TokenStore<S> {
    /// Underlying [`Store`].
    storage: S,
}

impl<S> TokenStore<S> {
    /// Creates a new [`TokenStore`] over the provided [`Store`].
    #[must_use]
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Returns the underlying [`Store`] of this [`TokenStore`].
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }
}

impl<S: Store> TokenStore<S> {
    /// Returns the stored [`Token`], if any.
    ///
    /// # Errors
    ///
    /// If the underlying [`Store`] fails.
    pub async fn token(&self) -> Result<Option<Token>, Traced<Error>> {
        self.storage
            .execute(Select(Key::Token))
            .await
            .map(|t| t.map(Token::new))
            .map_err(tracerr::wrap!())
    }

    /// Stores the provided [`Token`].
    ///
    /// # Errors
    ///
    /// If the underlying [`Store`] fails.
    pub async fn set_token(&self, token: &Token) -> Result<(), Traced<Error>> {
        self.storage
            .execute(Insert((Key::Token, token.to_string())))
            .await
            .map_err(tracerr::wrap!())
    }

    /// Caches the provided [`User`] projection.
    ///
    /// # Errors
    ///
    /// If the underlying [`Store`] fails.
    pub async fn set_user(&self, user: &User) -> Result<(), Traced<Error>> {
        let user = serde_json::to_string(user)
            .map_err(tracerr::from_and_wrap!(=> Error))?;
        self.storage
            .execute(Insert((Key::User, user)))
            .await
            .map_err(tracerr::wrap!())
    }

    /// Removes the stored [`Token`] along with the cached [`User`].
    ///
    /// # Errors
    ///
    /// If the underlying [`Store`] fails.
    pub async fn clear_token(&self) -> Result<(), Traced<Error>> {
        self.storage
            .execute(Delete(Key::Token))
            .await
            .map_err(tracerr::wrap!())?;
        self.storage
            .execute(Delete(Key::User))
            .await
            .map_err(tracerr::wrap!())
    }
}

#[cfg(test)]
mod spec {
    use common::operations::Select;

    use crate::{
        domain::user::session::{spec::valid_token, Session, Token},
        infra::storage::{Key, Memory, Storage as _},
    };

    use super::TokenStore;

    #[tokio::test]
    async fn stores_and_clears() {
        let store = TokenStore::new(Memory::new());
        assert_eq!(store.token().await.unwrap(), None);

        let session = Session::try_from(valid_token("mperez", &[])).unwrap();
        store.set_token(&session.token).await.unwrap();
        store.set_user(&session.user).await.unwrap();
        assert_eq!(store.token().await.unwrap(), Some(session.token));
        assert!(store
            .storage()
            .execute(Select(Key::User))
            .await
            .unwrap()
            .is_some());

        store.clear_token().await.unwrap();
        assert_eq!(store.token().await.unwrap(), None);
        assert_eq!(
            store.storage().execute(Select(Key::User)).await.unwrap(),
            None,
        );
    }

    #[tokio::test]
    async fn does_not_validate_on_write() {
        let store = TokenStore::new(Memory::new());

        store.set_token(&Token::new("not a jwt")).await.unwrap();

        assert_eq!(store.token().await.unwrap(), Some(Token::new("not a jwt")));
    }
}
