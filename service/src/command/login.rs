//! [`Command`] for logging a [`User`] in.

use derive_more::{Display, Error, From};
use secrecy::SecretBox;
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::User;
use crate::{
    domain::user::{self, session::DecodeError, Session},
    infra::{api, http, storage, Api, Navigator, Store},
    Service, State,
};

use super::Command;

/// [`Command`] for logging a [`User`] in with credentials.
#[derive(Clone, Debug)]
pub struct Login {
    /// [`user::Username`] of the [`User`].
    pub username: user::Username,

    /// [`user::Password`] of the [`User`].
    pub password: SecretBox<user::Password>,
}

impl<A, S, Nav> Command<Login> for Service<A, S, Nav>
where
    A: Api<
        api::Login,
        Ok = api::LoginOutput,
        Err = Traced<http::Error>,
    >,
    S: Store,
    Nav: Navigator,
{
    type Ok = Session;
    type Err = Traced<ExecutionError>;

    #[tracing::instrument(skip_all, fields(username = %cmd.username))]
    async fn execute(&self, cmd: Login) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let _guard = self
            .in_flight
            .try_lock()
            .map_err(|_| tracerr::new!(E::AlreadyInProgress))?;

        let Login { username, password } = cmd;
        let issued = self
            .api()
            .execute(api::Login { username, password })
            .await;
        let api::LoginOutput { token } = match issued {
            Ok(out) => out,
            Err(e) => {
                self.drop_session().await;
                return Err(e).map_err(tracerr::map_from_and_wrap!(=> E));
            }
        };

        let session = match Session::try_from(token) {
            Ok(session) => session,
            Err(e) => {
                self.drop_session().await;
                return Err(tracerr::new!(E::from(e)));
            }
        };

        if let Err(e) = self.persist(&session).await {
            self.drop_session().await;
            return Err(e).map_err(tracerr::map_from_and_wrap!(=> E));
        }

        self.set_state(State::Authenticated(session.user.clone()));
        self.navigator().navigate(&self.config().home_route);
        log::info!("logged in");

        Ok(session)
    }
}

impl<A, S: Store, Nav> Service<A, S, Nav> {
    /// Removes any stored [`Session`] and becomes [`State::Unauthenticated`].
    async fn drop_session(&self) {
        if let Err(e) = self.store().clear_token().await {
            log::warn!("failed to clear stored session: {e}");
        }
        self.set_state(State::Unauthenticated);
    }

    /// Stores the [`Session`] token along with its cached [`User`].
    async fn persist(
        &self,
        session: &Session,
    ) -> Result<(), Traced<storage::Error>> {
        self.store()
            .set_token(&session.token)
            .await
            .map_err(tracerr::wrap!())?;
        self.store()
            .set_user(&session.user)
            .await
            .map_err(tracerr::wrap!())
    }
}

/// Error of [`Login`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Remote [`Api`] error.
    ///
    /// Displayed as is, being already normalized for the [`User`].
    #[display("{_0}")]
    Api(http::Error),

    /// Issued [`user::session::Token`] cannot be decoded.
    #[display("Received malformed session token: {_0}")]
    MalformedToken(DecodeError),

    /// [`Storage`] error.
    ///
    /// [`Storage`]: crate::infra::Storage
    #[display("`Storage` operation failed: {_0}")]
    Storage(storage::Error),

    /// Another [`Login`] or [`Logout`] is in flight.
    ///
    /// [`Logout`]: super::Logout
    #[display("Another login or logout is in progress")]
    AlreadyInProgress,
}
