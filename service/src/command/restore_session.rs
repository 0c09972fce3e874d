//! [`Command`] for restoring a [`Session`] from the storage.

use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{user::Session, User},
    infra::{storage, Store},
    Service, State,
};

use super::Command;

/// [`Command`] for restoring a [`Session`] from the storage.
///
/// Executed once the [`Service`] is mounted, and each time the storage is
/// changed by another [`Service`] sharing it.
#[derive(Clone, Copy, Debug)]
pub struct RestoreSession;

impl<Api, S, Nav> Command<RestoreSession> for Service<Api, S, Nav>
where
    S: Store,
{
    type Ok = Option<User>;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, _: RestoreSession) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let token = self
            .store()
            .token()
            .await
            .inspect_err(|_| self.set_state(State::Unauthenticated))
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        match token.map(Session::try_from) {
            Some(Ok(Session { user, .. })) => {
                self.set_state(State::Authenticated(user.clone()));
                Ok(Some(user))
            }
            stale => {
                if let Some(Err(e)) = stale {
                    log::info!("discarding stored session: {e}");
                }
                let cleared = self.store().clear_token().await;
                self.set_state(State::Unauthenticated);
                cleared.map_err(tracerr::map_from_and_wrap!(=> E))?;
                Ok(None)
            }
        }
    }
}

/// Error of [`RestoreSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Storage`] error.
    ///
    /// [`Storage`]: crate::infra::Storage
    #[display("`Storage` operation failed: {_0}")]
    Storage(storage::Error),
}
