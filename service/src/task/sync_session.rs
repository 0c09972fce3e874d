//! [`SyncSession`] [`Task`].

use std::convert::Infallible;

use common::operations::{By, Start};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing as log;

use crate::{
    command,
    infra::storage::{Event, Store},
    Service,
};

use super::Task;

/// [`Task`] re-reading the session whenever its entries are mutated in the
/// shared storage, so that all the [`Service`]s sharing one storage observe
/// the same session.
#[derive(Clone, Copy, Debug)]
pub struct SyncSession;

impl<Api, S, Nav> Task<Start<By<SyncSession, broadcast::Receiver<Event>>>>
    for Service<Api, S, Nav>
where
    S: Store,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<SyncSession, broadcast::Receiver<Event>>>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut events = by.into_inner();
        loop {
            match events.recv().await {
                Ok(Event { key, .. }) => {
                    log::debug!("storage `{key}` entry changed");
                }
                Err(RecvError::Lagged(missed)) => {
                    log::warn!("missed {missed} storage events");
                }
                Err(RecvError::Closed) => return Ok(()),
            }

            _ = self.execute(command::RestoreSession).await.map_err(|e| {
                log::error!("`task::SyncSession` failed: {e}");
            });
        }
    }
}
