//! Background environment for running [`Task`]s.

use std::{
    error::Error,
    future::{Future, IntoFuture},
    pin::pin,
};

use futures::{
    future::{self, Either, LocalBoxFuture},
    FutureExt as _, TryFutureExt as _,
};
use tokio::task::{self, JoinError};

#[cfg(doc)]
use crate::Task;

/// Type-erased error of a [`Task`] running in a [`Background`].
pub type TaskError = Box<dyn Error + 'static>;

/// Background environment for running [`Task`]s.
///
/// Spawned [`Task`]s don't make any progress until this [`Background`] is
/// awaited (or [`Background::run_until()`] is called), and are aborted once
/// it is dropped.
#[derive(Debug, Default)]
pub struct Background {
    /// Local set the [`Task`]s are spawned onto.
    tasks: task::LocalSet,

    /// Handles of the spawned [`Task`]s.
    handles: Vec<task::JoinHandle<Result<(), TaskError>>>,
}

impl Background {
    /// Spawns a new [`Task`] inside the [`Background`] environment.
    pub fn spawn<F, E>(&mut self, future: F)
    where
        F: Future<Output = Result<(), E>> + 'static,
        E: Error + 'static,
    {
        self.handles.push(
            self.tasks
                .spawn_local(future.map_err(TaskError::from)),
        );
    }

    /// Drives the spawned [`Task`]s while the provided `foreground` future
    /// runs, and returns its output.
    ///
    /// # Errors
    ///
    /// If any of the [`Task`]s fails before the `foreground` completes.
    pub async fn run_until<F: Future>(
        self,
        foreground: F,
    ) -> Result<F::Output, TaskError> {
        match future::select(pin!(foreground), self.into_future()).await {
            Either::Left((out, _)) => Ok(out),
            Either::Right((Ok(()), foreground)) => Ok(foreground.await),
            Either::Right((Err(e), _)) => Err(e),
        }
    }
}

impl IntoFuture for Background {
    type Output = Result<(), TaskError>;
    type IntoFuture = LocalBoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        let Self { tasks, handles } = self;

        /// Flattens a [`Task`] result with its [`JoinError`].
        fn flatten(
            res: Result<Result<(), TaskError>, JoinError>,
        ) -> Result<(), TaskError> {
            res.map_err(TaskError::from)?
        }

        async move {
            tasks
                .run_until(future::try_join_all(
                    handles.into_iter().map(|h| h.map(flatten)),
                ))
                .await
                .map(drop)
        }
        .boxed_local()
    }
}

#[cfg(test)]
mod spec {
    use std::{fmt, future::IntoFuture as _};

    use derive_more::{Display, Error};

    use super::Background;

    #[derive(Debug, Display, Error)]
    #[display("boom")]
    struct Boom;

    #[tokio::test]
    async fn runs_spawned_tasks() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let mut bg = Background::default();
        bg.spawn(async move {
            tx.send(42).map_err(|_| fmt::Error)?;
            Ok::<_, fmt::Error>(())
        });

        assert_eq!(bg.run_until(rx).await.unwrap().unwrap(), 42);
    }

    #[tokio::test]
    async fn propagates_task_failures() {
        let mut bg = Background::default();
        bg.spawn(async { Err::<(), _>(Boom) });

        let err = bg.into_future().await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
