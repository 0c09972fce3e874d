//! [`Command`] for logging the current [`User`] out.

use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::User;
use crate::{
    infra::{api, http, storage, Api, Navigator, Store},
    Service, State,
};

use super::Command;

/// [`Command`] for logging the current [`User`] out.
///
/// The remote session is ended on a best-effort basis: the local one is
/// cleared regardless.
#[derive(Clone, Copy, Debug)]
pub struct Logout;

impl<A, S, Nav> Command<Logout> for Service<A, S, Nav>
where
    A: Api<api::Logout, Ok = (), Err = Traced<http::Error>>,
    S: Store,
    Nav: Navigator,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    #[tracing::instrument(skip_all)]
    async fn execute(&self, _: Logout) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let _guard = self
            .in_flight
            .try_lock()
            .map_err(|_| tracerr::new!(E::AlreadyInProgress))?;

        if let Err(e) = self.api().execute(api::Logout).await {
            log::warn!("remote logout failed: {e}");
        }

        let cleared = self.store().clear_token().await;
        self.set_state(State::Unauthenticated);
        self.navigator().navigate(&self.config().login_route);
        log::info!("logged out");

        cleared.map_err(tracerr::map_from_and_wrap!(=> E))
    }
}

/// Error of [`Logout`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Storage`] error.
    ///
    /// [`Storage`]: crate::infra::Storage
    #[display("`Storage` operation failed: {_0}")]
    Storage(storage::Error),

    /// Another [`Login`] or [`Logout`] is in flight.
    ///
    /// [`Login`]: super::Login
    #[display("Another login or logout is in progress")]
    AlreadyInProgress,
}

#[cfg(test)]
mod spec {
    use std::{
        future::IntoFuture as _,
        sync::{atomic::Ordering, Arc},
        time::Duration,
    };

    use futures::future;
    use secrecy::SecretBox;
    use tokio::{sync::mpsc, time};

    use crate::{
        command::{Login, RestoreSession},
        domain::user::{session::spec::valid_token, Role},
        infra::{api::mock::Mock, storage::Memory},
        Config, Service, State,
    };

    use super::{Command as _, ExecutionError, Logout};

    type TestService =
        Service<Arc<Mock>, Memory, mpsc::UnboundedSender<String>>;

    fn login() -> Login {
        Login {
            username: "mperez".parse().unwrap(),
            password: SecretBox::new(Box::new("secreto".into())),
        }
    }

    async fn logged_in(
        api: Mock,
    ) -> (TestService, mpsc::UnboundedReceiver<String>) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (svc, _) =
            Service::new(Config::default(), Arc::new(api), Memory::new(), tx);
        drop(svc.execute(login()).await.unwrap());
        assert_eq!(rx.recv().await.unwrap(), "/");
        (svc, rx)
    }

    #[tokio::test]
    async fn clears_session() {
        let (svc, mut nav) =
            logged_in(Mock::issuing(valid_token("mperez", &["RRHH"]))).await;

        svc.execute(Logout).await.unwrap();

        assert_eq!(svc.state(), State::Unauthenticated);
        assert_eq!(svc.store().token().await.unwrap(), None);
        assert!(!svc.state().has_role(&Role::from("RRHH")));
        assert!(!svc.state().has_any_role(&[Role::from("RRHH")]));
        assert_eq!(svc.api().logouts.load(Ordering::SeqCst), 1);
        assert_eq!(nav.recv().await.unwrap(), "/login");
    }

    #[tokio::test]
    async fn clears_session_when_remote_fails() {
        let api = Mock::issuing(valid_token("mperez", &[]))
            .failing_logout("500: Internal Server Error");
        let (svc, mut nav) = logged_in(api).await;

        svc.execute(Logout).await.unwrap();

        assert_eq!(svc.state(), State::Unauthenticated);
        assert_eq!(svc.store().token().await.unwrap(), None);
        assert_eq!(nav.recv().await.unwrap(), "/login");
    }

    #[tokio::test]
    async fn rejects_overlapping_calls() {
        let (svc, _nav) =
            logged_in(Mock::issuing(valid_token("mperez", &[]))).await;

        let guard = svc.in_flight.try_lock().unwrap();
        let err = svc.execute(Logout).await.unwrap_err();
        drop(guard);

        assert!(matches!(err.as_ref(), ExecutionError::AlreadyInProgress));
        assert!(svc.state().is_authenticated());
    }

    #[tokio::test]
    async fn propagates_to_other_services() {
        let storage = Memory::new();
        let (tab_a, bg_a) = Service::new(
            Config::default(),
            Arc::new(Mock::issuing(valid_token("mperez", &["RRHH"]))),
            storage.clone(),
            (),
        );
        let (tab_b, bg_b) =
            Service::new(Config::default(), Arc::new(Mock::default()), storage, ());
        let background =
            future::try_join(bg_a.into_future(), bg_b.into_future());

        let scenario = async {
            assert_eq!(tab_b.execute(RestoreSession).await.unwrap(), None);

            drop(tab_a.execute(login()).await.unwrap());
            let mut state = tab_b.subscribe();
            drop(
                time::timeout(
                    Duration::from_secs(5),
                    state.wait_for(State::is_authenticated),
                )
                .await
                .unwrap()
                .unwrap(),
            );

            tab_a.execute(Logout).await.unwrap();
            drop(
                time::timeout(
                    Duration::from_secs(5),
                    state.wait_for(|s| *s == State::Unauthenticated),
                )
                .await
                .unwrap()
                .unwrap(),
            );
        };

        tokio::select! {
            () = scenario => {}
            res = background => panic!("background stopped: {res:?}"),
        }
        assert_eq!(tab_b.state(), State::Unauthenticated);
    }
}
