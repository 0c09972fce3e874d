//! [`Query`] definition.

use std::convert::Infallible;

use crate::{
    domain::{user::Role, User},
    Service,
};

/// [`Query`] of the [`Service`].
pub use common::Handler as Query;

/// [`Query`] of the currently authenticated [`User`].
#[derive(Clone, Copy, Debug)]
pub struct CurrentUser;

impl<Api, S, Nav> Query<CurrentUser> for Service<Api, S, Nav> {
    type Ok = Option<User>;
    type Err = Infallible;

    async fn execute(&self, _: CurrentUser) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().user().cloned())
    }
}

/// [`Query`] checking whether the current [`User`] has the [`Role`].
#[derive(Clone, Debug)]
pub struct HasRole(pub Role);

impl<Api, S, Nav> Query<HasRole> for Service<Api, S, Nav> {
    type Ok = bool;
    type Err = Infallible;

    async fn execute(
        &self,
        HasRole(role): HasRole,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state.borrow().has_role(&role))
    }
}

/// [`Query`] checking whether the current [`User`] has any of the
/// [`Role`]s.
#[derive(Clone, Debug)]
pub struct HasAnyRole(pub Vec<Role>);

impl<Api, S, Nav> Query<HasAnyRole> for Service<Api, S, Nav> {
    type Ok = bool;
    type Err = Infallible;

    async fn execute(
        &self,
        HasAnyRole(roles): HasAnyRole,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state.borrow().has_any_role(&roles))
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        command::RestoreSession,
        domain::user::{session::spec::valid_token, Role},
        infra::{storage::Memory, TokenStore},
        Config, Service,
    };

    use super::{CurrentUser, HasAnyRole, HasRole, Query as _};

    fn roles(names: &[&str]) -> Vec<Role> {
        names.iter().copied().map(Role::from).collect()
    }

    #[tokio::test]
    async fn false_without_user() {
        let (svc, _) = Service::new(Config::default(), (), Memory::new(), ());
        drop(svc.execute(RestoreSession).await.unwrap());

        assert_eq!(svc.execute(CurrentUser).await.unwrap(), None);
        assert!(!svc.execute(HasRole(Role::from("ADMIN"))).await.unwrap());
        assert!(!svc
            .execute(HasAnyRole(roles(&["ADMIN", "RRHH"])))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn checks_roles_of_user() {
        let storage = Memory::new();
        TokenStore::new(storage.clone())
            .set_token(&valid_token("mperez", &["RRHH", "NOMINA"]))
            .await
            .unwrap();
        let (svc, _) = Service::new(Config::default(), (), storage, ());
        drop(svc.execute(RestoreSession).await.unwrap());

        let user = svc.execute(CurrentUser).await.unwrap().unwrap();
        assert_eq!(user.username.to_string(), "mperez");

        assert!(svc.execute(HasRole(Role::from("RRHH"))).await.unwrap());
        assert!(!svc.execute(HasRole(Role::from("rrhh"))).await.unwrap());
        assert!(svc
            .execute(HasAnyRole(roles(&["ADMIN", "NOMINA"])))
            .await
            .unwrap());
        assert!(!svc.execute(HasAnyRole(roles(&["ADMIN"]))).await.unwrap());
        assert!(!svc.execute(HasAnyRole(Vec::new())).await.unwrap());
    }
}
