//! [`User`] definitions.

pub mod session;

use std::{collections::HashSet, str::FromStr};

use derive_more::{AsRef, Display, From, Into};
use secrecy::{zeroize::Zeroize, CloneableSecret};
use serde::{Deserialize, Deserializer, Serialize};

pub use self::session::Session;

/// User of the dashboard, as projected from a [`session::Token`].
///
/// This is display data only: the [`session::Token`] it is decoded from is
/// never verified on the client side, so any authorization decision must be
/// re-validated by the remote API.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// [`Username`] of this [`User`].
    pub username: Username,

    /// Full [`Name`] of this [`User`], if any.
    pub full_name: Option<Name>,

    /// [`Email`] of this [`User`], if any.
    pub email: Option<Email>,

    /// [`Employee`] this [`User`] is linked to, if any.
    pub employee: Option<Employee>,

    /// [`Roles`] granted to this [`User`].
    pub roles: Roles,

    /// [`session::ExpirationDateTime`] of the [`Session`] this [`User`] was
    /// decoded from, if the token carries one.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "common::datetime::serde::unix_timestamp::option"
    )]
    pub expires_at: Option<session::ExpirationDateTime>,
}

impl User {
    /// Checks whether this [`User`] has the provided [`Role`].
    #[must_use]
    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    /// Checks whether this [`User`] has at least one of the provided
    /// [`Role`]s.
    pub fn has_any_role<'r>(
        &self,
        roles: impl IntoIterator<Item = &'r Role>,
    ) -> bool {
        self.roles.intersects(roles)
    }
}

impl From<session::Claims> for User {
    fn from(claims: session::Claims) -> Self {
        let session::Claims {
            username,
            full_name,
            email,
            employee_id,
            employee_code,
            roles,
            expires_at,
        } = claims;

        let employee = (employee_id.is_some() || employee_code.is_some())
            .then_some(Employee {
                id: employee_id,
                code: employee_code,
            });

        Self {
            username,
            full_name,
            email,
            employee,
            roles,
            expires_at,
        }
    }
}

/// Username of a [`User`].
#[derive(
    AsRef,
    Clone,
    Debug,
    Deserialize,
    Display,
    Eq,
    From,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[as_ref(str, String)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Creates a new [`Username`] if the given `username` is valid.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Option<Self> {
        let username = username.into();
        Self::check(&username).then_some(Self(username))
    }

    /// Checks whether the given `username` is a valid [`Username`].
    fn check(username: impl AsRef<str>) -> bool {
        let username = username.as_ref();
        username.trim() == username
            && !username.is_empty()
            && username.len() <= 128
    }
}

impl FromStr for Username {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Username`")
    }
}

/// Full name of a [`User`].
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, From, PartialEq, Serialize,
)]
#[as_ref(str, String)]
#[serde(transparent)]
pub struct Name(String);

/// Email address of a [`User`].
///
/// Taken as is from the [`session::Token`], no format checks are applied.
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, From, PartialEq, Serialize,
)]
#[as_ref(str, String)]
#[serde(transparent)]
pub struct Email(String);

/// Password of a [`User`].
#[derive(Clone, Debug, Eq, From, PartialEq)]
#[from(&str, String)]
pub struct Password(String);

impl Password {
    /// Creates a new [`Password`] if the given `password` is valid.
    #[must_use]
    pub fn new(password: impl Into<String>) -> Option<Self> {
        let password = password.into();
        Self::check(&password).then_some(Self(password))
    }

    /// Checks whether the given `password` is a valid [`Password`].
    fn check(password: impl AsRef<str>) -> bool {
        let password = password.as_ref();
        !password.is_empty() && password.len() <= 128
    }

    /// Returns the raw representation of this [`Password`].
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Password {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Password`")
    }
}

impl CloneableSecret for Password {}
impl Zeroize for Password {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// Employee record a [`User`] is linked to.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Employee {
    /// ID of the employee record.
    pub id: Option<EmployeeId>,

    /// Human-facing employee code (payroll number).
    pub code: Option<EmployeeCode>,
}

/// ID of an [`Employee`].
///
/// The remote API emits it either as a number or as a string, so both are
/// accepted and kept in their textual form.
#[derive(AsRef, Clone, Debug, Display, Eq, From, Hash, PartialEq, Serialize)]
#[as_ref(str, String)]
#[serde(transparent)]
pub struct EmployeeId(String);

impl<'de> Deserialize<'de> for EmployeeId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Self(n.to_string()),
            Raw::Text(s) => Self(s),
        })
    }
}

/// Code of an [`Employee`].
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, From, PartialEq, Serialize,
)]
#[as_ref(str, String)]
#[serde(transparent)]
pub struct EmployeeCode(String);

/// Named permission group of a [`User`].
///
/// Comparison is case-sensitive.
#[derive(
    AsRef,
    Clone,
    Debug,
    Deserialize,
    Display,
    Eq,
    From,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[as_ref(str, String)]
#[from(&str, String)]
#[serde(transparent)]
pub struct Role(String);

/// Unordered set of [`Role`]s.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Roles(HashSet<Role>);

impl Roles {
    /// Checks whether these [`Roles`] contain the provided [`Role`].
    #[must_use]
    pub fn contains(&self, role: &Role) -> bool {
        self.0.contains(role)
    }

    /// Checks whether these [`Roles`] share at least one [`Role`] with the
    /// provided ones.
    pub fn intersects<'r>(
        &self,
        roles: impl IntoIterator<Item = &'r Role>,
    ) -> bool {
        roles.into_iter().any(|r| self.contains(r))
    }

    /// Returns an iterator over these [`Roles`].
    pub fn iter(&self) -> impl Iterator<Item = &Role> {
        self.0.iter()
    }

    /// Returns the number of [`Role`]s.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Indicates whether there are no [`Role`]s at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<R: Into<Role>> FromIterator<R> for Roles {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod spec {
    use super::{Employee, EmployeeId, Role, Roles, User, Username};

    fn user(roles: &[&str]) -> User {
        User {
            username: Username::new("mperez").unwrap(),
            full_name: None,
            email: None,
            employee: None,
            roles: roles.iter().copied().collect(),
            expires_at: None,
        }
    }

    #[test]
    fn role_checks_are_case_sensitive() {
        let user = user(&["Admin", "RRHH"]);

        assert!(user.has_role(&Role::from("Admin")));
        assert!(!user.has_role(&Role::from("admin")));
        assert!(!user.has_role(&Role::from("Empleado")));
    }

    #[test]
    fn has_any_role_is_set_intersection() {
        let user = user(&["Admin", "RRHH"]);

        assert!(user.has_any_role(&[Role::from("Empleado"), "RRHH".into()]));
        assert!(!user.has_any_role(&[Role::from("Empleado")]));
        assert!(!user.has_any_role(std::iter::empty()));
        assert!(!User {
            roles: Roles::default(),
            ..user
        }
        .has_any_role(&[Role::from("Admin")]));
    }

    #[test]
    fn username_validation() {
        assert!(Username::new("jgarcia").is_some());
        assert!(Username::new("").is_none());
        assert!(Username::new(" jgarcia").is_none());
        assert!("x".repeat(129).parse::<Username>().is_err());
    }

    #[test]
    fn employee_id_accepts_numbers_and_strings() {
        let employee: Employee =
            serde_json::from_str(r#"{"id": 42, "code": "EMP-042"}"#).unwrap();
        assert_eq!(employee.id, Some(EmployeeId::from("42".to_owned())));

        let employee: Employee =
            serde_json::from_str(r#"{"id": "a1b2", "code": null}"#).unwrap();
        assert_eq!(employee.id, Some(EmployeeId::from("a1b2".to_owned())));
        assert_eq!(employee.code, None);
    }
}
