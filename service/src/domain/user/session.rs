//! [`Session`] definitions.

use common::DateTimeOf;
use derive_more::{AsRef, Display, Error, From, FromStr};
use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::{user, User};

/// Authenticated session of a [`User`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Session {
    /// [`Token`] this [`Session`] is authorized with.
    pub token: Token,

    /// [`User`] decoded from the [`Token`].
    pub user: User,
}

impl TryFrom<Token> for Session {
    type Error = DecodeError;

    fn try_from(token: Token) -> Result<Self, Self::Error> {
        let user = token.decode()?.into();
        Ok(Self { token, user })
    }
}

/// Bearer token of a [`Session`].
///
/// Opaque to the client, apart from its payload being readable as
/// [`Claims`].
#[derive(AsRef, Clone, Debug, Display, Eq, From, FromStr, PartialEq)]
#[as_ref(str)]
pub struct Token(String);

impl Token {
    /// Creates a new [`Token`] without checking its contents.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Decodes [`Claims`] carried by this [`Token`].
    ///
    /// The signature is __not__ verified: the result is display data only.
    /// Expiration is checked (without leeway) if the [`Token`] declares it.
    ///
    /// # Errors
    ///
    /// If this [`Token`] is malformed or expired.
    pub fn decode(&self) -> Result<Claims, DecodeError> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.required_spec_claims.clear();
        validation.validate_aud = false;
        validation.leeway = 0;

        jsonwebtoken::decode::<Claims>(
            self.as_ref(),
            &DecodingKey::from_secret(&[]),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(DecodeError)
    }
}

/// Payload of a [`Token`].
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// [`user::Username`] of the [`User`].
    #[serde(alias = "sub", alias = "usuario")]
    pub username: user::Username,

    /// Full [`user::Name`] of the [`User`].
    #[serde(default, alias = "nombreCompleto", alias = "nombre")]
    pub full_name: Option<user::Name>,

    /// [`user::Email`] of the [`User`].
    #[serde(default, alias = "correo")]
    pub email: Option<user::Email>,

    /// [`user::EmployeeId`] the [`User`] is linked to.
    #[serde(default, alias = "empleadoId", alias = "idEmpleado")]
    pub employee_id: Option<user::EmployeeId>,

    /// [`user::EmployeeCode`] the [`User`] is linked to.
    #[serde(default, alias = "codigoEmpleado")]
    pub employee_code: Option<user::EmployeeCode>,

    /// [`user::Roles`] of the [`User`].
    #[serde(default)]
    pub roles: user::Roles,

    /// [`ExpirationDateTime`] of the [`Token`].
    #[serde(
        default,
        rename = "exp",
        skip_serializing_if = "Option::is_none",
        with = "common::datetime::serde::unix_timestamp::option"
    )]
    pub expires_at: Option<ExpirationDateTime>,
}

/// Error of decoding a [`Token`].
#[derive(Debug, Display, Error)]
#[display("Failed to decode a JSON Web Token: {_0}")]
pub struct DecodeError(jsonwebtoken::errors::Error);

impl DecodeError {
    /// Indicates whether the [`Token`] was well-formed, but expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        matches!(
            self.0.kind(),
            jsonwebtoken::errors::ErrorKind::ExpiredSignature,
        )
    }
}

/// Marker type describing a [`Session`] expiration.
#[derive(Clone, Copy, Debug)]
pub struct Expiration;

/// [`DateTime`] of a [`Session`] expiration.
///
/// [`DateTime`]: common::DateTime
pub type ExpirationDateTime = DateTimeOf<Expiration>;

#[cfg(test)]
pub(crate) mod spec {
    use std::time::Duration;

    use common::DateTime;
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;

    use crate::domain::user::{
        Email, Employee, EmployeeCode, EmployeeId, Name, Role, Session,
    };

    use super::Token;

    /// Signs the provided payload into a [`Token`].
    pub(crate) fn token(payload: &serde_json::Value) -> Token {
        Token::new(
            jsonwebtoken::encode(
                &Header::default(),
                payload,
                &EncodingKey::from_secret(b"not-checked-by-the-client"),
            )
            .unwrap(),
        )
    }

    /// Returns a [`Token`] for `username` with the provided `roles`, valid
    /// for an hour.
    pub(crate) fn valid_token(username: &str, roles: &[&str]) -> Token {
        let exp = (DateTime::now() + Duration::from_secs(3600)).unix_timestamp();
        token(&json!({
            "username": username,
            "nombreCompleto": "María Pérez",
            "correo": "mperez@example.com",
            "empleadoId": 17,
            "codigoEmpleado": "EMP-017",
            "roles": roles,
            "exp": exp,
        }))
    }

    #[test]
    fn decodes_user_projection() {
        let session = Session::try_from(valid_token("mperez", &["RRHH"]))
            .expect("valid token");
        let user = session.user;

        assert_eq!(user.username.to_string(), "mperez");
        assert_eq!(user.full_name, Some(Name::from("María Pérez".to_owned())));
        assert_eq!(
            user.email,
            Some(Email::from("mperez@example.com".to_owned())),
        );
        assert_eq!(
            user.employee,
            Some(Employee {
                id: Some(EmployeeId::from("17".to_owned())),
                code: Some(EmployeeCode::from("EMP-017".to_owned())),
            }),
        );
        assert!(user.has_role(&Role::from("RRHH")));
        assert!(user.expires_at.is_some_and(|exp| !exp.is_past()));
    }

    #[test]
    fn decodes_without_expiration() {
        let user = Session::try_from(token(&json!({"username": "admin"})))
            .expect("valid token")
            .user;

        assert!(user.roles.is_empty());
        assert_eq!(user.employee, None);
        assert_eq!(user.expires_at, None);
    }

    #[test]
    fn rejects_expired() {
        let exp = (DateTime::now() - Duration::from_secs(5)).unix_timestamp();
        let err = token(&json!({"username": "admin", "exp": exp}))
            .decode()
            .unwrap_err();

        assert!(err.is_expired());
    }

    #[test]
    fn rejects_malformed() {
        for raw in ["", "garbage", "a.b.c", "eyJhbGciOiJIUzI1NiJ9.e30.sig"] {
            let token = Token::new(raw);
            assert!(token.decode().is_err(), "`{raw}` decoded");
            assert!(token.decode().is_err(), "`{raw}` decoded on retry");
        }
    }
}
