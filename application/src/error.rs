//! [`Error`]-related definitions.

use std::fmt;

use derive_more::Error as StdError;
use itertools::Itertools as _;
use service::{
    command,
    infra::{http, storage},
};
use tracerr::{Trace, Traced};

/// Defines a new error type.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_error {
    (
        enum $name:ident {
            $(
                #[code = $code:literal]
                #[message = $message:literal]
                $variant:ident
            ),* $(,)?
        }
    ) => {
        /// Error type.
        #[derive(
            Clone,
            Copy,
            Debug,
            ::derive_more::Display,
            ::derive_more::Error
        )]
        pub enum $name {
            $(
                #[display($message)]
                #[doc = $message]
                $variant,
            )*
        }

        impl From<$name> for $crate::Error {
            fn from(err: $name) -> Self {
                match err {
                    $(
                        $name::$variant => Self {
                            code: $code,
                            message: $message.to_string(),
                            backtrace: None,
                        },
                    )*
                }
            }
        }
    };
}

/// Application [`Error`] reported to the user.
#[derive(Clone, Debug, StdError)]
pub struct Error {
    /// [`Error`] code.
    pub code: Code,

    /// Backtrace of this [`Error`].
    #[error(not(backtrace))]
    pub backtrace: Option<Trace>,

    /// [`Error`] message.
    pub message: String,
}

impl Error {
    /// Create a new [`Error`] representing an unexpected failure.
    #[must_use]
    pub fn internal(msg: &impl ToString) -> Self {
        Self {
            code: "INTERNAL_ERROR",
            message: msg.to_string(),
            backtrace: None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            code,
            backtrace,
            message,
        } = self;

        write!(
            f,
            "[{code}]: {message}{}",
            backtrace
                .iter()
                .format_with("\n", |trace, f| f(&format_args!("\n{trace}"))),
        )
    }
}

/// [`Error`] code.
pub type Code = &'static str;

/// Helper trait for converting types into [`Error`]s.
pub trait AsError {
    /// Tries to convert the type into an [`Error`].
    ///
    /// [`None`] is returned if the type cannot be converted into an [`Error`].
    fn try_as_error(&self) -> Option<Error>;

    /// Converts the type into an [`Error`].
    fn as_error(&self) -> Error
    where
        Self: fmt::Display,
    {
        self.try_as_error()
            .unwrap_or_else(|| Error::internal(&self))
    }

    /// Converts the type into an [`Error`] by consuming it.
    fn into_error(self) -> Error
    where
        Self: fmt::Display + Sized,
    {
        self.as_error()
    }
}

impl<E: AsError + fmt::Display> AsError for Traced<E> {
    fn try_as_error(&self) -> Option<Error> {
        self.as_ref().try_as_error()
    }

    fn as_error(&self) -> Error
    where
        Self: fmt::Display,
    {
        self.try_as_error().unwrap_or_else(|| Error {
            backtrace: Some(self.trace().clone()),
            ..Error::internal(self.as_ref())
        })
    }
}

impl AsError for http::Error {
    fn try_as_error(&self) -> Option<Error> {
        Some(Error {
            code: "REMOTE_API_ERROR",
            message: self.message().to_owned(),
            backtrace: None,
        })
    }
}

impl AsError for storage::Error {
    fn try_as_error(&self) -> Option<Error> {
        None
    }
}

impl AsError for serde_json::Error {
    fn try_as_error(&self) -> Option<Error> {
        None
    }
}

impl AsError for command::restore_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Storage(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::login::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Api(e) => e.try_as_error(),
            Self::MalformedToken(_) => Some(SessionError::MalformedToken.into()),
            Self::Storage(e) => e.try_as_error(),
            Self::AlreadyInProgress => {
                Some(SessionError::AlreadyInProgress.into())
            }
        }
    }
}

impl AsError for command::logout::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Storage(e) => e.try_as_error(),
            Self::AlreadyInProgress => {
                Some(SessionError::AlreadyInProgress.into())
            }
        }
    }
}

define_error! {
    enum SessionError {
        #[code = "MALFORMED_TOKEN"]
        #[message = "Remote API issued a malformed session token"]
        MalformedToken,

        #[code = "ALREADY_IN_PROGRESS"]
        #[message = "Another login or logout is in progress"]
        AlreadyInProgress,
    }
}

#[cfg(test)]
mod spec {
    use service::{command::login, infra::http};

    use super::{AsError as _, Error};

    #[test]
    fn keeps_remote_message() {
        let err = tracerr::new!(login::ExecutionError::Api(http::Error::new(
            "Credenciales inválidas",
        )))
        .into_error();

        assert_eq!(err.code, "REMOTE_API_ERROR");
        assert_eq!(err.message, "Credenciales inválidas");
        assert!(err.backtrace.is_none());
        assert_eq!(err.to_string(), "[REMOTE_API_ERROR]: Credenciales inválidas");
    }

    #[test]
    fn maps_in_flight_guard() {
        let err = login::ExecutionError::AlreadyInProgress.into_error();

        assert_eq!(err.code, "ALREADY_IN_PROGRESS");
    }

    #[test]
    fn traces_internal_errors() {
        let err = tracerr::new!(login::ExecutionError::Storage(
            std::io::Error::other("disk is full").into(),
        ))
        .into_error();

        assert_eq!(err.code, Error::internal(&"").code);
        assert!(err.message.contains("disk is full"));
        assert!(err.backtrace.is_some());
    }
}
