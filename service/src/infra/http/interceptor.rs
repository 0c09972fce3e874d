//! Interceptors installed into every [`Client`].
//!
//! [`Client`]: super::Client

use reqwest::{RequestBuilder, StatusCode};
use serde_json::Value;
use tracing as log;

use crate::infra::{storage::Store, TokenStore};

use super::Error;

/// Message of a [`Failure::NoResponse`].
pub const CONNECTIVITY_FAILURE: &str =
    "No se pudo conectar con el servidor. Verifique su conexión.";

/// Fields of a JSON error body holding a human-readable message, in the
/// order of preference.
const MESSAGE_FIELDS: [&str; 3] = ["mensaje", "message", "error"];

/// Request interceptor attaching a bearer token from a [`TokenStore`] to
/// every outgoing request.
#[derive(Clone, Debug)]
pub struct BearerAuth<S> {
    /// [`TokenStore`] to read the bearer token from.
    store: TokenStore<S>,
}

impl<S> BearerAuth<S> {
    /// Creates a new [`BearerAuth`] interceptor reading from the provided
    /// [`TokenStore`].
    #[must_use]
    pub const fn new(store: TokenStore<S>) -> Self {
        Self { store }
    }
}

impl<S: Store> BearerAuth<S> {
    /// Attaches the `Authorization: Bearer <token>` header to the provided
    /// request, if there is a stored token.
    ///
    /// The request is sent unmodified otherwise, including when the token
    /// cannot be read.
    pub async fn intercept(&self, request: RequestBuilder) -> RequestBuilder {
        match self.store.token().await {
            Ok(Some(token)) => request.bearer_auth(token),
            Ok(None) => request,
            Err(e) => {
                log::warn!("failed to read session token: {e}");
                request
            }
        }
    }
}

/// Failed outcome of an HTTP request, before normalization.
#[derive(Clone, Debug)]
pub enum Failure {
    /// Response has been received with a non-success status.
    Status {
        /// Status of the response.
        status: StatusCode,

        /// Body of the response.
        body: Vec<u8>,
    },

    /// No response has been received at all (connection failure, timeout).
    NoResponse,

    /// Any other failure, described by its raw message.
    Other(String),
}

impl From<reqwest::Error> for Failure {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            Self::Status {
                status,
                body: Vec::new(),
            }
        } else if err.is_timeout() || err.is_connect() || err.is_request() {
            Self::NoResponse
        } else {
            Self::Other(err.to_string())
        }
    }
}

/// Response interceptor normalizing any [`Failure`] into a single
/// human-readable [`Error`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ErrorNormalizer;

impl ErrorNormalizer {
    /// Normalizes the provided [`Failure`] into an [`Error`], preferring:
    /// 1. a message supplied by the server in the response body;
    /// 2. `<status>: <status text>` of the response;
    /// 3. [`CONNECTIVITY_FAILURE`] if no response has been received;
    /// 4. the raw message of the [`Failure`].
    #[must_use]
    pub fn intercept(self, failure: Failure) -> Error {
        let message = match failure {
            Failure::Status { status, body } => {
                Self::server_message(&body).unwrap_or_else(|| {
                    format!(
                        "{}: {}",
                        status.as_u16(),
                        status.canonical_reason().unwrap_or("Unknown Status"),
                    )
                })
            }
            Failure::NoResponse => CONNECTIVITY_FAILURE.to_owned(),
            Failure::Other(raw) => raw,
        };
        log::debug!("HTTP request failed: {message}");
        Error::new(message)
    }

    /// Extracts a server-supplied message from the provided response `body`.
    fn server_message(body: &[u8]) -> Option<String> {
        let Ok(Value::Object(fields)) = serde_json::from_slice(body) else {
            return None;
        };
        MESSAGE_FIELDS.iter().find_map(|name| {
            fields
                .get(*name)
                .and_then(Value::as_str)
                .filter(|msg| !msg.trim().is_empty())
                .map(ToOwned::to_owned)
        })
    }
}
