//! HTTP [`Client`] of the remote REST API.

mod factory;
pub mod interceptor;

use std::time::Duration;

use derive_more::{Display, Error as StdError};
use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    Method, Url,
};
use secrecy::ExposeSecret as _;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use smart_default::SmartDefault;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::user::session::Token,
    infra::{api, storage::Store, Api, TokenStore},
};

pub use self::{
    factory::Factory,
    interceptor::{BearerAuth, ErrorNormalizer, Failure, CONNECTIVITY_FAILURE},
};

/// [`Client`] configuration.
#[derive(Clone, Debug, SmartDefault)]
pub struct Config {
    /// Base URL of the remote API, every request path is appended to it.
    #[default("http://localhost:3000/api".to_owned())]
    pub base_url: String,

    /// Timeout of a single request.
    #[default(Duration::from_secs(10))]
    pub timeout: Duration,
}

/// Normalized error of an HTTP request.
///
/// This is the only shape of remote errors observed outside this module.
#[derive(Clone, Debug, Display, Eq, PartialEq, StdError)]
#[display("{message}")]
pub struct Error {
    /// Human-readable message.
    message: String,
}

impl Error {
    /// Creates a new [`Error`] with the provided `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the human-readable message of this [`Error`].
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// HTTP client of the remote API with the [`BearerAuth`] and
/// [`ErrorNormalizer`] interceptors installed.
#[derive(Debug)]
pub struct Client<S> {
    /// Underlying [`reqwest::Client`].
    inner: reqwest::Client,

    /// Base URL of the remote API, without a trailing slash.
    base_url: String,

    /// Request interceptor.
    auth: BearerAuth<S>,

    /// Response interceptor.
    errors: ErrorNormalizer,
}

impl<S> Client<S> {
    /// Creates a new [`Client`] with the provided [`Config`], reading bearer
    /// tokens from the provided [`TokenStore`].
    ///
    /// # Errors
    ///
    /// If the underlying [`reqwest::Client`] cannot be built, or the base URL
    /// is invalid.
    pub fn new(
        config: &Config,
        store: TokenStore<S>,
    ) -> Result<Self, Traced<Error>> {
        let errors = ErrorNormalizer;

        let base_url = config.base_url.trim_end_matches('/').to_owned();
        drop(Url::parse(&base_url).map_err(|e| {
            tracerr::new!(errors.intercept(Failure::Other(format!(
                "invalid base URL `{base_url}`: {e}",
            ))))
        })?);

        let mut headers = HeaderMap::new();
        drop(headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        ));
        drop(headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json"),
        ));

        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| tracerr::new!(errors.intercept(e.into())))?;

        Ok(Self {
            inner,
            base_url,
            auth: BearerAuth::new(store),
            errors,
        })
    }

    /// Returns the base URL of this [`Client`].
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolves the provided `path` against the base URL.
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl<S: Store> Client<S> {
    /// Performs a `method` request to the provided `path`, with an optional
    /// JSON `body`, and decodes the JSON response.
    ///
    /// Empty response body is decoded as JSON `null`.
    ///
    /// # Errors
    ///
    /// With a normalized [`Error`] if the request fails in any way.
    pub async fn request<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, Traced<Error>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        log::debug!("{method} {url}");

        let mut request = self.inner.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let request = self.auth.intercept(request).await;

        let response = request
            .send()
            .await
            .map_err(|e| tracerr::new!(self.errors.intercept(e.into())))?;
        let status = response.status();
        let body = response.bytes().await;

        if !status.is_success() {
            return Err(tracerr::new!(self.errors.intercept(
                Failure::Status {
                    status,
                    body: body.map(|b| b.to_vec()).unwrap_or_default(),
                },
            )));
        }
        let body = body
            .map_err(|e| tracerr::new!(self.errors.intercept(e.into())))?;

        let body: &[u8] = if body.is_empty() { b"null" } else { &body };
        serde_json::from_slice(body).map_err(|e| {
            tracerr::new!(self.errors.intercept(Failure::Other(format!(
                "failed to decode response: {e}",
            ))))
        })
    }

    /// Performs a `GET` request to the provided `path`.
    ///
    /// # Errors
    ///
    /// With a normalized [`Error`] if the request fails in any way.
    pub async fn get<T>(&self, path: &str) -> Result<T, Traced<Error>>
    where
        T: DeserializeOwned,
    {
        self.request::<(), _>(Method::GET, path, None)
            .await
            .map_err(tracerr::wrap!())
    }

    /// Performs a `POST` request to the provided `path` with a JSON `body`.
    ///
    /// # Errors
    ///
    /// With a normalized [`Error`] if the request fails in any way.
    pub async fn post<B, T>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Traced<Error>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::POST, path, Some(body))
            .await
            .map_err(tracerr::wrap!())
    }

    /// Performs a `PUT` request to the provided `path` with a JSON `body`.
    ///
    /// # Errors
    ///
    /// With a normalized [`Error`] if the request fails in any way.
    pub async fn put<B, T>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Traced<Error>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::PUT, path, Some(body))
            .await
            .map_err(tracerr::wrap!())
    }

    /// Performs a `DELETE` request to the provided `path`.
    ///
    /// # Errors
    ///
    /// With a normalized [`Error`] if the request fails in any way.
    pub async fn delete<T>(&self, path: &str) -> Result<T, Traced<Error>>
    where
        T: DeserializeOwned,
    {
        self.request::<(), _>(Method::DELETE, path, None)
            .await
            .map_err(tracerr::wrap!())
    }
}

/// Path of the login endpoint.
const LOGIN_PATH: &str = "/auth/login";

/// Path of the logout endpoint.
const LOGOUT_PATH: &str = "/auth/logout";

impl<S: Store> Api<api::Login> for Client<S> {
    type Ok = api::LoginOutput;
    type Err = Traced<Error>;

    async fn execute(
        &self,
        api::Login { username, password }: api::Login,
    ) -> Result<Self::Ok, Self::Err> {
        /// Body of a login request.
        #[derive(Serialize)]
        struct Credentials<'a> {
            username: &'a str,
            password: &'a str,
        }

        /// Body of a login response.
        #[derive(Deserialize)]
        struct Issued {
            #[serde(alias = "accessToken", alias = "access_token")]
            token: String,
        }

        let Issued { token } = self
            .post(
                LOGIN_PATH,
                &Credentials {
                    username: username.as_ref(),
                    password: password.expose_secret().as_str(),
                },
            )
            .await
            .map_err(tracerr::wrap!())?;

        Ok(api::LoginOutput {
            token: Token::new(token),
        })
    }
}

impl<S: Store> Api<api::Logout> for Client<S> {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(&self, _: api::Logout) -> Result<Self::Ok, Self::Err> {
        self.post::<_, serde_json::Value>(LOGOUT_PATH, &serde_json::json!({}))
            .await
            .map(drop)
            .map_err(tracerr::wrap!())
    }
}
