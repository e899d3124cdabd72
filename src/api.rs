// ABOUTME: Async HTTP client core for the Bedrock Server Manager API
// ABOUTME: Owns the token, logs in lazily, retries once on 401 and maps responses to outcomes

use crate::model::Token;
use crate::response::{error_from_response, parse_success, RawResponse};
use crate::{Error, ErrorKind, Result};
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info, warn};
use url::Url;

pub const DEFAULT_BASE_PATH: &str = "/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Which login endpoint the server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginEndpoint {
    /// `POST <root>/auth/token` with a form-encoded body.
    #[default]
    TokenForm,
    /// `POST <api>/login` with a JSON body, used by older servers.
    LegacyJson,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub base_path: String,
    pub credentials: Option<Credentials>,
    pub token: Option<String>,
    pub verify_ssl: bool,
    pub timeout: Duration,
    pub login_endpoint: LoginEndpoint,
    pub http_client: Option<Client>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        ClientConfig {
            base_url: base_url.into(),
            base_path: DEFAULT_BASE_PATH.into(),
            credentials: None,
            token: None,
            verify_ssl: true,
            timeout: DEFAULT_TIMEOUT,
            login_endpoint: LoginEndpoint::default(),
            http_client: None,
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::new(username, password));
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    pub fn with_login_endpoint(mut self, endpoint: LoginEndpoint) -> Self {
        self.login_endpoint = endpoint;
        self
    }

    /// Uses an externally managed HTTP client. The API client never closes it.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }
}

/// Which base a request path is joined onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Base {
    /// Root plus the API prefix, e.g. `http://host:11325/api`.
    Api,
    /// The bare server root, used by auth endpoints.
    Root,
}

#[derive(Debug, Clone)]
enum Body {
    Json(Value),
    Form(Vec<(String, String)>),
}

/// One API call. Built per request and never persisted.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    base: Base,
    body: Option<Body>,
    query: Vec<(String, String)>,
    authenticated: bool,
    is_retry: bool,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Request {
            method,
            path: path.into(),
            base: Base::Api,
            body: None,
            query: Vec::new(),
            authenticated: true,
            is_retry: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(Body::Json(body));
        self
    }

    pub(crate) fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.body = Some(Body::Form(fields));
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn unauthenticated(mut self) -> Self {
        self.authenticated = false;
        self
    }

    pub fn at_root(mut self) -> Self {
        self.base = Base::Root;
        self
    }

    /// Marks this as the retry attempt: no lazy login and no further 401 retry.
    pub fn retry_attempt(mut self) -> Self {
        self.is_retry = true;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Client for a single Bedrock Server Manager instance.
///
/// The client may be shared across tasks; a single lock guards every
/// read-modify-write of the bearer token so concurrent callers never trigger
/// duplicate logins.
pub struct ApiClient {
    http: Mutex<Option<Client>>,
    owns_http: bool,
    root_url: String,
    api_base: String,
    target: String,
    credentials: Option<Credentials>,
    login_endpoint: LoginEndpoint,
    token: AsyncMutex<Option<String>>,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(Error::Config("base_url must be provided.".into()));
        }

        let credentials = config
            .credentials
            .filter(|c| !c.username.is_empty() && !c.password.is_empty());
        let token = config.token.filter(|t| !t.is_empty());
        if token.is_none() && credentials.is_none() {
            return Err(Error::Config(
                "Either a token or a username and password must be provided.".into(),
            ));
        }

        let parsed = Url::parse(config.base_url.trim()).map_err(|e| {
            Error::Config(format!("Invalid base_url '{}': {}", config.base_url, e))
        })?;
        let host = match (parsed.scheme(), parsed.host_str()) {
            ("http" | "https", Some(host)) if !host.is_empty() => host.to_string(),
            _ => {
                return Err(Error::Config(format!(
                    "Invalid base_url '{}'. Must include scheme (http/https) and hostname.",
                    config.base_url
                )))
            }
        };

        let authority = match parsed.port() {
            Some(port) => format!("{}:{}", host_for_url(&host), port),
            None => host_for_url(&host),
        };
        let root_url = format!("{}://{}", parsed.scheme(), authority);
        let target = match parsed.port_or_known_default() {
            Some(port) => format!("{}:{}", host, port),
            None => host.clone(),
        };

        let segment = config.base_path.trim_matches('/');
        let api_base = if segment.is_empty() {
            root_url.clone()
        } else {
            format!("{}/{}", root_url, segment)
        };

        let (http, owns_http) = match config.http_client {
            Some(client) => {
                if !config.verify_ssl {
                    info!("External HTTP client provided; its TLS verification settings take precedence");
                }
                (client, false)
            }
            None => {
                debug!("No HTTP client provided, creating an internal one");
                let mut builder = Client::builder().timeout(config.timeout).user_agent(format!(
                    "bsm-client/{} (Rust)",
                    env!("CARGO_PKG_VERSION")
                ));
                if !config.verify_ssl {
                    warn!("Creating internal HTTP client with TLS certificate verification DISABLED");
                    builder = builder.danger_accept_invalid_certs(true);
                }
                let client = builder
                    .build()
                    .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
                (client, true)
            }
        };

        debug!(api_base = %api_base, "API client initialized");

        Ok(ApiClient {
            http: Mutex::new(Some(http)),
            owns_http,
            root_url,
            api_base,
            target,
            credentials,
            login_endpoint: config.login_endpoint,
            token: AsyncMutex::new(token),
            timeout: config.timeout,
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn root_url(&self) -> &str {
        &self.root_url
    }

    pub fn url(&self, path: &str, base: Base) -> String {
        let base = match base {
            Base::Api => &self.api_base,
            Base::Root => &self.root_url,
        };
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }

    pub async fn token(&self) -> Option<String> {
        self.token.lock().await.clone()
    }

    pub async fn set_token(&self, token: Option<String>) {
        *self.token.lock().await = token;
    }

    async fn clear_token(&self) {
        *self.token.lock().await = None;
    }

    /// Drops an internally created HTTP client. An externally supplied client
    /// is left open for its owner.
    pub fn close(&self) {
        if !self.owns_http {
            debug!("HTTP client is externally managed; not closing it");
            return;
        }
        let mut http = self.http.lock().unwrap_or_else(PoisonError::into_inner);
        if http.take().is_some() {
            debug!(api_base = %self.api_base, "Closed internally managed HTTP client");
        }
    }

    pub(crate) fn http(&self) -> Result<Client> {
        self.http
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(Error::Closed)
    }

    pub(crate) fn timeout(&self) -> Duration {
        self.timeout
    }

    /// host:port the client talks to, used in connectivity messages.
    pub(crate) fn target(&self) -> &str {
        &self.target
    }

    pub(crate) fn connectivity_error(&self, source: reqwest::Error, url: &str) -> Error {
        let message = if source.is_timeout() {
            error!(url = %url, error = %source, "API request timed out");
            format!("Request timed out for {}", url)
        } else {
            error!(url = %url, error = %source, "API connection error");
            format!("Connection Error: Cannot connect to host {}.", self.target)
        };
        Error::Connectivity {
            message,
            target: self.target.clone(),
            source,
        }
    }

    /// Logs in with the stored credentials and stores the new token.
    pub async fn authenticate(&self) -> Result<Token> {
        let mut slot = self.token.lock().await;
        self.login_locked(&mut slot).await
    }

    /// Logs out remotely. The local token is cleared on success and on an
    /// auth failure, so a rejected logout never leaves a usable token behind.
    pub async fn logout(&self) -> Result<Value> {
        info!("Attempting API logout");
        let result = self.request(Request::get("/auth/logout").at_root()).await;
        match &result {
            Ok(_) => {
                self.clear_token().await;
                info!("Logout request successful, local token cleared");
            }
            Err(e) if e.kind() == ErrorKind::Auth => {
                self.clear_token().await;
                warn!(error = %e, "Auth error during logout, cleared local token anyway");
            }
            Err(e) => error!(error = %e, "API error during logout"),
        }
        result
    }

    /// Issues one API call and returns the decoded JSON outcome.
    ///
    /// Authenticated requests log in lazily when no token is held. A first 401
    /// triggers exactly one re-authentication and one retry; a second 401 is
    /// returned as `Error::Auth`.
    pub async fn request(&self, mut req: Request) -> Result<Value> {
        loop {
            let bearer = if req.authenticated {
                Some(self.bearer(req.is_retry).await?)
            } else {
                None
            };

            let response = self.dispatch(&req, bearer.as_deref()).await?;

            if response.status() == StatusCode::UNAUTHORIZED && req.authenticated && !req.is_retry {
                warn!(path = %req.path, "Received 401 Unauthorized, re-authenticating and retrying once");
                drop(response);
                self.refresh_rejected(bearer.as_deref()).await?;
                req.is_retry = true;
                continue;
            }

            return self.finish(response, &req.path).await;
        }
    }

    pub(crate) async fn request_as<T: serde::de::DeserializeOwned>(&self, req: Request) -> Result<T> {
        let value = self.request(req).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn bearer(&self, is_retry: bool) -> Result<String> {
        let mut slot = self.token.lock().await;
        if slot.is_none() && !is_retry {
            debug!("No token for authenticated request, attempting login");
            self.login_locked(&mut slot).await?;
        }
        slot.clone().ok_or_else(|| {
            error!("Authentication required but no token is available");
            Error::auth("Authentication required but no token is available.")
        })
    }

    async fn refresh_rejected(&self, rejected: Option<&str>) -> Result<()> {
        let mut slot = self.token.lock().await;
        if slot.as_deref() != rejected {
            debug!("Token already replaced by a concurrent login");
            return Ok(());
        }
        *slot = None;
        if self.credentials.is_some() {
            self.login_locked(&mut slot).await?;
        }
        Ok(())
    }

    /// Caller must hold the token lock and pass its slot.
    async fn login_locked(&self, slot: &mut Option<String>) -> Result<Token> {
        *slot = None;

        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| Error::auth("Username and password are required to log in."))?;
        info!(username = %credentials.username, "Attempting API authentication");

        let req = self.login_request(credentials);
        let outcome = match self.dispatch(&req, None).await {
            Ok(response) => self.finish(response, &req.path).await,
            Err(e) => Err(e),
        };

        let token = outcome.and_then(Token::from_login_response).map_err(|e| {
            error!(error = %e, "API error during authentication");
            e.into_login_failure()
        })?;

        *slot = Some(token.access_token.clone());
        info!("Authentication successful, token received");
        Ok(token)
    }

    fn login_request(&self, credentials: &Credentials) -> Request {
        match self.login_endpoint {
            LoginEndpoint::TokenForm => Request::post("/auth/token")
                .at_root()
                .unauthenticated()
                .form(vec![
                    ("username".into(), credentials.username.clone()),
                    ("password".into(), credentials.password.clone()),
                ]),
            LoginEndpoint::LegacyJson => Request::post("/login")
                .unauthenticated()
                .json(serde_json::json!({
                    "username": credentials.username,
                    "password": credentials.password,
                })),
        }
    }

    async fn dispatch(&self, req: &Request, bearer: Option<&str>) -> Result<reqwest::Response> {
        let http = self.http()?;
        let url = self.url(&req.path, req.base);

        let mut builder = http
            .request(req.method.clone(), &url)
            .header(ACCEPT, "application/json")
            .timeout(self.timeout);
        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        builder = match &req.body {
            // `.json` also sets Content-Type: application/json
            Some(Body::Json(value)) => builder.json(value),
            Some(Body::Form(fields)) => builder.form(fields),
            None => builder,
        };
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }

        debug!(
            method = %req.method,
            url = %url,
            authenticated = req.authenticated,
            retry = req.is_retry,
            "Sending request"
        );
        let response = builder
            .send()
            .await
            .map_err(|e| self.connectivity_error(e, &url))?;
        debug!(method = %req.method, url = %url, status = %response.status(), "Received response");
        Ok(response)
    }

    async fn finish(&self, response: reqwest::Response, path: &str) -> Result<Value> {
        let raw = RawResponse::read(response).await;
        if raw.status.is_success() {
            parse_success(&raw, path)
        } else {
            Err(error_from_response(&raw, path))
        }
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("api_base", &self.api_base)
            .field("owns_http", &self.owns_http)
            .field("credentials", &self.credentials)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn host_for_url(host: &str) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]", host)
    } else {
        host.to_string()
    }
}
