// ABOUTME: Typed error taxonomy for API, transport and client-local failures
// ABOUTME: Classifies HTTP status plus message into kinds and maps kinds to exit codes

use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Message, status and raw body carried by every API-level error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiErrorInfo {
    pub message: String,
    pub status: Option<u16>,
    pub data: Option<Value>,
}

impl ApiErrorInfo {
    pub fn new(message: impl Into<String>) -> Self {
        ApiErrorInfo {
            message: message.into(),
            status: None,
            data: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl fmt::Display for ApiErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication failed: {0}")]
    Auth(ApiErrorInfo),

    #[error("Invalid input: {0}")]
    InvalidInput(ApiErrorInfo),

    #[error("Not found: {0}")]
    NotFound(ApiErrorInfo),

    #[error("Server not found: {0}")]
    ServerNotFound(ApiErrorInfo),

    #[error("Server not running: {0}")]
    ServerNotRunning(ApiErrorInfo),

    #[error("Operation failed: {0}")]
    OperationFailed(ApiErrorInfo),

    #[error("Server-side error: {0}")]
    ServerSide(ApiErrorInfo),

    #[error("API error: {0}")]
    Api(ApiErrorInfo),

    #[error("{message}")]
    Connectivity {
        message: String,
        target: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Client has been closed")]
    Closed,

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Auth,
    InvalidInput,
    NotFound,
    ServerNotFound,
    ServerNotRunning,
    OperationFailed,
    ServerSide,
    Api,
    Connectivity,
    InvalidArgument,
    Config,
    Closed,
    Parse,
    Filesystem,
}

const NOT_RUNNING_PATTERN: &str = "is not running";

pub(crate) fn mentions_not_running(message: &str) -> bool {
    message.to_lowercase().contains(NOT_RUNNING_PATTERN)
}

impl Error {
    pub(crate) fn auth(message: impl Into<String>) -> Self {
        Error::Auth(ApiErrorInfo::new(message))
    }

    /// Maps a non-2xx response to its error kind. First match wins, so the
    /// 404 server-path case and the "is not running" message check must stay
    /// in this order relative to the numeric status checks.
    pub fn from_response(status: u16, message: String, data: Option<Value>, path: &str) -> Self {
        let info = ApiErrorInfo {
            message,
            status: Some(status),
            data,
        };

        match status {
            400 | 422 => Error::InvalidInput(info),
            401 | 403 => Error::Auth(info),
            404 if path.contains("/server/") => Error::ServerNotFound(info),
            404 => Error::NotFound(info),
            501 => Error::OperationFailed(info),
            _ if mentions_not_running(&info.message) => Error::ServerNotRunning(info),
            s if s >= 500 => Error::ServerSide(info),
            _ => Error::Api(info),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Auth(_) => ErrorKind::Auth,
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::ServerNotFound(_) => ErrorKind::ServerNotFound,
            Error::ServerNotRunning(_) => ErrorKind::ServerNotRunning,
            Error::OperationFailed(_) => ErrorKind::OperationFailed,
            Error::ServerSide(_) => ErrorKind::ServerSide,
            Error::Api(_) => ErrorKind::Api,
            Error::Connectivity { .. } => ErrorKind::Connectivity,
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::Config(_) => ErrorKind::Config,
            Error::Closed => ErrorKind::Closed,
            Error::Parse(_) => ErrorKind::Parse,
            Error::Filesystem(_) => ErrorKind::Filesystem,
        }
    }

    pub fn info(&self) -> Option<&ApiErrorInfo> {
        match self {
            Error::Auth(info)
            | Error::InvalidInput(info)
            | Error::NotFound(info)
            | Error::ServerNotFound(info)
            | Error::ServerNotRunning(info)
            | Error::OperationFailed(info)
            | Error::ServerSide(info)
            | Error::Api(info) => Some(info),
            _ => None,
        }
    }

    /// The server's (or client's) message without the kind prefix.
    pub fn message(&self) -> String {
        match self {
            Error::Connectivity { message, .. } => message.clone(),
            Error::InvalidArgument(msg) | Error::Config(msg) => msg.clone(),
            other => match other.info() {
                Some(info) => info.message.clone(),
                None => other.to_string(),
            },
        }
    }

    pub fn status(&self) -> Option<u16> {
        self.info().and_then(|info| info.status)
    }

    pub fn data(&self) -> Option<&Value> {
        self.info().and_then(|info| info.data.as_ref())
    }

    /// Rewraps anything that is not already an auth failure so login errors
    /// always surface as `Error::Auth`.
    pub(crate) fn into_login_failure(self) -> Self {
        match self {
            Error::Auth(info) => Error::Auth(info),
            other => {
                let mut info = other.info().cloned().unwrap_or_default();
                info.message = format!("API error during login: {}", other.message());
                Error::Auth(info)
            }
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Auth => 2,
            ErrorKind::Connectivity | ErrorKind::Closed => 3,
            ErrorKind::InvalidInput | ErrorKind::InvalidArgument => 4,
            ErrorKind::NotFound | ErrorKind::ServerNotFound => 5,
            ErrorKind::ServerNotRunning => 6,
            ErrorKind::OperationFailed | ErrorKind::ServerSide | ErrorKind::Api => 7,
            ErrorKind::Parse => 8,
            ErrorKind::Filesystem | ErrorKind::Config => 9,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
