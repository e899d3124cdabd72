// ABOUTME: Session resolution for the CLI with a precedence chain
// ABOUTME: token flag/env → credential flags/env → stored token → stored credentials

use crate::api::{ClientConfig, Credentials};
use crate::config::StoredConfig;
use crate::{Error, Result};
use std::time::Duration;

/// Connection settings collected from flags and environment.
#[derive(Debug, Clone, Default)]
pub struct SessionArgs {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub no_verify_ssl: bool,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Session {
    Token(String),
    Credentials { username: String, password: String },
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

fn credential_pair(username: &Option<String>, password: &Option<String>) -> Option<Session> {
    match (non_empty(username), non_empty(password)) {
        (Some(username), Some(password)) => Some(Session::Credentials { username, password }),
        _ => None,
    }
}

pub fn resolve_session(args: &SessionArgs, stored: &StoredConfig) -> Result<Session> {
    // 1. Explicit token
    if let Some(token) = non_empty(&args.token) {
        return Ok(Session::Token(token));
    }

    // 2. Explicit credentials
    if let Some(session) = credential_pair(&args.username, &args.password) {
        return Ok(session);
    }

    // 3. Token saved by `auth login`
    if let Some(token) = non_empty(&stored.jwt_token) {
        return Ok(Session::Token(token));
    }

    // 4. Stored credentials
    if let Some(session) = credential_pair(&stored.username, &stored.password) {
        return Ok(session);
    }

    Err(Error::auth(
        "You are not logged in. Run `bsm auth login`, or pass --token or --username/--password",
    ))
}

/// Credentials for an explicit login; a token alone is not enough here.
pub fn resolve_credentials(args: &SessionArgs, stored: &StoredConfig) -> Result<Credentials> {
    let username = non_empty(&args.username).or_else(|| non_empty(&stored.username));
    let password = non_empty(&args.password).or_else(|| non_empty(&stored.password));
    match (username, password) {
        (Some(username), Some(password)) => Ok(Credentials::new(username, password)),
        _ => Err(Error::auth(
            "Username and password are required to log in (--username/--password or BSM_USERNAME/BSM_PASSWORD)",
        )),
    }
}

pub fn base_config(args: &SessionArgs, stored: &StoredConfig) -> ClientConfig {
    let base_url = non_empty(&args.base_url).unwrap_or_else(|| stored.base_url().to_string());
    let mut config = ClientConfig::new(base_url)
        .verify_ssl(!args.no_verify_ssl && stored.verify_ssl.unwrap_or(true));
    if let Some(secs) = args.timeout_secs.or(stored.timeout_secs) {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    config
}

pub fn client_config(args: &SessionArgs, stored: &StoredConfig) -> Result<ClientConfig> {
    let config = base_config(args, stored);
    Ok(match resolve_session(args, stored)? {
        Session::Token(token) => config.with_token(token),
        Session::Credentials { username, password } => config.with_credentials(username, password),
    })
}
