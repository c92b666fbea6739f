//! Configuration and per-call request descriptors.
//!
//! # Design
//! `ExecutorConfig` is what a client is built from and never changes after
//! that. `Request` describes everything about one call except the location:
//! query pairs, body, headers and transport overrides. Both are plain data.

use std::fmt;

use serde::Deserialize;

use crate::error::ApiError;
use crate::options::TransportOptions;

pub const ENV_BASE_URL: &str = "CURLER_BASE_URL";
pub const ENV_USERNAME: &str = "CURLER_USERNAME";
pub const ENV_PASSWORD: &str = "CURLER_PASSWORD";
pub const ENV_VERBOSE: &str = "CURLER_VERBOSE";

/// Long-lived connection settings for an `NtlmClient`.
///
/// `base_url` is kept exactly as given; trailing slashes are dealt with when a
/// request URL is built.
#[derive(Clone, Deserialize)]
pub struct ExecutorConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub verbose: bool,
}

impl ExecutorConfig {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Read `CURLER_BASE_URL`, `CURLER_USERNAME`, `CURLER_PASSWORD` and the
    /// optional `CURLER_VERBOSE` from the process environment.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(ApiError::MissingConfig(key));
        let verbose = lookup(ENV_VERBOSE)
            .map(|value| {
                matches!(
                    value.trim().to_ascii_lowercase().as_str(),
                    "1" | "true" | "yes"
                )
            })
            .unwrap_or(false);

        Ok(Self {
            base_url: required(ENV_BASE_URL)?,
            username: required(ENV_USERNAME)?,
            password: required(ENV_PASSWORD)?,
            verbose,
        })
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

impl fmt::Debug for ExecutorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("verbose", &self.verbose)
            .finish()
    }
}

/// NTLM user name and password handed to the transport on every call.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything about one call apart from its location.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub query: Vec<(String, String)>,
    /// Empty means no body.
    pub body: String,
    pub headers: Vec<(String, String)>,
    pub options: TransportOptions,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add a header given as a raw `Name: value` line.
    pub fn header_line(mut self, line: &str) -> Result<Self, ApiError> {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| ApiError::InvalidHeader(line.to_string()))?;
        self.headers
            .push((name.trim().to_string(), value.trim().to_string()));
        Ok(self)
    }

    pub fn options(mut self, options: TransportOptions) -> Self {
        self.options = options;
        self
    }
}
