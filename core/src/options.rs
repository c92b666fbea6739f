//! Transport options and their merge order.
//!
//! # Design
//! Every field of `TransportOptions` is optional so a set of options can say
//! "no opinion" about a setting. `merge` layers one set over another: a field
//! set in the overriding layer always wins, an unset one falls through. The
//! client stacks three layers, lowest precedence first:
//!
//! 1. executor defaults (follow redirects, capture body, verbose),
//! 2. operation defaults (`post` forces POST, `delete` overrides the method),
//! 3. options supplied by the caller.
//!
//! `resolve` then collapses the merged set into concrete `ResolvedOptions`.

use std::time::Duration;

use crate::http::HttpMethod;

/// Per-layer transport settings. `None` means "inherit from the layer below".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportOptions {
    pub follow_redirects: Option<bool>,
    /// Keep the response body in memory. When false the body is streamed to
    /// stdout and the returned body is empty.
    pub capture_body: Option<bool>,
    pub verbose: Option<bool>,
    pub force_post: Option<bool>,
    /// Method sent in place of the default one. Takes priority over
    /// `force_post`.
    pub custom_method: Option<String>,
    /// Limit for the whole transaction, handshake included.
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
}

impl TransportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = Some(follow);
        self
    }

    pub fn capture_body(mut self, capture: bool) -> Self {
        self.capture_body = Some(capture);
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    pub fn force_post(mut self, force: bool) -> Self {
        self.force_post = Some(force);
        self
    }

    pub fn custom_method(mut self, method: impl Into<String>) -> Self {
        self.custom_method = Some(method.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Layer `overrides` on top of `self`. Fields set in `overrides` win.
    pub fn merge(&self, overrides: &TransportOptions) -> TransportOptions {
        TransportOptions {
            follow_redirects: overrides.follow_redirects.or(self.follow_redirects),
            capture_body: overrides.capture_body.or(self.capture_body),
            verbose: overrides.verbose.or(self.verbose),
            force_post: overrides.force_post.or(self.force_post),
            custom_method: overrides
                .custom_method
                .clone()
                .or_else(|| self.custom_method.clone()),
            timeout: overrides.timeout.or(self.timeout),
            connect_timeout: overrides.connect_timeout.or(self.connect_timeout),
        }
    }

    /// Collapse into concrete settings. Unset flags fall back to follow
    /// redirects, capture the body, stay quiet.
    pub fn resolve(&self) -> ResolvedOptions {
        let method = match (&self.custom_method, self.force_post) {
            (Some(method), _) => HttpMethod::from_override(method),
            (None, Some(true)) => HttpMethod::Post,
            (None, _) => HttpMethod::Get,
        };
        ResolvedOptions {
            method,
            follow_redirects: self.follow_redirects.unwrap_or(true),
            capture_body: self.capture_body.unwrap_or(true),
            verbose: self.verbose.unwrap_or(false),
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
        }
    }
}

/// Settings a transport applies to a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOptions {
    pub method: HttpMethod,
    pub follow_redirects: bool,
    pub capture_body: bool,
    pub verbose: bool,
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
}
