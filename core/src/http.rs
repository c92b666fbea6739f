//! HTTP transaction types shared by the client and its transports.
//!
//! # Design
//! `HttpRequest` is the fully-resolved form of one call: absolute URL, method,
//! headers, optional body and the transport settings that apply to it. The
//! client builds it without touching the network, and a `Transport` turns it
//! into an `HttpResponse`. All fields use owned types so a built request can be
//! inspected, logged or handed to another thread.

use std::fmt;

use crate::headers::ResponseHeaders;
use crate::options::ResolvedOptions;

/// HTTP method for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    /// Any other verb, sent verbatim as a method override.
    Custom(String),
}

impl HttpMethod {
    /// Parse a method override. Known verbs match case-insensitively; anything
    /// else is kept as given.
    pub fn from_override(method: &str) -> Self {
        match method.to_ascii_uppercase().as_str() {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "PATCH" => HttpMethod::Patch,
            "DELETE" => HttpMethod::Delete,
            "HEAD" => HttpMethod::Head,
            _ => HttpMethod::Custom(method.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Custom(method) => method,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully-built HTTP request.
///
/// Produced by `NtlmClient::build_*`; `url` already carries the query string.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub options: ResolvedOptions,
}

/// The outcome of a completed HTTP exchange.
///
/// Any status the server sent, 4xx and 5xx included, lands here. A transaction
/// that never produced a status is an `ApiError::Transport` instead.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: ResponseHeaders,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
