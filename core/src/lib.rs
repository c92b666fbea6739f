//! Blocking HTTP client for data APIs behind NTLM authentication.
//!
//! # Overview
//! `NtlmClient` turns a location relative to a base URL, query pairs, a body
//! and request headers into one HTTP transaction, authenticates it with NTLM
//! at the transport layer, and returns the status code, body and a multi-value
//! header mapping.
//!
//! # Design
//! - `NtlmClient` holds only immutable configuration; every call is
//!   independent and blocks until the exchange completes or fails.
//! - Requests are built by pure `build_*` methods and executed through the
//!   `Transport` trait. `CurlTransport` (libcurl) is the default.
//! - Transport settings are layered explicitly: executor defaults, then
//!   operation defaults, then caller options (see `options`).
//! - Non-2xx statuses are ordinary responses; only transport failures are
//!   errors.

pub mod client;
pub mod error;
pub mod headers;
pub mod http;
pub mod options;
pub mod transport;
pub mod types;

pub use client::{request_url, NtlmClient};
pub use error::ApiError;
pub use headers::ResponseHeaders;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use options::{ResolvedOptions, TransportOptions};
pub use transport::{CurlTransport, Transport};
pub use types::{Credentials, ExecutorConfig, Request};
