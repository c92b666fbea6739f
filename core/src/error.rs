//! Error types for the NTLM client.
//!
//! # Design
//! Only failures that leave the caller without a response are errors. A
//! server answering 4xx/5xx, including a rejected NTLM handshake, is a normal
//! `HttpResponse` whose status the caller interprets.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or no response came back: DNS failure,
    /// refused connection, TLS failure, configured timeout.
    #[error("transport failed for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: curl::Error,
    },

    /// The linked libcurl was built without NTLM, so no request can
    /// authenticate.
    #[error("linked libcurl {version} lacks NTLM support")]
    NtlmUnsupported { version: String },

    /// A raw request header line had no `:` separator.
    #[error("malformed request header line {0:?}")]
    InvalidHeader(String),

    /// A required configuration variable was not set.
    #[error("missing configuration value {0}")]
    MissingConfig(&'static str),
}

impl ApiError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport { .. })
    }
}
