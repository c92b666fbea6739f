//! Executes built requests over the network.
//!
//! # Design
//! `Transport` is the seam between request building and I/O. The default
//! implementation, `CurlTransport`, drives libcurl because NTLM is a
//! multi-round-trip handshake that libcurl performs natively once the auth
//! scheme and credentials are set on the handle.
//!
//! Each call creates its own `Easy` handle and drops it before returning, on
//! success and failure alike, so nothing is shared between concurrent calls.

use std::io::Write;

use curl::easy::{Auth, Easy, InfoType, List};
use curl::Version;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::headers::ResponseHeaders;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::Credentials;

/// Performs one blocking HTTP exchange for a built request.
///
/// Implementations must authenticate with `credentials` using NTLM, honour
/// `request.options`, and feed every raw response header line through
/// `ResponseHeaders::capture_line`.
pub trait Transport {
    fn execute(
        &self,
        request: &HttpRequest,
        credentials: &Credentials,
    ) -> Result<HttpResponse, ApiError>;
}

/// CURLE_WEIRD_SERVER_REPLY
const WEIRD_SERVER_REPLY: i32 = 8;

/// libcurl-backed transport.
///
/// Needs a libcurl built with NTLM. curl-sys links the system libcurl when
/// pkg-config finds one; its bundled fallback has NTLM compiled out.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurlTransport;

impl CurlTransport {
    pub fn supports_ntlm() -> bool {
        Version::get().feature_ntlm()
    }

    /// Fail fast with `ApiError::NtlmUnsupported` when the linked libcurl
    /// cannot authenticate.
    pub fn ensure_ntlm() -> Result<(), ApiError> {
        let version = Version::get();
        if version.feature_ntlm() {
            return Ok(());
        }
        Err(ApiError::NtlmUnsupported {
            version: version.version().to_string(),
        })
    }
}

impl Transport for CurlTransport {
    fn execute(
        &self,
        request: &HttpRequest,
        credentials: &Credentials,
    ) -> Result<HttpResponse, ApiError> {
        Self::ensure_ntlm()?;
        perform(request, credentials).map_err(|source| {
            warn!(method = %request.method, url = %request.url, error = %source, "transport failed");
            ApiError::Transport {
                url: request.url.clone(),
                source,
            }
        })
    }
}

fn perform(request: &HttpRequest, credentials: &Credentials) -> Result<HttpResponse, curl::Error> {
    let options = &request.options;
    let mut easy = Easy::new();

    easy.url(&request.url)?;

    let mut auth = Auth::new();
    auth.ntlm(true);
    easy.http_auth(&auth)?;
    easy.username(&credentials.username)?;
    easy.password(&credentials.password)?;

    easy.follow_location(options.follow_redirects)?;
    easy.verbose(options.verbose)?;
    if let Some(timeout) = options.timeout {
        easy.timeout(timeout)?;
    }
    if let Some(timeout) = options.connect_timeout {
        easy.connect_timeout(timeout)?;
    }

    apply_method(&mut easy, &request.method, request.body.as_deref())?;

    let mut list = List::new();
    for (name, value) in &request.headers {
        list.append(&format!("{name}: {value}"))?;
    }
    easy.http_headers(list)?;

    let mut headers = ResponseHeaders::new();
    let mut body = Vec::new();
    let capture_body = options.capture_body;
    {
        let mut transfer = easy.transfer();
        transfer.header_function(|line| headers.capture_line(line) == line.len())?;
        transfer.write_function(|data| {
            if capture_body {
                body.extend_from_slice(data);
                return Ok(data.len());
            }
            // A short count makes libcurl abort the transfer.
            match std::io::stdout().write_all(data) {
                Ok(()) => Ok(data.len()),
                Err(_) => Ok(0),
            }
        })?;
        if options.verbose {
            transfer.debug_function(log_wire)?;
        }
        transfer.perform()?;
    }

    let status = u16::try_from(easy.response_code()?)
        .map_err(|_| curl::Error::new(WEIRD_SERVER_REPLY as _))?;
    Ok(HttpResponse {
        status,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

/// Configure the request method. libcurl switches to POST whenever a body is
/// attached, so any other method carrying a body is sent as an override.
fn apply_method(easy: &mut Easy, method: &HttpMethod, body: Option<&str>) -> Result<(), curl::Error> {
    match (method, body) {
        (HttpMethod::Get, None) => easy.get(true),
        (HttpMethod::Post, body) => {
            easy.post(true)?;
            easy.post_fields_copy(body.unwrap_or_default().as_bytes())
        }
        (HttpMethod::Head, _) => easy.nobody(true),
        (other, body) => {
            easy.custom_request(other.as_str())?;
            match body {
                Some(body) => easy.post_fields_copy(body.as_bytes()),
                None => Ok(()),
            }
        }
    }
}

fn log_wire(kind: InfoType, data: &[u8]) {
    let text = String::from_utf8_lossy(data);
    match kind {
        InfoType::Text => debug!(target: "curler_core::wire", "* {}", text.trim_end()),
        InfoType::HeaderOut => {
            for line in text.lines().filter(|line| !line.is_empty()) {
                if line.to_ascii_lowercase().starts_with("authorization:") {
                    debug!(target: "curler_core::wire", "> Authorization: <redacted>");
                } else {
                    debug!(target: "curler_core::wire", "> {line}");
                }
            }
        }
        InfoType::HeaderIn => debug!(target: "curler_core::wire", "< {}", text.trim_end()),
        InfoType::DataOut => debug!(target: "curler_core::wire", bytes = data.len(), "data sent"),
        InfoType::DataIn => debug!(target: "curler_core::wire", bytes = data.len(), "data received"),
        _ => {}
    }
}
