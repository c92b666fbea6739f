//! Blocking NTLM client for a remote data API.
//!
//! # Design
//! `NtlmClient` holds only its `ExecutorConfig` and a `Transport`; it carries
//! no mutable state between calls. Each operation is split into a `build_*`
//! method that produces the `HttpRequest` without touching the network, and
//! an executing method that hands the built request to the transport. The
//! request URL, method and merged transport options are therefore fully
//! inspectable before anything is sent.

use tracing::debug;
use url::form_urlencoded;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::options::TransportOptions;
use crate::transport::{CurlTransport, Transport};
use crate::types::{ExecutorConfig, Request};

/// Client issuing GET, POST and DELETE requests relative to a base URL.
///
/// Safe to share across threads when its transport is: every call builds its
/// own request and the transport acquires its own connection handle.
#[derive(Debug, Clone)]
pub struct NtlmClient<T = CurlTransport> {
    config: ExecutorConfig,
    transport: T,
}

impl NtlmClient<CurlTransport> {
    pub fn new(config: ExecutorConfig) -> Self {
        Self::with_transport(config, CurlTransport)
    }
}

impl<T: Transport> NtlmClient<T> {
    pub fn with_transport(config: ExecutorConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Settings applied to every request unless the operation or the caller
    /// overrides them.
    pub fn default_options(&self) -> TransportOptions {
        TransportOptions::new()
            .follow_redirects(true)
            .capture_body(true)
            .verbose(self.config.verbose)
    }

    pub fn build_get(&self, location: &str, request: &Request) -> HttpRequest {
        self.build(location, request, &TransportOptions::new())
    }

    /// POST is forced whether or not the request carries a body.
    pub fn build_post(&self, location: &str, request: &Request) -> HttpRequest {
        self.build(location, request, &TransportOptions::new().force_post(true))
    }

    pub fn build_delete(&self, location: &str, request: &Request) -> HttpRequest {
        self.build(
            location,
            request,
            &TransportOptions::new().custom_method("DELETE"),
        )
    }

    pub fn get(&self, location: &str, request: &Request) -> Result<HttpResponse, ApiError> {
        self.execute(self.build_get(location, request))
    }

    pub fn post(&self, location: &str, request: &Request) -> Result<HttpResponse, ApiError> {
        self.execute(self.build_post(location, request))
    }

    pub fn delete(&self, location: &str, request: &Request) -> Result<HttpResponse, ApiError> {
        self.execute(self.build_delete(location, request))
    }

    fn build(
        &self,
        location: &str,
        request: &Request,
        operation_defaults: &TransportOptions,
    ) -> HttpRequest {
        let options = self
            .default_options()
            .merge(operation_defaults)
            .merge(&request.options)
            .resolve();
        let body = (!request.body.is_empty()).then(|| request.body.clone());

        HttpRequest {
            method: options.method.clone(),
            url: request_url(&self.config.base_url, location, &request.query),
            headers: request.headers.clone(),
            body,
            options,
        }
    }

    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = %request.method, url = %request.url, "sending request");
        let credentials = self.config.credentials();
        let response = self.transport.execute(&request, &credentials)?;
        debug!(
            method = %request.method,
            url = %request.url,
            status = response.status,
            headers = response.headers.len(),
            "request completed"
        );
        Ok(response)
    }
}

/// Join `location` onto `base_url` and append the form-encoded query.
///
/// No `?` is added when the query is empty.
pub fn request_url(base_url: &str, location: &str, query: &[(String, String)]) -> String {
    let mut url = format!("{}/{}", base_url.trim_end_matches('/'), location);
    if !query.is_empty() {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(query)
            .finish();
        url.push('?');
        url.push_str(&encoded);
    }
    url
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::time::Duration;

    use super::*;
    use crate::headers::ResponseHeaders;
    use crate::http::HttpMethod;
    use crate::types::Credentials;

    /// Records what it was asked to send and replays a canned response.
    #[derive(Default)]
    struct RecordingTransport {
        sent: RefCell<Vec<(HttpRequest, Credentials)>>,
        fail: bool,
    }

    impl Transport for RecordingTransport {
        fn execute(
            &self,
            request: &HttpRequest,
            credentials: &Credentials,
        ) -> Result<HttpResponse, ApiError> {
            self.sent
                .borrow_mut()
                .push((request.clone(), credentials.clone()));
            if self.fail {
                return Err(ApiError::Transport {
                    url: request.url.clone(),
                    source: curl::Error::new(7),
                });
            }
            let mut headers = ResponseHeaders::new();
            headers.capture_line(b"HTTP/1.1 404 Not Found\r\n");
            headers.capture_line(b"Set-Cookie: a=1\r\n");
            headers.capture_line(b"Set-Cookie: b=2\r\n");
            Ok(HttpResponse {
                status: 404,
                headers,
                body: "missing".to_string(),
            })
        }
    }

    fn client() -> NtlmClient<RecordingTransport> {
        NtlmClient::with_transport(
            ExecutorConfig::new("https://host/api/", "svc-crm", "hunter2"),
            RecordingTransport::default(),
        )
    }

    #[test]
    fn url_joins_base_and_location() {
        let req = client().build_get("widgets/1", &Request::new());
        assert_eq!(req.url, "https://host/api/widgets/1");
        assert_eq!(req.method, HttpMethod::Get);
    }

    #[test]
    fn every_trailing_slash_is_trimmed() {
        assert_eq!(request_url("https://host/api///", "x", &[]), "https://host/api/x");
        assert_eq!(request_url("https://host/api", "x", &[]), "https://host/api/x");
    }

    #[test]
    fn query_is_form_encoded_in_order() {
        let request = Request::new()
            .query("$select", "name,city")
            .query("$filter", "name eq 'a&b'");
        let req = client().build_get("accounts", &request);
        assert_eq!(
            req.url,
            "https://host/api/accounts?%24select=name%2Ccity&%24filter=name+eq+%27a%26b%27"
        );
    }

    #[test]
    fn query_applies_to_post_and_delete_too() {
        let request = Request::new().query("a", "1");
        assert!(client().build_post("x", &request).url.ends_with("/x?a=1"));
        assert!(client().build_delete("x", &request).url.ends_with("/x?a=1"));
    }

    #[test]
    fn get_attaches_non_empty_body_and_stays_get() {
        let req = client().build_get("x", &Request::new().body("{}"));
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.body.as_deref(), Some("{}"));

        let req = client().build_get("x", &Request::new());
        assert!(req.body.is_none());
    }

    #[test]
    fn post_is_forced_with_or_without_body() {
        let req = client().build_post("x", &Request::new());
        assert_eq!(req.method, HttpMethod::Post);
        assert!(req.body.is_none());

        let req = client().build_post("x", &Request::new().body("payload"));
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.body.as_deref(), Some("payload"));
    }

    #[test]
    fn delete_is_forced_with_or_without_body() {
        let req = client().build_delete("x", &Request::new());
        assert_eq!(req.method, HttpMethod::Delete);

        let req = client().build_delete("x", &Request::new().body("why"));
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.body.as_deref(), Some("why"));
    }

    #[test]
    fn executor_defaults_apply_when_caller_is_silent() {
        let req = client().build_get("x", &Request::new());
        assert!(req.options.follow_redirects);
        assert!(req.options.capture_body);
        assert!(!req.options.verbose);
    }

    #[test]
    fn verbose_default_comes_from_config() {
        let client = NtlmClient::with_transport(
            ExecutorConfig::new("https://host/api", "u", "p").with_verbose(true),
            RecordingTransport::default(),
        );
        assert!(client.build_get("x", &Request::new()).options.verbose);
    }

    #[test]
    fn caller_options_beat_executor_defaults() {
        let options = TransportOptions::new()
            .follow_redirects(false)
            .verbose(true)
            .timeout(Duration::from_secs(3));
        let req = client().build_get("x", &Request::new().options(options));
        assert!(!req.options.follow_redirects);
        assert!(req.options.verbose);
        assert!(req.options.capture_body);
        assert_eq!(req.options.timeout, Some(Duration::from_secs(3)));
    }

    #[test]
    fn caller_options_beat_operation_defaults() {
        let options = TransportOptions::new().custom_method("PATCH");
        let req = client().build_post("x", &Request::new().options(options));
        assert_eq!(req.method, HttpMethod::Patch);

        let options = TransportOptions::new().custom_method("MERGE");
        let req = client().build_delete("x", &Request::new().options(options));
        assert_eq!(req.method, HttpMethod::Custom("MERGE".to_string()));
    }

    #[test]
    fn request_headers_are_passed_in_order() {
        let request = Request::new()
            .header("Accept", "application/json")
            .header("OData-Version", "4.0");
        let req = client().build_get("x", &request);
        assert_eq!(
            req.headers,
            vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("OData-Version".to_string(), "4.0".to_string()),
            ]
        );
    }

    #[test]
    fn execute_sends_credentials_and_returns_status_body_headers() {
        let client = client();
        let response = client.get("widgets/1", &Request::new()).unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(response.body, "missing");
        assert_eq!(response.headers.get_all("set-cookie"), ["a=1", "b=2"]);

        let sent = client.transport.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0.url, "https://host/api/widgets/1");
        assert_eq!(sent[0].1.username, "svc-crm");
        assert_eq!(sent[0].1.password, "hunter2");
    }

    #[test]
    fn transport_failure_is_surfaced_once() {
        let client = NtlmClient::with_transport(
            ExecutorConfig::new("https://host/api", "u", "p"),
            RecordingTransport {
                fail: true,
                ..Default::default()
            },
        );
        let err = client.delete("x", &Request::new()).unwrap_err();
        assert!(err.is_transport());
        assert_eq!(client.transport.sent.borrow().len(), 1);
    }
}
