//! Stand-in for an NTLM-protected data API.
//!
//! Every `/api` route sits behind a stateless NTLM gate; `/open` routes do
//! not. Handlers echo what they received or produce the response shapes a
//! client has to cope with: repeated headers, redirects, arbitrary statuses.

pub mod ntlm;

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use axum::{
    extract::{Path, Request, State},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE, LOCATION, SET_COOKIE, WWW_AUTHENTICATE},
        HeaderMap, HeaderValue, Method, StatusCode, Uri,
    },
    middleware::{self, Next},
    response::{AppendHeaders, IntoResponse, Response},
    routing::{any, get},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use uuid::Uuid;

use crate::ntlm::NtlmMessage;

pub const DEFAULT_USER: &str = "svc-crm";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// What `/api/echo` saw of the request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub body: String,
    pub content_type: Option<String>,
    /// Request headers whose name starts with `x-`.
    pub custom_headers: BTreeMap<String, String>,
    pub user: String,
}

/// User name taken from a completed handshake.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser(pub String);

#[derive(Clone)]
struct Gate {
    username: Arc<str>,
}

pub fn app() -> Router {
    app_with_user(DEFAULT_USER)
}

pub fn app_with_user(username: &str) -> Router {
    let gate = Gate {
        username: Arc::from(username),
    };
    let api = Router::new()
        .route("/api/echo/{*path}", any(echo))
        .route("/api/cookies", get(cookies))
        .route("/api/redirect", get(redirect))
        .route("/api/status/{code}", any(status))
        .route("/api/slow/{millis}", get(slow))
        .route_layer(middleware::from_fn_with_state(gate, ntlm_gate));

    Router::new()
        .merge(api)
        .route("/open/landing", get(landing))
        .layer(middleware::from_fn(request_id))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_user(listener: TcpListener, username: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_user(username)).await
}

async fn ntlm_gate(State(gate): State<Gate>, mut request: Request, next: Next) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("NTLM "))
        .map(str::to_string);

    let Some(token) = token else {
        return (StatusCode::UNAUTHORIZED, [(WWW_AUTHENTICATE, "NTLM")]).into_response();
    };

    match ntlm::decode(&token) {
        Some(NtlmMessage::Negotiate) => {
            let mut nonce = [0u8; 8];
            nonce.copy_from_slice(&Uuid::new_v4().as_bytes()[..8]);
            let header = format!("NTLM {}", ntlm::challenge(nonce));
            (StatusCode::UNAUTHORIZED, [(WWW_AUTHENTICATE, header)]).into_response()
        }
        Some(NtlmMessage::Authenticate { user }) if user == *gate.username => {
            tracing::debug!(%user, path = %request.uri().path(), "ntlm handshake accepted");
            request.extensions_mut().insert(AuthenticatedUser(user));
            next.run(request).await
        }
        other => {
            tracing::debug!(ntlm = ?other, "ntlm handshake rejected");
            StatusCode::UNAUTHORIZED.into_response()
        }
    }
}

async fn request_id(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&Uuid::new_v4().to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

async fn echo(
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    body: String,
) -> Json<Echo> {
    let custom_headers = headers
        .iter()
        .filter(|(name, _)| name.as_str().starts_with("x-"))
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();

    Json(Echo {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        body,
        content_type: headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        custom_headers,
        user,
    })
}

async fn cookies() -> impl IntoResponse {
    (
        AppendHeaders([(SET_COOKIE, "a=1"), (SET_COOKIE, "b=2")]),
        "cookies set",
    )
}

async fn redirect() -> impl IntoResponse {
    (StatusCode::FOUND, [(LOCATION, "/open/landing")])
}

async fn status(Path(code): Path<u16>) -> Response {
    match StatusCode::from_u16(code) {
        Ok(status) => (status, format!("status {code}")).into_response(),
        Err(_) => StatusCode::BAD_REQUEST.into_response(),
    }
}

/// Answers after `millis` milliseconds, capped at ten seconds.
async fn slow(Path(millis): Path<u64>) -> String {
    tokio::time::sleep(Duration::from_millis(millis.min(10_000))).await;
    format!("slept {millis}ms")
}

async fn landing() -> &'static str {
    "landed"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_serializes_to_json() {
        let echo = Echo {
            method: "GET".to_string(),
            path: "/api/echo/widgets".to_string(),
            query: None,
            body: String::new(),
            content_type: None,
            custom_headers: BTreeMap::new(),
            user: DEFAULT_USER.to_string(),
        };
        let json = serde_json::to_value(&echo).unwrap();
        assert_eq!(json["method"], "GET");
        assert_eq!(json["query"], serde_json::Value::Null);
        assert_eq!(json["user"], "svc-crm");
    }

    #[test]
    fn echo_roundtrips_through_json() {
        let mut custom_headers = BTreeMap::new();
        custom_headers.insert("x-trace".to_string(), "abc".to_string());
        let echo = Echo {
            method: "DELETE".to_string(),
            path: "/api/echo/widgets/1".to_string(),
            query: Some("a=1".to_string()),
            body: "gone".to_string(),
            content_type: Some("text/plain".to_string()),
            custom_headers,
            user: "alice".to_string(),
        };
        let json = serde_json::to_string(&echo).unwrap();
        let back: Echo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, echo);
    }
}
