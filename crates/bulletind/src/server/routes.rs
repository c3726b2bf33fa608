//! Request routing and handlers.
//!
//! | Path   | Query                 | Effect                        |
//! |--------|-----------------------|-------------------------------|
//! | `/add` | `name`, `url`         | register or update a service  |
//! | `/del` | `name`                | remove a service              |
//! | other  |                       | HTML listing of all services  |
//!
//! The add/del handlers answer with small JSON bodies such as
//! `{"status":"true"}` or `{"status":"false","msg":"wrong query string"}`.

use std::io::Cursor;

use bulletin_core::ServiceName;
use serde::Serialize;
use thiserror::Error;
use tiny_http::{Header, Response};
use tracing::{debug, error, warn};
use url::Url;

use super::page::render_service_list;
use crate::registry::RegistryHandle;

const MSG_WRONG_QUERY: &str = "wrong query string";
const MSG_INVALID_URL: &str = "invalid url parameter";
const MSG_BAD_REQUEST: &str = "Bad Request";
const MSG_UNAVAILABLE: &str = "registry unavailable";

/// Status, content type and body of a reply, before it goes on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpResponse {
    /// JSON response.
    pub fn json(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: "application/json",
            body,
        }
    }

    /// HTML response.
    pub fn html(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: "text/html; charset=utf-8",
            body,
        }
    }

    /// Plain-text response.
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body: body.into(),
        }
    }

    /// Converts into a `tiny_http` response carrying the same status,
    /// content type and body.
    pub fn into_response(self) -> Response<Cursor<Vec<u8>>> {
        let response = Response::from_string(self.body).with_status_code(self.status);

        match Header::from_bytes(&b"Content-Type"[..], self.content_type.as_bytes()) {
            Ok(header) => response.with_header(header),
            Err(()) => response,
        }
    }
}

/// JSON body of the add/del endpoints.
///
/// `status` is the string `"true"` or `"false"`, not a JSON boolean.
#[derive(Debug, Serialize)]
struct ApiReply<'a> {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    msg: Option<&'a str>,
}

impl<'a> ApiReply<'a> {
    fn ok() -> Self {
        Self {
            status: "true",
            msg: None,
        }
    }

    fn not_ok() -> Self {
        Self {
            status: "false",
            msg: None,
        }
    }

    fn failed(msg: &'a str) -> Self {
        Self {
            status: "false",
            msg: Some(msg),
        }
    }

    fn into_response(self, status: u16) -> HttpResponse {
        let body = match serde_json::to_string(&self) {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, "Failed to serialize reply");
                r#"{"status":"false"}"#.to_string()
            }
        };
        HttpResponse::json(status, body)
    }
}

/// Dispatches a parsed request URL to its handler.
pub async fn route(registry: &RegistryHandle, url: &Url) -> HttpResponse {
    match url.path() {
        "/add" => handle_add(registry, url).await,
        "/del" => handle_del(registry, url).await,
        _ => handle_list(registry).await,
    }
}

/// `GET /add?name=<name>&url=<escaped url>`
async fn handle_add(registry: &RegistryHandle, url: &Url) -> HttpResponse {
    let (Some(name), Some(service_url)) = (query_param(url, "name"), query_param(url, "url"))
    else {
        return ApiReply::failed(MSG_WRONG_QUERY).into_response(400);
    };

    let Ok(name) = ServiceName::parse(name) else {
        return ApiReply::failed(MSG_WRONG_QUERY).into_response(400);
    };

    // Clients escape the URL once more on top of query encoding
    let service_url = match query_unescape(&service_url) {
        Ok(decoded) => decoded,
        Err(e) => {
            debug!(service = %name, error = %e, "Rejected undecodable service URL");
            return ApiReply::failed(MSG_INVALID_URL).into_response(400);
        }
    };

    match registry.set_url(name, service_url).await {
        Ok(()) => ApiReply::ok().into_response(200),
        Err(e) => {
            error!(error = %e, "Registry unavailable for add");
            ApiReply::failed(MSG_UNAVAILABLE).into_response(503)
        }
    }
}

/// `GET /del?name=<name>`
async fn handle_del(registry: &RegistryHandle, url: &Url) -> HttpResponse {
    let Some(name) = query_param(url, "name") else {
        return ApiReply::failed(MSG_BAD_REQUEST).into_response(400);
    };

    let Ok(name) = ServiceName::parse(name) else {
        return ApiReply::failed(MSG_BAD_REQUEST).into_response(400);
    };

    match registry.delete(name).await {
        Ok(true) => ApiReply::ok().into_response(200),
        Ok(false) => ApiReply::not_ok().into_response(200),
        Err(e) => {
            error!(error = %e, "Registry unavailable for delete");
            ApiReply::failed(MSG_UNAVAILABLE).into_response(503)
        }
    }
}

/// `GET /`
async fn handle_list(registry: &RegistryHandle) -> HttpResponse {
    // An empty snapshot is ambiguous once the actor is gone
    if !registry.is_connected() {
        warn!("Registry unavailable for listing");
        return HttpResponse::text(503, MSG_UNAVAILABLE);
    }

    let entries = registry.snapshot().await;
    HttpResponse::html(200, render_service_list(&entries))
}

/// First value of a query parameter, percent-decoded.
fn query_param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// Errors from unescaping a query-escaped value.
#[derive(Debug, Error, PartialEq, Eq)]
enum UnescapeError {
    #[error("malformed escape at byte {0}")]
    MalformedEscape(usize),

    #[error("unescaped value is not valid UTF-8")]
    NotUtf8,
}

/// Query-unescapes `value`: `+` becomes a space and every `%` must start a
/// two-digit hex escape.
fn query_unescape(value: &str) -> Result<String, UnescapeError> {
    let bytes = value.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3);
            if !hex.is_some_and(|h| h.iter().all(u8::is_ascii_hexdigit)) {
                return Err(UnescapeError::MalformedEscape(i));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    // Literal '+' only; an escaped %2B still decodes to '+'
    let spaced = value.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| UnescapeError::NotUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn parse(target: &str) -> Url {
        Url::parse(&format!("http://localhost{target}")).unwrap()
    }

    #[test]
    fn test_query_param_first_value_decoded() {
        let url = parse("/add?name=svc1&url=http%3A%2F%2Fx&name=svc2");
        assert_eq!(query_param(&url, "name").as_deref(), Some("svc1"));
        assert_eq!(query_param(&url, "url").as_deref(), Some("http://x"));
        assert_eq!(query_param(&url, "missing"), None);
    }

    #[test]
    fn test_query_param_present_but_empty() {
        let url = parse("/del?name=");
        assert_eq!(query_param(&url, "name").as_deref(), Some(""));
    }

    #[test]
    fn test_query_unescape_valid() {
        assert_eq!(query_unescape("http://x").unwrap(), "http://x");
        assert_eq!(query_unescape("http%3A%2F%2Fx%2fa").unwrap(), "http://x/a");
        assert_eq!(query_unescape("http://x/a+b").unwrap(), "http://x/a b");
        assert_eq!(query_unescape("http://x/a%2Bb").unwrap(), "http://x/a+b");
        assert_eq!(query_unescape("").unwrap(), "");
    }

    #[test]
    fn test_query_unescape_rejects_malformed_escapes() {
        assert_eq!(
            query_unescape("http://x%zz"),
            Err(UnescapeError::MalformedEscape(8))
        );
        assert_eq!(query_unescape("http://x%"), Err(UnescapeError::MalformedEscape(8)));
        assert_eq!(query_unescape("http://x%a"), Err(UnescapeError::MalformedEscape(8)));
        assert_eq!(query_unescape("%g0"), Err(UnescapeError::MalformedEscape(0)));
    }

    #[test]
    fn test_query_unescape_rejects_non_utf8() {
        assert_eq!(query_unescape("%FF"), Err(UnescapeError::NotUtf8));
    }

    #[test]
    fn test_api_reply_bodies() {
        assert_eq!(ApiReply::ok().into_response(200).body, r#"{"status":"true"}"#);
        assert_eq!(
            ApiReply::not_ok().into_response(200).body,
            r#"{"status":"false"}"#
        );

        let response = ApiReply::failed(MSG_WRONG_QUERY).into_response(400);
        assert_eq!(response.status, 400);
        assert_eq!(response.content_type, "application/json");
        assert_eq!(
            response.body,
            r#"{"status":"false","msg":"wrong query string"}"#
        );
    }

    #[test]
    fn test_into_response_keeps_status() {
        let response = HttpResponse::json(400, r#"{"status":"false"}"#.to_string()).into_response();
        assert_eq!(response.status_code().0, 400);
    }

    #[tokio::test]
    async fn test_listing_with_registry_gone_is_unavailable() {
        let (cmd_tx, cmd_rx) = mpsc::channel(1);
        let registry = RegistryHandle::new(cmd_tx);
        drop(cmd_rx);

        let response = route(&registry, &parse("/")).await;
        assert_eq!(response.status, 503);
        assert_eq!(response.body, MSG_UNAVAILABLE);

        let response = route(&registry, &parse("/add?name=a&url=b")).await;
        assert_eq!(response.status, 503);
    }
}
