//! Request and reply types shared by the mock and echo handlers.

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderName, HeaderValue};
use hyper::{HeaderMap, Method, Response, StatusCode};
use tracing::warn;

/// Request header carrying the status code the client wants back.
pub const RESPONSE_CODE_HEADER: &str = "X-Response-Code";

/// A fully buffered inbound request.
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl IncomingRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Add a header (test and builder convenience). Invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Lowercase method name, as used for per-method lookups.
    pub fn method_key(&self) -> String {
        self.method.as_str().to_lowercase()
    }

    /// Remove the status-code request header and return its value.
    ///
    /// Values that are not valid HTTP status codes are treated as absent.
    pub fn take_response_code(&mut self) -> Option<u16> {
        let raw = self.headers.remove(RESPONSE_CODE_HEADER)?;
        let parsed = raw
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<u16>().ok())
            .filter(|code| StatusCode::from_u16(*code).is_ok());

        if parsed.is_none() {
            warn!(
                value = ?raw,
                path = %self.path,
                "Ignoring invalid {} header",
                RESPONSE_CODE_HEADER
            );
        }
        parsed
    }
}

/// Response produced by a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Reply {
    /// Create a reply with the given status. Unknown codes become 500.
    pub fn new(status: u16) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// First value of a header, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Convert into a hyper response. Headers that are not valid HTTP are dropped.
    pub fn into_response(self) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(self.body));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        for (name, value) in self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => warn!(header = %name, "Skipping invalid response header"),
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_response_code_strips_header() {
        let mut req = IncomingRequest::new(Method::GET, "/a")
            .with_header("x-response-code", "404")
            .with_header("Accept", "*/*");

        assert_eq!(req.take_response_code(), Some(404));
        assert!(req.headers.get(RESPONSE_CODE_HEADER).is_none());
        assert!(req.headers.get("accept").is_some());
        assert_eq!(req.take_response_code(), None);
    }

    #[test]
    fn test_invalid_response_code_is_absent_but_stripped() {
        for value in ["abc", "42", "", "70000"] {
            let mut req =
                IncomingRequest::new(Method::GET, "/a").with_header(RESPONSE_CODE_HEADER, value);
            assert_eq!(req.take_response_code(), None, "value {:?}", value);
            assert!(req.headers.is_empty());
        }
    }

    #[test]
    fn test_method_key() {
        assert_eq!(IncomingRequest::new(Method::POST, "/").method_key(), "post");
    }

    #[test]
    fn test_reply_into_response() {
        let response = Reply::new(201)
            .with_header("X-One", "1")
            .with_header("bad header", "x")
            .with_body("hi")
            .into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers().get("x-one").unwrap(), "1");
        assert_eq!(response.headers().len(), 1);
    }

    #[test]
    fn test_reply_header_lookup() {
        let reply = Reply::new(200).with_header("Content-Type", "text/plain");
        assert_eq!(reply.header("content-type"), Some("text/plain"));
        assert_eq!(reply.header("x-missing"), None);
    }
}
