//! Inbound HTTP request parsing and accessors.

use super::error::{HttpError, HttpResult};
use bytes::Bytes;
use http::{Method, Uri};
use std::collections::HashMap;
use std::str::FromStr;

/// Maximum number of headers accepted when parsing.
const MAX_HEADERS: usize = 64;

/// A parsed inbound request.
///
/// Header names are stored lowercase; lookups are case-insensitive.
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method.
    method: Method,

    /// Request URI.
    uri: Uri,

    /// Request headers, lowercase names.
    headers: HashMap<String, String>,

    /// Request body.
    body: Bytes,

    /// Transport-level peer address, when the listener knows it.
    remote_addr: Option<String>,
}

impl Request {
    /// Create a request builder.
    #[must_use]
    pub fn builder() -> RequestBuilder {
        RequestBuilder::new()
    }

    /// Parse a request head (and body, if present) from raw bytes.
    pub fn parse(data: &[u8]) -> HttpResult<Self> {
        let mut header_buf = [httparse::EMPTY_HEADER; MAX_HEADERS];
        let mut parsed = httparse::Request::new(&mut header_buf);

        let body_offset = match parsed.parse(data)? {
            httparse::Status::Complete(offset) => offset,
            httparse::Status::Partial => return Err(HttpError::Incomplete),
        };

        let method = parsed
            .method
            .ok_or_else(|| HttpError::InvalidRequestLine("missing method".to_string()))
            .and_then(|m| {
                Method::from_str(m)
                    .map_err(|_| HttpError::InvalidRequestLine(format!("bad method: {m}")))
            })?;

        let uri = parsed
            .path
            .ok_or_else(|| HttpError::InvalidRequestLine("missing path".to_string()))
            .and_then(|p| {
                Uri::from_str(p).map_err(|_| HttpError::InvalidRequestLine(format!("bad uri: {p}")))
            })?;

        let mut headers = HashMap::with_capacity(parsed.headers.len());
        for header in parsed.headers.iter() {
            headers.insert(
                header.name.to_lowercase(),
                String::from_utf8_lossy(header.value).into_owned(),
            );
        }

        Ok(Self {
            method,
            uri,
            headers,
            body: Bytes::copy_from_slice(&data[body_offset..]),
            remote_addr: None,
        })
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Raw query string, if any.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    /// All headers (lowercase names).
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Transport-level peer address.
    #[must_use]
    pub fn remote_addr(&self) -> Option<&str> {
        self.remote_addr.as_deref()
    }

    /// Record the peer address the listener accepted from.
    pub fn set_remote_addr(&mut self, addr: impl Into<String>) {
        self.remote_addr = Some(addr.into());
    }

    /// Set a header value.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers
            .insert(name.into().to_lowercase(), value.into());
    }
}

/// Builder for assembling requests directly (handlers, tests).
#[derive(Debug, Default)]
pub struct RequestBuilder {
    method: Option<Method>,
    uri: Option<Uri>,
    headers: HashMap<String, String>,
    body: Bytes,
    remote_addr: Option<String>,
}

impl RequestBuilder {
    /// Create an empty builder (GET / by default).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Set the URI from a string; invalid input falls back to `/`.
    #[must_use]
    pub fn uri(mut self, uri: impl AsRef<str>) -> Self {
        self.uri = Uri::from_str(uri.as_ref()).ok();
        self
    }

    /// Add a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_lowercase(), value.into());
        self
    }

    /// Set the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Set the peer address.
    #[must_use]
    pub fn remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    /// Build the request.
    #[must_use]
    pub fn build(self) -> Request {
        Request {
            method: self.method.unwrap_or(Method::GET),
            uri: self.uri.unwrap_or_else(|| Uri::from_static("/")),
            headers: self.headers,
            body: self.body,
            remote_addr: self.remote_addr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_request() {
        let data = b"GET /api/subjects?page=2 HTTP/1.1\r\nHost: example.com\r\nUser-Agent: curl/8.0\r\n\r\n";
        let request = Request::parse(data).unwrap();

        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.path(), "/api/subjects");
        assert_eq!(request.query(), Some("page=2"));
        assert_eq!(request.header("host"), Some("example.com"));
        assert_eq!(request.header("USER-AGENT"), Some("curl/8.0"));
    }

    #[test]
    fn test_parse_with_body() {
        let data = b"POST /api HTTP/1.1\r\nContent-Length: 4\r\n\r\nabcd";
        let request = Request::parse(data).unwrap();
        assert_eq!(request.body().as_ref(), b"abcd");
    }

    #[test]
    fn test_parse_partial_is_rejected() {
        let data = b"GET /api HTTP/1.1\r\nHost: exa";
        assert!(matches!(
            Request::parse(data),
            Err(HttpError::Incomplete)
        ));
    }

    #[test]
    fn test_builder() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/subjects")
            .header("X-Request-Id", "req-1")
            .remote_addr("203.0.113.9:4711")
            .build();

        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.path(), "/api/subjects");
        assert_eq!(request.header("x-request-id"), Some("req-1"));
        assert_eq!(request.remote_addr(), Some("203.0.113.9:4711"));
    }

    #[test]
    fn test_header_case_insensitive_set() {
        let mut request = Request::builder().build();
        request.set_header("X-Custom", "v");
        assert_eq!(request.header("x-custom"), Some("v"));
    }
}
