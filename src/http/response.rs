//! HTTP response building and serialization.

use super::error::HttpResult;
use bytes::{Bytes, BytesMut};
use http::StatusCode;
use serde::Serialize;
use std::collections::HashMap;

/// An outbound HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    /// Status code.
    status: StatusCode,

    /// Response headers, lowercase names.
    headers: HashMap<String, String>,

    /// Response body.
    body: Bytes,
}

impl Response {
    /// Create a response builder.
    #[must_use]
    pub fn builder(status: StatusCode) -> ResponseBuilder {
        ResponseBuilder::new(status)
    }

    /// 403 Forbidden builder.
    #[must_use]
    pub fn forbidden() -> ResponseBuilder {
        ResponseBuilder::new(StatusCode::FORBIDDEN)
    }

    /// 429 Too Many Requests builder.
    #[must_use]
    pub fn too_many_requests() -> ResponseBuilder {
        ResponseBuilder::new(StatusCode::TOO_MANY_REQUESTS)
    }

    /// 500 Internal Server Error builder.
    #[must_use]
    pub fn internal_error() -> ResponseBuilder {
        ResponseBuilder::new(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
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

    /// Response body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Serialize status line, headers and body to wire bytes.
    #[must_use]
    pub fn serialize(&self) -> BytesMut {
        let mut buf = BytesMut::new();

        buf.extend_from_slice(
            format!(
                "HTTP/1.1 {} {}\r\n",
                self.status.as_u16(),
                self.status.canonical_reason().unwrap_or("")
            )
            .as_bytes(),
        );

        for (name, value) in &self.headers {
            buf.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
        }

        if !self.body.is_empty() && !self.headers.contains_key("content-length") {
            buf.extend_from_slice(format!("content-length: {}\r\n", self.body.len()).as_bytes());
        }

        buf.extend_from_slice(b"\r\n");
        buf.extend_from_slice(&self.body);
        buf
    }
}

/// Builder for [`Response`].
#[derive(Debug)]
pub struct ResponseBuilder {
    status: StatusCode,
    headers: HashMap<String, String>,
    body: Bytes,
}

impl ResponseBuilder {
    /// Create a builder for the given status.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Bytes::new(),
        }
    }

    /// Add a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_lowercase(), value.into());
        self
    }

    /// Set a JSON body and the matching content type.
    pub fn json<T: Serialize>(mut self, value: &T) -> HttpResult<Self> {
        self.body = Bytes::from(serde_json::to_vec(value)?);
        self.headers
            .insert("content-type".to_string(), "application/json".to_string());
        Ok(self)
    }

    /// Set a raw body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Build the response.
    #[must_use]
    pub fn build(self) -> Response {
        Response {
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}
