//! Normalized request descriptor handed to the oracle.

use serde::Serialize;
use std::collections::HashMap;

/// The slice of an inbound request the oracle evaluates.
///
/// Built once per request by the admission layer; carries no borrow of the
/// underlying request so the oracle call can suspend freely.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RequestDescriptor {
    /// HTTP method.
    pub method: String,

    /// Request path (plus query, when present).
    pub path: String,

    /// Request headers, lowercase names.
    pub headers: HashMap<String, String>,

    /// Caller network address, best effort.
    pub client_addr: Option<String>,

    /// Partition key for quota accounting. When absent the oracle derives
    /// one from the client address.
    pub partition_key: Option<String>,
}

impl RequestDescriptor {
    /// Create an empty descriptor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set method.
    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Builder: set path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Builder: add a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_lowercase(), value.into());
        self
    }

    /// Builder: set the caller address.
    #[must_use]
    pub fn with_client_addr(mut self, addr: impl Into<String>) -> Self {
        self.client_addr = Some(addr.into());
        self
    }

    /// Builder: set the quota partition key.
    #[must_use]
    pub fn with_partition_key(mut self, key: impl Into<String>) -> Self {
        self.partition_key = Some(key.into());
        self
    }

    /// Header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    /// The user-agent header, when present.
    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.header("user-agent")
    }

    /// Identity used for quota partitioning when no explicit key is set.
    #[must_use]
    pub fn client_identity(&self) -> &str {
        self.client_addr.as_deref().unwrap_or("unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let descriptor = RequestDescriptor::new()
            .with_method("GET")
            .with_path("/api/subjects")
            .with_header("User-Agent", "curl/8.0")
            .with_client_addr("198.51.100.7")
            .with_partition_key("guest:198.51.100.7");

        assert_eq!(descriptor.method, "GET");
        assert_eq!(descriptor.user_agent(), Some("curl/8.0"));
        assert_eq!(descriptor.client_identity(), "198.51.100.7");
        assert_eq!(
            descriptor.partition_key.as_deref(),
            Some("guest:198.51.100.7")
        );
    }

    #[test]
    fn test_client_identity_fallback() {
        let descriptor = RequestDescriptor::new();
        assert_eq!(descriptor.client_identity(), "unknown");
    }
}
