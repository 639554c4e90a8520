//! Async middleware seam between the listener and downstream handlers.

use super::error::HttpResult;
use super::request::Request;
use super::response::Response;
use async_trait::async_trait;
use std::sync::Arc;

/// What to do with a request after a middleware has seen it.
#[derive(Debug)]
pub enum MiddlewareAction {
    /// Forward the request to the next middleware or handler, unmodified
    /// unless the middleware chose to annotate it.
    Continue(Request),

    /// Short-circuit with a response; downstream never sees the request.
    Respond(Response),
}

impl MiddlewareAction {
    /// Whether this action forwards the request.
    #[must_use]
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue(_))
    }
}

/// An async request interceptor.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Middleware name, for logs.
    fn name(&self) -> &str;

    /// Inspect the request before the downstream handler runs.
    async fn before(&self, request: Request) -> HttpResult<MiddlewareAction>;
}

/// An ordered chain of middleware.
pub struct MiddlewareChain {
    middleware: Vec<Arc<dyn Middleware>>,
}

impl std::fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("middleware_count", &self.middleware.len())
            .finish()
    }
}

impl MiddlewareChain {
    /// Create an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self {
            middleware: Vec::new(),
        }
    }

    /// Append middleware; it runs after everything added before it.
    pub fn add(&mut self, middleware: Arc<dyn Middleware>) {
        self.middleware.push(middleware);
    }

    /// Run the request through the chain until one middleware responds.
    pub async fn process(&self, mut request: Request) -> HttpResult<MiddlewareAction> {
        for mw in &self.middleware {
            match mw.before(request).await? {
                MiddlewareAction::Continue(req) => request = req,
                action @ MiddlewareAction::Respond(_) => return Ok(action),
            }
        }
        Ok(MiddlewareAction::Continue(request))
    }

    /// Number of middleware in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    /// Whether the chain is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }
}

impl Default for MiddlewareChain {
    fn default() -> Self {
        Self::new()
    }
}
