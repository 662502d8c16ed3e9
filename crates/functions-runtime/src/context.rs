//! Request-scoped context passed to event callbacks

use axum::http::{request::Parts, HeaderMap, Method, Uri};
use std::sync::Arc;
use uuid::Uuid;

/// Context of one function invocation
#[derive(Debug, Clone)]
pub struct Context {
    execution_id: Uuid,
    function: Arc<str>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
}

impl Context {
    pub(crate) fn from_parts(function: Arc<str>, parts: &Parts) -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            function,
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            headers: parts.headers.clone(),
        }
    }

    /// Unique id of this invocation, also recorded on the request's log span
    pub fn execution_id(&self) -> Uuid {
        self.execution_id
    }

    /// Name the function was registered under
    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
