//! HTTP-triggered functions
//!
//! The callback receives the raw request and produces any
//! [`IntoResponse`]. It is served verbatim at `/<symbol>`.
//!
//! ```ignore
//! use functions_https::{Function, Request};
//! use functions_runtime::RunWithOptions;
//!
//! pub fn webhook() -> Function {
//!     Function::new(|_request: Request| async { "Hello, world!\n" })
//!         .run_with_options(RunWithOptions::new().available_memory_mb(256))
//! }
//! ```

#![deny(unsafe_code)]

use functions_runtime::{
    ApiVersion, Backend, Callback, FunctionDescriptor, FunctionSpec, RunWithOptions,
    ValidationError,
};
use std::future::Future;

pub use axum::extract::Request;
pub use axum::response::{IntoResponse, Response};

/// An HTTP-triggered function
#[derive(Debug, Clone)]
pub struct Function {
    callback: Callback,
    run_with: RunWithOptions,
}

impl Function {
    pub fn new<F, Fut, R>(handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse,
    {
        Self {
            callback: Callback::http(handler),
            run_with: RunWithOptions::default(),
        }
    }

    pub fn run_with_options(mut self, options: RunWithOptions) -> Self {
        self.run_with = options;
        self
    }

    pub fn options(&self) -> &RunWithOptions {
        &self.run_with
    }
}

impl FunctionDescriptor for Function {
    // HTTP triggers carry no options, so the trigger block stays empty.
    fn add_backend_description(&self, symbol: &str, backend: &mut Backend) {
        backend.cloud_functions.push(
            FunctionSpec::new(ApiVersion::GCF_V1, symbol).with_run_with(&self.run_with),
        );
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    fn callback(&self) -> Option<Callback> {
        Some(self.callback.clone())
    }
}
