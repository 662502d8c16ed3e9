//! Minimal descriptors for unit tests

use crate::callback::Callback;
use crate::context::Context;
use crate::descriptor::FunctionDescriptor;
use crate::error::ValidationError;
use crate::manifest::{ApiVersion, Backend, EventFilter, EventTrigger, FunctionSpec};
use axum::extract::Request;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Greeting {
    pub name: String,
    pub fail: bool,
}

#[derive(Debug, Clone)]
pub struct TestFunction {
    pub callback: Option<Callback>,
    pub invalid: bool,
}

impl TestFunction {
    pub fn with_callback(callback: Callback) -> Self {
        Self {
            callback: Some(callback),
            invalid: false,
        }
    }

    pub fn http() -> Self {
        Self::with_callback(Callback::http(|_request: Request| async {
            "Hello, world!\n"
        }))
    }

    /// Event function that fails when the payload asks it to
    pub fn event() -> Self {
        Self::with_callback(Callback::event(|_ctx: Context, greeting: Greeting| async move {
            if greeting.fail {
                Err(format!("cannot greet {}", greeting.name))
            } else {
                Ok(())
            }
        }))
    }

    pub fn event_boxed() -> Self {
        Self::with_callback(Callback::event_boxed(
            |_ctx: Context, greeting: Box<Greeting>| async move {
                if greeting.fail {
                    Err(format!("cannot greet {}", greeting.name))
                } else {
                    Ok(())
                }
            },
        ))
    }

    pub fn without_callback() -> Self {
        Self {
            callback: None,
            invalid: false,
        }
    }

    pub fn invalid() -> Self {
        Self {
            invalid: true,
            ..Self::http()
        }
    }
}

impl FunctionDescriptor for TestFunction {
    fn add_backend_description(&self, symbol: &str, backend: &mut Backend) {
        let mut spec = FunctionSpec::new(ApiVersion::GCF_V1, symbol);
        if matches!(self.callback, Some(Callback::Event(_))) {
            spec = spec.with_trigger(EventTrigger {
                event_type: Some("test.event".to_string()),
                event_filters: vec![EventFilter::new("resource", symbol)],
                service_account_email: None,
            });
        }
        backend.cloud_functions.push(spec);
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.invalid {
            return Err(ValidationError::Invalid("test function is invalid".to_string()));
        }
        Ok(())
    }

    fn callback(&self) -> Option<Callback> {
        self.callback.clone()
    }
}
