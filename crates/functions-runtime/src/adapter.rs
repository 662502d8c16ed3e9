//! Handler adapter
//!
//! Classifies a descriptor's callback once, at registration, and produces a
//! [`FunctionHandler`] that serves one `/<symbol>` route.

use crate::callback::{Callback, EventCallback, HttpCallback};
use crate::context::Context;
use crate::descriptor::FunctionDescriptor;
use crate::error::{InvokeError, RegistrationError};
use axum::body::to_bytes;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, MethodRouter};
use http_body_util::LengthLimitError;
use std::sync::Arc;
use tracing::{debug, warn, Instrument};

/// Request-handling unit for one registered function
#[derive(Clone)]
pub struct FunctionHandler {
    symbol: Arc<str>,
    kind: HandlerKind,
    max_body_size: usize,
}

#[derive(Clone)]
enum HandlerKind {
    Http(HttpCallback),
    Event(EventCallback),
}

impl FunctionHandler {
    /// Build the handler for `descriptor`, registered as `symbol`
    pub fn for_descriptor(
        symbol: &str,
        descriptor: &dyn FunctionDescriptor,
        max_body_size: usize,
    ) -> Result<Self, RegistrationError> {
        let kind = match descriptor.callback() {
            Some(Callback::Http(callback)) => HandlerKind::Http(callback),
            Some(Callback::Event(callback)) => HandlerKind::Event(callback),
            None => {
                return Err(RegistrationError::MissingCallback {
                    symbol: symbol.to_string(),
                })
            }
        };

        Ok(Self {
            symbol: Arc::from(symbol),
            kind,
            max_body_size,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn is_event(&self) -> bool {
        matches!(self.kind, HandlerKind::Event(_))
    }

    /// Serve one request
    pub async fn handle(&self, request: Request) -> Response {
        match &self.kind {
            HandlerKind::Http(callback) => callback.call(request).await,
            HandlerKind::Event(callback) => match self.dispatch_event(callback, request).await {
                Ok(()) => StatusCode::OK.into_response(),
                Err(err) => {
                    warn!(function = %self.symbol, error = %err, "Function invocation failed");
                    err.into_response()
                }
            },
        }
    }

    async fn dispatch_event(
        &self,
        callback: &EventCallback,
        request: Request,
    ) -> Result<(), InvokeError> {
        let (parts, body) = request.into_parts();
        let context = Context::from_parts(self.symbol.clone(), &parts);
        let span = tracing::debug_span!(
            "invoke",
            function = %self.symbol,
            execution_id = %context.execution_id(),
        );

        async move {
            let body = to_bytes(body, self.max_body_size)
                .await
                .map_err(|err| self.body_error(err))?;
            debug!(
                payload = callback.payload_type(),
                bytes = body.len(),
                "Dispatching event"
            );
            callback.invoke(context, body).await
        }
        .instrument(span)
        .await
    }

    fn body_error(&self, err: axum::Error) -> InvokeError {
        if exceeds_limit(&err) {
            InvokeError::PayloadTooLarge {
                limit: self.max_body_size,
            }
        } else {
            InvokeError::Body(err.to_string())
        }
    }

    /// Route accepting `GET` and `POST`
    pub fn into_method_router(self) -> MethodRouter {
        let on_post = self.clone();
        get(move |request: Request| async move { self.handle(request).await })
            .post(move |request: Request| async move { on_post.handle(request).await })
    }
}

fn exceeds_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(err) = source {
        if err.is::<LengthLimitError>() {
            return true;
        }
        source = err.source();
    }
    false
}
