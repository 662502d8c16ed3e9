//! Callback shapes a function can embed
//!
//! There are exactly two:
//!
//! - **HTTP**: `Fn(Request) -> impl Future<Output = impl IntoResponse>`,
//!   served verbatim
//! - **Event**: `Fn(Context, T) -> impl Future<Output = Result<(), E>>`
//!   (or `Box<T>`), where the request body is decoded as JSON into `T`
//!
//! The shape is fixed by the constructor used, so it is known at
//! registration time and never inspected per request.

use crate::context::Context;
use crate::error::InvokeError;
use axum::body::Bytes;
use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use futures::future::{self, BoxFuture};
use futures::FutureExt;
use serde::de::DeserializeOwned;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

type HttpFn = dyn Fn(Request) -> BoxFuture<'static, Response> + Send + Sync;

type EventFn = dyn Fn(Context, Bytes) -> BoxFuture<'static, Result<(), InvokeError>> + Send + Sync;

/// A function's embedded callback
#[derive(Clone)]
pub enum Callback {
    Http(HttpCallback),
    Event(EventCallback),
}

impl Callback {
    /// Callback that handles the raw HTTP request itself
    pub fn http<F, Fut, R>(handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse,
    {
        Callback::Http(HttpCallback::new(handler))
    }

    /// Event callback taking its payload by value
    pub fn event<T, F, Fut, E>(callback: F) -> Self
    where
        T: DeserializeOwned + Send + 'static,
        F: Fn(Context, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: fmt::Display,
    {
        Callback::Event(EventCallback::new(callback, |payload: Box<T>| *payload))
    }

    /// Event callback taking its payload boxed.
    ///
    /// Behaves exactly like [`Callback::event`] for the same JSON input.
    pub fn event_boxed<T, F, Fut, E>(callback: F) -> Self
    where
        T: DeserializeOwned + Send + 'static,
        F: Fn(Context, Box<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: fmt::Display,
    {
        Callback::Event(EventCallback::new(callback, |payload: Box<T>| payload))
    }

    pub fn is_http(&self) -> bool {
        matches!(self, Callback::Http(_))
    }

    pub fn is_event(&self) -> bool {
        matches!(self, Callback::Event(_))
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callback::Http(_) => f.write_str("Callback::Http"),
            Callback::Event(event) => write!(f, "Callback::Event<{}>", event.payload_type()),
        }
    }
}

/// Type-erased HTTP-shape callback
#[derive(Clone)]
pub struct HttpCallback {
    handler: Arc<HttpFn>,
}

impl HttpCallback {
    fn new<F, Fut, R>(handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse,
    {
        let handler = move |request: Request| {
            let response = handler(request);
            async move { response.await.into_response() }.boxed()
        };
        Self {
            handler: Arc::new(handler),
        }
    }

    pub fn call(&self, request: Request) -> BoxFuture<'static, Response> {
        (self.handler)(request)
    }
}

/// Type-erased event-shape callback.
///
/// Decoding happens inside the erased closure because only the constructor
/// knows the payload type.
#[derive(Clone)]
pub struct EventCallback {
    payload_type: &'static str,
    invoke: Arc<EventFn>,
}

impl EventCallback {
    fn new<T, A, F, Fut, E>(callback: F, into_arg: fn(Box<T>) -> A) -> Self
    where
        T: DeserializeOwned + Send + 'static,
        A: 'static,
        F: Fn(Context, A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: fmt::Display,
    {
        let invoke = move |context: Context, body: Bytes| {
            let payload = match decode_payload::<T>(&body) {
                Ok(payload) => payload,
                Err(err) => return future::ready(Err(err)).boxed(),
            };
            let outcome = callback(context, into_arg(payload));
            async move {
                outcome
                    .await
                    .map_err(|err| InvokeError::Callback(err.to_string()))
            }
            .boxed()
        };

        Self {
            payload_type: std::any::type_name::<T>(),
            invoke: Arc::new(invoke),
        }
    }

    /// Decode `body` and run the callback
    pub fn invoke(&self, context: Context, body: Bytes) -> BoxFuture<'static, Result<(), InvokeError>> {
        (self.invoke)(context, body)
    }

    /// Rust type name of the payload, for logs
    pub fn payload_type(&self) -> &'static str {
        self.payload_type
    }
}

// A request without a body decodes as `{}` when the payload type accepts an
// empty object (every field defaulted), and as `null` otherwise.
fn decode_payload<T: DeserializeOwned>(body: &[u8]) -> Result<Box<T>, InvokeError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        let payload = serde_json::from_slice(b"{}").or_else(|_| serde_json::from_slice(b"null"))?;
        return Ok(Box::new(payload));
    }
    Ok(Box::new(serde_json::from_slice(body)?))
}
