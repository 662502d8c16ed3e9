//! Functions Runtime
//!
//! Serves a table of exported cloud functions locally and describes them to
//! deployment tooling:
//!
//! - **Registry**: keeps the exports that implement [`FunctionDescriptor`]
//!   and ignores everything else
//! - **Handler adapter**: turns each descriptor's [`Callback`] into a route
//!   handler (HTTP shape installed verbatim, event shape decoded from JSON)
//! - **Backend manifest**: rebuilt from the registry on every
//!   `GET /backend.yaml`
//! - **Server lifecycle**: a function listener plus an optional admin
//!   listener sharing one graceful shutdown signal
//!
//! ## Usage
//!
//! ```ignore
//! use functions_runtime::symbols;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), functions_runtime::RuntimeError> {
//!     functions_runtime::serve(symbols! {
//!         "Webhook" => my_functions::webhook(),
//!         "Greeting" => "not a function, ignored",
//!     })
//!     .await
//! }
//! ```

#![deny(unsafe_code)]

pub mod adapter;
pub mod admin;
pub mod callback;
pub mod config;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod manifest;
pub mod registry;
pub mod runwith;
pub mod server;
pub mod shutdown;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports
pub use adapter::FunctionHandler;
pub use callback::{Callback, EventCallback, HttpCallback};
pub use config::ServerConfig;
pub use context::Context;
pub use descriptor::FunctionDescriptor;
pub use error::{
    AdminError, ConfigError, InvokeError, RegistrationError, RuntimeError, ValidationError,
};
pub use manifest::{
    project_or_default, ApiVersion, Backend, EventFilter, EventTrigger, FunctionSpec,
    ScheduleRetryConfig, ScheduleSpec, TargetService, TopicSpec, Transport, SPEC_VERSION,
};
pub use registry::{Registry, Symbol, SymbolTable};
pub use runwith::RunWithOptions;
pub use server::{Server, ServerHandle, ServerState};
pub use shutdown::ShutdownSignal;

/// Serve `symbols` with configuration taken from `PORT` and `ADMIN_PORT`.
///
/// Returns once both listeners have stopped after a shutdown signal.
pub async fn serve(symbols: SymbolTable) -> Result<(), RuntimeError> {
    Server::from_env(symbols)?.serve().await
}
