//! Admin API: backend manifest and remote shutdown

use crate::error::AdminError;
use crate::manifest::Backend;
use crate::registry::Registry;
use crate::shutdown::ShutdownSignal;
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

pub const BACKEND_PATH: &str = "/backend.yaml";
pub const QUIT_PATH: &str = "/quitquitquit";

#[derive(Clone)]
struct AdminState {
    registry: Arc<Registry>,
    shutdown: ShutdownSignal,
}

/// Create the admin router
pub fn router(registry: Arc<Registry>, shutdown: ShutdownSignal) -> Router {
    Router::new()
        .route(BACKEND_PATH, get(describe_backend))
        .route(QUIT_PATH, any(quit))
        .layer(TraceLayer::new_for_http())
        .with_state(AdminState { registry, shutdown })
}

async fn describe_backend(State(state): State<AdminState>) -> Result<Response, AdminError> {
    let yaml = Backend::describe(&state.registry).to_yaml()?;
    Ok(([(header::CONTENT_TYPE, "application/x-yaml")], yaml).into_response())
}

// Graceful shutdown lets this in-flight response complete.
async fn quit(State(state): State<AdminState>) -> &'static str {
    if state.shutdown.trigger() {
        info!("Shutdown requested through admin API");
    }
    "OK\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Symbol, SymbolTable};
    use crate::test_support::TestFunction;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn registry() -> Arc<Registry> {
        let mut symbols = SymbolTable::new();
        symbols.insert("Webhook", Symbol::function(TestFunction::http()));
        symbols.insert("Listener", Symbol::function(TestFunction::event()));
        Arc::new(Registry::from_symbols(symbols))
    }

    #[tokio::test]
    async fn test_backend_yaml_lists_registered_functions() {
        let app = router(registry(), ShutdownSignal::new());
        let response = app
            .oneshot(Request::builder().uri("/backend.yaml").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let backend: Backend = serde_yaml::from_slice(&bytes).unwrap();

        assert_eq!(backend.spec_version, "v1alpha1");
        assert_eq!(backend.cloud_functions.len(), 2);
        assert!(backend.function("Webhook").unwrap().trigger.is_empty());
        assert_eq!(
            backend.function("Listener").unwrap().trigger.event_type.as_deref(),
            Some("test.event")
        );
    }

    #[tokio::test]
    async fn test_quit_acknowledges_and_triggers_shutdown() {
        let shutdown = ShutdownSignal::new();
        let app = router(registry(), shutdown.clone());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/quitquitquit")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"OK\n");
        assert!(shutdown.is_triggered());
    }
}
