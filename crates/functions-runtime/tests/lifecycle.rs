use functions_runtime::{
    symbols, ApiVersion, Backend, Callback, Context, FunctionDescriptor, FunctionSpec, Registry,
    Server, ServerConfig, ServerState, ValidationError,
};
use serde::Deserialize;
use std::time::{Duration, Instant};

#[derive(Debug, Deserialize)]
struct Order {
    id: u64,
}

#[derive(Clone)]
struct Function {
    callback: Callback,
}

impl FunctionDescriptor for Function {
    fn add_backend_description(&self, symbol: &str, backend: &mut Backend) {
        backend
            .cloud_functions
            .push(FunctionSpec::new(ApiVersion::GCF_V1, symbol));
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    fn callback(&self) -> Option<Callback> {
        Some(self.callback.clone())
    }
}

fn orders() -> Function {
    Function {
        callback: Callback::event(|_ctx: Context, order: Order| async move {
            if order.id == 0 {
                Err("order id must be positive")
            } else {
                Ok(())
            }
        }),
    }
}

fn slow() -> Function {
    Function {
        callback: Callback::http(|_request| async {
            tokio::time::sleep(Duration::from_millis(300)).await;
            "done"
        }),
    }
}

fn stuck() -> Function {
    Function {
        callback: Callback::http(|_request| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            "too late"
        }),
    }
}

async fn start() -> functions_runtime::ServerHandle {
    let registry = Registry::from_symbols(symbols! {
        "Orders" => orders(),
        "Slow" => slow(),
        "Banner" => "not a function",
    });
    let config = ServerConfig::default().with_port(0).with_admin_port(0);
    Server::new(registry, config)
        .expect("server should build")
        .bind()
        .await
        .expect("listeners should bind")
}

#[tokio::test]
async fn event_function_round_trip_over_tcp() {
    let handle = start().await;
    let client = reqwest::Client::new();
    let base = format!("http://{}", handle.local_addr());

    let ok = client
        .post(format!("{base}/Orders"))
        .json(&serde_json::json!({ "id": 7 }))
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status(), 200);
    assert!(ok.text().await.unwrap().is_empty());

    let failed = client
        .post(format!("{base}/Orders"))
        .json(&serde_json::json!({ "id": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(failed.status(), 500);
    assert_eq!(failed.text().await.unwrap(), "order id must be positive");

    let missing = client.get(format!("{base}/Banner")).send().await.unwrap();
    assert_eq!(missing.status(), 404);

    handle.shutdown();
    handle.wait().await.unwrap();
}

#[tokio::test]
async fn admin_endpoint_serves_manifest() {
    let handle = start().await;
    let admin = handle.admin_addr().expect("admin enabled");

    let yaml = reqwest::get(format!("http://{admin}/backend.yaml"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    let backend: Backend = serde_yaml::from_str(&yaml).unwrap();

    assert_eq!(backend.cloud_functions.len(), 2);
    assert!(backend.function("Orders").is_some());
    assert!(backend.function("Banner").is_none());

    handle.shutdown();
    handle.wait().await.unwrap();
}

#[tokio::test]
async fn quitquitquit_drains_both_listeners() {
    let handle = start().await;
    let base = format!("http://{}", handle.local_addr());
    let admin = handle.admin_addr().expect("admin enabled");
    let mut states = handle.state_changes();
    assert_eq!(handle.state(), ServerState::Serving);

    // Request in flight when shutdown starts still completes.
    let in_flight = tokio::spawn(async move {
        reqwest::get(format!("{base}/Slow"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap()
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let ack = reqwest::Client::new()
        .post(format!("http://{admin}/quitquitquit"))
        .send()
        .await
        .unwrap();
    assert_eq!(ack.status(), 200);
    assert_eq!(ack.text().await.unwrap(), "OK\n");

    let local_addr = handle.local_addr();
    tokio::time::timeout(Duration::from_secs(6), handle.wait())
        .await
        .expect("server should stop within the grace period")
        .unwrap();

    assert_eq!(*states.borrow_and_update(), ServerState::Stopped);
    assert_eq!(in_flight.await.unwrap(), "done");

    // Listeners no longer accept connections.
    let refused = reqwest::get(format!("http://{local_addr}/Orders")).await;
    assert!(refused.is_err());
}

#[tokio::test]
async fn grace_period_expiry_forces_stop() {
    let registry = Registry::from_symbols(symbols! {
        "Stuck" => stuck(),
    });
    let config = ServerConfig::default()
        .with_port(0)
        .with_grace_period(Duration::from_millis(300));
    let handle = Server::new(registry, config)
        .expect("server should build")
        .bind()
        .await
        .expect("listener should bind");

    let url = format!("http://{}/Stuck", handle.local_addr());
    let _in_flight = tokio::spawn(async move { reqwest::get(url).await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut states = handle.state_changes();
    handle.shutdown();
    let started = Instant::now();
    tokio::time::timeout(Duration::from_secs(2), handle.wait())
        .await
        .expect("wait should return at the grace deadline")
        .unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_millis(250), "returned after {elapsed:?}");
    assert!(elapsed < Duration::from_millis(1500), "returned after {elapsed:?}");
    assert_eq!(*states.borrow_and_update(), ServerState::Stopped);
}
