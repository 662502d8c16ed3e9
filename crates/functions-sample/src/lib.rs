//! Sample functions
//!
//! [`symbols`] is the table a code generator would emit for this module:
//! every public export, functions or not. The runtime keeps the functions
//! and drops the rest.

use functions_https::Request;
use functions_runtime::{symbols, Callback, Context, RunWithOptions, SymbolTable};
use functions_pubsub::{Event, EventType};
use std::convert::Infallible;
use tracing::info;

pub const NOT_A_FUNCTION: &str =
    "Non-functions can be safely passed to the runtime to simplify code generation";

pub fn webhook() -> functions_https::Function {
    functions_https::Function::new(|_request: Request| async { "Hello, world!\n" })
        .run_with_options(RunWithOptions::new().available_memory_mb(256))
}

pub fn pubsub_listener() -> functions_pubsub::Function {
    functions_pubsub::Function::topic("topic")
        .with_event_type(EventType::v1_publish())
        .run_with_options(RunWithOptions::new().min_instances(1))
        .with_callback(Callback::event(log_event))
}

pub fn pubsub_listener2() -> functions_pubsub::Function {
    functions_pubsub::Function::topic("topic2").on_publish(log_event)
}

pub fn not_a_cloud_function(x: i32) {
    info!(x, "Not a cloud function");
}

async fn log_event(ctx: Context, event: Event) -> Result<(), Infallible> {
    info!(
        function = ctx.function(),
        execution_id = %ctx.execution_id(),
        ?event,
        "Got event"
    );
    Ok(())
}

/// Every export of this module, by name
pub fn symbols() -> SymbolTable {
    symbols! {
        "NotACloudFunction" => not_a_cloud_function,
        "NotAFunction" => NOT_A_FUNCTION,
        "PubSubListener" => pubsub_listener(),
        "PubSubListener2" => pubsub_listener2(),
        "Webhook" => webhook(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use functions_runtime::Registry;

    #[test]
    fn test_only_functions_are_registered() {
        let registry = Registry::from_symbols(symbols());

        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, ["PubSubListener", "PubSubListener2", "Webhook"]);
        assert!(!registry.contains("NotAFunction"));
        assert!(!registry.contains("NotACloudFunction"));
    }

    #[test]
    fn test_listeners_use_expected_event_types() {
        assert_eq!(pubsub_listener().event_type().as_str(), EventType::V1_PUBLISH);
        assert_eq!(pubsub_listener2().event_type().as_str(), EventType::MESSAGE_PUBLISHED);
    }
}
