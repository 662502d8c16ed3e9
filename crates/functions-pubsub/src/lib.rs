//! Pub/Sub-triggered functions
//!
//! A function listens on one topic. Its manifest entry carries the event type
//! and a single `resource` filter naming the topic, resolved against the
//! project at description time:
//!
//! ```yaml
//! trigger:
//!   eventType: google.cloud.pubsub.topic.v1.messagePublished
//!   eventFilters:
//!     - attribute: resource
//!       value: projects/my-project/topics/orders
//! ```
//!
//! Callbacks receive the decoded [`Event`] envelope.

#![deny(unsafe_code)]

use functions_runtime::{
    project_or_default, ApiVersion, Backend, Callback, Context, EventFilter, EventTrigger,
    FunctionDescriptor, FunctionSpec, RunWithOptions, ValidationError,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;

/// Pub/Sub event type advertised in the trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventType(String);

impl EventType {
    pub const V1_PUBLISH: &'static str = "google.cloud.pubsub.topic.v1.messagePublished";
    pub const MESSAGE_PUBLISHED: &'static str = "google.pubsub.topic.publish";

    pub fn new(event_type: impl Into<String>) -> Self {
        Self(event_type.into())
    }

    pub fn v1_publish() -> Self {
        Self::new(Self::V1_PUBLISH)
    }

    /// Legacy event type used by [`Function::on_publish`]
    pub fn message_published() -> Self {
        Self::new(Self::MESSAGE_PUBLISHED)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EventType {
    fn default() -> Self {
        Self::v1_publish()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A published message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message body as delivered, usually a base64 string
    #[serde(default)]
    pub data: serde_json::Value,

    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

/// Event envelope delivered to Pub/Sub callbacks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "eventId", default)]
    pub event_id: String,

    #[serde(default)]
    pub data: Message,
}

/// A Pub/Sub-triggered function
#[derive(Debug, Clone, Default)]
pub struct Function {
    event_type: EventType,
    topic: String,
    project: Option<String>,
    region: Option<String>,
    run_with: RunWithOptions,
    callback: Option<Callback>,
}

impl Function {
    /// Function listening on `topic`, without a callback yet
    pub fn topic(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Self::default()
        }
    }

    /// Set the callback and switch to the legacy publish event type
    pub fn on_publish<F, Fut, E>(mut self, callback: F) -> Self
    where
        F: Fn(Context, Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: fmt::Display,
    {
        self.event_type = EventType::message_published();
        self.callback = Some(Callback::event(callback));
        self
    }

    /// Set the callback, keeping the current event type
    pub fn with_callback(mut self, callback: Callback) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn with_event_type(mut self, event_type: EventType) -> Self {
        self.event_type = event_type;
        self
    }

    /// Project for the topic resource; `GCLOUD_PROJECT` when unset
    pub fn in_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn in_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn run_with_options(mut self, options: RunWithOptions) -> Self {
        self.run_with = options;
        self
    }

    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    pub fn topic_id(&self) -> &str {
        &self.topic
    }

    /// Fully qualified topic name used as the `resource` filter
    pub fn resource(&self) -> String {
        format!(
            "projects/{}/topics/{}",
            project_or_default(self.project.as_deref()),
            self.topic
        )
    }
}

impl FunctionDescriptor for Function {
    fn add_backend_description(&self, symbol: &str, backend: &mut Backend) {
        let trigger = EventTrigger {
            event_type: Some(self.event_type.to_string()),
            event_filters: vec![EventFilter::new("resource", self.resource())],
            ..EventTrigger::default()
        };

        backend.cloud_functions.push(
            FunctionSpec::new(ApiVersion::GCF_V1, symbol)
                .with_region(self.region.clone())
                .with_trigger(trigger)
                .with_run_with(&self.run_with),
        );
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.topic.is_empty() {
            return Err(ValidationError::MissingField {
                kind: "Pub/Sub",
                field: "topic",
            });
        }
        if self.event_type.as_str().is_empty() {
            return Err(ValidationError::Invalid(
                "Cloud Functions must have an event type".to_string(),
            ));
        }
        if self.callback.is_none() {
            return Err(ValidationError::MissingCallback);
        }
        Ok(())
    }

    fn callback(&self) -> Option<Callback> {
        self.callback.clone()
    }
}
