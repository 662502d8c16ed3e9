//! Backend manifest served at `/backend.yaml`
//!
//! The manifest is never cached. [`Backend::describe`] starts from an empty
//! shell and lets every registered function append its own resources, so the
//! document always reflects the registry at request time.

use crate::registry::Registry;
use crate::runwith::RunWithOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Manifest schema version understood by deployment tooling
pub const SPEC_VERSION: &str = "v1alpha1";

/// Project used for resource names when a function does not set one
pub const PROJECT_ENV: &str = "GCLOUD_PROJECT";

/// Cloud Functions API generation, serialized as a bare integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiVersion(pub u8);

impl ApiVersion {
    pub const GCF_V1: ApiVersion = ApiVersion(1);
    pub const GCF_V2: ApiVersion = ApiVersion(2);
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilter {
    pub attribute: String,
    pub value: String,
}

impl EventFilter {
    pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }
}

/// Trigger block of a function spec.
///
/// HTTP functions carry an empty trigger; event functions fill in the event
/// type and filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTrigger {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_filters: Vec<EventFilter>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_email: Option<String>,
}

impl EventTrigger {
    pub fn is_empty(&self) -> bool {
        self.event_type.is_none()
            && self.event_filters.is_empty()
            && self.service_account_email.is_none()
    }

    pub fn filter(&self, attribute: &str) -> Option<&str> {
        self.event_filters
            .iter()
            .find(|f| f.attribute == attribute)
            .map(|f| f.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSpec {
    pub api_version: ApiVersion,
    pub entry_point: String,
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    #[serde(default)]
    pub trigger: EventTrigger,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_instances: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_instances: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_memory_mb: Option<u32>,
}

impl FunctionSpec {
    /// Spec for the function exported as `symbol`, with an empty trigger
    pub fn new(api_version: ApiVersion, symbol: &str) -> Self {
        Self {
            api_version,
            entry_point: format!("{symbol}.Callback"),
            id: symbol.to_string(),
            region: None,
            project: None,
            trigger: EventTrigger::default(),
            min_instances: None,
            max_instances: None,
            available_memory_mb: None,
        }
    }

    pub fn with_trigger(mut self, trigger: EventTrigger) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }

    pub fn with_run_with(mut self, options: &RunWithOptions) -> Self {
        self.min_instances = options.min_instances;
        self.max_instances = options.max_instances;
        self.available_memory_mb = options.available_memory_mb;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetService {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSpec {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    pub target_service: TargetService,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRetryConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
}

/// How a scheduler job reaches its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Pubsub,
    Https,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSpec {
    pub id: String,
    pub project: String,
    pub schedule: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,

    #[serde(default)]
    pub retry_config: ScheduleRetryConfig,

    pub transport: Transport,
    pub target_service: TargetService,
}

/// The manifest document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backend {
    pub spec_version: String,

    #[serde(rename = "requiredAPIs", default)]
    pub required_apis: BTreeMap<String, String>,

    #[serde(default)]
    pub cloud_functions: Vec<FunctionSpec>,

    #[serde(default)]
    pub topics: Vec<TopicSpec>,

    #[serde(default)]
    pub schedules: Vec<ScheduleSpec>,
}

impl Default for Backend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend {
    /// Empty shell at the current spec version
    pub fn new() -> Self {
        Self {
            spec_version: SPEC_VERSION.to_string(),
            required_apis: BTreeMap::new(),
            cloud_functions: Vec::new(),
            topics: Vec::new(),
            schedules: Vec::new(),
        }
    }

    /// Build a fresh manifest from every function in `registry`
    pub fn describe(registry: &Registry) -> Self {
        let mut backend = Self::new();
        for (symbol, descriptor) in registry.iter() {
            descriptor.add_backend_description(symbol, &mut backend);
        }
        backend
    }

    /// Total number of resources across all lists
    pub fn resource_count(&self) -> usize {
        self.cloud_functions.len() + self.topics.len() + self.schedules.len()
    }

    pub fn function(&self, id: &str) -> Option<&FunctionSpec> {
        self.cloud_functions.iter().find(|f| f.id == id)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// `project` when it is set and non-empty, otherwise `GCLOUD_PROJECT`
pub fn project_or_default(project: Option<&str>) -> String {
    match project {
        Some(project) if !project.is_empty() => project.to_string(),
        _ => std::env::var(PROJECT_ENV).unwrap_or_default(),
    }
}
