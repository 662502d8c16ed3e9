//! Runtime options shared by every trigger kind

use serde::{Deserialize, Serialize};

/// Instance and memory settings copied into a function's manifest entry.
/// Unset fields are omitted from the manifest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunWithOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_instances: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_instances: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_memory_mb: Option<u32>,
}

impl RunWithOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_instances(mut self, count: u32) -> Self {
        self.min_instances = Some(count);
        self
    }

    pub fn max_instances(mut self, count: u32) -> Self {
        self.max_instances = Some(count);
        self
    }

    pub fn available_memory_mb(mut self, megabytes: u32) -> Self {
        self.available_memory_mb = Some(megabytes);
        self
    }
}
