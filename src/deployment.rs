//! Deployment requests - the unit of admission
//!
//! A batch is the list of [`DeploymentRequest`]s submitted together. Batch
//! files may be JSON or YAML, either a bare list or `{ "requests": [...] }`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::quantity::Quantity;

/// CPU requested when a manifest omits it
pub const DEFAULT_CPU_MILLIS: i64 = 200;

/// Errors reading a batch file
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Failed to read batch file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse batch: {0}")]
    Parse(String),
}

/// One API deployment submitted for admission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRequest {
    /// Identity of the API; unique within a batch
    pub name: String,

    /// Route the API is published under (e.g. "/iris-classifier")
    #[serde(default, alias = "endpoint", skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,

    /// Compute needs of a single replica
    #[serde(default)]
    pub compute: ComputeSpec,
}

/// Per-replica compute needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeSpec {
    #[serde(default = "default_cpu")]
    pub cpu: Quantity,

    /// None means no memory constraint, not zero memory
    #[serde(default, alias = "mem", skip_serializing_if = "Option::is_none")]
    pub memory: Option<Quantity>,

    #[serde(default)]
    pub gpu: u32,
}

fn default_cpu() -> Quantity {
    Quantity::milli(DEFAULT_CPU_MILLIS)
}

impl Default for ComputeSpec {
    fn default() -> Self {
        Self {
            cpu: default_cpu(),
            memory: None,
            gpu: 0,
        }
    }
}

impl ComputeSpec {
    pub fn new(cpu: Quantity) -> Self {
        Self {
            cpu,
            memory: None,
            gpu: 0,
        }
    }

    pub fn with_memory(mut self, memory: Quantity) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn with_gpu(mut self, gpu: u32) -> Self {
        self.gpu = gpu;
        self
    }
}

impl DeploymentRequest {
    pub fn new(name: impl Into<String>, compute: ComputeSpec) -> Self {
        Self {
            name: name.into(),
            route: None,
            compute,
        }
    }

    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    /// Human-readable identity used in error attribution
    pub fn identify(&self) -> &str {
        &self.name
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BatchDocument {
    List(Vec<DeploymentRequest>),
    Wrapped { requests: Vec<DeploymentRequest> },
}

// ============================================================================
// SBIO: Pure parsing (no I/O)
// ============================================================================

/// Parse a batch from JSON or YAML text
pub fn parse_batch(content: &str) -> Result<Vec<DeploymentRequest>, BatchError> {
    // YAML is a superset of JSON, so one parser covers both
    let document: BatchDocument =
        serde_yaml::from_str(content).map_err(|e| BatchError::Parse(e.to_string()))?;
    Ok(match document {
        BatchDocument::List(requests) => requests,
        BatchDocument::Wrapped { requests } => requests,
    })
}

/// Load a batch file from disk
pub fn load_batch_file(path: &Path) -> Result<Vec<DeploymentRequest>, BatchError> {
    let content = std::fs::read_to_string(path)?;
    parse_batch(&content)
}
