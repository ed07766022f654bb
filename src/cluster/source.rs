//! Cluster read seams and the snapshot-backed source

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::capacity::{ClusterCapacity, InstanceClass};
use super::routes::{routes_on_gateway, PublishedRoute, RouteExtractionError};

/// Errors from a single cluster read
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Route extraction failed: {0}")]
    Extraction(#[from] RouteExtractionError),

    #[error("Unknown instance class '{0}'")]
    UnknownInstanceClass(String),

    #[error("Failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// SBIO: Traits for the cluster reads (allows mocking in tests)
// ============================================================================

/// Lists routes currently published in the cluster
#[async_trait]
pub trait RouteLister: Send + Sync {
    /// Routes attached to `gateway`
    async fn list_published_routes(&self, gateway: &str)
        -> Result<Vec<PublishedRoute>, SourceError>;
}

/// Reads the raw allocatable capacity of an instance class
#[async_trait]
pub trait CapacityReader: Send + Sync {
    async fn read_instance_class_capacity(
        &self,
        instance_class: &InstanceClass,
    ) -> Result<ClusterCapacity, SourceError>;
}

// ============================================================================
// Snapshot-backed source
// ============================================================================

/// A point-in-time copy of the cluster state the admission engine reads
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSnapshot {
    /// Routes already in typed form
    #[serde(default)]
    pub routes: Vec<PublishedRoute>,

    /// Raw virtual service objects, projected into routes when listed
    #[serde(default)]
    pub virtual_services: Vec<Value>,

    /// Capacity per instance class name
    #[serde(default)]
    pub instance_classes: HashMap<String, ClusterCapacity>,
}

impl ClusterSnapshot {
    pub fn with_route(mut self, route: PublishedRoute) -> Self {
        self.routes.push(route);
        self
    }

    pub fn with_instance_class(
        mut self,
        name: impl Into<String>,
        capacity: ClusterCapacity,
    ) -> Self {
        self.instance_classes.insert(name.into(), capacity);
        self
    }
}

/// Parse a snapshot from JSON or YAML text
pub fn parse_snapshot(content: &str) -> Result<ClusterSnapshot, SourceError> {
    serde_yaml::from_str(content).map_err(|e| SourceError::Parse(e.to_string()))
}

/// Serves cluster reads from a [`ClusterSnapshot`]
#[derive(Debug, Clone, Default)]
pub struct StaticClusterSource {
    snapshot: ClusterSnapshot,
}

impl StaticClusterSource {
    pub fn new(snapshot: ClusterSnapshot) -> Self {
        Self { snapshot }
    }

    /// Load a snapshot file (JSON or YAML)
    pub fn from_file(path: &Path) -> Result<Self, SourceError> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::new(parse_snapshot(&content)?))
    }

    pub fn snapshot(&self) -> &ClusterSnapshot {
        &self.snapshot
    }
}

#[async_trait]
impl RouteLister for StaticClusterSource {
    async fn list_published_routes(
        &self,
        gateway: &str,
    ) -> Result<Vec<PublishedRoute>, SourceError> {
        let mut routes: Vec<PublishedRoute> = self
            .snapshot
            .routes
            .iter()
            .filter(|r| r.is_on_gateway(gateway))
            .cloned()
            .collect();

        for virtual_service in &self.snapshot.virtual_services {
            routes.extend(routes_on_gateway(virtual_service, gateway)?);
        }

        Ok(routes)
    }
}

#[async_trait]
impl CapacityReader for StaticClusterSource {
    async fn read_instance_class_capacity(
        &self,
        instance_class: &InstanceClass,
    ) -> Result<ClusterCapacity, SourceError> {
        self.snapshot
            .instance_classes
            .get(instance_class.as_str())
            .cloned()
            .ok_or_else(|| SourceError::UnknownInstanceClass(instance_class.to_string()))
    }
}

// ============================================================================
// SBIO: Mock implementations for testing (no I/O)
// ============================================================================
