//! CLI command implementations
//!
//! SBIO pattern: the `build_*` helpers wire configuration into sources,
//! the `run_*` functions do the I/O and return plain reports for display.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use super::ClusterArgs;
use crate::admission::{AdmissionError, AdmissionValidator, AvailableCapacity, Reservations};
use crate::cluster::{
    CapacityReader, ClusterCapacity, ClusterStateFetcher, HttpClusterSource, InstanceClass,
    RouteLister, SourceError, StaticClusterSource,
};
use crate::config::{AdmissionConfig, ClusterEndpoint, ConfigError};
use crate::deployment::{load_batch_file, BatchError, DeploymentRequest};

/// Command errors
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    #[error("Cluster source error: {0}")]
    Source(#[from] SourceError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No cluster configured: pass --snapshot or --cluster-url, or set cluster.url in the config file")]
    NoClusterSource,
}

pub type CommandResult<T> = Result<T, CommandError>;

// ============================================================================
// Wiring
// ============================================================================

/// Apply command-line overrides on top of the loaded config
pub fn apply_overrides(config: &mut AdmissionConfig, args: &ClusterArgs) {
    if let Some(class) = &args.instance_class {
        config.instance_class = class.clone();
    }
    if let Some(url) = &args.cluster_url {
        let api_key = config.cluster.take().and_then(|c| c.api_key);
        config.cluster = Some(ClusterEndpoint {
            url: url.clone(),
            api_key,
        });
    }
}

/// The two cluster read seams, backed by one source
pub struct ClusterSource {
    pub routes: Arc<dyn RouteLister>,
    pub capacity: Arc<dyn CapacityReader>,
}

impl ClusterSource {
    fn from_source<S>(source: S) -> Self
    where
        S: RouteLister + CapacityReader + 'static,
    {
        let source = Arc::new(source);
        Self {
            routes: source.clone(),
            capacity: source,
        }
    }
}

/// Pick the cluster source: a snapshot file wins over the configured endpoint
pub fn build_source(
    config: &AdmissionConfig,
    snapshot: Option<&Path>,
) -> CommandResult<ClusterSource> {
    if let Some(path) = snapshot {
        debug!(path = %path.display(), "using cluster snapshot");
        let source = StaticClusterSource::from_file(path)?;
        return Ok(ClusterSource::from_source(source));
    }

    let endpoint = config.cluster.as_ref().ok_or(CommandError::NoClusterSource)?;
    debug!(url = %endpoint.url, "using cluster control plane");
    let mut source = HttpClusterSource::new(endpoint.url.clone());
    if let Some(key) = &endpoint.api_key {
        source = source.with_api_key(key.clone());
    }
    Ok(ClusterSource::from_source(source))
}

pub fn build_fetcher(
    config: &AdmissionConfig,
    snapshot: Option<&Path>,
) -> CommandResult<ClusterStateFetcher> {
    let source = build_source(config, snapshot)?;
    Ok(ClusterStateFetcher::new(source.routes, source.capacity))
}

pub fn build_validator(
    config: &AdmissionConfig,
    snapshot: Option<&Path>,
) -> CommandResult<AdmissionValidator> {
    let fetcher = build_fetcher(config, snapshot)?;
    Ok(AdmissionValidator::new(fetcher, config.settings())
        .with_reservations(config.reservations.clone()))
}

// ============================================================================
// Validate
// ============================================================================

/// Outcome of validating one batch file
#[derive(Debug)]
pub struct ValidationReport {
    pub instance_class: String,
    pub requests: Vec<DeploymentRequest>,
    pub error: Option<AdmissionError>,
}

impl ValidationReport {
    pub fn admitted(&self) -> bool {
        self.error.is_none()
    }
}

/// Load a batch file and validate it against the cluster
pub async fn run_validate(
    config: &AdmissionConfig,
    batch: &Path,
    snapshot: Option<&Path>,
) -> CommandResult<ValidationReport> {
    let requests = load_batch_file(batch)?;
    let validator = build_validator(config, snapshot)?;

    let error = validator.validate_batch(&requests).await.err();
    info!(
        batch = %batch.display(),
        requests = requests.len(),
        admitted = error.is_none(),
        "batch validated"
    );

    Ok(ValidationReport {
        instance_class: config.instance_class.clone(),
        requests,
        error,
    })
}

// ============================================================================
// Capacity
// ============================================================================

/// Raw and available capacity of one instance class
#[derive(Debug)]
pub struct CapacityReport {
    pub instance_class: String,
    pub raw: ClusterCapacity,
    pub reservations: Reservations,
    pub available: AvailableCapacity,
}

/// Read the instance class capacity and derive what is left for APIs
pub async fn run_capacity(
    config: &AdmissionConfig,
    snapshot: Option<&Path>,
) -> CommandResult<CapacityReport> {
    // Capacity only; a broken route listing must not hide it
    let source = build_source(config, snapshot)?;
    let class = InstanceClass::new(config.instance_class.clone());
    let raw = source.capacity.read_instance_class_capacity(&class).await?;

    let available = AvailableCapacity::derive(&raw, &config.reservations);
    Ok(CapacityReport {
        instance_class: config.instance_class.clone(),
        raw,
        reservations: config.reservations.clone(),
        available,
    })
}
