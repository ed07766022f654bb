//! Batch admission: the single entry point callers run before committing a deployment

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::collision::check_collision;
use super::duplicates::{find_duplicate_identities, find_duplicate_routes};
use super::error::AdmissionError;
use super::feasibility::{check_feasible, AvailableCapacity};
use super::reservations::Reservations;
use super::structural::{BasicStructuralValidator, StructuralValidator};
use crate::cluster::{ClusterState, ClusterStateFetcher, InstanceClass, DEFAULT_INGRESS_GATEWAY};
use crate::deployment::DeploymentRequest;

/// Where a batch is being deployed
#[derive(Debug, Clone)]
pub struct AdmissionSettings {
    /// Instance class whose capacity bounds every request
    pub instance_class: InstanceClass,

    /// Gateway API routes are published on
    pub ingress_gateway: String,
}

impl AdmissionSettings {
    pub fn new(instance_class: impl Into<String>) -> Self {
        Self {
            instance_class: InstanceClass::new(instance_class),
            ingress_gateway: DEFAULT_INGRESS_GATEWAY.to_string(),
        }
    }

    pub fn with_ingress_gateway(mut self, gateway: impl Into<String>) -> Self {
        self.ingress_gateway = gateway.into();
        self
    }
}

/// Validates batches of deployment requests against live cluster state.
///
/// Holds no per-call state; one validator can serve concurrent callers.
#[derive(Clone)]
pub struct AdmissionValidator {
    fetcher: ClusterStateFetcher,
    structural: Arc<dyn StructuralValidator>,
    reservations: Reservations,
    settings: AdmissionSettings,
}

impl AdmissionValidator {
    pub fn new(fetcher: ClusterStateFetcher, settings: AdmissionSettings) -> Self {
        Self {
            fetcher,
            structural: Arc::new(BasicStructuralValidator),
            reservations: Reservations::default(),
            settings,
        }
    }

    pub fn with_reservations(mut self, reservations: Reservations) -> Self {
        self.reservations = reservations;
        self
    }

    pub fn with_structural_validator(mut self, validator: Arc<dyn StructuralValidator>) -> Self {
        self.structural = validator;
        self
    }

    pub fn settings(&self) -> &AdmissionSettings {
        &self.settings
    }

    pub fn reservations(&self) -> &Reservations {
        &self.reservations
    }

    /// Admit or reject a batch.
    ///
    /// Order: empty check, one cluster read, then per request (in batch
    /// order) structure, capacity and route collisions, then duplicate names
    /// and duplicate routes across the batch. The first failure is returned.
    pub async fn validate_batch(&self, requests: &[DeploymentRequest]) -> Result<(), AdmissionError> {
        if requests.is_empty() {
            return Err(AdmissionError::EmptyBatch);
        }

        info!(
            requests = requests.len(),
            instance_class = %self.settings.instance_class,
            "validating deployment batch"
        );

        let state = self
            .fetcher
            .fetch(&self.settings.instance_class, &self.settings.ingress_gateway)
            .await
            .inspect_err(|e| warn!(error = %e, "cluster state unavailable"))?;

        self.validate_against(requests, &state)
    }

    /// Validate a batch against already-fetched cluster state (no I/O)
    pub fn validate_against(
        &self,
        requests: &[DeploymentRequest],
        state: &ClusterState,
    ) -> Result<(), AdmissionError> {
        if requests.is_empty() {
            return Err(AdmissionError::EmptyBatch);
        }

        // Derived once; every request is checked against the same value
        let available = AvailableCapacity::derive(&state.capacity, &self.reservations);
        debug!(
            cpu = %available.cpu(),
            memory = %available.memory(),
            gpu = available.gpu(),
            "available capacity after reservations"
        );

        let result = requests
            .iter()
            .enumerate()
            .try_for_each(|(position, request)| {
                self.validate_request(position, request, &available, state)
            })
            .and_then(|()| check_batch_duplicates(requests));

        match &result {
            Ok(()) => info!(requests = requests.len(), "batch admitted"),
            Err(e) => warn!(code = e.code(), error = %e, "batch rejected"),
        }
        result
    }

    fn validate_request(
        &self,
        position: usize,
        request: &DeploymentRequest,
        available: &AvailableCapacity,
        state: &ClusterState,
    ) -> Result<(), AdmissionError> {
        let identity = request.identify();

        self.structural
            .validate_structure(request)
            .map_err(|source| AdmissionError::Structural {
                identity: identity.to_string(),
                position,
                source,
            })?;

        check_feasible(&request.compute, available).map_err(|shortfall| {
            AdmissionError::insufficient_capacity(identity, position, shortfall)
        })?;

        check_collision(request, &state.routes, &self.settings.ingress_gateway).map_err(
            |conflict| AdmissionError::RouteOwnedByOther {
                identity: identity.to_string(),
                position,
                route: conflict.route,
                owner: conflict.owner,
            },
        )?;

        debug!(api = identity, "request passed individual checks");
        Ok(())
    }
}

/// Batch-level checks, run only once every request is individually valid
pub fn check_batch_duplicates(requests: &[DeploymentRequest]) -> Result<(), AdmissionError> {
    if let Some(group) = find_duplicate_identities(requests) {
        return Err(AdmissionError::duplicate_identity(group));
    }
    if let Some(group) = find_duplicate_routes(requests) {
        return Err(AdmissionError::duplicate_route(group));
    }
    Ok(())
}
