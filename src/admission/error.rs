//! Rejection reasons returned by batch admission

use thiserror::Error;

use super::duplicates::DuplicateGroup;
use super::feasibility::{CapacityShortfall, Resource};
use super::structural::StructuralError;
use crate::cluster::ClusterStateError;

/// Why a batch was not admitted.
///
/// Every variant that concerns a request names it, so the message can be
/// shown to the submitter as-is.
#[derive(Error, Debug)]
pub enum AdmissionError {
    #[error("no apis were specified")]
    EmptyBatch,

    #[error("{identity}: {source}")]
    Structural {
        identity: String,
        position: usize,
        #[source]
        source: StructuralError,
    },

    #[error("unable to validate against cluster state: {0}")]
    ClusterStateUnavailable(#[from] ClusterStateError),

    #[error("{identity}: compute: no instances can satisfy the requested {resource} ({requested} requested, {available} available)")]
    InsufficientCapacity {
        identity: String,
        position: usize,
        resource: Resource,
        requested: String,
        available: String,
    },

    #[error("{identity}: endpoint: {route}: endpoint is already being used by api '{owner}'")]
    RouteOwnedByOther {
        identity: String,
        position: usize,
        route: String,
        owner: String,
    },

    #[error("name: multiple apis are named '{name}' (batch positions {})", join_positions(.positions))]
    DuplicateIdentity { name: String, positions: Vec<usize> },

    #[error("endpoint: multiple apis in this deployment use endpoint {route} ({})", join_names(.names))]
    DuplicateRoute { route: String, names: Vec<String> },
}

fn join_names(names: &[String]) -> String {
    names.join(", ")
}

fn join_positions(positions: &[usize]) -> String {
    positions
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl AdmissionError {
    pub fn insufficient_capacity(
        identity: &str,
        position: usize,
        shortfall: CapacityShortfall,
    ) -> Self {
        Self::InsufficientCapacity {
            identity: identity.to_string(),
            position,
            resource: shortfall.resource,
            requested: shortfall.requested,
            available: shortfall.available,
        }
    }

    pub fn duplicate_identity(group: DuplicateGroup) -> Self {
        Self::DuplicateIdentity {
            name: group.key,
            positions: group.positions,
        }
    }

    pub fn duplicate_route(group: DuplicateGroup) -> Self {
        Self::DuplicateRoute {
            route: group.key,
            names: group.names,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyBatch => "EMPTY_BATCH",
            Self::Structural { .. } => "STRUCTURAL_ERROR",
            Self::ClusterStateUnavailable(_) => "CLUSTER_STATE_UNAVAILABLE",
            Self::InsufficientCapacity { .. } => "INSUFFICIENT_CAPACITY",
            Self::RouteOwnedByOther { .. } => "ROUTE_OWNED_BY_OTHER",
            Self::DuplicateIdentity { .. } => "DUPLICATE_IDENTITY",
            Self::DuplicateRoute { .. } => "DUPLICATE_ROUTE",
        }
    }

    /// Name of the offending request, when a single one is to blame
    pub fn identity(&self) -> Option<&str> {
        match self {
            Self::Structural { identity, .. }
            | Self::InsufficientCapacity { identity, .. }
            | Self::RouteOwnedByOther { identity, .. } => Some(identity),
            Self::DuplicateIdentity { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Batch position of the request that failed its individual checks
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::Structural { position, .. }
            | Self::InsufficientCapacity { position, .. }
            | Self::RouteOwnedByOther { position, .. } => Some(*position),
            _ => None,
        }
    }

    /// The failure is in the cluster read, not in the batch
    pub fn is_cluster_unavailable(&self) -> bool {
        matches!(self, Self::ClusterStateUnavailable(_))
    }
}
