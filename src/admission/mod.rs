//! # Admission validation
//!
//! Decides whether a batch of API deployments can be accepted by the cluster
//! as it is right now:
//!
//! 1. each request is structurally valid
//! 2. each request fits on one node of the target instance class once the
//!    platform's reservations are withheld
//! 3. no request claims a route another API already publishes
//! 4. no two requests in the batch share a name or a route
//!
//! The checks are pure functions over [`ClusterState`](crate::cluster::ClusterState);
//! [`AdmissionValidator`] sequences them around a single cluster read.

pub mod collision;
pub mod duplicates;
pub mod error;
pub mod feasibility;
pub mod reservations;
pub mod structural;
pub mod validator;

pub use collision::{check_collision, normalize_route, RouteConflict};
pub use duplicates::{find_duplicate_identities, find_duplicate_routes, DuplicateGroup};
pub use error::AdmissionError;
pub use feasibility::{check_feasible, AvailableCapacity, CapacityShortfall, Resource};
pub use reservations::{Reservations, ResourceReservation};
pub use structural::{BasicStructuralValidator, StructuralError, StructuralValidator};
pub use validator::{check_batch_duplicates, AdmissionSettings, AdmissionValidator};
