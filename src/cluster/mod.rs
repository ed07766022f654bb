//! # Cluster state
//!
//! The admission engine never mutates the cluster. It needs two read-only
//! views, fetched fresh for every validation call:
//!
//! - the routes already published on the API ingress gateway
//! - the raw allocatable capacity of the instance class the batch targets
//!
//! Reads go through the [`RouteLister`] and [`CapacityReader`] traits so the
//! same engine runs against a live control plane ([`HttpClusterSource`]) or a
//! snapshot file ([`StaticClusterSource`]).

pub mod capacity;
pub mod fetcher;
pub mod http;
pub mod routes;
pub mod source;

pub use capacity::{ClusterCapacity, InstanceClass};
pub use fetcher::{ClusterState, ClusterStateError, ClusterStateFetcher};
pub use http::HttpClusterSource;
pub use routes::{
    routes_from_virtual_service, routes_on_gateway, PublishedRoute, RouteExtractionError,
};
pub use source::{
    parse_snapshot, CapacityReader, ClusterSnapshot, RouteLister, SourceError,
    StaticClusterSource,
};

/// Gateway that user-facing API routes are published on
pub const DEFAULT_INGRESS_GATEWAY: &str = "apis-gateway";
