//! Concurrent read-through of the cluster state needed for one admission call

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use super::capacity::{ClusterCapacity, InstanceClass};
use super::routes::PublishedRoute;
use super::source::{CapacityReader, RouteLister, SourceError};

/// The cluster state could not be read
#[derive(Error, Debug)]
pub enum ClusterStateError {
    #[error("failed to list published routes: {0}")]
    RouteListing(#[source] SourceError),

    #[error("failed to read capacity of instance class '{instance_class}': {source}")]
    CapacityRead {
        instance_class: String,
        #[source]
        source: SourceError,
    },

    #[error("cluster read task for {0} did not complete: {1}")]
    TaskFailed(&'static str, String),
}

/// Everything the admission checks need from the cluster, read once per call
#[derive(Debug, Clone)]
pub struct ClusterState {
    pub routes: Vec<PublishedRoute>,
    pub capacity: ClusterCapacity,
    pub fetched_at: DateTime<Utc>,
}

impl ClusterState {
    pub fn new(routes: Vec<PublishedRoute>, capacity: ClusterCapacity) -> Self {
        Self {
            routes,
            capacity,
            fetched_at: Utc::now(),
        }
    }
}

/// Runs the route listing and the capacity read as two parallel tasks
#[derive(Clone)]
pub struct ClusterStateFetcher {
    routes: Arc<dyn RouteLister>,
    capacity: Arc<dyn CapacityReader>,
}

impl ClusterStateFetcher {
    pub fn new(routes: Arc<dyn RouteLister>, capacity: Arc<dyn CapacityReader>) -> Self {
        Self { routes, capacity }
    }

    /// Use one source for both reads
    pub fn from_source<S>(source: Arc<S>) -> Self
    where
        S: RouteLister + CapacityReader + 'static,
    {
        Self {
            routes: source.clone(),
            capacity: source,
        }
    }

    /// Read routes on `gateway` and the capacity of `instance_class`.
    ///
    /// Both reads always run to completion. When both fail, the route
    /// listing error is reported.
    pub async fn fetch(
        &self,
        instance_class: &InstanceClass,
        gateway: &str,
    ) -> Result<ClusterState, ClusterStateError> {
        debug!(instance_class = %instance_class, gateway, "reading cluster state");

        let lister = Arc::clone(&self.routes);
        let gateway = gateway.to_string();
        let routes_task =
            tokio::spawn(async move { lister.list_published_routes(&gateway).await });

        let reader = Arc::clone(&self.capacity);
        let class = instance_class.clone();
        let capacity_task =
            tokio::spawn(async move { reader.read_instance_class_capacity(&class).await });

        let (routes, capacity) = futures::future::join(routes_task, capacity_task).await;

        let routes = routes
            .map_err(|e| ClusterStateError::TaskFailed("route listing", e.to_string()))?
            .map_err(ClusterStateError::RouteListing)?;
        let capacity = capacity
            .map_err(|e| ClusterStateError::TaskFailed("capacity read", e.to_string()))?
            .map_err(|source| ClusterStateError::CapacityRead {
                instance_class: instance_class.to_string(),
                source,
            })?;

        debug!(
            routes = routes.len(),
            cpu = %capacity.cpu,
            memory = %capacity.memory,
            gpu = capacity.gpu,
            "cluster state read"
        );

        Ok(ClusterState::new(routes, capacity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::source::mock::MockClusterSource;
    use crate::quantity::Quantity;
    use std::time::Duration;
    use tokio::sync::Barrier;

    fn capacity() -> ClusterCapacity {
        ClusterCapacity::new(Quantity::from_units(4), Quantity::bytes(8 << 30), 0)
    }

    fn class() -> InstanceClass {
        InstanceClass::new("m5.xlarge")
    }

    #[tokio::test]
    async fn test_fetch_returns_both_reads() {
        let source = Arc::new(MockClusterSource::new(capacity()).with_routes(vec![
            PublishedRoute::new("a", "/a").with_gateway("apis-gateway"),
            PublishedRoute::new("b", "/b").with_gateway("other-gateway"),
        ]));
        let fetcher = ClusterStateFetcher::from_source(source.clone());

        let state = fetcher.fetch(&class(), "apis-gateway").await.unwrap();

        assert_eq!(state.routes.len(), 1);
        assert_eq!(state.capacity, capacity());
        assert_eq!(source.route_calls(), 1);
        assert_eq!(source.capacity_calls(), 1);
    }

    #[tokio::test]
    async fn test_reads_run_in_parallel() {
        // Each read blocks until the other has started
        let mut mock = MockClusterSource::new(capacity());
        mock.rendezvous = Some(Arc::new(Barrier::new(2)));
        let fetcher = ClusterStateFetcher::from_source(Arc::new(mock));

        let result =
            tokio::time::timeout(Duration::from_secs(5), fetcher.fetch(&class(), "apis-gateway"))
                .await;

        assert!(result.is_ok(), "reads were not issued concurrently");
        assert!(result.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_route_failure_waits_for_capacity_read() {
        let mut mock = MockClusterSource::new(capacity());
        mock.fail_routes = true;
        mock.capacity_delay = Some(Duration::from_millis(50));
        let source = Arc::new(mock);
        let fetcher = ClusterStateFetcher::from_source(source.clone());

        let result = fetcher.fetch(&class(), "apis-gateway").await;

        assert!(matches!(result, Err(ClusterStateError::RouteListing(_))));
        assert_eq!(source.capacity_completions(), 1);
    }

    #[tokio::test]
    async fn test_capacity_failure_is_reported() {
        let mut mock = MockClusterSource::new(capacity());
        mock.fail_capacity = true;
        let fetcher = ClusterStateFetcher::from_source(Arc::new(mock));

        let err = fetcher.fetch(&class(), "apis-gateway").await.unwrap_err();

        match err {
            ClusterStateError::CapacityRead { instance_class, .. } => {
                assert_eq!(instance_class, "m5.xlarge");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_both_failures_report_route_listing_first() {
        let mut mock = MockClusterSource::new(capacity());
        mock.fail_routes = true;
        mock.fail_capacity = true;
        // Capacity fails first in time; declaration order still wins
        mock.route_delay = Some(Duration::from_millis(50));
        let fetcher = ClusterStateFetcher::from_source(Arc::new(mock));

        let err = fetcher.fetch(&class(), "apis-gateway").await.unwrap_err();
        assert!(matches!(err, ClusterStateError::RouteListing(_)));
    }
}
