//! Cluster reads over the control-plane HTTP API

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::capacity::{ClusterCapacity, InstanceClass};
use super::routes::{routes_on_gateway, PublishedRoute};
use super::source::{CapacityReader, RouteLister, SourceError};

/// Reads routes and capacity from a cluster control plane.
///
/// - `GET /v1/virtualservices?gateway=NAME` returns `{"items": [<virtual service>...]}`
/// - `GET /v1/instance-classes/NAME/capacity` returns a [`ClusterCapacity`]
#[derive(Clone)]
pub struct HttpClusterSource {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(serde::Deserialize)]
struct VirtualServiceList {
    #[serde(default)]
    items: Vec<Value>,
}

impl HttpClusterSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: None,
        }
    }

    /// Set the bearer token
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base URL extended by `segments`, each percent-encoded as one path segment
    fn endpoint_url(&self, segments: &[&str]) -> Result<reqwest::Url, SourceError> {
        let invalid = || SourceError::Http(format!("invalid cluster URL '{}'", self.base_url));
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn build_request(&self, url: reqwest::Url) -> reqwest::RequestBuilder {
        let mut req = self.client.get(url);
        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }
        req
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, SourceError> {
        let response = req
            .send()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SourceError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        response
            .json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))
    }
}

#[async_trait]
impl RouteLister for HttpClusterSource {
    async fn list_published_routes(
        &self,
        gateway: &str,
    ) -> Result<Vec<PublishedRoute>, SourceError> {
        let url = self.endpoint_url(&["v1", "virtualservices"])?;
        let req = self.build_request(url).query(&[("gateway", gateway)]);
        let list: VirtualServiceList = self.get_json(req).await?;

        let mut routes = Vec::new();
        for virtual_service in &list.items {
            routes.extend(routes_on_gateway(virtual_service, gateway)?);
        }
        Ok(routes)
    }
}

#[async_trait]
impl CapacityReader for HttpClusterSource {
    async fn read_instance_class_capacity(
        &self,
        instance_class: &InstanceClass,
    ) -> Result<ClusterCapacity, SourceError> {
        let url = self.endpoint_url(&[
            "v1",
            "instance-classes",
            instance_class.as_str(),
            "capacity",
        ])?;
        let req = self.build_request(url);
        match self.get_json(req).await {
            Err(SourceError::Api { status: 404, .. }) => {
                Err(SourceError::UnknownInstanceClass(instance_class.to_string()))
            }
            other => other,
        }
    }
}
