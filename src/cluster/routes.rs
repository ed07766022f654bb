//! Published routes and their extraction from raw virtual service objects
//!
//! The cluster reports routing rules as loosely-typed virtual service
//! documents. Everything downstream works on [`PublishedRoute`], so the
//! schema handling is confined to [`routes_from_virtual_service`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Label carrying the name of the API that owns a virtual service
pub const OWNER_LABEL: &str = "apiName";

/// Errors extracting routes from a virtual service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteExtractionError {
    #[error("virtual service is missing field '{0}'")]
    MissingField(String),

    #[error("virtual service field '{field}' should be {expected}")]
    InvalidField {
        field: String,
        expected: &'static str,
    },
}

/// An already-active routing rule observed in the cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedRoute {
    /// Name of the API that published this route
    pub owner: String,

    pub path: String,

    /// Gateways the route is attached to
    #[serde(default)]
    pub gateways: BTreeSet<String>,
}

impl PublishedRoute {
    pub fn new(owner: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            path: path.into(),
            gateways: BTreeSet::new(),
        }
    }

    pub fn with_gateway(mut self, gateway: impl Into<String>) -> Self {
        self.gateways.insert(gateway.into());
        self
    }

    pub fn is_on_gateway(&self, gateway: &str) -> bool {
        self.gateways.contains(gateway)
    }
}

fn string_at<'a>(value: &'a Value, field: &str) -> Result<&'a str, RouteExtractionError> {
    value.as_str().ok_or_else(|| RouteExtractionError::InvalidField {
        field: field.to_string(),
        expected: "a string",
    })
}

fn array_at<'a>(value: &'a Value, field: &str) -> Result<&'a Vec<Value>, RouteExtractionError> {
    value.as_array().ok_or_else(|| RouteExtractionError::InvalidField {
        field: field.to_string(),
        expected: "an array",
    })
}

/// Gateways a virtual service is bound to (`spec.gateways`)
pub fn extract_gateways(virtual_service: &Value) -> Result<BTreeSet<String>, RouteExtractionError> {
    let gateways = virtual_service
        .pointer("/spec/gateways")
        .ok_or_else(|| RouteExtractionError::MissingField("spec.gateways".to_string()))?;

    array_at(gateways, "spec.gateways")?
        .iter()
        .map(|g| string_at(g, "spec.gateways[]").map(str::to_string))
        .collect()
}

/// Paths matched by a virtual service (`spec.http[].match[].uri.exact|prefix`)
pub fn extract_paths(virtual_service: &Value) -> Result<BTreeSet<String>, RouteExtractionError> {
    let mut paths = BTreeSet::new();

    let Some(http) = virtual_service.pointer("/spec/http") else {
        return Ok(paths);
    };

    for rule in array_at(http, "spec.http")? {
        let Some(matches) = rule.get("match") else {
            continue;
        };
        for matcher in array_at(matches, "spec.http[].match")? {
            let Some(uri) = matcher.get("uri") else {
                continue;
            };
            for kind in ["exact", "prefix"] {
                if let Some(path) = uri.get(kind) {
                    let field = format!("spec.http[].match[].uri.{}", kind);
                    paths.insert(string_at(path, &field)?.to_string());
                }
            }
        }
    }

    Ok(paths)
}

/// Project a raw virtual service into the routes it publishes.
///
/// The owner is the `apiName` label. Services without the label get an
/// empty owner, which no API name matches.
pub fn routes_from_virtual_service(
    virtual_service: &Value,
) -> Result<Vec<PublishedRoute>, RouteExtractionError> {
    let gateways = extract_gateways(virtual_service)?;
    project_routes(virtual_service, gateways)
}

/// Like [`routes_from_virtual_service`], but services not bound to `gateway`
/// yield nothing and the rest of their body is never read.
pub fn routes_on_gateway(
    virtual_service: &Value,
    gateway: &str,
) -> Result<Vec<PublishedRoute>, RouteExtractionError> {
    let gateways = extract_gateways(virtual_service)?;
    if !gateways.contains(gateway) {
        return Ok(Vec::new());
    }
    project_routes(virtual_service, gateways)
}

fn project_routes(
    virtual_service: &Value,
    gateways: BTreeSet<String>,
) -> Result<Vec<PublishedRoute>, RouteExtractionError> {
    let owner = match virtual_service.pointer(&format!("/metadata/labels/{}", OWNER_LABEL)) {
        Some(label) => string_at(label, "metadata.labels.apiName")?,
        None => "",
    };

    Ok(extract_paths(virtual_service)?
        .into_iter()
        .map(|path| PublishedRoute {
            owner: owner.to_string(),
            path,
            gateways: gateways.clone(),
        })
        .collect())
}
