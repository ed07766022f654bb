//! Structural (schema-level) checks on a single request
//!
//! Field-level validation is owned by whoever defines the API schema; the
//! engine only needs the [`StructuralValidator`] seam. [`BasicStructuralValidator`]
//! covers the invariants every request must satisfy regardless of schema.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::deployment::DeploymentRequest;

/// Lowercase RFC 1123 label: names become hostnames and resource names
static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]{0,61}[a-z0-9])?$").expect("name pattern is valid")
});

/// A request is malformed on its own
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("name: must not be empty")]
    EmptyName,

    #[error("name: '{0}' must consist of lowercase alphanumeric characters or '-', start and end with an alphanumeric character, and be at most 63 characters")]
    InvalidName(String),

    #[error("endpoint: '{0}' must start with '/'")]
    InvalidRoute(String),

    #[error("compute: cpu: must be greater than 0 (got {0})")]
    NonPositiveCpu(String),

    #[error("compute: mem: must be greater than 0 (got {0})")]
    NonPositiveMemory(String),

    /// Raised by schema validators outside this crate
    #[error("{0}")]
    Other(String),
}

/// Per-request schema validation
pub trait StructuralValidator: Send + Sync {
    fn validate_structure(&self, request: &DeploymentRequest) -> Result<(), StructuralError>;
}

/// Minimal structural checks: valid name, rooted route, positive compute
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicStructuralValidator;

impl StructuralValidator for BasicStructuralValidator {
    fn validate_structure(&self, request: &DeploymentRequest) -> Result<(), StructuralError> {
        if request.name.is_empty() {
            return Err(StructuralError::EmptyName);
        }
        if !NAME_PATTERN.is_match(&request.name) {
            return Err(StructuralError::InvalidName(request.name.clone()));
        }

        if let Some(route) = &request.route {
            if !route.starts_with('/') {
                return Err(StructuralError::InvalidRoute(route.clone()));
            }
        }

        if !request.compute.cpu.is_positive() {
            return Err(StructuralError::NonPositiveCpu(request.compute.cpu.to_string()));
        }
        if let Some(memory) = request.compute.memory {
            if !memory.is_positive() {
                return Err(StructuralError::NonPositiveMemory(memory.to_string()));
            }
        }

        Ok(())
    }
}
