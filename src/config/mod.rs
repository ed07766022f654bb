//! Admission configuration (`~/.admitctl/config`, YAML)
//!
//! ```yaml
//! instance-class: m5.xlarge
//! ingress-gateway: apis-gateway
//! reservations:
//!   platform: { cpu: 500m, memory: 512Mi }
//!   gpu-device-plugin: { cpu: 100m, memory: 100Mi }
//! cluster:
//!   url: http://operator.cluster.local:8888
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::admission::{AdmissionSettings, Reservations};
use crate::cluster::DEFAULT_INGRESS_GATEWAY;

/// Environment variable holding the cluster API token
pub const CLUSTER_TOKEN_ENV: &str = "ADMITCTL_CLUSTER_TOKEN";

/// Default config file location: ~/.admitctl/config
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".admitctl")
        .join("config")
}

/// Errors loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Where the cluster control plane can be reached
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClusterEndpoint {
    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// The complete configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AdmissionConfig {
    /// Instance class the cluster's API nodes run on
    #[serde(default = "default_instance_class")]
    pub instance_class: String,

    #[serde(default = "default_ingress_gateway")]
    pub ingress_gateway: String,

    #[serde(default)]
    pub reservations: Reservations,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<ClusterEndpoint>,
}

fn default_instance_class() -> String {
    "default".to_string()
}

fn default_ingress_gateway() -> String {
    DEFAULT_INGRESS_GATEWAY.to_string()
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            instance_class: default_instance_class(),
            ingress_gateway: default_ingress_gateway(),
            reservations: Reservations::default(),
            cluster: None,
        }
    }
}

impl AdmissionConfig {
    pub fn settings(&self) -> AdmissionSettings {
        AdmissionSettings::new(self.instance_class.clone())
            .with_ingress_gateway(self.ingress_gateway.clone())
    }

    /// Fill the cluster token from `token` when the file does not set one
    pub fn apply_cluster_token(&mut self, token: Option<String>) {
        if let (Some(cluster), Some(token)) = (self.cluster.as_mut(), token) {
            if cluster.api_key.is_none() {
                cluster.api_key = Some(token);
            }
        }
    }
}

// ============================================================================
// SBIO: Pure parsing (no I/O)
// ============================================================================

/// Parse config from YAML string
pub fn parse_config(content: &str) -> Result<AdmissionConfig, ConfigError> {
    if content.trim().is_empty() {
        return Ok(AdmissionConfig::default());
    }
    serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
}

// ============================================================================
// SBIO: I/O wrapper
// ============================================================================

/// Load config from `path`, or from the default location.
///
/// A missing file is an error only when the path was given explicitly.
pub fn load_config(path: Option<&Path>) -> Result<AdmissionConfig, ConfigError> {
    let (path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (default_config_path(), false),
    };

    if !path.exists() {
        if explicit {
            return Err(ConfigError::ConfigNotFound(path));
        }
        return Ok(AdmissionConfig::default());
    }

    let content = std::fs::read_to_string(&path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::Quantity;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
instance-class: g4dn.xlarge
ingress-gateway: public-gateway
reservations:
  platform:
    cpu: 250m
    memory: 256Mi
cluster:
  url: http://localhost:8888
  api-key: secret
"#;
        let config = parse_config(yaml).unwrap();

        assert_eq!(config.instance_class, "g4dn.xlarge");
        assert_eq!(config.reservations.platform.cpu, Quantity::milli(250));
        assert_eq!(config.cluster.as_ref().unwrap().api_key.as_deref(), Some("secret"));

        let settings = config.settings();
        assert_eq!(settings.instance_class.as_str(), "g4dn.xlarge");
        assert_eq!(settings.ingress_gateway, "public-gateway");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.ingress_gateway, DEFAULT_INGRESS_GATEWAY);
        assert!(config.cluster.is_none());
        assert_eq!(config.reservations, Reservations::default());
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            parse_config("reservations: [1, 2"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_cluster_token_does_not_override_file() {
        let mut config = parse_config("cluster:\n  url: http://x\n").unwrap();
        config.apply_cluster_token(Some("from-env".to_string()));
        assert_eq!(
            config.cluster.as_ref().unwrap().api_key.as_deref(),
            Some("from-env")
        );

        config.apply_cluster_token(Some("other".to_string()));
        assert_eq!(
            config.cluster.as_ref().unwrap().api_key.as_deref(),
            Some("from-env")
        );
    }

    #[test]
    fn test_load_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"instance-class: m5.large\n").unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.instance_class, "m5.large");
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let result = load_config(Some(Path::new("/nonexistent/admitctl.yaml")));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }
}
