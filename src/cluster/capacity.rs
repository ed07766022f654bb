//! Raw allocatable capacity of an instance class

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::quantity::Quantity;

/// Identifier of the node instance class a batch is deployed onto (e.g. "m5.xlarge")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceClass(String);

impl InstanceClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstanceClass {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Allocatable capacity of one node of an instance class, before any
/// platform reservations are withheld
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterCapacity {
    pub cpu: Quantity,

    #[serde(alias = "mem")]
    pub memory: Quantity,

    #[serde(default)]
    pub gpu: u32,
}

impl ClusterCapacity {
    pub fn new(cpu: Quantity, memory: Quantity, gpu: u32) -> Self {
        Self { cpu, memory, gpu }
    }

    pub fn has_gpu(&self) -> bool {
        self.gpu > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_from_yaml() {
        let capacity: ClusterCapacity = serde_yaml::from_str("cpu: 4\nmemory: 16Gi\ngpu: 1\n").unwrap();
        assert_eq!(capacity.cpu, Quantity::from_units(4));
        assert_eq!(capacity.memory, Quantity::bytes(16 << 30));
        assert!(capacity.has_gpu());
    }

    #[test]
    fn test_instance_class_is_transparent() {
        let class: InstanceClass = serde_json::from_str("\"g4dn.xlarge\"").unwrap();
        assert_eq!(class.as_str(), "g4dn.xlarge");
        assert_eq!(class.to_string(), "g4dn.xlarge");
    }
}
