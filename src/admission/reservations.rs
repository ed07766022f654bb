//! Capacity withheld from user workloads by platform daemons

use serde::{Deserialize, Serialize};

use crate::quantity::Quantity;

/// CPU and memory held back by one platform component on every node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceReservation {
    pub cpu: Quantity,

    #[serde(alias = "mem")]
    pub memory: Quantity,
}

impl ResourceReservation {
    pub fn new(cpu: Quantity, memory: Quantity) -> Self {
        Self { cpu, memory }
    }
}

/// Reservation tiers subtracted from raw node capacity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Reservations {
    /// Always withheld (logging, metrics and networking daemons)
    #[serde(default = "default_platform")]
    pub platform: ResourceReservation,

    /// Withheld only on nodes that have GPUs
    #[serde(default = "default_gpu_device_plugin")]
    pub gpu_device_plugin: ResourceReservation,
}

fn default_platform() -> ResourceReservation {
    ResourceReservation::new(Quantity::milli(500), Quantity::bytes(512 << 20))
}

fn default_gpu_device_plugin() -> ResourceReservation {
    ResourceReservation::new(Quantity::milli(100), Quantity::bytes(100 << 20))
}

impl Default for Reservations {
    fn default() -> Self {
        Self {
            platform: default_platform(),
            gpu_device_plugin: default_gpu_device_plugin(),
        }
    }
}

impl Reservations {
    pub fn new(platform: ResourceReservation, gpu_device_plugin: ResourceReservation) -> Self {
        Self {
            platform,
            gpu_device_plugin,
        }
    }

    /// No reservations at all
    pub fn none() -> Self {
        let zero = ResourceReservation::new(Quantity::zero(), Quantity::bytes(0));
        Self::new(zero.clone(), zero)
    }
}
