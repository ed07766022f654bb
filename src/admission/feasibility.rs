//! Compute feasibility: does one replica fit on a node of the target class?

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use super::reservations::Reservations;
use crate::cluster::ClusterCapacity;
use crate::deployment::ComputeSpec;
use crate::quantity::Quantity;

/// Resource named in a capacity shortfall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Resource {
    #[serde(rename = "CPU")]
    Cpu,
    Memory,
    #[serde(rename = "GPU")]
    Gpu,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resource::Cpu => "CPU",
            Resource::Memory => "Memory",
            Resource::Gpu => "GPU",
        })
    }
}

/// A request needs more of `resource` than any node can offer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no instances can satisfy the requested {resource} ({requested} requested, {available} available)")]
pub struct CapacityShortfall {
    pub resource: Resource,
    pub requested: String,
    pub available: String,
}

/// Capacity left for user workloads once every reservation tier is withheld.
///
/// Derived once from the raw capacity and shared read-only by every request
/// in a batch; the checks never write to it.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailableCapacity {
    cpu: Quantity,
    memory: Quantity,
    gpu: u32,
}

impl AvailableCapacity {
    pub fn derive(raw: &ClusterCapacity, reservations: &Reservations) -> Self {
        let mut cpu = raw.cpu - reservations.platform.cpu;
        let mut memory = raw.memory - reservations.platform.memory;

        if raw.has_gpu() {
            cpu = cpu - reservations.gpu_device_plugin.cpu;
            memory = memory - reservations.gpu_device_plugin.memory;
        }

        Self {
            cpu,
            memory,
            gpu: raw.gpu,
        }
    }

    pub fn cpu(&self) -> Quantity {
        self.cpu
    }

    pub fn memory(&self) -> Quantity {
        self.memory
    }

    pub fn gpu(&self) -> u32 {
        self.gpu
    }
}

/// Check CPU, then memory (when requested), then GPU; the first shortfall wins.
/// A request equal to the available amount fits.
pub fn check_feasible(
    compute: &ComputeSpec,
    available: &AvailableCapacity,
) -> Result<(), CapacityShortfall> {
    if compute.cpu > available.cpu {
        return Err(CapacityShortfall {
            resource: Resource::Cpu,
            requested: compute.cpu.to_string(),
            available: available.cpu.to_string(),
        });
    }

    if let Some(memory) = compute.memory {
        if memory > available.memory {
            return Err(CapacityShortfall {
                resource: Resource::Memory,
                requested: memory.to_string(),
                available: available.memory.to_string(),
            });
        }
    }

    if compute.gpu > available.gpu {
        return Err(CapacityShortfall {
            resource: Resource::Gpu,
            requested: compute.gpu.to_string(),
            available: available.gpu.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::reservations::ResourceReservation;

    fn q(s: &str) -> Quantity {
        s.parse().unwrap()
    }

    fn reservations() -> Reservations {
        Reservations::new(
            ResourceReservation::new(q("0.5"), q("0.5Gi")),
            ResourceReservation::new(q("0.1"), q("100Mi")),
        )
    }

    fn capacity(gpu: u32) -> ClusterCapacity {
        ClusterCapacity::new(q("4"), q("8Gi"), gpu)
    }

    #[test]
    fn test_request_at_boundary_fits() {
        let available = AvailableCapacity::derive(&capacity(0), &reservations());
        let compute = ComputeSpec::new(q("3.5")).with_memory(q("7.5Gi"));

        assert_eq!(check_feasible(&compute, &available), Ok(()));
    }

    #[test]
    fn test_cpu_over_by_any_amount_fails() {
        let available = AvailableCapacity::derive(&capacity(0), &reservations());
        let compute = ComputeSpec::new(q("3.6")).with_memory(q("7.5Gi"));

        let err = check_feasible(&compute, &available).unwrap_err();
        assert_eq!(err.resource, Resource::Cpu);
        assert_eq!(err.requested, "3.6");
        assert_eq!(err.available, "3.5");

        let barely = ComputeSpec::new(q("3501m"));
        assert!(check_feasible(&barely, &available).is_err());
    }

    #[test]
    fn test_cpu_checked_before_memory_and_gpu() {
        let available = AvailableCapacity::derive(&capacity(0), &reservations());
        let compute = ComputeSpec::new(q("100"))
            .with_memory(q("100Gi"))
            .with_gpu(8);

        let err = check_feasible(&compute, &available).unwrap_err();
        assert_eq!(err.resource, Resource::Cpu);
    }

    #[test]
    fn test_memory_checked_before_gpu() {
        let available = AvailableCapacity::derive(&capacity(0), &reservations());
        let compute = ComputeSpec::new(q("1")).with_memory(q("9Gi")).with_gpu(1);

        let err = check_feasible(&compute, &available).unwrap_err();
        assert_eq!(err.resource, Resource::Memory);
        assert_eq!(err.requested, "9Gi");
        assert_eq!(err.available, "7680Mi");
    }

    #[test]
    fn test_absent_memory_is_unconstrained() {
        // Reservations exceed raw memory; only an explicit memory request can fail
        let raw = ClusterCapacity::new(q("4"), q("256Mi"), 0);
        let available = AvailableCapacity::derive(&raw, &reservations());
        assert!(available.memory().is_negative());

        assert!(check_feasible(&ComputeSpec::new(q("1")), &available).is_ok());

        let err = check_feasible(&ComputeSpec::new(q("1")).with_memory(q("1Mi")), &available)
            .unwrap_err();
        assert_eq!(err.resource, Resource::Memory);
    }

    #[test]
    fn test_gpu_shortfall() {
        let available = AvailableCapacity::derive(&capacity(1), &reservations());
        let compute = ComputeSpec::new(q("1")).with_gpu(2);

        let err = check_feasible(&compute, &available).unwrap_err();
        assert_eq!(err.resource, Resource::Gpu);
        assert_eq!(err.requested, "2");
        assert_eq!(err.available, "1");
    }

    #[test]
    fn test_gpu_reservation_applies_only_with_gpus() {
        let without = AvailableCapacity::derive(&capacity(0), &reservations());
        let with = AvailableCapacity::derive(&capacity(1), &reservations());

        assert_eq!(without.cpu(), q("3.5"));
        assert_eq!(with.cpu(), q("3.4"));
        assert_eq!(with.memory(), q("7.5Gi") - q("100Mi"));
        assert_eq!(with.gpu(), 1);

        // Same request, only the GPU count of the node differs
        let compute = ComputeSpec::new(q("3.5")).with_memory(q("7.5Gi"));
        assert!(check_feasible(&compute, &without).is_ok());
        assert_eq!(
            check_feasible(&compute, &with).unwrap_err().resource,
            Resource::Cpu
        );
    }

    #[test]
    fn test_repeated_checks_do_not_drift() {
        let available = AvailableCapacity::derive(&capacity(1), &reservations());
        let snapshot = available.clone();
        let compute = ComputeSpec::new(q("3")).with_memory(q("7Gi"));

        for _ in 0..5 {
            assert!(check_feasible(&compute, &available).is_ok());
        }
        assert_eq!(available, snapshot);
    }

    #[test]
    fn test_shortfall_message() {
        let err = CapacityShortfall {
            resource: Resource::Cpu,
            requested: "3.6".to_string(),
            available: "3.5".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "no instances can satisfy the requested CPU (3.6 requested, 3.5 available)"
        );
    }
}
