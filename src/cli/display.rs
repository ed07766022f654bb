//! Display formatting for CLI output
//!
//! SBIO pattern: Pure functions that format data for display

use super::commands::{CapacityReport, ValidationReport};
use crate::admission::AdmissionError;
use crate::deployment::DeploymentRequest;
use crate::quantity::Quantity;
use crate::server::AdmissionResponse;

// ============================================================================
// Table formatting helpers
// ============================================================================

/// Format a simple table with headers and rows
pub fn format_table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    if rows.is_empty() {
        return "No requests found.\n".to_string();
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let mut output = String::new();
    let mut push_row = |cells: Vec<String>| {
        let line = cells
            .iter()
            .enumerate()
            .map(|(i, cell)| match widths.get(i) {
                Some(width) => format!("{:width$}", cell, width = *width),
                None => cell.clone(),
            })
            .collect::<Vec<_>>()
            .join("   ");
        output.push_str(line.trim_end());
        output.push('\n');
    };

    push_row(headers.iter().map(|h| h.to_uppercase()).collect());
    for row in rows {
        push_row(row);
    }

    output
}

// ============================================================================
// Validation display
// ============================================================================

/// Status of the request at `position` given the batch outcome
fn request_status(
    error: Option<&AdmissionError>,
    position: usize,
    request: &DeploymentRequest,
) -> &'static str {
    let Some(error) = error else {
        return "ok";
    };
    // Requests after the first per-request failure were never checked
    if let Some(failed_at) = error.position() {
        return match position.cmp(&failed_at) {
            std::cmp::Ordering::Less => "ok",
            std::cmp::Ordering::Equal => "rejected",
            std::cmp::Ordering::Greater => "-",
        };
    }
    match error {
        AdmissionError::DuplicateRoute { names, .. } if names.contains(&request.name) => {
            "duplicate"
        }
        AdmissionError::DuplicateIdentity { positions, .. } if positions.contains(&position) => {
            "duplicate"
        }
        AdmissionError::ClusterStateUnavailable(_) | AdmissionError::EmptyBatch => "-",
        _ => "ok",
    }
}

/// Format a validation report as a table plus verdict
pub fn format_validation_report(report: &ValidationReport) -> String {
    let headers = &["NAME", "ROUTE", "CPU", "MEMORY", "GPU", "STATUS"];
    let error = report.error.as_ref();

    let rows: Vec<Vec<String>> = report
        .requests
        .iter()
        .enumerate()
        .map(|(i, request)| {
            let status = request_status(error, i, request);
            vec![
                request.name.clone(),
                request.route.clone().unwrap_or_else(|| "-".to_string()),
                request.compute.cpu.to_string(),
                request
                    .compute
                    .memory
                    .as_ref()
                    .map(Quantity::to_string)
                    .unwrap_or_else(|| "-".to_string()),
                request.compute.gpu.to_string(),
                status.to_string(),
            ]
        })
        .collect();

    let mut output = format!("Instance class: {}\n\n", report.instance_class);
    output.push_str(&format_table(headers, rows));
    output.push('\n');
    match error {
        None => output.push_str(&format!("ADMITTED: {} api(s)\n", report.requests.len())),
        Some(e) => output.push_str(&format!("REJECTED [{}]: {}\n", e.code(), e)),
    }
    output
}

/// Format a validation report as JSON, in the HTTP response shape
pub fn format_validation_json(report: &ValidationReport) -> Result<String, serde_json::Error> {
    let response = match &report.error {
        None => AdmissionResponse::allowed(),
        Some(e) => AdmissionResponse::denied(e),
    };
    serde_json::to_string_pretty(&response)
}

// ============================================================================
// Capacity display
// ============================================================================

/// Format raw, reserved and available capacity of an instance class
pub fn format_capacity_report(report: &CapacityReport) -> String {
    let headers = &["RESOURCE", "RAW", "RESERVED", "AVAILABLE"];
    let available = &report.available;
    let raw = &report.raw;

    let rows = vec![
        vec![
            "CPU".to_string(),
            raw.cpu.to_string(),
            (raw.cpu - available.cpu()).to_string(),
            available.cpu().to_string(),
        ],
        vec![
            "Memory".to_string(),
            raw.memory.to_string(),
            (raw.memory - available.memory()).to_string(),
            available.memory().to_string(),
        ],
        vec![
            "GPU".to_string(),
            raw.gpu.to_string(),
            "0".to_string(),
            available.gpu().to_string(),
        ],
    ];

    let mut output = format!("Instance class: {}\n\n", report.instance_class);
    output.push_str(&format_table(headers, rows));
    if raw.has_gpu() {
        output.push_str("\nGPU device plugin reservation applied.\n");
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::{AvailableCapacity, Reservations, Resource};
    use crate::cluster::ClusterCapacity;
    use crate::deployment::ComputeSpec;

    fn request(name: &str, route: &str) -> DeploymentRequest {
        DeploymentRequest::new(name, ComputeSpec::default()).with_route(route)
    }

    fn report(error: Option<AdmissionError>) -> ValidationReport {
        ValidationReport {
            instance_class: "m5.xlarge".to_string(),
            requests: vec![request("a", "/a"), request("b", "/b"), request("c", "/c")],
            error,
        }
    }

    fn status_column(output: &str) -> Vec<String> {
        output
            .lines()
            .filter(|l| l.starts_with("a ") || l.starts_with("b ") || l.starts_with("c "))
            .map(|l| l.split_whitespace().last().unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn test_format_table() {
        let output = format_table(
            &["name", "route"],
            vec![vec!["iris".to_string(), "/iris".to_string()]],
        );

        assert_eq!(output, "NAME   ROUTE\niris   /iris\n");
    }

    #[test]
    fn test_format_table_empty() {
        assert_eq!(format_table(&["name"], vec![]), "No requests found.\n");
    }

    #[test]
    fn test_admitted_report() {
        let output = format_validation_report(&report(None));

        assert!(output.contains("ADMITTED: 3 api(s)"));
        assert_eq!(status_column(&output), vec!["ok", "ok", "ok"]);
    }

    #[test]
    fn test_rejected_report_marks_unchecked_requests() {
        let error = AdmissionError::InsufficientCapacity {
            identity: "b".to_string(),
            position: 1,
            resource: Resource::Cpu,
            requested: "4".to_string(),
            available: "3.5".to_string(),
        };

        let output = format_validation_report(&report(Some(error)));

        assert!(output.contains("REJECTED [INSUFFICIENT_CAPACITY]"));
        assert_eq!(status_column(&output), vec!["ok", "rejected", "-"]);
    }

    #[test]
    fn test_rejected_row_follows_batch_position() {
        let report = ValidationReport {
            instance_class: "m5.xlarge".to_string(),
            requests: vec![request("a", "/a"), request("a", "/b"), request("c", "/c")],
            error: Some(AdmissionError::InsufficientCapacity {
                identity: "a".to_string(),
                position: 1,
                resource: Resource::Cpu,
                requested: "3.6".to_string(),
                available: "3.5".to_string(),
            }),
        };

        let output = format_validation_report(&report);

        assert_eq!(status_column(&output), vec!["ok", "rejected", "-"]);
    }

    #[test]
    fn test_duplicate_route_report() {
        let error = AdmissionError::DuplicateRoute {
            route: "/a/".to_string(),
            names: vec!["a".to_string(), "c".to_string()],
        };

        let output = format_validation_report(&report(Some(error)));

        assert_eq!(status_column(&output), vec!["duplicate", "ok", "duplicate"]);
    }

    #[test]
    fn test_validation_json() {
        let json = format_validation_json(&report(Some(AdmissionError::EmptyBatch))).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["allowed"], false);
        assert_eq!(value["code"], "EMPTY_BATCH");
    }

    #[test]
    fn test_capacity_report() {
        let raw = ClusterCapacity::new(Quantity::from_units(4), Quantity::bytes(8 << 30), 0);
        let reservations = Reservations::default();
        let available = AvailableCapacity::derive(&raw, &reservations);
        let report = CapacityReport {
            instance_class: "m5.xlarge".to_string(),
            raw,
            reservations,
            available,
        };

        let output = format_capacity_report(&report);

        assert!(output.contains("Instance class: m5.xlarge"));
        assert!(output.contains("512Mi"));
        assert!(output.contains("7680Mi"));
        assert!(output.contains("3.5"));
        assert!(!output.contains("GPU device plugin"));
    }
}
