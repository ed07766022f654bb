//! Duplicate identities and routes within one batch

use std::collections::HashMap;

use super::collision::normalize_route;
use crate::deployment::DeploymentRequest;

/// Requests sharing one key, in batch order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// The shared name or route, as written by the first member
    pub key: String,
    /// Positions of the members in the batch
    pub positions: Vec<usize>,
    /// Names of the members
    pub names: Vec<String>,
}

/// Group by `key_of` and return the first group with more than one member.
/// Groups are ordered by the position of their first member; `key_of` yields
/// the grouping key and the text reported for it.
fn first_duplicate_group<F>(requests: &[DeploymentRequest], key_of: F) -> Option<DuplicateGroup>
where
    F: Fn(&DeploymentRequest) -> Option<(String, String)>,
{
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    let mut order = Vec::new();

    for (position, request) in requests.iter().enumerate() {
        let Some((key, label)) = key_of(request) else {
            continue;
        };
        let members = groups.entry(key.clone()).or_default();
        if members.is_empty() {
            order.push((key, label));
        }
        members.push(position);
    }

    order.into_iter().find_map(|(key, label)| {
        let positions = groups.remove(&key)?;
        if positions.len() < 2 {
            return None;
        }
        Some(DuplicateGroup {
            key: label,
            names: positions.iter().map(|&i| requests[i].name.clone()).collect(),
            positions,
        })
    })
}

/// First set of requests that share a name
pub fn find_duplicate_identities(requests: &[DeploymentRequest]) -> Option<DuplicateGroup> {
    first_duplicate_group(requests, |r| Some((r.name.clone(), r.name.clone())))
}

/// First set of requests that share a route (`/x` and `/x/` are the same
/// route). Requests without a route are not grouped.
pub fn find_duplicate_routes(requests: &[DeploymentRequest]) -> Option<DuplicateGroup> {
    first_duplicate_group(requests, |r| {
        r.route
            .as_ref()
            .map(|route| (normalize_route(route), route.clone()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deployment::ComputeSpec;

    fn named(name: &str) -> DeploymentRequest {
        DeploymentRequest::new(name, ComputeSpec::default())
    }

    #[test]
    fn test_duplicate_identities() {
        let batch = vec![named("a"), named("a"), named("b")];

        let group = find_duplicate_identities(&batch).unwrap();
        assert_eq!(group.key, "a");
        assert_eq!(group.positions, vec![0, 1]);
        assert_eq!(group.names, vec!["a", "a"]);
    }

    #[test]
    fn test_first_group_by_batch_order() {
        let batch = vec![named("b"), named("a"), named("a"), named("b")];

        let group = find_duplicate_identities(&batch).unwrap();
        assert_eq!(group.key, "b");
        assert_eq!(group.positions, vec![0, 3]);
    }

    #[test]
    fn test_unique_names_pass() {
        let batch = vec![named("a"), named("b"), named("c")];
        assert!(find_duplicate_identities(&batch).is_none());
    }

    #[test]
    fn test_names_pass_ignores_routes() {
        let batch = vec![
            named("a").with_route("/same"),
            named("a").with_route("/same"),
        ];
        assert_eq!(find_duplicate_identities(&batch).unwrap().key, "a");
    }

    #[test]
    fn test_duplicate_routes() {
        let batch = vec![
            named("a").with_route("/x"),
            named("b").with_route("/y"),
            named("c").with_route("/x/"),
        ];

        let group = find_duplicate_routes(&batch).unwrap();
        assert_eq!(group.key, "/x");
        assert_eq!(group.positions, vec![0, 2]);
        assert_eq!(group.names, vec!["a", "c"]);
    }

    #[test]
    fn test_routeless_requests_are_not_grouped() {
        let batch = vec![named("a"), named("b"), named("c").with_route("/c")];
        assert!(find_duplicate_routes(&batch).is_none());
    }
}
