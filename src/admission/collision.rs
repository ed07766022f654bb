//! Route collisions against routes already published by other APIs

use thiserror::Error;

use crate::cluster::PublishedRoute;
use crate::deployment::DeploymentRequest;

/// A requested route is already served by a different API
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("endpoint {route} is already being used by api '{owner}'")]
pub struct RouteConflict {
    pub owner: String,
    pub route: String,
}

/// Canonical form used when comparing routes: always ends with '/'
pub fn normalize_route(route: &str) -> String {
    if route.ends_with('/') {
        route.to_string()
    } else {
        format!("{}/", route)
    }
}

/// Fail when another API already publishes the request's route on `gateway`.
///
/// An API re-publishing its own route (an update) is not a collision.
pub fn check_collision(
    request: &DeploymentRequest,
    published: &[PublishedRoute],
    gateway: &str,
) -> Result<(), RouteConflict> {
    let Some(route) = request.route.as_deref() else {
        return Ok(());
    };
    let wanted = normalize_route(route);

    let conflict = published
        .iter()
        .filter(|p| p.is_on_gateway(gateway))
        .find(|p| normalize_route(&p.path) == wanted && p.owner != request.name);

    match conflict {
        Some(p) => Err(RouteConflict {
            owner: p.owner.clone(),
            route: p.path.clone(),
        }),
        None => Ok(()),
    }
}
