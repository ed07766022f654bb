//! # admitctl
//!
//! Admission validation for batches of API deployments. A batch is accepted
//! only when every request fits on a node of the target instance class,
//! claims no route another API already publishes, and shares neither name
//! nor route with another request in the same batch.

pub mod admission;
pub mod cli;
pub mod cluster;
pub mod config;
pub mod deployment;
pub mod quantity;
pub mod server;
