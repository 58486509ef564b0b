//! API service modules for the Visier endpoints.
//!
//! Each service is a thin wrapper over the session's retrying execution
//! primitive for one subset of the platform APIs.

mod model;
mod query;

pub use model::ModelService;
pub use query::QueryService;
