mod backend;
mod config;
mod constants;
mod discovery;
mod errors;
mod instance;
mod metrics;
mod registry;
mod schema;
mod service;
pub mod keyspace;

pub use backend::*;
pub use config::*;
pub use constants::*;
pub use discovery::*;
pub use errors::*;
pub use instance::*;
pub use metrics::*;
pub use registry::*;
pub use schema::*;
pub use service::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;

//-----------------------------------------------------------
// Autometrics
/// autometrics: https://docs.autometrics.dev/rust/adding-alerts-and-slos
use autometrics::objectives::Objective;
use autometrics::objectives::ObjectiveLatency;
use autometrics::objectives::ObjectivePercentile;
const API_SLO: Objective = Objective::new("api")
    .success_rate(ObjectivePercentile::P99_9)
    .latency(ObjectiveLatency::Ms10, ObjectivePercentile::P99);
