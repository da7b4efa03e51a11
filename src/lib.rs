//! Feeder / DT / meter energy-loss reporting.
//!
//! Three flat sheets (feeders, distribution transformers and meters) are
//! cross-linked into a Region → Feeder → DT → Meter tree, annotated with
//! energy losses and communication tallies, and exposed through a read-only
//! query surface. [`Dashboard`] owns the current snapshot and handles loading
//! with a synthetic fallback.
pub mod config;
pub mod dashboard;
pub mod energy;
pub mod error;
pub mod hierarchy;
pub mod kpi;
pub mod loader;
pub mod metrics;
pub mod normalize;
pub mod output;
pub mod query;
pub mod reports;
pub mod synthetic;
pub mod types;
pub mod util;

#[cfg(test)]
mod test_utils;

pub use config::{BuildConfig, DuplicatePolicy};
pub use dashboard::{Dashboard, DataOrigin, LoadOutcome};
pub use energy::LossBand;
pub use error::{Error, Result};
pub use hierarchy::{BuildReport, Model};
pub use query::{Level, SearchHit, Selection};
