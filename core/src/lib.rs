//! bizpulse-core: retention and customer-value estimation for small businesses.
//!
//! Raw appointments are validated by `ingest`, collapsed into one row per
//! customer by `aggregation`, then handed as an immutable snapshot to each
//! estimator. `analysis` wires the whole pipeline together.

pub mod aggregation;
pub mod analysis;
pub mod churn_model;
pub mod component;
pub mod config;
pub mod error;
pub mod frequency_model;
pub mod health;
pub mod ingest;
pub mod numeric;
pub mod retention;
pub mod rng;
pub mod segmentation;
pub mod synth;
pub mod types;
pub mod value_model;

pub use aggregation::{aggregate, aggregate_now, CustomerAggregate, DateWindow};
pub use analysis::{Analysis, AnalysisReport};
pub use config::AnalysisConfig;
pub use error::{CoreError, CoreResult};
pub use ingest::{ingest, RawAppointment, Transaction};
