//! Derived epidemiological metrics for regional cumulative case counts:
//! daily deltas, rolling means, the effective reproduction number, the
//! temporal center and population-normalized rates, per district and
//! aggregated per federal state and for the whole country.

pub mod error;
pub mod estimate;
pub mod config;
pub mod rolling;
pub mod center;
pub mod reproduction;
pub mod table;
pub mod metadata;
pub mod aggregate;
pub mod derived;
pub mod metrics;
pub mod cache;
pub mod rank;
pub mod engine;
pub mod source;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{Error,Result};
pub use estimate::Estimate;
pub use metrics::RegionMetrics;
pub use rank::RankMetric;
pub use table::{Level,RegionId,RegionKey};
