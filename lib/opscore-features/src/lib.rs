//! Turns raw match and timeline documents into the per-player, per-minute
//! feature table, and owns the registry that decides which features each
//! segment's predictor is fed.

pub mod aggregate;
pub mod error;
pub mod lane;
pub mod metrics;
pub mod phase;
pub mod registry;
pub mod row;
pub mod segment;
pub mod telemetry;
pub mod validate;

pub use aggregate::{aggregate_batch, aggregate_match, BatchResult, MatchOutcome};
pub use error::{MatchError, RegistryError, TelemetryError};
pub use lane::{Lane, SupportRole};
pub use phase::Phase;
pub use registry::FeatureRegistry;
pub use row::MinuteFeatureRow;
pub use segment::SegmentKey;
pub use telemetry::{MatchFiles, MatchTelemetry, TelemetrySource};
pub use validate::ValidationReport;
