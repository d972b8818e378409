//! Refresh pipeline: location → connectivity → fetch or cache → rank.
//!
//! The `Orchestrator` owns one refresh cycle at a time. Online cycles fetch,
//! parse, reconcile into the store and rank; offline cycles rank whatever the
//! store holds. Failures end the cycle and are returned to the caller; nothing
//! is retried automatically.

pub mod error;
pub mod orchestrator;
pub mod state;

pub use error::PipelineError;
pub use orchestrator::{Orchestrator, PipelineSettings};
pub use state::{ListSource, PipelineState, RefreshOutcome};
