//! Release engine for Cadence.
//!
//! Classifies commits, decides on the next version, renders release notes
//! and runs the verify, prepare and publish phases over an ordered list of
//! release plugins.

pub mod classifier;
mod error;
pub mod mutator;
pub mod notes;
pub mod pipeline;
pub mod release;
pub mod resolver;
pub mod tag;

pub use error::{CoreError, CoreResult};
pub use mutator::{ReplacementResult, ReplacementSpec};
pub use notes::{NotesRenderer, RenderInfo};
pub use pipeline::{
    CompletedStep, Pipeline, PipelineFailure, PipelineOutcome, PipelineState, RunReport, Severity,
};
pub use release::{NoReleaseReason, Plan, PlannedRelease, ReleaseManager, ReleaseOutcome};
pub use resolver::{ReleaseDecision, VersionResolver, bump};
pub use tag::{TagFormat, TagPlugin};
