//! Plugin system for Cadence.
//!
//! This crate provides the plugin contract and the pieces shared by every
//! plugin:
//! - [`Plugin`]: Base trait for all plugins
//! - [`ReleasePlugin`]: The verify / prepare / publish operations
//! - [`CommitParser`]: Parses raw commits into structured records
//! - [`ExecutionContext`]: Frozen, read-only state of a release run
//! - [`Template`]: Closed-set placeholder templates
//! - [`collaborators`]: Narrow interfaces to the file system and version control

pub mod collaborators;
mod context;
mod error;
mod impact;
mod template;
mod traits;

pub use context::{
    ExecutionContext, ExecutionContextBuilder, LogEntry, NextRelease, ReleaseLog, StepLog,
};
pub use error::{ErrorKind, PluginError, PluginResult};
pub use impact::{ReleaseImpact, UnknownImpact};
pub use template::{Placeholder, Template, TemplateError, TemplateValues};
pub use traits::Plugin;
pub use traits::parser::CommitParser;
pub use traits::release::{Phase, ReleasePlugin};
