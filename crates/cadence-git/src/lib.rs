//! Git access layer for Cadence.
//!
//! This crate provides the Git side of a release:
//! - Reading commits since the last release tag
//! - Finding the nearest tag matching a pattern
//! - Creating tags, committing artifacts and pushing
//!
//! [`Repository`] implements [`cadence_plugin::collaborators::CommitLog`];
//! [`GitVersionControl`] implements
//! [`cadence_plugin::collaborators::VersionControl`].

mod error;
mod remote;
mod repository;

pub use error::{GitError, GitResult};
pub use remote::web_url;
pub use repository::{GitVersionControl, Repository};
