//! Commit records for Cadence.
//!
//! This crate provides the commit types shared by every stage of a release:
//! - [`RawCommit`]: A commit as read from the commit log
//! - [`ParsedCommit`]: A commit after the message parser has run

mod parsed;
mod raw;

pub use parsed::{ParsedCommit, ParsedCommitBuilder};
pub use raw::RawCommit;
