//! Subcommands.

pub mod init;
pub mod next;
pub mod notes;
pub mod release;
