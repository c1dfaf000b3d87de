//! Raw commit type as read from the commit log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A commit as read from the commit log, before message parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCommit {
    /// The commit hash (SHA).
    pub hash: String,

    /// The full commit message (subject + body).
    pub message: String,

    /// The commit author name.
    pub author: String,

    /// The commit author email.
    pub email: String,

    /// The commit date.
    pub date: DateTime<Utc>,
}

impl RawCommit {
    /// Creates a new raw commit.
    #[must_use]
    pub fn new(
        hash: impl Into<String>,
        message: impl Into<String>,
        author: impl Into<String>,
        email: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            hash: hash.into(),
            message: message.into(),
            author: author.into(),
            email: email.into(),
            date,
        }
    }

    /// Returns the first line of the commit message (the subject).
    #[must_use]
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// Returns the commit body: everything after the subject and the blank
    /// separator line, trimmed. `None` when there is no body.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        let (_, rest) = self.message.split_once('\n')?;
        let body = rest.trim();
        if body.is_empty() { None } else { Some(body) }
    }

    /// Returns the short hash (first 7 characters).
    #[must_use]
    pub fn short_hash(&self) -> &str {
        &self.hash[..7.min(self.hash.len())]
    }
}
