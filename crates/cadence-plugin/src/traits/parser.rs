//! Commit parser trait.

use cadence_commit::{ParsedCommit, RawCommit};

use super::Plugin;

/// Parses raw commit messages into structured records.
pub trait CommitParser: Plugin {
    /// Parses a raw commit.
    ///
    /// Returns `None` if the message doesn't follow the parser's convention.
    /// Callers keep such commits as [`ParsedCommit::unparsed`] records.
    fn parse(&self, raw: &RawCommit) -> Option<ParsedCommit>;

    /// Returns whether this parser understands the given commit.
    fn can_parse(&self, raw: &RawCommit) -> bool {
        self.parse(raw).is_some()
    }

    /// Parses every commit, keeping order. Commits the parser does not
    /// understand are kept with an empty type.
    fn parse_all(&self, raw: &[RawCommit]) -> Vec<ParsedCommit> {
        raw.iter()
            .map(|commit| {
                self.parse(commit)
                    .unwrap_or_else(|| ParsedCommit::unparsed(commit))
            })
            .collect()
    }
}
