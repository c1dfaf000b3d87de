//! Placeholder templates.
//!
//! Templates accept a closed set of `${name}` placeholders that are resolved
//! against the release being made. Anything else is rejected when the
//! template is parsed, so a bad template fails at configuration time rather
//! than in the middle of a release. `$$` renders a literal `$`.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A named value a template can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// `${version}`: the next version.
    Version,
    /// `${previous_version}`: the last released version, empty on first release.
    PreviousVersion,
    /// `${tag}`: the tag name of the next version.
    Tag,
    /// `${impact}`: `major`, `minor` or `patch`.
    Impact,
    /// `${dry_run}`: `true` or `false`.
    DryRun,
    /// `${branch}`: the branch being released.
    Branch,
}

impl Placeholder {
    /// Every supported placeholder.
    pub const ALL: [Self; 6] = [
        Self::Version,
        Self::PreviousVersion,
        Self::Tag,
        Self::Impact,
        Self::DryRun,
        Self::Branch,
    ];

    /// The name used between `${` and `}`.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Version => "version",
            Self::PreviousVersion => "previous_version",
            Self::Tag => "tag",
            Self::Impact => "impact",
            Self::DryRun => "dry_run",
            Self::Branch => "branch",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// Template parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// `${name}` where `name` is not a supported placeholder.
    #[error("unknown placeholder `${{{0}}}`")]
    UnknownPlaceholder(String),

    /// `${` without a closing `}`.
    #[error("unterminated placeholder at byte {0}")]
    Unterminated(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// `text` is the rendered form; `expansion` keeps `$$` escaped for
    /// regex replacement strings.
    Literal { text: String, expansion: String },
    Value(Placeholder),
}

impl Segment {
    fn literal(text: &mut String, expansion: &mut String) -> Self {
        Self::Literal {
            text: std::mem::take(text),
            expansion: std::mem::take(expansion),
        }
    }
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parses a template string.
    ///
    /// # Errors
    ///
    /// Returns an error if the template references an unknown placeholder
    /// or leaves a `${` unterminated.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut expansion = String::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(pos) = rest.find('$') {
            literal.push_str(&rest[..pos]);
            expansion.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];

            if let Some(tail) = after.strip_prefix('$') {
                literal.push('$');
                expansion.push_str("$$");
                offset += pos + 2;
                rest = tail;
            } else if let Some(body) = after.strip_prefix('{') {
                let end = body
                    .find('}')
                    .ok_or(TemplateError::Unterminated(offset + pos))?;
                let name = &body[..end];
                let placeholder = Placeholder::from_name(name)
                    .ok_or_else(|| TemplateError::UnknownPlaceholder(name.to_string()))?;

                if !literal.is_empty() {
                    segments.push(Segment::literal(&mut literal, &mut expansion));
                }
                segments.push(Segment::Value(placeholder));

                let consumed = pos + 2 + end + 1;
                offset += consumed;
                rest = &rest[consumed..];
            } else {
                // A lone `$` (e.g. a regex group reference like `$1`) is literal.
                literal.push('$');
                expansion.push('$');
                offset += pos + 1;
                rest = after;
            }
        }

        literal.push_str(rest);
        expansion.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::literal(&mut literal, &mut expansion));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Renders the template with the given values.
    #[must_use]
    pub fn render(&self, values: &TemplateValues) -> String {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal { text, .. } => out.push_str(text),
                Segment::Value(placeholder) => out.push_str(&values.get(*placeholder)),
            }
        }
        out
    }

    /// Renders the template as a regex replacement string. A lone `$` still
    /// references a capture group (`$1`), while `$$` and any `$` inside a
    /// value come out as literal dollars after expansion.
    #[must_use]
    pub fn render_expansion(&self, values: &TemplateValues) -> String {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal { expansion, .. } => out.push_str(expansion),
                Segment::Value(placeholder) => {
                    out.push_str(&values.get(*placeholder).replace('$', "$$"));
                }
            }
        }
        out
    }

    /// Returns the placeholders referenced, in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = Placeholder> + '_ {
        self.segments.iter().filter_map(|s| match s {
            Segment::Value(p) => Some(*p),
            Segment::Literal { .. } => None,
        })
    }

    /// Returns the literal text before the first placeholder and after the
    /// last one. Used to match rendered strings back to a template.
    #[must_use]
    pub fn affixes(&self) -> (&str, &str) {
        let prefix = match self.segments.first() {
            Some(Segment::Literal { text, .. }) => text.as_str(),
            _ => "",
        };
        let suffix = match self.segments.last() {
            Some(Segment::Literal { text, .. }) if self.segments.len() > 1 => text.as_str(),
            _ => "",
        };
        (prefix, suffix)
    }

    /// Returns the original template text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Serialize for Template {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for Template {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Self::parse(&source).map_err(serde::de::Error::custom)
    }
}

/// Values substituted into templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateValues {
    /// The next version.
    pub version: String,
    /// The previous version, if any.
    pub previous_version: Option<String>,
    /// The tag name.
    pub tag: String,
    /// The release impact.
    pub impact: String,
    /// Whether the run is a dry run.
    pub dry_run: bool,
    /// The branch being released.
    pub branch: String,
}

impl TemplateValues {
    /// Returns the value for a placeholder.
    #[must_use]
    pub fn get(&self, placeholder: Placeholder) -> String {
        match placeholder {
            Placeholder::Version => self.version.clone(),
            Placeholder::PreviousVersion => self.previous_version.clone().unwrap_or_default(),
            Placeholder::Tag => self.tag.clone(),
            Placeholder::Impact => self.impact.clone(),
            Placeholder::DryRun => self.dry_run.to_string(),
            Placeholder::Branch => self.branch.clone(),
        }
    }
}
