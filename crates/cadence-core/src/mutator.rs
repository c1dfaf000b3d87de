//! Artifact mutation.
//!
//! Regex replacements across files, checked before anything is written: if
//! any strict replacement misses its expected count, no file is touched.

use std::path::{Path, PathBuf};

use cadence_config::ReplacementConfig;
use cadence_plugin::collaborators::FileSystem;
use cadence_plugin::{PluginError, PluginResult, Template, TemplateValues};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{CoreError, CoreResult};

/// A regex replacement over a set of files.
#[derive(Debug, Clone)]
pub struct ReplacementSpec {
    files: Vec<PathBuf>,
    from: Regex,
    to: Template,
    count: usize,
    strict: bool,
}

impl ReplacementSpec {
    /// Creates a strict replacement expecting `count` matches in each file.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] if `from` is not a valid regex.
    pub fn new(
        files: impl IntoIterator<Item = impl Into<PathBuf>>,
        from: &str,
        to: Template,
        count: usize,
    ) -> CoreResult<Self> {
        let from = Regex::new(from)
            .map_err(|e| CoreError::Configuration(format!("invalid pattern `{from}`: {e}")))?;
        Ok(Self {
            files: files.into_iter().map(Into::into).collect(),
            from,
            to,
            count,
            strict: true,
        })
    }

    /// Builds a replacement from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] if the pattern is invalid.
    pub fn from_config(config: &ReplacementConfig) -> CoreResult<Self> {
        let spec = Self::new(
            config.files.iter().cloned(),
            &config.from,
            config.to.clone(),
            config.count,
        )?;
        Ok(if config.strict { spec } else { spec.lenient() })
    }

    /// Logs count mismatches instead of failing.
    #[must_use]
    pub fn lenient(mut self) -> Self {
        self.strict = false;
        self
    }

    /// Files this replacement touches.
    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

/// Outcome of one replacement in one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplacementResult {
    /// The file.
    pub file: PathBuf,
    /// Whether the content changed.
    pub has_changed: bool,
    /// Number of pattern matches.
    pub num_matches: usize,
    /// Number of matches whose text actually changed.
    pub num_replacements: usize,
}

struct PendingFile {
    path: PathBuf,
    original: String,
    content: String,
}

/// Applies replacements. Every file is read and checked first; files are
/// written only if every strict replacement matched its expected count.
///
/// The template is rendered before substitution, so `$1` style group
/// references in it refer to the pattern's capture groups. `$$` and dollars
/// inside placeholder values stay literal.
///
/// # Errors
///
/// Returns [`PluginError::ReplacementMismatch`] for the first strict count
/// mismatch, or [`PluginError::Filesystem`] if a file cannot be read or
/// written. On a mismatch or read error nothing is written.
pub fn apply(
    specs: &[ReplacementSpec],
    values: &TemplateValues,
    fs: &dyn FileSystem,
) -> PluginResult<Vec<ReplacementResult>> {
    let mut pending: Vec<PendingFile> = Vec::new();
    let mut results = Vec::new();

    for spec in specs {
        let replacement = spec.to.render_expansion(values);

        for file in &spec.files {
            let index = match pending.iter().position(|p| p.path == *file) {
                Some(index) => index,
                None => {
                    let original = fs.read_file(file)?;
                    pending.push(PendingFile {
                        path: file.clone(),
                        content: original.clone(),
                        original,
                    });
                    pending.len() - 1
                }
            };
            let entry = &mut pending[index];

            let (content, result) = replace(&spec.from, &replacement, &entry.content, file);
            if result.num_matches != spec.count {
                if spec.strict {
                    return Err(PluginError::ReplacementMismatch {
                        file: file.clone(),
                        expected: spec.count,
                        actual: result.num_matches,
                    });
                }
                warn!(
                    file = %file.display(),
                    expected = spec.count,
                    actual = result.num_matches,
                    "replacement count mismatch"
                );
            }

            entry.content = content;
            results.push(result);
        }
    }

    for file in pending.iter().filter(|p| p.content != p.original) {
        fs.write_file(&file.path, &file.content)?;
        debug!(file = %file.path.display(), "wrote replacement");
    }

    Ok(results)
}

fn replace(
    pattern: &Regex,
    replacement: &str,
    content: &str,
    file: &Path,
) -> (String, ReplacementResult) {
    let mut num_matches = 0;
    let mut num_replacements = 0;

    let replaced = pattern.replace_all(content, |caps: &regex::Captures<'_>| {
        let mut expanded = String::new();
        caps.expand(replacement, &mut expanded);
        num_matches += 1;
        if expanded != caps[0] {
            num_replacements += 1;
        }
        expanded
    });

    let has_changed = replaced != content;
    (
        replaced.into_owned(),
        ReplacementResult {
            file: file.to_path_buf(),
            has_changed,
            num_matches,
            num_replacements,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_plugin::ErrorKind;
    use cadence_plugin::collaborators::LocalFileSystem;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct MemoryFs {
        files: Mutex<HashMap<PathBuf, String>>,
        writes: Mutex<Vec<PathBuf>>,
    }

    impl MemoryFs {
        fn with(files: &[(&str, &str)]) -> Self {
            let fs = Self::default();
            for (path, content) in files {
                fs.files
                    .lock()
                    .unwrap()
                    .insert(PathBuf::from(path), (*content).to_string());
            }
            fs
        }

        fn content(&self, path: &str) -> String {
            self.files.lock().unwrap()[Path::new(path)].clone()
        }

        fn write_count(&self) -> usize {
            self.writes.lock().unwrap().len()
        }
    }

    impl FileSystem for MemoryFs {
        fn read_file(&self, path: &Path) -> PluginResult<String> {
            self.files.lock().unwrap().get(path).cloned().ok_or_else(|| {
                PluginError::filesystem(
                    path,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
                )
            })
        }

        fn write_file(&self, path: &Path, contents: &str) -> PluginResult<()> {
            self.writes.lock().unwrap().push(path.to_path_buf());
            self.files
                .lock()
                .unwrap()
                .insert(path.to_path_buf(), contents.to_string());
            Ok(())
        }

        fn exists(&self, path: &Path) -> bool {
            self.files.lock().unwrap().contains_key(path)
        }
    }

    fn values(version: &str) -> TemplateValues {
        TemplateValues {
            version: version.to_string(),
            ..TemplateValues::default()
        }
    }

    fn version_spec(files: &[&str]) -> ReplacementSpec {
        ReplacementSpec::new(
            files.iter().copied(),
            r#"__version__ = ".*""#,
            Template::parse(r#"__version__ = "${version}""#).unwrap(),
            1,
        )
        .unwrap()
    }

    #[test]
    fn test_apply_updates_version() {
        let fs = MemoryFs::with(&[("pkg/__init__.py", "__version__ = \"1.2.3\"\n")]);
        let results = apply(&[version_spec(&["pkg/__init__.py"])], &values("1.3.0"), &fs).unwrap();

        assert_eq!(fs.content("pkg/__init__.py"), "__version__ = \"1.3.0\"\n");
        assert_eq!(
            results,
            vec![ReplacementResult {
                file: PathBuf::from("pkg/__init__.py"),
                has_changed: true,
                num_matches: 1,
                num_replacements: 1,
            }]
        );
    }

    #[test]
    fn test_mismatch_writes_nothing() {
        let fs = MemoryFs::with(&[
            ("a.py", "__version__ = \"1.2.3\"\n"),
            ("b.py", "no version here\n"),
        ]);

        let err = apply(&[version_spec(&["a.py", "b.py"])], &values("1.3.0"), &fs).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ReplacementMismatch);
        assert!(matches!(
            err,
            PluginError::ReplacementMismatch { ref file, expected: 1, actual: 0 } if file == Path::new("b.py")
        ));
        assert_eq!(fs.write_count(), 0);
        assert_eq!(fs.content("a.py"), "__version__ = \"1.2.3\"\n");
    }

    #[test]
    fn test_mismatch_in_later_spec_writes_nothing() {
        let fs = MemoryFs::with(&[("a.py", "__version__ = \"1.2.3\"\n"), ("Cargo.toml", "")]);
        let cargo = ReplacementSpec::new(
            ["Cargo.toml"],
            r#"(?m)^version = ".*""#,
            Template::parse(r#"version = "${version}""#).unwrap(),
            1,
        )
        .unwrap();

        let result = apply(&[version_spec(&["a.py"]), cargo], &values("2.0.0"), &fs);
        assert!(result.is_err());
        assert_eq!(fs.write_count(), 0);
    }

    #[test]
    fn test_second_run_is_stable() {
        let fs = MemoryFs::with(&[("a.py", "__version__ = \"1.2.3\"\n")]);
        let specs = [version_spec(&["a.py"])];

        apply(&specs, &values("1.3.0"), &fs).unwrap();
        let results = apply(&specs, &values("1.3.0"), &fs).unwrap();

        assert_eq!(fs.content("a.py"), "__version__ = \"1.3.0\"\n");
        assert_eq!(fs.write_count(), 1);
        assert!(!results[0].has_changed);
        assert_eq!(results[0].num_matches, 1);
        assert_eq!(results[0].num_replacements, 0);
    }

    #[test]
    fn test_lenient_mismatch_still_writes() {
        let fs = MemoryFs::with(&[
            ("a.py", "__version__ = \"1.2.3\"\n__version__ = \"1.2.3\"\n"),
        ]);
        let spec = version_spec(&["a.py"]).lenient();

        let results = apply(&[spec], &values("1.3.0"), &fs).unwrap();
        assert_eq!(results[0].num_matches, 2);
        assert_eq!(
            fs.content("a.py"),
            "__version__ = \"1.3.0\"\n__version__ = \"1.3.0\"\n"
        );
    }

    #[test]
    fn test_group_references_expand_after_rendering() {
        let fs = MemoryFs::with(&[("setup.cfg", "version = 1.2.3 # managed\n")]);
        let spec = ReplacementSpec::new(
            ["setup.cfg"],
            r"version = \S+( # managed)",
            Template::parse("version = ${version}$1").unwrap(),
            1,
        )
        .unwrap();

        apply(&[spec], &values("1.3.0"), &fs).unwrap();
        assert_eq!(fs.content("setup.cfg"), "version = 1.3.0 # managed\n");
    }

    #[test]
    fn test_escaped_dollar_stays_literal() {
        let fs = MemoryFs::with(&[("prices.env", "PRICE=old\n")]);
        let spec = ReplacementSpec::new(
            ["prices.env"],
            "PRICE=.*",
            Template::parse("PRICE=$${version}").unwrap(),
            1,
        )
        .unwrap();

        apply(&[spec], &values("1.0.0"), &fs).unwrap();
        assert_eq!(fs.content("prices.env"), "PRICE=$1.0.0\n");
    }

    #[test]
    fn test_specs_chain_on_same_file() {
        let fs = MemoryFs::with(&[("VERSION", "1.2.3")]);
        let first = ReplacementSpec::new(
            ["VERSION"],
            r"^\d+\.\d+\.\d+$",
            Template::parse("${version}").unwrap(),
            1,
        )
        .unwrap();
        let second = ReplacementSpec::new(
            ["VERSION"],
            r"^(.*)$",
            Template::parse("v$1").unwrap(),
            1,
        )
        .unwrap();

        apply(&[first, second], &values("2.0.0"), &fs).unwrap();
        assert_eq!(fs.content("VERSION"), "v2.0.0");
        assert_eq!(fs.write_count(), 1);
    }

    #[test]
    fn test_missing_file_is_filesystem_error() {
        let fs = MemoryFs::default();
        let err = apply(&[version_spec(&["missing.py"])], &values("1.0.0"), &fs).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Filesystem);
    }

    #[test]
    fn test_invalid_pattern() {
        let result = ReplacementSpec::new(
            ["a"],
            "(unclosed",
            Template::parse("${version}").unwrap(),
            1,
        );
        assert!(matches!(result, Err(CoreError::Configuration(_))));
    }

    #[test]
    fn test_from_config_lenient() {
        let config = ReplacementConfig {
            files: vec![PathBuf::from("a.py")],
            from: "x".to_string(),
            to: Template::parse("${version}").unwrap(),
            count: 2,
            strict: false,
        };
        let spec = ReplacementSpec::from_config(&config).unwrap();
        assert!(!spec.strict);
        assert_eq!(spec.count, 2);
        assert_eq!(spec.files(), [PathBuf::from("a.py")]);
    }

    #[test]
    fn test_apply_on_disk() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.py"), "__version__ = \"0.1.0\"\n").unwrap();
        let fs = LocalFileSystem::new(dir.path());

        apply(&[version_spec(&["a.py"])], &values("0.2.0"), &fs).unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("a.py")).unwrap(),
            "__version__ = \"0.2.0\"\n"
        );
    }
}
