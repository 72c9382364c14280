//! Translates manifest failures into actionable diagnostics.
//!
//! YAML syntax errors reported by `serde_saphyr` keep their source span so
//! `miette` can point at the offending character. Structural problems found by
//! the declaration grammar are reported as [`ManifestError::Format`] with the
//! location of the offending field.

// The unused_assignments lint fires on miette/thiserror derive expansion in
// some Rust versions but not others, so `#[expect]` cannot be used here.
// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use camino::Utf8PathBuf;
use miette::{Diagnostic, NamedSource, SourceSpan};
use serde_saphyr::{Error as YamlError, Location};
use std::fmt;
use thiserror::Error;

/// Display name for a manifest used in diagnostics.
///
/// ```rust
/// use kumiki::manifest::ManifestName;
/// let name = ManifestName::new("Kumikifile");
/// assert_eq!(name.as_str(), "Kumikifile");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ManifestName(String);

impl ManifestName {
    /// Construct a diagnostic label describing the manifest being processed.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Access the label as a borrowed string slice.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for ManifestName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for ManifestName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Errors raised while extracting module declarations from a manifest.
#[derive(Debug, Error, Diagnostic)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("failed to read manifest {path}")]
    #[diagnostic(code(kumiki::manifest::read))]
    Read {
        /// Path that was attempted.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The manifest is not syntactically valid YAML.
    #[error("manifest {name} is not valid YAML")]
    #[diagnostic(code(kumiki::manifest::parse))]
    Parse {
        /// Manifest label.
        name: ManifestName,
        /// Span-carrying diagnostic produced from the parser error.
        #[source]
        #[diagnostic_source]
        source: Box<dyn Diagnostic + Send + Sync + 'static>,
    },

    /// The manifest does not match the module declaration grammar.
    #[error("{name}: {location}: {details}")]
    #[diagnostic(
        code(kumiki::manifest::format),
        help(
            "each module needs a `name` string and a `dependencies` list of quoted strings, e.g. `dependencies: [\"Core\"]`"
        )
    )]
    Format {
        /// Manifest label.
        name: ManifestName,
        /// Path to the offending field, e.g. `modules[1].dependencies[0]`.
        location: String,
        /// What was wrong at that location.
        details: String,
    },

    /// The manifest declares a format version this build does not read.
    #[error("{name}: unsupported kumiki_version {found}; expected {supported}")]
    #[diagnostic(code(kumiki::manifest::version))]
    Version {
        /// Manifest label.
        name: ManifestName,
        /// Version found in the manifest.
        found: semver::Version,
        /// Requirement this build accepts.
        supported: semver::VersionReq,
    },
}

/// YAML syntax error with a labelled source span.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(kumiki::yaml::parse))]
pub struct YamlDiagnostic {
    #[source_code]
    src: NamedSource<String>,
    #[label("parse error here")]
    span: Option<SourceSpan>,
    #[help]
    help: Option<String>,
    #[source]
    source: YamlError,
    message: String,
}

/// Reconstruct the byte offset for a 1-based line/column pair.
///
/// Offsets past the end of a line are clamped to the line end; both `\n` and
/// `\r\n` line endings are accepted.
fn byte_index(src: &str, line: u64, column: u64) -> usize {
    let target_line = usize::try_from(line.saturating_sub(1)).unwrap_or(usize::MAX);
    let target_column = usize::try_from(column.saturating_sub(1)).unwrap_or(usize::MAX);
    let mut offset = 0usize;
    for (idx, segment) in src.split_inclusive('\n').enumerate() {
        if idx == target_line {
            let without_newline = segment.strip_suffix('\n').unwrap_or(segment);
            let cleaned = without_newline
                .strip_suffix('\r')
                .unwrap_or(without_newline);
            let column_offset = cleaned
                .char_indices()
                .nth(target_column)
                .map_or(cleaned.len(), |(byte_idx, _)| byte_idx);
            return offset + column_offset;
        }
        offset += segment.len();
    }
    src.len()
}

fn to_span(src: &str, loc: Location) -> SourceSpan {
    let at = byte_index(src, loc.line(), loc.column());
    let len = usize::from(src.as_bytes().get(at).is_some_and(|b| *b != b'\n' && *b != b'\r'));
    SourceSpan::new(at.into(), len)
}

fn has_tab_indent(src: &str, loc: Option<Location>) -> bool {
    let Some(actual) = loc else {
        return false;
    };
    let line_idx = usize::try_from(actual.line().saturating_sub(1)).unwrap_or(usize::MAX);
    src.lines()
        .nth(line_idx)
        .unwrap_or("")
        .chars()
        .take_while(|c| c.is_whitespace())
        .any(|c| c == '\t')
}

/// Map a `serde_saphyr` parse error into a [`ManifestError::Parse`].
#[must_use]
pub fn map_yaml_error(err: YamlError, src: &str, name: &ManifestName) -> ManifestError {
    let loc = err.location();
    let (line, col, span) = loc.map_or((1, 1, None), |l| {
        (l.line(), l.column(), Some(to_span(src, l)))
    });
    let help = has_tab_indent(src, loc)
        .then(|| "Use spaces for indentation; tabs are invalid in YAML.".to_owned());
    let message = format!("YAML parse error at line {line}, column {col}: {err}");
    ManifestError::Parse {
        name: name.clone(),
        source: Box::new(YamlDiagnostic {
            src: NamedSource::new(name.as_str(), src.to_owned()),
            span,
            help,
            source: err,
            message,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a\nbc\n", 1, 1, 0)]
    #[case("a\nbc\n", 2, 2, 3)]
    #[case("a\r\nbc\r\n", 2, 1, 3)]
    #[case("a\nbc\n", 2, 9, 4)]
    #[case("a\n", 7, 1, 2)]
    fn byte_index_tracks_lines_and_columns(
        #[case] src: &str,
        #[case] line: u64,
        #[case] column: u64,
        #[case] expected: usize,
    ) {
        assert_eq!(byte_index(src, line, column), expected);
    }

    #[test]
    fn format_error_exposes_code() {
        let err = ManifestError::Format {
            name: ManifestName::new("Kumikifile"),
            location: "modules[0].dependencies".into(),
            details: "expected a list of strings, found a string".into(),
        };
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("kumiki::manifest::format"));
        assert_eq!(
            err.to_string(),
            "Kumikifile: modules[0].dependencies: expected a list of strings, found a string"
        );
    }
}
