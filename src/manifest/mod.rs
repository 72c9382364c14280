//! Manifest loading.
//!
//! A `Kumikifile` is YAML. The document is parsed into a plain value tree with
//! `serde_saphyr` and then checked against the module declaration grammar in
//! [`grammar`]. Dependency lists must be literal lists of strings; any other
//! expression is rejected with [`ManifestError::Format`].

use crate::ast::Manifest;
use camino::Utf8Path;
use semver::VersionReq;
use std::fs;
use tracing::debug;

mod diagnostics;
mod grammar;

/// Value tree produced by the YAML parser before the grammar walk.
pub type ManifestValue = serde_json::Value;

pub use diagnostics::{ManifestError, ManifestName, YamlDiagnostic, map_yaml_error};

use grammar::Grammar;

/// Manifest format versions this build understands.
pub const SUPPORTED_VERSIONS: &str = "^1";

/// Parse manifest text labelled `name` in diagnostics.
///
/// # Errors
///
/// Returns [`ManifestError::Parse`] for invalid YAML, [`ManifestError::Format`]
/// when a declaration does not match the grammar, and
/// [`ManifestError::Version`] for unsupported format versions.
pub fn from_str_named(yaml: &str, name: &ManifestName) -> Result<Manifest, ManifestError> {
    let doc: ManifestValue =
        serde_saphyr::from_str(yaml).map_err(|e| map_yaml_error(e, yaml, name))?;
    let manifest = Grammar::new(name).manifest(&doc)?;

    let supported = VersionReq::parse(SUPPORTED_VERSIONS).map_err(|err| ManifestError::Format {
        name: name.clone(),
        location: "kumiki_version".into(),
        details: err.to_string(),
    })?;
    if !supported.matches(&manifest.kumiki_version) {
        return Err(ManifestError::Version {
            name: name.clone(),
            found: manifest.kumiki_version,
            supported,
        });
    }
    debug!(
        manifest = %name,
        modules = manifest.modules.len(),
        "extracted module declarations"
    );
    Ok(manifest)
}

/// Parse manifest text.
///
/// # Errors
///
/// See [`from_str_named`].
pub fn from_str(yaml: &str) -> Result<Manifest, ManifestError> {
    from_str_named(yaml, &ManifestName::new("Kumikifile"))
}

/// Load a [`Manifest`] from the given file path.
///
/// # Errors
///
/// Returns [`ManifestError::Read`] when the file cannot be read, otherwise
/// the errors of [`from_str_named`].
pub fn from_path(path: &Utf8Path) -> Result<Manifest, ManifestError> {
    let data = fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_owned(),
        source,
    })?;
    from_str_named(&data, &ManifestName::new(path.as_str()))
}

#[cfg(test)]
mod tests;
