//! In-memory source discovery for resolver tests.

use camino::Utf8PathBuf;
use kumiki::resolve::{DiscoveredSources, SourceTree};
use std::collections::HashMap;
use std::io;

/// Source tree backed by a map from module name to file names.
///
/// Files are reported as `Sources/<module>/<file>`; a module holding
/// `main.swift` is an executable.
#[derive(Debug, Default, Clone)]
pub struct MemorySourceTree {
    modules: HashMap<String, Vec<String>>,
}

impl MemorySourceTree {
    /// Empty tree: every module has no sources.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `files` to `module`.
    #[must_use]
    pub fn with(mut self, module: &str, files: &[&str]) -> Self {
        self.modules
            .entry(module.to_owned())
            .or_default()
            .extend(files.iter().map(|f| (*f).to_owned()));
        self
    }
}

impl SourceTree for MemorySourceTree {
    fn discover(&self, module: &str) -> io::Result<DiscoveredSources> {
        let Some(files) = self.modules.get(module) else {
            return Ok(DiscoveredSources::default());
        };
        let mut sorted = files.clone();
        sorted.sort();
        Ok(DiscoveredSources {
            is_executable: sorted.iter().any(|f| f == "main.swift"),
            files: sorted
                .iter()
                .map(|f| Utf8PathBuf::from(format!("Sources/{module}/{f}")))
                .collect(),
        })
    }
}
