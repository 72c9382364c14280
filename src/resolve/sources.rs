//! Source discovery for declared modules.
//!
//! Each module owns the directory `<sources_root>/<module>`. Files with the
//! configured extension are collected recursively and sorted; the presence of
//! the entry-point file directly inside the module directory marks the module
//! as an executable.

use camino::{Utf8Path, Utf8PathBuf};
use std::io;
use walkdir::WalkDir;

/// Files found for one module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredSources {
    /// Source paths relative to the project directory, sorted.
    pub files: Vec<Utf8PathBuf>,
    /// Whether the entry-point file was among them.
    pub is_executable: bool,
}

/// Supplies the source files belonging to a module.
pub trait SourceTree {
    /// Discover the sources of `module`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the module directory exists but cannot be
    /// read.
    fn discover(&self, module: &str) -> io::Result<DiscoveredSources>;
}

/// Scans module directories on disk.
#[derive(Debug, Clone)]
pub struct FsSourceTree {
    base: Utf8PathBuf,
    root: Utf8PathBuf,
    extension: String,
    entry_point: String,
}

impl FsSourceTree {
    /// Scan `<base>/<root>/<module>` for files ending in `.<extension>`.
    ///
    /// Reported paths are relative to `base`, matching the paths the build
    /// executor sees when it runs from `base`.
    #[must_use]
    pub fn new(
        base: impl Into<Utf8PathBuf>,
        root: impl Into<Utf8PathBuf>,
        extension: impl Into<String>,
        entry_point: impl Into<String>,
    ) -> Self {
        Self {
            base: base.into(),
            root: root.into(),
            extension: extension.into(),
            entry_point: entry_point.into(),
        }
    }

    fn relative(&self, path: &Utf8Path) -> Utf8PathBuf {
        path.strip_prefix(&self.base)
            .map_or_else(|_| path.to_owned(), Utf8Path::to_owned)
    }
}

impl SourceTree for FsSourceTree {
    fn discover(&self, module: &str) -> io::Result<DiscoveredSources> {
        let dir = self.base.join(&self.root).join(module);
        if !dir.is_dir() {
            return Ok(DiscoveredSources::default());
        }

        let mut files = Vec::new();
        for item in WalkDir::new(&dir).follow_links(true) {
            let entry = item.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = Utf8PathBuf::from_path_buf(entry.into_path()).map_err(|path| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("source path {} is not valid UTF-8", path.display()),
                )
            })?;
            if path.extension() == Some(self.extension.as_str()) {
                files.push(self.relative(&path));
            }
        }
        files.sort();

        let entry_point = self.relative(&dir.join(&self.entry_point));
        let is_executable = files.contains(&entry_point);
        Ok(DiscoveredSources {
            files,
            is_executable,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow, ensure};
    use std::fs;

    fn tree_in(dir: &tempfile::TempDir) -> Result<FsSourceTree> {
        let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .map_err(|p| anyhow!("non UTF-8 temp dir {}", p.display()))?;
        Ok(FsSourceTree::new(base, "Sources", "swift", "main.swift"))
    }

    #[test]
    fn collects_sorted_sources_relative_to_base() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let module = dir.path().join("Sources/Core");
        fs::create_dir_all(module.join("Nested"))?;
        fs::write(module.join("b.swift"), "")?;
        fs::write(module.join("a.swift"), "")?;
        fs::write(module.join("Nested/c.swift"), "")?;
        fs::write(module.join("README.md"), "")?;

        let found = tree_in(&dir)?.discover("Core")?;
        let expected: Vec<Utf8PathBuf> = [
            "Sources/Core/Nested/c.swift",
            "Sources/Core/a.swift",
            "Sources/Core/b.swift",
        ]
        .into_iter()
        .map(Utf8PathBuf::from)
        .collect();
        ensure!(found.files == expected, "unexpected files {:?}", found.files);
        ensure!(!found.is_executable, "library should not be executable");
        Ok(())
    }

    #[test]
    fn top_level_entry_point_marks_executable() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let module = dir.path().join("Sources/App");
        fs::create_dir_all(&module)?;
        fs::write(module.join("main.swift"), "")?;

        let found = tree_in(&dir)?.discover("App")?;
        ensure!(found.is_executable, "main.swift should mark App executable");
        Ok(())
    }

    #[test]
    fn nested_entry_point_does_not_mark_executable() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let module = dir.path().join("Sources/Tool/Sub");
        fs::create_dir_all(&module)?;
        fs::write(module.join("main.swift"), "")?;

        let found = tree_in(&dir)?.discover("Tool")?;
        ensure!(found.files.len() == 1, "unexpected files {:?}", found.files);
        ensure!(!found.is_executable, "nested main.swift is not an entry point");
        Ok(())
    }

    #[test]
    fn missing_directory_yields_no_sources() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let found = tree_in(&dir)?.discover("Ghost")?;
        ensure!(found == DiscoveredSources::default(), "expected nothing, got {found:?}");
        Ok(())
    }
}
