//! On-disk project fixtures.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

/// Manifest declaring a `Core` library and an `App` executable using it.
pub const CORE_APP_MANIFEST: &str = concat!(
    "kumiki_version: \"1.0.0\"\n",
    "modules:\n",
    "  - name: Core\n",
    "    dependencies: []\n",
    "  - name: App\n",
    "    dependencies: [Core]\n",
);

/// A temporary project directory with a manifest and module sources.
#[derive(Debug)]
pub struct Project {
    dir: TempDir,
    root: Utf8PathBuf,
}

impl Project {
    /// Create an empty project.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> Result<Self> {
        let dir = TempDir::new().context("create project dir")?;
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .map_err(|p| anyhow::anyhow!("project dir {} is not UTF-8", p.display()))?;
        Ok(Self { dir, root })
    }

    /// The `Core`/`App` project with one library source and an entry point.
    ///
    /// # Errors
    ///
    /// Returns an error if any file cannot be written.
    pub fn core_app() -> Result<Self> {
        Self::new()?
            .manifest(CORE_APP_MANIFEST)?
            .source("Core", "Core.swift", "public func greet() {}\n")?
            .source("App", "main.swift", "import Core\ngreet()\n")
    }

    /// Write `Kumikifile`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn manifest(self, yaml: &str) -> Result<Self> {
        self.file("Kumikifile", yaml)
    }

    /// Write `Sources/<module>/<relative>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn source(self, module: &str, relative: &str, content: &str) -> Result<Self> {
        self.file(&format!("Sources/{module}/{relative}"), content)
    }

    /// Write an arbitrary file below the project root.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or its parents cannot be created.
    pub fn file(self, relative: &str, content: &str) -> Result<Self> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {parent}"))?;
        }
        fs::write(&path, content).with_context(|| format!("write {path}"))?;
        Ok(self)
    }

    /// Project root.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Keep the directory handle alive; dropping it deletes the project.
    #[must_use]
    pub const fn temp_dir(&self) -> &TempDir {
        &self.dir
    }
}
