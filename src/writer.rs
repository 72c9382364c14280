//! Compare-and-write persistence for the generated build description.
//!
//! The executor decides what to rebuild partly from the description's
//! modification time, so an unchanged description must not be rewritten.
//! Files are reached through `cap-std` directory handles rooted at the
//! nearest existing ancestor, so a build directory outside the working
//! directory is as reachable as one inside it.

use anyhow::{Context, Result, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use std::env;
use std::io::{self, Write};
use tracing::{debug, info};

/// Result of [`write_if_changed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The file was created or its contents replaced.
    Written,
    /// The file already held identical bytes and was left untouched.
    Unchanged,
}

impl WriteOutcome {
    /// Whether the file on disk changed.
    #[must_use]
    pub const fn changed(self) -> bool {
        matches!(self, Self::Written)
    }
}

/// Write `content` to `path` unless the file already holds exactly those
/// bytes. Missing parent directories are created.
///
/// # Errors
///
/// Returns an error if no ancestor of `path` can be opened, or if reading the
/// existing file (other than it being absent), creating directories, or
/// writing fails.
///
/// # Examples
///
/// ```
/// use camino::Utf8PathBuf;
/// use kumiki::writer::{WriteOutcome, write_if_changed};
///
/// let dir = tempfile::tempdir().expect("temp dir");
/// let path = Utf8PathBuf::from_path_buf(dir.path().join("build.yaml")).expect("utf8");
/// assert_eq!(write_if_changed(&path, "a").expect("write"), WriteOutcome::Written);
/// assert_eq!(write_if_changed(&path, "a").expect("write"), WriteOutcome::Unchanged);
/// ```
pub fn write_if_changed(path: &Utf8Path, content: &str) -> Result<WriteOutcome> {
    let (dir, relative) = derive_dir_and_relative(path)?;
    if existing_matches(&dir, &relative, content)
        .with_context(|| format!("read existing {path}"))?
    {
        debug!(path = %path, "build description unchanged");
        return Ok(WriteOutcome::Unchanged);
    }
    write_utf8(&dir, &relative, content)?;
    info!(path = %path, "wrote build description");
    Ok(WriteOutcome::Written)
}

fn existing_matches(dir: &Dir, path: &Utf8Path, content: &str) -> io::Result<bool> {
    match dir.read(path) {
        Ok(bytes) => Ok(bytes == content.as_bytes()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

fn write_utf8(dir: &Dir, path: &Utf8Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
        dir.create_dir_all(parent)
            .with_context(|| format!("create directory {parent}"))?;
    }
    let mut file = dir
        .create(path)
        .with_context(|| format!("create {path}"))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("write {path}"))?;
    file.flush().with_context(|| format!("flush {path}"))?;
    file.sync_all().with_context(|| format!("sync {path}"))?;
    Ok(())
}

/// Open the directory `path` is relative to.
///
/// Relative paths are anchored at the current directory first. The result is
/// split at its nearest existing ancestor, which may be several levels up
/// when the build directory has not been created yet or lies outside the
/// current directory.
fn derive_dir_and_relative(path: &Utf8Path) -> Result<(Dir, Utf8PathBuf)> {
    if path.is_absolute() {
        return open_nearest_ancestor(path);
    }
    let cwd = env::current_dir().context("resolve current directory")?;
    let base = Utf8PathBuf::from_path_buf(cwd)
        .map_err(|dir| anyhow!("current directory {} is not UTF-8", dir.display()))?;
    open_nearest_ancestor(&base.join(path))
}

fn open_nearest_ancestor(path: &Utf8Path) -> Result<(Dir, Utf8PathBuf)> {
    let mut ancestors = path.ancestors();
    ancestors.next();
    let (base, dir) = ancestors
        .find_map(|candidate| {
            Dir::open_ambient_dir(candidate, ambient_authority())
                .ok()
                .map(|dir| (candidate.to_owned(), dir))
        })
        .ok_or_else(|| anyhow!("no existing ancestor directory for {path}"))?;
    let relative = path
        .strip_prefix(&base)
        .context("derive path relative to ancestor")?
        .to_owned();
    Ok((dir, relative))
}
