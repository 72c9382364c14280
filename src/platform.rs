//! Target platform profiles.
//!
//! Everything that differs between host operating systems when assembling
//! link commands lives in a [`PlatformProfile`]. Profiles are looked up in a
//! [`PlatformTable`], so supporting a new platform means adding a row rather
//! than branching inside the emitter.

use clap::ValueEnum;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Platforms with a built-in profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Linux with a GNU-compatible linker.
    Linux,
    /// macOS with the Apple linker.
    Darwin,
}

impl Platform {
    /// The platform this binary was compiled for.
    #[must_use]
    pub const fn host() -> Self {
        if cfg!(target_os = "macos") {
            Self::Darwin
        } else {
            Self::Linux
        }
    }

    /// Lowercase platform name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Darwin => "darwin",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Platform-specific naming and link flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformProfile {
    /// Prefix of static archive file names.
    pub archive_prefix: String,
    /// Suffix of static archive file names.
    pub archive_suffix: String,
    /// Suffix of executable file names.
    pub executable_suffix: String,
    /// Target triple passed to the compiler unless overridden.
    pub default_target: Option<String>,
    /// Flags placed before dependency archives so every member is loaded.
    pub whole_archive_prefix: Vec<String>,
    /// Flags placed after dependency archives.
    pub whole_archive_suffix: Vec<String>,
    /// Runtime search path flags for executables.
    pub rpath_flags: Vec<String>,
    /// Libraries every executable links against.
    pub default_link_libraries: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

impl PlatformProfile {
    /// Profile for Linux.
    #[must_use]
    pub fn linux() -> Self {
        Self {
            archive_prefix: "lib".into(),
            archive_suffix: ".a".into(),
            executable_suffix: String::new(),
            default_target: None,
            whole_archive_prefix: strings(&["-Xlinker", "--whole-archive"]),
            whole_archive_suffix: strings(&["-Xlinker", "--no-whole-archive"]),
            rpath_flags: strings(&["-Xlinker", "-rpath=$ORIGIN"]),
            default_link_libraries: Vec::new(),
        }
    }

    /// Profile for macOS.
    #[must_use]
    pub fn darwin() -> Self {
        Self {
            archive_prefix: "lib".into(),
            archive_suffix: ".a".into(),
            executable_suffix: String::new(),
            default_target: Some("x86_64-apple-macosx10.10".into()),
            whole_archive_prefix: strings(&["-Xlinker", "-all_load"]),
            whole_archive_suffix: Vec::new(),
            rpath_flags: Vec::new(),
            default_link_libraries: Vec::new(),
        }
    }
}

/// Profiles keyed by platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformTable {
    profiles: IndexMap<Platform, PlatformProfile>,
}

impl PlatformTable {
    /// Table holding the built-in Linux and Darwin profiles.
    #[must_use]
    pub fn builtin() -> Self {
        let profiles = IndexMap::from([
            (Platform::Linux, PlatformProfile::linux()),
            (Platform::Darwin, PlatformProfile::darwin()),
        ]);
        Self { profiles }
    }

    /// Look up the profile for `platform`.
    #[must_use]
    pub fn profile(&self, platform: Platform) -> Option<&PlatformProfile> {
        self.profiles.get(&platform)
    }

    /// Replace or add the profile for `platform`.
    pub fn insert(&mut self, platform: Platform, profile: PlatformProfile) {
        self.profiles.insert(platform, profile);
    }
}

impl Default for PlatformTable {
    fn default() -> Self {
        Self::builtin()
    }
}
