//! Toolchain and build-directory configuration passed to the emitter.
//!
//! The compiler, archiver, and linker are opaque external tools. Their
//! locations and flags come from the caller; the emitter only places them into
//! node commands.

use camino::{Utf8Path, Utf8PathBuf};
use clap::ValueEnum;
use serde::Serialize;
use std::fmt;

use crate::platform::PlatformProfile;

/// Build configuration selecting optimisation flags and the build directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Configuration {
    /// Unoptimised build with debug info.
    #[default]
    Debug,
    /// Optimised build.
    Release,
}

impl Configuration {
    /// Lowercase configuration name, also used as the build subdirectory.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    /// Compiler flags selecting the optimisation level.
    #[must_use]
    pub const fn optimization_flags(self) -> &'static [&'static str] {
        match self {
            Self::Debug => &["-Onone", "-g"],
            Self::Release => &["-O"],
        }
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// External tools and the flags handed to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toolchain {
    /// Source compiler executable.
    pub compiler: Utf8PathBuf,
    /// Name of the executor tool that drives the compiler.
    pub compiler_tool: String,
    /// Static archive tool.
    pub archiver: Utf8PathBuf,
    /// Link driver used for executables.
    pub linker: Utf8PathBuf,
    /// System root override.
    pub sysroot: Option<Utf8PathBuf>,
    /// Target triple override; falls back to the platform default.
    pub target: Option<String>,
    /// Optimisation level.
    pub configuration: Configuration,
    /// Parallelism hint forwarded to the compiler.
    pub jobs: Option<usize>,
    /// Extra flags passed to every compile.
    pub extra_flags: Vec<String>,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            compiler: Utf8PathBuf::from("swiftc"),
            compiler_tool: "swift-compiler".into(),
            archiver: Utf8PathBuf::from("ar"),
            linker: Utf8PathBuf::from("swiftc"),
            sysroot: None,
            target: None,
            configuration: Configuration::Debug,
            jobs: None,
            extra_flags: Vec::new(),
        }
    }
}

/// Where sources are found and artefacts are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildLayout {
    /// Directory holding every build product.
    pub build_dir: Utf8PathBuf,
    /// Directory holding one subdirectory per module.
    pub sources_root: Utf8PathBuf,
    /// Extension of source files, without the dot.
    pub source_extension: String,
    /// File name that marks a module as an executable.
    pub entry_point: String,
    /// Extension of compiled module interfaces, without the dot.
    pub interface_extension: String,
}

impl BuildLayout {
    /// Default layout building into `.build/<configuration>`.
    #[must_use]
    pub fn for_configuration(configuration: Configuration) -> Self {
        Self {
            build_dir: Utf8PathBuf::from(".build").join(configuration.as_str()),
            ..Self::default()
        }
    }

    /// Per-module scratch directory holding object files.
    #[must_use]
    pub fn temps_dir(&self, module: &str) -> Utf8PathBuf {
        self.build_dir.join(format!("{module}.build"))
    }

    /// Compiled module interface of `module`.
    #[must_use]
    pub fn module_interface(&self, module: &str) -> Utf8PathBuf {
        self.build_dir
            .join(format!("{module}.{}", self.interface_extension))
    }

    /// Object file produced from `source`.
    ///
    /// The object mirrors the source's path below the module directory so
    /// identically named files in different subdirectories stay distinct.
    #[must_use]
    pub fn object(&self, module: &str, source: &Utf8Path) -> Utf8PathBuf {
        let module_dir = self.sources_root.join(module);
        let relative = source
            .strip_prefix(&module_dir)
            .ok()
            .or_else(|| source.file_name().map(Utf8Path::new))
            .unwrap_or(source);
        let mut object = self.temps_dir(module).join(relative).into_string();
        object.push_str(".o");
        Utf8PathBuf::from(object)
    }

    /// Static archive produced for `module`.
    #[must_use]
    pub fn archive(&self, module: &str, profile: &PlatformProfile) -> Utf8PathBuf {
        self.build_dir.join(format!(
            "{}{module}{}",
            profile.archive_prefix, profile.archive_suffix
        ))
    }

    /// Executable produced for `module`.
    #[must_use]
    pub fn executable(&self, module: &str, profile: &PlatformProfile) -> Utf8PathBuf {
        self.build_dir
            .join(format!("{module}{}", profile.executable_suffix))
    }

    /// Path of the generated task graph description.
    #[must_use]
    pub fn description_path(&self) -> Utf8PathBuf {
        self.build_dir.join("build.yaml")
    }
}

impl Default for BuildLayout {
    fn default() -> Self {
        Self {
            build_dir: Utf8PathBuf::from(".build/debug"),
            sources_root: Utf8PathBuf::from("Sources"),
            source_extension: "swift".into(),
            entry_point: "main.swift".into(),
            interface_extension: "swiftmodule".into(),
        }
    }
}

/// Everything the task graph emitter needs besides the resolved modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmitConfig {
    /// External tools and flags.
    pub toolchain: Toolchain,
    /// Source and output locations.
    pub layout: BuildLayout,
    /// Platform-specific link settings.
    pub profile: PlatformProfile,
}

impl EmitConfig {
    /// Target triple in effect: the explicit override or the platform default.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        self.toolchain
            .target
            .as_deref()
            .or(self.profile.default_target.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Sources/Core/a.swift", ".build/debug/Core.build/a.swift.o")]
    #[case("Sources/Core/Sub/a.swift", ".build/debug/Core.build/Sub/a.swift.o")]
    #[case("Elsewhere/b.swift", ".build/debug/Core.build/b.swift.o")]
    fn object_paths_mirror_module_layout(#[case] source: &str, #[case] expected: &str) {
        let layout = BuildLayout::default();
        assert_eq!(layout.object("Core", Utf8Path::new(source)), Utf8PathBuf::from(expected));
    }

    #[rstest]
    fn artefact_paths_follow_profile() {
        let layout = BuildLayout::for_configuration(Configuration::Release);
        let profile = PlatformProfile::linux();
        assert_eq!(layout.archive("Core", &profile), Utf8PathBuf::from(".build/release/libCore.a"));
        assert_eq!(layout.executable("App", &profile), Utf8PathBuf::from(".build/release/App"));
        assert_eq!(
            layout.module_interface("Core"),
            Utf8PathBuf::from(".build/release/Core.swiftmodule")
        );
    }

    #[rstest]
    fn explicit_target_overrides_platform_default() {
        let mut config = EmitConfig {
            toolchain: Toolchain::default(),
            layout: BuildLayout::default(),
            profile: PlatformProfile::darwin(),
        };
        assert_eq!(config.target(), Some("x86_64-apple-macosx10.10"));
        config.toolchain.target = Some("arm64-apple-macosx13.0".into());
        assert_eq!(config.target(), Some("arm64-apple-macosx13.0"));
    }
}
