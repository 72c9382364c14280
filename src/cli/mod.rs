//! Command line interface definition using clap.
//!
//! This module defines the [`Cli`] structure and its subcommands. Tool
//! locations fall back to `KUMIKI_*` environment variables, then to the
//! built-in [`Toolchain`] defaults.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

use crate::platform::Platform;
use crate::toolchain::{BuildLayout, Configuration, Toolchain};

mod parsing;

use parsing::{parse_jobs, split_flag};

/// Maximum number of jobs accepted by the CLI.
const MAX_JOBS: usize = 64;

/// Generate and run builds for module-structured source trees.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the Kumiki manifest file to use.
    #[arg(short, long, value_name = "FILE", default_value = "Kumikifile")]
    pub file: Utf8PathBuf,

    /// Run as if started in this directory.
    ///
    /// Manifest lookup, source discovery, and build outputs are all relative
    /// to it.
    #[arg(short = 'C', long, value_name = "DIR")]
    pub directory: Option<Utf8PathBuf>,

    /// Number of parallel jobs for the compiler and executor.
    ///
    /// Values must be between 1 and 64.
    #[arg(short, long, value_name = "N", value_parser = parse_jobs)]
    pub jobs: Option<usize>,

    /// Enable verbose diagnostic logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Force standard progress summaries on or off.
    ///
    /// When omitted, progress is shown when stderr is a terminal.
    #[arg(long)]
    pub progress: Option<bool>,

    /// Platform whose link conventions to use; defaults to the host.
    #[arg(long, value_enum, value_name = "PLATFORM")]
    pub platform: Option<Platform>,

    /// Build configuration.
    #[arg(long, value_enum, default_value_t = Configuration::Debug)]
    pub configuration: Configuration,

    /// Directory for build products; defaults to `.build/<configuration>`.
    #[arg(long, value_name = "DIR", env = "KUMIKI_BUILD_DIR")]
    pub build_dir: Option<Utf8PathBuf>,

    /// Source compiler executable.
    #[arg(long, value_name = "PATH", env = "KUMIKI_COMPILER")]
    pub compiler: Option<Utf8PathBuf>,

    /// Static archive tool.
    #[arg(long, value_name = "PATH", env = "KUMIKI_ARCHIVER")]
    pub archiver: Option<Utf8PathBuf>,

    /// Link driver for executables.
    #[arg(long, value_name = "PATH", env = "KUMIKI_LINKER")]
    pub linker: Option<Utf8PathBuf>,

    /// System root passed to the compiler and linker.
    #[arg(long, value_name = "PATH", env = "KUMIKI_SYSROOT")]
    pub sysroot: Option<Utf8PathBuf>,

    /// Target triple; overrides the platform default.
    #[arg(long, value_name = "TRIPLE")]
    pub target: Option<String>,

    /// Extra compiler flag; may be repeated. Quoted words are split.
    #[arg(
        short = 'X',
        long = "extra-flag",
        value_name = "FLAG",
        allow_hyphen_values = true
    )]
    pub extra_flags: Vec<String>,

    /// Optional subcommand to execute; defaults to `build` when omitted.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Apply the default command if none was specified.
    #[must_use]
    pub fn with_default_command(mut self) -> Self {
        if self.command.is_none() {
            self.command = Some(Commands::Build(BuildArgs::default()));
        }
        self
    }

    /// Platform in effect.
    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform.unwrap_or_else(Platform::host)
    }

    /// Toolchain described by the flags, over the built-in defaults.
    #[must_use]
    pub fn toolchain(&self) -> Toolchain {
        let defaults = Toolchain::default();
        Toolchain {
            compiler: self.compiler.clone().unwrap_or(defaults.compiler),
            archiver: self.archiver.clone().unwrap_or(defaults.archiver),
            linker: self.linker.clone().unwrap_or(defaults.linker),
            sysroot: self.sysroot.clone(),
            target: self.target.clone(),
            configuration: self.configuration,
            jobs: self.jobs,
            extra_flags: self.extra_flags.iter().flat_map(|f| split_flag(f)).collect(),
            ..defaults
        }
    }

    /// Build layout for the selected configuration and build directory.
    #[must_use]
    pub fn layout(&self) -> BuildLayout {
        let mut layout = BuildLayout::for_configuration(self.configuration);
        if let Some(dir) = &self.build_dir {
            layout.build_dir.clone_from(dir);
        }
        layout
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            file: Utf8PathBuf::from("Kumikifile"),
            directory: None,
            jobs: None,
            verbose: false,
            progress: None,
            platform: None,
            configuration: Configuration::Debug,
            build_dir: None,
            compiler: None,
            archiver: None,
            linker: None,
            sysroot: None,
            target: None,
            extra_flags: Vec::new(),
            command: None,
        }
        .with_default_command()
    }
}

/// Arguments accepted by the `build` command.
#[derive(Debug, Default, Args, PartialEq, Eq, Clone)]
pub struct BuildArgs {
    /// Targets to build; the executor's default target when empty.
    pub targets: Vec<String>,
}

/// Available top-level commands.
#[derive(Debug, Subcommand, PartialEq, Eq, Clone)]
pub enum Commands {
    /// Generate the build description and run the executor (default).
    Build(BuildArgs),

    /// Write the build description without running the executor.
    Generate,

    /// Print the resolved module graph as JSON.
    Resolve,
}
