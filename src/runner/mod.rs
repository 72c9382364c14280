//! CLI execution and command dispatch logic.
//!
//! This module keeps `main` minimal by providing a single entry point that
//! drives the pipeline: manifest extraction, module resolution, task graph
//! emission, description writing and, for `build`, the executor run.

mod error;
mod process;

pub use error::RunnerError;
pub use executor_env::{DEFAULT_EXECUTOR, EXECUTOR_ENV};
pub use process::{ExecutorInvocation, resolve_executor_program, run_executor};

use crate::cli::{BuildArgs, Cli, Commands};
use crate::graph::TaskGraphEmitter;
use crate::platform::PlatformTable;
use crate::resolve::{FsSourceTree, ModuleGraph, resolve};
use crate::status::{IndicatifReporter, PipelineStage, SilentReporter, StatusReporter};
use crate::toolchain::{BuildLayout, EmitConfig};
use crate::writer::{WriteOutcome, write_if_changed};
use crate::{llbuild_gen, manifest};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::io::{self, IsTerminal, Write};
use tracing::{debug, info};

/// Description written by the generation stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedBuild {
    /// Directory every other path is relative to.
    pub base_dir: Utf8PathBuf,
    /// Description path, relative to `base_dir` unless absolute.
    pub description: Utf8PathBuf,
    /// Whether the file on disk changed.
    pub outcome: WriteOutcome,
}

fn make_reporter(progress: Option<bool>) -> Box<dyn StatusReporter> {
    if progress.unwrap_or_else(|| io::stderr().is_terminal()) {
        Box::new(IndicatifReporter::new())
    } else {
        Box::new(SilentReporter)
    }
}

/// Execute the parsed [`Cli`] command.
///
/// # Errors
///
/// Returns an error naming the failing pipeline stage. Executor failures keep
/// their [`RunnerError`] so callers can recover the exit code.
pub fn run(cli: &Cli) -> Result<()> {
    let reporter = make_reporter(cli.progress);
    let command = cli
        .command
        .clone()
        .unwrap_or_else(|| Commands::Build(BuildArgs::default()));
    match command {
        Commands::Build(args) => handle_build(cli, &args, reporter.as_ref()),
        Commands::Generate => {
            let generated = generate(cli, reporter.as_ref())?;
            let summary = match generated.outcome {
                WriteOutcome::Written => format!("wrote {}", generated.description),
                WriteOutcome::Unchanged => format!("{} is up to date", generated.description),
            };
            info!("{summary}");
            reporter.report_complete(&summary);
            Ok(())
        }
        Commands::Resolve => {
            let modules = resolve_modules(cli, reporter.as_ref())?;
            write_modules_json(&modules).context("write resolved modules")?;
            reporter.report_complete("resolved modules");
            Ok(())
        }
    }
}

fn handle_build(cli: &Cli, args: &BuildArgs, reporter: &dyn StatusReporter) -> Result<()> {
    let generated = generate(cli, reporter)?;
    reporter.report_stage(PipelineStage::ExecutorRun);
    let program = resolve_executor_program();
    let invocation = ExecutorInvocation {
        program,
        working_dir: &generated.base_dir,
        build_file: &generated.description,
        verbose: cli.verbose,
        jobs: cli.jobs,
        targets: &args.targets,
    };
    run_executor(&invocation).with_context(|| PipelineStage::ExecutorRun.to_string())?;
    reporter.report_complete("build finished");
    Ok(())
}

/// Directory the run is rooted at: `-C` or the current directory.
#[must_use]
pub fn base_dir(cli: &Cli) -> Utf8PathBuf {
    cli.directory
        .clone()
        .unwrap_or_else(|| Utf8PathBuf::from("."))
}

fn manifest_path(cli: &Cli, base: &Utf8Path) -> Result<Utf8PathBuf, RunnerError> {
    let path = base.join(&cli.file);
    if path.is_file() {
        return Ok(path);
    }
    Err(RunnerError::ManifestNotFound {
        manifest_name: cli
            .file
            .file_name()
            .unwrap_or_else(|| cli.file.as_str())
            .to_owned(),
        directory: path
            .parent()
            .map_or_else(|| base.to_owned(), Utf8Path::to_owned),
        path,
    })
}

fn resolve_modules(cli: &Cli, reporter: &dyn StatusReporter) -> Result<ModuleGraph> {
    let base = base_dir(cli);
    reporter.report_stage(PipelineStage::ManifestExtraction);
    let path = manifest_path(cli, &base)
        .with_context(|| PipelineStage::ManifestExtraction.to_string())?;
    let manifest =
        manifest::from_path(&path).with_context(|| PipelineStage::ManifestExtraction.to_string())?;
    debug!(
        path = %path,
        modules = manifest.modules.len(),
        "loaded manifest"
    );

    reporter.report_stage(PipelineStage::ModuleResolution);
    let layout = cli.layout();
    let tree = source_tree(&base, &layout);
    resolve(&manifest.modules, &tree).with_context(|| PipelineStage::ModuleResolution.to_string())
}

fn source_tree(base: &Utf8Path, layout: &BuildLayout) -> FsSourceTree {
    FsSourceTree::new(
        base,
        layout.sources_root.clone(),
        layout.source_extension.clone(),
        layout.entry_point.clone(),
    )
}

/// Run every stage up to and including writing the description.
///
/// # Errors
///
/// Returns an error naming the stage that failed.
pub fn generate(cli: &Cli, reporter: &dyn StatusReporter) -> Result<GeneratedBuild> {
    let modules = resolve_modules(cli, reporter)?;

    reporter.report_stage(PipelineStage::TaskGraphEmission);
    let config = emit_config(cli).context("select platform profile")?;
    let graph = TaskGraphEmitter::new(&config)
        .emit(&modules)
        .with_context(|| PipelineStage::TaskGraphEmission.to_string())?;

    reporter.report_stage(PipelineStage::GraphWriting);
    let base = base_dir(cli);
    let description = config.layout.description_path();
    let text = llbuild_gen::generate(&graph);
    let outcome = write_if_changed(&base.join(&description), &text)
        .with_context(|| PipelineStage::GraphWriting.to_string())?;
    Ok(GeneratedBuild {
        base_dir: base,
        description,
        outcome,
    })
}

fn emit_config(cli: &Cli) -> Result<EmitConfig> {
    let platform = cli.platform();
    let profile = PlatformTable::builtin()
        .profile(platform)
        .cloned()
        .with_context(|| format!("no link profile for platform {platform}"))?;
    Ok(EmitConfig {
        toolchain: cli.toolchain(),
        layout: cli.layout(),
        profile,
    })
}

fn write_modules_json(modules: &ModuleGraph) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, modules)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}
