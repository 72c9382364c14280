//! Pipeline status reporting.
//!
//! A [`StatusReporter`] receives one update per [`PipelineStage`]. The
//! terminal reporter keeps a persistent `indicatif` line per stage so the
//! summary stays visible once the executor starts writing its own output.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::fmt;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

/// Stages of a `kumiki` run in reporting order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    /// Read and check the manifest.
    ManifestExtraction = 1,
    /// Infer implicit modules, scan sources and compute link orders.
    ModuleResolution = 2,
    /// Build and validate the task graph.
    TaskGraphEmission = 3,
    /// Render the build description and persist it if changed.
    GraphWriting = 4,
    /// Hand the description to the external executor.
    ExecutorRun = 5,
}

/// Number of stages reported during a full build.
pub const PIPELINE_STAGE_COUNT: u32 = 5;

impl PipelineStage {
    /// All stages in pipeline order.
    pub const ALL: [Self; 5] = [
        Self::ManifestExtraction,
        Self::ModuleResolution,
        Self::TaskGraphEmission,
        Self::GraphWriting,
        Self::ExecutorRun,
    ];

    /// 1-based position of this stage.
    #[must_use]
    pub const fn index(self) -> u32 {
        self as u32
    }

    /// Human-readable stage name.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::ManifestExtraction => "manifest extraction",
            Self::ModuleResolution => "module resolution",
            Self::TaskGraphEmission => "task graph emission",
            Self::GraphWriting => "graph writing",
            Self::ExecutorRun => "executor run",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

const _: () = assert!(
    PipelineStage::ALL.len() == PIPELINE_STAGE_COUNT as usize,
    "PipelineStage::ALL length must equal PIPELINE_STAGE_COUNT"
);

fn stage_label(stage: PipelineStage) -> String {
    format!(
        "[{}/{PIPELINE_STAGE_COUNT}] {}",
        stage.index(),
        stage.description()
    )
}

/// Receives pipeline progress.
pub trait StatusReporter {
    /// A stage has started; the previous one, if any, has finished.
    fn report_stage(&self, stage: PipelineStage);

    /// The pipeline finished successfully; `summary` names what was done.
    fn report_complete(&self, summary: &str);
}

/// Reporter that emits nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl StatusReporter for SilentReporter {
    fn report_stage(&self, _stage: PipelineStage) {}
    fn report_complete(&self, _summary: &str) {}
}

#[derive(Debug)]
struct IndicatifState {
    bars: Vec<ProgressBar>,
    running: Option<PipelineStage>,
    completed: bool,
    is_hidden: bool,
}

/// Terminal reporter backed by `indicatif::MultiProgress`.
#[derive(Debug)]
pub struct IndicatifReporter {
    // Keeps the draw target alive for the bars.
    _progress: MultiProgress,
    state: Mutex<IndicatifState>,
}

impl IndicatifReporter {
    /// Create a reporter with one pending line per stage, drawn on stderr.
    #[must_use]
    pub fn new() -> Self {
        let progress = MultiProgress::with_draw_target(ProgressDrawTarget::stderr_with_hz(12));
        progress.set_move_cursor(false);
        let style = ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());

        let bars = PipelineStage::ALL
            .iter()
            .map(|stage| {
                let bar = progress.add(ProgressBar::new(1));
                bar.set_style(style.clone());
                bar.set_message(format!("{} (pending)", stage_label(*stage)));
                bar
            })
            .collect();

        Self {
            state: Mutex::new(IndicatifState {
                bars,
                running: None,
                completed: false,
                is_hidden: progress.is_hidden(),
            }),
            _progress: progress,
        }
    }

    fn set_state(state: &IndicatifState, stage: PipelineStage, status: &str, finish: bool) {
        let message = format!("{} ({status})", stage_label(stage));
        if state.is_hidden {
            // Status output failures must not abort the pipeline.
            drop(writeln!(io::stderr(), "{message}"));
            return;
        }
        let Some(bar) = usize::try_from(stage.index().saturating_sub(1))
            .ok()
            .and_then(|index| state.bars.get(index))
        else {
            return;
        };
        if finish {
            bar.finish_with_message(message);
        } else {
            bar.set_message(message);
        }
    }
}

impl Default for IndicatifReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for IndicatifReporter {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.completed {
            return;
        }
        if let Some(stage) = state.running.take() {
            Self::set_state(&state, stage, "failed", true);
        }
    }
}

impl StatusReporter for IndicatifReporter {
    fn report_stage(&self, stage: PipelineStage) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = state.running
            && previous != stage
        {
            Self::set_state(&state, previous, "done", true);
        }
        Self::set_state(&state, stage, "running", false);
        state.running = Some(stage);
    }

    fn report_complete(&self, summary: &str) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(stage) = state.running.take() {
            Self::set_state(&state, stage, "done", true);
        }
        state.completed = true;
        drop(writeln!(io::stderr(), "{summary}"));
    }
}
