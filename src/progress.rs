use digivat_render::{ProgressReporter, Stage};

/// Prints each stage as a progress line on stderr.
#[derive(Debug, Default)]
pub struct TerminalProgress;

impl ProgressReporter for TerminalProgress {
    fn report(&self, stage: Stage) {
        tracing::debug!(%stage, percent = stage.percent(), "Progress");
        eprintln!("[{:>3}%] {stage}", stage.percent());
    }
}
