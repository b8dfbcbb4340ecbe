use derive_more::Display;

/// Share of the progress bar taken by page downloads.
const DOWNLOAD_SHARE: usize = 90;

/// Where an acquisition currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Stage {
    #[display("Starting")]
    Starting,
    /// About to fetch page `index` (zero-based) of `total`.
    #[display("Downloading page {} of {total}", index + 1)]
    Downloading { index: usize, total: usize },
    #[display("Saving PDF")]
    Serializing,
    #[display("Attaching PDF")]
    Writing,
    #[display("Finished")]
    Finished,
}

impl Stage {
    pub fn percent(&self) -> u8 {
        match *self {
            Self::Starting => 0,
            Self::Downloading { total: 0, .. } => 0,
            Self::Downloading { index, total } => (index.min(total) * DOWNLOAD_SHARE / total) as u8,
            Self::Serializing => 90,
            Self::Writing => 95,
            Self::Finished => 100,
        }
    }
}

/// Receives stage changes of a running acquisition.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, stage: Stage);
}

/// Reporter that discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _stage: Stage) {}
}
