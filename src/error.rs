use thiserror::Error;

/// Failures reported by a [`SampleSource`](crate::audio::source::SampleSource).
#[derive(Debug, Error)]
pub enum SourceError {
    /// The capture device went away or its stream reported an error. Fatal.
    #[error("capture device unavailable: {0}")]
    DeviceLost(String),

    /// A file-backed source has no full block left.
    #[error("sample source exhausted")]
    Exhausted,

    /// Shutdown was requested while waiting for samples.
    #[error("interrupted while waiting for samples")]
    Interrupted,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("block size {0} is not a power of two of at least 4")]
    InvalidBlockSize(usize),

    #[error("sample block has {actual} samples, pipeline expects {expected}")]
    BlockLength { expected: usize, actual: usize },
}
