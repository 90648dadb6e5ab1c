//! Error taxonomy for the extraction engine.

use thiserror::Error;

/// Everything that can go wrong during one fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The page failed to load within the navigation timeout. The only
    /// retryable failure: the engine re-attempts the whole fetch with a
    /// linearly increasing delay.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// The pipeline completed but no mandatory field resolved. A normal
    /// "not found" outcome; retrying the same page is assumed unproductive.
    #[error("page yielded no extractable data")]
    ExtractionEmpty,

    /// Any other fault during in-page evaluation or parsing. Caught at the
    /// fetch boundary, logged, and surfaced as "no result" — never as a
    /// crash of the calling request.
    #[error(transparent)]
    Extraction(#[from] anyhow::Error),
}

impl FetchError {
    /// Whether the whole fetch should be re-attempted.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Navigation(_))
    }
}
