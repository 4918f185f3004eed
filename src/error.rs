use std::time::Duration;
use thiserror::Error;

/// A feed payload that could not be decoded.
#[derive(Error, Debug)]
#[error("failed to decode feed payload: {0}")]
pub struct DecodeError(#[from] pub prost::DecodeError);

/// Why a single partition cycle ended without updating shared state.
#[derive(Error, Debug)]
pub enum CycleError {
    #[error("fetch failed for feed {feed_id:?}: {error:#}")]
    Fetch {
        feed_id: String,
        error: anyhow::Error,
    },

    #[error("fetch for feed {feed_id:?} timed out after {timeout:?}")]
    Timeout { feed_id: String, timeout: Duration },

    #[error("feed {feed_id:?} could not be decoded: {source}")]
    Decode {
        feed_id: String,
        #[source]
        source: DecodeError,
    },
}

impl CycleError {
    /// Short machine-friendly label, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            CycleError::Fetch { .. } => "fetch_error",
            CycleError::Timeout { .. } => "timeout",
            CycleError::Decode { .. } => "decode_error",
        }
    }
}
