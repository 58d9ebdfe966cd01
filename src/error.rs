use thiserror::Error;

/// Errors a pipeline stage reports back to whatever invoked it
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A required input field was absent or empty
    #[error("{stage}: missing required field `{field}`")]
    MissingField {
        stage: &'static str,
        field: &'static str,
    },

    /// The message body could not be decoded
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("text detection failed: {0:#}")]
    Detection(anyhow::Error),

    #[error("translation failed: {0:#}")]
    Translation(anyhow::Error),

    #[error("storage failed: {0:#}")]
    Storage(anyhow::Error),

    #[error("messaging failed: {0:#}")]
    Messaging(anyhow::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn missing(stage: &'static str, field: &'static str) -> Self {
        Self::MissingField { stage, field }
    }

    /// Permanent errors will fail the same way on every redelivery
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::MissingField { .. } | Self::InvalidPayload(_) | Self::Config(_)
        )
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(error: serde_json::Error) -> Self {
        Self::InvalidPayload(error.to_string())
    }
}

pub type StageResult<T> = Result<T, PipelineError>;
