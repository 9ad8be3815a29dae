/// Convenience result type used across the crate.
pub type WavyteResult<T> = Result<T, WavyteError>;

/// Top-level error taxonomy used by compositor and decoder APIs.
#[derive(thiserror::Error, Debug)]
pub enum WavyteError {
    /// Invalid user-provided layer or clip data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while composing a frame.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// A decoded or returned frame does not have the byte length its geometry promises.
    #[error("frame integrity violation: {0}")]
    Integrity(String),

    /// The decoder output stream reported an error.
    #[error("stream error: {0}")]
    Stream(String),

    /// The external decoder process failed to start or exited with a failure we did not cause.
    #[error("process error: {0}")]
    Process(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WavyteError {
    /// Build a [`WavyteError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`WavyteError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`WavyteError::Integrity`] value.
    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::Integrity(msg.into())
    }

    /// Build a [`WavyteError::Stream`] value.
    pub fn stream(msg: impl Into<String>) -> Self {
        Self::Stream(msg.into())
    }

    /// Build a [`WavyteError::Process`] value.
    pub fn process(msg: impl Into<String>) -> Self {
        Self::Process(msg.into())
    }

    /// Build a [`WavyteError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for WavyteError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
