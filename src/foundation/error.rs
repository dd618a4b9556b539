/// Convenience result type used across sceneplay.
pub type SceneResult<T> = Result<T, SceneError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Only load-time validation is a hard stop for playback. Missing references and unknown action
/// types are tolerated during resolution and never surface here.
#[derive(thiserror::Error, Debug)]
pub enum SceneError {
    /// Malformed or missing required scene document fields.
    #[error("validation error: {0}")]
    Validation(String),

    /// The scene generation service failed or answered with something unusable.
    #[error("generation error: {message}")]
    Generation {
        /// Human-readable failure message.
        message: String,
        /// Alternative description proposed by the service. Never applied automatically.
        suggestion: Option<String>,
    },

    /// Errors while turning resolved state into pixels or frames.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// The speech backend is missing or failed.
    #[error("narration unavailable: {0}")]
    Narration(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SceneError {
    /// Build a [`SceneError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`SceneError::Generation`] value without a suggestion.
    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation {
            message: msg.into(),
            suggestion: None,
        }
    }

    /// Build a [`SceneError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`SceneError::Narration`] value.
    pub fn narration(msg: impl Into<String>) -> Self {
        Self::Narration(msg.into())
    }

    /// Build a [`SceneError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
