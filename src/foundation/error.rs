/// Convenience result type used across Tessera.
pub type TesseraResult<T> = Result<T, TesseraError>;

/// Top-level error taxonomy used by session, engine and channel APIs.
#[derive(thiserror::Error, Debug)]
pub enum TesseraError {
    /// Invalid user-provided configuration or image data.
    #[error("validation error: {0}")]
    Validation(String),

    /// The engine could not be constructed for a session.
    #[error("engine init error: {0}")]
    EngineInit(String),

    /// The engine failed (returned an error or panicked) while advancing a batch.
    #[error("engine step error: {0}")]
    EngineStep(String),

    /// The message link between the foreground and a background context broke.
    #[error("channel error: {0}")]
    Channel(String),

    /// An operation was attempted in a lifecycle state that does not accept it.
    #[error("state error: {0}")]
    State(String),

    /// Errors when serializing or deserializing configuration.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TesseraError {
    /// Build a [`TesseraError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`TesseraError::EngineInit`] value.
    pub fn engine_init(msg: impl Into<String>) -> Self {
        Self::EngineInit(msg.into())
    }

    /// Build a [`TesseraError::EngineStep`] value.
    pub fn engine_step(msg: impl Into<String>) -> Self {
        Self::EngineStep(msg.into())
    }

    /// Build a [`TesseraError::Channel`] value.
    pub fn channel(msg: impl Into<String>) -> Self {
        Self::Channel(msg.into())
    }

    /// Build a [`TesseraError::State`] value.
    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    /// Build a [`TesseraError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for TesseraError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
