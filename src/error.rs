//! Error types for Cadenza

use thiserror::Error;

/// Failure of the hardware audio clock or output stream.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Audio device error: {0}")]
    Device(String),

    #[error("Audio stream error: {0}")]
    Stream(String),

    #[error("Audio context is closed")]
    Closed,
}

/// Raw bytes could not be turned into a playable buffer.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Unsupported audio format: {0}")]
    Unsupported(String),

    #[error("Malformed audio data: {0}")]
    Malformed(String),

    #[error("Decoded audio contains no samples")]
    Empty,

    #[error("Resampling error: {0}")]
    Resample(String),
}

/// An operation named a source that is not registered.
///
/// Callers usually treat this as a benign no-op.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Source not found: {name}")]
pub struct NotFoundError {
    pub name: String,
}

impl NotFoundError {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Error, Debug)]
pub enum CadenzaError {
    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, CadenzaError>;
