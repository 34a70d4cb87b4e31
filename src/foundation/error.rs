/// Convenience result type used across journeyflow.
pub type JourneyResult<T> = Result<T, JourneyError>;

/// Top-level error taxonomy used by the layout, path and animation APIs.
///
/// Nothing in this crate treats these as fatal: callers are expected to draw less
/// (skip an element, render an empty scene, hold the last frame) rather than abort.
#[derive(thiserror::Error, Debug)]
pub enum JourneyError {
    /// Invalid caller-provided data (empty stage list, unknown stage ids, volumes
    /// exceeding a stage's capacity, non-positive speed).
    #[error("validation error: {0}")]
    Validation(String),

    /// Geometry that cannot be drawn (zero-size canvas, non-finite control points).
    #[error("degenerate geometry: {0}")]
    Geometry(String),

    /// The host environment refused to schedule a frame callback.
    #[error("scheduling error: {0}")]
    Scheduling(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl JourneyError {
    /// Build a [`JourneyError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`JourneyError::Geometry`] value.
    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    /// Build a [`JourneyError::Scheduling`] value.
    pub fn scheduling(msg: impl Into<String>) -> Self {
        Self::Scheduling(msg.into())
    }

    /// Build a [`JourneyError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// True for failures that only remove one element from the diagram.
    pub fn is_recoverable_geometry(&self) -> bool {
        matches!(self, Self::Geometry(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
