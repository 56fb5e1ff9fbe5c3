//! Error types for glide_animation

use thiserror::Error;

/// Errors raised by the animation engine
///
/// Most of these are usage errors. The infallible APIs assert on them in
/// debug builds and log them in release; the `try_*` variants report them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The scheduler behind a handle has been dropped
    #[error("animation scheduler has been dropped")]
    SchedulerDropped,

    /// A timeline already has a chained successor
    #[error("timeline already has a chained successor")]
    ChainOccupied,

    /// Pop on an empty definition stack
    #[error("definition stack is empty")]
    DefinitionStackEmpty,

    /// The definition stack top is not the timeline being popped
    #[error("definition stack out of balance: expected {expected}, found {found}")]
    DefinitionStackMismatch { expected: String, found: String },

    /// `end_suppression` without a matching `begin_suppression`
    #[error("suppression scope ended without being started")]
    SuppressionUnderflow,

    /// Delay/duration adjustments outside a definition callback
    #[error("timeline is not being defined")]
    NotDefining,

    /// Invalid engine configuration
    #[error("invalid engine configuration: {0}")]
    Config(String),
}

/// Result type for glide_animation operations
pub type Result<T> = std::result::Result<T, EngineError>;
