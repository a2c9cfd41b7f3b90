use thiserror::Error;

/// Failures reported by the engine.
///
/// Configuration problems are detected before any simulation state exists, so a
/// run either returns a complete result or one of these.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimulationError {
    #[error("invalid configuration: {field} {reason}")]
    InvalidConfiguration { field: String, reason: String },

    #[error("numeric overflow while computing {context}")]
    NumericOverflow { context: String },
}

impl SimulationError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        SimulationError::InvalidConfiguration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn overflow(context: impl Into<String>) -> Self {
        SimulationError::NumericOverflow {
            context: context.into(),
        }
    }
}

pub type EngineResult<T> = Result<T, SimulationError>;
