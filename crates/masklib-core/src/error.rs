use thiserror::Error;
use uuid::Uuid;

use crate::pose::ParamKey;

/// Errors raised by shape generators, pose updates and routing calls.
///
/// Every error is local to the call that raised it: a failed call leaves its
/// pose and sink untouched.
#[derive(Error, Debug)]
pub enum LayoutError {
    /// A required parameter was neither passed explicitly nor present in the
    /// pose's defaults.
    #[error("{context}: parameter '{key}' is not defined")]
    MissingParameter { key: ParamKey, context: String },

    /// The requested dimensions describe a shape or path that cannot be built.
    #[error("{context}: {reason}")]
    Infeasible { context: String, reason: String },

    /// Zero, negative or otherwise degenerate input to a formula that cannot
    /// accept it.
    #[error("{context}: degenerate input, {reason}")]
    Degenerate { context: String, reason: String },

    #[error("{context}: non-finite numeric input")]
    NonFinite { context: String },

    #[error("Structure {0} is not defined on this chip")]
    UnknownStructure(usize),

    #[error("Chip {0} is not part of this drawing")]
    UnknownChip(Uuid),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LayoutError {
    pub fn missing(key: ParamKey, context: &str) -> Self {
        LayoutError::MissingParameter {
            key,
            context: context.to_string(),
        }
    }

    pub fn infeasible(context: &str, reason: impl Into<String>) -> Self {
        LayoutError::Infeasible {
            context: context.to_string(),
            reason: reason.into(),
        }
    }

    pub fn degenerate(context: &str, reason: impl Into<String>) -> Self {
        LayoutError::Degenerate {
            context: context.to_string(),
            reason: reason.into(),
        }
    }

    pub fn non_finite(context: &str) -> Self {
        LayoutError::NonFinite {
            context: context.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LayoutError>;

/// Reject NaN/Inf before any computation or mutation.
pub fn ensure_finite(context: &str, values: &[f64]) -> Result<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(LayoutError::non_finite(context))
    }
}
