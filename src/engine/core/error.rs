use thiserror::Error;

/// Reasons a build request is rejected. A rejected build never yields plans.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("invalid options: {field}: {reason}")]
    InvalidOptions { field: &'static str, reason: String },

    #[error("unsupported combination: {field}: {reason}")]
    UnsupportedCombination { field: &'static str, reason: String },
}

impl PlanError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        PlanError::InvalidOptions {
            field,
            reason: reason.into(),
        }
    }

    pub fn unsupported(field: &'static str, reason: impl Into<String>) -> Self {
        PlanError::UnsupportedCombination {
            field,
            reason: reason.into(),
        }
    }

    /// Name of the offending option field
    pub fn field(&self) -> &'static str {
        match self {
            PlanError::InvalidOptions { field, .. } => field,
            PlanError::UnsupportedCombination { field, .. } => field,
        }
    }
}
