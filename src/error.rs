//! Run-level error types.
//!
//! Only failures that abort a run surface here. Ranking-backend outages
//! degrade the run (recorded as notices), infeasible ranking proposals
//! are dropped, and unallocatable orders are regular outcomes in the
//! report — none of those are errors.

use thiserror::Error;

use crate::validation::ValidationError;

/// Fatal allocation failures.
#[derive(Debug, Error)]
pub enum AllocationError {
    /// The input snapshot violates a structural invariant. No partial
    /// run is attempted; all findings are carried.
    #[error("input validation failed with {} error(s)", .0.len())]
    InvalidInput(Vec<ValidationError>),

    /// The run configuration is unusable.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{ValidationError, ValidationErrorKind};

    #[test]
    fn test_invalid_input_counts_findings() {
        let err = AllocationError::InvalidInput(vec![
            ValidationError::new(ValidationErrorKind::EmptyId, "order id is empty"),
            ValidationError::new(ValidationErrorKind::DuplicateId, "duplicate order id: Q1"),
        ]);
        assert_eq!(err.to_string(), "input validation failed with 2 error(s)");
    }

    #[test]
    fn test_invalid_config_message() {
        let err = AllocationError::InvalidConfig("tier plan is empty".into());
        assert_eq!(err.to_string(), "invalid config: tier plan is empty");
    }
}
