//! Input snapshot validation.
//!
//! Runs before any allocation work. All findings are collected in one
//! pass rather than stopping at the first, so a caller can fix a bad
//! snapshot in one round trip. Any finding is fatal for the run.
//!
//! Structural invariants checked here:
//! - order and driver ids are non-empty and unique within their kind
//! - every order window satisfies `start < end`
//! - every order names a region
//!
//! Zero-capacity drivers are structurally valid (they can never receive
//! work, which preprocessing flags as a notice instead).

use std::collections::HashSet;

use crate::models::{Driver, Order};

/// `Ok(())` when the snapshot is usable, otherwise every finding.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// One validation finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Violated invariant.
    pub kind: ValidationErrorKind,
    /// Human-readable description naming the offending entity.
    pub message: String,
}

/// What kind of structural invariant was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// An id occurs more than once within orders or within drivers.
    DuplicateId,
    /// An id is the empty string.
    EmptyId,
    /// An order window has `start >= end`.
    InvalidWindow,
    /// An order has no region.
    MissingRegion,
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Validates an input snapshot, collecting all findings.
pub fn validate_input(orders: &[Order], drivers: &[Driver]) -> ValidationResult {
    let mut errors = Vec::new();

    let mut seen_orders = HashSet::new();
    for order in orders {
        if order.id.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyId,
                "order id is empty",
            ));
        } else if !seen_orders.insert(order.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("duplicate order id: {}", order.id),
            ));
        }

        if order.window.start_ms >= order.window.end_ms {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidWindow,
                format!(
                    "order {} has inverted window: start {} >= end {}",
                    order.id, order.window.start_ms, order.window.end_ms
                ),
            ));
        }

        if order.region.trim().is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingRegion,
                format!("order {} has no region", order.id),
            ));
        }
    }

    let mut seen_drivers = HashSet::new();
    for driver in drivers {
        if driver.id.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyId,
                "driver id is empty",
            ));
        } else if !seen_drivers.insert(driver.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("duplicate driver id: {}", driver.id),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_order(id: &str) -> Order {
        Order::new(id, 0, 3_600_000).with_region("east")
    }

    #[test]
    fn test_valid_snapshot_passes() {
        let orders = vec![make_order("Q1"), make_order("Q2")];
        let drivers = vec![Driver::new("D1"), Driver::new("D2")];
        assert!(validate_input(&orders, &drivers).is_ok());
    }

    #[test]
    fn test_empty_snapshot_passes() {
        assert!(validate_input(&[], &[]).is_ok());
    }

    #[test]
    fn test_duplicate_order_id() {
        let orders = vec![make_order("Q1"), make_order("Q1")];
        let errors = validate_input(&orders, &[]).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ValidationErrorKind::DuplicateId);
        assert!(errors[0].message.contains("Q1"));
    }

    #[test]
    fn test_duplicate_driver_id() {
        let drivers = vec![Driver::new("D1"), Driver::new("D1")];
        let errors = validate_input(&[], &drivers).unwrap_err();
        assert_eq!(errors[0].kind, ValidationErrorKind::DuplicateId);
    }

    #[test]
    fn test_same_id_across_kinds_is_fine() {
        let orders = vec![make_order("X")];
        let drivers = vec![Driver::new("X")];
        assert!(validate_input(&orders, &drivers).is_ok());
    }

    #[test]
    fn test_empty_ids() {
        let orders = vec![make_order("")];
        let drivers = vec![Driver::new("")];
        let errors = validate_input(&orders, &drivers).unwrap_err();
        assert_eq!(
            errors
                .iter()
                .filter(|e| e.kind == ValidationErrorKind::EmptyId)
                .count(),
            2
        );
    }

    #[test]
    fn test_inverted_window() {
        let orders = vec![Order::new("Q1", 5000, 5000).with_region("east")];
        let errors = validate_input(&orders, &[]).unwrap_err();
        assert_eq!(errors[0].kind, ValidationErrorKind::InvalidWindow);
    }

    #[test]
    fn test_missing_region() {
        let orders = vec![Order::new("Q1", 0, 1000)];
        let errors = validate_input(&orders, &[]).unwrap_err();
        assert_eq!(errors[0].kind, ValidationErrorKind::MissingRegion);

        let orders = vec![Order::new("Q1", 0, 1000).with_region("   ")];
        let errors = validate_input(&orders, &[]).unwrap_err();
        assert_eq!(errors[0].kind, ValidationErrorKind::MissingRegion);
    }

    #[test]
    fn test_all_findings_collected_in_one_pass() {
        let orders = vec![
            Order::new("", 1000, 0), // empty id, inverted window, no region
            make_order("Q1"),
            make_order("Q1"),
        ];
        let errors = validate_input(&orders, &[]).unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_zero_capacity_driver_is_structurally_valid() {
        let drivers = vec![Driver::new("D1").with_max_orders(0)];
        assert!(validate_input(&[], &drivers).is_ok());
    }
}
