//! Base validation trait shared by the schema validators
//!
//! Copyright (c) 2025 MDR Team
//! Licensed under the Apache-2.0 license

use crate::validation::error::ValidationResult;

/// How much work a validation pass does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Collect every violation in the document
    Complete,
    /// Stop at the first violation; used for speculative checks
    FailFast,
}

/// Base trait for schema validators
pub trait SchemaValidator {
    /// The type being validated
    type Input: ?Sized;

    /// Validate in the given mode
    fn validate_in(&self, input: &Self::Input, mode: ValidationMode) -> ValidationResult<()>;

    /// Validate collecting every violation
    fn validate(&self, input: &Self::Input) -> ValidationResult<()> {
        self.validate_in(input, ValidationMode::Complete)
    }

    /// Cheap yes/no check
    fn is_valid(&self, input: &Self::Input) -> bool {
        self.validate_in(input, ValidationMode::FailFast).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::error::ValidationError;
    use std::cell::RefCell;

    /// Accepts even numbers and records which modes it was asked for
    struct EvenValidator {
        modes: RefCell<Vec<ValidationMode>>,
    }

    impl SchemaValidator for EvenValidator {
        type Input = i64;

        fn validate_in(&self, input: &i64, mode: ValidationMode) -> ValidationResult<()> {
            self.modes.borrow_mut().push(mode);
            if input % 2 == 0 {
                Ok(())
            } else {
                Err(ValidationError::new("$", "odd"))
            }
        }
    }

    #[test]
    fn test_default_methods_pick_their_mode() {
        let validator = EvenValidator {
            modes: RefCell::new(Vec::new()),
        };

        assert!(validator.validate(&2).is_ok());
        assert!(!validator.is_valid(&3));
        assert_eq!(
            *validator.modes.borrow(),
            vec![ValidationMode::Complete, ValidationMode::FailFast]
        );
    }
}
