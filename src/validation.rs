//! Field-level validation errors shared by the auth and gadget modules.

use serde::Serialize;

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Collects every field error of a request before failing, so callers see
/// all problems at once instead of one per round trip.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Record an error for `field` when `failed` holds.
    pub fn check(&mut self, failed: bool, field: &str, message: &str) {
        if failed {
            self.push(field, message);
        }
    }

    /// `Ok(())` when nothing was recorded, otherwise the collected errors.
    pub fn finish(self) -> Result<(), Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_collector_finishes_ok() {
        assert!(FieldErrors::new().finish().is_ok());
    }

    #[test]
    fn test_collector_keeps_every_error_in_order() {
        let mut errors = FieldErrors::new();
        errors.check(true, "email", "bad email");
        errors.check(false, "name", "never recorded");
        errors.push("password", "too short");

        let collected = errors.finish().unwrap_err();
        assert_eq!(
            collected,
            vec![
                FieldError::new("email", "bad email"),
                FieldError::new("password", "too short"),
            ]
        );
    }
}
