//! Field validation that runs before anything reaches a store.
//!
//! Every rule appends its message to a [`FieldErrors`] collector so callers
//! report all failing fields at once, joined with `", "`.

use crate::error::ServiceError;

pub const USERNAME_MIN_LEN: usize = 3;
pub const PASSWORD_MIN_LEN: usize = 6;
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

#[derive(Debug, Default)]
pub struct FieldErrors(Vec<&'static str>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: &'static str) {
        self.0.push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Ok(())` when nothing failed, otherwise a `Validation` error with all messages.
    pub fn finish(self) -> Result<(), ServiceError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(self.0.join(", ")))
        }
    }
}

/// Trims and checks a username. Returns the trimmed value when it passed.
pub fn username(raw: &str, errors: &mut FieldErrors) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        errors.push("Username is required");
    } else if trimmed.chars().count() < USERNAME_MIN_LEN {
        errors.push("Username must be at least 3 characters");
    }
    trimmed.to_string()
}

/// Passwords are never trimmed.
pub fn password(raw: &str, errors: &mut FieldErrors) {
    if raw.is_empty() {
        errors.push("Password is required");
    } else if raw.chars().count() < PASSWORD_MIN_LEN {
        errors.push("Password must be at least 6 characters");
    }
}

pub fn product_name(raw: Option<&str>, errors: &mut FieldErrors) -> String {
    let trimmed = raw.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        errors.push("Product name is required");
    }
    trimmed.to_string()
}

pub fn product_price(raw: Option<f64>, errors: &mut FieldErrors) -> f64 {
    match raw {
        None => {
            errors.push("Product price is required");
            0.0
        }
        Some(p) if p < 0.0 => {
            errors.push("Price cannot be negative");
            p
        }
        Some(p) => p,
    }
}

pub fn optional_text(raw: Option<&str>) -> Option<String> {
    raw.map(|s| s.trim().to_string())
}
