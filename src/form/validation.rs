use std::fmt::{Display, Formatter};
use std::sync::LazyLock;

use regex::Regex;

// Loose phone shape: optional "+", optional 7/8 trunk prefix, then 10-15
// digits, spaces, dashes or parentheses.
static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[78]?[0-9\s\-()]{10,15}$").expect("phone pattern is a valid regex")
});

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

/// A user-correctable problem with a single field. Never fatal.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

pub trait FieldValidator: Send + Sync {
    fn validate(&self, value: &str) -> Result<(), ValidationError>;
}

impl<F> FieldValidator for F
where
    F: Fn(&str) -> Result<(), ValidationError> + Send + Sync,
{
    fn validate(&self, value: &str) -> Result<(), ValidationError> {
        (self)(value)
    }
}

/// Requires at least `min` characters once surrounding whitespace is trimmed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MinLength {
    min: usize,
    message: String,
}

impl MinLength {
    pub fn new(min: usize, message: impl Into<String>) -> Self {
        Self {
            min,
            message: message.into(),
        }
    }
}

impl FieldValidator for MinLength {
    fn validate(&self, value: &str) -> Result<(), ValidationError> {
        if value.trim().chars().count() < self.min {
            Err(ValidationError::new(self.message.clone()))
        } else {
            Ok(())
        }
    }
}

/// Accepts a trimmed value that looks like either a phone number or an
/// email address.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContactPattern {
    message: String,
}

impl ContactPattern {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl FieldValidator for ContactPattern {
    fn validate(&self, value: &str) -> Result<(), ValidationError> {
        if is_valid_contact(value) {
            Ok(())
        } else {
            Err(ValidationError::new(self.message.clone()))
        }
    }
}

pub fn is_valid_name(value: &str) -> bool {
    value.trim().chars().count() >= 2
}

pub fn is_valid_contact(value: &str) -> bool {
    let value = value.trim();
    PHONE_PATTERN.is_match(value) || EMAIL_PATTERN.is_match(value)
}
