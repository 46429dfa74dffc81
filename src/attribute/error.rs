//! Attribute transform errors.

use std::fmt;

/// Error raised while transforming an attribute value on write.
#[derive(Debug)]
pub enum AttributeError {
    /// A declared date attribute received a string no known pattern accepts
    InvalidDate {
        attribute: String,
        value: String,
        source: chrono::ParseError,
    },
    /// The configured output pattern for a date attribute is not valid strftime
    InvalidDateFormat { attribute: String, format: String },
}

impl fmt::Display for AttributeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeError::InvalidDate {
                attribute,
                value,
                source,
            } => {
                write!(f, "Invalid date for attribute '{attribute}': '{value}' ({source})")
            }
            AttributeError::InvalidDateFormat { attribute, format } => {
                write!(f, "Invalid date format '{format}' for attribute '{attribute}'")
            }
        }
    }
}

impl std::error::Error for AttributeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AttributeError::InvalidDate { source, .. } => Some(source),
            AttributeError::InvalidDateFormat { .. } => None,
        }
    }
}
