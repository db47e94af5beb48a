use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rejected model state, raised before any SQL write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// A required name field is empty after trimming.
    BlankName(&'static str),
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName(field) => write!(f, "{field} must not be blank"),
        }
    }
}

impl Error for ModelValidationError {}

pub(crate) fn require_name(field: &'static str, value: &str) -> Result<(), ModelValidationError> {
    if value.trim().is_empty() {
        return Err(ModelValidationError::BlankName(field));
    }
    Ok(())
}
