//! Input normalisation shared by the services.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Trims `value`; rejects empty results and anything longer than `max_chars`.
pub fn required_text(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    if trimmed.chars().count() > max_chars {
        return Err(ValidationError::new(
            field,
            format!("must be at most {max_chars} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

/// Like [`required_text`] but blank input becomes `None`.
pub fn optional_text(
    field: &'static str,
    value: Option<&str>,
    max_chars: usize,
) -> Result<Option<String>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => required_text(field, v, max_chars).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_trims_and_limits() {
        assert_eq!(required_text("name", "  Milk ", 10).unwrap(), "Milk");
        assert!(required_text("name", "   ", 10).is_err());
        let err = required_text("name", "abcdef", 5).unwrap_err();
        assert_eq!(err.field, "name");
    }

    #[test]
    fn optional_text_turns_blank_into_none() {
        assert_eq!(optional_text("note", Some("  "), 10).unwrap(), None);
        assert_eq!(optional_text("note", None, 10).unwrap(), None);
        assert_eq!(
            optional_text("note", Some(" hi "), 10).unwrap(),
            Some("hi".to_string())
        );
    }
}
