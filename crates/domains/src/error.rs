//! # DomainError
//!
//! Centralized error handling for the Yatube workspace.
//! Adapters map their library failures into these variants at the port boundary.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

/// Field-level messages collected while validating a submitted form.
///
/// Messages not tied to a single field (e.g. "wrong username or password")
/// live in `non_field`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors {
    fields: BTreeMap<String, Vec<String>>,
    non_field: Vec<String>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }

    /// Messages for one field, empty when the field is valid.
    pub fn field(&self, name: &str) -> Vec<String> {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    pub fn non_field(&self) -> Vec<String> {
        self.non_field.clone()
    }

    /// `Ok(())` when nothing was recorded, otherwise a `Validation` error.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self))
        }
    }
}

/// The primary error type for all domain and port operations.
#[derive(Error, Debug)]
pub enum DomainError {
    /// Missing Group, User or Post by key
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Form constraints violated; the form is redisplayed with these messages
    #[error("validation failed")]
    Validation(FormErrors),

    /// No authenticated identity on a protected action
    #[error("authentication required")]
    Unauthorized,

    /// Authenticated, but not the owner of the resource
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Resource already exists (e.g., duplicate username)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Infrastructure failure (DB, filesystem, cache backend)
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }

    /// Shortcut for a single-message validation failure.
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FormErrors::new();
        errors.add(field, message);
        Self::Validation(errors)
    }
}

/// A specialized Result type for Yatube domain logic.
pub type Result<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_errors_are_ok() {
        assert!(FormErrors::new().into_result().is_ok());
    }

    #[test]
    fn collected_errors_become_validation() {
        let mut errors = FormErrors::new();
        errors.add("text", "This field is required.");
        errors.add_non_field("Please correct the errors below.");

        match errors.into_result() {
            Err(DomainError::Validation(errors)) => {
                assert_eq!(errors.field("text"), vec!["This field is required."]);
                assert!(errors.field("group").is_empty());
                assert_eq!(errors.non_field().len(), 1);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn not_found_message_names_entity_and_key() {
        let err = DomainError::not_found("group", "missing-slug");
        insta::assert_snapshot!(err.to_string(), @"group not found: missing-slug");
    }
}
