//! Item validation against a [`FieldSchema`]
//!
//! No I/O. An item passes when its key set equals the schema's key set and
//! every value has its declared kind, or is null on a field marked `empty`.

use serde_json::Value;

use crate::field::{FieldKind, FieldSchema, kind_of};

/// Why an item does not conform to its schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("expected an object, got {actual}")]
    NotAnObject { actual: &'static str },

    #[error("key set {actual:?} does not match schema {expected:?}")]
    ShapeMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("field '{field}' should be {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: FieldKind,
        actual: &'static str,
    },

    #[error("field '{field}' must not be null")]
    NullabilityViolation { field: String },
}

/// Validate one item, stopping at the first violation.
///
/// # Errors
///
/// Returns the first [`ShapeError`] found. The key-set check runs before any
/// per-field check.
pub fn validate(schema: &FieldSchema, item: &Value) -> Result<(), ShapeError> {
    match validate_all(schema, item).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Validate one item and collect every violation.
///
/// A key-set mismatch is reported alone; per-field checks only make sense
/// once the keys line up.
#[must_use]
pub fn validate_all(schema: &FieldSchema, item: &Value) -> Vec<ShapeError> {
    let Some(obj) = item.as_object() else {
        return vec![ShapeError::NotAnObject {
            actual: kind_of(item),
        }];
    };

    let expected: Vec<String> = schema.keys().map(str::to_string).collect();
    let mut actual: Vec<String> = obj.keys().cloned().collect();
    actual.sort();
    if actual != expected {
        return vec![ShapeError::ShapeMismatch { expected, actual }];
    }

    let mut errors = Vec::new();
    for (name, spec) in schema.iter() {
        let value = obj.get(name).unwrap_or(&Value::Null);
        if value.is_null() {
            if !spec.nullable {
                errors.push(ShapeError::NullabilityViolation {
                    field: name.to_string(),
                });
            }
            continue;
        }
        if !spec.kind.matches(value) {
            errors.push(ShapeError::TypeMismatch {
                field: name.to_string(),
                expected: spec.kind,
                actual: kind_of(value),
            });
        }
    }
    errors
}
