//! Error types for entry construction and primitive validation.

use thiserror::Error;

use crate::model::AnnotationType;

/// Errors that can occur while building or feeding an annotation entry.
#[derive(Error, Debug)]
pub enum EntryError {
    /// No carry-over conversion exists for this annotation/prediction pairing
    #[error("Unsupported annotation type '{annotation:?}' for predictions of type '{prediction:?}'")]
    UnsupportedAnnotationType {
        /// Annotation type configured for the project
        annotation: AnnotationType,
        /// Prediction type configured for the project
        prediction: AnnotationType,
    },

    /// A primitive failed basic validity checks
    #[error("Invalid primitive '{id}': {reason}")]
    InvalidPrimitive {
        /// Identifier of the rejected primitive
        id: String,
        /// What made the primitive invalid
        reason: String,
    },

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EntryError {
    /// Create an invalid primitive error.
    pub fn invalid_primitive(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPrimitive {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create an unsupported annotation type error.
    pub fn unsupported(annotation: AnnotationType, prediction: AnnotationType) -> Self {
        Self::UnsupportedAnnotationType {
            annotation,
            prediction,
        }
    }
}
