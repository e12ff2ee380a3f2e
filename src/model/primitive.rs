//! The atomic labeled object: an image-wide label, a point, or a box.

use serde::{Deserialize, Serialize};

use super::geometry::Geometry;
use crate::error::EntryError;
use crate::timing::Timestamp;

/// Identifier of a primitive, unique within one entry.
pub type PrimitiveId = String;

/// Identifier of a label class.
pub type LabelId = String;

/// Whether a primitive was authored by a human or produced by a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Annotation,
    /// Display-only unless converted into an annotation.
    Prediction,
}

/// Annotation modality of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotationType {
    /// Image-wide classification label
    #[serde(rename = "labels", alias = "label")]
    Label,
    /// Point marker
    #[serde(rename = "points", alias = "point")]
    Point,
    /// Axis-aligned bounding box
    #[serde(rename = "boundingBoxes", alias = "boundingBox")]
    BoundingBox,
}

impl AnnotationType {
    /// Get the display name for this type.
    pub fn name(&self) -> &'static str {
        match self {
            AnnotationType::Label => "Label",
            AnnotationType::Point => "Point",
            AnnotationType::BoundingBox => "Bounding Box",
        }
    }

    /// Whether primitives of this type have image coordinates.
    pub fn is_localized(&self) -> bool {
        !matches!(self, AnnotationType::Label)
    }
}

/// A labeled object with edit metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub id: PrimitiveId,
    pub kind: PrimitiveKind,
    pub geometry: Geometry,
    /// `None` only for label primitives marked as unlabeled.
    pub label: Option<LabelId>,
    /// Model confidence, for predictions and annotations seeded from them.
    pub confidence: Option<f32>,
    /// Set once a human created or modified this primitive.
    pub changed: bool,
    pub active: bool,
    pub visible: bool,
    pub time_changed: Option<Timestamp>,
}

impl Primitive {
    /// Create a new annotation.
    pub fn annotation(id: impl Into<PrimitiveId>, geometry: Geometry, label: Option<LabelId>) -> Self {
        Self {
            id: id.into(),
            kind: PrimitiveKind::Annotation,
            geometry,
            label,
            confidence: None,
            changed: false,
            active: false,
            visible: true,
            time_changed: None,
        }
    }

    /// Create a new prediction.
    pub fn prediction(
        id: impl Into<PrimitiveId>,
        geometry: Geometry,
        label: Option<LabelId>,
        confidence: Option<f32>,
    ) -> Self {
        Self {
            kind: PrimitiveKind::Prediction,
            confidence,
            ..Self::annotation(id, geometry, label)
        }
    }

    /// Set the confidence.
    pub fn with_confidence(mut self, confidence: Option<f32>) -> Self {
        self.confidence = confidence;
        self
    }

    /// Mark as human-changed at `now`.
    pub fn with_changed(mut self, now: Timestamp) -> Self {
        self.mark_changed(now);
        self
    }

    pub fn annotation_type(&self) -> AnnotationType {
        self.geometry.annotation_type()
    }

    pub fn is_annotation(&self) -> bool {
        self.kind == PrimitiveKind::Annotation
    }

    pub fn is_prediction(&self) -> bool {
        self.kind == PrimitiveKind::Prediction
    }

    /// Whether the primitive carries `label`.
    pub fn has_label(&self, label: &str) -> bool {
        self.label.as_deref() == Some(label)
    }

    /// Confidence, with a missing value treated as zero for threshold checks.
    pub fn confidence_or_zero(&self) -> f32 {
        self.confidence.unwrap_or(0.0)
    }

    pub fn mark_changed(&mut self, now: Timestamp) {
        self.changed = true;
        self.time_changed = Some(now);
    }

    pub fn set_label(&mut self, label: Option<LabelId>, now: Timestamp) {
        self.label = label;
        self.mark_changed(now);
    }

    pub fn set_geometry(&mut self, geometry: Geometry, now: Timestamp) {
        self.geometry = geometry;
        self.mark_changed(now);
    }

    /// Check that the primitive can be stored.
    pub fn validate(&self) -> Result<(), EntryError> {
        if self.id.is_empty() {
            return Err(EntryError::invalid_primitive("", "empty identifier"));
        }
        if let Some(problem) = self.geometry.problem() {
            return Err(EntryError::invalid_primitive(&self.id, problem));
        }
        if self.geometry.annotation_type().is_localized() && self.label.is_none() {
            return Err(EntryError::invalid_primitive(
                &self.id,
                "localized primitive without label",
            ));
        }
        if let Some(confidence) = self.confidence {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(EntryError::invalid_primitive(
                    &self.id,
                    format!("confidence {confidence} outside [0, 1]"),
                ));
            }
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}
