//! Wire records exchanged with the data server.
//!
//! [`EntryPayload`] is what an entry is built from, [`EntryRecord`] is what
//! it serializes to. Field names are camelCase to match the server.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::EntryError;
use crate::model::{BoundingBox, Geometry, LabelId, Point, Primitive, PrimitiveId, PrimitiveKind};

/// Geometry, label and confidence of one primitive.
///
/// The shape is inferred from the fields present: `width`/`height` make a
/// box, `x`/`y` alone a point, no coordinates an image-wide label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(default)]
    pub label: Option<LabelId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    /// Written only for unreviewed annotations; missing means reviewed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed: Option<bool>,
}

impl PrimitiveRecord {
    /// Build the record for a stored primitive.
    pub fn from_primitive(primitive: &Primitive) -> Self {
        let (x, y, width, height) = match primitive.geometry {
            Geometry::Label => (None, None, None, None),
            Geometry::Point(p) => (Some(p.x), Some(p.y), None, None),
            Geometry::BoundingBox(b) => (Some(b.x), Some(b.y), Some(b.width), Some(b.height)),
        };
        Self {
            x,
            y,
            width,
            height,
            label: primitive.label.clone(),
            confidence: primitive.confidence,
            changed: (primitive.kind == PrimitiveKind::Annotation && !primitive.changed)
                .then_some(false),
        }
    }

    fn geometry(&self, id: &str) -> Result<Geometry, EntryError> {
        match (self.x, self.y, self.width, self.height) {
            (None, None, None, None) => Ok(Geometry::Label),
            (Some(x), Some(y), None, None) => Ok(Geometry::Point(Point::new(x, y))),
            (Some(x), Some(y), Some(width), Some(height)) => Ok(Geometry::BoundingBox(
                BoundingBox::new(x, y, width, height),
            )),
            _ => Err(EntryError::invalid_primitive(id, "incomplete geometry fields")),
        }
    }

    /// Parse into a validated primitive of the given kind.
    pub fn to_primitive(&self, id: &str, kind: PrimitiveKind) -> Result<Primitive, EntryError> {
        let geometry = self.geometry(id)?;
        let primitive = match kind {
            PrimitiveKind::Annotation => {
                let mut annotation = Primitive::annotation(id, geometry, self.label.clone())
                    .with_confidence(self.confidence);
                annotation.changed = self.changed.unwrap_or(true);
                annotation
            }
            PrimitiveKind::Prediction => {
                Primitive::prediction(id, geometry, self.label.clone(), self.confidence)
            }
        };
        primitive.validate()?;
        Ok(primitive)
    }
}

/// Server payload an entry is constructed from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPayload {
    pub file_name: String,
    #[serde(default)]
    pub annotations: IndexMap<PrimitiveId, PrimitiveRecord>,
    #[serde(default)]
    pub predictions: IndexMap<PrimitiveId, PrimitiveRecord>,
}

impl EntryPayload {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            ..Self::default()
        }
    }

    /// Add an annotation record.
    pub fn with_annotation(mut self, id: impl Into<PrimitiveId>, record: PrimitiveRecord) -> Self {
        self.annotations.insert(id.into(), record);
        self
    }

    /// Add a prediction record.
    pub fn with_prediction(mut self, id: impl Into<PrimitiveId>, record: PrimitiveRecord) -> Self {
        self.predictions.insert(id.into(), record);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, EntryError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// One serialized annotation with its timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationRecord {
    pub id: PrimitiveId,
    #[serde(flatten)]
    pub primitive: PrimitiveRecord,
    pub time_created: Option<String>,
    pub time_required: Option<u64>,
}

/// Serialized state of an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryRecord {
    pub id: String,
    pub time_created: Option<String>,
    pub time_required: Option<u64>,
    pub annotations: Vec<AnnotationRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predictions: Option<IndexMap<PrimitiveId, PrimitiveRecord>>,
}

impl EntryRecord {
    pub fn to_json(&self) -> Result<String, EntryError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl From<EntryRecord> for EntryPayload {
    /// Rebuild a payload from serialized output, e.g. when an entry is shown again.
    fn from(record: EntryRecord) -> Self {
        Self {
            file_name: record.file_name.unwrap_or_default(),
            annotations: record
                .annotations
                .into_iter()
                .map(|a| (a.id, a.primitive))
                .collect(),
            predictions: record.predictions.unwrap_or_default(),
        }
    }
}
