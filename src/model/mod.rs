//! Data models for annotation entries.

mod geometry;
mod label_class;
mod primitive;

pub use geometry::{BoundingBox, Geometry, Point};
pub use label_class::LabelClass;
pub use primitive::{AnnotationType, LabelId, Primitive, PrimitiveId, PrimitiveKind};
