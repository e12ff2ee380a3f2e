//! Seeding annotations from model predictions.
//!
//! Entries that nobody has annotated yet can start from the model's guess.
//! Predictions are converted into the project's annotation modality when the
//! two differ:
//!
//! - **Same type**: point → point, box → box, geometry copied.
//! - **Points from boxes**: box centers become points.
//! - **Boxes from points**: points grow to the project's default box size.
//! - **Labels from points or boxes**: one image-wide label, chosen by the
//!   `maxConfidence` or `mode` rule.
//!
//! Label predictions in a label project are shown but never carried over.
//!
//! Predictions themselves are never modified; every seed is a new primitive.

use indexmap::IndexMap;

use crate::config::{BoxSize, CarryOverRule};
use crate::error::EntryError;
use crate::model::{
    AnnotationType, BoundingBox, Geometry, LabelId, Primitive, PrimitiveId,
};
use crate::timing::Timestamp;

/// Project rules that drive carry-over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarryOverRules {
    pub enabled: bool,
    pub annotation_type: AnnotationType,
    pub prediction_type: AnnotationType,
    pub rule: CarryOverRule,
    pub min_confidence: f32,
    pub default_box_size: BoxSize,
}

/// Conversion selected for an annotation/prediction type pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    SameType,
    PointsFromBoxes,
    BoxesFromPoints,
    LabelFromPredictions(CarryOverRule),
    /// Nothing to seed
    Skip,
}

impl CarryOverRules {
    /// The conversion for the configured types, or an error when none exists.
    pub fn conversion(&self) -> Result<Conversion, EntryError> {
        match (self.annotation_type, self.prediction_type) {
            (AnnotationType::Label, AnnotationType::Label) => Ok(Conversion::Skip),
            (AnnotationType::Label, _) => Ok(Conversion::LabelFromPredictions(self.rule)),
            (AnnotationType::Point, AnnotationType::BoundingBox) => Ok(Conversion::PointsFromBoxes),
            (AnnotationType::BoundingBox, AnnotationType::Point) => Ok(Conversion::BoxesFromPoints),
            (annotation, prediction) if annotation == prediction => Ok(Conversion::SameType),
            (annotation, prediction) => Err(EntryError::unsupported(annotation, prediction)),
        }
    }

    fn passes(&self, prediction: &Primitive) -> bool {
        prediction.confidence_or_zero() >= self.min_confidence
    }
}

/// Convert predictions into seed annotations.
///
/// Returns nothing when carry-over is disabled or the entry already has
/// annotations. `next_id` supplies identifiers for the seeds.
pub fn convert(
    predictions: &IndexMap<PrimitiveId, Primitive>,
    has_annotations: bool,
    rules: &CarryOverRules,
    next_id: &mut dyn FnMut() -> PrimitiveId,
    now: Timestamp,
) -> Result<Vec<Primitive>, EntryError> {
    if !rules.enabled || has_annotations {
        return Ok(Vec::new());
    }

    let conversion = rules.conversion()?;
    let candidates = predictions
        .values()
        .filter(|p| p.annotation_type() == rules.prediction_type);

    let seeds: Vec<Primitive> = match conversion {
        Conversion::SameType => candidates
            .filter(|p| rules.passes(p))
            .map(|p| {
                Primitive::annotation(next_id(), p.geometry, p.label.clone())
                    .with_confidence(p.confidence)
                    .with_changed(now)
            })
            .collect(),
        Conversion::PointsFromBoxes => candidates
            .filter(|p| rules.passes(p))
            .filter_map(|p| {
                let center = p.geometry.reference_point()?;
                // Point seeds start out unreviewed.
                Some(
                    Primitive::annotation(next_id(), Geometry::Point(center), p.label.clone())
                        .with_confidence(p.confidence),
                )
            })
            .collect(),
        Conversion::BoxesFromPoints => candidates
            .filter(|p| rules.passes(p))
            .filter_map(|p| {
                let point = p.geometry.as_point()?;
                let size = rules.default_box_size;
                let bbox = BoundingBox::new(point.x, point.y, size.width, size.height);
                Some(
                    Primitive::annotation(next_id(), Geometry::BoundingBox(bbox), p.label.clone())
                        .with_confidence(p.confidence)
                        .with_changed(now),
                )
            })
            .collect(),
        Conversion::LabelFromPredictions(CarryOverRule::MaxConfidence) => {
            max_confidence(candidates, rules)
                .map(|(label, confidence)| {
                    Primitive::annotation(next_id(), Geometry::Label, Some(label))
                        .with_confidence(Some(confidence))
                        .with_changed(now)
                })
                .into_iter()
                .collect()
        }
        Conversion::LabelFromPredictions(CarryOverRule::Mode) => mode(candidates)
            .map(|label| {
                Primitive::annotation(next_id(), Geometry::Label, Some(label)).with_changed(now)
            })
            .into_iter()
            .collect(),
        Conversion::Skip => Vec::new(),
    };

    log::debug!(
        "🌱 Carry-over ({:?}) produced {} seed annotation(s) from {} prediction(s)",
        conversion,
        seeds.len(),
        predictions.len()
    );
    Ok(seeds)
}

/// Label and confidence of the most confident prediction passing the filter.
/// The first maximum encountered wins.
fn max_confidence<'a>(
    predictions: impl Iterator<Item = &'a Primitive>,
    rules: &CarryOverRules,
) -> Option<(LabelId, f32)> {
    let mut best: Option<(&'a Primitive, f32)> = None;
    for prediction in predictions.filter(|p| p.label.is_some() && rules.passes(p)) {
        let confidence = prediction.confidence_or_zero();
        if best.is_none_or(|(_, max)| confidence > max) {
            best = Some((prediction, confidence));
        }
    }
    best.and_then(|(p, confidence)| p.label.clone().map(|label| (label, confidence)))
}

/// Most frequent label over all predictions, ignoring the confidence filter.
/// The first label reaching the maximal count wins.
fn mode<'a>(predictions: impl Iterator<Item = &'a Primitive>) -> Option<LabelId> {
    let mut counts: IndexMap<&'a str, usize> = IndexMap::new();
    for label in predictions.filter_map(|p| p.label.as_deref()) {
        *counts.entry(label).or_insert(0) += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for (label, count) in counts {
        if best.is_none_or(|(_, max)| count > max) {
            best = Some((label, count));
        }
    }
    best.map(|(label, _)| label.to_string())
}
