//! Per-entry storage of annotations and predictions.
//!
//! The store owns both primitive maps and the services an entry runs on
//! (clock, identity generator, render surface). Every mutation goes through
//! it so the surface always sees the same state that gets serialized.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::EntryError;
use crate::ids::{IdGenerator, SequentialIds};
use crate::model::{AnnotationType, Primitive, PrimitiveId, PrimitiveKind};
use crate::payload::{AnnotationRecord, EntryRecord, PrimitiveRecord};
use crate::surface::{RenderSurface, SurfaceUpdate};
use crate::timing::{Clock, SystemClock, Timestamp};

/// Collaborators injected into an entry.
pub struct EntryServices {
    pub clock: Rc<dyn Clock>,
    pub ids: Box<dyn IdGenerator>,
    pub surface: Box<dyn RenderSurface>,
}

impl EntryServices {
    pub fn new(
        clock: Rc<dyn Clock>,
        ids: Box<dyn IdGenerator>,
        surface: Box<dyn RenderSurface>,
    ) -> Self {
        Self {
            clock,
            ids,
            surface,
        }
    }

    /// Wall clock and sequential local ids, drawing on `surface`.
    pub fn with_surface(surface: Box<dyn RenderSurface>) -> Self {
        Self::new(
            Rc::new(SystemClock),
            Box::new(SequentialIds::default()),
            surface,
        )
    }
}

/// Annotations and predictions of one entry.
pub struct EntryStore {
    entry_id: String,
    file_name: String,
    annotation_type: AnnotationType,
    annotations: IndexMap<PrimitiveId, Primitive>,
    predictions: IndexMap<PrimitiveId, Primitive>,
    time_created: Option<Timestamp>,
    services: EntryServices,
}

impl EntryStore {
    pub fn new(
        entry_id: impl Into<String>,
        file_name: impl Into<String>,
        annotation_type: AnnotationType,
        services: EntryServices,
    ) -> Self {
        Self {
            entry_id: entry_id.into(),
            file_name: file_name.into(),
            annotation_type,
            annotations: IndexMap::new(),
            predictions: IndexMap::new(),
            time_created: None,
            services,
        }
    }

    pub fn entry_id(&self) -> &str {
        &self.entry_id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn annotation_type(&self) -> AnnotationType {
        self.annotation_type
    }

    /// Current time from the entry's clock.
    pub fn now(&self) -> Timestamp {
        self.services.clock.now()
    }

    /// An identifier not used by any annotation or prediction of this entry.
    pub fn fresh_id(&mut self) -> PrimitiveId {
        loop {
            let id = self.services.ids.next_id();
            if !self.annotations.contains_key(&id) && !self.predictions.contains_key(&id) {
                return id;
            }
        }
    }

    fn map(&self, kind: PrimitiveKind) -> &IndexMap<PrimitiveId, Primitive> {
        match kind {
            PrimitiveKind::Annotation => &self.annotations,
            PrimitiveKind::Prediction => &self.predictions,
        }
    }

    fn map_mut(&mut self, kind: PrimitiveKind) -> &mut IndexMap<PrimitiveId, Primitive> {
        match kind {
            PrimitiveKind::Annotation => &mut self.annotations,
            PrimitiveKind::Prediction => &mut self.predictions,
        }
    }

    /// Store a primitive under its id.
    ///
    /// Invalid primitives are rejected. In classification entries a new
    /// annotation replaces the existing one.
    pub fn add(&mut self, primitive: Primitive) -> Result<(), EntryError> {
        primitive.validate()?;

        if primitive.is_annotation() && self.annotation_type == AnnotationType::Label {
            let evicted: Vec<PrimitiveId> = self
                .annotations
                .keys()
                .filter(|id| **id != primitive.id)
                .cloned()
                .collect();
            for id in evicted {
                self.remove(PrimitiveKind::Annotation, &id);
            }
        }

        let snapshot = primitive.clone();
        let previous = self
            .map_mut(primitive.kind)
            .insert(primitive.id.clone(), primitive);
        let update = match previous {
            Some(_) => SurfaceUpdate::Updated(snapshot),
            None => SurfaceUpdate::Added(snapshot),
        };
        self.services.surface.apply(update);
        Ok(())
    }

    /// Replace a stored primitive. Absent ids are ignored.
    pub fn update(&mut self, primitive: Primitive) -> Result<(), EntryError> {
        primitive.validate()?;
        let Some(slot) = self.map_mut(primitive.kind).get_mut(&primitive.id) else {
            log::debug!("Ignoring update of unknown primitive '{}'", primitive.id);
            return Ok(());
        };
        *slot = primitive.clone();
        self.services.surface.apply(SurfaceUpdate::Updated(primitive));
        Ok(())
    }

    /// Mutate a stored primitive in place and notify the surface.
    ///
    /// Returns `false` if no primitive with that id exists.
    pub fn modify(
        &mut self,
        kind: PrimitiveKind,
        id: &str,
        f: impl FnOnce(&mut Primitive),
    ) -> bool {
        let Some(primitive) = self.map_mut(kind).get_mut(id) else {
            return false;
        };
        f(primitive);
        let snapshot = primitive.clone();
        self.services.surface.apply(SurfaceUpdate::Updated(snapshot));
        true
    }

    /// Remove a primitive. Removing an absent id does nothing.
    pub fn remove(&mut self, kind: PrimitiveKind, id: &str) -> Option<Primitive> {
        let removed = self.map_mut(kind).shift_remove(id)?;
        self.services
            .surface
            .apply(SurfaceUpdate::Removed(removed.id.clone()));
        Some(removed)
    }

    pub fn get(&self, kind: PrimitiveKind, id: &str) -> Option<&Primitive> {
        self.map(kind).get(id)
    }

    pub fn annotation(&self, id: &str) -> Option<&Primitive> {
        self.annotations.get(id)
    }

    pub fn annotations(&self) -> &IndexMap<PrimitiveId, Primitive> {
        &self.annotations
    }

    pub fn predictions(&self) -> &IndexMap<PrimitiveId, Primitive> {
        &self.predictions
    }

    pub fn has_annotations(&self) -> bool {
        !self.annotations.is_empty()
    }

    /// Ids of all primitives of a kind, in insertion order.
    pub fn ids(&self, kind: PrimitiveKind) -> Vec<PrimitiveId> {
        self.map(kind).keys().cloned().collect()
    }

    /// Forward a non-primitive update (hover text, crosshair) to the surface.
    pub fn notify(&mut self, update: SurfaceUpdate) {
        self.services.surface.apply(update);
    }

    pub fn render(&mut self) {
        self.services.surface.render();
    }

    /// Record when the image finished loading. Only the first call counts.
    pub fn set_time_created(&mut self, time: Timestamp) -> bool {
        if self.time_created.is_some() {
            return false;
        }
        self.time_created = Some(time);
        true
    }

    pub fn time_created(&self) -> Option<Timestamp> {
        self.time_created
    }

    /// Milliseconds from image load to the latest annotation change.
    ///
    /// `None` before the image has loaded, zero if nothing changed since.
    pub fn time_required(&self) -> Option<u64> {
        let created = self.time_created?;
        let latest = self
            .annotations
            .values()
            .filter_map(|a| a.time_changed)
            .max();
        Some(latest.map_or(0, |t| t.millis_since(created)))
    }

    fn annotation_time_required(&self, annotation: &Primitive) -> Option<u64> {
        let created = self.time_created?;
        Some(
            annotation
                .time_changed
                .map_or(0, |t| t.millis_since(created)),
        )
    }

    /// Build the output record.
    ///
    /// `only_user_annotations` keeps changed annotations only and leaves
    /// predictions out; `minimal` drops the file name and predictions.
    pub fn serialize(&self, minimal: bool, only_user_annotations: bool) -> EntryRecord {
        let time_created = self.time_created.map(Timestamp::to_iso8601);
        let annotations = self
            .annotations
            .values()
            .filter(|a| !only_user_annotations || a.changed)
            .map(|a| AnnotationRecord {
                id: a.id.clone(),
                primitive: PrimitiveRecord::from_primitive(a),
                time_created: time_created.clone(),
                time_required: self.annotation_time_required(a),
            })
            .collect();

        let predictions = (!minimal && !only_user_annotations).then(|| {
            self.predictions
                .iter()
                .map(|(id, p)| (id.clone(), PrimitiveRecord::from_primitive(p)))
                .collect()
        });

        EntryRecord {
            id: self.entry_id.clone(),
            time_created,
            time_required: self.time_required(),
            annotations,
            file_name: (!minimal).then(|| self.file_name.clone()),
            predictions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, Geometry, Point};
    use crate::surface::RecordingSurface;
    use crate::timing::ManualClock;

    fn store(annotation_type: AnnotationType) -> (EntryStore, Rc<ManualClock>, RecordingSurface) {
        let clock = Rc::new(ManualClock::new(Timestamp::from_millis(10_000)));
        let surface = RecordingSurface::new();
        let services = EntryServices::new(
            clock.clone(),
            Box::new(SequentialIds::new("t")),
            Box::new(surface.clone()),
        );
        (
            EntryStore::new("entry-1", "img/a.jpg", annotation_type, services),
            clock,
            surface,
        )
    }

    fn label(id: &str, name: &str) -> Primitive {
        Primitive::annotation(id, Geometry::Label, Some(name.into()))
    }

    fn point(id: &str, x: f32, y: f32) -> Primitive {
        Primitive::annotation(id, Geometry::Point(Point::new(x, y)), Some("car".into()))
    }

    #[test]
    fn test_add_rejects_invalid() {
        let (mut store, _, surface) = store(AnnotationType::Point);
        let bad = Primitive::annotation("p", Geometry::Point(Point::new(0.1, 0.1)), None);
        assert!(store.add(bad).is_err());
        assert!(!store.has_annotations());
        assert!(surface.updates().is_empty());
    }

    #[test]
    fn test_classification_keeps_single_annotation() {
        let (mut store, _, surface) = store(AnnotationType::Label);
        store.add(label("a", "cat")).unwrap();
        store.add(label("b", "dog")).unwrap();
        assert_eq!(store.annotations().len(), 1);
        assert!(store.annotation("b").is_some());
        assert_eq!(
            surface.updates(),
            vec![
                SurfaceUpdate::Added(label("a", "cat")),
                SurfaceUpdate::Removed("a".into()),
                SurfaceUpdate::Added(label("b", "dog")),
            ]
        );
    }

    #[test]
    fn test_predictions_do_not_evict_label() {
        let (mut store, _, _) = store(AnnotationType::Label);
        store.add(label("a", "cat")).unwrap();
        store
            .add(Primitive::prediction("p", Geometry::Label, Some("dog".into()), Some(0.3)))
            .unwrap();
        assert_eq!(store.annotations().len(), 1);
        assert_eq!(store.predictions().len(), 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let (mut store, _, surface) = store(AnnotationType::Point);
        assert!(store.remove(PrimitiveKind::Annotation, "missing").is_none());
        assert!(surface.updates().is_empty());
    }

    #[test]
    fn test_fresh_id_skips_used_ids() {
        let (mut store, _, _) = store(AnnotationType::Point);
        store.add(point("t-1", 0.1, 0.1)).unwrap();
        assert_eq!(store.fresh_id(), "t-2");
    }

    #[test]
    fn test_time_required_before_load_is_none() {
        let (mut store, clock, _) = store(AnnotationType::Point);
        store.add(point("a", 0.1, 0.1).with_changed(clock.now())).unwrap();
        assert_eq!(store.time_required(), None);
        let record = store.serialize(false, false);
        assert_eq!(record.time_created, None);
        assert_eq!(record.annotations[0].time_required, None);
    }

    #[test]
    fn test_time_required_never_negative() {
        let (mut store, clock, _) = store(AnnotationType::Point);
        // Changed before the image finished loading.
        store.add(point("a", 0.1, 0.1).with_changed(clock.now())).unwrap();
        clock.advance(500);
        assert!(store.set_time_created(clock.now()));
        assert_eq!(store.time_required(), Some(0));

        clock.advance(1_200);
        let now = clock.now();
        store.modify(PrimitiveKind::Annotation, "a", |a| a.mark_changed(now));
        assert_eq!(store.time_required(), Some(1_200));
    }

    #[test]
    fn test_time_created_set_once() {
        let (mut store, _, _) = store(AnnotationType::Point);
        assert!(store.set_time_created(Timestamp::from_millis(5)));
        assert!(!store.set_time_created(Timestamp::from_millis(9)));
        assert_eq!(store.time_created(), Some(Timestamp::from_millis(5)));
    }

    #[test]
    fn test_serialize_only_user_annotations() {
        let (mut store, clock, _) = store(AnnotationType::BoundingBox);
        store.set_time_created(Timestamp::from_millis(0));
        let seeded = Primitive::annotation(
            "seed",
            Geometry::BoundingBox(BoundingBox::new(0.5, 0.5, 0.2, 0.2)),
            Some("car".into()),
        );
        store.add(seeded).unwrap();
        store.add(point("mine", 0.3, 0.3).with_changed(clock.now())).unwrap();
        store
            .add(Primitive::prediction(
                "pred",
                Geometry::Point(Point::new(0.9, 0.9)),
                Some("car".into()),
                Some(0.8),
            ))
            .unwrap();

        let full = store.serialize(false, false);
        assert_eq!(full.annotations.len(), 2);
        assert_eq!(full.file_name.as_deref(), Some("img/a.jpg"));
        assert_eq!(full.predictions.as_ref().map(IndexMap::len), Some(1));

        let user = store.serialize(false, true);
        assert_eq!(user.annotations.len(), 1);
        assert_eq!(user.annotations[0].id, "mine");
        assert_eq!(user.annotations[0].time_required, Some(10_000));
        assert!(user.predictions.is_none());

        let minimal = store.serialize(true, false);
        assert!(minimal.file_name.is_none());
        assert!(minimal.predictions.is_none());
        assert_eq!(minimal.annotations.len(), 2);
    }

    #[test]
    fn test_serialized_json_shape() {
        let (mut store, _, _) = store(AnnotationType::Label);
        store.set_time_created(Timestamp::from_millis(1_700_000_000_123));
        store.add(label("a", "cat")).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&store.serialize(true, false).to_json().unwrap()).unwrap();
        assert_eq!(json["id"], "entry-1");
        assert_eq!(json["timeCreated"], "2023-11-14T22:13:20.123Z");
        assert_eq!(json["timeRequired"], 0);
        assert_eq!(json["annotations"][0]["label"], "cat");
        assert_eq!(json["annotations"][0]["id"], "a");
        assert!(json.get("fileName").is_none());
    }
}
