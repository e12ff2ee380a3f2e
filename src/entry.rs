//! One displayed image with its annotations and predictions.

use indexmap::IndexMap;

use crate::carry_over;
use crate::config::ProjectConfig;
use crate::error::EntryError;
use crate::interaction::{
    AnnotationInteraction, ClassificationInteraction, ClassificationState, EventContext,
    InputEvent, Interaction, Pointer,
};
use crate::model::{AnnotationType, Geometry, LabelClass, LabelId, Primitive, PrimitiveId, PrimitiveKind};
use crate::payload::{EntryPayload, EntryRecord, PrimitiveRecord};
use crate::store::{EntryServices, EntryStore};
use crate::timing::Timestamp;

/// An annotation entry: store, interaction state machine and pointer tracking.
pub struct Entry {
    store: EntryStore,
    interaction: Interaction,
    last_pointer: Option<Pointer>,
}

/// Parse payload records, skipping invalid ones.
fn parse_records(
    records: &IndexMap<PrimitiveId, PrimitiveRecord>,
    kind: PrimitiveKind,
) -> IndexMap<PrimitiveId, Primitive> {
    let mut parsed = IndexMap::with_capacity(records.len());
    for (id, record) in records {
        match record.to_primitive(id, kind) {
            Ok(primitive) => {
                parsed.insert(id.clone(), primitive);
            }
            Err(e) => log::warn!("⚠️ Skipping {:?} '{}': {}", kind, id, e),
        }
    }
    parsed
}

impl Entry {
    /// Build an entry from a server payload.
    ///
    /// Predictions are displayed and carried over only while the entry has
    /// no annotations. Fails if carry-over is enabled for a pairing of
    /// annotation and prediction types it cannot convert.
    pub fn new(
        entry_id: impl Into<String>,
        payload: EntryPayload,
        config: &ProjectConfig,
        active_class: &LabelClass,
        services: EntryServices,
    ) -> Result<Self, EntryError> {
        let rules = config.carry_over_rules();
        if rules.enabled {
            rules.conversion()?;
        }

        let EntryPayload {
            file_name,
            annotations,
            predictions,
        } = payload;
        let has_annotations = !annotations.is_empty();
        let mut store = EntryStore::new(entry_id, file_name, config.annotation_type, services);

        let predictions = parse_records(&predictions, PrimitiveKind::Prediction);
        if config.show_predictions && !has_annotations {
            for prediction in predictions.values() {
                if prediction.confidence_or_zero() >= config.show_predictions_min_conf {
                    store.add(prediction.clone())?;
                }
            }
        }

        let now = store.now();
        let seeds = carry_over::convert(
            &predictions,
            has_annotations,
            &rules,
            &mut || store.fresh_id(),
            now,
        )?;
        if !seeds.is_empty() {
            log::info!(
                "🌱 Carried over {} prediction(s) into entry '{}'",
                seeds.len(),
                store.entry_id()
            );
        }
        for seed in seeds {
            store.add(seed)?;
        }

        for annotation in parse_records(&annotations, PrimitiveKind::Annotation).into_values() {
            store.add(annotation)?;
        }

        if config.annotation_type == AnnotationType::Label {
            ClassificationInteraction::ensure_default(&mut store, config, active_class)?;
        }

        log::debug!(
            "Entry '{}' ready with {} annotation(s) and {} displayed prediction(s)",
            store.entry_id(),
            store.annotations().len(),
            store.predictions().len()
        );

        Ok(Self {
            store,
            interaction: Interaction::for_type(config.annotation_type),
            last_pointer: None,
        })
    }

    pub fn entry_id(&self) -> &str {
        self.store.entry_id()
    }

    pub fn annotation_type(&self) -> AnnotationType {
        self.interaction.annotation_type()
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    /// Label state, for classification entries.
    pub fn classification_state(&self) -> Option<ClassificationState> {
        (self.annotation_type() == AnnotationType::Label)
            .then(|| ClassificationInteraction::state(&self.store))
    }

    /// Dispatch an input event to the state machine and re-render.
    pub fn handle(&mut self, event: InputEvent, ctx: &mut EventContext<'_>) -> Result<(), EntryError> {
        let result = match event {
            InputEvent::PointerDown(pointer) => {
                self.last_pointer = Some(pointer);
                self.interaction.pointer_down(&mut self.store, pointer, ctx)
            }
            InputEvent::PointerMove(pointer) => {
                self.last_pointer = Some(pointer);
                self.interaction.pointer_move(&mut self.store, pointer, ctx);
                Ok(())
            }
            InputEvent::PointerUp(pointer) => {
                self.last_pointer = Some(pointer);
                self.interaction.pointer_up(&mut self.store, pointer, ctx)
            }
            InputEvent::PointerLeave => {
                self.last_pointer = None;
                self.interaction.pointer_leave(&mut self.store, ctx);
                Ok(())
            }
            InputEvent::KeyChanged(modifiers) => {
                if let Some(last) = self.last_pointer {
                    let pointer = Pointer { modifiers, ..last };
                    self.last_pointer = Some(pointer);
                    self.interaction.pointer_move(&mut self.store, pointer, ctx);
                }
                Ok(())
            }
        };
        self.store.render();
        result
    }

    /// Record that the image finished loading. Later calls are ignored.
    pub fn image_loaded(&mut self, time: Timestamp) {
        if self.store.set_time_created(time) {
            log::debug!("🖼️ Image of entry '{}' loaded at {}", self.entry_id(), time);
        }
    }

    /// Set the classification label directly. Ignored for other modalities.
    pub fn set_label(&mut self, label: Option<LabelId>) -> Result<(), EntryError> {
        if self.annotation_type() != AnnotationType::Label {
            log::warn!("set_label ignored for {} entry", self.annotation_type().name());
            return Ok(());
        }
        ClassificationInteraction::set_label(&mut self.store, label)?;
        self.store.render();
        Ok(())
    }

    /// Replace the geometry of an annotation, e.g. after a resize drag.
    ///
    /// Returns `false` when no annotation has that id.
    pub fn edit_geometry(&mut self, id: &str, geometry: Geometry) -> Result<bool, EntryError> {
        let Some(existing) = self.store.annotation(id) else {
            return Ok(false);
        };
        let mut edited = existing.clone();
        edited.set_geometry(geometry, self.store.now());
        self.store.update(edited)?;
        self.store.render();
        Ok(true)
    }

    pub fn set_predictions_visible(&mut self, visible: bool) {
        self.set_visible(PrimitiveKind::Prediction, visible);
    }

    pub fn set_annotations_visible(&mut self, visible: bool) {
        self.set_visible(PrimitiveKind::Annotation, visible);
    }

    fn set_visible(&mut self, kind: PrimitiveKind, visible: bool) {
        for id in self.store.ids(kind) {
            self.store.modify(kind, &id, |p| p.visible = visible);
        }
        self.store.render();
    }

    /// Delete every active annotation.
    pub fn remove_active_annotations(&mut self) -> usize {
        let active: Vec<PrimitiveId> = self
            .store
            .annotations()
            .values()
            .filter(|a| a.active)
            .map(|a| a.id.clone())
            .collect();
        for id in &active {
            self.store.remove(PrimitiveKind::Annotation, id);
        }
        if !active.is_empty() {
            log::debug!("🗑️ Removed {} active annotation(s)", active.len());
        }
        self.store.render();
        active.len()
    }

    /// Milliseconds from image load to the latest annotation change.
    pub fn time_required(&self) -> Option<u64> {
        self.store.time_required()
    }

    pub fn serialize(&self, minimal: bool, only_user_annotations: bool) -> EntryRecord {
        self.store.serialize(minimal, only_user_annotations)
    }
}
