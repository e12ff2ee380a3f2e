//! Image-wide classification: one label per entry, toggled by clicking.

use super::{AnnotationInteraction, EventContext, Pointer};
use crate::config::ProjectConfig;
use crate::error::EntryError;
use crate::model::{AnnotationType, Geometry, LabelClass, LabelId, Primitive, PrimitiveKind};
use crate::store::EntryStore;
use crate::surface::{HoverFill, HoverText, SurfaceUpdate};

/// Label state of a classification entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassificationState {
    Unlabeled,
    Labeled(LabelId),
}

impl ClassificationState {
    fn from_label(label: Option<&LabelId>) -> Self {
        match label {
            Some(label) => Self::Labeled(label.clone()),
            None => Self::Unlabeled,
        }
    }

    fn into_label(self) -> Option<LabelId> {
        match self {
            Self::Unlabeled => None,
            Self::Labeled(label) => Some(label),
        }
    }

    /// State after a click with `active` selected.
    ///
    /// Removal back to [`ClassificationState::Unlabeled`] only happens when
    /// the empty class is enabled.
    pub fn toggle(&self, active: &str, force_remove: bool, allow_empty: bool) -> Self {
        if force_remove && allow_empty {
            return Self::Unlabeled;
        }
        match self {
            Self::Unlabeled => Self::Labeled(active.to_string()),
            Self::Labeled(label) if label == active && allow_empty => Self::Unlabeled,
            Self::Labeled(_) => Self::Labeled(active.to_string()),
        }
    }
}

/// Classification state machine.
#[derive(Debug, Default)]
pub struct ClassificationInteraction;

impl ClassificationInteraction {
    /// Current state derived from the entry's single label annotation.
    pub fn state(store: &EntryStore) -> ClassificationState {
        ClassificationState::from_label(
            store
                .annotations()
                .values()
                .next()
                .and_then(|a| a.label.as_ref()),
        )
    }

    /// Add the blank annotation every classification entry starts with.
    pub fn ensure_default(
        store: &mut EntryStore,
        config: &ProjectConfig,
        active_class: &LabelClass,
    ) -> Result<(), EntryError> {
        if store.has_annotations() {
            return Ok(());
        }
        let label = (!config.enable_empty_class).then(|| active_class.id.clone());
        let id = store.fresh_id();
        store.add(Primitive::annotation(id, Geometry::Label, label))
    }

    /// Set the label directly, creating the annotation if needed.
    pub fn set_label(store: &mut EntryStore, label: Option<LabelId>) -> Result<(), EntryError> {
        let now = store.now();
        let existing = store.annotations().keys().next().cloned();
        match existing {
            Some(id) => {
                store.modify(PrimitiveKind::Annotation, &id, |a| a.set_label(label, now));
                Ok(())
            }
            None => {
                let id = store.fresh_id();
                store.add(Primitive::annotation(id, Geometry::Label, label).with_changed(now))
            }
        }
    }

    fn hover_text(store: &EntryStore, pointer: Pointer, ctx: &EventContext<'_>) -> Option<HoverText> {
        let class = ctx.active_class;
        if pointer.modifiers.alt && ctx.config.enable_empty_class {
            return Some(HoverText::new("mark as unlabeled", HoverFill::Default));
        }
        match Self::state(store) {
            ClassificationState::Unlabeled => {
                Some(ctx.class_hint(format!("set label to \"{}\"", class.name)))
            }
            ClassificationState::Labeled(label) if label != class.id => {
                Some(ctx.class_hint(format!("change label to \"{}\"", class.name)))
            }
            ClassificationState::Labeled(_) => None,
        }
    }
}

impl AnnotationInteraction for ClassificationInteraction {
    fn annotation_type(&self) -> AnnotationType {
        AnnotationType::Label
    }

    fn pointer_move(&mut self, store: &mut EntryStore, pointer: Pointer, ctx: &mut EventContext<'_>) {
        let hover = Self::hover_text(store, pointer, ctx);
        store.notify(SurfaceUpdate::HoverText(hover));
    }

    fn pointer_up(
        &mut self,
        store: &mut EntryStore,
        pointer: Pointer,
        ctx: &mut EventContext<'_>,
    ) -> Result<(), EntryError> {
        let current = Self::state(store);
        let next = current.toggle(
            &ctx.active_class.id,
            pointer.modifiers.alt,
            ctx.config.enable_empty_class,
        );
        log::debug!("🏷️ Classification {:?} -> {:?}", current, next);
        Self::set_label(store, next.into_label())?;
        // Refresh the hint for the new state.
        self.pointer_move(store, pointer, ctx);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_transitions() {
        let unlabeled = ClassificationState::Unlabeled;
        let cat = ClassificationState::Labeled("cat".into());
        let dog = ClassificationState::Labeled("dog".into());

        assert_eq!(unlabeled.toggle("cat", false, true), cat);
        assert_eq!(cat.toggle("cat", false, true), unlabeled);
        assert_eq!(cat.toggle("cat", false, false), cat);
        assert_eq!(dog.toggle("cat", false, true), cat);
        assert_eq!(dog.toggle("cat", true, true), unlabeled);
        // Forced removal needs the empty class.
        assert_eq!(dog.toggle("cat", true, false), cat);
        assert_eq!(unlabeled.toggle("cat", true, false), cat);
    }
}
