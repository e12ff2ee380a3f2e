//! Bounding box annotation.
//!
//! Boxes are selected by clicking into them and relabelled with the active
//! class. Creating and removing boxes depends on the global [`ToolMode`]:
//!
//! | Mode | Pointer down | Pointer up |
//! |------|--------------|------------|
//! | `AddAnnotation` | start a new box | finish it, back to `DoNothing` |
//! | `RemoveAnnotations` | | delete the hit box, back to `DoNothing` |
//! | `EditAnnotation` | | back to `DoNothing` |
//! | `DoNothing` | | relabel and select boxes |

use super::{AnnotationInteraction, EventContext, Pointer, ToolMode};
use crate::error::EntryError;
use crate::hit_test::HitTester;
use crate::model::{
    AnnotationType, BoundingBox, Geometry, Point, Primitive, PrimitiveId, PrimitiveKind,
};
use crate::store::EntryStore;
use crate::surface::{HoverFill, HoverText, SurfaceUpdate};

/// A box being drawn by dragging from `anchor`.
#[derive(Debug, Clone)]
struct Draft {
    id: PrimitiveId,
    anchor: Point,
}

/// Bounding box state machine.
#[derive(Debug, Default)]
pub struct BoundingBoxInteraction {
    draft: Option<Draft>,
    crosshair_visible: bool,
}

impl BoundingBoxInteraction {
    /// Whether a box is currently being drawn.
    pub fn is_drafting(&self) -> bool {
        self.draft.is_some()
    }

    fn set_active(store: &mut EntryStore, id: &str, active: bool) {
        let needs_change = store
            .annotation(id)
            .is_some_and(|a| a.visible && a.active != active);
        if needs_change {
            store.modify(PrimitiveKind::Annotation, id, |a| a.active = active);
        }
    }

    fn deactivate_all(store: &mut EntryStore) {
        for id in store.ids(PrimitiveKind::Annotation) {
            Self::set_active(store, &id, false);
        }
    }

    fn active_count(store: &EntryStore) -> usize {
        store.annotations().values().filter(|a| a.active).count()
    }

    /// Select the box under the pointer.
    ///
    /// The containing box with the nearest center becomes active. Other boxes
    /// become inactive unless shift is held and they were already active. If
    /// no box contains the pointer every box is deactivated.
    pub fn toggle_active(store: &mut EntryStore, pointer: Pointer) {
        let shift = pointer.modifiers.shift;
        let hits = HitTester::new(store);
        let containing: Vec<PrimitiveId> = hits
            .containing(pointer.position)
            .into_iter()
            .map(|(p, _)| p.id.clone())
            .collect();
        let nearest = hits
            .nearest_containing(pointer.position)
            .map(|p| p.id.clone());

        for id in store.ids(PrimitiveKind::Annotation) {
            let was_active = store.annotation(&id).is_some_and(|a| a.active);
            let keep = if containing.contains(&id) {
                shift && was_active
            } else {
                shift
            };
            if !keep {
                Self::set_active(store, &id, false);
            }
        }

        match nearest {
            Some(id) => {
                Self::set_active(store, &id, true);
                log::debug!("🎯 Selected box '{}'", id);
            }
            None => Self::deactivate_all(store),
        }
    }

    /// Delete the first active box under the pointer, or else the containing
    /// box with the nearest center.
    fn remove_at(store: &mut EntryStore, position: Point) {
        let hits = HitTester::new(store);
        let target = hits
            .containing(position)
            .into_iter()
            .find(|(p, _)| p.active)
            .map(|(p, _)| p.id.clone())
            .or_else(|| hits.nearest_containing(position).map(|p| p.id.clone()));
        if let Some(id) = target {
            store.remove(PrimitiveKind::Annotation, &id);
            log::debug!("🗑️ Removed box '{}'", id);
        }
    }

    /// Give active boxes the active class: every active box when shift is
    /// held, otherwise those under the pointer.
    fn relabel_active(store: &mut EntryStore, pointer: Pointer, label: &str) {
        let now = store.now();
        let targets: Vec<PrimitiveId> = store
            .annotations()
            .values()
            .filter(|a| a.active)
            .filter(|a| {
                pointer.modifiers.shift
                    || a.geometry
                        .as_box()
                        .is_some_and(|b| b.contains(&pointer.position))
            })
            .map(|a| a.id.clone())
            .collect();
        for id in targets {
            store.modify(PrimitiveKind::Annotation, &id, |a| {
                a.set_label(Some(label.to_string()), now)
            });
            log::debug!("🏷️ Relabelled box '{}' to '{}'", id, label);
        }
    }

    fn start_box(
        &mut self,
        store: &mut EntryStore,
        pointer: Pointer,
        ctx: &EventContext<'_>,
    ) -> Result<(), EntryError> {
        Self::deactivate_all(store);
        let id = store.fresh_id();
        let mut annotation = Primitive::annotation(
            id.clone(),
            Geometry::BoundingBox(BoundingBox::at(pointer.position)),
            Some(ctx.active_class.id.clone()),
        )
        .with_changed(store.now());
        annotation.active = true;
        store.add(annotation)?;
        self.draft = Some(Draft {
            id,
            anchor: pointer.position,
        });
        Ok(())
    }

    fn resize_draft(&self, store: &mut EntryStore, position: Point) {
        let Some(draft) = &self.draft else {
            return;
        };
        let now = store.now();
        let geometry = Geometry::BoundingBox(BoundingBox::from_corners(draft.anchor, position));
        store.modify(PrimitiveKind::Annotation, &draft.id, |a| {
            a.set_geometry(geometry, now)
        });
    }

    fn update_crosshair(&mut self, store: &mut EntryStore, position: Point, mode: ToolMode) {
        if mode == ToolMode::AddAnnotation {
            self.crosshair_visible = true;
            store.notify(SurfaceUpdate::Crosshair(Some(position)));
        } else {
            self.hide_crosshair(store);
        }
    }

    fn hide_crosshair(&mut self, store: &mut EntryStore) {
        if self.crosshair_visible {
            self.crosshair_visible = false;
            store.notify(SurfaceUpdate::Crosshair(None));
        }
    }

    fn hover_text(store: &EntryStore, ctx: &EventContext<'_>) -> Option<HoverText> {
        let class = ctx.active_class;
        match *ctx.mode {
            ToolMode::AddAnnotation => {
                Some(ctx.class_hint(format!("add new \"{}\"", class.name)))
            }
            ToolMode::RemoveAnnotations => match Self::active_count(store) {
                0 => None,
                1 => Some(HoverText::new("remove 1 annotation", HoverFill::Default)),
                n => Some(HoverText::new(
                    format!("remove {n} annotations"),
                    HoverFill::Default,
                )),
            },
            ToolMode::DoNothing => store
                .annotations()
                .values()
                .any(|a| a.active && !a.has_label(&class.id))
                .then(|| ctx.class_hint(format!("change label to \"{}\"", class.name))),
            ToolMode::EditAnnotation => None,
        }
    }
}

impl AnnotationInteraction for BoundingBoxInteraction {
    fn annotation_type(&self) -> AnnotationType {
        AnnotationType::BoundingBox
    }

    fn pointer_down(
        &mut self,
        store: &mut EntryStore,
        pointer: Pointer,
        ctx: &mut EventContext<'_>,
    ) -> Result<(), EntryError> {
        if *ctx.mode == ToolMode::AddAnnotation {
            self.start_box(store, pointer, ctx)?;
        }
        Ok(())
    }

    fn pointer_move(&mut self, store: &mut EntryStore, pointer: Pointer, ctx: &mut EventContext<'_>) {
        self.resize_draft(store, pointer.position);
        self.update_crosshair(store, pointer.position, *ctx.mode);
        let hover = Self::hover_text(store, ctx);
        store.notify(SurfaceUpdate::HoverText(hover));
    }

    fn pointer_up(
        &mut self,
        store: &mut EntryStore,
        pointer: Pointer,
        ctx: &mut EventContext<'_>,
    ) -> Result<(), EntryError> {
        // The mode may have changed since the press; the drag ends either way.
        if self.draft.is_some() {
            self.resize_draft(store, pointer.position);
            if let Some(draft) = self.draft.take() {
                log::debug!("📦 Created box '{}'", draft.id);
            }
        }
        match *ctx.mode {
            ToolMode::AddAnnotation => {
                *ctx.mode = ToolMode::DoNothing;
            }
            ToolMode::RemoveAnnotations => {
                Self::remove_at(store, pointer.position);
                *ctx.mode = ToolMode::DoNothing;
            }
            ToolMode::EditAnnotation => {
                *ctx.mode = ToolMode::DoNothing;
            }
            ToolMode::DoNothing => {
                Self::relabel_active(store, pointer, &ctx.active_class.id);
                Self::toggle_active(store, pointer);
            }
        }
        self.pointer_move(store, pointer, ctx);
        Ok(())
    }

    fn pointer_leave(&mut self, store: &mut EntryStore, _ctx: &mut EventContext<'_>) {
        self.draft = None;
        store.notify(SurfaceUpdate::HoverText(None));
        self.hide_crosshair(store);
    }
}
