//! Point annotation: click to place, click near a point to relabel it, alt-click to remove.

use super::{AnnotationInteraction, EventContext, Pointer};
use crate::error::EntryError;
use crate::hit_test::HitTester;
use crate::model::{AnnotationType, Geometry, Point, Primitive, PrimitiveId, PrimitiveKind};
use crate::store::EntryStore;
use crate::surface::{HoverFill, HoverText, SurfaceUpdate};

/// Point state machine.
#[derive(Debug, Default)]
pub struct PointInteraction;

/// What a release at the pointer position would do.
enum PointAction {
    Remove(PrimitiveKind, PrimitiveId),
    Relabel(PrimitiveKind, PrimitiveId, Point),
    Create,
    None,
}

impl PointInteraction {
    fn action(store: &EntryStore, pointer: Pointer, ctx: &EventContext<'_>) -> PointAction {
        let tolerance = ctx.config.annotation_proximity_tolerance;
        match HitTester::new(store).closest_point(pointer.position, tolerance) {
            Some(closest) if pointer.modifiers.alt => {
                PointAction::Remove(closest.kind, closest.id.clone())
            }
            Some(closest) if !closest.has_label(&ctx.active_class.id) => match closest.geometry {
                Geometry::Point(point) => {
                    PointAction::Relabel(closest.kind, closest.id.clone(), point)
                }
                _ => PointAction::None,
            },
            Some(_) => PointAction::None,
            None if pointer.modifiers.alt => PointAction::None,
            None => PointAction::Create,
        }
    }
}

impl AnnotationInteraction for PointInteraction {
    fn annotation_type(&self) -> AnnotationType {
        AnnotationType::Point
    }

    fn pointer_move(&mut self, store: &mut EntryStore, pointer: Pointer, ctx: &mut EventContext<'_>) {
        let hover = match Self::action(store, pointer, ctx) {
            PointAction::Remove(..) => Some(HoverText::new("remove point", HoverFill::Default)),
            PointAction::Relabel(..) => {
                Some(ctx.class_hint(format!("change to \"{}\"", ctx.active_class.name)))
            }
            PointAction::Create | PointAction::None => None,
        };
        store.notify(SurfaceUpdate::HoverText(hover));
    }

    fn pointer_up(
        &mut self,
        store: &mut EntryStore,
        pointer: Pointer,
        ctx: &mut EventContext<'_>,
    ) -> Result<(), EntryError> {
        let label = ctx.active_class.id.clone();
        let now = store.now();
        match Self::action(store, pointer, ctx) {
            PointAction::Remove(kind, id) => {
                store.remove(kind, &id);
                log::debug!("🗑️ Removed point '{}'", id);
            }
            PointAction::Relabel(PrimitiveKind::Annotation, id, _) => {
                store.modify(PrimitiveKind::Annotation, &id, |a| {
                    a.set_label(Some(label.clone()), now)
                });
                log::debug!("🏷️ Relabelled point '{}' to '{}'", id, label);
            }
            PointAction::Relabel(PrimitiveKind::Prediction, id, point) => {
                // Predictions stay untouched; the user's label becomes a new annotation.
                store.remove(PrimitiveKind::Prediction, &id);
                let new_id = store.fresh_id();
                store.add(
                    Primitive::annotation(new_id.clone(), Geometry::Point(point), Some(label))
                        .with_changed(now),
                )?;
                log::debug!("🏷️ Replaced prediction '{}' with annotation '{}'", id, new_id);
            }
            PointAction::Create => {
                let id = store.fresh_id();
                store.add(
                    Primitive::annotation(id.clone(), Geometry::Point(pointer.position), Some(label))
                        .with_changed(now),
                )?;
                log::debug!(
                    "📍 Created point '{}' at ({:.3}, {:.3})",
                    id,
                    pointer.position.x,
                    pointer.position.y
                );
            }
            PointAction::None => {}
        }
        self.pointer_move(store, pointer, ctx);
        Ok(())
    }
}
