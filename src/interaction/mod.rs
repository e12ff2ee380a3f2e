//! Pointer and keyboard handling per annotation modality.
//!
//! Each modality has its own state machine. The variant is chosen once per
//! entry from the project's annotation type and receives every event with a
//! read-only context (project configuration, active class) plus the caller's
//! tool mode.

mod bounding_box;
mod classification;
mod point;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

pub use bounding_box::BoundingBoxInteraction;
pub use classification::{ClassificationInteraction, ClassificationState};
pub use point::PointInteraction;

use crate::config::ProjectConfig;
use crate::error::EntryError;
use crate::model::{AnnotationType, LabelClass, Point};
use crate::store::EntryStore;
use crate::surface::{HoverFill, HoverText, SurfaceUpdate};

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        alt: false,
        shift: false,
    };
    pub const ALT: Modifiers = Modifiers {
        alt: true,
        shift: false,
    };
    pub const SHIFT: Modifiers = Modifiers {
        alt: false,
        shift: true,
    };
}

/// Pointer position in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub position: Point,
    pub modifiers: Modifiers,
}

impl Pointer {
    pub fn new(x: f32, y: f32, modifiers: Modifiers) -> Self {
        Self {
            position: Point::new(x, y),
            modifiers,
        }
    }

    pub fn at(x: f32, y: f32) -> Self {
        Self::new(x, y, Modifiers::NONE)
    }
}

/// Input delivered by the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown(Pointer),
    PointerMove(Pointer),
    PointerUp(Pointer),
    PointerLeave,
    /// Modifier keys were pressed or released without the pointer moving.
    KeyChanged(Modifiers),
}

/// Global editing action selected in the toolbar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToolMode {
    #[default]
    DoNothing,
    AddAnnotation,
    RemoveAnnotations,
    EditAnnotation,
}

/// Per-event context shared by all entries.
pub struct EventContext<'a> {
    pub config: &'a ProjectConfig,
    pub active_class: &'a LabelClass,
    pub mode: &'a mut ToolMode,
}

impl<'a> EventContext<'a> {
    pub fn new(
        config: &'a ProjectConfig,
        active_class: &'a LabelClass,
        mode: &'a mut ToolMode,
    ) -> Self {
        Self {
            config,
            active_class,
            mode,
        }
    }

    /// Hover text tinted with the active class color.
    fn class_hint(&self, text: String) -> HoverText {
        HoverText::new(text, HoverFill::Class(self.active_class.color))
    }
}

/// Event handling of one annotation modality.
pub trait AnnotationInteraction {
    fn annotation_type(&self) -> AnnotationType;

    fn pointer_down(
        &mut self,
        _store: &mut EntryStore,
        _pointer: Pointer,
        _ctx: &mut EventContext<'_>,
    ) -> Result<(), EntryError> {
        Ok(())
    }

    fn pointer_move(&mut self, store: &mut EntryStore, pointer: Pointer, ctx: &mut EventContext<'_>);

    fn pointer_up(
        &mut self,
        store: &mut EntryStore,
        pointer: Pointer,
        ctx: &mut EventContext<'_>,
    ) -> Result<(), EntryError>;

    fn pointer_leave(&mut self, store: &mut EntryStore, _ctx: &mut EventContext<'_>) {
        store.notify(SurfaceUpdate::HoverText(None));
    }
}

/// The modality-specific state machine of an entry.
#[derive(Debug)]
pub enum Interaction {
    Classification(ClassificationInteraction),
    Point(PointInteraction),
    BoundingBox(BoundingBoxInteraction),
}

impl Interaction {
    /// Select the state machine for an annotation type.
    pub fn for_type(annotation_type: AnnotationType) -> Self {
        match annotation_type {
            AnnotationType::Label => Self::Classification(ClassificationInteraction::default()),
            AnnotationType::Point => Self::Point(PointInteraction::default()),
            AnnotationType::BoundingBox => Self::BoundingBox(BoundingBoxInteraction::default()),
        }
    }

    fn inner(&mut self) -> &mut dyn AnnotationInteraction {
        match self {
            Self::Classification(i) => i,
            Self::Point(i) => i,
            Self::BoundingBox(i) => i,
        }
    }
}

impl AnnotationInteraction for Interaction {
    fn annotation_type(&self) -> AnnotationType {
        match self {
            Self::Classification(i) => i.annotation_type(),
            Self::Point(i) => i.annotation_type(),
            Self::BoundingBox(i) => i.annotation_type(),
        }
    }

    fn pointer_down(
        &mut self,
        store: &mut EntryStore,
        pointer: Pointer,
        ctx: &mut EventContext<'_>,
    ) -> Result<(), EntryError> {
        self.inner().pointer_down(store, pointer, ctx)
    }

    fn pointer_move(&mut self, store: &mut EntryStore, pointer: Pointer, ctx: &mut EventContext<'_>) {
        self.inner().pointer_move(store, pointer, ctx);
    }

    fn pointer_up(
        &mut self,
        store: &mut EntryStore,
        pointer: Pointer,
        ctx: &mut EventContext<'_>,
    ) -> Result<(), EntryError> {
        self.inner().pointer_up(store, pointer, ctx)
    }

    fn pointer_leave(&mut self, store: &mut EntryStore, ctx: &mut EventContext<'_>) {
        self.inner().pointer_leave(store, ctx);
    }
}
