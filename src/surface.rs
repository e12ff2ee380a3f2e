//! Interface to the rendering surface that draws an entry.
//!
//! The core never draws. It reports what changed as [`SurfaceUpdate`]s and
//! leaves shapes, styling and the viewport to the surface implementation.

use std::cell::RefCell;
use std::rc::Rc;

use crate::model::{Point, Primitive, PrimitiveId};

/// Background of a hover hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverFill {
    /// Neutral style, used for removal hints
    Default,
    /// Color of the class the hint refers to
    Class([u8; 3]),
}

/// Text shown next to the pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverText {
    pub text: String,
    pub fill: HoverFill,
}

impl HoverText {
    pub fn new(text: impl Into<String>, fill: HoverFill) -> Self {
        Self {
            text: text.into(),
            fill,
        }
    }
}

/// A change the surface should reflect.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceUpdate {
    Added(Primitive),
    Updated(Primitive),
    Removed(PrimitiveId),
    /// `None` hides the hover text.
    HoverText(Option<HoverText>),
    /// Crosshair guide lines through a point; `None` hides them.
    Crosshair(Option<Point>),
}

/// Receives updates from an entry.
pub trait RenderSurface {
    fn apply(&mut self, update: SurfaceUpdate);

    /// Called once at the end of every handled event.
    fn render(&mut self) {}
}

/// Discards every update.
#[derive(Debug, Default)]
pub struct NullSurface;

impl RenderSurface for NullSurface {
    fn apply(&mut self, _update: SurfaceUpdate) {}
}

/// Keeps every update in a shared log. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    log: Rc<RefCell<Vec<SurfaceUpdate>>>,
    renders: Rc<RefCell<usize>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all recorded updates.
    pub fn take(&self) -> Vec<SurfaceUpdate> {
        std::mem::take(&mut *self.log.borrow_mut())
    }

    /// Copy of the recorded updates.
    pub fn updates(&self) -> Vec<SurfaceUpdate> {
        self.log.borrow().clone()
    }

    /// Most recent hover text update, if any was recorded.
    pub fn last_hover(&self) -> Option<Option<HoverText>> {
        self.log.borrow().iter().rev().find_map(|u| match u {
            SurfaceUpdate::HoverText(h) => Some(h.clone()),
            _ => None,
        })
    }

    /// Most recent crosshair update, if any was recorded.
    pub fn last_crosshair(&self) -> Option<Option<Point>> {
        self.log.borrow().iter().rev().find_map(|u| match u {
            SurfaceUpdate::Crosshair(c) => Some(*c),
            _ => None,
        })
    }

    pub fn render_count(&self) -> usize {
        *self.renders.borrow()
    }
}

impl RenderSurface for RecordingSurface {
    fn apply(&mut self, update: SurfaceUpdate) {
        self.log.borrow_mut().push(update);
    }

    fn render(&mut self) {
        *self.renders.borrow_mut() += 1;
    }
}
