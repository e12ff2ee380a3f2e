//! Scenario tests for the interaction state machines.
//!
//! Each test drives a full [`Entry`] through pointer and keyboard events and
//! checks the store and the updates the surface received.

mod classification_tests;

use std::rc::Rc;

use super::{EventContext, InputEvent, Modifiers, Pointer, ToolMode};
use crate::config::ProjectConfig;
use crate::entry::Entry;
use crate::error::EntryError;
use crate::ids::SequentialIds;
use crate::model::{BoundingBox, Geometry, LabelClass, Point, Primitive};
use crate::payload::{EntryPayload, PrimitiveRecord};
use crate::store::EntryServices;
use crate::surface::{HoverText, RecordingSurface};
use crate::timing::{ManualClock, Timestamp};

/// Start time of every scenario clock.
const T0: u64 = 1_000_000;

fn cat() -> LabelClass {
    LabelClass::new("cat", "Cat", [255, 0, 0])
}

fn dog() -> LabelClass {
    LabelClass::new("dog", "Dog", [0, 0, 255])
}

fn point_record(x: f32, y: f32, label: &str) -> PrimitiveRecord {
    PrimitiveRecord {
        x: Some(x),
        y: Some(y),
        label: Some(label.into()),
        ..Default::default()
    }
}

fn box_record(x: f32, y: f32, width: f32, height: f32, label: &str) -> PrimitiveRecord {
    PrimitiveRecord {
        width: Some(width),
        height: Some(height),
        ..point_record(x, y, label)
    }
}

fn label_record(label: &str) -> PrimitiveRecord {
    PrimitiveRecord {
        label: Some(label.into()),
        ..Default::default()
    }
}

fn with_confidence(record: PrimitiveRecord, confidence: f32) -> PrimitiveRecord {
    PrimitiveRecord {
        confidence: Some(confidence),
        ..record
    }
}

/// An entry wired to a manual clock and a recording surface.
struct Harness {
    entry: Entry,
    clock: Rc<ManualClock>,
    surface: RecordingSurface,
    config: ProjectConfig,
    class: LabelClass,
    mode: ToolMode,
}

impl Harness {
    fn try_new(config: ProjectConfig, payload: EntryPayload) -> Result<Self, EntryError> {
        let clock = Rc::new(ManualClock::new(Timestamp::from_millis(T0)));
        let surface = RecordingSurface::new();
        let services = EntryServices::new(
            clock.clone(),
            Box::new(SequentialIds::new("new")),
            Box::new(surface.clone()),
        );
        let class = cat();
        let entry = Entry::new("entry-1", payload, &config, &class, services)?;
        Ok(Self {
            entry,
            clock,
            surface,
            config,
            class,
            mode: ToolMode::DoNothing,
        })
    }

    fn new(config: ProjectConfig, payload: EntryPayload) -> Self {
        Self::try_new(config, payload).unwrap()
    }

    fn send(&mut self, event: InputEvent) {
        let mut ctx = EventContext::new(&self.config, &self.class, &mut self.mode);
        self.entry.handle(event, &mut ctx).unwrap();
    }

    fn move_to(&mut self, x: f32, y: f32, modifiers: Modifiers) {
        self.send(InputEvent::PointerMove(Pointer::new(x, y, modifiers)));
    }

    fn click(&mut self, x: f32, y: f32, modifiers: Modifiers) {
        let pointer = Pointer::new(x, y, modifiers);
        self.send(InputEvent::PointerDown(pointer));
        self.send(InputEvent::PointerUp(pointer));
    }

    /// Drag from one position to another, advancing the clock in between.
    fn drag(&mut self, from: (f32, f32), to: (f32, f32)) {
        self.send(InputEvent::PointerDown(Pointer::at(from.0, from.1)));
        self.clock.advance(100);
        self.send(InputEvent::PointerMove(Pointer::at(to.0, to.1)));
        self.send(InputEvent::PointerUp(Pointer::at(to.0, to.1)));
    }

    fn annotation(&self, id: &str) -> &Primitive {
        &self.entry.store().annotations()[id]
    }

    fn annotations(&self) -> Vec<&Primitive> {
        self.entry.store().annotations().values().collect()
    }

    fn active_ids(&self) -> Vec<&str> {
        self.entry
            .store()
            .annotations()
            .values()
            .filter(|a| a.active)
            .map(|a| a.id.as_str())
            .collect()
    }

    fn hover_text(&self) -> Option<String> {
        self.surface.last_hover().flatten().map(|h: HoverText| h.text)
    }
}

fn box_geometry(primitive: &Primitive) -> BoundingBox {
    match primitive.geometry {
        Geometry::BoundingBox(b) => b,
        ref other => panic!("expected a box, got {other:?}"),
    }
}

fn point_geometry(primitive: &Primitive) -> Point {
    match primitive.geometry {
        Geometry::Point(p) => p,
        ref other => panic!("expected a point, got {other:?}"),
    }
}
