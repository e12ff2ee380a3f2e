//! Recorded interaction sessions.
//!
//! A session captures the payload an entry was shown with and the timed
//! sequence of user actions. Replaying it against a fresh [`Entry`] with a
//! manual clock reproduces the serialized result, including timing.
//!
//! ```json
//! {
//!   "entryId": "img-7",
//!   "payload": { "fileName": "img/7.jpg", "annotations": {} },
//!   "activeClass": { "id": "cat", "name": "Cat", "color": [255, 0, 0] },
//!   "imageLoadedAt": 120,
//!   "events": [
//!     { "at": 900, "type": "setMode", "mode": "addAnnotation" },
//!     { "at": 1000, "type": "pointerDown", "x": 0.2, "y": 0.2 },
//!     { "at": 1400, "type": "pointerUp", "x": 0.4, "y": 0.5, "shift": true }
//!   ]
//! }
//! ```

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigError, ProjectConfig};
use crate::entry::Entry;
use crate::error::EntryError;
use crate::ids::SequentialIds;
use crate::interaction::{EventContext, InputEvent, Modifiers, Pointer, ToolMode};
use crate::model::{LabelClass, LabelId};
use crate::payload::EntryPayload;
use crate::store::EntryServices;
use crate::surface::RenderSurface;
use crate::timing::{ManualClock, Timestamp};

/// Errors while loading or replaying a session.
#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("Invalid project configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Entry(#[from] EntryError),

    #[error("Invalid session file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pointer coordinates with the modifier keys held.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerAction {
    pub x: f32,
    pub y: f32,
    #[serde(flatten)]
    pub modifiers: Modifiers,
}

impl From<PointerAction> for Pointer {
    fn from(action: PointerAction) -> Self {
        Pointer::new(action.x, action.y, action.modifiers)
    }
}

/// A single recorded user action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionAction {
    PointerDown(PointerAction),
    PointerMove(PointerAction),
    PointerUp(PointerAction),
    PointerLeave,
    KeyChanged(Modifiers),
    SetMode { mode: ToolMode },
    SetClass { class: LabelClass },
    SetLabel { label: Option<LabelId> },
    SetPredictionsVisible { visible: bool },
    SetAnnotationsVisible { visible: bool },
    RemoveActive,
}

/// An action and when it happened, in milliseconds after the session start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedAction {
    pub at: u64,
    #[serde(flatten)]
    pub action: SessionAction,
}

/// A recorded session for one entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub entry_id: String,
    pub payload: EntryPayload,
    pub active_class: LabelClass,
    /// Wall-clock time of the session start (ms since the epoch)
    #[serde(default)]
    pub start_time: u64,
    /// When the image finished loading, relative to the start
    #[serde(default)]
    pub image_loaded_at: Option<u64>,
    #[serde(default)]
    pub events: Vec<TimedAction>,
}

impl Session {
    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        Ok(serde_json::from_str(json)?)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: &std::path::Path) -> Result<Self, ReplayError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    fn offset(&self, millis: u64) -> Timestamp {
        Timestamp::from_millis(self.start_time.saturating_add(millis))
    }

    /// Replay every action against a new entry drawing on `surface`.
    pub fn replay(
        &self,
        config: &ProjectConfig,
        surface: Box<dyn RenderSurface>,
    ) -> Result<Entry, ReplayError> {
        let clock = Rc::new(ManualClock::new(self.offset(0)));
        let services = EntryServices::new(clock.clone(), Box::new(SequentialIds::default()), surface);
        let mut active_class = self.active_class.clone();
        let mut mode = ToolMode::default();
        let mut entry = Entry::new(
            self.entry_id.clone(),
            self.payload.clone(),
            config,
            &active_class,
            services,
        )?;

        let mut image_loaded_at = self.image_loaded_at;
        for timed in &self.events {
            // The image may finish loading between two actions.
            if let Some(loaded) = image_loaded_at.filter(|&t| t <= timed.at) {
                let loaded = self.offset(loaded);
                clock.set(loaded);
                entry.image_loaded(loaded);
                image_loaded_at = None;
            }
            clock.set(self.offset(timed.at));

            let event = match &timed.action {
                SessionAction::PointerDown(p) => InputEvent::PointerDown((*p).into()),
                SessionAction::PointerMove(p) => InputEvent::PointerMove((*p).into()),
                SessionAction::PointerUp(p) => InputEvent::PointerUp((*p).into()),
                SessionAction::PointerLeave => InputEvent::PointerLeave,
                SessionAction::KeyChanged(m) => InputEvent::KeyChanged(*m),
                SessionAction::SetMode { mode: next } => {
                    log::debug!("Tool mode {:?} -> {:?}", mode, next);
                    mode = *next;
                    continue;
                }
                SessionAction::SetClass { class } => {
                    log::debug!("Active class '{}'", class.name);
                    active_class = class.clone();
                    continue;
                }
                SessionAction::SetLabel { label } => {
                    entry.set_label(label.clone())?;
                    continue;
                }
                SessionAction::SetPredictionsVisible { visible } => {
                    entry.set_predictions_visible(*visible);
                    continue;
                }
                SessionAction::SetAnnotationsVisible { visible } => {
                    entry.set_annotations_visible(*visible);
                    continue;
                }
                SessionAction::RemoveActive => {
                    entry.remove_active_annotations();
                    continue;
                }
            };
            let mut ctx = EventContext::new(config, &active_class, &mut mode);
            entry.handle(event, &mut ctx)?;
        }

        if let Some(loaded) = image_loaded_at {
            entry.image_loaded(self.offset(loaded));
        }

        log::info!(
            "Replayed {} action(s) on entry '{}'",
            self.events.len(),
            entry.entry_id()
        );
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnnotationType;
    use crate::surface::NullSurface;

    const SESSION: &str = r#"{
        "entryId": "img-7",
        "startTime": 1700000000000,
        "payload": {
            "fileName": "img/7.jpg",
            "annotations": {
                "old": {"x": 0.75, "y": 0.5, "width": 0.25, "height": 0.25, "label": "dog"}
            }
        },
        "activeClass": {"id": "cat", "name": "Cat", "color": [255, 0, 0]},
        "imageLoadedAt": 500,
        "events": [
            {"at": 900, "type": "setMode", "mode": "addAnnotation"},
            {"at": 1000, "type": "pointerDown", "x": 0.25, "y": 0.25},
            {"at": 1200, "type": "pointerMove", "x": 0.5, "y": 0.5},
            {"at": 1400, "type": "pointerUp", "x": 0.5, "y": 0.5},
            {"at": 2000, "type": "pointerUp", "x": 0.75, "y": 0.5, "shift": true},
            {"at": 2500, "type": "setClass", "class": {"id": "bird", "name": "Bird"}},
            {"at": 3000, "type": "pointerUp", "x": 0.8, "y": 0.8, "shift": true}
        ]
    }"#;

    fn config() -> ProjectConfig {
        ProjectConfig::new(AnnotationType::BoundingBox, AnnotationType::BoundingBox)
    }

    #[test]
    fn test_parse_session() {
        let session = Session::from_json(SESSION).unwrap();
        assert_eq!(session.events.len(), 7);
        assert_eq!(
            session.events[4].action,
            SessionAction::PointerUp(PointerAction {
                x: 0.75,
                y: 0.5,
                modifiers: Modifiers::SHIFT,
            })
        );
        assert_eq!(
            session.events[0].action,
            SessionAction::SetMode {
                mode: ToolMode::AddAnnotation
            }
        );
    }

    #[test]
    fn test_replay_session() {
        let session = Session::from_json(SESSION).unwrap();
        let entry = session.replay(&config(), Box::new(NullSurface)).unwrap();

        let annotations = entry.store().annotations();
        assert_eq!(annotations.len(), 2);
        // Both boxes were selected and relabelled by the final shift click.
        assert!(annotations["old"].has_label("bird"));
        assert!(annotations["local-1"].has_label("bird"));

        let record = entry.serialize(false, true);
        assert_eq!(record.time_created.as_deref(), Some("2023-11-14T22:13:20.500Z"));
        assert_eq!(record.time_required, Some(2_500));
    }

    #[test]
    fn test_huge_offsets_saturate() {
        let mut session = Session::from_json(SESSION).unwrap();
        session.start_time = u64::MAX - 10;
        session.image_loaded_at = Some(u64::MAX);
        let entry = session.replay(&config(), Box::new(NullSurface)).unwrap();
        assert_eq!(entry.time_required(), Some(0));
        assert_eq!(entry.store().annotations().len(), 2);
    }

    #[test]
    fn test_image_loaded_after_last_event() {
        let mut session = Session::from_json(SESSION).unwrap();
        session.image_loaded_at = Some(10_000);
        let entry = session.replay(&config(), Box::new(NullSurface)).unwrap();
        assert_eq!(entry.time_required(), Some(0));
    }
}
