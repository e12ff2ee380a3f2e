//! Entry Core - per-image annotation state for labeling front ends.
//!
//! For every displayed image an [`Entry`] reconciles model predictions with
//! human annotations, optionally seeds annotations from predictions
//! ([`carry_over`]), and runs the editing state machine for image-wide
//! labels, points or bounding boxes. Rendering is left to a
//! [`RenderSurface`](surface::RenderSurface) implementation.
//!
//! ```
//! use entry_core::{
//!     AnnotationType, Entry, EntryPayload, EntryServices, EventContext, InputEvent, LabelClass,
//!     Pointer, ProjectConfig, ToolMode, surface::NullSurface,
//! };
//!
//! let config = ProjectConfig::new(AnnotationType::Point, AnnotationType::Point);
//! let class = LabelClass::new("cat", "Cat", [255, 0, 0]);
//! let services = EntryServices::with_surface(Box::new(NullSurface));
//! let mut entry = Entry::new("e1", EntryPayload::new("cat.jpg"), &config, &class, services)?;
//!
//! let mut mode = ToolMode::DoNothing;
//! let mut ctx = EventContext::new(&config, &class, &mut mode);
//! entry.handle(InputEvent::PointerUp(Pointer::at(0.5, 0.5)), &mut ctx)?;
//! assert_eq!(entry.store().annotations().len(), 1);
//! # Ok::<(), entry_core::EntryError>(())
//! ```

pub mod carry_over;
pub mod config;
pub mod constants;
mod entry;
mod error;
pub mod ids;
pub mod interaction;
pub mod model;
pub mod payload;
pub mod session;
pub mod store;
pub mod surface;
pub mod timing;

pub use config::{CarryOverRule, ConfigError, ProjectConfig};
pub use entry::Entry;
pub use error::EntryError;
pub use interaction::{EventContext, InputEvent, Modifiers, Pointer, ToolMode};
pub use model::{AnnotationType, BoundingBox, Geometry, LabelClass, Point, Primitive};
pub use payload::{EntryPayload, EntryRecord};
pub use session::{ReplayError, Session};
pub use store::{EntryServices, EntryStore};
