//! Project-wide defaults for entry configuration.

/// Default width of a box created from a point prediction (normalized units).
pub const DEFAULT_BOX_WIDTH: f32 = 0.1;

/// Default height of a box created from a point prediction (normalized units).
pub const DEFAULT_BOX_HEIGHT: f32 = 0.1;

/// Default pointer proximity tolerance for point hit testing (normalized units).
pub const DEFAULT_PROXIMITY_TOLERANCE: f32 = 0.02;

/// Default minimum confidence for predictions to be displayed.
pub const DEFAULT_SHOW_MIN_CONFIDENCE: f32 = 0.0;

/// Default minimum confidence for predictions to be carried over.
pub const DEFAULT_CARRY_OVER_MIN_CONFIDENCE: f32 = 0.5;

/// Prefix used for locally generated primitive identifiers.
pub const LOCAL_ID_PREFIX: &str = "local";
