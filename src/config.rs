//! Project configuration consumed by annotation entries.
//!
//! The configuration is loaded once per project and treated as read-only by
//! every entry. It decides the annotation modality, how predictions are shown
//! and how they are carried over into seed annotations.

use serde::{Deserialize, Serialize};

use crate::carry_over::CarryOverRules;
use crate::constants::{
    DEFAULT_BOX_HEIGHT, DEFAULT_BOX_WIDTH, DEFAULT_CARRY_OVER_MIN_CONFIDENCE,
    DEFAULT_PROXIMITY_TOLERANCE, DEFAULT_SHOW_MIN_CONFIDENCE,
};
use crate::error::EntryError;
use crate::model::AnnotationType;

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Rule used to derive one image-wide label from localized predictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum CarryOverRule {
    /// Label of the single most confident prediction
    #[default]
    MaxConfidence,
    /// Most frequent predicted label
    Mode,
}

/// Size of boxes created from point predictions (normalized units).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxSize {
    pub width: f32,
    pub height: f32,
}

impl Default for BoxSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_BOX_WIDTH,
            height: DEFAULT_BOX_HEIGHT,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Project-wide settings shared by all entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    /// Version of the configuration file format
    #[serde(default = "default_version")]
    pub version: u32,

    /// Modality users annotate in
    pub annotation_type: AnnotationType,

    /// Modality the model predicts in
    pub prediction_type: AnnotationType,

    /// Display predictions on entries without annotations
    #[serde(default)]
    pub show_predictions: bool,

    /// Minimum confidence for a prediction to be displayed
    #[serde(default = "default_show_min_conf")]
    pub show_predictions_min_conf: f32,

    /// Seed annotations from predictions on entries without annotations
    #[serde(default)]
    pub carry_over_predictions: bool,

    /// Rule for deriving image-wide labels from localized predictions
    #[serde(default)]
    pub carry_over_rule: CarryOverRule,

    /// Minimum confidence for a prediction to be carried over
    #[serde(default = "default_carry_over_min_conf")]
    pub carry_over_predictions_min_conf: f32,

    /// Allow classification entries to be explicitly unlabeled
    #[serde(default)]
    pub enable_empty_class: bool,

    /// Size of boxes converted from point predictions
    #[serde(default)]
    pub default_box_size: BoxSize,

    /// Maximum distance for a pointer to hit a point
    #[serde(default = "default_tolerance")]
    pub annotation_proximity_tolerance: f32,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_show_min_conf() -> f32 {
    DEFAULT_SHOW_MIN_CONFIDENCE
}

fn default_carry_over_min_conf() -> f32 {
    DEFAULT_CARRY_OVER_MIN_CONFIDENCE
}

fn default_tolerance() -> f32 {
    DEFAULT_PROXIMITY_TOLERANCE
}

impl ProjectConfig {
    /// Create a configuration with defaults for everything but the modalities.
    pub fn new(annotation_type: AnnotationType, prediction_type: AnnotationType) -> Self {
        Self {
            version: CONFIG_VERSION,
            annotation_type,
            prediction_type,
            show_predictions: false,
            show_predictions_min_conf: default_show_min_conf(),
            carry_over_predictions: false,
            carry_over_rule: CarryOverRule::default(),
            carry_over_predictions_min_conf: default_carry_over_min_conf(),
            enable_empty_class: false,
            default_box_size: BoxSize::default(),
            annotation_proximity_tolerance: default_tolerance(),
            log_level: LogLevel::default(),
        }
    }

    /// Show predictions at or above `min_conf`.
    pub fn with_show_predictions(mut self, min_conf: f32) -> Self {
        self.show_predictions = true;
        self.show_predictions_min_conf = min_conf;
        self
    }

    /// Carry predictions over using `rule` at or above `min_conf`.
    pub fn with_carry_over(mut self, rule: CarryOverRule, min_conf: f32) -> Self {
        self.carry_over_predictions = true;
        self.carry_over_rule = rule;
        self.carry_over_predictions_min_conf = min_conf;
        self
    }

    /// Enable or disable the empty (background) class.
    pub fn with_empty_class(mut self, enabled: bool) -> Self {
        self.enable_empty_class = enabled;
        self
    }

    /// Set the size of boxes converted from points.
    pub fn with_default_box_size(mut self, width: f32, height: f32) -> Self {
        self.default_box_size = BoxSize { width, height };
        self
    }

    /// Set the point hit tolerance.
    pub fn with_proximity_tolerance(mut self, tolerance: f32) -> Self {
        self.annotation_proximity_tolerance = tolerance;
        self
    }

    /// Carry-over rules derived from this configuration.
    pub fn carry_over_rules(&self) -> CarryOverRules {
        CarryOverRules {
            enabled: self.carry_over_predictions,
            annotation_type: self.annotation_type,
            prediction_type: self.prediction_type,
            rule: self.carry_over_rule,
            min_confidence: self.carry_over_predictions_min_conf,
            default_box_size: self.default_box_size,
        }
    }

    /// Check value ranges and that the configured carry-over is implemented.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("showPredictionsMinConf", self.show_predictions_min_conf),
            (
                "carryOverPredictionsMinConf",
                self.carry_over_predictions_min_conf,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        let tolerance = self.annotation_proximity_tolerance;
        if tolerance.is_nan() || tolerance < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "annotationProximityTolerance must be non-negative, got {tolerance}"
            )));
        }
        let size = self.default_box_size;
        if [size.width, size.height].iter().any(|v| v.is_nan() || *v < 0.0) {
            return Err(ConfigError::Invalid(format!(
                "defaultBoxSize must be non-negative, got {}x{}",
                size.width, size.height
            )));
        }
        if self.carry_over_predictions {
            self.carry_over_rules().conversion()?;
        }
        Ok(())
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize and validate configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        config.validate()?;
        Ok(config)
    }

    /// Read and validate a configuration file.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded project configuration from {:?}", path);
        Ok(config)
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// Configured modalities cannot be combined
    #[error(transparent)]
    Entry(#[from] EntryError),
}
