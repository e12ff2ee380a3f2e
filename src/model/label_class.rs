//! Label class the user currently annotates with.

use serde::{Deserialize, Serialize};

use super::LabelId;

/// A label class with a name and color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelClass {
    /// Class identifier stored on primitives
    pub id: LabelId,
    /// Display name of the class
    pub name: String,
    /// RGB color for the class
    #[serde(default = "default_color")]
    pub color: [u8; 3],
}

fn default_color() -> [u8; 3] {
    [200, 200, 200]
}

impl LabelClass {
    /// Create a new label class with the given ID, name, and color.
    pub fn new(id: &str, name: &str, color: [u8; 3]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            color,
        }
    }
}
