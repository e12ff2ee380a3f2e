//! Identity generation for locally created primitives.

use crate::constants::LOCAL_ID_PREFIX;
use crate::model::PrimitiveId;

/// Produces identifiers for annotations created in this session.
pub trait IdGenerator {
    /// The next identifier. Callers skip values already in use.
    fn next_id(&mut self) -> PrimitiveId;
}

/// Monotonic `<prefix>-<n>` identifiers.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new(LOCAL_ID_PREFIX)
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> PrimitiveId {
        let id = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}
