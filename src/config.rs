//! Reconciliation options
//!
//! Author: Moroya Sakamoto

use serde::Deserialize;

use crate::block::Uid;

/// Options shared by every entry point that compares two snapshots
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Container (page) uid that top-level blocks hang off. `None` means
    /// top-level blocks have no parent.
    pub root: Option<Uid>,
    /// Reject snapshots that repeat a uid instead of producing a bogus
    /// operation list
    pub validate: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            root: None,
            validate: true,
        }
    }
}

impl ReconcileConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(mut self, root: &str) -> Self {
        self.root = Some(Uid::from(root));
        self
    }

    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }
}
