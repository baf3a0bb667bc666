//! Host label helpers

use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::BTreeSet;

/// Labels to detach and attach to reach a desired label set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelDiff {
    pub to_remove: BTreeSet<String>,
    pub to_add: BTreeSet<String>,
}

impl LabelDiff {
    pub fn between(current: &BTreeSet<String>, desired: &BTreeSet<String>) -> Self {
        Self {
            to_remove: current.difference(desired).cloned().collect(),
            to_add: desired.difference(current).cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_remove.is_empty() && self.to_add.is_empty()
    }
}

/// Validate a request `labels` value: it must be a JSON list of strings.
pub fn parse_label_list(value: &Value) -> Result<BTreeSet<String>> {
    let items = value.as_array().ok_or_else(|| {
        Error::InvalidArgument(format!("expected a list of labels, got {}", value))
    })?;

    items
        .iter()
        .map(|item| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                Error::InvalidArgument(format!("label must be a string, got {}", item))
            })
        })
        .collect()
}
