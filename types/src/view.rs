//! Read-only snapshots handed to rendering adapters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// An entry in the pending or spawned preparation lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedItem {
    pub id: String,
    pub name: String,
    /// Opaque reference to the craftable template
    pub source_ref: String,
    pub is_alchemical: bool,
}

/// Everything the tracker window needs to draw itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerView {
    pub int_mod: i32,
    pub current_vials: u32,
    pub max_vials: u32,
    pub pending: Vec<PreparedItem>,
    pub spawned: Vec<PreparedItem>,
    pub max_items: u32,
}

impl TrackerView {
    /// Preparations used today (pending + spawned).
    pub fn preparations_used(&self) -> usize {
        self.pending.len() + self.spawned.len()
    }
}

/// A formula the bound character knows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownFormula {
    pub name: String,
    pub source_ref: String,
    /// Crafting DC parsed from the item description, if present
    pub dc: Option<u32>,
    pub level: i32,
    pub item_type: String,
    pub img: Option<String>,
    pub is_alchemical: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaBookView {
    pub formulas_by_level: BTreeMap<i32, Vec<KnownFormula>>,
}

impl FormulaBookView {
    pub fn len(&self) -> usize {
        self.formulas_by_level.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.formulas_by_level.is_empty()
    }
}
