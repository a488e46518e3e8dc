//! Drag-and-drop payloads exchanged between the two windows.

use serde::{Deserialize, Serialize};

use crate::host::TemplateRef;

/// JSON carried by a drag event: `{ "type": "Item", "uuid": .., "isFormula": bool }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropData {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub uuid: TemplateRef,
    #[serde(default)]
    pub is_formula: bool,
}

impl DropData {
    pub fn parse(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    /// Payload for dragging a known formula out of the formula book.
    pub fn formula(uuid: TemplateRef) -> Self {
        Self {
            kind: "Item".to_string(),
            uuid,
            is_formula: true,
        }
    }

    pub fn is_item(&self) -> bool {
        self.kind == "Item"
    }

    pub fn to_json(&self) -> String {
        // Serializing a struct of strings and a bool cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}
