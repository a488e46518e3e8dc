//! Records exchanged with the host's document store.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

string_id!(
    /// A character (actor) document.
    ActorId
);
string_id!(
    /// An embedded inventory record on an actor.
    ItemId
);
string_id!(
    /// Opaque reference to a template the host can resolve (compendium uuid).
    TemplateRef
);
string_id!(UserId);

pub const INFUSED_TRAIT: &str = "infused";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ability {
    Str,
    Dex,
    Con,
    Int,
    Wis,
    Cha,
}

/// Roster entry for a character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorSummary {
    pub id: ActorId,
    pub name: String,
    #[serde(default)]
    pub has_player_owner: bool,
    /// Users that receive whispers addressed to this character
    #[serde(default)]
    pub owners: Vec<UserId>,
}

/// An inventory record as currently persisted by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: ItemId,
    pub name: String,
    pub item_type: String,
    pub quantity: u32,
    #[serde(default)]
    pub traits: Vec<String>,
    /// Template the record was materialized from
    #[serde(default)]
    pub source_id: Option<TemplateRef>,
    /// Character that infused this record
    #[serde(default)]
    pub creator: Option<ActorId>,
}

impl ItemRecord {
    pub fn has_trait(&self, name: &str) -> bool {
        self.traits.iter().any(|t| t == name)
    }

    pub fn is_infused(&self) -> bool {
        self.has_trait(INFUSED_TRAIT)
    }

    pub fn created_by(&self, actor: &ActorId) -> bool {
        self.creator.as_ref() == Some(actor)
    }
}

/// A template record resolved from a [`TemplateRef`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemTemplate {
    pub uuid: TemplateRef,
    pub name: String,
    pub item_type: String,
    #[serde(default)]
    pub level: i32,
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(default)]
    pub is_alchemical: bool,
    /// For formula templates: the item the formula crafts
    #[serde(default)]
    pub crafted_item: Option<TemplateRef>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub img: Option<String>,
}

impl ItemTemplate {
    pub fn is_formula(&self) -> bool {
        self.item_type == "formula"
    }

    pub fn is_consumable(&self) -> bool {
        self.item_type == "consumable"
    }

    /// Data for a new inventory record copied from this template.
    pub fn instantiate(&self, quantity: u32) -> NewItem {
        NewItem {
            name: self.name.clone(),
            item_type: self.item_type.clone(),
            quantity,
            traits: self.traits.clone(),
            source_id: Some(self.uuid.clone()),
            creator: None,
        }
    }
}

/// Create request for an inventory record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub item_type: String,
    pub quantity: u32,
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(default)]
    pub source_id: Option<TemplateRef>,
    #[serde(default)]
    pub creator: Option<ActorId>,
}

impl NewItem {
    /// Tag the item as infused and stamp it with its creator.
    pub fn infused_by(mut self, creator: &ActorId) -> Self {
        if !self.traits.iter().any(|t| t == INFUSED_TRAIT) {
            self.traits.push(INFUSED_TRAIT.to_string());
        }
        self.creator = Some(creator.clone());
        self
    }
}

/// Quantity patch for an existing record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPatch {
    pub id: ItemId,
    pub quantity: u32,
}

/// Updates and creates that must land together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryBatch {
    pub updates: Vec<ItemPatch>,
    pub creates: Vec<NewItem>,
}

impl InventoryBatch {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.creates.is_empty()
    }
}

/// A formula reference persisted on the actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaEntry {
    pub uuid: TemplateRef,
    pub name: String,
    #[serde(default)]
    pub level: i32,
    pub item_type: String,
    #[serde(default)]
    pub img: Option<String>,
    #[serde(default)]
    pub dc: Option<u32>,
}

/// Buttons a chat card can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatAction {
    AddVials,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub speaker: Option<ActorId>,
    pub content: String,
    /// Recipients; empty means visible to everyone
    pub whisper: Vec<UserId>,
    pub action: Option<ChatAction>,
}

impl ChatMessage {
    pub fn public(speaker: &ActorId, content: impl Into<String>) -> Self {
        Self {
            speaker: Some(speaker.clone()),
            content: content.into(),
            whisper: Vec::new(),
            action: None,
        }
    }

    pub fn whisper(to: Vec<UserId>, content: impl Into<String>) -> Self {
        Self {
            speaker: None,
            content: content.into(),
            whisper: to,
            action: None,
        }
    }

    pub fn with_action(mut self, action: ChatAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn is_whisper(&self) -> bool {
        !self.whisper.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warn,
    Error,
}
