//! Contract with the game host.
//!
//! The tracker never owns authoritative inventory state. Everything it knows
//! about quantities comes from these traits, and every change goes back
//! through them:
//!
//! ```text
//! ┌──────────────┐  items / roster / modifiers  ┌─────────────────┐
//! │ ActorProvider│ ───────────────────────────▶ │                 │
//! ├──────────────┤                              │  VialCounter    │
//! │TemplateResolv│ ───── templates ───────────▶ │  Preparation    │
//! ├──────────────┤                              │  Queue, Sweep   │
//! │InventoryClien│ ◀──── create/update/delete ─ │                 │
//! ├──────────────┤                              │                 │
//! │NotificationSi│ ◀──── chat log / notices ─── │                 │
//! └──────────────┘                              └─────────────────┘
//! ```

mod memory;
mod model;

use std::future::Future;

use thiserror::Error;

pub use memory::{ActorSeed, MemoryHost, WorldSeed};
pub use model::{
    Ability, ActorId, ActorSummary, ChatAction, ChatMessage, FormulaEntry, INFUSED_TRAIT,
    InventoryBatch, ItemId, ItemPatch, ItemRecord, ItemTemplate, NewItem, NoticeLevel,
    TemplateRef, UserId,
};

use crate::error::{AlembicError, Result};

/// Failures reported by the host's document layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
    #[error("host rejected the write: {0}")]
    Rejected(String),

    #[error("unknown actor {0}")]
    UnknownActor(ActorId),

    #[error("unknown item {0}")]
    UnknownItem(ItemId),
}

/// Read access to characters and their inventories.
pub trait ActorProvider: Send + Sync {
    /// The character bound to the current user, if any.
    fn active_character(&self) -> impl Future<Output = Option<ActorSummary>> + Send;

    /// Every character in the campaign.
    fn roster(&self) -> impl Future<Output = Vec<ActorSummary>> + Send;

    fn items(
        &self,
        actor: &ActorId,
    ) -> impl Future<Output = Result<Vec<ItemRecord>, HostError>> + Send;

    fn ability_modifier(
        &self,
        actor: &ActorId,
        ability: Ability,
    ) -> impl Future<Output = Result<i32, HostError>> + Send;

    fn in_combat(&self) -> impl Future<Output = bool> + Send;

    fn known_formulas(
        &self,
        actor: &ActorId,
    ) -> impl Future<Output = Result<Vec<FormulaEntry>, HostError>> + Send;
}

/// Write access to inventories. Each call is atomic on its own.
pub trait InventoryClient: Send + Sync {
    fn create_items(
        &self,
        actor: &ActorId,
        items: Vec<NewItem>,
    ) -> impl Future<Output = Result<Vec<ItemId>, HostError>> + Send;

    fn update_items(
        &self,
        actor: &ActorId,
        patches: Vec<ItemPatch>,
    ) -> impl Future<Output = Result<(), HostError>> + Send;

    fn delete_items(
        &self,
        actor: &ActorId,
        ids: Vec<ItemId>,
    ) -> impl Future<Output = Result<(), HostError>> + Send;

    /// Apply updates and creates together: both land or neither does.
    fn apply_batch(
        &self,
        actor: &ActorId,
        batch: InventoryBatch,
    ) -> impl Future<Output = Result<(), HostError>> + Send;

    fn set_known_formulas(
        &self,
        actor: &ActorId,
        formulas: Vec<FormulaEntry>,
    ) -> impl Future<Output = Result<(), HostError>> + Send;
}

pub trait TemplateResolver: Send + Sync {
    fn resolve(
        &self,
        reference: &TemplateRef,
    ) -> impl Future<Output = Option<ItemTemplate>> + Send;
}

pub trait NotificationSink: Send + Sync {
    /// Post to the shared chat log (or whisper, see [`ChatMessage::whisper`]).
    fn post(&self, message: ChatMessage) -> impl Future<Output = ()> + Send;

    /// Toast-style notice shown only to the local user.
    fn notify(&self, level: NoticeLevel, text: String) -> impl Future<Output = ()> + Send;
}

/// Everything the tracker needs from the game host.
pub trait Host: ActorProvider + InventoryClient + TemplateResolver + NotificationSink {}

impl<T> Host for T where T: ActorProvider + InventoryClient + TemplateResolver + NotificationSink {}

/// The bound character, or [`AlembicError::MissingActor`].
pub async fn bound_character<H: ActorProvider>(host: &H) -> Result<ActorSummary> {
    host.active_character()
        .await
        .ok_or(AlembicError::MissingActor)
}
