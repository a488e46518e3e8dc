//! Daily preparation queue.
//!
//! Entries move `Pending -> Spawned` on commit (and disappear on the rest-cycle
//! sweep), or `Pending -> Removed` when the user drops them. The queue owns
//! only this bookkeeping; quantities always come from the host.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use alembic_types::{PreparedItem, formatting};

use crate::capacity::{Capacity, SharedSettings};
use crate::drag::DropData;
use crate::error::{AlembicError, Result};
use crate::host::{
    ActorId, ChatMessage, Host, InventoryBatch, ItemPatch, ItemTemplate, TemplateRef,
    bound_character,
};

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Timestamp id with a process-wide sequence suffix, unique even within one
/// millisecond.
fn next_preparation_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{millis:x}-{seq:x}")
}

/// Items moved to spawned by a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    pub committed: Vec<PreparedItem>,
    /// Pending entries left over for lack of capacity
    pub remaining: usize,
}

/// One template's share of a commit.
#[derive(Debug)]
struct Group {
    source: TemplateRef,
    count: u32,
}

fn group_by_template(items: &[PreparedItem]) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    for item in items {
        match groups.iter_mut().find(|g| g.source.as_str() == item.source_ref) {
            Some(group) => group.count += 1,
            None => groups.push(Group {
                source: TemplateRef::new(item.source_ref.clone()),
                count: 1,
            }),
        }
    }
    groups
}

#[derive(Debug)]
pub struct PreparationQueue<H> {
    host: Arc<H>,
    settings: SharedSettings,
    pending: Vec<PreparedItem>,
    spawned: Vec<PreparedItem>,
}

impl<H: Host> PreparationQueue<H> {
    pub fn new(host: Arc<H>, settings: SharedSettings) -> Self {
        Self {
            host,
            settings,
            pending: Vec::new(),
            spawned: Vec::new(),
        }
    }

    pub fn pending(&self) -> &[PreparedItem] {
        &self.pending
    }

    pub fn spawned(&self) -> &[PreparedItem] {
        &self.spawned
    }

    /// Pending plus spawned.
    pub fn used(&self) -> usize {
        self.pending.len() + self.spawned.len()
    }

    async fn max_items(&self, actor: &ActorId) -> Result<u32> {
        Ok(Capacity::for_actor(&*self.host, &self.settings, actor)
            .await?
            .max_items)
    }

    async fn template(&self, source: &TemplateRef) -> Result<ItemTemplate> {
        self.host
            .resolve(source)
            .await
            .ok_or_else(|| AlembicError::TemplateNotFound(source.clone()))
    }

    /// Append a pending preparation. Returns the new entry's id.
    pub async fn enqueue(&mut self, name: &str, source: &TemplateRef) -> Result<String> {
        let actor = bound_character(&*self.host).await?;
        let max = self.max_items(&actor.id).await?;
        if self.used() >= max as usize {
            return Err(AlembicError::preparations_full(max));
        }
        let template = self.template(source).await?;

        let item = PreparedItem {
            id: next_preparation_id(),
            name: name.to_string(),
            source_ref: source.to_string(),
            is_alchemical: template.is_alchemical,
        };
        tracing::debug!(id = %item.id, name = %item.name, "Queued preparation");
        let id = item.id.clone();
        self.pending.push(item);
        Ok(id)
    }

    /// Enqueue from a drag payload. Formulas for non-consumables enqueue the
    /// item they craft.
    pub async fn accept_drop(&mut self, payload: &str) -> Result<Option<String>> {
        let data = DropData::parse(payload)?;
        if !data.is_item() && !data.is_formula {
            tracing::debug!(kind = %data.kind, "Ignoring drop of unsupported type");
            return Ok(None);
        }
        let dropped = self.template(&data.uuid).await?;
        let name = match (&dropped.crafted_item, data.is_formula) {
            (Some(crafted), true) if !dropped.is_consumable() => {
                let crafted = self.template(crafted).await?;
                return self.enqueue(&crafted.name, &crafted.uuid).await.map(Some);
            }
            _ => dropped.name,
        };
        self.enqueue(&name, &data.uuid).await.map(Some)
    }

    /// Drop a pending entry. Unknown ids are ignored.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.pending.len();
        self.pending.retain(|item| item.id != id);
        before != self.pending.len()
    }

    /// Materialize as many pending entries as capacity allows, in queue order.
    ///
    /// The queue only advances after the host accepts the whole batch.
    pub async fn commit(&mut self) -> Result<CommitOutcome> {
        let actor = bound_character(&*self.host).await?;
        if self.pending.is_empty() {
            return Err(AlembicError::NothingToCommit);
        }
        let max = self.max_items(&actor.id).await?;
        let available = (max as usize).saturating_sub(self.spawned.len());
        let take = self.pending.len().min(available);
        if take == 0 {
            return Err(AlembicError::preparations_full(max));
        }

        let batch = self.build_batch(&actor.id, &self.pending[..take]).await?;
        self.host
            .apply_batch(&actor.id, batch)
            .await
            .map_err(AlembicError::CommitFailed)?;

        let committed: Vec<PreparedItem> = self.pending.drain(..take).collect();
        self.spawned.extend(committed.iter().cloned());
        let names = committed.iter().map(|item| item.name.as_str());
        self.host
            .post(ChatMessage::public(&actor.id, formatting::infused_created(names)))
            .await;
        tracing::info!(actor = %actor.id, count = committed.len(), "Committed preparations");

        Ok(CommitOutcome {
            committed,
            remaining: self.pending.len(),
        })
    }

    async fn build_batch(&self, actor: &ActorId, items: &[PreparedItem]) -> Result<InventoryBatch> {
        let inventory = self.host.items(actor).await?;
        let mut batch = InventoryBatch::default();

        for group in group_by_template(items) {
            let template = self.template(&group.source).await?;
            let existing = inventory.iter().find(|record| {
                record.name == template.name
                    && record.item_type == template.item_type
                    && record.is_infused()
            });

            match existing {
                Some(record) => match batch.updates.iter_mut().find(|p| p.id == record.id) {
                    Some(patch) => patch.quantity += group.count,
                    None => batch.updates.push(ItemPatch {
                        id: record.id.clone(),
                        quantity: record.quantity + group.count,
                    }),
                },
                None => batch
                    .creates
                    .push(template.instantiate(group.count).infused_by(actor)),
            }
        }
        Ok(batch)
    }

    /// Start a new day: forget pending and spawned entries. Materialized
    /// records are left for the expiration sweep.
    pub fn reset_daily(&mut self) {
        self.pending.clear();
        self.spawned.clear();
    }
}
