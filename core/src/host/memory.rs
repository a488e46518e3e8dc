//! In-process host backed by plain collections.
//!
//! Used by the test suites and the CLI. Writes can be switched to fail, for
//! everyone or for one actor, so the rollback paths can be exercised.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Deserialize;

use super::{
    Ability, ActorId, ActorProvider, ActorSummary, ChatMessage, FormulaEntry, HostError,
    InventoryBatch, InventoryClient, ItemId, ItemPatch, ItemRecord, ItemTemplate, NewItem,
    NoticeLevel, NotificationSink, TemplateRef, TemplateResolver, UserId,
};

/// Serialized starting state for a [`MemoryHost`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WorldSeed {
    pub active: Option<ActorId>,
    pub in_combat: bool,
    #[serde(rename = "actor")]
    pub actors: Vec<ActorSeed>,
    #[serde(rename = "template")]
    pub templates: Vec<ItemTemplate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActorSeed {
    pub id: ActorId,
    pub name: String,
    #[serde(default)]
    pub has_player_owner: bool,
    #[serde(default)]
    pub owners: Vec<UserId>,
    #[serde(default)]
    pub abilities: HashMap<Ability, i32>,
    #[serde(default)]
    pub items: Vec<NewItem>,
    #[serde(default)]
    pub formulas: Vec<FormulaEntry>,
}

#[derive(Debug, Default)]
struct ActorEntry {
    summary: Option<ActorSummary>,
    abilities: HashMap<Ability, i32>,
    items: Vec<ItemRecord>,
    formulas: Vec<FormulaEntry>,
}

#[derive(Debug, Default)]
struct World {
    active: Option<ActorId>,
    in_combat: bool,
    actors: BTreeMap<ActorId, ActorEntry>,
    templates: HashMap<TemplateRef, ItemTemplate>,
    chat: Vec<ChatMessage>,
    notices: Vec<(NoticeLevel, String)>,
    next_item: u64,
    /// Actors whose inventories reject writes
    read_only: HashSet<ActorId>,
}

impl World {
    fn actor_mut(&mut self, id: &ActorId) -> Result<&mut ActorEntry, HostError> {
        self.actors
            .get_mut(id)
            .ok_or_else(|| HostError::UnknownActor(id.clone()))
    }

    fn materialize(&mut self, item: NewItem) -> ItemRecord {
        self.next_item += 1;
        ItemRecord {
            id: ItemId(format!("item-{}", self.next_item)),
            name: item.name,
            item_type: item.item_type,
            quantity: item.quantity,
            traits: item.traits,
            source_id: item.source_id,
            creator: item.creator,
        }
    }

    fn insert_items(&mut self, actor: &ActorId, items: Vec<NewItem>) -> Result<Vec<ItemId>, HostError> {
        self.actor_mut(actor)?;
        let records: Vec<ItemRecord> = items.into_iter().map(|i| self.materialize(i)).collect();
        let ids = records.iter().map(|r| r.id.clone()).collect();
        self.actor_mut(actor)?.items.extend(records);
        Ok(ids)
    }
}

#[derive(Debug, Default)]
pub struct MemoryHost {
    world: Mutex<World>,
    fail_writes: AtomicBool,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: WorldSeed) -> Self {
        let host = Self::new();
        for actor in seed.actors {
            let summary = ActorSummary {
                id: actor.id.clone(),
                name: actor.name,
                has_player_owner: actor.has_player_owner,
                owners: actor.owners,
            };
            host.add_actor(summary);
            for (ability, modifier) in actor.abilities {
                host.set_modifier(&actor.id, ability, modifier);
            }
            for item in actor.items {
                host.give_item(&actor.id, item);
            }
            host.world().actors.entry(actor.id).or_default().formulas = actor.formulas;
        }
        for template in seed.templates {
            host.add_template(template);
        }
        {
            let mut world = host.world();
            world.in_combat = seed.in_combat;
            world.active = seed.active;
        }
        host
    }

    fn world(&self) -> MutexGuard<'_, World> {
        self.world.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_writable(&self, actor: &ActorId) -> Result<(), HostError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(HostError::Rejected("writes are disabled".to_string()));
        }
        if self.world().read_only.contains(actor) {
            return Err(HostError::Rejected(format!("{actor} is read-only")));
        }
        Ok(())
    }

    // ─── Setup helpers ──────────────────────────────────────────────────────

    pub fn add_actor(&self, summary: ActorSummary) {
        let mut world = self.world();
        let entry = world.actors.entry(summary.id.clone()).or_default();
        entry.summary = Some(summary);
    }

    pub fn set_active(&self, actor: Option<ActorId>) {
        self.world().active = actor;
    }

    pub fn set_modifier(&self, actor: &ActorId, ability: Ability, modifier: i32) {
        let mut world = self.world();
        world
            .actors
            .entry(actor.clone())
            .or_default()
            .abilities
            .insert(ability, modifier);
    }

    pub fn set_in_combat(&self, in_combat: bool) {
        self.world().in_combat = in_combat;
    }

    pub fn add_template(&self, template: ItemTemplate) {
        self.world().templates.insert(template.uuid.clone(), template);
    }

    /// Place an item directly into an inventory, bypassing write failures.
    pub fn give_item(&self, actor: &ActorId, item: NewItem) -> ItemId {
        let mut world = self.world();
        let record = world.materialize(item);
        let id = record.id.clone();
        world.actors.entry(actor.clone()).or_default().items.push(record);
        id
    }

    /// Overwrite a record's quantity as another client would.
    pub fn set_quantity(&self, actor: &ActorId, item: &ItemId, quantity: u32) {
        let mut world = self.world();
        if let Some(entry) = world.actors.get_mut(actor)
            && let Some(record) = entry.items.iter_mut().find(|r| &r.id == item)
        {
            record.quantity = quantity;
        }
    }

    /// Make every subsequent write fail with [`HostError::Rejected`].
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Reject writes to one actor only; other inventories stay writable.
    pub fn fail_writes_for(&self, actor: &ActorId) {
        self.world().read_only.insert(actor.clone());
    }

    // ─── Inspection ─────────────────────────────────────────────────────────

    pub fn items_of(&self, actor: &ActorId) -> Vec<ItemRecord> {
        self.world()
            .actors
            .get(actor)
            .map(|a| a.items.clone())
            .unwrap_or_default()
    }

    pub fn formulas_of(&self, actor: &ActorId) -> Vec<FormulaEntry> {
        self.world()
            .actors
            .get(actor)
            .map(|a| a.formulas.clone())
            .unwrap_or_default()
    }

    pub fn chat_log(&self) -> Vec<ChatMessage> {
        self.world().chat.clone()
    }

    pub fn notices(&self) -> Vec<(NoticeLevel, String)> {
        self.world().notices.clone()
    }

    /// Drain chat and notices (CLI prints them after each command).
    pub fn take_output(&self) -> (Vec<ChatMessage>, Vec<(NoticeLevel, String)>) {
        let mut world = self.world();
        (
            std::mem::take(&mut world.chat),
            std::mem::take(&mut world.notices),
        )
    }
}

impl ActorProvider for MemoryHost {
    async fn active_character(&self) -> Option<ActorSummary> {
        let world = self.world();
        let id = world.active.as_ref()?;
        world.actors.get(id)?.summary.clone()
    }

    async fn roster(&self) -> Vec<ActorSummary> {
        self.world()
            .actors
            .values()
            .filter_map(|a| a.summary.clone())
            .collect()
    }

    async fn items(&self, actor: &ActorId) -> Result<Vec<ItemRecord>, HostError> {
        self.world()
            .actors
            .get(actor)
            .map(|a| a.items.clone())
            .ok_or_else(|| HostError::UnknownActor(actor.clone()))
    }

    async fn ability_modifier(&self, actor: &ActorId, ability: Ability) -> Result<i32, HostError> {
        self.world()
            .actors
            .get(actor)
            .map(|a| a.abilities.get(&ability).copied().unwrap_or(0))
            .ok_or_else(|| HostError::UnknownActor(actor.clone()))
    }

    async fn in_combat(&self) -> bool {
        self.world().in_combat
    }

    async fn known_formulas(&self, actor: &ActorId) -> Result<Vec<FormulaEntry>, HostError> {
        self.world()
            .actors
            .get(actor)
            .map(|a| a.formulas.clone())
            .ok_or_else(|| HostError::UnknownActor(actor.clone()))
    }
}

impl InventoryClient for MemoryHost {
    async fn create_items(&self, actor: &ActorId, items: Vec<NewItem>) -> Result<Vec<ItemId>, HostError> {
        self.check_writable(actor)?;
        self.world().insert_items(actor, items)
    }

    async fn update_items(&self, actor: &ActorId, patches: Vec<ItemPatch>) -> Result<(), HostError> {
        self.check_writable(actor)?;
        let mut world = self.world();
        let entry = world.actor_mut(actor)?;
        if let Some(missing) = patches
            .iter()
            .find(|p| !entry.items.iter().any(|r| r.id == p.id))
        {
            return Err(HostError::UnknownItem(missing.id.clone()));
        }
        for patch in patches {
            if let Some(record) = entry.items.iter_mut().find(|r| r.id == patch.id) {
                record.quantity = patch.quantity;
            }
        }
        Ok(())
    }

    async fn delete_items(&self, actor: &ActorId, ids: Vec<ItemId>) -> Result<(), HostError> {
        self.check_writable(actor)?;
        let mut world = self.world();
        let entry = world.actor_mut(actor)?;
        if let Some(missing) = ids.iter().find(|id| !entry.items.iter().any(|r| &r.id == *id)) {
            return Err(HostError::UnknownItem(missing.clone()));
        }
        entry.items.retain(|r| !ids.contains(&r.id));
        Ok(())
    }

    async fn apply_batch(&self, actor: &ActorId, batch: InventoryBatch) -> Result<(), HostError> {
        self.check_writable(actor)?;
        let mut world = self.world();
        {
            let entry = world.actor_mut(actor)?;
            if let Some(missing) = batch
                .updates
                .iter()
                .find(|p| !entry.items.iter().any(|r| r.id == p.id))
            {
                return Err(HostError::UnknownItem(missing.id.clone()));
            }
            for patch in &batch.updates {
                if let Some(record) = entry.items.iter_mut().find(|r| r.id == patch.id) {
                    record.quantity = patch.quantity;
                }
            }
        }
        world.insert_items(actor, batch.creates)?;
        Ok(())
    }

    async fn set_known_formulas(&self, actor: &ActorId, formulas: Vec<FormulaEntry>) -> Result<(), HostError> {
        self.check_writable(actor)?;
        self.world().actor_mut(actor)?.formulas = formulas;
        Ok(())
    }
}

impl TemplateResolver for MemoryHost {
    async fn resolve(&self, reference: &TemplateRef) -> Option<ItemTemplate> {
        self.world().templates.get(reference).cloned()
    }
}

impl NotificationSink for MemoryHost {
    async fn post(&self, message: ChatMessage) {
        self.world().chat.push(message);
    }

    async fn notify(&self, level: NoticeLevel, text: String) {
        self.world().notices.push((level, text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn potion(quantity: u32) -> NewItem {
        NewItem {
            name: "Potion".to_string(),
            item_type: "consumable".to_string(),
            quantity,
            traits: vec![],
            source_id: None,
            creator: None,
        }
    }

    fn host_with_actor() -> (MemoryHost, ActorId) {
        let host = MemoryHost::new();
        let id = ActorId::from("a1");
        host.add_actor(ActorSummary {
            id: id.clone(),
            name: "Quill".to_string(),
            has_player_owner: true,
            owners: vec![],
        });
        (host, id)
    }

    #[tokio::test]
    async fn batch_with_unknown_update_changes_nothing() {
        let (host, actor) = host_with_actor();
        let existing = host.give_item(&actor, potion(1));

        let batch = InventoryBatch {
            updates: vec![
                ItemPatch {
                    id: existing.clone(),
                    quantity: 5,
                },
                ItemPatch {
                    id: ItemId::from("missing"),
                    quantity: 1,
                },
            ],
            creates: vec![potion(2)],
        };
        let err = host.apply_batch(&actor, batch).await.unwrap_err();
        assert_eq!(err, HostError::UnknownItem(ItemId::from("missing")));

        let items = host.items_of(&actor);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 1);
    }

    #[tokio::test]
    async fn disabled_writes_are_rejected() {
        let (host, actor) = host_with_actor();
        host.fail_writes(true);
        assert!(matches!(
            host.create_items(&actor, vec![potion(1)]).await,
            Err(HostError::Rejected(_))
        ));
        assert!(host.items_of(&actor).is_empty());

        // Setup helpers still work
        host.give_item(&actor, potion(1));
        assert_eq!(host.items_of(&actor).len(), 1);
    }

    #[tokio::test]
    async fn read_only_actor_leaves_others_writable() {
        let (host, actor) = host_with_actor();
        let other = ActorId::from("other");
        host.fail_writes_for(&other);

        host.create_items(&actor, vec![potion(1)]).await.unwrap();
        assert!(matches!(
            host.create_items(&other, vec![potion(1)]).await,
            Err(HostError::Rejected(_))
        ));
        assert_eq!(host.items_of(&actor).len(), 1);
    }

    #[tokio::test]
    async fn active_character_requires_known_actor() {
        let (host, actor) = host_with_actor();
        assert!(host.active_character().await.is_none());
        host.set_active(Some(ActorId::from("nobody")));
        assert!(host.active_character().await.is_none());
        host.set_active(Some(actor.clone()));
        assert_eq!(host.active_character().await.map(|a| a.id), Some(actor));
    }

    #[test]
    fn seed_uses_singular_table_names() {
        let seed: WorldSeed = serde_json::from_str(
            r#"{
                "active": "a1",
                "actor": [{
                    "id": "a1",
                    "name": "Quill",
                    "abilities": { "int": 3 },
                    "items": [{ "name": "Potion", "item_type": "consumable", "quantity": 2 }]
                }],
                "template": [{ "uuid": "t1", "name": "Elixir", "item_type": "consumable" }]
            }"#,
        )
        .unwrap();
        let host = MemoryHost::from_seed(seed);
        let actor = ActorId::from("a1");
        assert_eq!(host.items_of(&actor)[0].quantity, 2);
        assert_eq!(host.world().actors[&actor].abilities[&Ability::Int], 3);
        assert!(host.world().templates.contains_key(&TemplateRef::from("t1")));
    }
}
