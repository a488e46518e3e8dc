//! Versatile Vial counter.
//!
//! The count lives in the quantity of a single inventory record. Every
//! operation re-reads that record right before computing a delta, so a change
//! made elsewhere between render and click is never overwritten.

use std::num::NonZeroU32;
use std::sync::Arc;

use alembic_types::formatting;

use crate::capacity::{Capacity, SharedSettings};
use crate::error::{AlembicError, Result};
use crate::host::{
    ActorId, ChatMessage, Host, ItemPatch, ItemRecord, TemplateRef, bound_character,
};

pub const VERSATILE_VIAL_NAME: &str = "Versatile Vial";
pub const VERSATILE_VIAL_SOURCE: &str = "Compendium.pf2e.equipment-srd.Item.ljT5pe8D7rudJqus";

/// Point-in-time reading of the vial pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VialReading {
    /// Quantity clamped to `max`
    pub current: u32,
    pub max: u32,
}

impl VialReading {
    pub fn room(&self) -> u32 {
        self.max.saturating_sub(self.current)
    }
}

pub fn is_versatile_vial(item: &ItemRecord) -> bool {
    item.name == VERSATILE_VIAL_NAME
        || item
            .source_id
            .as_ref()
            .is_some_and(|s| s.as_str() == VERSATILE_VIAL_SOURCE)
}

#[derive(Debug)]
pub struct VialCounter<H> {
    host: Arc<H>,
    settings: SharedSettings,
}

impl<H: Host> VialCounter<H> {
    pub fn new(host: Arc<H>, settings: SharedSettings) -> Self {
        Self { host, settings }
    }

    async fn find_vial(&self, actor: &ActorId) -> Result<Option<ItemRecord>> {
        let items = self.host.items(actor).await?;
        Ok(items.into_iter().find(is_versatile_vial))
    }

    async fn read(&self, actor: &ActorId) -> Result<(Option<ItemRecord>, VialReading)> {
        let vial = self.find_vial(actor).await?;
        let max = Capacity::for_actor(&*self.host, &self.settings, actor)
            .await?
            .max_vials;
        let quantity = vial.as_ref().map_or(0, |v| v.quantity);
        Ok((
            vial,
            VialReading {
                current: quantity.min(max),
                max,
            },
        ))
    }

    /// Current and maximum vials for the bound character.
    pub async fn reading(&self) -> Result<VialReading> {
        let actor = bound_character(&*self.host).await?;
        Ok(self.read(&actor.id).await?.1)
    }

    pub async fn current(&self) -> Result<u32> {
        Ok(self.reading().await?.current)
    }

    pub async fn max(&self) -> Result<u32> {
        Ok(self.reading().await?.max)
    }

    /// Add one vial. Fails with `CapacityExceeded` when already at max.
    pub async fn increment(&self) -> Result<u32> {
        let actor = bound_character(&*self.host).await?;
        let (vial, reading) = self.read(&actor.id).await?;
        if reading.current >= reading.max {
            return Err(AlembicError::vials_full(reading.max));
        }
        self.adjust(&actor.id, vial, 1).await?;
        self.log(&actor.id, formatting::vial_added()).await;
        Ok(reading.current + 1)
    }

    /// Use one vial. Fails with `Empty` at zero; the record is deleted
    /// rather than left at quantity zero.
    pub async fn decrement(&self) -> Result<u32> {
        let actor = bound_character(&*self.host).await?;
        let (vial, reading) = self.read(&actor.id).await?;
        if reading.current == 0 {
            return Err(AlembicError::Empty);
        }
        self.adjust(&actor.id, vial, -1).await?;
        self.log(&actor.id, formatting::vial_removed()).await;
        Ok(reading.current - 1)
    }

    /// Add up to `quantity` vials, bounded by the free room. Returns how many
    /// were added.
    pub async fn add(&self, quantity: u32) -> Result<u32> {
        let actor = bound_character(&*self.host).await?;
        let (vial, reading) = self.read(&actor.id).await?;
        let to_add = quantity.min(reading.room());
        if to_add == 0 {
            return Err(AlembicError::vials_full(reading.max));
        }
        self.adjust(&actor.id, vial, i64::from(to_add)).await?;
        self.log(&actor.id, formatting::vials_added(to_add)).await;
        Ok(to_add)
    }

    /// Fill the pool to max in one write. Returns the number added (0 if full).
    pub async fn refill_to_max(&self) -> Result<u32> {
        let actor = bound_character(&*self.host).await?;
        let (vial, reading) = self.read(&actor.id).await?;
        let shortfall = reading.room();
        if shortfall == 0 {
            return Ok(0);
        }
        self.adjust(&actor.id, vial, i64::from(shortfall)).await?;
        self.log(&actor.id, formatting::vials_refilled(reading.max)).await;
        tracing::info!(actor = %actor.id, added = shortfall, "Refilled vials");
        Ok(shortfall)
    }

    /// Override the vial maximum, or with `None` go back to the intelligence
    /// formula. Inventory is left alone; reads clamp.
    pub async fn set_max(&self, max: Option<NonZeroU32>) {
        self.settings.write().await.versatile_vials = max.map_or(0, NonZeroU32::get);
    }

    async fn adjust(&self, actor: &ActorId, vial: Option<ItemRecord>, delta: i64) -> Result<()> {
        match vial {
            Some(vial) => {
                let quantity = i64::from(vial.quantity) + delta;
                if quantity > 0 {
                    let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
                    self.host
                        .update_items(actor, vec![ItemPatch { id: vial.id, quantity }])
                        .await?;
                } else {
                    self.host.delete_items(actor, vec![vial.id]).await?;
                }
            }
            None if delta > 0 => {
                let source = TemplateRef::from(VERSATILE_VIAL_SOURCE);
                let template = self
                    .host
                    .resolve(&source)
                    .await
                    .ok_or(AlembicError::TemplateNotFound(source))?;
                let quantity = u32::try_from(delta).unwrap_or(u32::MAX);
                self.host
                    .create_items(actor, vec![template.instantiate(quantity)])
                    .await?;
            }
            None => {}
        }
        tracing::debug!(actor = %actor, delta, "Adjusted vial quantity");
        Ok(())
    }

    async fn log(&self, actor: &ActorId, content: String) {
        self.host.post(ChatMessage::public(actor, content)).await;
    }
}

#[cfg(test)]
mod tests {
    use alembic_types::AlembicSettings;

    use super::*;
    use crate::capacity;
    use crate::host::{Ability, ActorSummary, ItemTemplate, MemoryHost};

    fn vial_template() -> ItemTemplate {
        ItemTemplate {
            uuid: TemplateRef::from(VERSATILE_VIAL_SOURCE),
            name: VERSATILE_VIAL_NAME.to_string(),
            item_type: "consumable".to_string(),
            level: 1,
            traits: vec!["alchemical".to_string()],
            is_alchemical: true,
            crafted_item: None,
            description: String::new(),
            img: None,
        }
    }

    /// Host with one bound actor whose modifier gives `int_mod + 2` vials.
    fn setup(int_mod: i32) -> (Arc<MemoryHost>, VialCounter<MemoryHost>, ActorId) {
        let host = Arc::new(MemoryHost::new());
        let actor = ActorId::from("alchemist");
        host.add_actor(ActorSummary {
            id: actor.clone(),
            name: "Quill".to_string(),
            has_player_owner: true,
            owners: vec![],
        });
        host.set_modifier(&actor, Ability::Int, int_mod);
        host.set_active(Some(actor.clone()));
        host.add_template(vial_template());
        let counter = VialCounter::new(
            Arc::clone(&host),
            capacity::shared(AlembicSettings::default()),
        );
        (host, counter, actor)
    }

    fn vial_quantity(host: &MemoryHost, actor: &ActorId) -> Option<u32> {
        host.items_of(actor)
            .iter()
            .find(|i| is_versatile_vial(i))
            .map(|i| i.quantity)
    }

    #[tokio::test]
    async fn increment_stops_at_max() {
        let (host, counter, actor) = setup(2);
        for expected in 1..=4 {
            assert_eq!(counter.increment().await.unwrap(), expected);
            assert_eq!(counter.current().await.unwrap(), expected);
        }
        let err = counter.increment().await.unwrap_err();
        assert!(matches!(err, AlembicError::CapacityExceeded { limit: 4, .. }));
        assert_eq!(counter.current().await.unwrap(), 4);
        assert_eq!(vial_quantity(&host, &actor), Some(4));
    }

    #[tokio::test]
    async fn first_increment_materializes_record() {
        let (host, counter, actor) = setup(0);
        assert_eq!(vial_quantity(&host, &actor), None);
        counter.increment().await.unwrap();
        let items = host.items_of(&actor);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 1);
        assert_eq!(
            items[0].source_id.as_ref().map(TemplateRef::as_str),
            Some(VERSATILE_VIAL_SOURCE)
        );
    }

    #[tokio::test]
    async fn decrement_from_one_deletes_record() {
        let (host, counter, actor) = setup(2);
        counter.increment().await.unwrap();
        assert_eq!(counter.decrement().await.unwrap(), 0);
        assert_eq!(vial_quantity(&host, &actor), None);
        assert_eq!(counter.current().await.unwrap(), 0);
        assert!(matches!(counter.decrement().await, Err(AlembicError::Empty)));
    }

    #[tokio::test]
    async fn bounds_hold_for_mixed_sequence() {
        let (_host, counter, _actor) = setup(1);
        let ops = [true, true, true, true, false, true, false, false, false, false, true];
        for up in ops {
            let _ = if up {
                counter.increment().await
            } else {
                counter.decrement().await
            };
            let reading = counter.reading().await.unwrap();
            assert!(reading.current <= reading.max);
        }
    }

    #[tokio::test]
    async fn external_edit_is_reread_before_write() {
        let (host, counter, actor) = setup(3);
        counter.increment().await.unwrap();
        let id = host.items_of(&actor)[0].id.clone();

        // Another client bumps the same record
        host.set_quantity(&actor, &id, 4);
        counter.increment().await.unwrap();
        assert_eq!(vial_quantity(&host, &actor), Some(5));

        let err = counter.increment().await.unwrap_err();
        assert!(matches!(err, AlembicError::CapacityExceeded { limit: 5, .. }));
    }

    #[tokio::test]
    async fn over_capacity_record_reads_clamped() {
        let (host, counter, actor) = setup(0);
        counter.increment().await.unwrap();
        let id = host.items_of(&actor)[0].id.clone();
        host.set_quantity(&actor, &id, 9);
        assert_eq!(counter.current().await.unwrap(), 2);
        assert!(counter.increment().await.is_err());
    }

    #[tokio::test]
    async fn refill_writes_once_and_logs_once() {
        let (host, counter, actor) = setup(2);
        counter.increment().await.unwrap();
        let before = host.chat_log().len();

        assert_eq!(counter.refill_to_max().await.unwrap(), 3);
        assert_eq!(vial_quantity(&host, &actor), Some(4));
        let chat = host.chat_log();
        assert_eq!(chat.len(), before + 1);
        assert_eq!(
            chat.last().unwrap().content,
            "Refilled Versatile Vials to maximum capacity (4)."
        );

        assert_eq!(counter.refill_to_max().await.unwrap(), 0);
        assert_eq!(host.chat_log().len(), before + 1);
    }

    #[tokio::test]
    async fn add_is_bounded_by_room() {
        let (_host, counter, _actor) = setup(1);
        assert_eq!(counter.add(2).await.unwrap(), 2);
        assert_eq!(counter.add(2).await.unwrap(), 1);
        assert!(matches!(
            counter.add(2).await,
            Err(AlembicError::CapacityExceeded { limit: 3, .. })
        ));
    }

    #[tokio::test]
    async fn set_max_only_changes_reads() {
        let (host, counter, actor) = setup(2);
        counter.refill_to_max().await.unwrap();
        counter.set_max(NonZeroU32::new(2)).await;
        assert_eq!(counter.max().await.unwrap(), 2);
        assert_eq!(counter.current().await.unwrap(), 2);
        assert_eq!(vial_quantity(&host, &actor), Some(4));
    }

    #[tokio::test]
    async fn clearing_max_falls_back_to_intelligence() {
        let (_host, counter, _actor) = setup(2);
        counter.set_max(NonZeroU32::new(9)).await;
        assert_eq!(counter.max().await.unwrap(), 9);
        counter.set_max(None).await;
        assert_eq!(counter.max().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn unbound_character_short_circuits() {
        let (host, counter, _actor) = setup(2);
        host.set_active(None);
        assert!(matches!(
            counter.increment().await,
            Err(AlembicError::MissingActor)
        ));
        assert!(host.chat_log().is_empty());
    }
}
