//! Shared fixtures for the async test suites.

use std::sync::Arc;

use crate::host::{
    Ability, ActorId, ActorSummary, ItemTemplate, MemoryHost, NewItem, TemplateRef, UserId,
};
use crate::vials::{VERSATILE_VIAL_NAME, VERSATILE_VIAL_SOURCE};

pub const ELIXIR: &str = "Compendium.pf2e.equipment-srd.Item.elixir-of-life-minor";
pub const BOMB: &str = "Compendium.pf2e.equipment-srd.Item.alchemists-fire-lesser";
pub const TORCH: &str = "Compendium.pf2e.equipment-srd.Item.torch";
pub const BOMB_FORMULA: &str = "Compendium.pf2e.equipment-srd.Item.formula-alchemists-fire";

pub fn alchemist() -> ActorId {
    ActorId::from("alchemist")
}

pub fn fighter() -> ActorId {
    ActorId::from("fighter")
}

pub fn template(uuid: &str, name: &str, item_type: &str) -> ItemTemplate {
    ItemTemplate {
        uuid: TemplateRef::from(uuid),
        name: name.to_string(),
        item_type: item_type.to_string(),
        level: 1,
        traits: vec!["alchemical".to_string(), "consumable".to_string()],
        is_alchemical: true,
        crafted_item: None,
        description: String::new(),
        img: None,
    }
}

/// Bound alchemist with the given intelligence modifier, a player-owned
/// fighter, and the standard templates.
pub fn world(int_mod: i32) -> Arc<MemoryHost> {
    let host = MemoryHost::new();
    host.add_actor(ActorSummary {
        id: alchemist(),
        name: "Quill".to_string(),
        has_player_owner: true,
        owners: vec![UserId::from("user-quill")],
    });
    host.add_actor(ActorSummary {
        id: fighter(),
        name: "Brakka".to_string(),
        has_player_owner: true,
        owners: vec![UserId::from("user-brakka")],
    });
    host.set_modifier(&alchemist(), Ability::Int, int_mod);
    host.set_active(Some(alchemist()));

    host.add_template(template(VERSATILE_VIAL_SOURCE, VERSATILE_VIAL_NAME, "consumable"));
    host.add_template(template(ELIXIR, "Elixir of Life (Minor)", "consumable"));
    host.add_template(template(BOMB, "Alchemist's Fire (Lesser)", "weapon"));
    let mut torch = template(TORCH, "Torch", "equipment");
    torch.is_alchemical = false;
    torch.traits.clear();
    host.add_template(torch);
    let mut formula = template(BOMB_FORMULA, "Formula: Alchemist's Fire (Lesser)", "formula");
    formula.crafted_item = Some(TemplateRef::from(BOMB));
    formula.description = "Craft it with @Check[crafting|dc:15] in a workshop.".to_string();
    host.add_template(formula);

    Arc::new(host)
}

/// An infused record already sitting in `owner`'s inventory.
pub fn infused(name: &str, quantity: u32, creator: &ActorId) -> NewItem {
    NewItem {
        name: name.to_string(),
        item_type: "consumable".to_string(),
        quantity,
        traits: vec![],
        source_id: None,
        creator: None,
    }
    .infused_by(creator)
}
