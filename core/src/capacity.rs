//! Capacity resolution: explicit override first, then the intelligence formula.
//!
//! Nothing here is cached. Every caller resolves afresh so a changed modifier
//! or override is visible on the very next read.

use std::sync::Arc;

use alembic_types::{AlembicSettings, DEFAULT_ITEMS_BONUS, DEFAULT_VIALS_BONUS};
use tokio::sync::RwLock;

use crate::error::Result;
use crate::host::{Ability, ActorId, ActorProvider};

/// Settings shared by every component of one tracker.
pub type SharedSettings = Arc<RwLock<AlembicSettings>>;

pub fn shared(settings: AlembicSettings) -> SharedSettings {
    Arc::new(RwLock::new(settings))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacity {
    pub int_mod: i32,
    pub max_vials: u32,
    pub max_items: u32,
}

impl Capacity {
    pub fn resolve(settings: &AlembicSettings, int_mod: i32) -> Self {
        Self {
            int_mod,
            max_vials: settings
                .vials_override()
                .unwrap_or_else(|| formula(int_mod, DEFAULT_VIALS_BONUS)),
            max_items: settings
                .items_override()
                .unwrap_or_else(|| formula(int_mod, DEFAULT_ITEMS_BONUS)),
        }
    }

    /// Attribute-derived values, ignoring any override.
    ///
    /// With no character bound the modifier counts as zero.
    pub fn defaults(int_mod: Option<i32>) -> Self {
        Self::resolve(&AlembicSettings::default(), int_mod.unwrap_or(0))
    }

    /// Read the actor's intelligence modifier and resolve against `settings`.
    pub async fn for_actor<H: ActorProvider>(
        host: &H,
        settings: &SharedSettings,
        actor: &ActorId,
    ) -> Result<Self> {
        let int_mod = host.ability_modifier(actor, Ability::Int).await?;
        let settings = *settings.read().await;
        Ok(Self::resolve(&settings, int_mod))
    }
}

fn formula(modifier: i32, bonus: i32) -> u32 {
    u32::try_from(modifier + bonus).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formula_applies_without_overrides() {
        let cap = Capacity::resolve(&AlembicSettings::default(), 3);
        assert_eq!(cap.max_vials, 5);
        assert_eq!(cap.max_items, 7);
    }

    #[test]
    fn overrides_short_circuit_independently() {
        let settings = AlembicSettings {
            versatile_vials: 10,
            daily_preparations: 0,
        };
        let cap = Capacity::resolve(&settings, 1);
        assert_eq!(cap.max_vials, 10);
        assert_eq!(cap.max_items, 5);
    }

    #[test]
    fn negative_modifier_floors_at_zero() {
        let cap = Capacity::resolve(&AlembicSettings::default(), -5);
        assert_eq!(cap.max_vials, 0);
        assert_eq!(cap.max_items, 0);
    }

    #[test]
    fn defaults_without_character() {
        let cap = Capacity::defaults(None);
        assert_eq!((cap.max_vials, cap.max_items), (2, 4));
    }
}
