use alembic_types::AlembicSettings;

use crate::host::{ActorId, ItemId, TemplateRef};

/// Host-side happenings the tracker reacts to.
///
/// The embedding layer forwards these over a channel handed to
/// [`crate::tracker::Alembic::run`]; the tracker registers no listeners of
/// its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// Game clock moved to `world_time` (seconds).
    WorldTimeAdvanced { world_time: u64 },

    ActorUpdated {
        actor: ActorId,
        /// The known formula list was part of the change
        formulas_changed: bool,
    },

    ItemUpdated { actor: ActorId, item: ItemId },

    /// A character finished a full night's rest.
    RestForTheNight { actor: ActorId },

    /// Settings were saved from a settings surface.
    SettingsChanged(AlembicSettings),
}

/// User-initiated entry points exposed to the UI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    UseVial,
    AddVial,
    /// Button on the ten-minute prompt card
    AddVials(u32),
    RefillVials,
    Enqueue { name: String, source: TemplateRef },
    /// JSON drag payload dropped on the preparation list
    DropOnTracker(String),
    RemovePending(String),
    Commit,
    ResetDaily,
    /// JSON drag payload dropped on the formula book
    DropOnFormulaBook(String),
    ForgetFormula(TemplateRef),
    /// Post a formula's info card to chat
    ShareFormula(TemplateRef),
}
