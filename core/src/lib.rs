pub mod capacity;
pub mod context;
pub mod drag;
pub mod error;
pub mod events;
pub mod expiration;
pub mod formulas;
pub mod host;
pub mod preparations;
pub mod registry;
pub mod tracker;
pub mod vials;

#[cfg(test)]
mod test_support;

// Re-exports for convenience
pub use capacity::Capacity;
pub use context::SettingsStore;
pub use error::{AlembicError, Resource, Result};
pub use events::{Action, HostEvent};
pub use formulas::FormulaRegistry;
pub use preparations::{CommitOutcome, PreparationQueue};
pub use registry::{Registry, TRACKER_KEY};
pub use tracker::Alembic;
pub use vials::{VialCounter, VialReading};
