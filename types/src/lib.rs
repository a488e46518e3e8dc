//! Types shared between the Alembic core and its front ends.

pub mod formatting;
mod settings;
mod view;

pub use settings::{AlembicSettings, DEFAULT_ITEMS_BONUS, DEFAULT_VIALS_BONUS};
pub use view::{FormulaBookView, KnownFormula, PreparedItem, TrackerView};
