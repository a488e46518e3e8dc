//! Daily preparations: a bounded queue of craftable items that become
//! infused inventory records on commit.

mod queue;


pub use queue::{CommitOutcome, PreparationQueue};
