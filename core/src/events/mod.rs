pub mod signal;

pub use signal::{Action, HostEvent};
