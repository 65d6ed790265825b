//! State machine module
//!
//! Application state, the actions that change it, and the reducer.

mod actions;
mod state;
mod transitions;

pub use actions::{Action, ActionKind};
pub use state::{ActiveView, AppState};
pub use transitions::{reduce, StateTransition, Store};
