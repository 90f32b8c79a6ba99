//! Chat feature slice: the open conversation and the actions on it.
//!
//! - `state.rs`: `ChatState` (conversation plus focus)
//! - `update.rs`: send, regenerate, switch model, navigate, cancel, and
//!   applying backend results

mod state;
mod update;

pub use state::ChatState;
pub use update::*;
