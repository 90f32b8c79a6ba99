//! Feature slices: each owns its state, update logic and rendering.

pub mod chat;
pub mod input;
pub mod transcript;
