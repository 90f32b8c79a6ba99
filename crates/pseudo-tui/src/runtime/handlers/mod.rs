//! Effect handlers for the TUI runtime.
//!
//! Handlers are plain async functions that perform one backend call and
//! return the `UiEvent` describing its outcome. They never touch state; the
//! runtime spawns them and routes the result through the inbox.

mod chat;
mod history;
mod media;
mod models;

pub use chat::send_chat;
pub use history::{chat_delete, chat_list_load, chat_load};
pub use media::media_save;
pub use models::models_load;
