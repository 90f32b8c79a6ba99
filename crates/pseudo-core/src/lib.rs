//! Core of the pseudo chat client: backend client, transcript model,
//! conversation controller and configuration. No terminal dependencies.

pub mod api;
pub mod config;
pub mod conversation;
pub mod logging;
pub mod media;
pub mod session;
pub mod transcript;
