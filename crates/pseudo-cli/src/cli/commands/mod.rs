pub mod chat;
pub mod chats;
pub mod config;
pub mod exec;
pub mod models;
