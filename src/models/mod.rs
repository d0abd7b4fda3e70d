pub mod analytics;
pub mod auth;
pub mod chat;
pub mod common;
pub mod file;
pub mod followup;
pub mod llm;
pub mod profile;
pub mod user;
pub mod wearable;
