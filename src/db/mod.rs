pub mod analytics;
pub mod chat;
pub mod files;
pub mod followups;
pub mod helpers;
pub mod profile;
pub mod users;
pub mod wearables;
