pub mod api;
pub mod config_store;
pub mod credentials;
pub mod error;
pub mod interval;
pub mod orchestrator;
pub mod search;
pub mod settings;
pub mod updater;
pub mod utils;
