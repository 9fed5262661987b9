//! CLI command implementations.

mod chat;
mod config;
mod doctor;
mod run;
mod serve;
mod tools;

pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use run::run_bot;
pub use serve::run_serve;
pub use tools::run_tools;
