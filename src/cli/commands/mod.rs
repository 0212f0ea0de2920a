//! CLI command implementations

pub mod add;
pub mod automate;
pub mod completions;
pub mod config;
pub mod delete;
pub mod export;
pub mod list;
pub mod report;
pub mod set;
pub mod shell;
pub mod show;
