//! Core application infrastructure

pub mod cli;
pub mod constants;

pub use crate::app::BridgeApp;
pub use cli::CliConfig;
