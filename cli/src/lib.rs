//! Command-line front end for the `oi-bridge` translator.

mod app;
pub mod core;
