//! Core application

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use oi_bridge::{OutputAttributes, SourceAttributes, TranslatorConfig, translate};
use serde_json::Value as JsonValue;

use crate::core::cli::{self, CliConfig};
use crate::core::constants::{DEBUG_LOG_FILTER, DEFAULT_LOG_FILTER, ENV_LOG};

pub struct BridgeApp;

impl BridgeApp {
    /// Run the application with CLI argument parsing
    pub fn run() -> Result<()> {
        dotenvy::dotenv().ok();

        let cli = cli::parse();
        let config = cli.translator_config(TranslatorConfig::from_env());
        Self::init_logging(config.debug);

        tracing::debug!(input = ?cli.input, ?config, "Translating attributes");

        let rendered = Self::execute(&cli, &config)?;
        println!("{rendered}");
        Ok(())
    }

    fn execute(cli: &CliConfig, config: &TranslatorConfig) -> Result<String> {
        let raw = read_input(cli.input.as_deref())?;
        let source = parse_source(&raw)?;
        let out = translate(&source, config);
        tracing::debug!(input_keys = source.len(), output_keys = out.len(), "Translation done");
        render(&out)
    }

    fn init_logging(debug: bool) {
        let default_filter = if debug {
            DEBUG_LOG_FILTER
        } else {
            DEFAULT_LOG_FILTER
        };

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| default_filter.to_string());

        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }
}

/// Read the input document from `path`, or from stdin when no path is given.
pub(crate) fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file {}", path.display())),
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read input from stdin")?;
            Ok(raw)
        }
    }
}

/// Parse the input document. It must be a single JSON object.
pub(crate) fn parse_source(raw: &str) -> Result<SourceAttributes> {
    let value: JsonValue = serde_json::from_str(raw).context("Input is not valid JSON")?;
    match value {
        JsonValue::Object(map) => Ok(map),
        JsonValue::Array(_) => bail!("Input must be a JSON object, got an array"),
        other => bail!("Input must be a JSON object, got {other}"),
    }
}

/// Pretty-print the translated attributes with two-space indentation.
pub(crate) fn render(out: &OutputAttributes) -> Result<String> {
    serde_json::to_string_pretty(out).context("Failed to serialize output")
}
