use clap::Parser;

use std::path::PathBuf;

use oi_bridge::TranslatorConfig;

use super::constants::APP_NAME;

#[derive(Parser)]
#[command(name = APP_NAME)]
#[command(
    version,
    about = "Translate OpenLLMetry span attributes to OpenInference",
    long_about = None
)]
pub struct Cli {
    /// JSON file holding one attribute object (reads stdin when omitted)
    pub input: Option<PathBuf>,

    /// Log every translation step to stderr
    #[arg(long)]
    pub debug: bool,

    /// Keep indexed keys dotted instead of rewriting them as `key[0]`
    #[arg(long)]
    pub disable_brackets: bool,
}

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    pub input: Option<PathBuf>,
    pub debug: bool,
    pub disable_brackets: bool,
}

impl CliConfig {
    /// Layer the command-line switches over a base config. A switch can only
    /// turn a flag on.
    pub fn translator_config(&self, base: TranslatorConfig) -> TranslatorConfig {
        base.with_debug(base.debug || self.debug)
            .with_disable_brackets(base.disable_brackets || self.disable_brackets)
    }
}

impl From<Cli> for CliConfig {
    fn from(cli: Cli) -> Self {
        Self {
            input: cli.input,
            debug: cli.debug,
            disable_brackets: cli.disable_brackets,
        }
    }
}

/// Parse CLI arguments
pub fn parse() -> CliConfig {
    Cli::parse().into()
}
