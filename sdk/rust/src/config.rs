//! Translator configuration.
//!
//! Two boolean switches, read from the environment at call time and then
//! threaded into the translator as a plain value.

/// Environment variable enabling per-step debug events.
pub const ENV_DEBUG: &str = "OI_BRIDGE_DEBUG";

/// Environment variable disabling bracket-notation rewriting.
pub const ENV_DISABLE_BRACKETS: &str = "OI_BRIDGE_DISABLE_BRACKETS";

/// Switches that alter translator behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslatorConfig {
    /// Emit a `tracing` debug event for every pipeline step.
    pub debug: bool,
    /// Keep indexed keys dotted (`foo.0.bar`) instead of `foo[0].bar`.
    pub disable_brackets: bool,
}

impl TranslatorConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |name: &str| lookup(name).is_some_and(|v| is_truthy(&v));
        Self {
            debug: flag(ENV_DEBUG),
            disable_brackets: flag(ENV_DISABLE_BRACKETS),
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_disable_brackets(mut self, disable: bool) -> Self {
        self.disable_brackets = disable;
        self
    }
}

/// Interpret a flag value. `"0"`, `""`, `"false"` and `"no"` (any case) are
/// false, everything else is true.
pub fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    !(value.is_empty()
        || value == "0"
        || value.eq_ignore_ascii_case("false")
        || value.eq_ignore_ascii_case("no"))
}
