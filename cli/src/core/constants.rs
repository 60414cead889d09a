// =============================================================================
// Application Identity
// =============================================================================

/// Binary name
pub const APP_NAME: &str = "oi-bridge";

// =============================================================================
// Environment Variables - Logging
// =============================================================================

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "OI_BRIDGE_LOG";

/// Log filter when neither `OI_BRIDGE_LOG` nor `RUST_LOG` is set
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Log filter when debug mode is on and no filter is set
pub const DEBUG_LOG_FILTER: &str = "debug";
