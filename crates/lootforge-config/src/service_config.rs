// crates/lootforge-config/src/service_config.rs
// ============================================================================
// Module: Service Configuration
// Description: Resolves the HTTP service's bind host/port and output root
//   from environment.
// Purpose: Give `lootforge-service` one place that reads
//   `LOOTFORGE_SERVICE_{HOST,PORT,OUT}` (§6).
// Dependencies: none
// ============================================================================

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use crate::env::EnvSource;

// ============================================================================
// SECTION: Config
// ============================================================================

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8787;

/// Resolved service bind address and default output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Default output root used when a request omits one.
    pub out: PathBuf,
}

/// Resolves the service configuration from `env`, falling back to
/// `127.0.0.1:8787` and the current directory.
#[must_use]
pub fn resolve(env: &dyn EnvSource) -> ServiceConfig {
    ServiceConfig {
        host: env.get("LOOTFORGE_SERVICE_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: env.get("LOOTFORGE_SERVICE_PORT").and_then(|value| value.parse().ok()).unwrap_or(DEFAULT_PORT),
        out: env.get("LOOTFORGE_SERVICE_OUT").map_or_else(|| PathBuf::from("."), PathBuf::from),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Test-only assertions are permitted to unwrap.")]
mod tests {
    use std::path::PathBuf;

    use super::resolve;
    use crate::env::FixedEnv;

    #[test]
    fn defaults_apply_when_unset() {
        let env = FixedEnv::new();
        let config = resolve(&env);
        assert_eq!(config.port, 8787);
        assert_eq!(config.out, PathBuf::from("."));
    }

    #[test]
    fn environment_overrides_defaults() {
        let mut env = FixedEnv::new();
        env.set("LOOTFORGE_SERVICE_PORT", "9090");
        env.set("LOOTFORGE_SERVICE_HOST", "0.0.0.0");
        let config = resolve(&env);
        assert_eq!(config.port, 9090);
        assert_eq!(config.host, "0.0.0.0");
    }
}
