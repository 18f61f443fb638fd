//! Gateway configuration. Load from TOML file or environment.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Global application configuration for the gateway binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Application identity shown in logs and status output.
    pub app_name: String,
    /// HTTP port for the gateway.
    pub port: u16,
    /// Base directory for Sled data (tenant store path is derived from this).
    pub storage_path: String,
    /// Generation mode: "mock" (default, no network I/O) or "live".
    pub llm_mode: String,
    /// OpenAI-compatible API base URL, e.g. `https://api.groq.com/openai/v1`.
    #[serde(default)]
    pub llm_base_url: String,
    /// Model identifier passed to the completions endpoint.
    #[serde(default)]
    pub llm_model: String,
    /// Upper bound for one outbound generation call.
    #[serde(default = "default_llm_timeout")]
    pub llm_timeout_secs: u64,
}

fn default_llm_timeout() -> u64 {
    30
}

impl GatewayConfig {
    /// Load config from file and environment. Precedence: env `BISTRO_CONFIG`
    /// path > `config/gateway.toml` > defaults; `BISTRO`-prefixed environment
    /// variables override everything.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("BISTRO_CONFIG").unwrap_or_else(|_| "config/gateway".to_string());
        let builder = config::Config::builder()
            .set_default("app_name", "Bistro Gateway")?
            .set_default("port", 8004_i64)?
            .set_default("storage_path", "./data")?
            .set_default("llm_mode", "mock")?
            .set_default("llm_base_url", "")?
            .set_default("llm_model", "")?
            .set_default("llm_timeout_secs", 30_i64)?;

        let path = Path::new(&config_path);
        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(config::Environment::with_prefix("BISTRO").separator("__"))
            .build()?;

        built.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_a_config_file() {
        let cfg = GatewayConfig::load().unwrap();
        assert_eq!(cfg.llm_mode, "mock");
        assert_eq!(cfg.llm_timeout_secs, 30);
        assert!(cfg.port > 0);
    }
}
