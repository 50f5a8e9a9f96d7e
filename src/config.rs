//! Process configuration
//!
//! Everything tunable comes from environment variables, read once at
//! startup and passed down explicitly — the completion endpoint is not
//! baked into the code that calls it. Unparseable values fall back to
//! defaults with a warning rather than refusing to start.

use std::env;
use std::time::Duration;

use tracing::warn;

use crate::llm::LlmConfig;
use crate::plan::UnknownActionPolicy;

pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub llm: LlmConfig,
    pub unknown_action_policy: UnknownActionPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: DEFAULT_PORT,
            llm: LlmConfig::default(),
            unknown_action_policy: UnknownActionPolicy::default(),
        }
    }
}

impl Config {
    /// Read configuration from the environment.
    ///
    /// Variables: `PORT`, `LLM_BASE_URL`, `LLM_API_KEY`, `LLM_MODEL`,
    /// `LLM_TIMEOUT_SECS`, `UNKNOWN_ACTION_POLICY` (`skip` | `reject`).
    pub fn from_env() -> Config {
        let mut config = Config::default();

        if let Ok(port) = env::var("PORT") {
            match port.parse() {
                Ok(port) => config.port = port,
                Err(_) => warn!(value = %port, "invalid PORT, using {}", DEFAULT_PORT),
            }
        }
        if let Ok(base_url) = env::var("LLM_BASE_URL") {
            config.llm.base_url = base_url;
        }
        if let Ok(api_key) = env::var("LLM_API_KEY") {
            config.llm.api_key = api_key;
        }
        if let Ok(model) = env::var("LLM_MODEL") {
            config.llm.model = model;
        }
        if let Ok(timeout) = env::var("LLM_TIMEOUT_SECS") {
            match timeout.parse() {
                Ok(secs) => config.llm.timeout = Duration::from_secs(secs),
                Err(_) => warn!(value = %timeout, "invalid LLM_TIMEOUT_SECS, using default"),
            }
        }
        if let Ok(policy) = env::var("UNKNOWN_ACTION_POLICY") {
            match UnknownActionPolicy::from_name(&policy) {
                Some(policy) => config.unknown_action_policy = policy,
                None => warn!(value = %policy, "invalid UNKNOWN_ACTION_POLICY, using skip"),
            }
        }

        config
    }
}
