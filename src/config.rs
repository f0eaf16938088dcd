use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::channels::Channel;
use crate::telegram::DEFAULT_API_BASE;

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// JSON file for scheduled publications.
    pub schedule_store: Option<String>,

    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub channels: Vec<Channel>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Pause between channels when posting to several at once.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
            delay_ms: default_delay_ms(),
        }
    }
}

impl TelegramConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_delay_ms() -> u64 {
    1000
}
