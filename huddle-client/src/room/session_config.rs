use crate::error::ConfigError;
use std::env;
use std::time::Duration;

/// Per-room tuning of the membership protocol.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Pause between joining and the `Announce` broadcast.
    pub settle_delay: Duration,
    /// Ask the relay for reliable control channels.
    pub reliable_control: bool,
}

impl SessionConfig {
    /// Defaults overridden by `HUDDLE_SETTLE_DELAY_MS` and
    /// `HUDDLE_RELIABLE_CONTROL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(value) = env::var("HUDDLE_SETTLE_DELAY_MS") {
            let millis = value.parse::<u64>().map_err(|_| ConfigError::Invalid {
                key: "HUDDLE_SETTLE_DELAY_MS",
                value,
            })?;
            config.settle_delay = Duration::from_millis(millis);
        }

        if let Ok(value) = env::var("HUDDLE_RELIABLE_CONTROL") {
            config.reliable_control = match value.as_str() {
                "1" | "true" => true,
                "0" | "false" => false,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "HUDDLE_RELIABLE_CONTROL",
                        value,
                    });
                }
            };
        }

        Ok(config)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(500),
            reliable_control: false,
        }
    }
}
