use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub web: WebConfig,
    pub passes: PassesConfig,
    pub tracking: TrackingConfig,
    pub notify: NotifyConfig,
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        WebConfig {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PassesConfig {
    pub base_folder: PathBuf,
}

impl Default for PassesConfig {
    fn default() -> Self {
        PassesConfig {
            base_folder: PathBuf::from("passes"),
        }
    }
}

/// Tuning knobs for the executor and the rotor simulation. Durations are
/// given in humantime form ("3s", "500ms").
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// How close to its start time a pass is handed to a tracker.
    #[serde(deserialize_with = "de_duration")]
    pub lookahead: Duration,
    /// Idle delay between scheduler passes over its launch condition.
    #[serde(deserialize_with = "de_duration")]
    pub scheduler_poll: Duration,
    /// Wait granularity between pre-positioning and the pass start.
    #[serde(deserialize_with = "de_duration")]
    pub pre_start_poll: Duration,
    /// Tick interval while a pass is active and inside the dead band.
    #[serde(deserialize_with = "de_duration")]
    pub active_poll: Duration,
    /// Per-axis drift, in degrees, that triggers a corrective seek.
    pub dead_band_deg: f64,
    /// Size of one simulated slew increment, in degrees.
    pub slew_step_deg: f64,
    /// Delay per slew increment.
    #[serde(deserialize_with = "de_duration")]
    pub slew_pacing: Duration,
    /// Extra attempts a failed seek gets before the pass is given up.
    pub seek_retries: u32,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        TrackingConfig {
            lookahead: Duration::from_secs(60),
            scheduler_poll: Duration::from_secs(3),
            pre_start_poll: Duration::from_secs(1),
            active_poll: Duration::from_secs(1),
            dead_band_deg: 1.0,
            slew_step_deg: 0.1,
            slew_pacing: Duration::from_millis(10),
            seek_retries: 3,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Slack incoming-webhook URL. Notifications are disabled when unset.
    pub slack_webhook_url: Option<String>,
    /// Time of day (UTC, "HH:MM") for the daily schedule digest.
    pub daily_digest_utc: Option<String>,
}

fn de_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
}
