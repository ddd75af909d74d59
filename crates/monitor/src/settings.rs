//! Runtime settings
//!
//! Layered as: built-in defaults, then an optional config file, then
//! `FATIGUE__`-prefixed environment variables (`__` separates sections).

use dms::DmsConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::MonitorError;

/// Config file consulted when `FATIGUE_MONITOR_CONFIG` is unset
pub const DEFAULT_CONFIG_NAME: &str = "fatigue-monitor";

/// Environment variable naming an alternative config file
pub const CONFIG_PATH_VAR: &str = "FATIGUE_MONITOR_CONFIG";

/// Top-level settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub dms: DmsConfig,
    pub alarms: AlarmSettings,
    pub replay: ReplaySettings,
    pub log: LogSettings,
}

/// Alarm sound resources
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlarmSettings {
    pub sleep_sound: PathBuf,
    pub yawn_sound: PathBuf,
    /// Program invoked with the sound path to play an alarm
    pub player_command: Option<String>,
}

impl Default for AlarmSettings {
    fn default() -> Self {
        Self {
            sleep_sound: PathBuf::from("sounds/sleep_alarm.mp3"),
            yawn_sound: PathBuf::from("sounds/drowsy_alarm.mp3"),
            player_command: None,
        }
    }
}

/// Recorded landmark input
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplaySettings {
    /// JSON-lines file, one frame per line
    pub path: PathBuf,
    /// Frame rate used for pacing and for frames without a timestamp
    pub fps: u32,
    /// Pace frames in real time against the monotonic clock; otherwise
    /// replay as fast as possible on recorded time
    pub realtime: bool,
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("landmarks.jsonl"),
            fps: 15,
            realtime: true,
        }
    }
}

impl ReplaySettings {
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }
}

/// Logging output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl LogSettings {
    pub fn max_level(&self) -> Option<tracing::Level> {
        self.level.parse().ok()
    }
}

impl Settings {
    /// Load from the default config file location and the environment
    pub fn load() -> Result<Self, MonitorError> {
        let path =
            std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_NAME.to_string());
        Self::load_from(&path)
    }

    /// Load from `path` (extension optional, file optional) and the environment
    pub fn load_from(path: &str) -> Result<Self, MonitorError> {
        let settings: Settings = layered(path)?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), MonitorError> {
        self.dms.validate()?;
        if self.replay.fps == 0 {
            return Err(MonitorError::Settings("replay.fps must be positive".into()));
        }
        if self.log.max_level().is_none() {
            return Err(MonitorError::Settings(format!(
                "unknown log level '{}'",
                self.log.level
            )));
        }
        Ok(())
    }
}

/// Raw file + environment layers, before deserialization
fn layered(path: &str) -> Result<config::Config, MonitorError> {
    let config = config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .add_source(
            config::Environment::with_prefix("FATIGUE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    Ok(config)
}
