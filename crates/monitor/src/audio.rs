//! Alarm sound playback

use alerting::AlarmKind;
use dms::AlarmPlayer;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tracing::{info, warn};

use crate::settings::AlarmSettings;
use crate::MonitorError;

/// Verified alarm sounds plus an optional external player
pub struct SoundBank {
    sleep: PathBuf,
    yawn: PathBuf,
    command: Option<String>,
}

impl SoundBank {
    /// Check that every alarm sound exists before monitoring starts
    pub fn load(settings: &AlarmSettings) -> Result<Self, MonitorError> {
        for path in [&settings.sleep_sound, &settings.yawn_sound] {
            if !path.is_file() {
                return Err(MonitorError::ResourceNotFound(path.clone()));
            }
        }
        info!(
            "Loaded alarm sounds: sleep={}, yawn={}",
            settings.sleep_sound.display(),
            settings.yawn_sound.display()
        );

        Ok(Self {
            sleep: settings.sleep_sound.clone(),
            yawn: settings.yawn_sound.clone(),
            command: settings.player_command.clone(),
        })
    }

    pub fn sound_for(&self, kind: AlarmKind) -> &Path {
        match kind {
            AlarmKind::Sleep => &self.sleep,
            AlarmKind::Yawn => &self.yawn,
        }
    }
}

impl AlarmPlayer for SoundBank {
    fn play(&mut self, kind: AlarmKind) {
        let sound = self.sound_for(kind).to_path_buf();
        info!(alarm = %kind, sound = %sound.display(), "Playing alarm");

        let Some(command) = &self.command else {
            return;
        };

        let spawned = tokio::process::Command::new(command)
            .arg(&sound)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        if let Err(e) = spawned {
            warn!(alarm = %kind, "Failed to start alarm player '{}': {}", command, e);
        }
    }
}
