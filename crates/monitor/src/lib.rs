//! Driver Fatigue Monitor Runtime
//!
//! Wires the fatigue core to its collaborators: recorded landmarks in,
//! alarm sounds and structured logs out.

pub mod audio;
pub mod replay;
pub mod settings;

pub use audio::SoundBank;
pub use replay::{RecordedFrame, RecordedLandmarks, ReplaySource};
pub use settings::{AlarmSettings, LogSettings, ReplaySettings, Settings};

use alerting::AlarmKind;
use dms::provider::ManualClock;
use dms::{Clock, DmsError, FatigueMonitor, FatigueStatus, FrameAnalysis, MonotonicClock};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Runtime error types
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Resource not found: {}", .0.display())]
    ResourceNotFound(PathBuf),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid settings: {0}")]
    Settings(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed replay frame at line {line}: {source}")]
    Replay {
        line: usize,
        source: serde_json::Error,
    },

    #[error("Recorded time {t}s at line {line} is out of range")]
    ReplayTime { line: usize, t: f64 },

    #[error(transparent)]
    Dms(#[from] DmsError),
}

/// Totals over one monitoring run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub frames: usize,
    pub faces: usize,
    pub skipped_faces: usize,
    pub alarms: BTreeMap<String, usize>,
    pub peak_status: FatigueStatus,
}

impl RunSummary {
    fn record(&mut self, analysis: &FrameAnalysis) {
        self.frames += 1;
        self.faces += analysis.faces.len();
        self.skipped_faces += analysis.skipped_faces;
        for kind in analysis.alarms() {
            *self.alarms.entry(kind.to_string()).or_default() += 1;
        }
        self.peak_status = self.peak_status.max(analysis.most_severe());
    }

    pub fn alarm_count(&self, kind: AlarmKind) -> usize {
        self.alarms.get(kind.as_str()).copied().unwrap_or_default()
    }
}

/// Initialize logging
pub fn init_logging(settings: &LogSettings) {
    let level = settings.max_level().unwrap_or(Level::INFO);

    if settings.json {
        let subscriber = FmtSubscriber::builder()
            .json()
            .with_max_level(level)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
    }
}

/// Single monitoring session over one replay source
struct Session {
    monitor: FatigueMonitor,
    provider: RecordedLandmarks,
    player: SoundBank,
    summary: RunSummary,
    shown: FatigueStatus,
}

impl Session {
    fn step<C: Clock>(&mut self, frame: &RecordedFrame, clock: &C) -> Result<(), MonitorError> {
        let analysis =
            self.monitor
                .process_frame(&mut self.provider, frame, clock, &mut self.player)?;
        self.summary.record(&analysis);

        // frames without faces keep the last rendered status
        if analysis.face_detected() {
            let status = analysis.most_severe();
            if status != self.shown {
                let face = analysis.most_severe_face().map(|f| f.face_id);
                info!(status = %status, face = ?face, "{}", status.message());
                self.shown = status;
            }
        }
        Ok(())
    }
}

/// Run the monitor over the configured replay until the input ends or
/// Ctrl-C is received
pub async fn run(settings: Settings) -> Result<RunSummary, MonitorError> {
    settings.validate()?;

    let player = SoundBank::load(&settings.alarms)?;
    let mut source = ReplaySource::open(&settings.replay.path)?;
    let mut session = Session {
        monitor: FatigueMonitor::new(settings.dms.clone())?,
        provider: RecordedLandmarks,
        player,
        summary: RunSummary::default(),
        shown: FatigueStatus::Normal,
    };

    let period = settings.replay.frame_period();
    if settings.replay.realtime {
        run_realtime(&mut session, &mut source, period).await?;
    } else {
        run_offline(&mut session, &mut source, period)?;
    }

    info!("Monitoring finished: {:?}", session.summary);
    Ok(session.summary)
}

async fn run_realtime<R: std::io::BufRead>(
    session: &mut Session,
    source: &mut ReplaySource<R>,
    period: Duration,
) -> Result<(), MonitorError> {
    let clock = MonotonicClock;
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                warn!("Interrupted, stopping monitor");
                return Ok(());
            }
            _ = ticker.tick() => {}
        }

        let Some(frame) = source.next_frame()? else {
            return Ok(());
        };
        session.step(&frame, &clock)?;
    }
}

fn run_offline<R: std::io::BufRead>(
    session: &mut Session,
    source: &mut ReplaySource<R>,
    period: Duration,
) -> Result<(), MonitorError> {
    let start = Instant::now();
    let clock = ManualClock::new(start);
    let mut last = Duration::ZERO;

    while let Some(frame) = source.next_frame()? {
        let line = source.line();
        // recorded time wins; otherwise one frame period after the last one
        let offset = match frame.t {
            Some(t) => Duration::try_from_secs_f64(t).ok(),
            None if session.summary.frames == 0 => Some(Duration::ZERO),
            None => last.checked_add(period),
        };
        let t = frame
            .t
            .unwrap_or(last.as_secs_f64() + period.as_secs_f64());
        let out_of_range = move || MonitorError::ReplayTime { line, t };
        let offset = offset.ok_or_else(out_of_range)?;

        if offset < last {
            warn!(line, "Recorded time went backwards, holding clock");
        }
        last = offset.max(last);
        let now = start.checked_add(last).ok_or_else(out_of_range)?;
        clock.set(now);
        session.step(&frame, &clock)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dms::{DetectedFace, FaceBbox, Point2D};
    use std::io::Write;
    use std::path::Path;

    /// 68 points whose eyes have `ear` and whose mouth has `mar`
    fn landmarks(ear: f64, mar: f64) -> Vec<Point2D> {
        let mut points = vec![Point2D::default(); 68];
        let eye = |dx: f64| {
            let h = ear / 2.0;
            [
                Point2D::new(dx, 0.0),
                Point2D::new(dx + 0.33, h),
                Point2D::new(dx + 0.66, h),
                Point2D::new(dx + 0.33, -h),
                Point2D::new(dx + 0.66, -h),
                Point2D::new(dx + 1.0, 0.0),
            ]
        };
        for (slot, p) in [36, 37, 38, 41, 40, 39].into_iter().zip(eye(0.0)) {
            points[slot] = p;
        }
        for (slot, p) in [42, 43, 44, 47, 46, 45].into_iter().zip(eye(2.0)) {
            points[slot] = p;
        }
        let h = mar / 2.0;
        points[48] = Point2D::new(0.0, -2.0);
        points[54] = Point2D::new(1.0, -2.0);
        points[50] = Point2D::new(0.3, -2.0 + h);
        points[58] = Point2D::new(0.3, -2.0 - h);
        points[52] = Point2D::new(0.7, -2.0 + h);
        points[56] = Point2D::new(0.7, -2.0 - h);
        points
    }

    fn frame(t: Option<f64>, ear: f64, mar: f64) -> RecordedFrame {
        RecordedFrame {
            t,
            faces: vec![DetectedFace {
                bbox: FaceBbox::new(100.0, 80.0, 200.0, 200.0),
                landmarks: landmarks(ear, mar),
            }],
        }
    }

    fn write_replay(dir: &Path, frames: &[RecordedFrame]) -> PathBuf {
        let path = dir.join("session.jsonl");
        let mut file = std::fs::File::create(&path).unwrap();
        for frame in frames {
            writeln!(file, "{}", serde_json::to_string(frame).unwrap()).unwrap();
        }
        path
    }

    fn settings(dir: &Path, replay: PathBuf) -> Settings {
        let sleep = dir.join("sleep.mp3");
        let yawn = dir.join("yawn.mp3");
        std::fs::write(&sleep, b"ID3").unwrap();
        std::fs::write(&yawn, b"ID3").unwrap();
        Settings {
            alarms: AlarmSettings {
                sleep_sound: sleep,
                yawn_sound: yawn,
                player_command: None,
            },
            replay: ReplaySettings {
                path: replay,
                fps: 10,
                realtime: false,
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_offline_sleep_session() {
        let dir = tempfile::tempdir().unwrap();
        // 100ms per frame from the configured fps; closed between 1.0s and 3.5s
        let frames: Vec<RecordedFrame> = (0..60)
            .map(|i| {
                let ear = if (10..=35).contains(&i) { 0.15 } else { 0.9 };
                frame(None, ear, 0.3)
            })
            .collect();
        let replay = write_replay(dir.path(), &frames);

        let summary = run(settings(dir.path(), replay)).await.unwrap();

        assert_eq!(summary.frames, 60);
        assert_eq!(summary.faces, 60);
        assert_eq!(summary.alarm_count(AlarmKind::Sleep), 1);
        assert_eq!(summary.alarm_count(AlarmKind::Yawn), 0);
        assert_eq!(summary.peak_status, FatigueStatus::SleepDanger);
    }

    #[tokio::test]
    async fn test_offline_recorded_time_and_empty_frames() {
        let dir = tempfile::tempdir().unwrap();
        let mut frames = vec![frame(Some(0.0), 0.9, 0.9)];
        frames.push(RecordedFrame {
            t: Some(0.5),
            faces: Vec::new(),
        });
        frames.push(frame(Some(6.0), 0.9, 0.9));
        frames.push(frame(Some(12.0), 0.9, 0.9));
        let replay = write_replay(dir.path(), &frames);

        let summary = run(settings(dir.path(), replay)).await.unwrap();

        assert_eq!(summary.frames, 4);
        assert_eq!(summary.faces, 3);
        // yawning never stops, so the status is never left and re-entered
        assert_eq!(summary.alarm_count(AlarmKind::Yawn), 1);
        assert_eq!(summary.peak_status, FatigueStatus::YawnWarning);
    }

    #[tokio::test]
    async fn test_malformed_landmarks_counted() {
        let dir = tempfile::tempdir().unwrap();
        let mut bad = frame(None, 0.9, 0.3);
        bad.faces[0].landmarks.truncate(20);
        let replay = write_replay(dir.path(), &[frame(None, 0.9, 0.3), bad]);

        let summary = run(settings(dir.path(), replay)).await.unwrap();
        assert_eq!(summary.faces, 1);
        assert_eq!(summary.skipped_faces, 1);
    }

    #[tokio::test]
    async fn test_missing_sound_fails_before_replay() {
        let dir = tempfile::tempdir().unwrap();
        let replay = write_replay(dir.path(), &[frame(None, 0.9, 0.3)]);
        let mut settings = settings(dir.path(), replay);
        settings.alarms.sleep_sound = dir.path().join("gone.mp3");

        assert!(matches!(
            run(settings).await,
            Err(MonitorError::ResourceNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_out_of_range_recorded_time_is_an_error() {
        // too big for a Duration, beyond the Instant range, negative
        for t in [1e300, 1e19, -1.0] {
            let dir = tempfile::tempdir().unwrap();
            let frames = [
                frame(Some(0.0), 0.9, 0.3),
                RecordedFrame {
                    t: Some(t),
                    faces: Vec::new(),
                },
            ];
            let replay = write_replay(dir.path(), &frames);

            match run(settings(dir.path(), replay)).await {
                Err(MonitorError::ReplayTime { line, t: reported }) => {
                    assert_eq!(line, 2);
                    assert_eq!(reported, t);
                }
                other => panic!("t={}: unexpected {:?}", t, other),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_realtime_session() {
        let dir = tempfile::tempdir().unwrap();
        let frames: Vec<RecordedFrame> = (0..5).map(|_| frame(None, 0.9, 0.85)).collect();
        let replay = write_replay(dir.path(), &frames);
        let mut settings = settings(dir.path(), replay);
        settings.replay.realtime = true;

        let summary = run(settings).await.unwrap();
        assert_eq!(summary.frames, 5);
        assert_eq!(summary.alarm_count(AlarmKind::Yawn), 1);
    }
}
