//! Alarm Debouncer Implementation

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Audible alarm kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmKind {
    /// Sustained eye closure
    Sleep,
    /// Yawn detected
    Yawn,
}

impl AlarmKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlarmKind::Sleep => "sleep",
            AlarmKind::Yawn => "yawn",
        }
    }
}

impl fmt::Display for AlarmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Firing history of one alarm kind
#[derive(Debug, Clone, Default)]
pub struct AlarmRecord {
    /// Last time this alarm was allowed to fire (`None` = never fired)
    pub last_fired_at: Option<Instant>,
    /// Number of times fired
    pub fire_count: usize,
    /// Number of requests swallowed by the cooldown
    pub suppressed_count: usize,
}

/// Per-kind alarm debouncer
///
/// A kind may fire again only once strictly more than `cooldown` has passed
/// since it last fired. Kinds are debounced independently of each other.
pub struct AlarmDebouncer {
    cooldown: Duration,
    records: HashMap<AlarmKind, AlarmRecord>,
}

impl AlarmDebouncer {
    /// Create a debouncer with the given cooldown window
    pub fn new(cooldown: Duration) -> Self {
        debug!("Creating alarm debouncer with cooldown {:?}", cooldown);
        Self {
            cooldown,
            records: HashMap::new(),
        }
    }

    /// Ask to fire `kind` at `now`.
    ///
    /// Returns true and stamps the record if the alarm may sound; the caller
    /// is then responsible for playback.
    pub fn try_fire(&mut self, kind: AlarmKind, now: Instant) -> bool {
        let record = self.records.entry(kind).or_default();

        let ready = match record.last_fired_at {
            None => true,
            Some(last) => now.saturating_duration_since(last) > self.cooldown,
        };

        if !ready {
            record.suppressed_count += 1;
            debug!("Alarm suppressed: {} in cooldown period", kind);
            return false;
        }

        record.last_fired_at = Some(now);
        record.fire_count += 1;
        info!("Alarm fired: {} (count: {})", kind, record.fire_count);
        true
    }

    /// Firing history for `kind`, if it was ever requested
    pub fn record(&self, kind: AlarmKind) -> Option<&AlarmRecord> {
        self.records.get(&kind)
    }

}
