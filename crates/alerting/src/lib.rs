//! Alerting System
//!
//! Debounces audible fatigue alarms so each kind fires at most once per
//! cooldown window.

mod debouncer;

pub use debouncer::{AlarmDebouncer, AlarmKind, AlarmRecord};
