use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Phase, SessionSummary};

/// Every state change of the timer produces an Event.
/// The runner hands them to feedback observers; the CLI can print them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        duration_secs: u32,
        total_cycles: u32,
        at: DateTime<Utc>,
    },
    /// A new phase began. Fired for `inhale` on start and on every boundary.
    PhaseChanged {
        phase: Phase,
        cycle: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerStopped {
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    /// All cycles finished. Replaces the phase change of the final boundary.
    SessionCompleted {
        summary: SessionSummary,
        at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_snake_case() {
        let event = Event::PhaseChanged {
            phase: Phase::HoldEmpty,
            cycle: 2,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "phase_changed");
        assert_eq!(json["phase"], "hold-empty");
        assert_eq!(json["cycle"], 2);
    }
}
