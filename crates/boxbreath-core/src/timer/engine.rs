//! Breathing timer engine.
//!
//! The engine is a pure state machine. It does not use internal threads and
//! never reads the clock: the caller measures how much time passed and hands
//! it to `tick()`. [`TimerRunner`](super::TimerRunner) is the tokio-driven
//! tick source used by the CLI.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//! Running -> Completed
//! (any) -> Idle            via stop() / reset()
//! ```
//!
//! ## Tick model
//!
//! Ticks carry the elapsed wall-clock delta since the previous tick. The
//! delta is subtracted from the current phase; any overshoot past a phase
//! boundary carries into the next phase, so a late tick never loses time.
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = BreathingTimer::new(BreathingConfig::default());
//! timer.start();
//! // In a loop:
//! let events = timer.tick(elapsed); // PhaseChanged / SessionCompleted
//! ```

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::phase::{cycle_progress, Phase};
use crate::events::Event;

pub const MIN_DURATION_SECS: u32 = 1;
pub const MAX_DURATION_SECS: u32 = 60;
pub const MIN_CYCLES: u32 = 1;
pub const MAX_CYCLES: u32 = 20;
pub const DEFAULT_DURATION_SECS: u32 = 4;
pub const DEFAULT_CYCLES: u32 = 4;

/// Clamp a requested per-phase duration into `[1, 60]` seconds.
pub fn clamp_duration(secs: i64) -> u32 {
    secs.clamp(i64::from(MIN_DURATION_SECS), i64::from(MAX_DURATION_SECS)) as u32
}

/// Clamp a requested cycle count into `[1, 20]`.
pub fn clamp_cycles(cycles: i64) -> u32 {
    cycles.clamp(i64::from(MIN_CYCLES), i64::from(MAX_CYCLES)) as u32
}

/// Per-phase duration and cycle count, always within range.
///
/// Only constructible through [`BreathingConfig::new`] (which clamps) or
/// deserialization (which rejects out-of-range values).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBreathingConfig")]
pub struct BreathingConfig {
    duration: u32,
    cycles: u32,
}

#[derive(Deserialize)]
struct RawBreathingConfig {
    duration: i64,
    cycles: i64,
}

impl TryFrom<RawBreathingConfig> for BreathingConfig {
    type Error = String;

    fn try_from(raw: RawBreathingConfig) -> Result<Self, Self::Error> {
        let config = Self::new(raw.duration, raw.cycles);
        if i64::from(config.duration) != raw.duration || i64::from(config.cycles) != raw.cycles {
            return Err(format!(
                "duration must be {MIN_DURATION_SECS}-{MAX_DURATION_SECS} and cycles \
                 {MIN_CYCLES}-{MAX_CYCLES}, got {} and {}",
                raw.duration, raw.cycles
            ));
        }
        Ok(config)
    }
}

impl BreathingConfig {
    /// Build a config from untrusted input, clamping both values into range.
    pub fn new(duration: i64, cycles: i64) -> Self {
        Self {
            duration: clamp_duration(duration),
            cycles: clamp_cycles(cycles),
        }
    }

    /// Seconds per phase.
    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// Number of full cycles in a session.
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    pub fn duration_ms(&self) -> u64 {
        u64::from(self.duration) * 1000
    }

    /// Length of a whole session in seconds.
    pub fn total_secs(&self) -> u64 {
        u64::from(self.duration) * u64::from(self.cycles) * 4
    }
}

impl Default for BreathingConfig {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION_SECS,
            cycles: DEFAULT_CYCLES,
        }
    }
}

/// What a finished session amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub cycles: u32,
    pub duration_secs: u32,
    pub total_secs: u64,
}

impl From<BreathingConfig> for SessionSummary {
    fn from(config: BreathingConfig) -> Self {
        Self {
            cycles: config.cycles,
            duration_secs: config.duration,
            total_secs: config.total_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    /// All cycles done. Only `start`, `stop` or `reset` leave this state.
    Completed,
}

/// Point-in-time view of the timer for renderers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub current_phase: Phase,
    /// Seconds left in the current phase, in `[0, duration_secs]`.
    pub phase_time_remaining: f64,
    /// 1-based.
    pub current_cycle: u32,
    pub total_cycles: u32,
    pub duration_secs: u32,
    /// 0.0 ..= 100.0 through the current cycle.
    pub progress: f64,
}

/// Core breathing timer.
#[derive(Debug, Clone)]
pub struct BreathingTimer {
    config: BreathingConfig,
    state: TimerState,
    phase: Phase,
    /// Remaining time in milliseconds for the current phase.
    remaining_ms: u64,
    cycle: u32,
}

impl BreathingTimer {
    /// Create a timer in the `Idle` state with the first phase ready.
    pub fn new(config: BreathingConfig) -> Self {
        Self {
            config,
            state: TimerState::Idle,
            phase: Phase::Inhale,
            remaining_ms: config.duration_ms(),
            cycle: 1,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> BreathingConfig {
        self.config
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    /// Seconds left in the current phase.
    pub fn phase_time_remaining(&self) -> f64 {
        self.remaining_ms as f64 / 1000.0
    }

    pub fn current_cycle(&self) -> u32 {
        self.cycle
    }

    pub fn total_cycles(&self) -> u32 {
        self.config.cycles
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    /// 0.0 .. 100.0 progress through the current cycle.
    pub fn progress(&self) -> f64 {
        cycle_progress(
            self.phase,
            self.phase_time_remaining(),
            f64::from(self.config.duration),
        )
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            state: self.state,
            current_phase: self.phase,
            phase_time_remaining: self.phase_time_remaining(),
            current_cycle: self.cycle,
            total_cycles: self.config.cycles,
            duration_secs: self.config.duration,
            progress: self.progress(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a fresh session. No-op while already running.
    pub fn start(&mut self) -> Vec<Event> {
        if self.state == TimerState::Running {
            return Vec::new();
        }
        self.rewind();
        self.state = TimerState::Running;
        debug!(
            duration = self.config.duration,
            cycles = self.config.cycles,
            "breathing session started"
        );
        let at = Utc::now();
        vec![
            Event::TimerStarted {
                duration_secs: self.config.duration,
                total_cycles: self.config.cycles,
                at,
            },
            Event::PhaseChanged {
                phase: Phase::Inhale,
                cycle: 1,
                at,
            },
        ]
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.state = TimerState::Paused;
        Some(Event::TimerPaused {
            remaining_ms: self.remaining_ms,
            at: Utc::now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        if self.state != TimerState::Paused {
            return None;
        }
        self.state = TimerState::Running;
        Some(Event::TimerResumed {
            remaining_ms: self.remaining_ms,
            at: Utc::now(),
        })
    }

    pub fn stop(&mut self) -> Event {
        self.rewind();
        self.state = TimerState::Idle;
        Event::TimerStopped { at: Utc::now() }
    }

    pub fn reset(&mut self) -> Event {
        self.rewind();
        self.state = TimerState::Idle;
        Event::TimerReset { at: Utc::now() }
    }

    /// Replace duration and cycle count. The timer goes back to idle.
    pub fn set_config(&mut self, config: BreathingConfig) {
        self.config = config;
        self.reset();
    }

    /// Advance by `elapsed`. Returns one event per phase boundary crossed.
    ///
    /// Does nothing unless running. Once the last cycle finishes the timer
    /// is `Completed` and the leftover time is discarded.
    pub fn tick(&mut self, elapsed: Duration) -> Vec<Event> {
        let mut events = Vec::new();
        let mut budget = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        while self.state == TimerState::Running {
            if budget < self.remaining_ms {
                self.remaining_ms -= budget;
                break;
            }
            budget -= self.remaining_ms;
            self.remaining_ms = 0;
            events.push(self.next_phase());
        }
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn rewind(&mut self) {
        self.phase = Phase::Inhale;
        self.cycle = 1;
        self.remaining_ms = self.config.duration_ms();
    }

    fn next_phase(&mut self) -> Event {
        let at = Utc::now();
        if self.phase.ends_cycle() {
            if self.cycle >= self.config.cycles {
                // Phase stays on hold-empty with nothing left: progress reads 100%.
                self.state = TimerState::Completed;
                debug!(cycles = self.config.cycles, "breathing session completed");
                return Event::SessionCompleted {
                    summary: self.config.into(),
                    at,
                };
            }
            self.cycle += 1;
        }
        self.phase = self.phase.next();
        self.remaining_ms = self.config.duration_ms();
        debug!(phase = ?self.phase, cycle = self.cycle, "phase changed");
        Event::PhaseChanged {
            phase: self.phase,
            cycle: self.cycle,
            at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn phases_of(events: &[Event]) -> Vec<Phase> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::PhaseChanged { phase, .. } => Some(*phase),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn new_timer_is_idle_at_inhale() {
        let timer = BreathingTimer::new(BreathingConfig::default());
        let snap = timer.snapshot();
        assert_eq!(snap.state, TimerState::Idle);
        assert_eq!(snap.current_phase, Phase::Inhale);
        assert_eq!(snap.phase_time_remaining, 4.0);
        assert_eq!(snap.current_cycle, 1);
        assert_eq!(snap.total_cycles, 4);
    }

    #[test]
    fn start_fires_inhale_phase_change() {
        let mut timer = BreathingTimer::new(BreathingConfig::default());
        let events = timer.start();
        assert_eq!(timer.state(), TimerState::Running);
        assert!(matches!(events[0], Event::TimerStarted { duration_secs: 4, total_cycles: 4, .. }));
        assert_eq!(phases_of(&events), vec![Phase::Inhale]);
    }

    #[test]
    fn start_while_running_is_noop() {
        let mut timer = BreathingTimer::new(BreathingConfig::default());
        timer.start();
        timer.tick(ms(1500));
        assert!(timer.start().is_empty());
        assert_eq!(timer.remaining_ms(), 2500);
    }

    #[test]
    fn pause_and_resume_are_guarded() {
        let mut timer = BreathingTimer::new(BreathingConfig::default());
        assert!(timer.pause().is_none());
        assert!(timer.resume().is_none());

        timer.start();
        assert!(timer.resume().is_none());
        assert!(timer.pause().is_some());
        assert!(timer.pause().is_none());
        assert_eq!(timer.state(), TimerState::Paused);
        assert!(timer.resume().is_some());
        assert_eq!(timer.state(), TimerState::Running);
    }

    #[test]
    fn paused_timer_ignores_ticks() {
        let mut timer = BreathingTimer::new(BreathingConfig::default());
        timer.start();
        timer.tick(ms(1200));
        timer.pause();
        assert!(timer.tick(ms(10_000)).is_empty());
        timer.resume();
        assert_eq!(timer.remaining_ms(), 2800);
    }

    #[test]
    fn reaching_zero_advances_phase() {
        let mut timer = BreathingTimer::new(BreathingConfig::new(2, 2));
        timer.start();
        let events = timer.tick(ms(2000));
        assert_eq!(phases_of(&events), vec![Phase::Hold]);
        assert_eq!(timer.remaining_ms(), 2000);
        assert_eq!(timer.current_cycle(), 1);
    }

    #[test]
    fn overshoot_carries_into_next_phase() {
        let mut timer = BreathingTimer::new(BreathingConfig::new(2, 3));
        timer.start();
        let events = timer.tick(ms(4500));
        assert_eq!(phases_of(&events), vec![Phase::Hold, Phase::Exhale]);
        assert_eq!(timer.remaining_ms(), 1500);
    }

    #[test]
    fn wrapping_to_inhale_increments_cycle() {
        let mut timer = BreathingTimer::new(BreathingConfig::new(1, 3));
        timer.start();
        let events = timer.tick(ms(4000));
        assert_eq!(
            phases_of(&events),
            vec![Phase::Hold, Phase::Exhale, Phase::HoldEmpty, Phase::Inhale]
        );
        assert_eq!(timer.current_cycle(), 2);
    }

    #[test]
    fn sixty_four_quarter_second_ticks_complete_one_cycle() {
        let mut timer = BreathingTimer::new(BreathingConfig::new(4, 1));
        timer.start();
        let mut completions = 0;
        for i in 0..64 {
            assert_eq!(timer.state(), TimerState::Running, "tick {i}");
            for event in timer.tick(ms(250)) {
                if matches!(event, Event::SessionCompleted { .. }) {
                    completions += 1;
                }
            }
        }
        assert_eq!(completions, 1);
        assert_eq!(timer.state(), TimerState::Completed);
        assert_eq!(timer.current_cycle(), 1);
        assert_eq!(timer.progress(), 100.0);
    }

    #[test]
    fn completion_replaces_final_phase_change() {
        let mut timer = BreathingTimer::new(BreathingConfig::new(1, 1));
        timer.start();
        let events = timer.tick(ms(60_000));
        assert_eq!(
            phases_of(&events),
            vec![Phase::Hold, Phase::Exhale, Phase::HoldEmpty]
        );
        match events.last() {
            Some(Event::SessionCompleted { summary, .. }) => {
                assert_eq!(summary.total_secs, 4);
            }
            other => panic!("Expected SessionCompleted, got {other:?}"),
        }
        assert!(timer.tick(ms(1000)).is_empty());
    }

    #[test]
    fn stop_and_reset_rewind_from_any_state() {
        let config = BreathingConfig::new(3, 2);
        let mut timer = BreathingTimer::new(config);
        timer.start();
        timer.tick(ms(7_400));
        timer.stop();
        assert_eq!(timer.snapshot(), BreathingTimer::new(config).snapshot());

        timer.start();
        timer.tick(ms(60_000));
        assert_eq!(timer.state(), TimerState::Completed);
        timer.reset();
        assert_eq!(timer.snapshot(), BreathingTimer::new(config).snapshot());
    }

    #[test]
    fn start_after_completion_begins_new_session() {
        let mut timer = BreathingTimer::new(BreathingConfig::new(1, 1));
        timer.start();
        timer.tick(ms(4000));
        assert_eq!(timer.state(), TimerState::Completed);
        let events = timer.start();
        assert_eq!(phases_of(&events), vec![Phase::Inhale]);
        assert_eq!(timer.remaining_ms(), 1000);
    }

    #[test]
    fn set_config_resets_to_idle() {
        let mut timer = BreathingTimer::new(BreathingConfig::default());
        timer.start();
        timer.tick(ms(5000));
        timer.set_config(BreathingConfig::new(10, 2));
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.phase(), Phase::Inhale);
        assert_eq!(timer.remaining_ms(), 10_000);
        assert_eq!(timer.total_cycles(), 2);
    }

    #[test]
    fn config_clamps_out_of_range_values() {
        let high = BreathingConfig::new(100, 0);
        assert_eq!((high.duration(), high.cycles()), (60, 1));
        let low = BreathingConfig::new(-3, 99);
        assert_eq!((low.duration(), low.cycles()), (1, 20));
        assert_eq!(BreathingConfig::new(5, 3).total_secs(), 60);
    }

    #[test]
    fn deserializing_config_enforces_ranges() {
        let ok: BreathingConfig = serde_json::from_str(r#"{"duration":7,"cycles":3}"#).unwrap();
        assert_eq!(ok, BreathingConfig::new(7, 3));
        assert!(serde_json::from_str::<BreathingConfig>(r#"{"duration":0,"cycles":3}"#).is_err());
        assert!(serde_json::from_str::<BreathingConfig>(r#"{"duration":4,"cycles":1000000}"#).is_err());

        let json = serde_json::to_value(BreathingConfig::default()).unwrap();
        assert_eq!(json, serde_json::json!({"duration": 4, "cycles": 4}));
    }
}
