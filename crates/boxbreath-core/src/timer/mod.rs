mod engine;
mod phase;
mod runner;

pub use engine::{
    clamp_cycles, clamp_duration, BreathingConfig, BreathingTimer, SessionSummary, TimerSnapshot,
    TimerState, DEFAULT_CYCLES, DEFAULT_DURATION_SECS, MAX_CYCLES, MAX_DURATION_SECS, MIN_CYCLES,
    MIN_DURATION_SECS,
};
pub use phase::{cycle_progress, Phase, PhaseInfo, Side, PHASES};
pub use runner::{NoopObserver, TimerObserver, TimerRunner, DEFAULT_TICK_INTERVAL};
