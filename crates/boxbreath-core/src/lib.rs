//! # Boxbreath Core Library
//!
//! This library provides the core logic for Boxbreath, a guided box-breathing
//! timer. Every operation is available through the standalone `boxbreath`
//! CLI, which is a thin presentation layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a pure state machine cycling inhale, hold, exhale and
//!   hold-empty; the caller feeds it elapsed time through `tick()`
//! - **Timer Runner**: the single tokio tick task driving an engine, with
//!   synchronous observer hooks and a snapshot watch channel
//! - **Settings**: per-phase duration and cycle count, persisted in a
//!   key-value store
//! - **Storage**: SQLite key-value table and TOML configuration
//! - **Feedback**: synthesized sound cues and haptic pulses
//!
//! ## Key Components
//!
//! - [`BreathingTimer`]: Core timer state machine
//! - [`TimerRunner`]: Periodic tick source
//! - [`BreathingSettings`]: Persisted user preferences
//! - [`Config`]: Application configuration management
//! - [`Feedback`]: Audio/haptic observer

pub mod error;
pub mod events;
pub mod feedback;
pub mod settings;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, FeedbackError, StorageError};
pub use events::Event;
pub use feedback::Feedback;
pub use settings::{open_settings, BreathingSettings};
pub use storage::{Config, Database, KvStore, MemoryStore};
pub use timer::{
    BreathingConfig, BreathingTimer, Phase, SessionSummary, TimerObserver, TimerRunner,
    TimerSnapshot, TimerState,
};
