//! Tokio-driven tick source for a [`BreathingTimer`].
//!
//! The runner owns exactly one tick task while the timer is running. Pausing,
//! stopping or resetting aborts it; every spawn bumps a generation counter so
//! a task that was aborted but not yet dropped can never touch the timer.
//!
//! Observers are called synchronously under the timer lock, from whichever
//! thread executed the command or the tick. They must not block.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::engine::{BreathingConfig, BreathingTimer, SessionSummary, TimerSnapshot};
use super::phase::Phase;
use crate::events::Event;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Receives timer notifications.
///
/// `on_event` sees every event; `on_phase_change` and `on_complete` are the
/// two feedback hooks most consumers care about.
pub trait TimerObserver: Send {
    fn on_phase_change(&mut self, _phase: Phase, _cycle: u32) {}

    fn on_complete(&mut self, _summary: &SessionSummary) {}

    fn on_event(&mut self, _event: &Event) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TimerObserver for NoopObserver {}

impl<A: TimerObserver, B: TimerObserver> TimerObserver for (A, B) {
    fn on_phase_change(&mut self, phase: Phase, cycle: u32) {
        self.0.on_phase_change(phase, cycle);
        self.1.on_phase_change(phase, cycle);
    }

    fn on_complete(&mut self, summary: &SessionSummary) {
        self.0.on_complete(summary);
        self.1.on_complete(summary);
    }

    fn on_event(&mut self, event: &Event) {
        self.0.on_event(event);
        self.1.on_event(event);
    }
}

struct Shared {
    timer: BreathingTimer,
    observer: Box<dyn TimerObserver>,
    /// Bumped whenever the tick task is (re)spawned or cancelled.
    generation: u64,
    last_tick: Option<Instant>,
    snapshots: watch::Sender<TimerSnapshot>,
}

impl Shared {
    /// Feed the time elapsed since the last tick into the timer.
    fn flush(&mut self) -> Vec<Event> {
        let now = Instant::now();
        let elapsed = self
            .last_tick
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or_default();
        self.last_tick = Some(now);
        self.timer.tick(elapsed)
    }

    fn dispatch(&mut self, events: &[Event]) {
        for event in events {
            self.observer.on_event(event);
            match event {
                Event::PhaseChanged { phase, cycle, .. } => {
                    self.observer.on_phase_change(*phase, *cycle)
                }
                Event::SessionCompleted { summary, .. } => self.observer.on_complete(summary),
                _ => {}
            }
        }
        self.snapshots.send_replace(self.timer.snapshot());
    }

    fn invalidate_ticker(&mut self) {
        self.generation += 1;
        self.last_tick = None;
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drives a [`BreathingTimer`] from a periodic tokio task.
///
/// `start` and `resume` spawn onto the current tokio runtime and must be
/// called from within one.
pub struct TimerRunner {
    shared: Arc<Mutex<Shared>>,
    snapshots: watch::Receiver<TimerSnapshot>,
    tick_interval: Duration,
    task: Option<JoinHandle<()>>,
}

impl TimerRunner {
    pub fn new(
        config: BreathingConfig,
        tick_interval: Duration,
        observer: impl TimerObserver + 'static,
    ) -> Self {
        let timer = BreathingTimer::new(config);
        let (tx, rx) = watch::channel(timer.snapshot());
        let shared = Shared {
            timer,
            observer: Box::new(observer),
            generation: 0,
            last_tick: None,
            snapshots: tx,
        };
        Self {
            shared: Arc::new(Mutex::new(shared)),
            snapshots: rx,
            tick_interval: tick_interval.max(Duration::from_millis(1)),
            task: None,
        }
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        lock(&self.shared).timer.snapshot()
    }

    pub fn config(&self) -> BreathingConfig {
        lock(&self.shared).timer.config()
    }

    /// Receiver that sees a fresh snapshot after every command and tick.
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshots.clone()
    }

    /// `true` while a tick task is alive.
    pub fn is_ticking(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn start(&mut self) -> Vec<Event> {
        let mut shared = lock(&self.shared);
        let events = shared.timer.start();
        if events.is_empty() {
            return events;
        }
        shared.dispatch(&events);
        if let Some(old) = self.task.take() {
            old.abort();
        }
        self.task = Some(spawn_ticker(
            Arc::clone(&self.shared),
            &mut shared,
            self.tick_interval,
        ));
        events
    }

    pub fn pause(&mut self) -> Vec<Event> {
        let mut shared = lock(&self.shared);
        if !shared.timer.is_running() {
            return Vec::new();
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
        // Account for the partial interval since the last tick.
        let mut events = shared.flush();
        events.extend(shared.timer.pause());
        shared.invalidate_ticker();
        shared.dispatch(&events);
        events
    }

    pub fn resume(&mut self) -> Vec<Event> {
        let mut shared = lock(&self.shared);
        let Some(event) = shared.timer.resume() else {
            return Vec::new();
        };
        let events = vec![event];
        shared.dispatch(&events);
        if let Some(old) = self.task.take() {
            old.abort();
        }
        self.task = Some(spawn_ticker(
            Arc::clone(&self.shared),
            &mut shared,
            self.tick_interval,
        ));
        events
    }

    pub fn stop(&mut self) -> Vec<Event> {
        self.halt(BreathingTimer::stop)
    }

    pub fn reset(&mut self) -> Vec<Event> {
        self.halt(BreathingTimer::reset)
    }

    /// Swap in a new duration/cycle config. Cancels any session in progress.
    pub fn set_config(&mut self, config: BreathingConfig) {
        self.halt(|timer| {
            timer.set_config(config);
            Event::TimerReset {
                at: chrono::Utc::now(),
            }
        });
    }

    fn halt(&mut self, command: impl FnOnce(&mut BreathingTimer) -> Event) -> Vec<Event> {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        let mut shared = lock(&self.shared);
        shared.invalidate_ticker();
        let events = vec![command(&mut shared.timer)];
        shared.dispatch(&events);
        events
    }
}

impl Drop for TimerRunner {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

fn spawn_ticker(
    handle: Arc<Mutex<Shared>>,
    shared: &mut Shared,
    period: Duration,
) -> JoinHandle<()> {
    shared.generation += 1;
    shared.last_tick = Some(Instant::now());
    tokio::spawn(tick_loop(handle, shared.generation, period))
}

async fn tick_loop(shared: Arc<Mutex<Shared>>, generation: u64, period: Duration) {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        let mut guard = lock(&shared);
        if guard.generation != generation || !guard.timer.is_running() {
            break;
        }
        let events = guard.flush();
        guard.dispatch(&events);
        if !guard.timer.is_running() {
            guard.last_tick = None;
            break;
        }
    }
}
