//! Sound and vibration cues for a breathing session.
//!
//! [`Feedback`] is a [`TimerObserver`]: plug it into a
//! [`TimerRunner`](crate::timer::TimerRunner) and it reacts to phase changes,
//! completion, start and resume. Every failure is logged and dropped so a
//! missing sound card never disturbs the timer.

mod haptics;
mod output;
mod synth;

pub use haptics::{HapticIntensity, Haptics, LogHaptics};
pub use output::{AudioOutput, Speaker};
pub use synth::{Cue, Tone, DEFAULT_SAMPLE_RATE};

use std::time::Duration;

use tracing::{debug, warn};

use crate::events::Event;
use crate::storage::FeedbackConfig;
use crate::timer::{Phase, SessionSummary, TimerObserver};

pub struct Feedback {
    speaker: Option<Speaker>,
    haptics: Option<Box<dyn Haptics>>,
    gain: f32,
}

impl Feedback {
    pub fn new(speaker: Option<Speaker>, haptics: Option<Box<dyn Haptics>>, gain: f32) -> Self {
        Self {
            speaker,
            haptics,
            gain: gain.clamp(0.0, 1.0),
        }
    }

    /// System speaker and log haptics, each only if enabled.
    pub fn from_config(config: &FeedbackConfig) -> Self {
        let haptics: Option<Box<dyn Haptics>> = if config.haptics {
            Some(Box::new(LogHaptics))
        } else {
            None
        };
        Self::new(config.sound.then(Speaker::system), haptics, config.gain())
    }

    /// No cues at all.
    pub fn silent() -> Self {
        Self::new(None, None, 0.0)
    }

    /// Open the audio device up front. Timer hooks run under the timer
    /// lock and must not wait for a device to start.
    pub fn warm_up(&mut self) {
        if let Some(speaker) = self.speaker.as_mut() {
            if let Err(e) = speaker.warm_up() {
                debug!("sound cues unavailable: {e}");
            }
        }
    }

    /// How long the completion chime keeps playing after the session ends.
    ///
    /// Zero unless an audio output is open.
    pub fn completion_tail(&self) -> Duration {
        match &self.speaker {
            Some(speaker) if speaker.is_open() => {
                Duration::from_secs_f32(Cue::complete().duration())
            }
            _ => Duration::ZERO,
        }
    }

    fn sound(&mut self, cue: Cue) {
        if let Some(speaker) = self.speaker.as_mut() {
            if let Err(e) = speaker.play(&cue, self.gain) {
                debug!("skipping sound cue: {e}");
            }
        }
    }

    fn pulse(&mut self, intensity: HapticIntensity) {
        if let Some(haptics) = self.haptics.as_mut() {
            if let Err(e) = haptics.pulse(intensity) {
                warn!("haptic pulse failed: {e}");
            }
        }
    }
}

impl TimerObserver for Feedback {
    fn on_phase_change(&mut self, phase: Phase, _cycle: u32) {
        self.sound(Cue::phase(phase));
        self.pulse(HapticIntensity::Light);
    }

    fn on_complete(&mut self, _summary: &SessionSummary) {
        self.sound(Cue::complete());
        self.pulse(HapticIntensity::Heavy);
    }

    fn on_event(&mut self, event: &Event) {
        match event {
            Event::TimerStarted { .. } => {
                self.sound(Cue::start());
                self.pulse(HapticIntensity::Medium);
            }
            Event::TimerResumed { .. } => self.sound(Cue::start()),
            _ => {}
        }
    }
}
