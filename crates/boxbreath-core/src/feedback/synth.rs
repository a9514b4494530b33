//! Cue tone synthesis.
//!
//! Every tone is a sine with a 50 ms linear attack to its peak gain followed
//! by an exponential decay down to 0.01 at the end of the tone. Chimes are
//! several tones staggered in time and mixed into one mono buffer.

use crate::timer::Phase;

pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

const ATTACK_SECS: f32 = 0.05;
const FLOOR_GAIN: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency: f32,
    /// Start time relative to the cue, in seconds.
    pub offset: f32,
    /// Seconds.
    pub length: f32,
    pub peak: f32,
}

impl Tone {
    /// Gain at `t` seconds after this tone begins.
    pub fn envelope(&self, t: f32) -> f32 {
        if t < 0.0 || t >= self.length {
            return 0.0;
        }
        if t < ATTACK_SECS {
            return self.peak * t / ATTACK_SECS;
        }
        let span = (self.length - ATTACK_SECS).max(f32::EPSILON);
        let frac = (t - ATTACK_SECS) / span;
        self.peak * (FLOOR_GAIN / self.peak).powf(frac)
    }

    fn end(&self) -> f32 {
        self.offset + self.length
    }
}

/// A sound cue made of one or more tones.
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    tones: Vec<Tone>,
}

impl Cue {
    /// Short single tone announcing a phase.
    pub fn phase(phase: Phase) -> Self {
        Self {
            tones: vec![Tone {
                frequency: phase.info().cue_hz,
                offset: 0.0,
                length: 0.3,
                peak: 0.3,
            }],
        }
    }

    /// Gentle ascending chime played on start and resume.
    pub fn start() -> Self {
        Self::chime(&[440.0, 554.37, 659.25], 0.1, 0.4, 0.2)
    }

    /// Brighter four-note chime for a finished session.
    pub fn complete() -> Self {
        Self::chime(&[523.25, 659.25, 783.99, 1046.5], 0.08, 0.5, 0.25)
    }

    fn chime(frequencies: &[f32], spacing: f32, length: f32, peak: f32) -> Self {
        let tones = frequencies
            .iter()
            .enumerate()
            .map(|(i, &frequency)| Tone {
                frequency,
                offset: i as f32 * spacing,
                length,
                peak,
            })
            .collect();
        Self { tones }
    }

    pub fn tones(&self) -> &[Tone] {
        &self.tones
    }

    /// Total length in seconds.
    pub fn duration(&self) -> f32 {
        self.tones.iter().map(Tone::end).fold(0.0, f32::max)
    }

    /// Render to mono samples in `[-1, 1]`, scaled by `gain`.
    pub fn render(&self, sample_rate: u32, gain: f32) -> Vec<f32> {
        let rate = sample_rate.max(1) as f32;
        let len = (self.duration() * rate).ceil() as usize;
        let mut samples = vec![0.0f32; len];
        for tone in &self.tones {
            let first = (tone.offset * rate) as usize;
            let step = std::f32::consts::TAU * tone.frequency / rate;
            for (n, sample) in samples.iter_mut().enumerate().skip(first) {
                let t = (n - first) as f32 / rate;
                if t >= tone.length {
                    break;
                }
                *sample += tone.envelope(t) * (step * (n - first) as f32).sin();
            }
        }
        for sample in &mut samples {
            *sample = (*sample * gain).clamp(-1.0, 1.0);
        }
        samples
    }
}
