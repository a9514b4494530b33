//! Audio output.
//!
//! [`Speaker`] owns the output handle and opens it on [`Speaker::warm_up`] or
//! when the first cue is played. A failed open is remembered: the device is
//! not tried again for the lifetime of the speaker.

use tracing::warn;

use super::synth::Cue;
use crate::error::FeedbackError;

/// A sink that plays mono `f32` samples.
pub trait AudioOutput: Send {
    fn sample_rate(&self) -> u32;

    /// Queue samples for playback. Must not block until they finish.
    fn play(&mut self, samples: Vec<f32>) -> Result<(), FeedbackError>;
}

type Opener = Box<dyn FnMut() -> Result<Box<dyn AudioOutput>, FeedbackError> + Send>;

enum Slot {
    Unopened,
    Ready(Box<dyn AudioOutput>),
    Unavailable,
}

/// Lazily opened audio output.
pub struct Speaker {
    opener: Opener,
    slot: Slot,
}

impl Speaker {
    pub fn new(
        opener: impl FnMut() -> Result<Box<dyn AudioOutput>, FeedbackError> + Send + 'static,
    ) -> Self {
        Self {
            opener: Box::new(opener),
            slot: Slot::Unopened,
        }
    }

    /// The system's default output device.
    ///
    /// Without the `audio` feature there is no device backend and every cue
    /// reports [`FeedbackError::NoOutputDevice`].
    pub fn system() -> Self {
        #[cfg(feature = "audio")]
        {
            Self::new(|| {
                device::CpalOutput::open().map(|out| Box::new(out) as Box<dyn AudioOutput>)
            })
        }
        #[cfg(not(feature = "audio"))]
        {
            Self::new(|| Err(FeedbackError::NoOutputDevice))
        }
    }

    /// Open the output now rather than on the first cue.
    ///
    /// Opening can block while the device starts up, so do it before the
    /// speaker is handed to a running timer.
    pub fn warm_up(&mut self) -> Result<(), FeedbackError> {
        self.output().map(|_| ())
    }

    pub fn is_open(&self) -> bool {
        matches!(self.slot, Slot::Ready(_))
    }

    pub fn play(&mut self, cue: &Cue, gain: f32) -> Result<(), FeedbackError> {
        let output = self.output()?;
        let samples = cue.render(output.sample_rate(), gain);
        output.play(samples)
    }

    fn output(&mut self) -> Result<&mut Box<dyn AudioOutput>, FeedbackError> {
        if matches!(self.slot, Slot::Unopened) {
            self.slot = match (self.opener)() {
                Ok(output) => Slot::Ready(output),
                Err(e) => {
                    warn!("audio output unavailable, sound cues disabled: {e}");
                    Slot::Unavailable
                }
            };
        }
        match &mut self.slot {
            Slot::Ready(output) => Ok(output),
            _ => Err(FeedbackError::NoOutputDevice),
        }
    }
}

#[cfg(feature = "audio")]
mod device {
    use std::collections::VecDeque;
    use std::sync::{mpsc, Arc, Mutex, PoisonError};

    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

    use super::AudioOutput;
    use crate::error::FeedbackError;

    type SampleQueue = Arc<Mutex<VecDeque<f32>>>;

    /// Default cpal output device.
    ///
    /// The stream lives on its own thread (cpal streams are not `Send` on
    /// every platform) until this handle is dropped.
    pub struct CpalOutput {
        queue: SampleQueue,
        sample_rate: u32,
        _keepalive: mpsc::Sender<()>,
    }

    impl CpalOutput {
        pub fn open() -> Result<Self, FeedbackError> {
            let (ready_tx, ready_rx) = mpsc::channel::<Result<u32, FeedbackError>>();
            let (keepalive_tx, keepalive_rx) = mpsc::channel::<()>();
            let queue: SampleQueue = Arc::default();
            let stream_queue = Arc::clone(&queue);

            std::thread::Builder::new()
                .name("boxbreath-audio".into())
                .spawn(move || match build_stream(stream_queue) {
                    Ok((stream, rate)) => {
                        let _ = ready_tx.send(Ok(rate));
                        // Returns once the owning handle drops its sender.
                        let _ = keepalive_rx.recv();
                        drop(stream);
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                    }
                })
                .map_err(|e| FeedbackError::Stream(e.to_string()))?;

            let sample_rate = ready_rx
                .recv()
                .map_err(|e| FeedbackError::Stream(e.to_string()))??;
            Ok(Self {
                queue,
                sample_rate,
                _keepalive: keepalive_tx,
            })
        }
    }

    fn build_stream(queue: SampleQueue) -> Result<(cpal::Stream, u32), FeedbackError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(FeedbackError::NoOutputDevice)?;
        let supported = device
            .default_output_config()
            .map_err(|e| FeedbackError::Stream(e.to_string()))?;
        if supported.sample_format() != cpal::SampleFormat::F32 {
            return Err(FeedbackError::UnsupportedFormat(format!(
                "{:?}",
                supported.sample_format()
            )));
        }
        let config: cpal::StreamConfig = supported.into();
        let channels = usize::from(config.channels.max(1));
        let sample_rate = config.sample_rate.0;

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut queue = queue.lock().unwrap_or_else(PoisonError::into_inner);
                    for frame in data.chunks_mut(channels) {
                        let sample = queue.pop_front().unwrap_or(0.0);
                        frame.fill(sample);
                    }
                },
                |err| tracing::warn!("audio stream error: {err}"),
                None,
            )
            .map_err(|e| FeedbackError::Stream(e.to_string()))?;
        stream
            .play()
            .map_err(|e| FeedbackError::Stream(e.to_string()))?;
        Ok((stream, sample_rate))
    }

    impl AudioOutput for CpalOutput {
        fn sample_rate(&self) -> u32 {
            self.sample_rate
        }

        fn play(&mut self, samples: Vec<f32>) -> Result<(), FeedbackError> {
            let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
            // Mix over whatever is still waiting to be played.
            for (i, sample) in samples.into_iter().enumerate() {
                match queue.get_mut(i) {
                    Some(queued) => *queued = (*queued + sample).clamp(-1.0, 1.0),
                    None => queue.push_back(sample),
                }
            }
            Ok(())
        }
    }
}
