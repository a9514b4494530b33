use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FeedbackError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HapticIntensity {
    Light,
    Medium,
    Heavy,
}

impl HapticIntensity {
    /// Vibration length for this intensity.
    pub fn pattern(self) -> Duration {
        match self {
            HapticIntensity::Light => Duration::from_millis(10),
            HapticIntensity::Medium => Duration::from_millis(20),
            HapticIntensity::Heavy => Duration::from_millis(30),
        }
    }
}

/// A vibration driver.
pub trait Haptics: Send {
    fn pulse(&mut self, intensity: HapticIntensity) -> Result<(), FeedbackError>;
}

/// Terminals have no vibration motor; record the pulse in the log instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogHaptics;

impl Haptics for LogHaptics {
    fn pulse(&mut self, intensity: HapticIntensity) -> Result<(), FeedbackError> {
        debug!(
            ?intensity,
            pattern_ms = intensity.pattern().as_millis() as u64,
            "haptic pulse"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patterns_scale_with_intensity() {
        assert_eq!(HapticIntensity::Light.pattern(), Duration::from_millis(10));
        assert_eq!(HapticIntensity::Medium.pattern(), Duration::from_millis(20));
        assert_eq!(HapticIntensity::Heavy.pattern(), Duration::from_millis(30));
        assert!(LogHaptics.pulse(HapticIntensity::Heavy).is_ok());
    }
}
