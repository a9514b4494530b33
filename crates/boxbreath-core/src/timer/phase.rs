use serde::{Deserialize, Serialize};

/// One quarter of a box-breathing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Inhale,
    Hold,
    Exhale,
    HoldEmpty,
}

/// Which edge of the breathing square a phase is drawn along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

/// Static display and cue data for a phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhaseInfo {
    pub phase: Phase,
    pub label: &'static str,
    pub instruction: &'static str,
    pub side: Side,
    /// Frequency of the phase-change cue tone in Hz.
    pub cue_hz: f32,
}

/// The phases in cycle order.
pub static PHASES: [PhaseInfo; 4] = [
    PhaseInfo {
        phase: Phase::Inhale,
        label: "INHALE",
        instruction: "Breathe in through your nose",
        side: Side::Top,
        cue_hz: 440.0,
    },
    PhaseInfo {
        phase: Phase::Hold,
        label: "HOLD",
        instruction: "Hold your breath",
        side: Side::Right,
        cue_hz: 523.25,
    },
    PhaseInfo {
        phase: Phase::Exhale,
        label: "EXHALE",
        instruction: "Breathe out through your mouth",
        side: Side::Bottom,
        cue_hz: 349.23,
    },
    PhaseInfo {
        phase: Phase::HoldEmpty,
        label: "HOLD",
        instruction: "Hold with empty lungs",
        side: Side::Left,
        cue_hz: 293.66,
    },
];

impl Phase {
    /// Position of the phase within a cycle (0..4).
    pub fn index(self) -> usize {
        match self {
            Phase::Inhale => 0,
            Phase::Hold => 1,
            Phase::Exhale => 2,
            Phase::HoldEmpty => 3,
        }
    }

    /// The phase that follows this one, wrapping back to `Inhale`.
    pub fn next(self) -> Phase {
        PHASES[(self.index() + 1) % PHASES.len()].phase
    }

    /// `true` for the last phase of a cycle.
    pub fn ends_cycle(self) -> bool {
        self == Phase::HoldEmpty
    }

    pub fn info(self) -> &'static PhaseInfo {
        &PHASES[self.index()]
    }

    pub fn label(self) -> &'static str {
        self.info().label
    }

    pub fn instruction(self) -> &'static str {
        self.info().instruction
    }
}

/// Percentage (0..=100) through a full cycle.
///
/// Each phase contributes a quarter; the current phase adds its own elapsed
/// fraction scaled to that quarter.
pub fn cycle_progress(phase: Phase, remaining_secs: f64, duration_secs: f64) -> f64 {
    if duration_secs <= 0.0 {
        return phase.index() as f64 * 25.0;
    }
    let phase_pct = ((duration_secs - remaining_secs) / duration_secs * 100.0).clamp(0.0, 100.0);
    phase.index() as f64 * 25.0 + phase_pct / 4.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_cycle_in_fixed_order() {
        assert_eq!(Phase::Inhale.next(), Phase::Hold);
        assert_eq!(Phase::Hold.next(), Phase::Exhale);
        assert_eq!(Phase::Exhale.next(), Phase::HoldEmpty);
        assert_eq!(Phase::HoldEmpty.next(), Phase::Inhale);
    }

    #[test]
    fn catalogue_matches_index() {
        for (i, info) in PHASES.iter().enumerate() {
            assert_eq!(info.phase.index(), i);
        }
        assert_eq!(Phase::HoldEmpty.label(), "HOLD");
        assert_eq!(Phase::Exhale.info().side, Side::Bottom);
    }

    #[test]
    fn hold_empty_serializes_kebab_case() {
        let json = serde_json::to_string(&Phase::HoldEmpty).unwrap();
        assert_eq!(json, "\"hold-empty\"");
        let back: Phase = serde_json::from_str("\"inhale\"").unwrap();
        assert_eq!(back, Phase::Inhale);
    }

    #[test]
    fn progress_within_cycle() {
        assert_eq!(cycle_progress(Phase::Inhale, 4.0, 4.0), 0.0);
        assert_eq!(cycle_progress(Phase::Inhale, 2.0, 4.0), 12.5);
        assert_eq!(cycle_progress(Phase::Exhale, 4.0, 4.0), 50.0);
        assert_eq!(cycle_progress(Phase::HoldEmpty, 0.0, 4.0), 100.0);
    }
}
