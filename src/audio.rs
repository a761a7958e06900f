//! Audio collaborator contract. The core only emits cues; sinks decide how
//! they sound.

const BASE_GAIN: f32 = 0.05;
const DOUBT_GAIN: f32 = 0.02;
const TRUTH_GAIN: f32 = 0.01;
const MIN_GAIN: f32 = 0.02;
const MAX_GAIN: f32 = 0.2;

/// Ambience loudness for the current balance of truth and doubt, before the
/// player's volume setting is applied.
pub fn ambience_gain(truth: u32, doubt: u32) -> f32 {
    let gain = BASE_GAIN + DOUBT_GAIN * doubt as f32 - TRUTH_GAIN * truth as f32;
    gain.clamp(MIN_GAIN, MAX_GAIN)
}

pub trait AudioSink {
    /// Called after every fragment resolution and on reset.
    fn adjust_ambience(&mut self, truth: u32, doubt: u32);
    /// Called once when the player steps onto an unresolved fragment node.
    fn fragment_struck(&mut self);
    /// Master volume in percent, 0 to 100.
    fn set_volume(&mut self, percent: u8);
}

/// Sink for headless runs and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn adjust_ambience(&mut self, _truth: u32, _doubt: u32) {}
    fn fragment_struck(&mut self) {}
    fn set_volume(&mut self, _percent: u8) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gain_rises_with_doubt_and_falls_with_truth() {
        assert!((ambience_gain(0, 0) - 0.05).abs() < 1e-6);
        assert!(ambience_gain(0, 3) > ambience_gain(0, 0));
        assert!(ambience_gain(2, 0) < ambience_gain(0, 0));
    }

    #[test]
    fn gain_is_clamped() {
        assert!((ambience_gain(50, 0) - MIN_GAIN).abs() < 1e-6);
        assert!((ambience_gain(0, 50) - MAX_GAIN).abs() < 1e-6);
    }
}
