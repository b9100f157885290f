//! Timing profiles for the spin timeline

use serde::{Deserialize, Serialize};

use crate::error::{ReelError, ReelResult};

/// Timing profile for the spin timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimingProfile {
    /// Classic widget timing
    #[default]
    Normal,
    /// Fast mode
    Turbo,
    /// Hand-tuned or scaled values
    Custom,
}

/// Easing curve for the stop transition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    EaseOut,
    /// CSS cubic-bezier control points (x1, y1, x2, y2)
    CubicBezier(f64, f64, f64, f64),
}

impl Easing {
    /// Ease-out-quad curve the widget stops reels with
    pub const REEL_STOP: Easing = Easing::CubicBezier(0.25, 0.46, 0.45, 0.94);

    /// CSS timing-function text
    pub fn css(&self) -> String {
        match self {
            Self::Linear => "linear".to_string(),
            Self::EaseOut => "ease-out".to_string(),
            Self::CubicBezier(x1, y1, x2, y2) => {
                format!("cubic-bezier({}, {}, {}, {})", x1, y1, x2, y2)
            }
        }
    }
}

impl Default for Easing {
    fn default() -> Self {
        Self::REEL_STOP
    }
}

/// Detailed timing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Profile type
    pub profile: TimingProfile,

    /// Period of the shuffle tick while a reel spins (ms)
    pub shuffle_interval_ms: f64,

    /// Offset from spin start at which each reel stops (ms), one per reel
    pub reel_stop_delays_ms: Vec<f64>,

    /// Duration of the centering transition when a reel stops (ms)
    pub stop_transition_ms: f64,

    /// Easing of the centering transition
    #[serde(default)]
    pub stop_easing: Easing,

    /// Delay before evaluating (ms), counted from the end of the last reel's
    /// stop transition. Evaluation is armed `stop_transition_ms +
    /// settle_delay_ms` after the terminal stop.
    pub settle_delay_ms: f64,

    /// Rendering frames to wait before measuring
    pub settle_frames: u8,

    /// Delay after evaluation before strips return to neutral (ms)
    pub reset_delay_ms: f64,

    /// How long the win banner stays up (ms)
    pub message_hide_ms: f64,
}

impl TimingConfig {
    /// Classic widget timing
    pub fn normal() -> Self {
        Self {
            profile: TimingProfile::Normal,
            shuffle_interval_ms: 100.0,
            reel_stop_delays_ms: vec![2000.0, 2500.0, 3000.0],
            stop_transition_ms: 500.0,
            stop_easing: Easing::REEL_STOP,
            settle_delay_ms: 200.0,
            settle_frames: 2,
            reset_delay_ms: 100.0,
            message_hide_ms: 3000.0,
        }
    }

    /// Turbo mode
    pub fn turbo() -> Self {
        Self {
            profile: TimingProfile::Turbo,
            shuffle_interval_ms: 60.0,
            reel_stop_delays_ms: vec![800.0, 1000.0, 1200.0],
            stop_transition_ms: 250.0,
            stop_easing: Easing::REEL_STOP,
            settle_delay_ms: 100.0,
            settle_frames: 2,
            reset_delay_ms: 50.0,
            message_hide_ms: 2000.0,
        }
    }

    /// Get config for profile
    pub fn from_profile(profile: TimingProfile) -> Self {
        match profile {
            TimingProfile::Normal => Self::normal(),
            TimingProfile::Turbo => Self::turbo(),
            TimingProfile::Custom => Self::normal(),
        }
    }

    /// Scale timing by factor (< 1.0 = faster)
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            profile: TimingProfile::Custom,
            shuffle_interval_ms: self.shuffle_interval_ms * factor,
            reel_stop_delays_ms: self.reel_stop_delays_ms.iter().map(|d| d * factor).collect(),
            stop_transition_ms: self.stop_transition_ms * factor,
            stop_easing: self.stop_easing,
            settle_delay_ms: self.settle_delay_ms * factor,
            settle_frames: self.settle_frames,
            reset_delay_ms: self.reset_delay_ms * factor,
            message_hide_ms: self.message_hide_ms * factor,
        }
    }

    /// Stop offset for a reel; reels beyond the table reuse the last delay
    pub fn stop_delay(&self, reel_index: usize) -> f64 {
        self.reel_stop_delays_ms
            .get(reel_index)
            .or(self.reel_stop_delays_ms.last())
            .copied()
            .unwrap_or(0.0)
    }

    /// Time from spin start until the win evaluation timer fires
    pub fn total_spin_duration(&self) -> f64 {
        let last_stop = self.reel_stop_delays_ms.last().copied().unwrap_or(0.0);
        last_stop + self.stop_transition_ms + self.settle_delay_ms
    }

    /// Check the timeline against a reel count
    pub fn validate(&self, reel_count: usize) -> ReelResult<()> {
        if self.reel_stop_delays_ms.len() != reel_count {
            return Err(ReelError::StopDelayCount {
                expected: reel_count,
                actual: self.reel_stop_delays_ms.len(),
            });
        }
        for (index, pair) in self.reel_stop_delays_ms.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(ReelError::StopDelaysNotIncreasing { index: index + 1 });
            }
        }
        if !(self.shuffle_interval_ms > 0.0) {
            return Err(ReelError::InvalidTiming(format!(
                "shuffle interval must be positive, got {}",
                self.shuffle_interval_ms
            )));
        }
        if self.settle_frames == 0 {
            return Err(ReelError::InvalidTiming(
                "at least one settle frame is required".into(),
            ));
        }
        let durations = [
            ("first stop delay", self.stop_delay(0)),
            ("stop transition", self.stop_transition_ms),
            ("settle delay", self.settle_delay_ms),
            ("reset delay", self.reset_delay_ms),
            ("message hide", self.message_hide_ms),
        ];
        for (name, value) in durations {
            if !(value >= 0.0) {
                return Err(ReelError::InvalidTiming(format!("{} is negative: {}", name, value)));
            }
        }
        Ok(())
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::normal()
    }
}
