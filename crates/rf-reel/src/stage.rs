//! Spin stages: timeline of one spin session and session statistics
//!
//! Every side effect the controller performs during a spin is recorded as a
//! [`StageEvent`], timestamped by the scheduler clock.

use serde::{Deserialize, Serialize};

use crate::win::WinOutcome;

/// A step of the spin timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReelStage {
    /// Splash overlay dismissed (first spin only)
    SplashDismissed,
    /// Trigger accepted
    SpinStart,
    /// Reel entered the spinning state
    ReelSpinning { reel_index: usize },
    /// Reel stopped; `target_slot` is the slot centered by the transition
    ReelStop {
        reel_index: usize,
        target_slot: Option<usize>,
        offset_px: Option<f64>,
    },
    /// Terminal stop settled, waiting for frames
    EvaluateWins,
    /// Centered symbol per reel
    CenteredSymbols { symbols: Vec<Option<String>> },
    /// Win rule applied; the banner is shown for winning outcomes
    WinResult { outcome: WinOutcome },
    /// Spin-in-progress cleared, trigger enabled
    SpinEnd,
    /// Strips back at the neutral transform
    StripsReset,
    /// Banner auto-hidden
    MessageHidden,
    /// Session torn down before completing
    Disposed,
}

impl ReelStage {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::SplashDismissed => "SPLASH_DISMISSED",
            Self::SpinStart => "SPIN_START",
            Self::ReelSpinning { .. } => "REEL_SPINNING",
            Self::ReelStop { .. } => "REEL_STOP",
            Self::EvaluateWins => "EVALUATE_WINS",
            Self::CenteredSymbols { .. } => "CENTERED_SYMBOLS",
            Self::WinResult { .. } => "WIN_RESULT",
            Self::SpinEnd => "SPIN_END",
            Self::StripsReset => "STRIPS_RESET",
            Self::MessageHidden => "MESSAGE_HIDDEN",
            Self::Disposed => "DISPOSED",
        }
    }
}

/// A stage occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageEvent {
    pub stage: ReelStage,
    /// Scheduler clock at the time of the event (ms)
    pub timestamp_ms: f64,
}

impl StageEvent {
    pub fn new(stage: ReelStage, timestamp_ms: f64) -> Self {
        Self {
            stage,
            timestamp_ms,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.stage.type_name()
    }
}

/// Timeline of one spin session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpinTrace {
    /// 1-based spin number within the widget session
    pub spin_index: u64,
    /// Events in the order they happened
    pub events: Vec<StageEvent>,
}

impl SpinTrace {
    pub fn new(spin_index: u64) -> Self {
        Self {
            spin_index,
            events: Vec::new(),
        }
    }

    pub fn push(&mut self, stage: ReelStage, timestamp_ms: f64) {
        self.events.push(StageEvent::new(stage, timestamp_ms));
    }

    /// Get events by stage type name
    pub fn events_by_type(&self, type_name: &str) -> Vec<&StageEvent> {
        self.events
            .iter()
            .filter(|e| e.type_name() == type_name)
            .collect()
    }

    pub fn has_stage(&self, type_name: &str) -> bool {
        self.events.iter().any(|e| e.type_name() == type_name)
    }

    /// Stop time of each reel, in stop order
    pub fn reel_stops(&self) -> Vec<(usize, f64)> {
        self.events
            .iter()
            .filter_map(|e| match e.stage {
                ReelStage::ReelStop { reel_index, .. } => Some((reel_index, e.timestamp_ms)),
                _ => None,
            })
            .collect()
    }

    /// Win outcome, if the session got as far as evaluating
    pub fn outcome(&self) -> Option<&WinOutcome> {
        self.events.iter().find_map(|e| match &e.stage {
            ReelStage::WinResult { outcome } => Some(outcome),
            _ => None,
        })
    }

    /// Get total duration in milliseconds
    pub fn duration_ms(&self) -> f64 {
        match (self.events.first(), self.events.last()) {
            (Some(first), Some(last)) => last.timestamp_ms - first.timestamp_ms,
            _ => 0.0,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Session statistics (in memory only)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Spins started
    pub total_spins: u64,
    /// Spins that reached evaluation
    pub completed_spins: u64,
    /// Triggers ignored because a spin was in progress
    pub rejected_triggers: u64,
    /// Three-of-a-kind outcomes (jackpots included)
    pub wins: u64,
    pub jackpots: u64,
}

impl SessionStats {
    /// Calculate hit rate
    pub fn hit_rate(&self) -> f64 {
        if self.completed_spins > 0 {
            (self.wins as f64 / self.completed_spins as f64) * 100.0
        } else {
            0.0
        }
    }

    pub fn record_outcome(&mut self, outcome: &WinOutcome) {
        self.completed_spins += 1;
        if outcome.is_win() {
            self.wins += 1;
        }
        if outcome.is_jackpot() {
            self.jackpots += 1;
        }
    }
}
