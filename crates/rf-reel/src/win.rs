//! Centered-symbol detection and the three-of-a-kind win rule

use serde::{Deserialize, Serialize};

use crate::scene::ReelGeometry;

/// Index of the slot whose vertical center is nearest the viewport center.
///
/// Linear scan; the first slot wins ties. `None` for an empty strip.
pub fn centered_slot(geometry: &ReelGeometry) -> Option<usize> {
    let target = geometry.viewport_center();
    geometry
        .slots
        .iter()
        .enumerate()
        .map(|(i, slot)| (i, (slot.center() - target).abs()))
        .fold(None, |best: Option<(usize, f64)>, (i, distance)| match best {
            Some((_, best_distance)) if best_distance <= distance => best,
            _ => Some((i, distance)),
        })
        .map(|(i, _)| i)
}

/// Result of a win check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinOutcome {
    /// Any mismatch or missing symbol
    NoWin,
    /// All reels show the same non-jackpot symbol
    ThreeOfAKind { symbol: String },
    /// All reels show the jackpot symbol
    Jackpot { symbol: String },
}

impl WinOutcome {
    pub fn is_win(&self) -> bool {
        !matches!(self, Self::NoWin)
    }

    pub fn is_jackpot(&self) -> bool {
        matches!(self, Self::Jackpot { .. })
    }

    /// Winning symbol identity
    pub fn symbol(&self) -> Option<&str> {
        match self {
            Self::NoWin => None,
            Self::ThreeOfAKind { symbol } | Self::Jackpot { symbol } => Some(symbol),
        }
    }
}

/// Centered symbols of one evaluation and the derived flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinEvaluation {
    /// Centered identity per reel, `None` where detection failed
    pub centers: Vec<Option<String>>,
    /// Every reel shows the same non-null symbol
    pub all_equal: bool,
    /// That shared symbol is the jackpot symbol
    pub is_jackpot: bool,
}

impl WinEvaluation {
    pub fn evaluate(centers: Vec<Option<String>>, jackpot: &str) -> Self {
        let shared = match centers.split_first() {
            Some((Some(first), rest))
                if rest.iter().all(|c| c.as_deref() == Some(first.as_str())) =>
            {
                Some(first.clone())
            }
            _ => None,
        };
        let is_jackpot = shared.as_deref() == Some(jackpot);
        Self {
            all_equal: shared.is_some(),
            is_jackpot,
            centers,
        }
    }

    pub fn outcome(&self) -> WinOutcome {
        match (self.all_equal, self.centers.first()) {
            (true, Some(Some(symbol))) if self.is_jackpot => WinOutcome::Jackpot {
                symbol: symbol.clone(),
            },
            (true, Some(Some(symbol))) => WinOutcome::ThreeOfAKind {
                symbol: symbol.clone(),
            },
            _ => WinOutcome::NoWin,
        }
    }
}
