//! Widget configuration

use serde::{Deserialize, Serialize};

use crate::error::{ReelError, ReelResult};
use crate::symbols::SymbolCatalog;
use crate::timing::{TimingConfig, TimingProfile};

/// Strip layout parameters the stop offset depends on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Vertical margin around each slot, as a fraction of the slot height
    /// (2% top + 2% bottom in the shipped stylesheet)
    pub item_margin_ratio: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            item_margin_ratio: 0.04,
        }
    }
}

/// Banner texts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageConfig {
    /// Plain three-of-a-kind banner
    pub three_of_a_kind: String,
    /// Jackpot banner
    pub jackpot: String,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            three_of_a_kind: "THREE IN A ROW!".into(),
            jackpot: "JACKPOT! 777".into(),
        }
    }
}

/// Complete widget configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReelConfig {
    /// Symbols the reels draw from
    #[serde(default)]
    pub catalog: SymbolCatalog,

    /// Number of reels
    pub reel_count: usize,

    /// Slots per strip
    pub items_per_reel: usize,

    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub timing: TimingConfig,

    #[serde(default)]
    pub messages: MessageConfig,
}

impl ReelConfig {
    /// The shipped three-reel widget
    pub fn classic() -> Self {
        Self {
            catalog: SymbolCatalog::classic(),
            reel_count: 3,
            items_per_reel: 15,
            layout: LayoutConfig::default(),
            timing: TimingConfig::normal(),
            messages: MessageConfig::default(),
        }
    }

    /// Classic widget with a different timing profile
    pub fn with_profile(profile: TimingProfile) -> Self {
        Self {
            timing: TimingConfig::from_profile(profile),
            ..Self::classic()
        }
    }

    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> ReelResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a YAML config
    pub fn from_yaml(yaml: &str) -> ReelResult<Self> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> ReelResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> ReelResult<()> {
        self.catalog.validate()?;
        if self.reel_count == 0 {
            return Err(ReelError::NoReels);
        }
        if self.items_per_reel < 3 {
            return Err(ReelError::TooFewSlots(self.items_per_reel));
        }
        if !(self.layout.item_margin_ratio >= 0.0) {
            return Err(ReelError::InvalidLayout(format!(
                "item margin ratio is negative: {}",
                self.layout.item_margin_ratio
            )));
        }
        self.timing.validate(self.reel_count)
    }
}

impl Default for ReelConfig {
    fn default() -> Self {
        Self::classic()
    }
}
