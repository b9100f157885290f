//! Scene abstraction for the DOM-like tree the controller mutates

use serde::{Deserialize, Serialize};

use crate::symbols::Symbol;
use crate::timing::Easing;

/// Animated property change
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub duration_ms: f64,
    pub easing: Easing,
}

/// Strip transform state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StripMotion {
    /// Upward translation in px (rendered as `translateY(-offset)`)
    pub offset_px: f64,
    /// `None` disables transitions
    pub transition: Option<Transition>,
}

impl StripMotion {
    /// Resting state between spins: no translation, no transition
    pub fn neutral() -> Self {
        Self {
            offset_px: 0.0,
            transition: None,
        }
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::neutral()
    }
}

impl Default for StripMotion {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Measured slot box (viewport coordinates, px)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlotBox {
    pub top: f64,
    pub height: f64,
}

impl SlotBox {
    pub fn center(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

/// Measured layout of one reel
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReelGeometry {
    /// Top of the reel viewport (px)
    pub viewport_top: f64,
    /// Height of the reel viewport (px)
    pub viewport_height: f64,
    /// Slot boxes in strip order
    pub slots: Vec<SlotBox>,
}

impl ReelGeometry {
    pub fn viewport_center(&self) -> f64 {
        self.viewport_top + self.viewport_height / 2.0
    }

    /// Height of the first slot; all slots share it
    pub fn item_height(&self) -> Option<f64> {
        self.slots.first().map(|s| s.height)
    }
}

/// Scene graph operations the controller needs.
///
/// Implementations must not call back into the controller.
pub trait ReelScene {
    /// Fill a reel's strip with one slot per symbol (page load only)
    fn populate_strip(&mut self, reel: usize, symbols: &[&Symbol]);

    /// Replace the image shown in one slot
    fn set_slot_symbol(&mut self, reel: usize, slot: usize, symbol: &Symbol);

    /// Raw image source of a slot, `None` when the slot or its source is missing
    fn slot_source(&self, reel: usize, slot: usize) -> Option<String>;

    /// Toggle the spinning visual state
    fn set_spinning(&mut self, reel: usize, spinning: bool);

    /// Apply strip transform and transition
    fn set_strip_motion(&mut self, reel: usize, motion: &StripMotion);

    /// Measure viewport and slot boxes as currently rendered
    fn measure(&self, reel: usize) -> ReelGeometry;

    /// Hide the one-time splash overlay
    fn hide_splash(&mut self);

    /// Enable or disable the spin trigger
    fn set_trigger_enabled(&mut self, enabled: bool);

    /// Show the win banner
    fn show_message(&mut self, text: &str, jackpot: bool);

    /// Hide the win banner
    fn hide_message(&mut self);
}

/// Banner state of a [`MemoryScene`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannerState {
    pub text: String,
    pub jackpot: bool,
}

#[derive(Debug, Clone, Default)]
struct MemoryReel {
    slots: Vec<Option<String>>,
    spinning: bool,
    motion: StripMotion,
    /// Slot writes since population
    slot_writes: u64,
}

/// In-memory scene with the shipped stylesheet's geometry.
///
/// Transforms apply instantly, so a measurement after a stop reads the
/// resting position. Used by tests and the headless simulator.
#[derive(Debug, Clone)]
pub struct MemoryScene {
    reels: Vec<MemoryReel>,
    item_height: f64,
    item_margin: f64,
    viewport_height: f64,
    splash_visible: bool,
    trigger_enabled: bool,
    banner: Option<BannerState>,
    banners_shown: u32,
}

impl MemoryScene {
    /// Scene with `reel_count` empty reels: 100 px slots, 4% margin, 300 px viewport
    pub fn new(reel_count: usize) -> Self {
        Self::with_layout(reel_count, 100.0, 0.04, 300.0)
    }

    pub fn with_layout(
        reel_count: usize,
        item_height: f64,
        item_margin_ratio: f64,
        viewport_height: f64,
    ) -> Self {
        Self {
            reels: vec![MemoryReel::default(); reel_count],
            item_height,
            item_margin: item_height * item_margin_ratio,
            viewport_height,
            splash_visible: true,
            trigger_enabled: true,
            banner: None,
            banners_shown: 0,
        }
    }

    pub fn reel_count(&self) -> usize {
        self.reels.len()
    }

    /// Slot sources of a reel
    pub fn slot_sources(&self, reel: usize) -> Vec<Option<String>> {
        self.reels.get(reel).map(|r| r.slots.clone()).unwrap_or_default()
    }

    pub fn slot_count(&self, reel: usize) -> usize {
        self.reels.get(reel).map(|r| r.slots.len()).unwrap_or(0)
    }

    /// Overwrite a slot's source directly (`None` clears it)
    pub fn set_slot_source(&mut self, reel: usize, slot: usize, source: Option<&str>) {
        if let Some(entry) = self.reels.get_mut(reel).and_then(|r| r.slots.get_mut(slot)) {
            *entry = source.map(str::to_string);
        }
    }

    /// Slot writes on a reel since population
    pub fn slot_writes(&self, reel: usize) -> u64 {
        self.reels.get(reel).map(|r| r.slot_writes).unwrap_or(0)
    }

    pub fn is_spinning(&self, reel: usize) -> bool {
        self.reels.get(reel).is_some_and(|r| r.spinning)
    }

    pub fn strip_motion(&self, reel: usize) -> StripMotion {
        self.reels.get(reel).map(|r| r.motion).unwrap_or_default()
    }

    pub fn splash_visible(&self) -> bool {
        self.splash_visible
    }

    pub fn trigger_enabled(&self) -> bool {
        self.trigger_enabled
    }

    /// Banner currently displayed
    pub fn banner(&self) -> Option<&BannerState> {
        self.banner.as_ref()
    }

    /// Banners shown since creation
    pub fn banners_shown(&self) -> u32 {
        self.banners_shown
    }

    /// Distance between consecutive slot tops
    pub fn slot_pitch(&self) -> f64 {
        self.item_height + self.item_margin
    }
}

impl ReelScene for MemoryScene {
    fn populate_strip(&mut self, reel: usize, symbols: &[&Symbol]) {
        if let Some(r) = self.reels.get_mut(reel) {
            r.slots = symbols.iter().map(|s| Some(s.path.clone())).collect();
            r.slot_writes = 0;
        }
    }

    fn set_slot_symbol(&mut self, reel: usize, slot: usize, symbol: &Symbol) {
        if let Some(r) = self.reels.get_mut(reel) {
            if let Some(entry) = r.slots.get_mut(slot) {
                *entry = Some(symbol.path.clone());
                r.slot_writes += 1;
            }
        }
    }

    fn slot_source(&self, reel: usize, slot: usize) -> Option<String> {
        self.reels.get(reel)?.slots.get(slot)?.clone()
    }

    fn set_spinning(&mut self, reel: usize, spinning: bool) {
        if let Some(r) = self.reels.get_mut(reel) {
            r.spinning = spinning;
        }
    }

    fn set_strip_motion(&mut self, reel: usize, motion: &StripMotion) {
        if let Some(r) = self.reels.get_mut(reel) {
            r.motion = *motion;
        }
    }

    fn measure(&self, reel: usize) -> ReelGeometry {
        let Some(r) = self.reels.get(reel) else {
            return ReelGeometry::default();
        };
        let pitch = self.slot_pitch();
        let slots = (0..r.slots.len())
            .map(|i| SlotBox {
                top: i as f64 * pitch + self.item_margin / 2.0 - r.motion.offset_px,
                height: self.item_height,
            })
            .collect();
        ReelGeometry {
            viewport_top: 0.0,
            viewport_height: self.viewport_height,
            slots,
        }
    }

    fn hide_splash(&mut self) {
        self.splash_visible = false;
    }

    fn set_trigger_enabled(&mut self, enabled: bool) {
        self.trigger_enabled = enabled;
    }

    fn show_message(&mut self, text: &str, jackpot: bool) {
        self.banner = Some(BannerState {
            text: text.to_string(),
            jackpot,
        });
        self.banners_shown += 1;
    }

    fn hide_message(&mut self) {
        self.banner = None;
    }
}
