//! # rf-reel — Reel animation controller for the ReelForge web slot widget
//!
//! Drives the purely cosmetic three-reel widget: shuffle while spinning,
//! staggered reel stops, centered-symbol detection and the three-of-a-kind
//! win banner. Nothing here touches the browser directly; the DOM and the
//! timer loop are reached through the [`ReelScene`] and [`Scheduler`] traits.
//!
//! ## Architecture
//!
//! ```text
//! ReelAnimationController<S, T, R>
//!     │
//!     ├── ReelConfig (catalog, layout, timing, messages)
//!     ├── S: ReelScene      (DOM / in-memory scene graph)
//!     ├── T: Scheduler      (browser timers / virtual clock)
//!     └── R: RandomSource   (symbol draws, stop slots)
//!           │
//!           v
//!     SpinPhase timeline → SpinTrace (Vec<StageEvent>)
//! ```
//!
//! ## Spin timeline (classic profile)
//!
//! | t (ms) | Event |
//! |--------|-------|
//! | 0 | spin start, all reels spinning, shuffle every 100 ms |
//! | 2000 / 2500 / 3000 | reel 0 / 1 / 2 stop |
//! | 3700 | settle, wait two frames |
//! | ~3730 | centered symbols measured, win banner, trigger re-enabled |
//! | +100 | strips reset to neutral |

pub mod config;
pub mod controller;
pub mod error;
pub mod random;
pub mod scene;
pub mod scheduler;
pub mod stage;
pub mod symbols;
pub mod timing;
pub mod win;

pub use config::*;
pub use controller::*;
pub use error::*;
pub use random::*;
pub use scene::*;
pub use scheduler::*;
pub use stage::*;
pub use symbols::*;
pub use timing::*;
pub use win::*;
