//! Reel animation controller (spin lifecycle state machine)
//!
//! ```text
//! Idle ──spin()──> Spinning ──StopReel──> Stopping(k) ──last StopReel──> AllStopped
//!   ^                                                                       │
//!   │                                                                    Settle
//!   │                                                                       v
//!   └──────────── check_win (after FrameSettled × settle_frames) ──── Evaluating
//! ```
//!
//! All state changes happen inside [`ReelAnimationController::spin`] and
//! [`ReelAnimationController::dispatch`]; the host only forwards fired tasks.

use log::{debug, info, trace};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::config::ReelConfig;
use crate::error::ReelResult;
use crate::random::{RandomSource, seeded};
use crate::scene::{MemoryScene, ReelScene, StripMotion, Transition};
use crate::scheduler::{ReelTask, Scheduler, TaskHandle, VirtualScheduler};
use crate::stage::{ReelStage, SessionStats, SpinTrace};
use crate::symbols::{Symbol, identity_from_source};
use crate::win::{WinEvaluation, WinOutcome, centered_slot};

/// Upper bound on tasks fired by [`ReelAnimationController::run_until_idle`]
const MAX_IDLE_STEPS: usize = 100_000;

/// Phase of the current spin session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SpinPhase {
    #[default]
    Idle,
    /// All reels shuffling, none stopped yet
    Spinning,
    /// Some reels stopped
    Stopping { stopped: usize },
    /// Terminal stop done, settle timer armed
    AllStopped,
    /// Waiting on rendering frames before measuring
    Evaluating,
}

impl SpinPhase {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Spinning => "spinning",
            Self::Stopping { .. } => "stopping",
            Self::AllStopped => "all_stopped",
            Self::Evaluating => "evaluating",
        }
    }
}

#[derive(Debug, Clone, Default)]
struct ReelState {
    /// Catalog index per slot
    strip: Vec<usize>,
    spinning: bool,
    shuffle_timer: Option<TaskHandle>,
    stop_timer: Option<TaskHandle>,
}

#[derive(Debug, Clone, Default)]
struct SessionTimers {
    settle: Option<TaskHandle>,
    frame: Option<TaskHandle>,
    reset: Option<TaskHandle>,
    hide_message: Option<TaskHandle>,
}

/// Spin lifecycle of one widget instance
pub struct ReelAnimationController<S, T, R> {
    config: ReelConfig,
    scene: S,
    scheduler: T,
    rng: R,
    reels: Vec<ReelState>,
    phase: SpinPhase,
    is_spinning: bool,
    stopped_count: usize,
    first_play: bool,
    initialized: bool,
    timers: SessionTimers,
    trace: SpinTrace,
    stats: SessionStats,
    last_evaluation: Option<WinEvaluation>,
}

impl<S: ReelScene, T: Scheduler, R: RandomSource> ReelAnimationController<S, T, R> {
    /// Create a controller; fails only on an invalid config
    pub fn new(config: ReelConfig, scene: S, scheduler: T, rng: R) -> ReelResult<Self> {
        config.validate()?;
        let reels = vec![ReelState::default(); config.reel_count];
        Ok(Self {
            config,
            scene,
            scheduler,
            rng,
            reels,
            phase: SpinPhase::Idle,
            is_spinning: false,
            stopped_count: 0,
            first_play: true,
            initialized: false,
            timers: SessionTimers::default(),
            trace: SpinTrace::default(),
            stats: SessionStats::default(),
            last_evaluation: None,
        })
    }

    // ═══════════════════════════════════════════════════════════════════════
    // ACCESSORS
    // ═══════════════════════════════════════════════════════════════════════

    pub fn config(&self) -> &ReelConfig {
        &self.config
    }

    pub fn phase(&self) -> SpinPhase {
        self.phase
    }

    /// Spin-in-progress flag; cleared by win evaluation
    pub fn is_spinning(&self) -> bool {
        self.is_spinning
    }

    /// Reels stopped in the current session
    pub fn stopped_count(&self) -> usize {
        self.stopped_count
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn splash_dismissed(&self) -> bool {
        !self.first_play
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn scheduler(&self) -> &T {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut T {
        &mut self.scheduler
    }

    /// Timeline of the current (or last) spin session
    pub fn trace(&self) -> &SpinTrace {
        &self.trace
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Result of the last win check
    pub fn last_evaluation(&self) -> Option<&WinEvaluation> {
        self.last_evaluation.as_ref()
    }

    /// Catalog indices currently displayed on a reel
    pub fn strip(&self, reel: usize) -> Option<&[usize]> {
        self.reels.get(reel).map(|r| r.strip.as_slice())
    }

    /// Armed shuffle timer of a reel
    pub fn shuffle_timer(&self, reel: usize) -> Option<TaskHandle> {
        self.reels.get(reel).and_then(|r| r.shuffle_timer)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // LIFECYCLE
    // ═══════════════════════════════════════════════════════════════════════

    /// Fill every strip with random symbols. Runs once; later calls are no-ops.
    pub fn initialize_reels(&mut self) {
        if self.initialized {
            debug!("Reels already initialized");
            return;
        }

        let items = self.config.items_per_reel;
        let catalog_len = self.config.catalog.len();
        for reel in 0..self.reels.len() {
            let strip: Vec<usize> = (0..items).map(|_| self.rng.pick(catalog_len)).collect();
            let symbols: Vec<&Symbol> = strip
                .iter()
                .filter_map(|&i| self.config.catalog.get(i))
                .collect();
            self.scene.populate_strip(reel, &symbols);
            self.reels[reel].strip = strip;
        }

        self.initialized = true;
        debug!(
            "Initialized {} reels × {} slots",
            self.reels.len(),
            items
        );
    }

    /// Start a spin. Returns `false` (and changes nothing) while one is in progress.
    pub fn spin(&mut self) -> bool {
        if self.is_spinning {
            self.stats.rejected_triggers += 1;
            trace!("Spin ignored, phase {}", self.phase.name());
            return false;
        }

        self.stats.total_spins += 1;
        self.trace = SpinTrace::new(self.stats.total_spins);

        if self.first_play {
            self.scene.hide_splash();
            self.first_play = false;
            self.record(ReelStage::SplashDismissed);
        }

        // A spin inside the reset delay starts from neutral right away
        if let Some(reset) = self.timers.reset.take() {
            self.scheduler.cancel(reset);
            self.reset_strips();
        }

        self.is_spinning = true;
        self.scene.set_trigger_enabled(false);
        self.stopped_count = 0;
        self.phase = SpinPhase::Spinning;
        self.record(ReelStage::SpinStart);

        let period = self.config.timing.shuffle_interval_ms;
        for reel in 0..self.reels.len() {
            self.scene.set_spinning(reel, true);
            let tick = self.scheduler.set_interval(period, ReelTask::Shuffle { reel });
            let state = &mut self.reels[reel];
            state.spinning = true;
            state.shuffle_timer = Some(tick);
            self.record(ReelStage::ReelSpinning { reel_index: reel });
        }

        for reel in 0..self.reels.len() {
            let delay = self.config.timing.stop_delay(reel);
            let stop = self.scheduler.set_timeout(delay, ReelTask::StopReel { reel });
            self.reels[reel].stop_timer = Some(stop);
        }

        debug!(
            "Spin {} started, stops at {:?} ms",
            self.stats.total_spins, self.config.timing.reel_stop_delays_ms
        );
        true
    }

    /// Entry point for every fired task. Stale handles are ignored.
    pub fn dispatch(&mut self, handle: TaskHandle, task: ReelTask) {
        match task {
            ReelTask::Shuffle { reel } => self.shuffle_reel(handle, reel),
            ReelTask::StopReel { reel } => self.stop_reel(handle, reel),
            ReelTask::Settle => {
                if Self::claim(&mut self.timers.settle, handle) {
                    self.settle();
                } else {
                    trace!("Stale settle callback {:?}", handle);
                }
            }
            ReelTask::FrameSettled { remaining } => {
                if !Self::claim(&mut self.timers.frame, handle) {
                    trace!("Stale frame callback {:?}", handle);
                } else if remaining == 0 {
                    self.check_win();
                } else {
                    let next = self.scheduler.request_frame(ReelTask::FrameSettled {
                        remaining: remaining - 1,
                    });
                    self.timers.frame = Some(next);
                }
            }
            ReelTask::ResetStrips => {
                if Self::claim(&mut self.timers.reset, handle) {
                    self.reset_strips();
                    self.record(ReelStage::StripsReset);
                }
            }
            ReelTask::HideMessage => {
                if Self::claim(&mut self.timers.hide_message, handle) {
                    self.scene.hide_message();
                    self.record(ReelStage::MessageHidden);
                }
            }
        }
    }

    /// Put every strip back at the neutral transform with transitions off
    pub fn reset_strips(&mut self) {
        let neutral = StripMotion::neutral();
        for reel in 0..self.reels.len() {
            self.scene.set_strip_motion(reel, &neutral);
        }
    }

    /// Measure the centered symbol of every reel and apply the win rule.
    ///
    /// Read-only; the controller calls this after the frame wait.
    pub fn evaluate_centers(&self) -> WinEvaluation {
        let centers = (0..self.reels.len())
            .map(|reel| {
                let geometry = self.scene.measure(reel);
                centered_slot(&geometry)
                    .and_then(|slot| self.scene.slot_source(reel, slot))
                    .and_then(|source| identity_from_source(&source))
            })
            .collect();
        WinEvaluation::evaluate(centers, self.config.catalog.jackpot())
    }

    /// Cancel everything pending and return to a clean idle state
    pub fn dispose(&mut self) {
        let mut cancelled = 0;
        for state in &mut self.reels {
            for handle in [state.shuffle_timer.take(), state.stop_timer.take()]
                .into_iter()
                .flatten()
            {
                self.scheduler.cancel(handle);
                cancelled += 1;
            }
        }
        let timers = std::mem::take(&mut self.timers);
        for handle in [timers.settle, timers.frame, timers.reset, timers.hide_message]
            .into_iter()
            .flatten()
        {
            self.scheduler.cancel(handle);
            cancelled += 1;
        }

        if self.is_spinning {
            self.record(ReelStage::Disposed);
        }

        for reel in 0..self.reels.len() {
            self.reels[reel].spinning = false;
            self.scene.set_spinning(reel, false);
        }
        self.reset_strips();
        self.scene.hide_message();
        self.scene.set_trigger_enabled(true);
        self.is_spinning = false;
        self.stopped_count = 0;
        self.phase = SpinPhase::Idle;

        debug!("Controller disposed, {} timers cancelled", cancelled);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // TIMELINE
    // ═══════════════════════════════════════════════════════════════════════

    fn shuffle_reel(&mut self, handle: TaskHandle, reel: usize) {
        let live = self
            .reels
            .get(reel)
            .is_some_and(|r| r.spinning && r.shuffle_timer == Some(handle));
        if !live {
            // Interval outlived its reel's spin; clear it
            self.scheduler.cancel(handle);
            trace!("Stale shuffle tick on reel {}", reel);
            return;
        }

        let catalog_len = self.config.catalog.len();
        let state = &mut self.reels[reel];
        for slot in 0..state.strip.len() {
            let index = self.rng.pick(catalog_len);
            state.strip[slot] = index;
            if let Some(symbol) = self.config.catalog.get(index) {
                self.scene.set_slot_symbol(reel, slot, symbol);
            }
        }
    }

    fn stop_reel(&mut self, handle: TaskHandle, reel: usize) {
        let Some(state) = self.reels.get_mut(reel) else {
            return;
        };
        if state.stop_timer != Some(handle) {
            trace!("Stale stop callback on reel {}", reel);
            return;
        }
        state.stop_timer = None;
        state.spinning = false;
        if let Some(tick) = state.shuffle_timer.take() {
            self.scheduler.cancel(tick);
        }
        self.scene.set_spinning(reel, false);

        let target = self.center_target(reel);
        if let Some((_, offset_px)) = target {
            let motion = StripMotion {
                offset_px,
                transition: Some(Transition {
                    duration_ms: self.config.timing.stop_transition_ms,
                    easing: self.config.timing.stop_easing,
                }),
            };
            self.scene.set_strip_motion(reel, &motion);
        }

        self.stopped_count += 1;
        self.record(ReelStage::ReelStop {
            reel_index: reel,
            target_slot: target.map(|(slot, _)| slot),
            offset_px: target.map(|(_, offset)| offset),
        });

        if self.stopped_count == self.reels.len() {
            self.phase = SpinPhase::AllStopped;
            let delay = self.config.timing.stop_transition_ms + self.config.timing.settle_delay_ms;
            self.timers.settle = Some(self.scheduler.set_timeout(delay, ReelTask::Settle));
            debug!("All reels stopped, evaluating in {} ms", delay);
        } else {
            self.phase = SpinPhase::Stopping {
                stopped: self.stopped_count,
            };
        }
    }

    /// Pick an interior slot and the strip offset that centers it
    fn center_target(&mut self, reel: usize) -> Option<(usize, f64)> {
        let geometry = self.scene.measure(reel);
        let item_height = geometry.item_height()?;
        let count = geometry.slots.len();
        let (lo, hi) = if count >= 3 { (1, count - 2) } else { (0, count - 1) };
        let slot = self.rng.pick_range(lo, hi);

        let pitch = item_height * (1.0 + self.config.layout.item_margin_ratio);
        let offset = slot as f64 * pitch - geometry.viewport_height / 2.0 + item_height / 2.0;
        Some((slot, offset))
    }

    fn settle(&mut self) {
        self.phase = SpinPhase::Evaluating;
        self.record(ReelStage::EvaluateWins);
        let frames = self.config.timing.settle_frames.max(1);
        let frame = self.scheduler.request_frame(ReelTask::FrameSettled {
            remaining: frames - 1,
        });
        self.timers.frame = Some(frame);
    }

    fn check_win(&mut self) -> WinOutcome {
        if let Some(hide) = self.timers.hide_message.take() {
            self.scheduler.cancel(hide);
        }
        self.scene.hide_message();

        let evaluation = self.evaluate_centers();
        self.record(ReelStage::CenteredSymbols {
            symbols: evaluation.centers.clone(),
        });

        let outcome = evaluation.outcome();
        let banner = match &outcome {
            WinOutcome::ThreeOfAKind { .. } => Some((&self.config.messages.three_of_a_kind, false)),
            WinOutcome::Jackpot { .. } => Some((&self.config.messages.jackpot, true)),
            WinOutcome::NoWin => None,
        };
        if let Some((text, jackpot)) = banner {
            self.scene.show_message(text, jackpot);
            let hide = self
                .scheduler
                .set_timeout(self.config.timing.message_hide_ms, ReelTask::HideMessage);
            self.timers.hide_message = Some(hide);
        }
        self.record(ReelStage::WinResult {
            outcome: outcome.clone(),
        });
        self.stats.record_outcome(&outcome);
        info!(
            "Spin {} result: {:?} (centers {:?})",
            self.trace.spin_index, outcome, evaluation.centers
        );
        self.last_evaluation = Some(evaluation);

        self.is_spinning = false;
        self.scene.set_trigger_enabled(true);
        self.phase = SpinPhase::Idle;
        self.record(ReelStage::SpinEnd);

        let reset = self
            .scheduler
            .set_timeout(self.config.timing.reset_delay_ms, ReelTask::ResetStrips);
        self.timers.reset = Some(reset);

        outcome
    }

    /// Take the slot if it holds `handle`
    fn claim(slot: &mut Option<TaskHandle>, handle: TaskHandle) -> bool {
        if *slot == Some(handle) {
            *slot = None;
            true
        } else {
            false
        }
    }

    fn record(&mut self, stage: ReelStage) {
        let now = self.scheduler.now_ms();
        self.trace.push(stage, now);
    }
}

/// Controller wired to the in-memory scene and virtual clock
pub type HeadlessController = ReelAnimationController<MemoryScene, VirtualScheduler, StdRng>;

impl HeadlessController {
    /// Headless controller with a seeded RNG
    pub fn headless(config: ReelConfig, seed: u64) -> ReelResult<Self> {
        let scene = MemoryScene::with_layout(
            config.reel_count,
            100.0,
            config.layout.item_margin_ratio,
            300.0,
        );
        Self::new(config, scene, VirtualScheduler::new(), seeded(seed))
    }
}

impl<S: ReelScene, R: RandomSource> ReelAnimationController<S, VirtualScheduler, R> {
    /// Advance the virtual clock by `ms`, firing every task due on the way.
    /// Returns the number of tasks fired.
    pub fn advance(&mut self, ms: f64) -> usize {
        let until = self.scheduler.now_ms() + ms;
        let mut fired = 0;
        while let Some((handle, task)) = self.scheduler.pop_due(until) {
            self.dispatch(handle, task);
            fired += 1;
        }
        self.scheduler.advance_clock(until);
        fired
    }

    /// Fire tasks until nothing is armed (banner hide and strip reset included)
    pub fn run_until_idle(&mut self) -> usize {
        let mut fired = 0;
        while let Some((handle, task)) = self.scheduler.pop_due(f64::MAX) {
            self.dispatch(handle, task);
            fired += 1;
            if fired >= MAX_IDLE_STEPS {
                log::warn!("run_until_idle gave up after {} tasks", fired);
                break;
            }
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn headless() -> HeadlessController {
        let mut ctrl = HeadlessController::headless(ReelConfig::classic(), 7).unwrap();
        ctrl.initialize_reels();
        ctrl
    }

    #[test]
    fn test_initialize_once() {
        let mut ctrl = headless();
        let before: Vec<Vec<usize>> = (0..3).map(|r| ctrl.strip(r).unwrap().to_vec()).collect();
        ctrl.initialize_reels();
        let after: Vec<Vec<usize>> = (0..3).map(|r| ctrl.strip(r).unwrap().to_vec()).collect();
        assert_eq!(before, after);
        for reel in 0..3 {
            assert_eq!(ctrl.scene().slot_count(reel), 15);
        }
    }

    #[test]
    fn test_spin_arms_timeline() {
        let mut ctrl = headless();
        assert!(ctrl.spin());
        assert_eq!(ctrl.phase(), SpinPhase::Spinning);
        assert!(ctrl.is_spinning());
        assert!(!ctrl.scene().trigger_enabled());
        assert!(!ctrl.scene().splash_visible());
        // 3 shuffle intervals + 3 stops, in firing order
        assert_eq!(ctrl.scheduler().pending_count(), 6);
        let tasks: Vec<ReelTask> = ctrl
            .scheduler()
            .pending_tasks()
            .into_iter()
            .map(|(_, task)| task)
            .collect();
        assert_eq!(
            tasks,
            vec![
                ReelTask::Shuffle { reel: 0 },
                ReelTask::Shuffle { reel: 1 },
                ReelTask::Shuffle { reel: 2 },
                ReelTask::StopReel { reel: 0 },
                ReelTask::StopReel { reel: 1 },
                ReelTask::StopReel { reel: 2 },
            ]
        );
        for reel in 0..3 {
            assert!(ctrl.scene().is_spinning(reel));
            assert!(ctrl.shuffle_timer(reel).is_some());
        }
    }

    #[test]
    fn test_phases_follow_stops() {
        let mut ctrl = headless();
        ctrl.spin();

        ctrl.advance(2000.0);
        assert_eq!(ctrl.phase(), SpinPhase::Stopping { stopped: 1 });
        ctrl.advance(500.0);
        assert_eq!(ctrl.phase(), SpinPhase::Stopping { stopped: 2 });
        ctrl.advance(500.0);
        assert_eq!(ctrl.phase(), SpinPhase::AllStopped);
        assert!(ctrl.is_spinning());

        // settle = 500 ms transition + 200 ms delay
        ctrl.advance(700.0);
        assert_eq!(ctrl.phase(), SpinPhase::Evaluating);
        assert!(ctrl.is_spinning());

        // two frames on a 16 ms cadence: 3712, 3728
        ctrl.advance(28.0);
        assert_eq!(ctrl.phase(), SpinPhase::Idle);
        assert!(!ctrl.is_spinning());
        assert!(ctrl.scene().trigger_enabled());
    }

    #[test]
    fn test_stop_centers_target_slot() {
        let mut ctrl = headless();
        ctrl.spin();
        ctrl.advance(2000.0);

        let stop = ctrl.trace().events_by_type("REEL_STOP")[0].stage.clone();
        let ReelStage::ReelStop {
            target_slot: Some(slot),
            offset_px: Some(offset),
            ..
        } = stop
        else {
            panic!("reel 0 stop missing target");
        };
        assert!((1..=13).contains(&slot));
        assert_relative_eq!(offset, slot as f64 * 104.0 - 150.0 + 50.0);

        let motion = ctrl.scene().strip_motion(0);
        assert_relative_eq!(motion.offset_px, offset);
        assert_eq!(
            motion.transition.map(|t| t.duration_ms),
            Some(500.0)
        );
        assert_eq!(centered_slot(&ctrl.scene().measure(0)), Some(slot));
    }

    #[test]
    fn test_reset_after_evaluation() {
        let mut ctrl = headless();
        ctrl.spin();
        ctrl.advance(3728.0);
        assert!(!ctrl.is_spinning());
        assert!(!ctrl.scene().strip_motion(2).is_neutral());

        ctrl.advance(100.0);
        for reel in 0..3 {
            assert!(ctrl.scene().strip_motion(reel).is_neutral());
        }
        assert!(ctrl.trace().has_stage("STRIPS_RESET"));
    }

    #[test]
    fn test_spin_during_reset_delay_starts_neutral() {
        let mut ctrl = headless();
        ctrl.spin();
        ctrl.advance(3728.0);
        assert!(ctrl.spin());
        for reel in 0..3 {
            assert!(ctrl.scene().strip_motion(reel).is_neutral());
        }
        // the flushed reset timer never fires into the new session
        ctrl.advance(100.0);
        assert!(!ctrl.trace().has_stage("STRIPS_RESET"));
    }

    #[test]
    fn test_dispose_cancels_everything() {
        let mut ctrl = headless();
        ctrl.spin();
        ctrl.advance(2100.0);
        ctrl.dispose();

        assert_eq!(ctrl.scheduler().pending_count(), 0);
        assert_eq!(ctrl.phase(), SpinPhase::Idle);
        assert!(!ctrl.is_spinning());
        assert!(ctrl.scene().trigger_enabled());
        assert!(ctrl.trace().has_stage("DISPOSED"));
        assert_eq!(ctrl.advance(10_000.0), 0);

        // usable again afterwards
        assert!(ctrl.spin());
    }

    #[test]
    fn test_spin_before_initialize_is_no_win() {
        let mut ctrl = HeadlessController::headless(ReelConfig::classic(), 1).unwrap();
        ctrl.spin();
        ctrl.run_until_idle();
        let evaluation = ctrl.last_evaluation().unwrap();
        assert_eq!(evaluation.centers, vec![None, None, None]);
        assert_eq!(ctrl.trace().outcome(), Some(&WinOutcome::NoWin));
        assert!(ctrl.scene().banner().is_none());
        assert!(!ctrl.is_spinning());
    }
}
