//! Controller Timeline Test Suite
//!
//! Drives a full widget session on the virtual clock:
//! - Reel population
//! - Re-entrancy of the spin trigger
//! - Staggered stops and shuffle cessation
//! - Win / jackpot / no-win evaluation
//! - Strip reset, banner auto-hide and teardown

use proptest::prelude::*;
use rf_reel::{
    HeadlessController, MemoryScene, RandomSource, ReelAnimationController, ReelConfig,
    ReelStage, SpinPhase, TimingConfig, TimingProfile, VirtualScheduler, WinOutcome,
};
use rstest::rstest;

// ═══════════════════════════════════════════════════════════════════════════════
// TEST FIXTURES
// ═══════════════════════════════════════════════════════════════════════════════

/// Always draws the same catalog index
struct ConstantRandom(usize);

impl RandomSource for ConstantRandom {
    fn pick(&mut self, upper: usize) -> usize {
        if upper == 0 { 0 } else { self.0 % upper }
    }
}

type ConstantController = ReelAnimationController<MemoryScene, VirtualScheduler, ConstantRandom>;

fn constant_controller(index: usize) -> ConstantController {
    let config = ReelConfig::classic();
    let scene = MemoryScene::new(config.reel_count);
    let mut ctrl =
        ReelAnimationController::new(config, scene, VirtualScheduler::new(), ConstantRandom(index))
            .unwrap();
    ctrl.initialize_reels();
    ctrl
}

fn seeded_controller(seed: u64) -> HeadlessController {
    let mut ctrl = HeadlessController::headless(ReelConfig::classic(), seed).unwrap();
    ctrl.initialize_reels();
    ctrl
}

/// Slot each reel stopped on, from the trace
fn target_slots(ctrl: &ConstantController) -> Vec<usize> {
    ctrl.trace()
        .events
        .iter()
        .filter_map(|e| match e.stage {
            ReelStage::ReelStop { target_slot, .. } => target_slot,
            _ => None,
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// INITIALIZATION
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_initialize_populates_every_slot_from_catalog() {
    let ctrl = seeded_controller(11);
    let catalog = &ctrl.config().catalog;
    for reel in 0..3 {
        let sources = ctrl.scene().slot_sources(reel);
        assert_eq!(sources.len(), 15);
        for source in sources {
            let source = source.expect("populated slot has a source");
            assert!(catalog.iter().any(|s| s.path == source), "{source}");
        }
    }
    assert!(ctrl.scene().splash_visible());
    assert_eq!(ctrl.phase(), SpinPhase::Idle);
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut config = ReelConfig::classic();
    config.items_per_reel = 2;
    assert!(HeadlessController::headless(config, 0).is_err());
}

// ═══════════════════════════════════════════════════════════════════════════════
// RE-ENTRANCY
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_spin_while_spinning_is_ignored() {
    let mut ctrl = seeded_controller(3);
    assert!(ctrl.spin());
    ctrl.advance(1200.0);

    let pending = ctrl.scheduler().pending_count();
    let events = ctrl.trace().events.len();
    assert!(!ctrl.spin());
    assert!(!ctrl.spin());

    assert_eq!(ctrl.scheduler().pending_count(), pending);
    assert_eq!(ctrl.trace().events.len(), events);
    assert_eq!(ctrl.stats().total_spins, 1);
    assert_eq!(ctrl.stats().rejected_triggers, 2);
}

#[test]
fn test_trigger_disabled_until_evaluation() {
    let mut ctrl = seeded_controller(5);
    ctrl.spin();

    ctrl.advance(3700.0);
    assert!(ctrl.is_spinning());
    assert!(!ctrl.scene().trigger_enabled());
    assert!(!ctrl.spin());

    ctrl.advance(28.0);
    assert!(!ctrl.is_spinning());
    assert!(ctrl.scene().trigger_enabled());
    assert!(ctrl.spin());
}

#[test]
fn test_splash_dismissed_once() {
    let mut ctrl = seeded_controller(9);
    ctrl.spin();
    assert!(ctrl.trace().has_stage("SPLASH_DISMISSED"));
    ctrl.run_until_idle();

    ctrl.spin();
    assert!(!ctrl.trace().has_stage("SPLASH_DISMISSED"));
    assert!(ctrl.splash_dismissed());
    assert!(!ctrl.scene().splash_visible());
}

// ═══════════════════════════════════════════════════════════════════════════════
// STOPS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_reels_stop_in_stagger_order() {
    let mut ctrl = seeded_controller(21);
    ctrl.spin();
    ctrl.run_until_idle();

    assert_eq!(
        ctrl.trace().reel_stops(),
        vec![(0, 2000.0), (1, 2500.0), (2, 3000.0)]
    );
    let evaluate = ctrl.trace().events_by_type("EVALUATE_WINS");
    assert_eq!(evaluate[0].timestamp_ms, 3700.0);
}

#[test]
fn test_settle_counts_from_end_of_stop_transition() {
    let mut ctrl = seeded_controller(6);
    ctrl.spin();
    ctrl.run_until_idle();

    let timing = &ctrl.config().timing;
    let (_, last_stop) = *ctrl.trace().reel_stops().last().unwrap();
    let evaluate = ctrl.trace().events_by_type("EVALUATE_WINS")[0].timestamp_ms;
    assert_eq!(
        evaluate - last_stop,
        timing.stop_transition_ms + timing.settle_delay_ms
    );
}

#[test]
fn test_stopped_reel_no_longer_shuffles() {
    let mut ctrl = seeded_controller(4);
    ctrl.spin();

    ctrl.advance(1000.0);
    assert!(ctrl.scene().slot_writes(0) > 0);

    ctrl.advance(1000.0);
    assert!(!ctrl.scene().is_spinning(0));
    assert!(ctrl.shuffle_timer(0).is_none());
    let frozen = ctrl.scene().slot_writes(0);
    let reel1 = ctrl.scene().slot_writes(1);

    ctrl.advance(400.0);
    assert_eq!(ctrl.scene().slot_writes(0), frozen);
    assert!(ctrl.scene().slot_writes(1) > reel1);
    assert!(ctrl.scene().is_spinning(1));
}

#[test]
fn test_stop_targets_stay_interior() {
    for seed in 0..40 {
        let mut ctrl = seeded_controller(seed);
        ctrl.spin();
        ctrl.advance(3000.0);
        for event in ctrl.trace().events_by_type("REEL_STOP") {
            let ReelStage::ReelStop { target_slot, .. } = event.stage else {
                unreachable!();
            };
            let slot = target_slot.expect("populated reel has a target");
            assert!((1..=13).contains(&slot), "seed {seed}: slot {slot}");
        }
    }
}

#[test]
fn test_turbo_profile_shortens_timeline() {
    let mut ctrl =
        HeadlessController::headless(ReelConfig::with_profile(TimingProfile::Turbo), 2).unwrap();
    ctrl.initialize_reels();
    ctrl.spin();
    ctrl.run_until_idle();

    let turbo = TimingConfig::turbo();
    assert_eq!(
        ctrl.trace().reel_stops(),
        vec![(0, 800.0), (1, 1000.0), (2, 1200.0)]
    );
    let evaluate = ctrl.trace().events_by_type("EVALUATE_WINS");
    assert_eq!(evaluate[0].timestamp_ms, turbo.total_spin_duration());
}

// ═══════════════════════════════════════════════════════════════════════════════
// WIN EVALUATION
// ═══════════════════════════════════════════════════════════════════════════════

#[rstest]
#[case(0, WinOutcome::ThreeOfAKind { symbol: "cherri.png".into() }, "THREE IN A ROW!", false)]
#[case(4, WinOutcome::Jackpot { symbol: "7.png".into() }, "JACKPOT! 777", true)]
#[case(5, WinOutcome::ThreeOfAKind { symbol: "hores shoe.png".into() }, "THREE IN A ROW!", false)]
fn test_matching_centers_win(
    #[case] index: usize,
    #[case] expected: WinOutcome,
    #[case] text: &str,
    #[case] jackpot: bool,
) {
    let mut ctrl = constant_controller(index);
    ctrl.spin();
    ctrl.advance(3728.0);

    assert_eq!(ctrl.trace().outcome(), Some(&expected));
    let banner = ctrl.scene().banner().expect("win shows a banner");
    assert_eq!(banner.text, text);
    assert_eq!(banner.jackpot, jackpot);
    assert_eq!(ctrl.stats().wins, 1);
    assert_eq!(ctrl.stats().jackpots, u64::from(jackpot));
}

#[test]
fn test_mismatched_center_is_no_win() {
    let mut ctrl = constant_controller(0);
    ctrl.spin();
    ctrl.advance(3000.0);

    let slots = target_slots(&ctrl);
    assert_eq!(slots.len(), 3);
    ctrl.scene_mut()
        .set_slot_source(1, slots[1], Some("static/images/diamond.png"));
    ctrl.advance(728.0);

    let evaluation = ctrl.last_evaluation().unwrap();
    assert_eq!(
        evaluation.centers,
        vec![
            Some("cherri.png".to_string()),
            Some("diamond.png".to_string()),
            Some("cherri.png".to_string()),
        ]
    );
    assert_eq!(evaluation.outcome(), WinOutcome::NoWin);
    assert!(ctrl.scene().banner().is_none());
    assert_eq!(ctrl.stats().completed_spins, 1);
    assert_eq!(ctrl.stats().wins, 0);
}

#[test]
fn test_missing_center_source_is_no_win() {
    let mut ctrl = constant_controller(4);
    ctrl.spin();
    ctrl.advance(3000.0);

    let slots = target_slots(&ctrl);
    ctrl.scene_mut().set_slot_source(0, slots[0], None);
    ctrl.advance(728.0);

    let evaluation = ctrl.last_evaluation().unwrap();
    assert_eq!(evaluation.centers[0], None);
    assert!(!evaluation.all_equal);
    assert!(!evaluation.is_jackpot);
    assert!(ctrl.scene().banner().is_none());
}

#[test]
fn test_encoded_source_decodes_to_catalog_name() {
    let mut ctrl = constant_controller(5);
    ctrl.spin();
    ctrl.run_until_idle();
    let evaluation = ctrl.last_evaluation().unwrap();
    assert!(evaluation.centers.iter().all(|c| c.as_deref() == Some("hores shoe.png")));
}

// ═══════════════════════════════════════════════════════════════════════════════
// AFTER EVALUATION
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_banner_auto_hides() {
    let mut ctrl = constant_controller(0);
    ctrl.spin();
    ctrl.advance(3728.0);
    assert!(ctrl.scene().banner().is_some());

    ctrl.advance(2999.0);
    assert!(ctrl.scene().banner().is_some());
    ctrl.advance(1.0);
    assert!(ctrl.scene().banner().is_none());
    assert!(ctrl.trace().has_stage("MESSAGE_HIDDEN"));
}

#[test]
fn test_each_win_arms_its_own_hide_timer() {
    let mut ctrl = constant_controller(4);
    ctrl.spin();
    ctrl.advance(3828.0);
    assert!(ctrl.spin());

    // first banner hides at 6728, second evaluation lands at 7556
    ctrl.advance(3728.0);
    assert_eq!(ctrl.scene().banners_shown(), 2);
    ctrl.advance(2900.0);
    assert!(ctrl.scene().banner().is_some());
    ctrl.advance(100.0);
    assert!(ctrl.scene().banner().is_none());
}

#[test]
fn test_strips_reset_after_delay_and_reset_is_idempotent() {
    let mut ctrl = seeded_controller(8);
    ctrl.spin();
    ctrl.advance(3728.0);
    for reel in 0..3 {
        assert!(!ctrl.scene().strip_motion(reel).is_neutral());
    }

    ctrl.advance(100.0);
    let once: Vec<_> = (0..3).map(|r| ctrl.scene().strip_motion(r)).collect();
    assert!(once.iter().all(|m| m.is_neutral()));

    ctrl.reset_strips();
    let twice: Vec<_> = (0..3).map(|r| ctrl.scene().strip_motion(r)).collect();
    assert_eq!(once, twice);
}

#[test]
fn test_dispose_mid_spin_leaves_nothing_armed() {
    let mut ctrl = seeded_controller(13);
    ctrl.spin();
    ctrl.advance(2600.0);
    ctrl.dispose();

    assert_eq!(ctrl.scheduler().pending_count(), 0);
    assert_eq!(ctrl.advance(60_000.0), 0);
    for reel in 0..3 {
        assert!(!ctrl.scene().is_spinning(reel));
        assert!(ctrl.scene().strip_motion(reel).is_neutral());
    }
    assert_eq!(ctrl.stats().completed_spins, 0);
}

#[test]
fn test_session_stats_over_many_spins() {
    let mut ctrl = seeded_controller(99);
    for _ in 0..25 {
        assert!(ctrl.spin());
        ctrl.run_until_idle();
    }
    let stats = ctrl.stats();
    assert_eq!(stats.total_spins, 25);
    assert_eq!(stats.completed_spins, 25);
    assert!(stats.wins >= stats.jackpots);
    assert!(stats.hit_rate() <= 100.0);
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROPERTIES
// ═══════════════════════════════════════════════════════════════════════════════

proptest! {
    /// Triggers at arbitrary times never double-arm a spin
    #[test]
    fn prop_triggers_are_never_reentrant(
        seed in any::<u64>(),
        waits in prop::collection::vec(0u32..5000, 1..20),
    ) {
        let mut ctrl = seeded_controller(seed);
        let mut accepted = 0u64;
        for wait in waits {
            ctrl.advance(f64::from(wait));
            let was_spinning = ctrl.is_spinning();
            let pending = ctrl.scheduler().pending_count();
            let started = ctrl.spin();

            prop_assert_eq!(started, !was_spinning);
            if started {
                accepted += 1;
            } else {
                prop_assert_eq!(ctrl.scheduler().pending_count(), pending);
            }
            prop_assert!(ctrl.stopped_count() <= 3);
            prop_assert_eq!(ctrl.scene().trigger_enabled(), !ctrl.is_spinning());
        }
        prop_assert_eq!(ctrl.stats().total_spins, accepted);
    }

    /// Every completed spin ends with all reels stopped and a recorded outcome
    #[test]
    fn prop_completed_spin_is_fully_stopped(seed in any::<u64>()) {
        let mut ctrl = seeded_controller(seed);
        ctrl.spin();
        ctrl.advance(3728.0);

        prop_assert!(!ctrl.is_spinning());
        prop_assert_eq!(ctrl.stopped_count(), 3);
        prop_assert!(ctrl.trace().outcome().is_some());
        for reel in 0..3 {
            prop_assert!(!ctrl.scene().is_spinning(reel));
        }
    }
}
