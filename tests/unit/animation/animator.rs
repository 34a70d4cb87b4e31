use super::*;
use crate::{
    layout::stages::{LayoutMode, LayoutOpts, StageModel},
    model::journey::Journey,
    paths::builder::{FlowPathBuilder, PathOpts},
};

fn sample_paths() -> Vec<PathDescriptor> {
    let j = Journey::ecommerce_sample();
    let layout = StageModel::new(LayoutOpts::default(), LayoutMode::Sankey)
        .layout(&j.stages)
        .unwrap();
    FlowPathBuilder::for_layout(&layout, PathOpts::default())
        .build_all(&layout, &j)
        .paths
}

fn animator_at(now: f64) -> ParticleAnimator {
    let mut a = ParticleAnimator::new(AnimationConfig::default(), AnimatorOpts::default()).unwrap();
    assert_eq!(a.schedule(&sample_paths(), now), 6);
    a
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn phases_follow_stagger_delays() {
    let a = animator_at(0.0);
    let phases: Vec<Vec<f64>> = a
        .tracks()
        .iter()
        .map(|t| t.phase_offsets_secs.clone())
        .collect();
    assert!(close(phases[0][1], 1.0));
    assert!(close(phases[1][1], 1.5));
    assert!(close(phases[2][1], 0.5));
    assert!(close(phases[3][0], 0.0));
    assert!(close(phases[4][0], 1.0));
    assert!(close(phases[5][0], 2.0));
    assert!(a.tracks()[3].is_dropoff);
    assert!(close(a.tracks()[3].duration_base_secs, 4.0));
    assert_eq!(a.scheduled_cycles(), 3 * 2 + 3);
}

#[test]
fn progress_wraps_every_cycle() {
    let a = animator_at(10.0);
    assert!(close(a.progress(0, 0, 10.0).unwrap(), 0.0));
    assert!(close(a.progress(0, 0, 11.5).unwrap(), 0.5));
    assert!(close(a.progress(0, 0, 14.5).unwrap(), 0.5));
    assert_eq!(a.progress(0, 1, 10.5), None);
    assert!(close(a.progress(0, 1, 12.5).unwrap(), 0.5));
}

#[test]
fn pause_freezes_and_resume_continues() {
    let mut a = animator_at(0.0);
    a.pause(1.0);
    let frozen = a.progress(0, 0, 1.0).unwrap();
    assert!(close(a.progress(0, 0, 50.0).unwrap(), frozen));
    assert_eq!(a.state(), PlaybackState::Paused);

    a.resume(50.0);
    assert!(close(a.progress(0, 0, 50.0).unwrap(), frozen));
    assert!(close(a.progress(0, 0, 50.5).unwrap(), frozen + 0.5 / 3.0));
}

#[test]
fn pause_resume_without_elapsed_time_is_identity() {
    let mut a = animator_at(0.0);
    let before = a.progress(1, 0, 2.0).unwrap();
    a.pause(2.0);
    a.resume(2.0);
    assert_eq!(a.progress(1, 0, 2.0).unwrap(), before);
}

#[test]
fn doubling_speed_halves_remaining_time() {
    let mut a = animator_at(0.0);
    let p = a.progress(0, 0, 1.0).unwrap();
    let remaining = a.remaining_secs(0, 0, 1.0).unwrap();
    assert!(close(remaining, 2.0));

    a.set_speed(2.0, 1.0).unwrap();
    assert!(close(a.progress(0, 0, 1.0).unwrap(), p));
    assert!(close(a.remaining_secs(0, 0, 1.0).unwrap(), remaining / 2.0));
    assert!(close(a.progress(0, 0, 2.0).unwrap(), 0.0));
}

#[test]
fn speed_change_while_paused_only_stores_multiplier() {
    let mut a = animator_at(0.0);
    a.pause(1.0);
    let p = a.progress(0, 0, 1.0).unwrap();
    a.set_speed(0.5, 3.0).unwrap();
    assert!(close(a.progress(0, 0, 9.0).unwrap(), p));
    assert_eq!(a.config().speed_multiplier, 0.5);
    a.resume(9.0);
    assert!(close(a.progress(0, 0, 10.0).unwrap(), p + 0.5 / 3.0));
}

#[test]
fn invalid_speed_is_rejected_without_side_effects() {
    let mut a = animator_at(0.0);
    assert!(a.set_speed(0.0, 1.0).is_err());
    assert!(a.set_speed(f64::NAN, 1.0).is_err());
    assert_eq!(a.config().speed_multiplier, 1.0);
}

#[test]
fn rapid_toggles_do_not_drift() {
    let mut a = animator_at(0.0);
    for _ in 0..3 {
        a.toggle(1.0);
        a.toggle(1.0);
    }
    a.pause(2.0);
    a.resume(4.0);
    assert!(close(a.active_secs(5.0), 3.0));
    assert!(close(a.elapsed(0, 5.0).unwrap(), 3.0));
}

#[test]
fn freeze_is_independent_of_user_pause() {
    let mut a = animator_at(0.0);
    a.freeze(1.0);
    assert!(a.is_stalled());
    assert_eq!(a.state(), PlaybackState::Playing);
    let p = a.progress(0, 0, 1.0).unwrap();
    assert!(close(a.progress(0, 0, 2.0).unwrap(), p));

    a.pause(2.0);
    a.thaw(3.0);
    assert!(close(a.progress(0, 0, 4.0).unwrap(), p));
    a.resume(4.0);
    assert!(close(a.progress(0, 0, 4.3).unwrap(), p + 0.1));
}

#[test]
fn sample_frame_positions_launched_markers() {
    let a = animator_at(0.0);
    let frame = a.sample_frame(0.0);
    assert_eq!(frame.len(), 4);
    assert!(frame.iter().all(|s| s.visible && s.t == 0.0));
    let first = &frame[0];
    assert_eq!(first.point, a.tracks()[0].curve.p0);

    assert_eq!(a.sample_frame(2.5).len(), 9);
}

#[test]
fn sample_sequence_is_lazy_and_restartable() {
    let a = animator_at(0.0);
    let mut seq = a.samples(0, 0, 0.0, 0.75);
    let first: Vec<f64> = seq.by_ref().take(5).map(|s| s.t).collect();
    assert!(close(first[1], 0.25));
    assert!(close(first[4], 0.0));
    assert_eq!(seq.next().unwrap().cycle, 1);

    seq.restart();
    let again: Vec<f64> = seq.take(5).map(|s| s.t).collect();
    assert_eq!(first, again);
}

#[test]
fn degenerate_paths_are_skipped() {
    let mut paths = sample_paths();
    paths[1].length = 0.0;
    paths[2].curve.p1 = Point::new(f64::NAN, 0.0);
    let mut a = ParticleAnimator::new(AnimationConfig::default(), AnimatorOpts::default()).unwrap();
    assert_eq!(a.schedule(&paths, 0.0), 4);
    let edges: Vec<usize> = a.tracks().iter().map(|t| t.edge_index).collect();
    assert_eq!(edges, vec![0, 3, 4, 5]);
}

#[test]
fn rescheduling_keeps_clock_of_known_edges() {
    let mut a = animator_at(0.0);
    let p = a.progress(0, 0, 1.0).unwrap();
    a.schedule(&sample_paths(), 1.0);
    assert!(close(a.progress(0, 0, 1.0).unwrap(), p));
}

#[test]
fn restart_and_teardown() {
    let mut a = animator_at(0.0);
    a.restart(2.0);
    assert!(close(a.progress(0, 0, 2.0).unwrap(), 0.0));
    a.teardown(2.0);
    assert_eq!(a.scheduled_cycles(), 0);
    assert!(a.sample_frame(3.0).is_empty());
}

#[test]
fn empty_schedule_yields_no_cycles() {
    let mut a = ParticleAnimator::new(AnimationConfig::default(), AnimatorOpts::default()).unwrap();
    assert_eq!(a.schedule(&[], 0.0), 0);
    assert_eq!(a.scheduled_cycles(), 0);
    assert_eq!(a.active_secs(10.0), 0.0);
}

#[test]
fn eased_progress_is_applied() {
    let opts = AnimatorOpts {
        ease: Ease::InOutCubic,
        ..AnimatorOpts::default()
    };
    let mut a = ParticleAnimator::new(AnimationConfig::default(), opts).unwrap();
    a.schedule(&sample_paths(), 0.0);
    assert!(close(a.progress(0, 0, 0.75).unwrap(), Ease::InOutCubic.apply(0.25)));
}
