use super::*;
use crate::{
    animation::animator::AnimatorOpts,
    animation::config::{AnimationConfig, PlaybackState},
    layout::stages::{LayoutMode, LayoutOpts, StageModel},
    model::journey::Journey,
    paths::builder::{FlowPathBuilder, PathOpts},
};

fn running_loop() -> AnimationLoop<ManualHost> {
    let j = Journey::ecommerce_sample();
    let layout = StageModel::new(LayoutOpts::default(), LayoutMode::Flow)
        .layout(&j.stages)
        .unwrap();
    let paths = FlowPathBuilder::for_layout(&layout, PathOpts::default())
        .build_all(&layout, &j)
        .paths;
    let mut animator =
        ParticleAnimator::new(AnimationConfig::default(), AnimatorOpts::default()).unwrap();
    animator.schedule(&paths, 0.0);
    AnimationLoop::new(ManualHost::new(), animator)
}

#[test]
fn start_requests_first_frame() {
    let mut l = running_loop();
    assert!(l.start(0.0));
    assert_eq!(l.pending(), Some(FrameTicket(1)));
    assert!(!l.on_frame(0.0).is_empty());
    assert_eq!(l.pending(), Some(FrameTicket(2)));
}

#[test]
fn nothing_to_animate_does_not_schedule() {
    let animator =
        ParticleAnimator::new(AnimationConfig::default(), AnimatorOpts::default()).unwrap();
    let mut l = AnimationLoop::new(ManualHost::new(), animator);
    assert!(!l.start(0.0));
    assert!(l.host().requested.is_empty());
}

#[test]
fn refusal_freezes_and_recovers() {
    let mut l = running_loop();
    l.start(0.0);
    l.host_mut().set_refusing(true);
    let held: Vec<_> = l.on_frame(1.0).to_vec();
    assert!(l.is_stalled());
    assert!(l.pending().is_none());
    assert!(!l.poll(5.0));
    assert_eq!(l.last_frame(), held.as_slice());

    l.host_mut().set_refusing(false);
    assert!(l.poll(9.0));
    assert!(!l.is_stalled());
    let t = l.animator().progress(0, 0, 9.0).unwrap();
    assert!((t - 1.0 / 3.0).abs() < 1e-9);
}

#[test]
fn teardown_cancels_pending_callback() {
    let mut l = running_loop();
    l.start(0.0);
    l.teardown(0.5);
    assert_eq!(l.host().cancelled, vec![FrameTicket(1)]);
    assert!(l.pending().is_none());
    assert!(l.on_frame(1.0).is_empty());
    assert_eq!(l.host().requested.len(), 1);
}

#[test]
fn user_controls_pass_through() {
    let mut l = running_loop();
    l.start(0.0);
    l.pause(1.0);
    assert_eq!(l.animator().state(), PlaybackState::Paused);
    l.resume(2.0);
    assert!(l.set_speed(-1.0, 2.0).is_err());
    l.set_speed(1.5, 2.0).unwrap();
    assert_eq!(l.animator().config().speed_multiplier, 1.5);
}

#[test]
fn paused_loop_lets_callbacks_lapse() {
    let mut l = running_loop();
    l.start(0.0);
    l.pause(0.5);
    let held: Vec<f64> = l.on_frame(1.0).iter().map(|m| m.t).collect();
    assert!(l.pending().is_none());
    let later: Vec<f64> = l.on_frame(2.0).iter().map(|m| m.t).collect();
    assert_eq!(later, held);
    assert_eq!(l.host().requested.len(), 1);

    assert_eq!(l.toggle(3.0), PlaybackState::Playing);
    assert_eq!(l.pending(), Some(FrameTicket(2)));
    l.on_frame(3.5);
    assert_eq!(l.pending(), Some(FrameTicket(3)));
}

#[test]
fn paused_start_waits_for_resume() {
    let mut l = running_loop();
    l.pause(0.0);
    assert!(l.start(0.0));
    assert!(l.host().requested.is_empty());
    l.resume(1.0);
    assert_eq!(l.pending(), Some(FrameTicket(1)));
}
