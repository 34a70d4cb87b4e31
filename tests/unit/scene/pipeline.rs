use super::*;
use crate::animation::host::ManualHost;

fn scene() -> DiagramScene<ManualHost> {
    DiagramScene::new(
        Journey::ecommerce_sample(),
        SceneOpts::default(),
        ManualHost::new(),
    )
    .unwrap()
}

#[test]
fn frame_runs_full_pipeline() {
    let mut s = scene();
    let f = s.frame(0.0);
    assert_eq!(f.bands.len(), 4);
    assert_eq!(f.paths.len(), 6);
    assert_eq!(f.exit_sinks.len(), 3);
    assert_eq!(f.markers.len(), 4);
    assert_eq!(f.playback, PlaybackState::Playing);
    assert!(f.hub.is_none());
    assert!(s.animation().pending().is_some());
}

#[test]
fn geometry_is_cached_across_animation_ticks() {
    let mut s = scene();
    s.frame(0.0);
    s.frame(0.5);
    s.pause(0.6);
    s.set_speed(2.0, 0.7).unwrap();
    s.frame(1.0);
    assert_eq!(s.geometry_rebuilds(), 1);

    s.set_mode(LayoutMode::NodeMap);
    let f = s.frame(1.1);
    assert_eq!(s.geometry_rebuilds(), 2);
    assert!(f.hub.is_some());
    assert_eq!(f.exit_sinks.len(), 1);
}

#[test]
fn mode_switch_keeps_marker_progress() {
    let mut s = scene();
    s.frame(0.0);
    let before = s.animation().animator().progress(0, 0, 1.0).unwrap();
    s.set_mode(LayoutMode::Flow);
    s.frame(1.0);
    let after = s.animation().animator().progress(0, 0, 1.0).unwrap();
    assert!((before - after).abs() < 1e-12);
}

#[test]
fn degenerate_canvas_draws_empty_scene() {
    let mut s = scene();
    s.set_canvas(Canvas {
        width: 0.0,
        height: 0.0,
    });
    let f = s.frame(0.0);
    assert!(f.is_empty());
    assert!(f.paths.is_empty());
    assert!(f.markers.is_empty());
}

#[test]
fn invalid_journey_is_rejected_and_old_one_kept() {
    let mut s = scene();
    let mut bad = Journey::ecommerce_sample();
    bad.edges[0].volume = 1_000_000;
    assert!(matches!(
        s.set_journey(bad),
        Err(JourneyError::Validation(_))
    ));
    assert_eq!(s.journey(), &Journey::ecommerce_sample());

    let empty = Journey {
        title: String::new(),
        stages: Vec::new(),
        edges: Vec::new(),
    };
    assert!(DiagramScene::new(empty, SceneOpts::default(), ManualHost::new()).is_err());
}

#[test]
fn single_stage_has_no_cycles() {
    let j = Journey {
        title: "solo".into(),
        stages: vec![Stage::new("only", "Only", 10, 100.0)],
        edges: Vec::new(),
    };
    let mut s = DiagramScene::new(j, SceneOpts::default(), ManualHost::new()).unwrap();
    let f = s.frame(0.0);
    assert_eq!(f.bands.len(), 1);
    assert!(f.paths.is_empty());
    assert_eq!(s.animation().animator().scheduled_cycles(), 0);
    assert!(s.animation().host().requested.is_empty());
}

#[test]
fn teardown_cancels_and_frame_rebuilds() {
    let mut s = scene();
    s.frame(0.0);
    s.teardown(0.1);
    assert_eq!(s.animation().host().cancelled.len(), 1);
    let f = s.frame(0.2);
    assert_eq!(f.paths.len(), 6);
    assert_eq!(s.geometry_rebuilds(), 2);
}

#[test]
fn snapshot_serializes_to_json() {
    let mut s = scene();
    let json = s.frame(0.0).to_json_pretty().unwrap();
    let v: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(v["mode"], "sankey");
    assert_eq!(v["bands"].as_array().unwrap().len(), 4);
}
