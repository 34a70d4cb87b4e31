use super::*;
use crate::model::journey::Journey;

fn sample_layout(mode: LayoutMode) -> StageLayout {
    let j = Journey::ecommerce_sample();
    StageModel::new(LayoutOpts::default(), mode)
        .layout(&j.stages)
        .unwrap()
}

#[test]
fn sankey_columns_for_default_canvas() {
    let l = sample_layout(LayoutMode::Sankey);
    let xs: Vec<f64> = l.bands.iter().map(|b| b.x).collect();
    assert_eq!(xs, vec![80.0, 320.0, 560.0, 800.0]);
    assert!(l.bands.iter().all(|b| b.width == 140.0 && b.y == 100.0));
    assert_eq!(l.bands[0].height, 400.0);
    assert_eq!(l.column_pitch, 240.0);
}

#[test]
fn heights_are_proportional_to_counts() {
    let l = sample_layout(LayoutMode::Sankey);
    let d = l.bands[0].height;
    for (band, count) in l.bands.iter().zip([10_462.0, 4_835.0, 1_527.0, 832.0]) {
        let expected = d * count / 10_462.0;
        assert!((band.height - expected).abs() < 1e-9, "{band:?}");
    }
}

#[test]
fn flow_mode_centres_bars_on_midline() {
    let l = sample_layout(LayoutMode::Flow);
    for b in &l.bands {
        assert!((b.center().y - l.chart.center().y).abs() < 1e-9);
    }
}

#[test]
fn zero_count_gets_minimum_extent() {
    let stages = vec![
        Stage::new("a", "A", 100, 100.0),
        Stage::new("b", "B", 0, 0.0),
    ];
    let opts = LayoutOpts::default();
    let l = layout_stages(&stages, &opts, LayoutMode::Sankey).unwrap();
    assert_eq!(l.bands[1].height, opts.min_band_extent);

    let l = layout_stages(&stages, &opts, LayoutMode::NodeMap).unwrap();
    assert_eq!(l.bands[1].radius(), opts.min_band_extent);
}

#[test]
fn all_zero_counts_do_not_divide_by_zero() {
    let stages = vec![Stage::new("a", "A", 0, 0.0), Stage::new("b", "B", 0, 0.0)];
    let l = layout_stages(&stages, &LayoutOpts::default(), LayoutMode::Sankey).unwrap();
    assert!(l.bands.iter().all(|b| b.height == 24.0 && b.is_finite()));
}

#[test]
fn single_stage_is_centred_on_canvas() {
    let stages = vec![Stage::new("only", "Only", 42, 100.0)];
    for mode in [LayoutMode::Sankey, LayoutMode::Flow, LayoutMode::NodeMap] {
        let l = layout_stages(&stages, &LayoutOpts::default(), mode).unwrap();
        assert_eq!(l.bands.len(), 1);
        assert_eq!(l.bands[0].center(), Point::new(500.0, 300.0));
    }
}

#[test]
fn empty_stages_and_zero_canvas_are_rejected() {
    let opts = LayoutOpts::default();
    assert!(matches!(
        layout_stages(&[], &opts, LayoutMode::Sankey),
        Err(JourneyError::Validation(_))
    ));

    let mut opts = LayoutOpts::default();
    opts.canvas = Canvas {
        width: 0.0,
        height: 600.0,
    };
    let stages = vec![Stage::new("a", "A", 1, 100.0)];
    assert!(matches!(
        layout_stages(&stages, &opts, LayoutMode::Sankey),
        Err(JourneyError::Geometry(_))
    ));
}

#[test]
fn percent_basis_uses_percent_of_root() {
    let stages = vec![
        Stage::new("a", "A", 1, 100.0),
        Stage::new("b", "B", 1, 25.0),
    ];
    let opts = LayoutOpts {
        size_basis: SizeBasis::PercentOfRoot,
        ..LayoutOpts::default()
    };
    let l = layout_stages(&stages, &opts, LayoutMode::Sankey).unwrap();
    assert_eq!(l.bands[1].height, l.bands[0].height * 0.25);
}

#[test]
fn node_map_places_discs_on_a_ring() {
    let l = sample_layout(LayoutMode::NodeMap);
    let dists: Vec<f64> = l
        .bands
        .iter()
        .map(|b| b.center().distance(l.hub))
        .collect();
    assert!(dists.iter().all(|d| (d - dists[0]).abs() < 1e-9));
    assert!(l.bands.iter().all(|b| b.shape == BandShape::Disc));
    assert!(l.bands[0].center().y < l.hub.y);
}

#[test]
fn exit_sink_sits_under_next_column() {
    let l = sample_layout(LayoutMode::Sankey);
    let sink = l.exit_sink_for(0);
    assert!(sink.is_exit);
    assert_eq!(sink.x, 320.0);
    assert_eq!(sink.rect(), Rect::new(320.0, 480.0, 460.0, 520.0));

    let last = l.exit_sink_for(3);
    assert_eq!(last.rect(), Rect::new(800.0, 480.0, 940.0, 520.0));
}

#[test]
fn exit_sinks_stay_on_canvas() {
    let tight = LayoutOpts {
        padding: Edges::uniform(0.0),
        ..LayoutOpts::default()
    };
    for opts in [LayoutOpts::default(), tight] {
        for mode in [LayoutMode::Sankey, LayoutMode::Flow, LayoutMode::NodeMap] {
            for n in 1..=9usize {
                let stages: Vec<Stage> = (0..n)
                    .map(|i| Stage::new(format!("s{i}"), "S", 100, 100.0))
                    .collect();
                let l = layout_stages(&stages, &opts, mode).unwrap();
                let canvas = opts.canvas.rect();
                for i in 0..n {
                    let sink = l.exit_sink_for(i).rect();
                    assert_eq!(canvas.union(sink), canvas, "{mode:?} n={n} i={i} {sink:?}");
                }
            }
        }
    }
}

#[test]
fn many_columns_keep_a_gap() {
    let stages: Vec<Stage> = (0..12)
        .map(|i| Stage::new(format!("s{i}"), "S", 100, 100.0))
        .collect();
    let opts = LayoutOpts::default();
    let l = layout_stages(&stages, &opts, LayoutMode::Sankey).unwrap();
    let chart = l.chart;
    for pair in l.bands.windows(2) {
        let gap = pair[1].x - pair[0].right();
        assert!(gap >= pair[0].width * opts.min_column_gap - 1e-9, "{gap}");
    }
    let last = l.bands.last().unwrap();
    assert!((last.right() - chart.x1).abs() < 1e-9);
}

#[test]
fn set_mode_switches_orientation() {
    let mut model = StageModel::default();
    let j = Journey::ecommerce_sample();
    assert_eq!(model.layout(&j.stages).unwrap().orientation(), Orientation::Horizontal);
    model.set_mode(LayoutMode::NodeMap);
    assert_eq!(model.layout(&j.stages).unwrap().orientation(), Orientation::Radial);
}

#[test]
fn mode_parses_aliases() {
    assert_eq!("nodes".parse::<LayoutMode>().unwrap(), LayoutMode::NodeMap);
    assert_eq!("Sankey".parse::<LayoutMode>().unwrap(), LayoutMode::Sankey);
    assert!("pie".parse::<LayoutMode>().is_err());
}
