use crate::{
    foundation::math::Fnv1a64,
    layout::stages::{LayoutMode, LayoutOpts},
    model::journey::{Journey, SizeBasis},
    paths::builder::PathOpts,
};

/// 128-bit digest of everything that affects layout and connector geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SceneFingerprint {
    pub hi: u64,
    pub lo: u64,
}

/// Fingerprint of the geometry inputs. Animation state is deliberately excluded: play/pause
/// and speed changes never invalidate cached layout or paths.
pub fn fingerprint_geometry(
    journey: &Journey,
    mode: LayoutMode,
    layout: &LayoutOpts,
    paths: &PathOpts,
) -> SceneFingerprint {
    let mut a = Fnv1a64::new_default();
    let mut b = Fnv1a64::new(0x9ae1_6a3b_2f90_404f);

    write_u64_pair(&mut a, &mut b, journey.stages.len() as u64);
    for s in &journey.stages {
        write_str_pair(&mut a, &mut b, &s.id);
        write_u64_pair(&mut a, &mut b, s.count);
        write_f64_pair(&mut a, &mut b, s.percent_of_root);
        match &s.category {
            Some(c) => {
                write_u8_pair(&mut a, &mut b, 1);
                write_str_pair(&mut a, &mut b, c.as_str());
            }
            None => write_u8_pair(&mut a, &mut b, 0),
        }
    }

    write_u64_pair(&mut a, &mut b, journey.edges.len() as u64);
    for e in &journey.edges {
        write_str_pair(&mut a, &mut b, &e.from);
        match &e.to {
            Some(to) => {
                write_u8_pair(&mut a, &mut b, 1);
                write_str_pair(&mut a, &mut b, to);
            }
            None => write_u8_pair(&mut a, &mut b, 0),
        }
        write_u64_pair(&mut a, &mut b, e.volume);
        write_u8_pair(&mut a, &mut b, u8::from(e.is_dropoff));
    }

    write_u8_pair(
        &mut a,
        &mut b,
        match mode {
            LayoutMode::Sankey => 0,
            LayoutMode::Flow => 1,
            LayoutMode::NodeMap => 2,
        },
    );

    for v in [
        layout.canvas.width,
        layout.canvas.height,
        layout.padding.left,
        layout.padding.right,
        layout.padding.top,
        layout.padding.bottom,
        layout.band_width,
        layout.min_column_gap,
        layout.min_band_extent,
        layout.max_node_radius,
        layout.exit_sink_height,
        paths.min_width,
        paths.max_width,
        paths.curvature,
    ] {
        write_f64_pair(&mut a, &mut b, v);
    }
    write_u8_pair(
        &mut a,
        &mut b,
        match layout.size_basis {
            SizeBasis::Count => 0,
            SizeBasis::PercentOfRoot => 1,
        },
    );

    SceneFingerprint {
        hi: a.finish(),
        lo: b.finish(),
    }
}

fn write_u8_pair(a: &mut Fnv1a64, b: &mut Fnv1a64, v: u8) {
    a.write_u8(v);
    b.write_u8(v);
}

fn write_u64_pair(a: &mut Fnv1a64, b: &mut Fnv1a64, v: u64) {
    a.write_u64(v);
    b.write_u64(v);
}

fn write_f64_pair(a: &mut Fnv1a64, b: &mut Fnv1a64, v: f64) {
    a.write_f64(v);
    b.write_f64(v);
}

fn write_str_pair(a: &mut Fnv1a64, b: &mut Fnv1a64, s: &str) {
    a.write_str(s);
    b.write_str(s);
}

#[cfg(test)]
#[path = "../../tests/unit/scene/fingerprint.rs"]
mod tests;
