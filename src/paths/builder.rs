use kurbo::{ParamCurve as _, ParamCurveArclen as _};

use crate::{
    foundation::core::{CategoryKey, CubicBez, Point, point_is_finite},
    foundation::error::{JourneyError, JourneyResult},
    foundation::math::share_of,
    layout::stages::{LayoutBand, Orientation, StageLayout},
    model::journey::Journey,
};

/// Accuracy passed to kurbo's arc-length routines, in user units.
pub(crate) const ARCLEN_ACCURACY: f64 = 1e-3;

/// Stroke and curvature knobs for [`FlowPathBuilder`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PathOpts {
    pub min_width: f64,
    pub max_width: f64,
    /// How far control points reach toward the other end (horizontal) or the hub
    /// (radial), as a fraction of the span.
    pub curvature: f64,
}

impl Default for PathOpts {
    fn default() -> Self {
        Self {
            min_width: 2.0,
            max_width: 140.0,
            curvature: 0.5,
        }
    }
}

impl PathOpts {
    pub fn validate(&self) -> JourneyResult<()> {
        if !(self.min_width.is_finite() && self.max_width.is_finite()) || self.min_width <= 0.0 {
            return Err(JourneyError::validation("stroke widths must be finite and > 0"));
        }
        if self.min_width > self.max_width {
            return Err(JourneyError::validation("min_width must be <= max_width"));
        }
        if !self.curvature.is_finite() || !(0.0..=1.0).contains(&self.curvature) {
            return Err(JourneyError::validation("curvature must be within 0..=1"));
        }
        Ok(())
    }
}

/// Position of an edge among the edges sharing one side of a band.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Slot {
    pub index: usize,
    pub count: usize,
}

impl Slot {
    pub const SOLO: Self = Self { index: 0, count: 1 };

    pub fn new(index: usize, count: usize) -> Self {
        Self {
            index,
            count: count.max(1),
        }
    }

    /// Offset from the band centre along `extent`.
    ///
    /// Slots split the extent into `count` equal lanes and return the lane centre, i.e.
    /// `(index - count/2) * extent/count` shifted by half a lane, so the offsets of all
    /// siblings sum to zero.
    pub fn offset(self, extent: f64) -> f64 {
        let n = self.count.max(1) as f64;
        (self.index as f64 + 0.5 - n * 0.5) * extent / n
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "stage")]
pub enum EdgeTarget {
    Stage(String),
    Exit,
}

/// One connector as handed to the render boundary.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PathDescriptor {
    /// Index into the journey's edge list.
    pub edge_index: usize,
    pub from: String,
    pub to: EdgeTarget,
    pub category: CategoryKey,
    pub is_dropoff: bool,
    pub curve: CubicBez,
    pub stroke_width: f64,
    pub volume: u64,
    /// `volume` relative to the source's capacity, `0..=1`.
    pub share: f64,
    /// Arc length of `curve`.
    pub length: f64,
}

impl PathDescriptor {
    /// SVG path data, e.g. `M220,300 C270,300 270,250 320,250`.
    pub fn svg_d(&self) -> String {
        let c = &self.curve;
        format!(
            "M{},{} C{},{} {},{} {},{}",
            fmt_coord(c.p0.x),
            fmt_coord(c.p0.y),
            fmt_coord(c.p1.x),
            fmt_coord(c.p1.y),
            fmt_coord(c.p2.x),
            fmt_coord(c.p2.y),
            fmt_coord(c.p3.x),
            fmt_coord(c.p3.y),
        )
    }

    /// Point reached after `progress` of the arc length (paced motion).
    pub fn point_at(&self, progress: f64) -> Point {
        paced_point(&self.curve, self.length, progress)
    }

    /// `stroke-dasharray` pair that reveals the stroke up to `progress`.
    pub fn dash_reveal(&self, progress: f64) -> [f64; 2] {
        let t = progress.clamp(0.0, 1.0);
        [self.length * t, self.length * (1.0 - t)]
    }

    /// Anchor for volume labels.
    pub fn label_anchor(&self) -> Point {
        self.point_at(0.5)
    }
}

pub(crate) fn paced_point(curve: &CubicBez, length: f64, progress: f64) -> Point {
    let t = progress.clamp(0.0, 1.0);
    if t <= 0.0 {
        return curve.p0;
    }
    if t >= 1.0 {
        return curve.p3;
    }
    if length <= 0.0 {
        return curve.eval(t);
    }
    let param = curve.inv_arclen(length * t, ARCLEN_ACCURACY);
    curve.eval(param)
}

/// Rounds to 1/100 and drops trailing zeros so path data stays stable and compact.
pub(crate) fn fmt_coord(v: f64) -> String {
    let r = (v * 100.0).round() / 100.0;
    let r = if r == 0.0 { 0.0 } else { r };
    let s = format!("{r:.2}");
    s.trim_end_matches('0').trim_end_matches('.').to_owned()
}

/// Geometry of one connector before edge metadata is attached.
#[derive(Clone, Debug, PartialEq)]
pub struct Connector {
    pub curve: CubicBez,
    pub stroke_width: f64,
    pub share: f64,
    pub length: f64,
}

/// Inputs for a single connector.
#[derive(Clone, Copy, Debug)]
pub struct ConnectorRequest<'a> {
    pub source: &'a LayoutBand,
    /// Destination stage band or an exit pseudo-band.
    pub target: &'a LayoutBand,
    pub volume: u64,
    /// Volume the stroke width is measured against (the source stage's capacity).
    pub reference_volume: u64,
    pub source_slot: Slot,
    pub target_slot: Slot,
}

/// An edge left out of the diagram and why.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SkippedEdge {
    pub edge_index: usize,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PathSet {
    pub paths: Vec<PathDescriptor>,
    pub skipped: Vec<SkippedEdge>,
}

/// Computes S-curve connectors between layout bands.
#[derive(Clone, Debug)]
pub struct FlowPathBuilder {
    opts: PathOpts,
    orientation: Orientation,
    hub: Point,
}

impl FlowPathBuilder {
    pub fn new(opts: PathOpts, orientation: Orientation, hub: Point) -> Self {
        Self {
            opts,
            orientation,
            hub,
        }
    }

    pub fn for_layout(layout: &StageLayout, opts: PathOpts) -> Self {
        Self::new(opts, layout.orientation(), layout.hub)
    }

    pub fn opts(&self) -> &PathOpts {
        &self.opts
    }

    /// One connector. Pure: identical requests give bit-identical control points.
    pub fn connector(&self, req: &ConnectorRequest<'_>) -> JourneyResult<Connector> {
        if !req.source.is_finite() || !req.target.is_finite() {
            return Err(JourneyError::geometry("band geometry is not finite"));
        }

        let (p0, p3) = match self.orientation {
            Orientation::Horizontal => horizontal_anchors(req),
            Orientation::Radial => radial_anchors(req),
        };
        let k = self.opts.curvature;
        let (p1, p2) = match self.orientation {
            Orientation::Horizontal => {
                let dx = p3.x - p0.x;
                (
                    Point::new(p0.x + dx * k, p0.y),
                    Point::new(p3.x - dx * k, p3.y),
                )
            }
            Orientation::Radial => (p0.lerp(self.hub, k), p3.lerp(self.hub, k)),
        };

        let curve = CubicBez::new(p0, p1, p2, p3);
        if ![p0, p1, p2, p3].into_iter().all(point_is_finite) {
            return Err(JourneyError::geometry("connector has non-finite control points"));
        }
        let length = curve.arclen(ARCLEN_ACCURACY);
        if !length.is_finite() || length <= f64::EPSILON {
            return Err(JourneyError::geometry("connector has zero length"));
        }

        let reference = req.reference_volume.max(req.volume);
        let share = share_of(req.volume, reference);
        let stroke_width =
            (self.opts.max_width * share).clamp(self.opts.min_width, self.opts.max_width);

        Ok(Connector {
            curve,
            stroke_width,
            share,
            length,
        })
    }

    /// Connectors for every edge of `journey`, in input order.
    ///
    /// Edges sharing a band side are stacked in input order; edges whose geometry cannot be
    /// drawn are logged and reported in [`PathSet::skipped`] instead of failing the diagram.
    #[tracing::instrument(skip_all, fields(edges = journey.edges.len()))]
    pub fn build_all(&self, layout: &StageLayout, journey: &Journey) -> PathSet {
        let n = journey.stages.len();
        let mut out_slots = vec![Slot::SOLO; journey.edges.len()];
        let mut in_slots = vec![Slot::SOLO; journey.edges.len()];
        let mut reference = vec![0u64; n];

        for stage_idx in 0..n {
            let outgoing: Vec<usize> = journey.outgoing(stage_idx).collect();
            for (pos, &e) in outgoing.iter().enumerate() {
                out_slots[e] = Slot::new(pos, outgoing.len());
            }
            let max_sibling = outgoing
                .iter()
                .map(|&e| journey.edges[e].volume)
                .max()
                .unwrap_or(0);
            reference[stage_idx] = journey.stages[stage_idx].count.max(max_sibling);

            let incoming: Vec<usize> = journey.incoming(stage_idx).collect();
            for (pos, &e) in incoming.iter().enumerate() {
                in_slots[e] = Slot::new(pos, incoming.len());
            }
        }

        let mut set = PathSet::default();
        for (edge_index, edge) in journey.edges.iter().enumerate() {
            let Some(src_idx) = journey.stage_index(&edge.from) else {
                skip(&mut set, edge_index, "unknown source stage");
                continue;
            };
            let Some(source) = layout.band(src_idx) else {
                skip(&mut set, edge_index, "source stage has no band");
                continue;
            };

            let exit_band;
            let (target, to) = if edge.is_dropoff {
                exit_band = layout.exit_sink_for(src_idx);
                (&exit_band, EdgeTarget::Exit)
            } else {
                let Some(to_id) = edge.to.as_deref() else {
                    skip(&mut set, edge_index, "transition without destination");
                    continue;
                };
                let Some(target) = journey
                    .stage_index(to_id)
                    .and_then(|i| layout.band(i))
                else {
                    skip(&mut set, edge_index, "unknown destination stage");
                    continue;
                };
                (target, EdgeTarget::Stage(to_id.to_owned()))
            };

            let req = ConnectorRequest {
                source,
                target,
                volume: edge.volume,
                reference_volume: reference[src_idx],
                source_slot: out_slots[edge_index],
                target_slot: if edge.is_dropoff {
                    Slot::SOLO
                } else {
                    in_slots[edge_index]
                },
            };
            match self.connector(&req) {
                Ok(c) => set.paths.push(PathDescriptor {
                    edge_index,
                    from: edge.from.clone(),
                    to,
                    category: if edge.is_dropoff {
                        CategoryKey::exit()
                    } else {
                        source.category.clone()
                    },
                    is_dropoff: edge.is_dropoff,
                    curve: c.curve,
                    stroke_width: c.stroke_width,
                    volume: edge.volume,
                    share: c.share,
                    length: c.length,
                }),
                Err(err) => skip(&mut set, edge_index, &err.to_string()),
            }
        }
        set
    }
}

fn skip(set: &mut PathSet, edge_index: usize, reason: &str) {
    tracing::warn!(edge_index, reason, "skipping flow edge");
    set.skipped.push(SkippedEdge {
        edge_index,
        reason: reason.to_owned(),
    });
}

fn horizontal_anchors(req: &ConnectorRequest<'_>) -> (Point, Point) {
    let s = req.source;
    let t = req.target;
    let start = Point::new(
        s.right(),
        s.center().y + req.source_slot.offset(s.height),
    );
    let end = Point::new(t.x, t.center().y + req.target_slot.offset(t.height));
    (start, end)
}

/// Anchors on the disc rims facing each other, rotated by the slot offset (arc length
/// turned into an angle).
fn radial_anchors(req: &ConnectorRequest<'_>) -> (Point, Point) {
    let cs = req.source.center();
    let ct = req.target.center();
    let rs = req.source.radius();
    let rt = req.target.radius();

    let toward = (ct - cs).atan2();
    let back = (cs - ct).atan2();
    let ds = angular_offset(req.source_slot, rs);
    let dt = angular_offset(req.target_slot, rt);

    let start = cs + kurbo::Vec2::from_angle(toward + ds) * rs;
    let end = ct + kurbo::Vec2::from_angle(back - dt) * rt;
    (start, end)
}

fn angular_offset(slot: Slot, radius: f64) -> f64 {
    if radius <= 0.0 {
        return 0.0;
    }
    let limit = std::f64::consts::FRAC_PI_2;
    (slot.offset(radius * 2.0) / radius).clamp(-limit, limit)
}

#[cfg(test)]
#[path = "../../tests/unit/paths/builder.rs"]
mod tests;
