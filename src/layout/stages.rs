use std::f64::consts::{FRAC_PI_2, TAU};

use crate::{
    foundation::core::{Canvas, CategoryKey, Edges, Point, Rect},
    foundation::error::{JourneyError, JourneyResult},
    model::journey::{SizeBasis, Stage},
};

/// Visualization mode selected by the user; decides orientation and alignment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// Proportional bars, top-aligned, flows between neighbouring columns.
    #[default]
    Sankey,
    /// Proportional bars centred on the chart's horizontal midline.
    Flow,
    /// Discs on a ring around a central hub.
    NodeMap,
}

impl LayoutMode {
    pub fn orientation(self) -> Orientation {
        match self {
            Self::Sankey | Self::Flow => Orientation::Horizontal,
            Self::NodeMap => Orientation::Radial,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sankey => "sankey",
            Self::Flow => "flow",
            Self::NodeMap => "node_map",
        }
    }
}

impl std::str::FromStr for LayoutMode {
    type Err = JourneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sankey" => Ok(Self::Sankey),
            "flow" => Ok(Self::Flow),
            "nodes" | "node_map" | "node-map" | "nodemap" => Ok(Self::NodeMap),
            other => Err(JourneyError::validation(format!(
                "unknown layout mode '{other}' (expected sankey, flow or node_map)"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Radial,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandShape {
    Bar,
    Disc,
}

/// Geometry knobs for [`StageModel`]. Defaults describe a 1000x600 chart.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LayoutOpts {
    pub canvas: Canvas,
    pub padding: Edges,
    /// Preferred bar width; shrinks when columns do not fit.
    pub band_width: f64,
    /// Smallest gap between neighbouring columns, as a fraction of the bar width.
    pub min_column_gap: f64,
    /// Smallest bar height, or disc radius in node-map mode.
    pub min_band_extent: f64,
    /// Radius given to the largest stage in node-map mode.
    pub max_node_radius: f64,
    /// Height of the exit sink box drop-offs flow into.
    pub exit_sink_height: f64,
    pub size_basis: SizeBasis,
}

impl Default for LayoutOpts {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            padding: Edges {
                left: 80.0,
                right: 60.0,
                top: 100.0,
                bottom: 100.0,
            },
            band_width: 140.0,
            min_column_gap: 0.25,
            min_band_extent: 24.0,
            max_node_radius: 50.0,
            exit_sink_height: 40.0,
            size_basis: SizeBasis::Count,
        }
    }
}

impl LayoutOpts {
    pub fn validate(&self) -> JourneyResult<()> {
        if self.canvas.is_degenerate() {
            return Err(JourneyError::geometry(format!(
                "canvas must be finite and > 0, got {}x{}",
                self.canvas.width, self.canvas.height
            )));
        }
        for (name, v) in [
            ("band_width", self.band_width),
            ("min_column_gap", self.min_column_gap),
            ("min_band_extent", self.min_band_extent),
            ("max_node_radius", self.max_node_radius),
            ("exit_sink_height", self.exit_sink_height),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(JourneyError::validation(format!("{name} must be > 0")));
            }
        }
        let chart = self.canvas.inset(self.padding);
        if chart.width() <= 0.0 || chart.height() <= 0.0 {
            return Err(JourneyError::geometry(
                "padding leaves no drawable chart area",
            ));
        }
        Ok(())
    }
}

/// Visual region for one stage (or the exit sink pseudo-stage).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayoutBand {
    pub stage_id: String,
    pub index: usize,
    pub category: CategoryKey,
    pub shape: BandShape,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub is_exit: bool,
}

impl LayoutBand {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Disc radius; half the shorter side for bars.
    pub fn radius(&self) -> f64 {
        self.width.min(self.height) * 0.5
    }

    pub fn is_finite(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Output of [`StageModel::layout`]: one band per stage plus anchors for connectors.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StageLayout {
    pub mode: LayoutMode,
    pub canvas: Canvas,
    /// Padded area the bands live in.
    pub chart: Rect,
    pub bands: Vec<LayoutBand>,
    /// Node-map hub; canvas centre for horizontal layouts.
    pub hub: Point,
    /// Distance between neighbouring column origins (horizontal only).
    pub column_pitch: f64,
    exit_sink_height: f64,
    exit_radius: f64,
}

impl StageLayout {
    pub fn orientation(&self) -> Orientation {
        self.mode.orientation()
    }

    pub fn band(&self, index: usize) -> Option<&LayoutBand> {
        self.bands.get(index)
    }

    pub fn band_by_id(&self, stage_id: &str) -> Option<&LayoutBand> {
        self.bands.iter().find(|b| b.stage_id == stage_id)
    }

    /// Exit pseudo-band that drop-offs leaving `source_index` flow into.
    ///
    /// Horizontal layouts place it on the chart's bottom edge under the next column; the last
    /// stage's sink is kept inside the chart, under its own column when the chart is full.
    /// Radial layouts share one sink in the bottom-right corner of the chart.
    pub fn exit_sink_for(&self, source_index: usize) -> LayoutBand {
        let rect = match self.orientation() {
            Orientation::Horizontal => {
                let (x, width) = match self.bands.get(source_index + 1) {
                    Some(next) => (next.x, next.width),
                    None => {
                        let src = self.bands.get(source_index).or(self.bands.last());
                        match src {
                            Some(b) => (b.x + self.column_pitch, b.width),
                            None => (self.chart.x1, self.exit_sink_height),
                        }
                    }
                };
                let x = x.min(self.chart.x1 - width).max(self.chart.x0);
                let height = self.exit_sink_height.min(self.canvas.height);
                let y = (self.chart.y1 - height * 0.5)
                    .min(self.canvas.height - height)
                    .max(0.0);
                Rect::new(x, y, x + width, y + height)
            }
            Orientation::Radial => {
                let r = self.exit_radius;
                let c = Point::new(self.chart.x1 - r, self.chart.y1 - r);
                Rect::new(c.x - r, c.y - r, c.x + r, c.y + r)
            }
        };
        LayoutBand {
            stage_id: CategoryKey::EXIT.to_owned(),
            index: self.bands.len(),
            category: CategoryKey::exit(),
            shape: match self.orientation() {
                Orientation::Horizontal => BandShape::Bar,
                Orientation::Radial => BandShape::Disc,
            },
            x: rect.x0,
            y: rect.y0,
            width: rect.width(),
            height: rect.height(),
            is_exit: true,
        }
    }
}

/// Converts ordered stages into proportional bands.
///
/// Pure: the same stages and options always produce the same layout.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StageModel {
    pub opts: LayoutOpts,
    pub mode: LayoutMode,
}

impl StageModel {
    pub fn new(opts: LayoutOpts, mode: LayoutMode) -> Self {
        Self { opts, mode }
    }

    /// Switch between sankey, flow and node-map geometry.
    pub fn set_mode(&mut self, mode: LayoutMode) {
        self.mode = mode;
    }

    pub fn set_canvas(&mut self, canvas: Canvas) {
        self.opts.canvas = canvas;
    }

    pub fn layout(&self, stages: &[Stage]) -> JourneyResult<StageLayout> {
        layout_stages(stages, &self.opts, self.mode)
    }
}

pub fn layout_stages(
    stages: &[Stage],
    opts: &LayoutOpts,
    mode: LayoutMode,
) -> JourneyResult<StageLayout> {
    if stages.is_empty() {
        return Err(JourneyError::validation("cannot lay out an empty stage list"));
    }
    opts.validate()?;

    let ratios = weight_ratios(stages, opts.size_basis);
    let chart = opts.canvas.inset(opts.padding);
    let mut layout = StageLayout {
        mode,
        canvas: opts.canvas,
        chart,
        bands: Vec::with_capacity(stages.len()),
        hub: opts.canvas.center(),
        column_pitch: 0.0,
        exit_sink_height: opts.exit_sink_height,
        exit_radius: opts.min_band_extent,
    };

    match mode.orientation() {
        Orientation::Horizontal => layout_horizontal(stages, &ratios, opts, mode, &mut layout),
        Orientation::Radial => layout_radial(stages, &ratios, opts, &mut layout),
    }

    if let Some(bad) = layout.bands.iter().find(|b| !b.is_finite()) {
        return Err(JourneyError::geometry(format!(
            "stage '{}' produced non-finite geometry",
            bad.stage_id
        )));
    }
    Ok(layout)
}

/// Each stage's weight relative to the heaviest one; all zero when nothing has weight.
fn weight_ratios(stages: &[Stage], basis: SizeBasis) -> Vec<f64> {
    let weights: Vec<f64> = stages
        .iter()
        .map(|s| {
            let w = s.weight(basis);
            if w.is_finite() { w.max(0.0) } else { 0.0 }
        })
        .collect();
    let max = weights.iter().copied().fold(0.0, f64::max);
    if max <= 0.0 {
        return vec![0.0; stages.len()];
    }
    weights.iter().map(|w| w / max).collect()
}

fn layout_horizontal(
    stages: &[Stage],
    ratios: &[f64],
    opts: &LayoutOpts,
    mode: LayoutMode,
    out: &mut StageLayout,
) {
    let chart = out.chart;
    let n = stages.len();
    let max_extent = chart.height();
    let min_extent = opts.min_band_extent.min(max_extent);

    // Bars narrow before columns touch, so facing edges never share an x.
    let columns = n as f64 + (n - 1) as f64 * opts.min_column_gap;
    let band_w = opts.band_width.min(chart.width() / columns);
    let spacing = if n > 1 {
        ((chart.width() - band_w * n as f64) / (n - 1) as f64).max(0.0)
    } else {
        band_w
    };
    out.column_pitch = band_w + spacing;

    for (i, (stage, &ratio)) in stages.iter().zip(ratios).enumerate() {
        let h = (max_extent * ratio).max(min_extent);
        let (x, y) = if n == 1 {
            let c = opts.canvas.center();
            (c.x - band_w * 0.5, c.y - h * 0.5)
        } else {
            let x = chart.x0 + i as f64 * out.column_pitch;
            let y = match mode {
                LayoutMode::Flow => chart.center().y - h * 0.5,
                LayoutMode::Sankey | LayoutMode::NodeMap => chart.y0,
            };
            (x, y)
        };
        out.bands.push(LayoutBand {
            stage_id: stage.id.clone(),
            index: i,
            category: stage.category_key(),
            shape: BandShape::Bar,
            x,
            y,
            width: band_w,
            height: h,
            is_exit: false,
        });
    }
}

fn layout_radial(stages: &[Stage], ratios: &[f64], opts: &LayoutOpts, out: &mut StageLayout) {
    let chart = out.chart;
    let n = stages.len();
    let hub = out.hub;
    let max_r = opts
        .max_node_radius
        .min(chart.width().min(chart.height()) * 0.25)
        .max(opts.min_band_extent);
    let orbit = (chart.width().min(chart.height()) * 0.5 - max_r).max(max_r * 2.0);
    out.exit_radius = opts.min_band_extent.min(max_r);

    for (i, (stage, &ratio)) in stages.iter().zip(ratios).enumerate() {
        let r = (max_r * ratio).max(opts.min_band_extent);
        let c = if n == 1 {
            hub
        } else {
            let angle = -FRAC_PI_2 + TAU * i as f64 / n as f64;
            Point::new(hub.x + orbit * angle.cos(), hub.y + orbit * angle.sin())
        };
        out.bands.push(LayoutBand {
            stage_id: stage.id.clone(),
            index: i,
            category: stage.category_key(),
            shape: BandShape::Disc,
            x: c.x - r,
            y: c.y - r,
            width: r * 2.0,
            height: r * 2.0,
            is_exit: false,
        });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/stages.rs"]
mod tests;
