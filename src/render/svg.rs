use std::fmt::Write as _;

use crate::{
    animation::config::PlaybackState,
    animation::ease::Ease,
    foundation::core::Point,
    foundation::error::{JourneyError, JourneyResult},
    layout::stages::{BandShape, LayoutBand},
    model::journey::Stage,
    paths::builder::{PathDescriptor, fmt_coord},
    render::theme::{Color, Theme},
    scene::pipeline::FrameSnapshot,
};

/// Options for [`render_svg`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SvgOpts {
    /// Emit SMIL animations while the snapshot is playing. Rasterizers ignore them, so turn
    /// this off for still frames.
    pub animated: bool,
    pub labels: bool,
    pub marker_radius: f64,
    pub dropoff_marker_radius: f64,
    /// Extra width of the underlay stroke on each side of a transition.
    pub underlay_pad: f64,
}

impl Default for SvgOpts {
    fn default() -> Self {
        Self {
            animated: true,
            labels: true,
            marker_radius: 4.0,
            dropoff_marker_radius: 3.0,
            underlay_pad: 10.0,
        }
    }
}

/// Serialize a frame snapshot into a standalone SVG document.
#[tracing::instrument(
    skip_all,
    fields(paths = snapshot.paths.len(), markers = snapshot.markers.len())
)]
pub fn render_svg(
    snapshot: &FrameSnapshot,
    theme: &Theme,
    opts: &SvgOpts,
) -> JourneyResult<String> {
    let mut out = String::with_capacity(8 * 1024);
    write_document(&mut out, snapshot, theme, opts)
        .map_err(|e| JourneyError::Other(anyhow::anyhow!("format svg: {e}")))?;
    Ok(out)
}

fn write_document(
    out: &mut String,
    s: &FrameSnapshot,
    theme: &Theme,
    opts: &SvgOpts,
) -> std::fmt::Result {
    let (w, h) = (fmt_coord(s.canvas.width), fmt_coord(s.canvas.height));
    writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif">"#
    )?;
    if !s.title.is_empty() {
        writeln!(out, "  <title>{}</title>", escape(&s.title))?;
    }
    writeln!(
        out,
        r#"  <rect width="{w}" height="{h}" {}/>"#,
        paint("fill", theme.background)
    )?;

    let animate = opts.animated && s.playback == PlaybackState::Playing;

    writeln!(out, r#"  <g id="paths" fill="none">"#)?;
    for p in &s.paths {
        write_path(out, s, p, theme, opts, animate)?;
    }
    writeln!(out, "  </g>")?;

    writeln!(out, r#"  <g id="stages">"#)?;
    if let Some(hub) = s.hub {
        writeln!(
            out,
            r#"    <circle cx="{}" cy="{}" r="30" {}/>"#,
            fmt_coord(hub.x),
            fmt_coord(hub.y),
            paint("fill", theme.hub)
        )?;
    }
    for band in &s.bands {
        let stage = s.stages.get(band.index);
        write_band(out, band, stage, theme, opts)?;
    }
    for sink in &s.exit_sinks {
        write_exit(out, sink, theme)?;
    }
    writeln!(out, "  </g>")?;

    writeln!(out, r#"  <g id="markers">"#)?;
    let timing = motion_timing(s.ease);
    for m in &s.markers {
        let Some(path) = s.paths.iter().find(|p| p.edge_index == m.edge_index) else {
            continue;
        };
        let (r, color) = if path.is_dropoff {
            (opts.dropoff_marker_radius, theme.exit)
        } else {
            (opts.marker_radius, theme.color_for(&path.category))
        };
        if animate {
            writeln!(out, r#"    <circle r="{}" {}>"#, fmt_coord(r), paint("fill", color))?;
            writeln!(
                out,
                r#"      <animateMotion path="{}" dur="{}s" begin="{}s"{timing} repeatCount="indefinite"/>"#,
                path.svg_d(),
                fmt_secs(m.cycle_secs),
                fmt_secs(-m.raw_t * m.cycle_secs)
            )?;
            writeln!(out, "    </circle>")?;
        } else {
            writeln!(
                out,
                r#"    <circle cx="{}" cy="{}" r="{}" {}/>"#,
                fmt_coord(m.point.x),
                fmt_coord(m.point.y),
                fmt_coord(r),
                paint("fill", color)
            )?;
        }
    }
    writeln!(out, "  </g>")?;
    writeln!(out, "</svg>")
}

/// SMIL timing attributes reproducing `ease` on a `0..1` motion; empty for paced motion.
fn motion_timing(ease: Ease) -> String {
    match ease.key_splines() {
        Some(splines) => format!(
            r#" calcMode="spline" keyPoints="0;1" keyTimes="0;1" keySplines="{splines}""#
        ),
        None => String::new(),
    }
}

/// Same as [`motion_timing`] for `from`/`to` animations, which take no `keyPoints`.
fn value_timing(ease: Ease) -> String {
    match ease.key_splines() {
        Some(splines) => format!(r#" calcMode="spline" keyTimes="0;1" keySplines="{splines}""#),
        None => String::new(),
    }
}

fn write_path(
    out: &mut String,
    s: &FrameSnapshot,
    p: &PathDescriptor,
    theme: &Theme,
    opts: &SvgOpts,
    animate: bool,
) -> std::fmt::Result {
    let d = p.svg_d();
    let width = fmt_coord(p.stroke_width);
    let underlay = paint("stroke", theme.path_underlay);
    if p.is_dropoff {
        writeln!(
            out,
            r#"    <path d="{d}" {underlay} stroke-width="{width}" opacity="0.3"/>"#
        )?;
    } else {
        writeln!(
            out,
            r#"    <path d="{d}" {underlay} stroke-width="{}" opacity="0.5"/>"#,
            fmt_coord(p.stroke_width + opts.underlay_pad * 2.0)
        )?;
        let stroke = paint("stroke", theme.color_for(&p.category));
        let lead = s
            .markers
            .iter()
            .find(|m| m.edge_index == p.edge_index && m.marker == 0)
            .filter(|_| animate);
        if let Some(m) = lead {
            let [_, full] = p.dash_reveal(0.0);
            let l = fmt_coord(full);
            writeln!(
                out,
                r#"    <path d="{d}" {stroke} stroke-width="{width}" opacity="0.7">"#
            )?;
            writeln!(
                out,
                r#"      <animate attributeName="stroke-dasharray" from="0,{l}" to="{l},0" dur="{}s" begin="{}s"{} repeatCount="indefinite"/>"#,
                fmt_secs(m.cycle_secs),
                fmt_secs(-m.raw_t * m.cycle_secs),
                value_timing(s.ease)
            )?;
            writeln!(out, "    </path>")?;
        } else {
            writeln!(
                out,
                r#"    <path d="{d}" {stroke} stroke-width="{width}" opacity="0.7"/>"#
            )?;
        }
    }

    if opts.labels {
        let at = p.label_anchor();
        let source_count = s
            .stages
            .iter()
            .find(|st| st.id == p.from)
            .map_or(0, |st| st.count);
        let volume = if p.is_dropoff {
            format!("{} exit", group_thousands(p.volume))
        } else {
            group_thousands(p.volume)
        };
        let above = Point::new(at.x, at.y - 10.0);
        write_text(out, above, 14.0, theme.text, false, &volume)?;
        if source_count > 0 {
            let pct = format!("{:.1}%", p.volume as f64 * 100.0 / source_count as f64);
            let below = Point::new(at.x, at.y + 10.0);
            write_text(out, below, 12.0, theme.muted_text, false, &pct)?;
        }
    }
    Ok(())
}

fn write_band(
    out: &mut String,
    band: &LayoutBand,
    stage: Option<&Stage>,
    theme: &Theme,
    opts: &SvgOpts,
) -> std::fmt::Result {
    let fill = paint("fill", theme.color_for(&band.category));
    match band.shape {
        BandShape::Bar => writeln!(
            out,
            r#"    <rect x="{}" y="{}" width="{}" height="{}" rx="4" {fill}/>"#,
            fmt_coord(band.x),
            fmt_coord(band.y),
            fmt_coord(band.width),
            fmt_coord(band.height)
        )?,
        BandShape::Disc => {
            let c = band.center();
            writeln!(
                out,
                r#"    <circle cx="{}" cy="{}" r="{}" {fill}/>"#,
                fmt_coord(c.x),
                fmt_coord(c.y),
                fmt_coord(band.radius())
            )?;
        }
    }

    let (Some(stage), true) = (stage, opts.labels) else {
        return Ok(());
    };
    let c = band.center();
    let white = Color::rgb(0xff, 0xff, 0xff);
    let title = Point::new(c.x, c.y + 10.0);
    write_text(out, title, 16.0, white, true, &stage.label)?;
    write_text(
        out,
        Point::new(c.x, c.y + 35.0),
        14.0,
        white,
        false,
        &format!("{} visitors", group_thousands(stage.count)),
    )?;
    write_text(
        out,
        Point::new(c.x, c.y + 55.0),
        12.0,
        white,
        false,
        &format!("{}%", fmt_coord(stage.percent_of_root)),
    )
}

fn write_exit(out: &mut String, sink: &LayoutBand, theme: &Theme) -> std::fmt::Result {
    let fill = paint("fill", theme.exit);
    match sink.shape {
        BandShape::Bar => writeln!(
            out,
            r#"    <rect x="{}" y="{}" width="{}" height="{}" rx="4" {fill} opacity="0.5"/>"#,
            fmt_coord(sink.x),
            fmt_coord(sink.y),
            fmt_coord(sink.width),
            fmt_coord(sink.height)
        )?,
        BandShape::Disc => {
            let c = sink.center();
            writeln!(
                out,
                r#"    <circle cx="{}" cy="{}" r="{}" {fill} opacity="0.5"/>"#,
                fmt_coord(c.x),
                fmt_coord(c.y),
                fmt_coord(sink.radius())
            )?;
        }
    }
    let c = sink.center();
    let at = Point::new(c.x, c.y + 5.0);
    write_text(out, at, 14.0, theme.muted_text, false, "Exit")
}

fn write_text(
    out: &mut String,
    at: Point,
    size: f64,
    color: Color,
    bold: bool,
    text: &str,
) -> std::fmt::Result {
    let weight = if bold { r#" font-weight="bold""# } else { "" };
    writeln!(
        out,
        r#"    <text x="{}" y="{}" text-anchor="middle" font-size="{}" {}{weight}>{}</text>"#,
        fmt_coord(at.x),
        fmt_coord(at.y),
        fmt_coord(size),
        paint("fill", color),
        escape(text)
    )
}

/// `fill="#rrggbb"` (or `stroke=`), plus a matching `*-opacity` when the color is translucent.
pub(crate) fn paint(attr: &str, color: Color) -> String {
    if color.a == 255 {
        format!(r#"{attr}="{}""#, color.css())
    } else {
        format!(
            r#"{attr}="{}" {attr}-opacity="{}""#,
            color.css(),
            fmt_coord(color.opacity())
        )
    }
}

fn fmt_secs(v: f64) -> String {
    let r = (v * 1000.0).round() / 1000.0;
    let r = if r == 0.0 { 0.0 } else { r };
    let s = format!("{r:.3}");
    s.trim_end_matches('0').trim_end_matches('.').to_owned()
}

/// `10462` → `10,462`.
pub(crate) fn group_thousands(v: u64) -> String {
    let digits = v.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub(crate) fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/svg.rs"]
mod tests;
