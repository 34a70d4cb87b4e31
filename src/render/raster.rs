use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::error::{JourneyError, JourneyResult};

/// Largest raster edge accepted, in pixels.
const MAX_DIM: u32 = 16_384;

/// Straight-alpha RGBA8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RasterFrame {
    pub fn save_png(&self, path: &Path) -> JourneyResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        image::save_buffer_with_format(
            path,
            &self.data,
            self.width,
            self.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }
}

fn svg_fontdb() -> Arc<usvg::fontdb::Database> {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    Arc::new(db)
}

/// Rasterize an SVG document at `scale` times its intrinsic size.
///
/// SMIL animations are ignored by the rasterizer, so callers pass a still-frame document.
pub fn rasterize_svg(svg: &str, scale: f32) -> JourneyResult<RasterFrame> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(JourneyError::validation(format!(
            "raster scale must be finite and > 0, got {scale}"
        )));
    }
    let opts = usvg::Options {
        fontdb: svg_fontdb(),
        ..Default::default()
    };
    let tree = usvg::Tree::from_str(svg, &opts).context("parse svg tree")?;

    let size = tree.size();
    let to_px = |v: f32| -> JourneyResult<u32> {
        let px = (v * scale).ceil();
        if !px.is_finite() || px < 1.0 {
            return Err(JourneyError::geometry("svg has invalid width/height"));
        }
        Ok(px as u32)
    };
    let width = to_px(size.width())?;
    let height = to_px(size.height())?;
    if width > MAX_DIM || height > MAX_DIM {
        return Err(JourneyError::geometry(format!(
            "svg raster size too large: {width}x{height} (max {MAX_DIM}x{MAX_DIM})"
        )));
    }

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| JourneyError::geometry("failed to allocate svg pixmap"))?;
    let xform = resvg::tiny_skia::Transform::from_scale(
        width as f32 / size.width(),
        height as f32 / size.height(),
    );
    resvg::render(&tree, xform, &mut pixmap.as_mut());

    let data = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    Ok(RasterFrame {
        width,
        height,
        data,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
