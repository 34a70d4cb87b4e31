use crate::foundation::error::{JourneyError, JourneyResult};

pub use kurbo::{CubicBez, Point, Rect, Size, Vec2};

/// Drawing surface in user units (the SVG `viewBox` space).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 600.0,
        }
    }
}

impl Canvas {
    pub fn new(width: f64, height: f64) -> JourneyResult<Self> {
        let canvas = Self { width, height };
        if canvas.is_degenerate() {
            return Err(JourneyError::geometry(format!(
                "canvas must be finite and > 0, got {width}x{height}"
            )));
        }
        Ok(canvas)
    }

    pub fn is_degenerate(self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }

    pub fn rect(self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    pub fn center(self) -> Point {
        Point::new(self.width * 0.5, self.height * 0.5)
    }

    /// Inner drawing area after padding. Collapses to zero size instead of inverting.
    pub fn inset(self, padding: Edges) -> Rect {
        let x0 = padding.left;
        let y0 = padding.top;
        let x1 = (self.width - padding.right).max(x0);
        let y1 = (self.height - padding.bottom).max(y0);
        Rect::new(x0, y0, x1, y1)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Edges {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self {
            left: v,
            right: v,
            top: v,
            bottom: v,
        }
    }
}

/// Semantic key the theme boundary maps to a color (e.g. `discovery`, `purchase`).
///
/// The core never picks colors; it only tags bands and paths with one of these.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct CategoryKey(pub String);

impl CategoryKey {
    /// Key carried by exit sinks and drop-off paths.
    pub const EXIT: &'static str = "exit";

    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn exit() -> Self {
        Self(Self::EXIT.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_exit(&self) -> bool {
        self.0 == Self::EXIT
    }
}

impl std::fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub(crate) fn point_is_finite(p: Point) -> bool {
    p.x.is_finite() && p.y.is_finite()
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
