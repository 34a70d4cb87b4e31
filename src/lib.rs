//! journeyflow turns a customer-journey funnel into an animated flow diagram.
//!
//! # Pipeline overview
//!
//! 1. **Layout**: `[Stage] + LayoutMode -> StageLayout` (proportional bars or discs)
//! 2. **Paths**: `StageLayout + [FlowEdge] -> [PathDescriptor]` (cubic connectors, drop-offs to
//!    an exit sink)
//! 3. **Sample**: `[PathDescriptor] + AnimationConfig + now -> [MarkerSample]`
//!
//! [`DiagramScene`] runs the three stages per frame and only re-runs layout and paths when a
//! geometry input changes. Its [`FrameSnapshot`] is plain data; [`render_svg`] and
//! [`rasterize_svg`] are one consumer of it.
//!
//! Constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic**: layout and path building are pure; identical inputs give bit-identical
//!   control points.
//! - **Draw less, never abort**: degenerate geometry skips the element, a refused frame
//!   callback freezes the clock.
#![forbid(unsafe_code)]

mod animation;
mod foundation;
mod layout;
mod model;
mod paths;
mod render;
mod scene;

/// Saved view preference (theme, layout mode, speed).
pub mod prefs;

pub use animation::animator::{
    AnimatorOpts, MarkerSample, MarkerSamples, MarkerTrack, ParticleAnimator,
};
pub use animation::config::{AnimationConfig, PlaybackState, SPEED_PRESETS, nearest_preset};
pub use animation::ease::Ease;
pub use animation::host::{AnimationLoop, FrameHost, FrameTicket, ManualHost};
pub use foundation::core::{Canvas, CategoryKey, CubicBez, Edges, Point, Rect, Size, Vec2};
pub use foundation::error::{JourneyError, JourneyResult};
pub use layout::stages::{
    BandShape, LayoutBand, LayoutMode, LayoutOpts, Orientation, StageLayout, StageModel,
    layout_stages,
};
pub use model::journey::{FlowEdge, Journey, SizeBasis, Stage};
pub use paths::builder::{
    Connector, ConnectorRequest, EdgeTarget, FlowPathBuilder, PathDescriptor, PathOpts, PathSet,
    SkippedEdge, Slot,
};
pub use render::raster::{RasterFrame, rasterize_svg};
pub use render::svg::{SvgOpts, render_svg};
pub use render::theme::{Color, Theme, ThemeMode};
pub use scene::fingerprint::{SceneFingerprint, fingerprint_geometry};
pub use scene::pipeline::{DiagramScene, FrameSnapshot, SceneGeometry, SceneOpts};
