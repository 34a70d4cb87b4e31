use crate::{
    animation::animator::{AnimatorOpts, MarkerSample, ParticleAnimator},
    animation::config::{AnimationConfig, PlaybackState},
    animation::ease::Ease,
    animation::host::{AnimationLoop, FrameHost},
    foundation::core::{Canvas, Point},
    foundation::error::{JourneyError, JourneyResult},
    layout::stages::{LayoutBand, LayoutMode, LayoutOpts, StageLayout, StageModel},
    model::journey::{Journey, Stage},
    paths::builder::{FlowPathBuilder, PathDescriptor, PathOpts, SkippedEdge},
    scene::fingerprint::{SceneFingerprint, fingerprint_geometry},
};

/// Every knob of one visualization instance.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SceneOpts {
    pub mode: LayoutMode,
    pub layout: LayoutOpts,
    pub paths: PathOpts,
    pub animation: AnimationConfig,
    pub animator: AnimatorOpts,
}

/// Cached output of the layout and path stages.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SceneGeometry {
    pub fingerprint: SceneFingerprint,
    /// `None` when the canvas cannot hold a diagram.
    pub layout: Option<StageLayout>,
    pub paths: Vec<PathDescriptor>,
    pub skipped: Vec<SkippedEdge>,
}

/// Plain data for one rendered frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FrameSnapshot {
    pub title: String,
    pub mode: LayoutMode,
    pub canvas: Canvas,
    pub timestamp: f64,
    pub playback: PlaybackState,
    pub speed_multiplier: f64,
    /// Curve applied to marker progress; SVG output mirrors it with SMIL splines.
    pub ease: Ease,
    pub stages: Vec<Stage>,
    pub bands: Vec<LayoutBand>,
    /// Exit sinks referenced by drop-off paths, without duplicates.
    pub exit_sinks: Vec<LayoutBand>,
    /// Node-map hub.
    pub hub: Option<Point>,
    pub paths: Vec<PathDescriptor>,
    pub skipped: Vec<SkippedEdge>,
    pub markers: Vec<MarkerSample>,
}

impl FrameSnapshot {
    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    pub fn to_json_pretty(&self) -> JourneyResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| JourneyError::serde(e.to_string()))
    }
}

/// One visualization instance: journey data, layout mode, animation clock and frame host.
///
/// [`Self::frame`] runs layout, then connectors, then marker sampling. The first two stages
/// only re-run when [`fingerprint_geometry`] changes.
#[derive(Debug)]
pub struct DiagramScene<H: FrameHost> {
    journey: Journey,
    model: StageModel,
    path_opts: PathOpts,
    geometry: Option<SceneGeometry>,
    anim: AnimationLoop<H>,
    rebuilds: u64,
}

impl<H: FrameHost> DiagramScene<H> {
    pub fn new(journey: Journey, opts: SceneOpts, host: H) -> JourneyResult<Self> {
        journey.validate()?;
        opts.paths.validate()?;
        let animator = ParticleAnimator::new(opts.animation, opts.animator)?;
        Ok(Self {
            journey,
            model: StageModel::new(opts.layout, opts.mode),
            path_opts: opts.paths,
            geometry: None,
            anim: AnimationLoop::new(host, animator),
            rebuilds: 0,
        })
    }

    pub fn journey(&self) -> &Journey {
        &self.journey
    }

    pub fn mode(&self) -> LayoutMode {
        self.model.mode
    }

    pub fn animation(&self) -> &AnimationLoop<H> {
        &self.anim
    }

    pub fn animation_mut(&mut self) -> &mut AnimationLoop<H> {
        &mut self.anim
    }

    /// How many times layout and paths were recomputed.
    pub fn geometry_rebuilds(&self) -> u64 {
        self.rebuilds
    }

    pub fn set_mode(&mut self, mode: LayoutMode) {
        self.model.set_mode(mode);
    }

    pub fn set_canvas(&mut self, canvas: Canvas) {
        self.model.set_canvas(canvas);
    }

    /// Replace the journey. Invalid input is rejected and the current diagram is kept.
    pub fn set_journey(&mut self, journey: Journey) -> JourneyResult<()> {
        journey.validate()?;
        self.journey = journey;
        Ok(())
    }

    pub fn pause(&mut self, now: f64) {
        self.anim.pause(now);
    }

    pub fn resume(&mut self, now: f64) {
        self.anim.resume(now);
    }

    pub fn toggle(&mut self, now: f64) -> PlaybackState {
        self.anim.toggle(now)
    }

    pub fn set_speed(&mut self, m: f64, now: f64) -> JourneyResult<()> {
        self.anim.set_speed(m, now)
    }

    pub fn teardown(&mut self, now: f64) {
        self.anim.teardown(now);
        self.geometry = None;
    }

    fn current_fingerprint(&self) -> SceneFingerprint {
        fingerprint_geometry(&self.journey, self.model.mode, &self.model.opts, &self.path_opts)
    }

    /// Layout and connectors for the current inputs, recomputed only when they changed.
    pub fn geometry(&mut self, now: f64) -> &SceneGeometry {
        let fp = self.current_fingerprint();
        let stale = self.geometry.as_ref().is_none_or(|g| g.fingerprint != fp);
        if stale {
            let geometry = self.build_geometry(fp);
            self.anim.animator_mut().schedule(&geometry.paths, now);
            self.anim.start(now);
            self.rebuilds += 1;
            self.geometry = Some(geometry);
        }
        self.geometry.get_or_insert_with(|| SceneGeometry {
            fingerprint: fp,
            layout: None,
            paths: Vec::new(),
            skipped: Vec::new(),
        })
    }

    #[tracing::instrument(skip(self), fields(mode = self.model.mode.as_str()))]
    fn build_geometry(&self, fingerprint: SceneFingerprint) -> SceneGeometry {
        let layout = match self.model.layout(&self.journey.stages) {
            Ok(layout) => layout,
            Err(err) => {
                tracing::warn!(error = %err, "layout failed; drawing an empty scene");
                return SceneGeometry {
                    fingerprint,
                    layout: None,
                    paths: Vec::new(),
                    skipped: Vec::new(),
                };
            }
        };
        let set = FlowPathBuilder::for_layout(&layout, self.path_opts.clone())
            .build_all(&layout, &self.journey);
        SceneGeometry {
            fingerprint,
            layout: Some(layout),
            paths: set.paths,
            skipped: set.skipped,
        }
    }

    /// Run the per-frame pipeline at host time `now`.
    pub fn frame(&mut self, now: f64) -> FrameSnapshot {
        self.geometry(now);
        let markers = self.anim.on_frame(now).to_vec();

        let (bands, exit_sinks, hub, paths, skipped) = match &self.geometry {
            Some(SceneGeometry {
                layout: Some(layout),
                paths,
                skipped,
                ..
            }) => (
                layout.bands.clone(),
                exit_sinks(layout, &self.journey, paths),
                (layout.mode == LayoutMode::NodeMap).then_some(layout.hub),
                paths.clone(),
                skipped.clone(),
            ),
            _ => (Vec::new(), Vec::new(), None, Vec::new(), Vec::new()),
        };

        let animator = self.anim.animator();
        FrameSnapshot {
            title: self.journey.title.clone(),
            mode: self.model.mode,
            canvas: self.model.opts.canvas,
            timestamp: now,
            playback: animator.state(),
            speed_multiplier: animator.config().speed_multiplier,
            ease: animator.opts().ease,
            stages: self.journey.stages.clone(),
            bands,
            exit_sinks,
            hub,
            paths,
            skipped,
            markers,
        }
    }
}

fn exit_sinks(
    layout: &StageLayout,
    journey: &Journey,
    paths: &[PathDescriptor],
) -> Vec<LayoutBand> {
    let mut out: Vec<LayoutBand> = Vec::new();
    for p in paths.iter().filter(|p| p.is_dropoff) {
        let Some(src) = journey.stage_index(&p.from) else {
            continue;
        };
        let sink = layout.exit_sink_for(src);
        if !out.iter().any(|s| s.rect() == sink.rect()) {
            out.push(sink);
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/scene/pipeline.rs"]
mod tests;
