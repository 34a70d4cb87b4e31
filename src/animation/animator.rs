use std::collections::BTreeMap;

use crate::{
    animation::config::{AnimationConfig, PlaybackState, validate_speed},
    animation::ease::Ease,
    foundation::core::{CubicBez, Point, point_is_finite},
    foundation::error::JourneyResult,
    paths::builder::{PathDescriptor, paced_point},
};

/// Phase lead of a transition edge's second marker, as a fraction of the cycle, cycling
/// per transition (1 s, 1.5 s and 0.5 s into a 3 s cycle).
const TRANSITION_STAGGER: [f64; 3] = [1.0 / 3.0, 1.0 / 2.0, 1.0 / 6.0];

/// Launch delay between consecutive drop-off edges, as a fraction of their cycle.
const DROPOFF_STAGGER: f64 = 0.25;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnimatorOpts {
    pub markers_per_edge: usize,
    pub markers_per_dropoff: usize,
    /// Drop-off cycles are this much longer than transition cycles.
    pub dropoff_duration_scale: f64,
    pub ease: Ease,
}

impl Default for AnimatorOpts {
    fn default() -> Self {
        Self {
            markers_per_edge: 2,
            markers_per_dropoff: 1,
            dropoff_duration_scale: 4.0 / 3.0,
            ease: Ease::Linear,
        }
    }
}

/// Markers scheduled on one connector.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MarkerTrack {
    pub edge_index: usize,
    pub is_dropoff: bool,
    /// Cycle length at 1x.
    pub duration_base_secs: f64,
    /// Launch delay of each marker at 1x; constant for the life of the track.
    pub phase_offsets_secs: Vec<f64>,
    pub curve: CubicBez,
    pub length: f64,
}

/// Per-edge clock measured in cycle seconds at 1x.
///
/// `anchor_elapsed` is the elapsed time captured at `anchor_ts`; while running, elapsed grows
/// at `speed` cycle seconds per wall second from that anchor.
#[derive(Clone, Copy, Debug, PartialEq)]
struct EdgeClock {
    anchor_ts: f64,
    anchor_elapsed: f64,
}

impl EdgeClock {
    fn started_at(now: f64) -> Self {
        Self {
            anchor_ts: now,
            anchor_elapsed: 0.0,
        }
    }

    fn elapsed(&self, now: f64, speed: f64, running: bool) -> f64 {
        if running {
            self.anchor_elapsed + wall_delta(self.anchor_ts, now) * speed
        } else {
            self.anchor_elapsed
        }
    }

    fn rebase(&mut self, now: f64, speed: f64, running: bool) {
        self.anchor_elapsed = self.elapsed(now, speed, running);
        self.anchor_ts = now;
    }
}

/// Wall time between two host timestamps; never negative so a clock never runs backwards.
fn wall_delta(from: f64, to: f64) -> f64 {
    let d = to - from;
    if d.is_finite() && d > 0.0 { d } else { 0.0 }
}

/// Running total of wall time spent playing, excluding paused and stalled intervals.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct ActiveTime {
    since: Option<f64>,
    accumulated: f64,
}

impl ActiveTime {
    fn total(&self, now: f64) -> f64 {
        self.accumulated + self.since.map_or(0.0, |s| wall_delta(s, now))
    }

    fn stop(&mut self, now: f64) {
        if let Some(s) = self.since.take() {
            self.accumulated += wall_delta(s, now);
        }
    }

    fn start(&mut self, now: f64) {
        if self.since.is_none() {
            self.since = Some(now);
        }
    }
}

/// One marker position handed to the render boundary.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MarkerSample {
    pub edge_index: usize,
    pub marker: usize,
    /// Eased progress along the connector, `0..=1`.
    pub t: f64,
    /// Progress before easing; the fraction of the cycle that has elapsed.
    pub raw_t: f64,
    /// Wall-clock cycle length at the current speed.
    pub cycle_secs: f64,
    pub timestamp: f64,
    /// Completed cycles for this marker.
    pub cycle: u64,
    pub point: Point,
    /// False until the marker's launch delay has passed.
    pub visible: bool,
}

/// Schedules repeating marker motion along connectors.
///
/// Timestamps are host seconds (a monotonic frame clock). Every mutator takes the current
/// timestamp so pausing, resuming and speed changes rebase the per-edge clocks at exactly
/// that instant: progress never jumps.
#[derive(Clone, Debug)]
pub struct ParticleAnimator {
    config: AnimationConfig,
    opts: AnimatorOpts,
    tracks: Vec<MarkerTrack>,
    clocks: Vec<EdgeClock>,
    stalled: bool,
    active: ActiveTime,
}

impl ParticleAnimator {
    pub fn new(config: AnimationConfig, opts: AnimatorOpts) -> JourneyResult<Self> {
        config.validate()?;
        validate_speed(opts.dropoff_duration_scale)?;
        Ok(Self {
            config,
            opts,
            tracks: Vec::new(),
            clocks: Vec::new(),
            stalled: false,
            active: ActiveTime::default(),
        })
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    pub fn opts(&self) -> &AnimatorOpts {
        &self.opts
    }

    pub fn state(&self) -> PlaybackState {
        self.config.state()
    }

    pub fn tracks(&self) -> &[MarkerTrack] {
        &self.tracks
    }

    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    fn running(&self) -> bool {
        self.config.playing && !self.stalled
    }

    fn rebase_all(&mut self, now: f64) {
        let (speed, running) = (self.config.speed_multiplier, self.running());
        for clock in &mut self.clocks {
            clock.rebase(now, speed, running);
        }
    }

    /// Install one track per drawable path; clocks of edges already scheduled keep their
    /// elapsed time so a resize does not restart the motion.
    ///
    /// Returns the number of tracks scheduled.
    #[tracing::instrument(skip_all, fields(paths = paths.len()))]
    pub fn schedule(&mut self, paths: &[PathDescriptor], now: f64) -> usize {
        self.rebase_all(now);
        let previous: BTreeMap<usize, EdgeClock> = self
            .tracks
            .iter()
            .zip(&self.clocks)
            .map(|(t, c)| (t.edge_index, *c))
            .collect();

        self.tracks.clear();
        self.clocks.clear();
        let mut transition_ordinal = 0usize;
        let mut dropoff_ordinal = 0usize;

        for path in paths {
            let curve_ok = [path.curve.p0, path.curve.p1, path.curve.p2, path.curve.p3]
                .into_iter()
                .all(point_is_finite);
            if !curve_ok || !path.length.is_finite() || path.length <= 0.0 {
                tracing::warn!(edge_index = path.edge_index, "skipping degenerate path");
                continue;
            }

            let (base, phases) = if path.is_dropoff {
                let base = self.config.duration_base_secs * self.opts.dropoff_duration_scale;
                let lead = (dropoff_ordinal as f64 * DROPOFF_STAGGER).fract();
                dropoff_ordinal += 1;
                (base, phase_offsets(self.opts.markers_per_dropoff, lead, base))
            } else {
                let base = self.config.duration_base_secs;
                let stagger = TRANSITION_STAGGER[transition_ordinal % TRANSITION_STAGGER.len()];
                transition_ordinal += 1;
                let mut phases = phase_offsets(self.opts.markers_per_edge, 0.0, base);
                if let Some(second) = phases.get_mut(1) {
                    *second = stagger * base;
                }
                (base, phases)
            };

            self.clocks.push(
                previous
                    .get(&path.edge_index)
                    .copied()
                    .unwrap_or_else(|| EdgeClock::started_at(now)),
            );
            self.tracks.push(MarkerTrack {
                edge_index: path.edge_index,
                is_dropoff: path.is_dropoff,
                duration_base_secs: base,
                phase_offsets_secs: phases,
                curve: path.curve,
                length: path.length,
            });
        }

        if !self.tracks.is_empty() && self.running() {
            self.active.start(now);
        }
        self.tracks.len()
    }

    /// Number of marker cycles currently scheduled across all tracks.
    pub fn scheduled_cycles(&self) -> usize {
        self.tracks.iter().map(|t| t.phase_offsets_secs.len()).sum()
    }

    /// Playing → Paused. Captures every edge's elapsed time.
    pub fn pause(&mut self, now: f64) {
        if !self.config.playing {
            return;
        }
        self.rebase_all(now);
        self.active.stop(now);
        self.config.playing = false;
    }

    /// Paused → Playing. Continues from the captured elapsed time.
    pub fn resume(&mut self, now: f64) {
        if self.config.playing {
            return;
        }
        self.rebase_all(now);
        self.config.playing = true;
        if !self.stalled {
            self.active.start(now);
        }
    }

    pub fn toggle(&mut self, now: f64) -> PlaybackState {
        match self.state() {
            PlaybackState::Playing => self.pause(now),
            PlaybackState::Paused => self.resume(now),
        }
        self.state()
    }

    /// Change the speed multiplier.
    ///
    /// While playing, progress at `now` is kept and the remaining cycle time scales by
    /// `old / m`; while paused only the stored multiplier changes.
    pub fn set_speed(&mut self, m: f64, now: f64) -> JourneyResult<()> {
        validate_speed(m)?;
        self.rebase_all(now);
        self.config.speed_multiplier = m;
        Ok(())
    }

    /// Stop advancing because the host refused a frame; independent of the user's pause.
    pub(crate) fn freeze(&mut self, now: f64) {
        if self.stalled {
            return;
        }
        self.rebase_all(now);
        self.active.stop(now);
        self.stalled = true;
    }

    pub(crate) fn thaw(&mut self, now: f64) {
        if !self.stalled {
            return;
        }
        self.rebase_all(now);
        self.stalled = false;
        if self.config.playing {
            self.active.start(now);
        }
    }

    /// Restart every track from t=0 at `now`.
    pub fn restart(&mut self, now: f64) {
        for clock in &mut self.clocks {
            *clock = EdgeClock::started_at(now);
        }
    }

    /// Drop all tracks; the animator schedules nothing until [`Self::schedule`] runs again.
    pub fn teardown(&mut self, now: f64) {
        self.active.stop(now);
        self.tracks.clear();
        self.clocks.clear();
    }

    /// Wall seconds spent playing so far, excluding paused and stalled intervals.
    pub fn active_secs(&self, now: f64) -> f64 {
        self.active.total(now)
    }

    /// Elapsed cycle seconds (1x) on a track's clock.
    pub fn elapsed(&self, track: usize, now: f64) -> Option<f64> {
        let clock = self.clocks.get(track)?;
        Some(clock.elapsed(now, self.config.speed_multiplier, self.running()))
    }

    /// Un-eased progress of one marker and its completed cycles; `None` before launch.
    fn raw_progress(&self, track: usize, marker: usize, now: f64) -> Option<(f64, u64)> {
        let t = self.tracks.get(track)?;
        let phase = *t.phase_offsets_secs.get(marker)?;
        let local = self.elapsed(track, now)? - phase;
        if local < 0.0 {
            return None;
        }
        let cycles = local / t.duration_base_secs;
        Some((cycles.fract(), cycles.floor() as u64))
    }

    /// Eased progress of one marker in `[0, 1)`; `None` before its launch delay passes.
    pub fn progress(&self, track: usize, marker: usize, now: f64) -> Option<f64> {
        self.raw_progress(track, marker, now)
            .map(|(p, _)| self.opts.ease.apply(p))
    }

    /// Wall seconds until the marker completes its current cycle at the current speed.
    pub fn remaining_secs(&self, track: usize, marker: usize, now: f64) -> Option<f64> {
        let (p, _) = self.raw_progress(track, marker, now)?;
        let base = self.tracks.get(track)?.duration_base_secs;
        Some((1.0 - p) * base / self.config.speed_multiplier)
    }

    fn sample(&self, track: usize, marker: usize, now: f64) -> Option<MarkerSample> {
        let t = self.tracks.get(track)?;
        let (raw, cycle, visible) = match self.raw_progress(track, marker, now) {
            Some((p, c)) => (p, c, true),
            None => (0.0, 0, false),
        };
        let progress = self.opts.ease.apply(raw);
        Some(MarkerSample {
            edge_index: t.edge_index,
            marker,
            t: progress,
            raw_t: raw,
            cycle_secs: t.duration_base_secs / self.config.speed_multiplier,
            timestamp: now,
            cycle,
            point: paced_point(&t.curve, t.length, progress),
            visible,
        })
    }

    /// Positions of every launched marker at `now`, in track order.
    pub fn sample_frame(&self, now: f64) -> Vec<MarkerSample> {
        let mut out = Vec::with_capacity(self.scheduled_cycles());
        for (ti, track) in self.tracks.iter().enumerate() {
            for mi in 0..track.phase_offsets_secs.len() {
                if let Some(s) = self.sample(ti, mi, now).filter(|s| s.visible) {
                    out.push(s);
                }
            }
        }
        out
    }

    /// Lazy, infinite sample sequence for one marker, stepping `interval` seconds from `start`
    /// under the current play state.
    pub fn samples(
        &self,
        track: usize,
        marker: usize,
        start: f64,
        interval: f64,
    ) -> MarkerSamples<'_> {
        let interval = if interval.is_finite() && interval > 0.0 {
            interval
        } else {
            1.0 / 60.0
        };
        MarkerSamples {
            animator: self,
            track,
            marker,
            start,
            interval,
            step: 0,
        }
    }
}

fn phase_offsets(markers: usize, lead: f64, base: f64) -> Vec<f64> {
    let n = markers.max(1);
    (0..n)
        .map(|m| ((lead + m as f64 / n as f64).fract()) * base)
        .collect()
}

/// Iterator returned by [`ParticleAnimator::samples`]. Never ends for a scheduled marker;
/// call [`MarkerSamples::restart`] to replay from the first timestamp.
#[derive(Clone, Debug)]
pub struct MarkerSamples<'a> {
    animator: &'a ParticleAnimator,
    track: usize,
    marker: usize,
    start: f64,
    interval: f64,
    step: u64,
}

impl MarkerSamples<'_> {
    pub fn restart(&mut self) {
        self.step = 0;
    }
}

impl Iterator for MarkerSamples<'_> {
    type Item = MarkerSample;

    fn next(&mut self) -> Option<Self::Item> {
        let now = self.start + self.step as f64 * self.interval;
        let sample = self.animator.sample(self.track, self.marker, now)?;
        self.step += 1;
        Some(sample)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/animator.rs"]
mod tests;
