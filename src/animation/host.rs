use crate::{
    animation::animator::{MarkerSample, ParticleAnimator},
    animation::config::PlaybackState,
    foundation::error::{JourneyError, JourneyResult},
};

/// Handle for one pending frame callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct FrameTicket(pub u64);

/// Display-refresh scheduler of the host environment.
///
/// A refusal (for example a backgrounded tab) is reported as [`JourneyError::Scheduling`].
pub trait FrameHost {
    fn request_frame(&mut self) -> JourneyResult<FrameTicket>;
    fn cancel_frame(&mut self, ticket: FrameTicket);
}

/// In-process host driven by explicit calls; used by the CLI and tests.
#[derive(Debug, Default)]
pub struct ManualHost {
    next: u64,
    refusing: bool,
    pub requested: Vec<FrameTicket>,
    pub cancelled: Vec<FrameTicket>,
}

impl ManualHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent requests fail (or succeed again).
    pub fn set_refusing(&mut self, refusing: bool) {
        self.refusing = refusing;
    }
}

impl FrameHost for ManualHost {
    fn request_frame(&mut self) -> JourneyResult<FrameTicket> {
        if self.refusing {
            return Err(JourneyError::scheduling("host refused frame callback"));
        }
        self.next += 1;
        let ticket = FrameTicket(self.next);
        self.requested.push(ticket);
        Ok(ticket)
    }

    fn cancel_frame(&mut self, ticket: FrameTicket) {
        self.cancelled.push(ticket);
    }
}

/// Ties a [`ParticleAnimator`] to a host's frame callbacks.
///
/// Each delivered frame samples the animator and requests the next callback while playing.
/// Pausing lets the callback chain lapse and resuming restarts it. When the host refuses,
/// the animator's clock is frozen and the last good frame is kept; [`Self::poll`] retries
/// and thaws the clock once scheduling works again.
#[derive(Debug)]
pub struct AnimationLoop<H: FrameHost> {
    host: H,
    animator: ParticleAnimator,
    pending: Option<FrameTicket>,
    last_frame: Vec<MarkerSample>,
    stalled: bool,
    torn_down: bool,
}

impl<H: FrameHost> AnimationLoop<H> {
    pub fn new(host: H, animator: ParticleAnimator) -> Self {
        Self {
            host,
            animator,
            pending: None,
            last_frame: Vec::new(),
            stalled: false,
            torn_down: false,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn animator(&self) -> &ParticleAnimator {
        &self.animator
    }

    pub fn animator_mut(&mut self) -> &mut ParticleAnimator {
        &mut self.animator
    }

    pub fn pending(&self) -> Option<FrameTicket> {
        self.pending
    }

    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    pub fn last_frame(&self) -> &[MarkerSample] {
        &self.last_frame
    }

    /// Request the first callback. Returns `false` when there is nothing to animate.
    ///
    /// A paused animator gets no callback until [`Self::resume`].
    pub fn start(&mut self, now: f64) -> bool {
        self.torn_down = false;
        if self.animator.scheduled_cycles() == 0 {
            return false;
        }
        self.request_if_playing(now);
        !self.stalled
    }

    fn request_if_playing(&mut self, now: f64) {
        let wanted = !self.torn_down
            && self.pending.is_none()
            && self.animator.state().is_playing()
            && self.animator.scheduled_cycles() > 0;
        if wanted {
            self.request(now);
        }
    }

    fn request(&mut self, now: f64) {
        match self.host.request_frame() {
            Ok(ticket) => {
                self.pending = Some(ticket);
                if self.stalled {
                    tracing::debug!("frame scheduling available again");
                    self.animator.thaw(now);
                    self.stalled = false;
                }
            }
            Err(err) => {
                if !self.stalled {
                    tracing::warn!(error = %err, "host refused frame; holding last frame");
                    self.animator.freeze(now);
                    self.stalled = true;
                }
            }
        }
    }

    /// Frame callback: sample at `now` and schedule the next frame.
    pub fn on_frame(&mut self, now: f64) -> &[MarkerSample] {
        self.pending = None;
        if self.torn_down {
            return &self.last_frame;
        }
        self.last_frame = self.animator.sample_frame(now);
        self.request_if_playing(now);
        &self.last_frame
    }

    /// Retry scheduling after a refusal. Returns whether a callback is pending.
    pub fn poll(&mut self, now: f64) -> bool {
        if self.stalled {
            self.request_if_playing(now);
        }
        self.pending.is_some()
    }

    pub fn pause(&mut self, now: f64) {
        self.animator.pause(now);
    }

    pub fn resume(&mut self, now: f64) {
        self.animator.resume(now);
        self.request_if_playing(now);
    }

    pub fn toggle(&mut self, now: f64) -> PlaybackState {
        match self.animator.state() {
            PlaybackState::Playing => self.pause(now),
            PlaybackState::Paused => self.resume(now),
        }
        self.animator.state()
    }

    pub fn set_speed(&mut self, m: f64, now: f64) -> JourneyResult<()> {
        self.animator.set_speed(m, now)
    }

    /// Cancel the pending callback and stop the clock.
    pub fn teardown(&mut self, now: f64) {
        if let Some(ticket) = self.pending.take() {
            self.host.cancel_frame(ticket);
        }
        self.animator.teardown(now);
        self.torn_down = true;
    }
}

impl<H: FrameHost> Drop for AnimationLoop<H> {
    fn drop(&mut self) {
        if let Some(ticket) = self.pending.take() {
            self.host.cancel_frame(ticket);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/host.rs"]
mod tests;
