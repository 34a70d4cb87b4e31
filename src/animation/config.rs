use crate::foundation::error::{JourneyError, JourneyResult};

/// Speed multipliers offered by the speed selector.
pub const SPEED_PRESETS: [f64; 4] = [0.5, 1.0, 1.5, 2.0];

/// Playback state of a visualization instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// Clocks advance with the host's frame callbacks.
    #[default]
    Playing,
    /// Clocks are frozen; markers hold their progress.
    Paused,
}

impl PlaybackState {
    pub fn is_playing(self) -> bool {
        self == Self::Playing
    }
}

/// Play/speed state shared by every edge of one visualization.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub playing: bool,
    pub speed_multiplier: f64,
    /// Cycle length of a transition edge at 1x.
    pub duration_base_secs: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            playing: true,
            speed_multiplier: 1.0,
            duration_base_secs: 3.0,
        }
    }
}

impl AnimationConfig {
    pub fn state(&self) -> PlaybackState {
        if self.playing {
            PlaybackState::Playing
        } else {
            PlaybackState::Paused
        }
    }

    pub fn validate(&self) -> JourneyResult<()> {
        validate_speed(self.speed_multiplier)?;
        if !self.duration_base_secs.is_finite() || self.duration_base_secs <= 0.0 {
            return Err(JourneyError::validation(format!(
                "duration_base_secs must be finite and > 0, got {}",
                self.duration_base_secs
            )));
        }
        Ok(())
    }

    /// Wall-clock length of one cycle at the current speed.
    pub fn cycle_secs(&self) -> f64 {
        self.duration_base_secs / self.speed_multiplier
    }
}

pub(crate) fn validate_speed(m: f64) -> JourneyResult<()> {
    if !m.is_finite() || m <= 0.0 {
        return Err(JourneyError::validation(format!(
            "speed multiplier must be finite and > 0, got {m}"
        )));
    }
    Ok(())
}

/// Preset closest to `m`, for snapping free-form input to the selector.
pub fn nearest_preset(m: f64) -> f64 {
    SPEED_PRESETS
        .iter()
        .copied()
        .min_by(|a, b| (a - m).abs().total_cmp(&(b - m).abs()))
        .unwrap_or(1.0)
}

#[cfg(test)]
#[path = "../../tests/unit/animation/config.rs"]
mod tests;
