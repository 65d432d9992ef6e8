use crate::error::PlayerError;
use crate::events::MediaEvent;

pub const DEFAULT_VOLUME: f64 = 0.7;

/// Load status shown by the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Loading,
    Ready,
    Failed,
}

/// Which parts of the rendered widget are stale.
///
/// Time ticks only touch `progress`, so a renderer can redraw the
/// elapsed label and the fill without rebuilding the controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Invalidation {
    pub progress: bool,
    pub controls: bool,
}

impl Invalidation {
    pub const NONE: Invalidation = Invalidation {
        progress: false,
        controls: false,
    };
    pub const PROGRESS: Invalidation = Invalidation {
        progress: true,
        controls: false,
    };
    pub const CONTROLS: Invalidation = Invalidation {
        progress: false,
        controls: true,
    };
    pub const ALL: Invalidation = Invalidation {
        progress: true,
        controls: true,
    };

    pub fn merge(&mut self, other: Invalidation) {
        self.progress |= other.progress;
        self.controls |= other.controls;
    }

    pub fn is_empty(&self) -> bool {
        !self.progress && !self.controls
    }
}

/// Playback state owned by one widget.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub playing: bool,
    pub volume: f64,
    pub muted: bool,
    pub duration: Option<f64>,
    pub current_time: f64,
    pub loaded: bool,
    pub error: Option<PlayerError>,
    pub(crate) dirty: Invalidation,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            playing: false,
            volume: DEFAULT_VOLUME,
            muted: false,
            duration: None,
            current_time: 0.0,
            loaded: false,
            error: None,
            dirty: Invalidation::ALL,
        }
    }
}

impl PlayerState {
    pub fn status(&self) -> LoadStatus {
        match &self.error {
            Some(error) if error.is_load_failure() => LoadStatus::Failed,
            _ if self.loaded => LoadStatus::Ready,
            _ => LoadStatus::Loading,
        }
    }

    /// Seek-bar fill as a fraction in `[0, 1]`; zero while the duration is
    /// unknown or zero.
    pub fn fill_fraction(&self) -> f64 {
        match self.duration {
            Some(duration) if duration > 0.0 => (self.current_time / duration).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }

    /// Volume the resource should be outputting right now.
    pub fn effective_volume(&self) -> f64 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }

    /// Clamps a position into `[0, duration]` (or `[0, ∞)` while unknown).
    pub fn clamp_time(&self, time: f64) -> f64 {
        let time = sanitize(time);
        match self.duration {
            Some(duration) => time.min(duration),
            None => time,
        }
    }

    pub(crate) fn invalidate(&mut self, what: Invalidation) {
        self.dirty.merge(what);
    }

    pub(crate) fn take_invalidation(&mut self) -> Invalidation {
        std::mem::take(&mut self.dirty)
    }

    /// Folds a resource event into the state.
    pub fn apply(&mut self, event: &MediaEvent) {
        match event {
            MediaEvent::LoadedMetadata { duration } => {
                let duration = sanitize(*duration);
                self.duration = Some(duration);
                self.loaded = true;
                self.current_time = self.current_time.min(duration);
                if matches!(self.error, Some(PlayerError::LoadFailed(_))) {
                    self.error = None;
                }
                self.invalidate(Invalidation::ALL);
            }
            MediaEvent::TimeUpdate { current_time } => {
                self.current_time = self.clamp_time(*current_time);
                self.invalidate(Invalidation::PROGRESS);
            }
            MediaEvent::Ended => {
                self.playing = false;
                self.current_time = 0.0;
                self.invalidate(Invalidation::ALL);
            }
            MediaEvent::Error(error) => {
                if matches!(
                    error,
                    PlayerError::PlaybackRejected(_) | PlayerError::LoadFailed(_)
                ) {
                    self.playing = false;
                }
                self.error = Some(error.clone());
                self.invalidate(Invalidation::CONTROLS);
            }
        }
    }
}

/// Non-finite and negative values collapse to zero.
pub(crate) fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let state = PlayerState::default();
        assert!(!state.playing);
        assert_eq!(state.volume, 0.7);
        assert!(!state.muted);
        assert_eq!(state.duration, None);
        assert_eq!(state.current_time, 0.0);
        assert!(!state.loaded);
        assert_eq!(state.status(), LoadStatus::Loading);
    }

    #[test]
    fn metadata_marks_loaded() {
        let mut state = PlayerState::default();
        state.apply(&MediaEvent::LoadedMetadata { duration: 120.0 });
        assert!(state.loaded);
        assert_eq!(state.duration, Some(120.0));
        assert_eq!(state.status(), LoadStatus::Ready);
    }

    #[test]
    fn time_update_only_invalidates_progress() {
        let mut state = PlayerState::default();
        state.apply(&MediaEvent::LoadedMetadata { duration: 120.0 });
        state.take_invalidation();

        state.apply(&MediaEvent::TimeUpdate { current_time: 30.0 });
        assert_eq!(state.fill_fraction(), 0.25);
        assert_eq!(state.take_invalidation(), Invalidation::PROGRESS);
    }

    #[test]
    fn time_update_is_clamped_to_duration() {
        let mut state = PlayerState::default();
        state.apply(&MediaEvent::LoadedMetadata { duration: 10.0 });
        state.apply(&MediaEvent::TimeUpdate { current_time: 10.4 });
        assert_eq!(state.current_time, 10.0);
        state.apply(&MediaEvent::TimeUpdate { current_time: -1.0 });
        assert_eq!(state.current_time, 0.0);
    }

    #[test]
    fn ended_resets_position() {
        let mut state = PlayerState {
            playing: true,
            ..PlayerState::default()
        };
        state.apply(&MediaEvent::LoadedMetadata { duration: 60.0 });
        state.apply(&MediaEvent::TimeUpdate { current_time: 59.0 });
        state.apply(&MediaEvent::Ended);
        assert!(!state.playing);
        assert_eq!(state.current_time, 0.0);
        assert_eq!(state.fill_fraction(), 0.0);
    }

    #[test]
    fn load_failure_is_distinct_from_loading() {
        let mut state = PlayerState::default();
        state.apply(&MediaEvent::Error(PlayerError::LoadFailed("404".into())));
        assert_eq!(state.status(), LoadStatus::Failed);
        assert!(!state.loaded);

        state.apply(&MediaEvent::LoadedMetadata { duration: 5.0 });
        assert_eq!(state.status(), LoadStatus::Ready);
        assert_eq!(state.error, None);
    }

    #[test]
    fn zero_duration_keeps_fill_empty() {
        let mut state = PlayerState::default();
        state.apply(&MediaEvent::LoadedMetadata { duration: 0.0 });
        state.apply(&MediaEvent::TimeUpdate { current_time: 3.0 });
        assert_eq!(state.fill_fraction(), 0.0);
    }
}
