use thiserror::Error;

/// Failures a widget can run into while driving its media resource.
///
/// None of these escape the widget: they are logged, recorded as the
/// widget's last error and reflected in its display status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayerError {
    /// A command arrived while no resource is bound.
    #[error("media resource is not ready")]
    NotReady,
    /// The resource refused to start playback (platform policy, no source, ...).
    #[error("playback was rejected: {0}")]
    PlaybackRejected(String),
    /// The source could not be fetched or decoded.
    #[error("failed to load media: {0}")]
    LoadFailed(String),
}

impl PlayerError {
    pub fn is_load_failure(&self) -> bool {
        matches!(self, PlayerError::LoadFailed(_))
    }
}
