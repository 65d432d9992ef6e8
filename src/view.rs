//! Declarative render model of a widget.
//!
//! Everything here is a pure function of the widget's configuration and
//! state; renderers never write to the widget directly.

use crate::config::{MediaKind, WidgetConfig};
use crate::error::PlayerError;
use crate::format::{FillWidth, TimeLabel, TotalLabel, VolumeGlyph};
use crate::state::{LoadStatus, PlayerState};

/// The per-tick part of the widget: elapsed label and seek-bar fill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressView {
    pub elapsed: TimeLabel,
    pub fill: FillWidth,
}

impl ProgressView {
    pub fn build(state: &PlayerState) -> Self {
        Self {
            elapsed: TimeLabel::from_secs(state.current_time),
            fill: FillWidth::from_fraction(state.fill_fraction()),
        }
    }
}

/// What occupies the picture area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface<'a> {
    /// Visible video surface playing `source`.
    Video { source: &'a str },
    /// Icon placeholder with an invisible element playing `source`.
    Audio { source: &'a str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportButton {
    Play,
    Pause,
}

impl TransportButton {
    pub fn label(&self) -> &'static str {
        match self {
            TransportButton::Play => "Play",
            TransportButton::Pause => "Pause",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MuteButton {
    pub glyph: VolumeGlyph,
    pub muted: bool,
}

impl MuteButton {
    pub fn label(&self) -> &'static str {
        if self.muted {
            "Unmute"
        } else {
            "Mute"
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeSlider {
    pub value: f64,
}

impl VolumeSlider {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 1.0;
    pub const STEP: f64 = 0.01;
    pub const LABEL: &'static str = "Volume";
}

pub const STOP_LABEL: &str = "Stop";

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerView<'a> {
    pub title: &'a str,
    pub surface: Surface<'a>,
    pub progress: ProgressView,
    pub total: TotalLabel,
    pub transport: TransportButton,
    pub mute: MuteButton,
    pub slider: VolumeSlider,
    pub status: LoadStatus,
    pub error: Option<PlayerError>,
}

impl<'a> PlayerView<'a> {
    pub fn build(config: &'a WidgetConfig, state: &PlayerState) -> Self {
        let surface = match config.kind() {
            MediaKind::Video => Surface::Video {
                source: config.source(),
            },
            MediaKind::Audio => Surface::Audio {
                source: config.source(),
            },
        };
        let total = match state.duration {
            Some(duration) if state.loaded => TotalLabel::Known(TimeLabel::from_secs(duration)),
            _ => TotalLabel::Pending,
        };

        Self {
            title: config.display_title(),
            surface,
            progress: ProgressView::build(state),
            total,
            transport: if state.playing {
                TransportButton::Pause
            } else {
                TransportButton::Play
            },
            mute: MuteButton {
                glyph: VolumeGlyph::select(state.muted, state.volume),
                muted: state.muted,
            },
            slider: VolumeSlider {
                value: if state.muted { 0.0 } else { state.volume },
            },
            status: state.status(),
            error: state.error.clone(),
        }
    }
}
