//! Display helpers: time labels, seek-bar fill width and the volume glyph.

use std::fmt;

/// Formats seconds as `MM:SS`.
///
/// Minutes are not wrapped into hours, so an hour and one second renders
/// as `61:01`.
pub fn format_time(seconds: f64) -> String {
    TimeLabel::from_secs(seconds).to_string()
}

/// A whole-second timestamp that renders as `MM:SS` without allocating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct TimeLabel(u64);

impl TimeLabel {
    pub fn from_secs(seconds: f64) -> Self {
        if seconds.is_finite() && seconds > 0.0 {
            TimeLabel(seconds.floor() as u64)
        } else {
            TimeLabel(0)
        }
    }

    pub fn minutes(&self) -> u64 {
        self.0 / 60
    }

    pub fn seconds(&self) -> u64 {
        self.0 % 60
    }
}

impl fmt::Display for TimeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes(), self.seconds())
    }
}

/// Total-duration label: `--:--` until the duration is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalLabel {
    Pending,
    Known(TimeLabel),
}

impl fmt::Display for TotalLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TotalLabel::Pending => f.write_str("--:--"),
            TotalLabel::Known(label) => fmt::Display::fmt(label, f),
        }
    }
}

/// Seek-bar fill width in percent, rendered as a CSS-style width (`25%`).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct FillWidth(f64);

impl FillWidth {
    pub fn from_fraction(fraction: f64) -> Self {
        if fraction.is_finite() {
            FillWidth(fraction.clamp(0.0, 1.0) * 100.0)
        } else {
            FillWidth(0.0)
        }
    }

    pub fn percent(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for FillWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 {
            write!(f, "{:.0}%", self.0)
        } else {
            write!(f, "{:.2}%", self.0)
        }
    }
}

/// Icon shown on the mute toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeGlyph {
    Muted,
    Low,
    Full,
}

impl VolumeGlyph {
    pub fn select(muted: bool, volume: f64) -> Self {
        if muted || volume == 0.0 {
            VolumeGlyph::Muted
        } else if volume < 0.5 {
            VolumeGlyph::Low
        } else {
            VolumeGlyph::Full
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            VolumeGlyph::Muted => "🔇",
            VolumeGlyph::Low => "🔉",
            VolumeGlyph::Full => "🔊",
        }
    }
}
