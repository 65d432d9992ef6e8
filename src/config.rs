use std::fmt;

pub const DEFAULT_TITLE: &str = "Media File";

/// Which kind of native element a widget binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Widget configuration, fixed once the widget is constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetConfig {
    kind: MediaKind,
    source: String,
    title: String,
    initially_muted: bool,
}

impl WidgetConfig {
    pub fn new(kind: MediaKind, source: impl Into<String>) -> Self {
        Self {
            kind,
            source: source.into(),
            title: DEFAULT_TITLE.to_string(),
            initially_muted: false,
        }
    }

    pub fn audio(source: impl Into<String>) -> Self {
        Self::new(MediaKind::Audio, source)
    }

    pub fn video(source: impl Into<String>) -> Self {
        Self::new(MediaKind::Video, source)
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Accepted for compatibility with existing page definitions. The widget
    /// never reads it back into its mute state.
    pub fn initially_muted(mut self, muted: bool) -> Self {
        self.initially_muted = muted;
        self
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn display_title(&self) -> &str {
        &self.title
    }

    pub fn is_initially_muted(&self) -> bool {
        self.initially_muted
    }
}
