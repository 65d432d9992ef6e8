// Remu Media Player Widget

pub mod config;
pub mod error;
pub mod events;
pub mod format;
pub mod loader;
pub mod page;
pub mod player;
pub mod resource;
pub mod state;
pub mod view;

pub use config::{MediaKind, WidgetConfig};
pub use error::PlayerError;
pub use events::{EventKind, MediaEvent};
pub use format::{format_time, VolumeGlyph};
pub use player::MediaPlayer;
pub use resource::{MediaElement, MediaResource, MockResource};
pub use state::{LoadStatus, PlayerState};
