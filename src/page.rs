//! The page: a heading and one player per configured widget, driven by
//! text commands and rendered as text cards.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::warn;

use crate::config::{MediaKind, WidgetConfig};
use crate::error::PlayerError;
use crate::player::MediaPlayer;
use crate::resource::{MediaElement, MediaResource};
use crate::state::LoadStatus;
use crate::view::{PlayerView, ProgressView, Surface, VolumeSlider, STOP_LABEL};

pub const HEADING: &str = "Media Player";

const BAR_WIDTH: usize = 32;

pub const HELP: &str = "\
commands:
  play|pause|stop|mute <video|audio>
  volume <video|audio> <0..1>
  seek <video|audio> <fraction>
  click <video|audio> <offset> <width>
  show | help | quit
";

/// Opens the resource for a widget.
pub type Opener<R> = Box<dyn Fn(&WidgetConfig) -> anyhow::Result<R>>;

/// Widgets on the default page.
pub fn default_widgets() -> Vec<WidgetConfig> {
    vec![
        WidgetConfig::video(
            "public/Bola de Drac Z - Opening Català (v2) HD 720p (Subtítols-Karaoke).mp4",
        )
        .title("Dragon Ball in Catalan - sample video")
        .initially_muted(true),
        WidgetConfig::audio(
            "public/Bola de Drac Z - Opening Català (v2) HD 720p (Subtítols-Karaoke).mp3",
        )
        .title("SoundHelix Song 1 - sample audio"),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Play(MediaKind),
    Pause(MediaKind),
    Stop(MediaKind),
    Mute(MediaKind),
    Volume(MediaKind, f64),
    Seek(MediaKind, f64),
    Click(MediaKind, f64, f64),
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command `{0}` (try `help`)")]
    Unknown(String),
    #[error("unknown player `{0}`, expected `video` or `audio`")]
    UnknownTarget(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("`{0}` is not a number")]
    NotANumber(String),
}

fn parse_target(word: Option<&str>, usage: &'static str) -> Result<MediaKind, CommandError> {
    match word {
        Some("video") => Ok(MediaKind::Video),
        Some("audio") => Ok(MediaKind::Audio),
        Some(other) => Err(CommandError::UnknownTarget(other.to_string())),
        None => Err(CommandError::Usage(usage)),
    }
}

fn parse_number(word: Option<&str>, usage: &'static str) -> Result<f64, CommandError> {
    let word = word.ok_or(CommandError::Usage(usage))?;
    word.parse()
        .map_err(|_| CommandError::NotANumber(word.to_string()))
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or(CommandError::Empty)?;
        let command = match name {
            "play" => Command::Play(parse_target(words.next(), "play <video|audio>")?),
            "pause" => Command::Pause(parse_target(words.next(), "pause <video|audio>")?),
            "stop" => Command::Stop(parse_target(words.next(), "stop <video|audio>")?),
            "mute" => Command::Mute(parse_target(words.next(), "mute <video|audio>")?),
            "volume" => {
                const USAGE: &str = "volume <video|audio> <0..1>";
                let target = parse_target(words.next(), USAGE)?;
                Command::Volume(target, parse_number(words.next(), USAGE)?)
            }
            "seek" => {
                const USAGE: &str = "seek <video|audio> <fraction>";
                let target = parse_target(words.next(), USAGE)?;
                Command::Seek(target, parse_number(words.next(), USAGE)?)
            }
            "click" => {
                const USAGE: &str = "click <video|audio> <offset> <width>";
                let target = parse_target(words.next(), USAGE)?;
                let offset = parse_number(words.next(), USAGE)?;
                Command::Click(target, offset, parse_number(words.next(), USAGE)?)
            }
            "show" => Command::Show,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

pub struct PageShell<R: MediaResource = MediaElement> {
    heading: String,
    players: Vec<MediaPlayer<R>>,
    open: Opener<R>,
}

impl PageShell<MediaElement> {
    /// The default page, bound to native playback.
    pub fn native() -> Self {
        Self::new(HEADING, default_widgets(), Box::new(MediaElement::open))
    }
}

impl<R: MediaResource> PageShell<R> {
    pub fn new(heading: impl Into<String>, widgets: Vec<WidgetConfig>, open: Opener<R>) -> Self {
        let players = widgets
            .into_iter()
            .map(|config| {
                let mut player = MediaPlayer::new(config);
                attach(&open, &mut player);
                player
            })
            .collect();

        Self {
            heading: heading.into(),
            players,
            open,
        }
    }

    pub fn players(&self) -> &[MediaPlayer<R>] {
        &self.players
    }

    pub fn player_mut(&mut self, kind: MediaKind) -> Option<&mut MediaPlayer<R>> {
        self.players
            .iter_mut()
            .find(|player| player.config().kind() == kind)
    }

    /// Runs one command and returns what should be printed.
    pub fn execute(&mut self, command: Command) -> String {
        let kind = match command {
            Command::Show => return self.render(),
            Command::Help => return HELP.to_string(),
            Command::Quit => return String::new(),
            Command::Play(kind)
            | Command::Pause(kind)
            | Command::Stop(kind)
            | Command::Mute(kind)
            | Command::Volume(kind, _)
            | Command::Seek(kind, _)
            | Command::Click(kind, _, _) => kind,
        };

        let open = &self.open;
        let Some(player) = self
            .players
            .iter_mut()
            .find(|player| player.config().kind() == kind)
        else {
            return format!("no {kind} player on this page\n");
        };

        match command {
            Command::Play(_) => {
                if !player.is_bound() {
                    attach(open, player);
                }
                player.play();
            }
            Command::Pause(_) => player.pause(),
            Command::Stop(_) => player.stop(),
            Command::Mute(_) => player.toggle_mute(),
            Command::Volume(_, level) => player.set_volume(level),
            Command::Seek(_, fraction) => player.seek_fraction(fraction),
            Command::Click(_, offset, width) => player.click_progress(offset, width),
            Command::Show | Command::Help | Command::Quit => {}
        }

        player.take_invalidation();
        Card(&player.view()).to_string()
    }

    /// Pumps every resource and renders only what changed: a full card when
    /// controls changed, a single progress line when only time moved.
    pub fn tick(&mut self) -> String {
        let mut out = String::new();
        for player in &mut self.players {
            player.tick();
            let changed = player.take_invalidation();
            if changed.controls {
                out.push_str(&Card(&player.view()).to_string());
            } else if changed.progress {
                let view = player.view();
                out.push_str(&format!(
                    "{} {}\n",
                    view.title,
                    ProgressLine(&view.progress, &view.total.to_string())
                ));
            }
        }
        out
    }

    pub fn render(&mut self) -> String {
        let mut out = format!("# {}\n\n", self.heading);
        for player in &mut self.players {
            player.take_invalidation();
            out.push_str(&Card(&player.view()).to_string());
            out.push('\n');
        }
        out
    }
}

fn attach<R: MediaResource>(open: &Opener<R>, player: &mut MediaPlayer<R>) {
    match open(player.config()) {
        Ok(resource) => player.bind(resource),
        Err(error) => {
            let reason = format!("{error:#}");
            warn!(src = player.config().source(), %reason, "cannot open media element");
            player.report_error(PlayerError::LoadFailed(reason));
        }
    }
}

struct ProgressLine<'a>(&'a ProgressView, &'a str);

impl fmt::Display for ProgressLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ProgressLine(progress, total) = self;
        let filled = ((progress.fill.percent() / 100.0) * BAR_WIDTH as f64).round() as usize;
        let filled = filled.min(BAR_WIDTH);
        write!(
            f,
            "[{}{}] {} / {}",
            "█".repeat(filled),
            "░".repeat(BAR_WIDTH - filled),
            progress.elapsed,
            total
        )
    }
}

struct Card<'a>(&'a PlayerView<'a>);

impl fmt::Display for Card<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let view = self.0;
        writeln!(f, "┌─ {}", view.title)?;
        match view.surface {
            Surface::Video { source } => writeln!(f, "│ [video] {source}")?,
            Surface::Audio { source } => writeln!(f, "│ [♪] (hidden audio: {source})")?,
        }
        writeln!(
            f,
            "│ {}",
            ProgressLine(&view.progress, &view.total.to_string())
        )?;
        writeln!(
            f,
            "│ [{}] [{}] [{} {}] {}: {:.0}%",
            view.transport.label(),
            STOP_LABEL,
            view.mute.glyph.symbol(),
            view.mute.label(),
            VolumeSlider::LABEL,
            view.slider.value * 100.0
        )?;
        match (&view.status, &view.error) {
            (LoadStatus::Failed, Some(error)) => writeln!(f, "│ error: {error}")?,
            (LoadStatus::Loading, _) => writeln!(f, "│ loading…")?,
            (_, Some(error)) => writeln!(f, "│ {error}")?,
            _ => {}
        }
        writeln!(f, "└─")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MediaEvent;
    use crate::resource::MockResource;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn mock_page() -> (PageShell<MockResource>, Rc<RefCell<Vec<MockResource>>>) {
        let opened = Rc::new(RefCell::new(Vec::new()));
        let registry = Rc::clone(&opened);
        let page = PageShell::new(
            HEADING,
            default_widgets(),
            Box::new(move |_config: &WidgetConfig| {
                let resource = MockResource::new();
                registry.borrow_mut().push(resource.clone());
                Ok(resource)
            }),
        );
        (page, opened)
    }

    #[test]
    fn parses_commands() {
        assert_eq!("play video".parse::<Command>(), Ok(Command::Play(MediaKind::Video)));
        assert_eq!(
            "volume audio 0.25".parse::<Command>(),
            Ok(Command::Volume(MediaKind::Audio, 0.25))
        );
        assert_eq!(
            "click video 40 160".parse::<Command>(),
            Ok(Command::Click(MediaKind::Video, 40.0, 160.0))
        );
        assert_eq!("  quit ".parse::<Command>(), Ok(Command::Quit));
    }

    #[test]
    fn rejects_bad_commands() {
        assert_eq!("".parse::<Command>(), Err(CommandError::Empty));
        assert_eq!(
            "rewind video".parse::<Command>(),
            Err(CommandError::Unknown("rewind".into()))
        );
        assert_eq!(
            "play radio".parse::<Command>(),
            Err(CommandError::UnknownTarget("radio".into()))
        );
        assert_eq!(
            "volume audio loud".parse::<Command>(),
            Err(CommandError::NotANumber("loud".into()))
        );
        assert!(matches!(
            "seek video".parse::<Command>(),
            Err(CommandError::Usage(_))
        ));
    }

    #[test]
    fn default_page_has_one_video_and_one_audio() {
        let (page, opened) = mock_page();
        assert_eq!(page.players().len(), 2);
        assert_eq!(opened.borrow().len(), 2);
        assert_eq!(page.players()[0].config().kind(), MediaKind::Video);
        assert_eq!(page.players()[1].config().kind(), MediaKind::Audio);
    }

    #[test]
    fn widgets_are_independent() {
        let (mut page, opened) = mock_page();
        page.execute(Command::Play(MediaKind::Video));
        page.execute(Command::Volume(MediaKind::Audio, 0.2));

        let opened = opened.borrow();
        assert!(opened[0].is_playing());
        assert!(!opened[1].is_playing());
        assert_eq!(opened[0].output_volume(), 0.7);
        assert_eq!(opened[1].output_volume(), 0.2);
    }

    #[test]
    fn render_shows_placeholder_then_duration() {
        let (mut page, opened) = mock_page();
        let first = page.render();
        assert!(first.starts_with("# Media Player"));
        assert!(first.contains("00:00 / --:--"));

        opened.borrow()[1].emit(MediaEvent::LoadedMetadata { duration: 185.0 });
        let out = page.tick();
        assert!(out.contains("SoundHelix Song 1"));
        assert!(out.contains("/ 03:05"));
    }

    #[test]
    fn tick_prints_progress_line_for_time_updates() {
        let (mut page, opened) = mock_page();
        opened.borrow()[0].emit(MediaEvent::LoadedMetadata { duration: 120.0 });
        page.tick();

        opened.borrow()[0].queue(MediaEvent::TimeUpdate { current_time: 30.0 });
        let out = page.tick();
        assert_eq!(out.lines().count(), 1);
        assert!(out.contains("00:30 / 02:00"));
        assert!(page.tick().is_empty());
    }

    #[test]
    fn failed_open_keeps_page_alive_and_retries_on_play() {
        let attempts = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&attempts);
        let mut page: PageShell<MockResource> = PageShell::new(
            HEADING,
            vec![WidgetConfig::audio("song.mp3")],
            Box::new(move |_config: &WidgetConfig| {
                *counter.borrow_mut() += 1;
                if *counter.borrow() == 1 {
                    anyhow::bail!("no output device")
                }
                Ok(MockResource::new())
            }),
        );

        let card = page.render();
        assert!(card.contains("error: failed to load media: no output device"));
        assert!(!page.players()[0].is_bound());

        let card = page.execute(Command::Play(MediaKind::Audio));
        assert_eq!(*attempts.borrow(), 2);
        assert!(page.players()[0].is_bound());
        assert!(card.contains("[Pause]"));
    }

    #[test]
    fn missing_player_is_reported() {
        let mut page: PageShell<MockResource> = PageShell::new(
            HEADING,
            vec![WidgetConfig::audio("song.mp3")],
            Box::new(|_config: &WidgetConfig| Ok(MockResource::new())),
        );
        assert_eq!(
            page.execute(Command::Stop(MediaKind::Video)),
            "no video player on this page\n"
        );
    }
}
