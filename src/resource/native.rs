use std::collections::VecDeque;
use std::io::Cursor;
use std::time::Duration;

use anyhow::Result;
use bytes::Bytes;
use rodio::queue::SourcesQueueOutput;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tracing::{debug, info, warn};

use super::MediaResource;
use crate::error::PlayerError;
use crate::events::{EventKind, Listener, ListenerId, Listeners, MediaEvent};
use crate::loader::{self, LoadError};

#[derive(Debug, Clone, PartialEq, Eq)]
enum LoadState {
    Pending,
    Ready,
    Failed(String),
}

/// 音频和视频元素共用的播放管线：rodio sink + 读取源数据的解码器
///
/// 管线状态变化时事件先入队，由 [`pump`] 统一派发，
/// 订阅者只会在调用方的循环中被调用。
///
/// [`pump`]: SinkBackend::pump
pub struct SinkBackend {
    _stream: Option<OutputStream>,
    sink: Sink,
    source: String,
    hint: String,
    data: Option<Bytes>,
    duration: Option<f64>,
    load_state: LoadState,
    playing: bool,
    volume: f64,
    queue: VecDeque<MediaEvent>,
    listeners: Listeners,
}

impl SinkBackend {
    /// 打开默认输出设备并创建管线
    pub fn open(source: &str, hint: String) -> Result<Self> {
        let stream = OutputStreamBuilder::open_default_stream()?;
        let sink = Sink::connect_new(stream.mixer());
        Ok(Self::with_sink(source, hint, sink, Some(stream)))
    }

    /// 不连接输出设备的管线，采样由调用方从返回的队列输出中拉取
    pub fn detached(source: &str, hint: String) -> (Self, SourcesQueueOutput) {
        let (sink, output) = Sink::new();
        (Self::with_sink(source, hint, sink, None), output)
    }

    fn with_sink(source: &str, hint: String, sink: Sink, stream: Option<OutputStream>) -> Self {
        sink.pause();
        Self {
            _stream: stream,
            sink,
            source: source.to_string(),
            hint,
            data: None,
            duration: None,
            load_state: LoadState::Pending,
            playing: false,
            volume: 1.0,
            queue: VecDeque::new(),
            listeners: Listeners::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn active_listeners(&self) -> usize {
        self.listeners.len()
    }

    fn load(&mut self) {
        info!(src = %self.source, hint = %self.hint, "loading media");
        match self.try_load() {
            Ok(duration) => {
                self.load_state = LoadState::Ready;
                self.duration = Some(duration);
                self.queue.push_back(MediaEvent::LoadedMetadata { duration });
            }
            Err(error) => {
                warn!(src = %self.source, %error, "media failed to load");
                let message = error.to_string();
                self.load_state = LoadState::Failed(message.clone());
                self.queue
                    .push_back(MediaEvent::Error(PlayerError::LoadFailed(message)));
            }
        }
    }

    fn try_load(&mut self) -> Result<f64, LoadError> {
        let data = match &self.data {
            Some(data) => data.clone(),
            None => loader::fetch(&self.source)?,
        };
        let decoded = self.arm(data.clone())?;
        self.data = Some(data.clone());

        let duration = match decoded {
            Some(duration) => duration.as_secs_f64(),
            None => match loader::probe_duration(&data, &self.hint) {
                Ok(duration) => duration,
                Err(error) => {
                    warn!(src = %self.source, %error, "duration unavailable");
                    0.0
                }
            },
        };
        Ok(duration)
    }

    /// 用一个从 0 开始的新解码器替换 sink 中的内容
    fn arm(&mut self, data: Bytes) -> Result<Option<Duration>, LoadError> {
        let byte_len = data.len() as u64;
        let decoder = Decoder::builder()
            .with_data(Cursor::new(data))
            .with_byte_len(byte_len)
            .with_seekable(true)
            .with_hint(&self.hint)
            .build()?;
        let total = decoder.total_duration();

        if !self.sink.empty() {
            self.sink.clear();
        }
        self.sink.append(decoder);
        self.sink.pause();
        self.sink.set_volume(self.volume as f32);
        Ok(total)
    }

    /// 尚未加载时先加载，加载失败返回 `LoadFailed`
    pub fn play(&mut self) -> Result<(), PlayerError> {
        if self.load_state == LoadState::Pending {
            self.load();
        }
        if let LoadState::Failed(reason) = &self.load_state {
            return Err(PlayerError::LoadFailed(reason.clone()));
        }
        self.sink.play();
        self.playing = true;
        Ok(())
    }

    pub fn pause(&mut self) {
        self.sink.pause();
        self.playing = false;
    }

    pub fn current_time(&self) -> f64 {
        self.sink.get_pos().as_secs_f64()
    }

    pub fn set_current_time(&mut self, seconds: f64) {
        let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        if let Err(error) = self.sink.try_seek(Duration::from_secs_f64(seconds)) {
            warn!(src = %self.source, %error, seconds, "seek failed");
        }
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn set_volume(&mut self, level: f64) {
        self.volume = level.clamp(0.0, 1.0);
        self.sink.set_volume(self.volume as f32);
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn subscribe(&mut self, kind: EventKind, listener: Listener) -> ListenerId {
        self.listeners.add(kind, listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn reload(&mut self) {
        if let LoadState::Failed(_) = self.load_state {
            debug!(src = %self.source, "re-arming failed source");
            self.data = None;
            self.load_state = LoadState::Pending;
        }
    }

    pub fn pump(&mut self) {
        if self.load_state == LoadState::Pending {
            self.load();
        }

        if self.playing {
            if self.sink.empty() {
                self.playing = false;
                self.queue.push_back(MediaEvent::Ended);
                // 重新装载，下次 play() 从 0 开始
                if let Some(data) = self.data.clone() {
                    if let Err(error) = self.arm(data) {
                        warn!(src = %self.source, %error, "could not re-arm source");
                    }
                }
            } else {
                self.queue.push_back(MediaEvent::TimeUpdate {
                    current_time: self.current_time(),
                });
            }
        }

        while let Some(event) = self.queue.pop_front() {
            self.listeners.dispatch(&event);
        }
    }
}

impl Drop for SinkBackend {
    fn drop(&mut self) {
        self.sink.stop();
    }
}

impl MediaResource for SinkBackend {
    fn play(&mut self) -> Result<(), PlayerError> {
        SinkBackend::play(self)
    }

    fn pause(&mut self) {
        SinkBackend::pause(self);
    }

    fn current_time(&self) -> f64 {
        SinkBackend::current_time(self)
    }

    fn set_current_time(&mut self, seconds: f64) {
        SinkBackend::set_current_time(self, seconds);
    }

    fn volume(&self) -> f64 {
        SinkBackend::volume(self)
    }

    fn set_volume(&mut self, level: f64) {
        SinkBackend::set_volume(self, level);
    }

    fn duration(&self) -> Option<f64> {
        SinkBackend::duration(self)
    }

    fn subscribe(&mut self, kind: EventKind, listener: Listener) -> ListenerId {
        SinkBackend::subscribe(self, kind, listener)
    }

    fn unsubscribe(&mut self, id: ListenerId) -> bool {
        SinkBackend::unsubscribe(self, id)
    }

    fn reload(&mut self) {
        SinkBackend::reload(self);
    }

    fn pump(&mut self) {
        SinkBackend::pump(self);
    }
}

/// 音频元素，组件用图标代替画面
pub struct AudioElement {
    backend: SinkBackend,
}

impl AudioElement {
    pub fn open(source: &str) -> Result<Self> {
        let hint = loader::hint_for(source, "mp3");
        Ok(Self {
            backend: SinkBackend::open(source, hint)?,
        })
    }

    pub fn backend(&self) -> &SinkBackend {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut SinkBackend {
        &mut self.backend
    }
}

/// 视频元素，播放容器中的音轨，画面交给渲染组件的界面
pub struct VideoElement {
    backend: SinkBackend,
}

impl VideoElement {
    pub fn open(source: &str) -> Result<Self> {
        let hint = loader::hint_for(source, "mp4");
        Ok(Self {
            backend: SinkBackend::open(source, hint)?,
        })
    }

    pub fn backend(&self) -> &SinkBackend {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut SinkBackend {
        &mut self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::wav_bytes;
    use std::cell::RefCell;
    use std::io::Write;
    use std::rc::Rc;
    use tempfile::NamedTempFile;

    fn wav_file(samples: u32) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
        file.write_all(&wav_bytes(8000, samples)).unwrap();
        file
    }

    fn record(backend: &mut SinkBackend) -> Rc<RefCell<Vec<MediaEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        for kind in EventKind::ALL {
            let events = Rc::clone(&events);
            backend.subscribe(
                kind,
                Box::new(move |event: &MediaEvent| events.borrow_mut().push(event.clone())),
            );
        }
        events
    }

    fn kinds(events: &Rc<RefCell<Vec<MediaEvent>>>) -> Vec<EventKind> {
        events.borrow_mut().drain(..).map(|event| event.kind()).collect()
    }

    #[test]
    fn pump_loads_metadata_and_stays_quiet_while_paused() {
        let file = wav_file(800);
        let (mut backend, _output) = SinkBackend::detached(file.path().to_str().unwrap(), "wav".into());
        let events = record(&mut backend);

        backend.pump();
        let delivered = events.borrow_mut().drain(..).collect::<Vec<_>>();
        assert_eq!(delivered.len(), 1);
        match &delivered[0] {
            MediaEvent::LoadedMetadata { duration } => {
                assert!((duration - 0.1).abs() < 1e-3, "duration was {duration}")
            }
            other => panic!("unexpected event {other:?}"),
        }

        backend.pump();
        backend.pump();
        assert!(kinds(&events).is_empty());
    }

    #[test]
    fn missing_source_queues_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.wav");
        let (mut backend, _output) = SinkBackend::detached(path.to_str().unwrap(), "wav".into());
        let events = record(&mut backend);

        backend.pump();
        let delivered = events.borrow_mut().drain(..).collect::<Vec<_>>();
        assert!(matches!(
            delivered.as_slice(),
            [MediaEvent::Error(PlayerError::LoadFailed(_))]
        ));
        assert_eq!(backend.duration(), None);

        // 失败的源不会自动重试
        backend.pump();
        assert!(kinds(&events).is_empty());
    }

    #[test]
    fn play_before_pump_loads_first() {
        let file = wav_file(800);
        let (mut backend, _output) = SinkBackend::detached(file.path().to_str().unwrap(), "wav".into());
        let events = record(&mut backend);

        assert_eq!(backend.play(), Ok(()));
        assert!(backend.duration().is_some());

        backend.pump();
        assert_eq!(
            kinds(&events),
            vec![EventKind::LoadedMetadata, EventKind::TimeUpdate]
        );
    }

    #[test]
    fn play_on_missing_source_reports_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.mp3");
        let (mut backend, _output) = SinkBackend::detached(path.to_str().unwrap(), "mp3".into());
        let events = record(&mut backend);

        let result = backend.play();
        assert!(matches!(result, Err(PlayerError::LoadFailed(_))));

        // 订阅者收到同一个失败，没有进度更新
        backend.pump();
        assert_eq!(kinds(&events), vec![EventKind::Error]);
    }

    #[test]
    fn time_updates_only_while_playing() {
        let file = wav_file(800);
        let (mut backend, _output) = SinkBackend::detached(file.path().to_str().unwrap(), "wav".into());
        let events = record(&mut backend);
        backend.pump();
        kinds(&events);

        backend.play().unwrap();
        backend.pump();
        backend.pump();
        assert_eq!(kinds(&events), vec![EventKind::TimeUpdate, EventKind::TimeUpdate]);

        backend.pause();
        backend.pump();
        assert!(kinds(&events).is_empty());
    }

    #[test]
    fn drained_sink_ends_and_rearms() {
        let file = wav_file(800);
        let (mut backend, mut output) = SinkBackend::detached(file.path().to_str().unwrap(), "wav".into());
        let events = record(&mut backend);
        backend.pump();
        kinds(&events);

        backend.play().unwrap();
        output.by_ref().take(200_000).for_each(drop);
        assert!(backend.sink.empty());

        backend.pump();
        assert_eq!(kinds(&events), vec![EventKind::Ended]);
        assert!(!backend.playing);
        assert_eq!(backend.sink.len(), 1);

        // 重新装载的源可以从头再播一遍
        backend.pump();
        assert!(kinds(&events).is_empty());
        backend.play().unwrap();
        backend.pump();
        assert_eq!(kinds(&events), vec![EventKind::TimeUpdate]);
        output.by_ref().take(200_000).for_each(drop);
        backend.pump();
        assert_eq!(kinds(&events), vec![EventKind::Ended]);
    }

    #[test]
    fn reload_rearms_failed_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.wav");
        let (mut backend, _output) = SinkBackend::detached(path.to_str().unwrap(), "wav".into());
        let events = record(&mut backend);

        backend.pump();
        assert_eq!(kinds(&events), vec![EventKind::Error]);

        std::fs::write(&path, wav_bytes(8000, 800)).unwrap();
        backend.pump();
        assert!(kinds(&events).is_empty());

        backend.reload();
        backend.pump();
        assert_eq!(kinds(&events), vec![EventKind::LoadedMetadata]);
        assert_eq!(backend.play(), Ok(()));
    }

    #[test]
    fn reload_leaves_loaded_source_alone() {
        let file = wav_file(800);
        let (mut backend, _output) = SinkBackend::detached(file.path().to_str().unwrap(), "wav".into());
        let events = record(&mut backend);
        backend.pump();
        kinds(&events);

        backend.reload();
        backend.pump();
        assert!(kinds(&events).is_empty());
        assert_eq!(backend.sink.len(), 1);
    }

    #[test]
    fn volume_is_clamped_and_listeners_released() {
        let (mut backend, _output) = SinkBackend::detached("nowhere.wav", "wav".into());
        backend.set_volume(1.5);
        assert_eq!(backend.volume(), 1.0);
        backend.set_volume(-1.0);
        assert_eq!(backend.volume(), 0.0);

        let id = backend.subscribe(EventKind::Ended, Box::new(|_: &MediaEvent| {}));
        assert_eq!(backend.active_listeners(), 1);
        assert!(backend.unsubscribe(id));
        assert!(!backend.unsubscribe(id));
        assert_eq!(backend.active_listeners(), 0);
    }
}
