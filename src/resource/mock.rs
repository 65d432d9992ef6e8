use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::MediaResource;
use crate::error::PlayerError;
use crate::events::{EventKind, Listener, ListenerId, Listeners, MediaEvent};

#[derive(Debug)]
struct MockInner {
    listeners: Listeners,
    queue: VecDeque<MediaEvent>,
    playing: bool,
    current_time: f64,
    volume: f64,
    duration: Option<f64>,
    refusal: Option<PlayerError>,
    volume_echo: Option<MediaEvent>,
    play_calls: usize,
    pause_calls: usize,
    reloads: usize,
}

impl Default for MockInner {
    fn default() -> Self {
        Self {
            listeners: Listeners::new(),
            queue: VecDeque::new(),
            playing: false,
            current_time: 0.0,
            volume: 1.0,
            duration: None,
            refusal: None,
            volume_echo: None,
            play_calls: 0,
            pause_calls: 0,
            reloads: 0,
        }
    }
}

/// 内存中的媒体资源：记录收到的操作，按需派发事件
///
/// 克隆共享同一个底层元素，测试可以把一份交给组件，另一份留着驱动和检查。
#[derive(Debug, Clone, Default)]
pub struct MockResource {
    inner: Rc<RefCell<MockInner>>,
}

impl MockResource {
    pub fn new() -> Self {
        Self::default()
    }

    /// 之后的 `play()` 以 `PlaybackRejected` 失败
    pub fn reject_play(&self, reason: impl Into<String>) {
        self.inner.borrow_mut().refusal = Some(PlayerError::PlaybackRejected(reason.into()));
    }

    /// 之后的 `play()` 以 `LoadFailed` 失败，模拟开始播放时才发现源不可用
    pub fn fail_load_on_play(&self, reason: impl Into<String>) {
        self.inner.borrow_mut().refusal = Some(PlayerError::LoadFailed(reason.into()));
    }

    pub fn accept_play(&self) {
        self.inner.borrow_mut().refusal = None;
    }

    /// `set_volume` 返回前同步派发 `event`
    pub fn echo_on_volume(&self, event: MediaEvent) {
        self.inner.borrow_mut().volume_echo = Some(event);
    }

    /// 像真实管线一样更新元素，然后立即把事件派发给订阅者
    ///
    /// 监听器不能回调本资源。
    pub fn emit(&self, event: MediaEvent) {
        let mut inner = self.inner.borrow_mut();
        match &event {
            MediaEvent::LoadedMetadata { duration } => inner.duration = Some(*duration),
            MediaEvent::TimeUpdate { current_time } => inner.current_time = *current_time,
            MediaEvent::Ended => {
                inner.playing = false;
                inner.current_time = 0.0;
            }
            MediaEvent::Error(_) => inner.playing = false,
        }
        inner.listeners.dispatch(&event);
    }

    /// 事件排队，下次 `pump()` 时派发
    pub fn queue(&self, event: MediaEvent) {
        self.inner.borrow_mut().queue.push_back(event);
    }

    pub fn active_subscriptions(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    pub fn subscriptions(&self, kind: EventKind) -> usize {
        self.inner.borrow().listeners.count(kind)
    }

    pub fn is_playing(&self) -> bool {
        self.inner.borrow().playing
    }

    pub fn position(&self) -> f64 {
        self.inner.borrow().current_time
    }

    pub fn output_volume(&self) -> f64 {
        self.inner.borrow().volume
    }

    pub fn play_calls(&self) -> usize {
        self.inner.borrow().play_calls
    }

    pub fn pause_calls(&self) -> usize {
        self.inner.borrow().pause_calls
    }

    pub fn reloads(&self) -> usize {
        self.inner.borrow().reloads
    }
}

impl MediaResource for MockResource {
    fn play(&mut self) -> Result<(), PlayerError> {
        let mut inner = self.inner.borrow_mut();
        inner.play_calls += 1;
        if let Some(error) = inner.refusal.clone() {
            inner.playing = false;
            return Err(error);
        }
        inner.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        let mut inner = self.inner.borrow_mut();
        inner.pause_calls += 1;
        inner.playing = false;
    }

    fn current_time(&self) -> f64 {
        self.inner.borrow().current_time
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.inner.borrow_mut().current_time = seconds;
    }

    fn volume(&self) -> f64 {
        self.inner.borrow().volume
    }

    fn set_volume(&mut self, level: f64) {
        let echo = {
            let mut inner = self.inner.borrow_mut();
            inner.volume = level;
            inner.volume_echo.clone()
        };
        if let Some(event) = echo {
            self.emit(event);
        }
    }

    fn duration(&self) -> Option<f64> {
        self.inner.borrow().duration
    }

    fn subscribe(&mut self, kind: EventKind, listener: Listener) -> ListenerId {
        self.inner.borrow_mut().listeners.add(kind, listener)
    }

    fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.inner.borrow_mut().listeners.remove(id)
    }

    fn reload(&mut self) {
        self.inner.borrow_mut().reloads += 1;
    }

    fn pump(&mut self) {
        loop {
            let event = self.inner.borrow_mut().queue.pop_front();
            match event {
                Some(event) => self.emit(event),
                None => break,
            }
        }
    }
}
