//! 组件可绑定的媒体资源
//!
//! [`MediaResource`] 是组件驱动的播放能力：播放控制、播放位置、音量、时长和事件订阅。
//! [`MediaElement`] 是按媒体类型区分的本地实现，组件无需判断持有的是哪一种。

pub mod mock;
pub mod native;

use anyhow::Result;

use crate::config::{MediaKind, WidgetConfig};
use crate::error::PlayerError;
use crate::events::{EventKind, Listener, ListenerId};

pub use mock::MockResource;
pub use native::{AudioElement, SinkBackend, VideoElement};

pub trait MediaResource {
    /// 开始或恢复播放，返回 `Err` 表示播放被拒绝，资源没有推进
    fn play(&mut self) -> Result<(), PlayerError>;
    fn pause(&mut self);

    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, seconds: f64);

    fn volume(&self) -> f64;
    fn set_volume(&mut self, level: f64);

    /// 总时长，元数据加载后可用
    fn duration(&self) -> Option<f64>;

    fn subscribe(&mut self, kind: EventKind, listener: Listener) -> ListenerId;
    fn unsubscribe(&mut self, id: ListenerId) -> bool;

    /// 加载失败后重新准备加载
    fn reload(&mut self);

    /// 把积压的事件派发给订阅者，自行同步派发的资源可以留空
    fn pump(&mut self) {}
}

/// 组件绑定的本地媒体元素
pub enum MediaElement {
    Audio(AudioElement),
    Video(VideoElement),
}

impl MediaElement {
    pub fn open(config: &WidgetConfig) -> Result<Self> {
        Ok(match config.kind() {
            MediaKind::Audio => MediaElement::Audio(AudioElement::open(config.source())?),
            MediaKind::Video => MediaElement::Video(VideoElement::open(config.source())?),
        })
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            MediaElement::Audio(_) => MediaKind::Audio,
            MediaElement::Video(_) => MediaKind::Video,
        }
    }

    fn backend(&self) -> &SinkBackend {
        match self {
            MediaElement::Audio(element) => element.backend(),
            MediaElement::Video(element) => element.backend(),
        }
    }

    fn backend_mut(&mut self) -> &mut SinkBackend {
        match self {
            MediaElement::Audio(element) => element.backend_mut(),
            MediaElement::Video(element) => element.backend_mut(),
        }
    }
}

impl MediaResource for MediaElement {
    fn play(&mut self) -> Result<(), PlayerError> {
        self.backend_mut().play()
    }

    fn pause(&mut self) {
        self.backend_mut().pause();
    }

    fn current_time(&self) -> f64 {
        self.backend().current_time()
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.backend_mut().set_current_time(seconds);
    }

    fn volume(&self) -> f64 {
        self.backend().volume()
    }

    fn set_volume(&mut self, level: f64) {
        self.backend_mut().set_volume(level);
    }

    fn duration(&self) -> Option<f64> {
        self.backend().duration()
    }

    fn subscribe(&mut self, kind: EventKind, listener: Listener) -> ListenerId {
        self.backend_mut().subscribe(kind, listener)
    }

    fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.backend_mut().unsubscribe(id)
    }

    fn reload(&mut self) {
        self.backend_mut().reload();
    }

    fn pump(&mut self) {
        self.backend_mut().pump();
    }
}
