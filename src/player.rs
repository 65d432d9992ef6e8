use std::cell::{Ref, RefCell};
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::config::WidgetConfig;
use crate::error::PlayerError;
use crate::events::{EventKind, ListenerId, MediaEvent};
use crate::resource::{MediaElement, MediaResource};
use crate::state::{Invalidation, LoadStatus, PlayerState};
use crate::view::{PlayerView, ProgressView};

/// 媒体播放器组件：持有播放状态和一个绑定的媒体资源
///
/// 资源事件通过 [`bind`](MediaPlayer::bind) 时注册的监听器写入状态，
/// 在 [`unmount`](MediaPlayer::unmount) 或组件销毁时释放。
pub struct MediaPlayer<R: MediaResource = MediaElement> {
    config: WidgetConfig,
    state: Rc<RefCell<PlayerState>>,
    resource: Option<R>,
    subscriptions: Vec<ListenerId>,
}

impl<R: MediaResource> MediaPlayer<R> {
    /// 创建未绑定资源的组件，绑定前所有操作均无效
    pub fn new(config: WidgetConfig) -> Self {
        Self {
            config,
            state: Rc::new(RefCell::new(PlayerState::default())),
            resource: None,
            subscriptions: Vec::new(),
        }
    }

    pub fn mount(config: WidgetConfig, resource: R) -> Self {
        let mut player = Self::new(config);
        player.bind(resource);
        player
    }

    /// 绑定资源并订阅其事件，已绑定的旧资源先卸载
    ///
    /// 播放进度、时长等状态随资源重置，音量和静音设置保留。
    pub fn bind(&mut self, mut resource: R) {
        if self.resource.is_some() {
            self.unmount();
        }
        {
            let mut state = self.state.borrow_mut();
            let (volume, muted) = (state.volume, state.muted);
            *state = PlayerState {
                volume,
                muted,
                ..PlayerState::default()
            };
        }

        for kind in EventKind::ALL {
            let state = Rc::clone(&self.state);
            let id = resource.subscribe(
                kind,
                Box::new(move |event: &MediaEvent| state.borrow_mut().apply(event)),
            );
            self.subscriptions.push(id);
        }

        let volume = self.state.borrow().effective_volume();
        resource.set_volume(volume);

        // 订阅前元数据可能已经加载完成
        if let Some(duration) = resource.duration() {
            self.state
                .borrow_mut()
                .apply(&MediaEvent::LoadedMetadata { duration });
        }

        debug!(kind = %self.config.kind(), src = self.config.source(), "widget bound");
        self.resource = Some(resource);
    }

    /// 释放全部订阅，暂停并交还资源
    pub fn unmount(&mut self) -> Option<R> {
        let mut resource = self.resource.take()?;
        for id in self.subscriptions.drain(..) {
            if !resource.unsubscribe(id) {
                warn!(?id, "listener was already gone");
            }
        }
        resource.pause();
        {
            let mut state = self.state.borrow_mut();
            state.playing = false;
            state.invalidate(Invalidation::CONTROLS);
        }
        debug!(kind = %self.config.kind(), src = self.config.source(), "widget unmounted");
        Some(resource)
    }

    pub fn play(&mut self) {
        let Some(resource) = self.resource.as_mut() else {
            debug!(op = "play", src = self.config.source(), "{}", PlayerError::NotReady);
            return;
        };

        let failed = self.state.borrow().status() == LoadStatus::Failed;
        if failed {
            info!(src = self.config.source(), "retrying failed source");
            resource.reload();
            let mut state = self.state.borrow_mut();
            state.error = None;
            state.invalidate(Invalidation::CONTROLS);
        }

        let result = resource.play();
        let mut state = self.state.borrow_mut();
        match result {
            Ok(()) => {
                state.playing = true;
                if matches!(state.error, Some(PlayerError::PlaybackRejected(_))) {
                    state.error = None;
                }
            }
            Err(error) => {
                warn!(src = self.config.source(), %error, "play failed");
                state.playing = false;
                state.error = Some(error);
            }
        }
        state.invalidate(Invalidation::CONTROLS);
    }

    pub fn pause(&mut self) {
        let Some(resource) = self.resource.as_mut() else {
            debug!(op = "pause", src = self.config.source(), "{}", PlayerError::NotReady);
            return;
        };
        resource.pause();

        let mut state = self.state.borrow_mut();
        state.playing = false;
        state.invalidate(Invalidation::CONTROLS);
    }

    /// 暂停并回到开头，已加载的资源保持不变
    pub fn stop(&mut self) {
        {
            let mut state = self.state.borrow_mut();
            state.playing = false;
            state.current_time = 0.0;
            state.invalidate(Invalidation::ALL);
        }

        let Some(resource) = self.resource.as_mut() else {
            debug!(op = "stop", src = self.config.source(), "{}", PlayerError::NotReady);
            return;
        };
        resource.pause();
        resource.set_current_time(0.0);
    }

    /// 音量滑块输入，拖到 0 即静音，其他值取消静音
    pub fn set_volume(&mut self, level: f64) {
        let Some(resource) = self.resource.as_mut() else {
            debug!(op = "set_volume", src = self.config.source(), "{}", PlayerError::NotReady);
            return;
        };
        let level = if level.is_finite() {
            level.clamp(0.0, 1.0)
        } else {
            0.0
        };
        resource.set_volume(level);

        let mut state = self.state.borrow_mut();
        state.volume = level;
        state.muted = level == 0.0;
        state.invalidate(Invalidation::CONTROLS);
    }

    /// 静音按钮，来回切换后音量保持原值
    pub fn toggle_mute(&mut self) {
        let Some(resource) = self.resource.as_mut() else {
            debug!(op = "toggle_mute", src = self.config.source(), "{}", PlayerError::NotReady);
            return;
        };

        // 资源可能在 set_volume 中同步派发事件，调用期间不能持有状态借用
        let (muted, target) = {
            let state = self.state.borrow();
            if state.muted {
                (false, state.volume)
            } else {
                (true, 0.0)
            }
        };
        resource.set_volume(target);

        let mut state = self.state.borrow_mut();
        state.muted = muted;
        state.invalidate(Invalidation::CONTROLS);
    }

    /// 跳转到时长的 `fraction` 处，元数据加载前忽略
    pub fn seek_fraction(&mut self, fraction: f64) {
        let Some(resource) = self.resource.as_mut() else {
            debug!(op = "seek", src = self.config.source(), "{}", PlayerError::NotReady);
            return;
        };

        let duration = {
            let state = self.state.borrow();
            match state.duration {
                Some(duration) if state.loaded => duration,
                _ => {
                    debug!(src = self.config.source(), "seek ignored before metadata");
                    return;
                }
            }
        };
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let target = fraction * duration;
        resource.set_current_time(target);

        let mut state = self.state.borrow_mut();
        state.current_time = target;
        state.invalidate(Invalidation::PROGRESS);
    }

    /// 进度条点击：在宽 `width` 像素的进度条上 `offset_x` 处
    pub fn click_progress(&mut self, offset_x: f64, width: f64) {
        if !(width > 0.0) {
            return;
        }
        self.seek_fraction(offset_x / width);
    }

    /// 让资源派发积压的事件
    pub fn tick(&mut self) {
        if let Some(resource) = self.resource.as_mut() {
            resource.pump();
        }
    }

    /// 记录资源之外产生的错误，例如资源根本无法打开
    pub fn report_error(&mut self, error: PlayerError) {
        let mut state = self.state.borrow_mut();
        state.playing = false;
        state.error = Some(error);
        state.invalidate(Invalidation::CONTROLS);
    }

    /// 取出并清空上次调用以来需要重绘的部分
    pub fn take_invalidation(&mut self) -> Invalidation {
        self.state.borrow_mut().take_invalidation()
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn state(&self) -> Ref<'_, PlayerState> {
        self.state.borrow()
    }

    pub fn resource(&self) -> Option<&R> {
        self.resource.as_ref()
    }

    pub fn is_bound(&self) -> bool {
        self.resource.is_some()
    }

    pub fn view(&self) -> PlayerView<'_> {
        PlayerView::build(&self.config, &self.state.borrow())
    }

    pub fn progress(&self) -> ProgressView {
        ProgressView::build(&self.state.borrow())
    }
}

impl<R: MediaResource> Drop for MediaPlayer<R> {
    fn drop(&mut self) {
        self.unmount();
    }
}
