use crate::error::PlayerError;

/// 媒体资源事件类型
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// 元数据加载完成（对应 loadedmetadata 事件）
    LoadedMetadata { duration: f64 },
    /// 播放位置更新（对应 timeupdate 事件）
    TimeUpdate { current_time: f64 },
    /// 播放结束（对应 ended 事件）
    Ended,
    /// 加载失败或播放被拒绝（对应 error 事件）
    Error(PlayerError),
}

impl MediaEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            MediaEvent::LoadedMetadata { .. } => EventKind::LoadedMetadata,
            MediaEvent::TimeUpdate { .. } => EventKind::TimeUpdate,
            MediaEvent::Ended => EventKind::Ended,
            MediaEvent::Error(_) => EventKind::Error,
        }
    }
}

/// 订阅的事件通道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    LoadedMetadata,
    TimeUpdate,
    Ended,
    Error,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::LoadedMetadata,
        EventKind::TimeUpdate,
        EventKind::Ended,
        EventKind::Error,
    ];
}

/// 订阅句柄，取消订阅时使用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type Listener = Box<dyn FnMut(&MediaEvent)>;

/// 资源持有的监听器表
#[derive(Default)]
pub struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, EventKind, Listener)>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: EventKind, listener: Listener) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.entries.push((id, kind, listener));
        id
    }

    /// `id` 未注册（已移除）时返回 false
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn dispatch(&mut self, event: &MediaEvent) {
        let kind = event.kind();
        for (_, entry_kind, listener) in self.entries.iter_mut() {
            if *entry_kind == kind {
                listener(event);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.entries
            .iter()
            .filter(|(_, entry_kind, _)| *entry_kind == kind)
            .count()
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("active", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn dispatch_only_reaches_matching_kind() {
        let hits = Rc::new(Cell::new(0));
        let mut listeners = Listeners::new();
        let counter = hits.clone();
        listeners.add(
            EventKind::Ended,
            Box::new(move |_| counter.set(counter.get() + 1)),
        );

        listeners.dispatch(&MediaEvent::TimeUpdate { current_time: 1.0 });
        assert_eq!(hits.get(), 0);
        listeners.dispatch(&MediaEvent::Ended);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut listeners = Listeners::new();
        let id = listeners.add(EventKind::TimeUpdate, Box::new(|_| {}));
        assert_eq!(listeners.count(EventKind::TimeUpdate), 1);
        assert!(listeners.remove(id));
        assert!(!listeners.remove(id));
        assert!(listeners.is_empty());
    }
}
