use std::sync::Mutex;
use std::time::Duration;

use crate::config::{BatchConfig, BatchModeKind};
use crate::event::ClassificationEvent;

/// ウィンドウの閉じ方
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchMode {
    /// `n` 件溜まった時点で flush
    Count(usize),
    /// 一定周期で、溜まっている分を flush
    Interval(Duration),
}

impl BatchMode {
    pub fn from_config(config: &BatchConfig) -> Self {
        match config.mode {
            BatchModeKind::Count => Self::Count(config.count.max(1)),
            BatchModeKind::Interval => Self::Interval(config.interval()),
        }
    }
}

/// 受信側と flush タスクで共有するイベントの蓄積。
///
/// 変更はすべて 1 つのロック内で行うので、drain と競合した push は
/// 取り出された側か次のウィンドウのどちらかに入り、失われない
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Mutex<Vec<ClassificationEvent>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// イベントを追加する。`limit` に達したら直近 `limit` 件を返して
    /// キューを空にする
    pub fn push(&self, event: ClassificationEvent, limit: Option<usize>) -> Option<Vec<ClassificationEvent>> {
        let mut events = self.lock();
        events.push(event);
        match limit {
            Some(n) if events.len() >= n => {
                let mut window = std::mem::take(&mut *events);
                let start = window.len() - n;
                Some(window.split_off(start))
            }
            _ => None,
        }
    }

    /// ここまでの全件を取り出し、キューを空にする
    pub fn drain(&self) -> Vec<ClassificationEvent> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ClassificationEvent>> {
        // ロック中の panic で Vec が中途半端な状態になることはない
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
