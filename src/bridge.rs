use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::aggregate::aggregate;
use crate::decision::{ControlDecision, TempoPolicy};
use crate::emitter::ControlEmitter;
use crate::event::ClassificationEvent;
use crate::window::{BatchMode, EventQueue};

/// バッチ用キューを持ち、判定ポリシーと出力先をつなぐ
pub struct Bridge {
    mode: BatchMode,
    queue: EventQueue,
    policy: TempoPolicy,
    emitter: Box<dyn ControlEmitter>,
}

impl Bridge {
    pub fn new(mode: BatchMode, policy: TempoPolicy, emitter: Box<dyn ControlEmitter>) -> Self {
        Self {
            mode,
            queue: EventQueue::new(),
            policy,
            emitter,
        }
    }

    pub fn mode(&self) -> BatchMode {
        self.mode
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// イベントを 1 件積む。count モードではここでウィンドウが閉じて送信されることがある
    pub fn receive(&self, event: ClassificationEvent) -> Option<ControlDecision> {
        let limit = match self.mode {
            BatchMode::Count(n) => Some(n),
            BatchMode::Interval(_) => None,
        };
        let window = self.queue.push(event, limit)?;
        self.process(&window)
    }

    /// 完成済みのウィンドウをキューを通さず即座に判定する
    pub fn process_batch(&self, events: &[ClassificationEvent]) -> Option<ControlDecision> {
        self.process(events)
    }

    /// キューを空にし、溜まっていた分で判定する
    pub fn flush(&self) -> Option<ControlDecision> {
        let window = self.queue.drain();
        if window.is_empty() {
            return None;
        }
        self.process(&window)
    }

    fn process(&self, window: &[ClassificationEvent]) -> Option<ControlDecision> {
        let buckets = aggregate(window);
        let decision = match self.policy.decide(&buckets) {
            Some(d) => d,
            None => {
                tracing::debug!(events = window.len(), "window closed without a decision");
                return None;
            }
        };

        tracing::info!(
            events = window.len(),
            branch = ?decision.branch,
            tempo = decision.tempo,
            cc = decision.channel,
            value = decision.value,
            "tempo decision"
        );
        if let Err(e) = self.emitter.emit(decision.channel, decision.value) {
            tracing::warn!("emit to {} failed: {e}", self.emitter.describe());
        }
        Some(decision)
    }
}

/// `shutdown` がキャンセルされるまで interval モードの定期 flush を回し、
/// 終了時にもう一度 flush して積まれたイベントを捨てない
pub fn spawn_interval_flush(
    bridge: Arc<Bridge>,
    period: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let pending = bridge.pending();
                    if pending == 0 {
                        tracing::debug!("interval flush: nothing queued");
                        continue;
                    }
                    tracing::debug!(pending, "interval flush");
                    bridge.flush();
                }
            }
        }

        if bridge.pending() > 0 {
            tracing::info!(pending = bridge.pending(), "final flush on shutdown");
            bridge.flush();
        }
    })
}
