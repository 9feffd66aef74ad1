use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;
use crate::mapping::{OutputRange, CONTROL_MAX};

pub const DEFAULT_CONFIG_PATH: &str = "tempo_bridge.toml";

/// interval モードの周期の下限
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);
/// interval モードの周期の上限 (1日)
pub const MAX_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub decision: DecisionConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// 分類器が接続してくるアドレス
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

fn default_listen_addr() -> String { "0.0.0.0:5000".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { listen_addr: default_listen_addr() }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// UDP で OSC。1 メッセージに MIDI 型引数 1 つ
    Osc,
    /// ネイティブ MIDI 出力ポート (`midi-port` feature)
    Midi,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_kind")]
    pub kind: OutputKind,
    /// OSC の送信先
    #[serde(default = "default_osc_target")]
    pub osc_target: String,
    /// ネイティブ MIDI の出力ポート名
    #[serde(default = "default_midi_port")]
    pub midi_port: String,
    /// MIDI チャンネル (0 始まり、0 = ch1)
    #[serde(default)]
    pub midi_channel: u8,
}

fn default_output_kind() -> OutputKind { OutputKind::Osc }
fn default_osc_target() -> String { "127.0.0.1:9001".to_string() }
fn default_midi_port() -> String { "IAC Driver Bus 1".to_string() }

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            kind: default_output_kind(),
            osc_target: default_osc_target(),
            midi_port: default_midi_port(),
            midi_channel: 0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BatchModeKind {
    Count,
    Interval,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BatchConfig {
    #[serde(default = "default_batch_mode")]
    pub mode: BatchModeKind,
    /// count モードの 1 ウィンドウあたりのイベント数
    #[serde(default = "default_batch_count")]
    pub count: usize,
    /// interval モードのウィンドウ長 (秒)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: f64,
}

fn default_batch_mode() -> BatchModeKind { BatchModeKind::Count }
fn default_batch_count() -> usize { 10 }
fn default_interval_secs() -> f64 { 30.0 }

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            mode: default_batch_mode(),
            count: default_batch_count(),
            interval_secs: default_interval_secs(),
        }
    }
}

impl BatchConfig {
    /// 範囲内なら `Some`。NaN・負数・0 に丸まる値・上限超えは `None`
    pub fn checked_interval(&self) -> Option<Duration> {
        Duration::try_from_secs_f64(self.interval_secs)
            .ok()
            .filter(|d| (MIN_INTERVAL..=MAX_INTERVAL).contains(d))
    }

    /// 検証済み設定では `interval_secs` そのもの。範囲外は上下限に寄せる
    pub fn interval(&self) -> Duration {
        match self.checked_interval() {
            Some(d) => d,
            None if self.interval_secs > MAX_INTERVAL.as_secs_f64() => MAX_INTERVAL,
            None => MIN_INTERVAL,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// 件数の多いクラスを採用。同数ならタイ範囲
    Majority,
    /// slow クラスだけで出力を決める
    SlowOnly,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DecisionConfig {
    #[serde(default = "default_policy")]
    pub policy: PolicyKind,
    /// fast として数えるキーワード (例: "fast", "sudden")
    #[serde(default = "default_fast_keywords")]
    pub fast_keywords: Vec<String>,
    /// slow として数えるキーワード (例: "slow", "sustained")
    #[serde(default = "default_slow_keywords")]
    pub slow_keywords: Vec<String>,
    #[serde(default = "default_fast_range")]
    pub fast_range: OutputRange,
    #[serde(default = "default_slow_range")]
    pub slow_range: OutputRange,
    #[serde(default = "default_tie_range")]
    pub tie_range: OutputRange,
    #[serde(default = "default_fast_cc")]
    pub fast_cc: u8,
    #[serde(default = "default_slow_cc")]
    pub slow_cc: u8,
    #[serde(default = "default_tie_cc")]
    pub tie_cc: u8,
}

fn default_policy() -> PolicyKind { PolicyKind::Majority }
fn default_fast_keywords() -> Vec<String> { vec!["fast".to_string()] }
fn default_slow_keywords() -> Vec<String> { vec!["slow".to_string()] }
fn default_fast_range() -> OutputRange { OutputRange::new(130.0, 160.0) }
fn default_slow_range() -> OutputRange { OutputRange::new(60.0, 90.0) }
fn default_tie_range() -> OutputRange { OutputRange::new(90.0, 120.0) }
fn default_fast_cc() -> u8 { 3 }
fn default_slow_cc() -> u8 { 2 }
fn default_tie_cc() -> u8 { 4 }

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            policy: default_policy(),
            fast_keywords: default_fast_keywords(),
            slow_keywords: default_slow_keywords(),
            fast_range: default_fast_range(),
            slow_range: default_slow_range(),
            tie_range: default_tie_range(),
            fast_cc: default_fast_cc(),
            slow_cc: default_slow_cc(),
            tie_cc: default_tie_cc(),
        }
    }
}

impl DecisionConfig {
    /// ラベル側は `label_keyword` で小文字化されるので、設定側も揃える
    pub fn normalize_keywords(&mut self) {
        for keyword in self.fast_keywords.iter_mut().chain(self.slow_keywords.iter_mut()) {
            *keyword = keyword.trim().to_lowercase();
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    /// タイムスタンプ付きログファイルの出力先。空ならファイル出力しない
    #[serde(default = "default_log_dir")]
    pub dir: String,
    #[serde(default)]
    pub verbose: bool,
}

fn default_log_dir() -> String { "logs".to_string() }

impl Default for LogConfig {
    fn default() -> Self {
        Self { dir: default_log_dir(), verbose: false }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let mut config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.decision.normalize_keywords();
        config.validate()?;
        Ok(config)
    }

    /// ファイルが無ければデフォルト値。存在して壊れている場合はエラー
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch.count == 0 {
            return Err(ConfigError::ZeroBatchCount);
        }
        if self.batch.checked_interval().is_none() {
            return Err(ConfigError::IntervalOutOfRange(self.batch.interval_secs));
        }
        let d = &self.decision;
        let mut seen = HashSet::new();
        for keyword in d.fast_keywords.iter().chain(&d.slow_keywords) {
            if !seen.insert(keyword.as_str()) {
                return Err(ConfigError::DuplicateKeyword(keyword.clone()));
            }
        }
        for (field, value) in [
            ("decision.fast_cc", d.fast_cc),
            ("decision.slow_cc", d.slow_cc),
            ("decision.tie_cc", d.tie_cc),
        ] {
            if value > CONTROL_MAX {
                return Err(ConfigError::ControlOutOfRange { field, value });
            }
        }
        for (name, range) in [
            ("decision.fast_range", d.fast_range),
            ("decision.slow_range", d.slow_range),
            ("decision.tie_range", d.tie_range),
        ] {
            if !range.is_finite() {
                return Err(ConfigError::NonFiniteRange(name));
            }
        }
        if self.output.midi_channel > 15 {
            return Err(ConfigError::MidiChannelOutOfRange(self.output.midi_channel));
        }
        Ok(())
    }
}
