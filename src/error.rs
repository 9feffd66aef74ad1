use thiserror::Error;

/// ブリッジ本体のエラー
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode OSC packet: {0}")]
    Osc(#[from] rosc::OscError),

    #[error("invalid JSON message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to open control device {name:?}: {reason}")]
    DeviceUnavailable { name: String, reason: String },

    #[error("control device write failed: {0}")]
    DeviceWrite(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("connection closed")]
    ConnectionClosed,
}

/// 読み込み時に検出した設定の不備
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("batch.count must be at least 1")]
    ZeroBatchCount,

    #[error("batch.interval_secs = {0} is out of range (0.001 to 86400)")]
    IntervalOutOfRange(f64),

    #[error("keyword {0:?} is listed more than once across fast_keywords/slow_keywords")]
    DuplicateKeyword(String),

    #[error("{field} = {value} is not a valid control number (0-127)")]
    ControlOutOfRange { field: &'static str, value: u8 },

    #[error("output.midi_channel = {0} is out of range (0-15)")]
    MidiChannelOutOfRange(u8),

    #[error("{0} range must have finite bounds")]
    NonFiniteRange(&'static str),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
