/// MIDI コントロールチェンジの最大値
pub const CONTROL_MAX: u8 = 127;

/// `value` を `[src_min, src_max]` から `[dst_min, dst_max]` へ線形写像する。
///
/// `value` はまず元の区間にクランプする。元の区間が退化している
/// (`src_min == src_max`) 場合は `dst_min`
pub fn map_range(value: f64, src_min: f64, src_max: f64, dst_min: f64, dst_max: f64) -> f64 {
    let value = value.max(src_min).min(src_max);
    let src_span = src_max - src_min;
    if src_span == 0.0 {
        return dst_min;
    }
    let scaled = (value - src_min) / src_span;
    dst_min + scaled * (dst_max - dst_min)
}

/// 写像後の値を最も近い整数に丸める (0.5 は偶数側)
pub fn round_tempo(value: f64) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    value.round_ties_even() as i32
}

/// 丸めた値を 0..=127 にクランプ
pub fn clamp_control(value: i32) -> u8 {
    value.clamp(0, CONTROL_MAX as i32) as u8
}

/// 丸めてクランプした、実際に送る値
pub fn to_control_value(value: f64) -> u8 {
    clamp_control(round_tempo(value))
}

/// 判定分岐 1 つ分の出力範囲 (両端含む)
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct OutputRange {
    pub min: f64,
    pub max: f64,
}

impl OutputRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// [0, 1] の確信度をこの範囲へ写像
    pub fn map_confidence(&self, confidence: f64) -> f64 {
        map_range(confidence, 0.0, 1.0, self.min, self.max)
    }

    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }
}
