use crate::event::{FeatureKind, WireEvent};

/// 2 値分類器がクラス名の代わりに返す生ラベル
pub const BINARY_LABEL: &str = "label";

/// 分類結果をブリッジへ送るラベルと確信度の組に変換する。
///
/// 2 値モデルは `("label", p)` を返す。p > 0.5 なら穏やかなクラス
/// (Slow / Sustained) で確信度 p、それ以外は激しいクラス
/// (Fast / Sudden) で確信度 1 - p。名前付きラベルは大文字化する
pub fn classifier_label(kind: FeatureKind, raw_label: &str, value: f64) -> (String, f64) {
    if raw_label == BINARY_LABEL {
        let (calm, energetic) = match kind {
            FeatureKind::Acceleration => ("Sustained", "Sudden"),
            _ => ("Slow", "Fast"),
        };
        if value > 0.5 {
            (calm.to_string(), value)
        } else {
            (energetic.to_string(), 1.0 - value)
        }
    } else {
        (raw_label.to_uppercase(), value)
    }
}

/// `"Fast (0.91)"`
pub fn display_label(name: &str, confidence: f64) -> String {
    format!("{name} ({confidence:.2})")
}

/// 分類結果 1 つ分の送信イベント
pub fn classifier_event(kind: FeatureKind, raw_label: &str, value: f64) -> WireEvent {
    let (name, confidence) = classifier_label(kind, raw_label, value);
    WireEvent::new(kind, display_label(&name, confidence), confidence)
}
