//! 分類イベント: 分類器が送ってくる形と、ブリッジ内部で扱う型付きイベント

use serde::{Deserialize, Serialize};

/// ラベルを出した特徴量モデル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    Velocity,
    Acceleration,
    #[default]
    #[serde(other)]
    Unknown,
}

/// 分類器から届くままのイベント。例:
/// `{"type": "velocity", "label": "Fast (0.91)", "displayConfidence": 0.91}`.
///
/// 不正なイベントもデコードできるよう全フィールド省略可
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireEvent {
    #[serde(rename = "type", default)]
    pub kind: FeatureKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(
        rename = "displayConfidence",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub display_confidence: Option<f64>,
}

impl WireEvent {
    pub fn new(kind: FeatureKind, label: impl Into<String>, confidence: f64) -> Self {
        Self {
            kind,
            label: Some(label.into()),
            display_confidence: Some(confidence),
        }
    }
}

/// ラベルをキーワードに変換済みの分類結果
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationEvent {
    pub kind: FeatureKind,
    /// ラベル先頭トークンの小文字。不正なイベントは `None`
    pub keyword: Option<String>,
    pub confidence: f64,
}

impl ClassificationEvent {
    pub fn new(kind: FeatureKind, keyword: impl Into<String>, confidence: f64) -> Self {
        Self {
            kind,
            keyword: Some(keyword.into()),
            confidence,
        }
    }

    pub fn is_recognizable(&self) -> bool {
        self.keyword.is_some()
    }
}

impl From<WireEvent> for ClassificationEvent {
    fn from(wire: WireEvent) -> Self {
        // ラベルと確信度が両方揃って初めて数える
        let (keyword, confidence) = match (wire.label.as_deref(), wire.display_confidence) {
            (Some(label), Some(conf)) if conf.is_finite() => (label_keyword(label), conf),
            _ => (None, 0.0),
        };
        Self {
            kind: wire.kind,
            keyword,
            confidence,
        }
    }
}

/// `"Fast (0.91)"` -> `"fast"`。空や空白だけのラベルはキーワード無し
pub fn label_keyword(label: &str) -> Option<String> {
    label
        .split_whitespace()
        .next()
        .map(|token| token.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_keyword() {
        assert_eq!(label_keyword("Fast (0.91)").as_deref(), Some("fast"));
        assert_eq!(label_keyword("SLOW (1.00)").as_deref(), Some("slow"));
        assert_eq!(label_keyword("  Sudden").as_deref(), Some("sudden"));
        assert_eq!(label_keyword(""), None);
        assert_eq!(label_keyword("   "), None);
    }

    #[test]
    fn test_wire_event_decode() {
        let json = r#"{"type":"velocity","label":"Fast (0.91)","displayConfidence":0.91}"#;
        let wire: WireEvent = serde_json::from_str(json).unwrap();
        assert_eq!(wire.kind, FeatureKind::Velocity);

        let event = ClassificationEvent::from(wire);
        assert_eq!(event.keyword.as_deref(), Some("fast"));
        assert!((event.confidence - 0.91).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_kind_still_decodes() {
        let json = r#"{"type":"jerk","label":"Slow (0.5)","displayConfidence":0.5}"#;
        let wire: WireEvent = serde_json::from_str(json).unwrap();
        assert_eq!(wire.kind, FeatureKind::Unknown);
    }

    #[test]
    fn test_missing_confidence_is_unrecognized() {
        let json = r#"{"type":"velocity","label":"Fast (0.91)"}"#;
        let wire: WireEvent = serde_json::from_str(json).unwrap();
        let event = ClassificationEvent::from(wire);
        assert!(!event.is_recognizable());
    }

    #[test]
    fn test_missing_label_is_unrecognized() {
        let wire: WireEvent = serde_json::from_str(r#"{"displayConfidence":0.7}"#).unwrap();
        let event = ClassificationEvent::from(wire);
        assert!(!event.is_recognizable());
        assert_eq!(event.kind, FeatureKind::Unknown);
    }
}
