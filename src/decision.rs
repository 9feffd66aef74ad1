//! テンポ判定: 集計済みの 1 ウィンドウをコントロールチェンジ 1 つに変換する
//!
//! Majority ポリシー:
//! - fast が多い: fast の平均確信度を fast 範囲に写像、fast CC
//! - slow が多い: slow の平均確信度を slow 範囲に写像、slow CC
//! - 同数 (0 以外): 両方の平均をタイ範囲に写像、tie CC
//! - 認識できるラベル無し: 判定なし
//!
//! 分岐は件数だけで決まり、確信度は範囲内の位置だけを決める。

use serde::Serialize;

use crate::aggregate::{mean, Buckets};
use crate::config::{DecisionConfig, PolicyKind};
use crate::mapping::{clamp_control, round_tempo, OutputRange};

/// 判定を出した分岐
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Branch {
    Fast,
    Slow,
    Tie,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ControlDecision {
    pub branch: Branch,
    /// 写像して丸めた値 (クランプ前)
    pub tempo: i32,
    /// `tempo` を 0..=127 にクランプした、実際に送る値
    pub value: u8,
    /// コントロールチェンジ番号
    pub channel: u8,
}

impl ControlDecision {
    fn new(branch: Branch, mapped: f64, channel: u8) -> Self {
        let tempo = round_tempo(mapped);
        Self {
            branch,
            tempo,
            value: clamp_control(tempo),
            channel,
        }
    }
}

pub struct TempoPolicy {
    config: DecisionConfig,
}

impl TempoPolicy {
    pub fn new(mut config: DecisionConfig) -> Self {
        config.normalize_keywords();
        Self { config }
    }

    pub fn from_config(config: &DecisionConfig) -> Self {
        Self::new(config.clone())
    }

    pub fn config(&self) -> &DecisionConfig {
        &self.config
    }

    pub fn decide(&self, buckets: &Buckets) -> Option<ControlDecision> {
        let fast = buckets.collect(&self.config.fast_keywords);
        let slow = buckets.collect(&self.config.slow_keywords);

        match self.config.policy {
            PolicyKind::Majority => self.decide_majority(&fast, &slow),
            PolicyKind::SlowOnly => self.decide_slow_only(&slow),
        }
    }

    fn decide_majority(&self, fast: &[f64], slow: &[f64]) -> Option<ControlDecision> {
        let c = &self.config;
        if fast.len() > slow.len() {
            Some(self.branch(Branch::Fast, fast, c.fast_range, c.fast_cc))
        } else if slow.len() > fast.len() {
            Some(self.branch(Branch::Slow, slow, c.slow_range, c.slow_cc))
        } else if !fast.is_empty() {
            let all: Vec<f64> = fast.iter().chain(slow).copied().collect();
            Some(self.branch(Branch::Tie, &all, c.tie_range, c.tie_cc))
        } else {
            None
        }
    }

    fn decide_slow_only(&self, slow: &[f64]) -> Option<ControlDecision> {
        if slow.is_empty() {
            return None;
        }
        Some(self.branch(Branch::Slow, slow, self.config.slow_range, self.config.slow_cc))
    }

    fn branch(&self, branch: Branch, confidences: &[f64], range: OutputRange, cc: u8) -> ControlDecision {
        let avg = mean(confidences).unwrap_or(0.0);
        ControlDecision::new(branch, range.map_confidence(avg), cc)
    }
}

impl Default for TempoPolicy {
    fn default() -> Self {
        Self::new(DecisionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::event::{ClassificationEvent, FeatureKind, WireEvent};

    fn events(labels: &[(&str, f64)]) -> Vec<ClassificationEvent> {
        labels
            .iter()
            .map(|(label, conf)| WireEvent::new(FeatureKind::Velocity, *label, *conf).into())
            .collect()
    }

    fn decide(labels: &[(&str, f64)]) -> Option<ControlDecision> {
        TempoPolicy::default().decide(&aggregate(&events(labels)))
    }

    #[test]
    fn test_fast_majority() {
        let d = decide(&[("Fast (1.0)", 1.0), ("Fast (0.5)", 0.5), ("Slow (0.9)", 0.9)]).unwrap();
        assert_eq!(d.branch, Branch::Fast);
        assert_eq!(d.tempo, 152);
        assert_eq!(d.value, 127);
        assert_eq!(d.channel, 3);
    }

    #[test]
    fn test_slow_only_event() {
        let d = decide(&[("Slow (1.0)", 1.0)]).unwrap();
        assert_eq!(d.branch, Branch::Slow);
        assert_eq!(d.tempo, 90);
        assert_eq!(d.value, 90);
        assert_eq!(d.channel, 2);
    }

    #[test]
    fn test_tie_uses_combined_mean() {
        let d = decide(&[("Fast (0.2)", 0.2), ("Slow (0.6)", 0.6)]).unwrap();
        assert_eq!(d.branch, Branch::Tie);
        // 平均 0.4 -> 90 + 0.4 * 30 = 102
        assert_eq!(d.tempo, 102);
        assert_eq!(d.channel, 4);
    }

    #[test]
    fn test_tie_break_ignores_confidence() {
        // 確信度は slow の方がずっと高いが件数は fast が多い
        let d = decide(&[
            ("Fast (0.1)", 0.1),
            ("Fast (0.1)", 0.1),
            ("Slow (1.0)", 1.0),
        ])
        .unwrap();
        assert_eq!(d.branch, Branch::Fast);
    }

    #[test]
    fn test_empty_batch_is_no_decision() {
        assert_eq!(decide(&[]), None);
    }

    #[test]
    fn test_unrecognized_only_is_no_decision() {
        assert_eq!(decide(&[("Sudden (0.9)", 0.9), ("Jump (1.0)", 1.0)]), None);
    }

    #[test]
    fn test_fast_majority_range_property() {
        for n_fast in 2..6 {
            for n_slow in 1..n_fast {
                for step in 0..=10 {
                    let conf = step as f64 / 10.0;
                    let mut labels = vec![("Fast", conf); n_fast];
                    labels.extend(vec![("Slow", 1.0 - conf); n_slow]);
                    let d = decide(&labels).unwrap();
                    assert_eq!(d.channel, 3);
                    assert!((130..=160).contains(&d.tempo));
                    assert_eq!(d.value, 127);
                }
            }
        }
    }

    #[test]
    fn test_tie_range_property() {
        for n in 1..5 {
            for step in 0..=10 {
                let conf = step as f64 / 10.0;
                let mut labels = vec![("Fast", conf); n];
                labels.extend(vec![("Slow", 1.0 - conf * 0.5); n]);
                let d = decide(&labels).unwrap();
                assert_eq!(d.branch, Branch::Tie);
                assert!((90..=120).contains(&d.tempo));
            }
        }
    }

    #[test]
    fn test_extended_vocabulary() {
        let config = DecisionConfig {
            fast_keywords: vec!["fast".into(), "sudden".into()],
            slow_keywords: vec!["slow".into(), "sustained".into()],
            ..DecisionConfig::default()
        };
        let policy = TempoPolicy::new(config);
        let evs = events(&[("Sudden (0.8)", 0.8), ("Sustained (0.6)", 0.6), ("Sustained (0.6)", 0.6)]);
        let d = policy.decide(&aggregate(&evs)).unwrap();
        assert_eq!(d.branch, Branch::Slow);
        assert_eq!(d.tempo, 78);
    }

    #[test]
    fn test_repeated_or_uppercase_keywords_count_once() {
        let config = DecisionConfig {
            fast_keywords: vec!["Fast".into(), "fast".into()],
            ..DecisionConfig::default()
        };
        let policy = TempoPolicy::new(config);
        // fast 2 件 vs slow 1 件: fast が水増しされず、"Fast" も一致する
        let evs = events(&[("Fast (1.0)", 1.0), ("Fast (0.5)", 0.5), ("Slow (0.9)", 0.9)]);
        let d = policy.decide(&aggregate(&evs)).unwrap();
        assert_eq!(d.branch, Branch::Fast);
        assert_eq!(d.tempo, 152);

        // 1 fast vs 1 slow はタイのまま
        let evs = events(&[("Fast (1.0)", 1.0), ("Slow (1.0)", 1.0)]);
        assert_eq!(policy.decide(&aggregate(&evs)).unwrap().branch, Branch::Tie);
    }

    #[test]
    fn test_slow_only_policy() {
        let config = DecisionConfig {
            policy: PolicyKind::SlowOnly,
            ..DecisionConfig::default()
        };
        let policy = TempoPolicy::new(config);

        let fast_heavy = events(&[("Fast (1.0)", 1.0), ("Fast (1.0)", 1.0), ("Slow (0.5)", 0.5)]);
        let d = policy.decide(&aggregate(&fast_heavy)).unwrap();
        assert_eq!(d.branch, Branch::Slow);
        assert_eq!(d.tempo, 75);
        assert_eq!(d.channel, 2);

        let fast_only = events(&[("Fast (1.0)", 1.0)]);
        assert_eq!(policy.decide(&aggregate(&fast_only)), None);
    }

    #[test]
    fn test_in_range_values_pass_through() {
        let config = DecisionConfig {
            fast_range: OutputRange::new(64.0, 127.0),
            ..DecisionConfig::default()
        };
        let policy = TempoPolicy::new(config);
        let d = policy.decide(&aggregate(&events(&[("Fast (0.0)", 0.0)]))).unwrap();
        assert_eq!(d.tempo, 64);
        assert_eq!(d.value, 64);
    }
}
