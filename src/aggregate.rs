use std::collections::{HashMap, HashSet};

use crate::event::ClassificationEvent;

/// 1 ウィンドウ分の確信度をラベルのキーワードごとにまとめたもの
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Buckets {
    groups: HashMap<String, Vec<f64>>,
}

impl Buckets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, keyword: &str, confidence: f64) {
        self.groups
            .entry(keyword.to_string())
            .or_default()
            .push(confidence);
    }

    /// キーワード 1 つ分の確信度 (未出現なら空)
    pub fn get(&self, keyword: &str) -> &[f64] {
        self.groups.get(keyword).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `keywords` の各キーワードの確信度を連結したもの。
    /// 同じキーワードが 2 回並んでいてもイベントは 1 回だけ数える
    pub fn collect(&self, keywords: &[String]) -> Vec<f64> {
        let mut seen = HashSet::new();
        keywords
            .iter()
            .filter(|k| seen.insert(k.as_str()))
            .flat_map(|k| self.get(k).iter().copied())
            .collect()
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn total(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// イベントの確信度をキーワードごとにまとめる。キーワードの無いイベントは捨てる
pub fn aggregate<'a, I>(events: I) -> Buckets
where
    I: IntoIterator<Item = &'a ClassificationEvent>,
{
    let mut buckets = Buckets::new();
    for event in events {
        if let Some(keyword) = event.keyword.as_deref() {
            buckets.push(keyword, event.confidence);
        }
    }
    buckets
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}
