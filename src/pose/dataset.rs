//! 録画済みの姿勢データセット
//!
//! ```json
//! { "data": [ { "xs": [ { "x0": 396.5, "y0": 82.6, ..., "x32": 0, "y32": 0 }, ... ],
//!               "ys": { "label": "Fast" } } ] }
//! ```

use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use super::keypoint::{Keypoint, KeypointIndex, PoseFrame};
use crate::error::Result;

#[derive(Debug, Deserialize)]
struct RawDataset {
    #[serde(default)]
    data: Vec<RawSample>,
}

#[derive(Debug, Deserialize)]
struct RawSample {
    #[serde(default)]
    xs: Vec<Map<String, Value>>,
    #[serde(default)]
    ys: Option<RawTarget>,
}

#[derive(Debug, Deserialize)]
struct RawTarget {
    label: Option<String>,
}

/// 録画クリップ 1 つと学習ラベル
#[derive(Debug, Clone, PartialEq)]
pub struct PoseSample {
    pub frames: Vec<PoseFrame>,
    pub label: Option<String>,
}

pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<PoseSample>> {
    let content = fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(json: &str) -> Result<Vec<PoseSample>> {
    let raw: RawDataset = serde_json::from_str(json)?;
    Ok(raw
        .data
        .into_iter()
        .map(|sample| PoseSample {
            frames: sample.xs.iter().map(frame_from_map).collect(),
            label: sample.ys.and_then(|t| t.label),
        })
        .collect())
}

/// `x<i>` と `y<i>` が両方数値のときだけ関節ありとみなす
fn frame_from_map(map: &Map<String, Value>) -> PoseFrame {
    let mut frame = PoseFrame::default();
    for i in 0..KeypointIndex::COUNT {
        let x = map.get(&format!("x{i}")).and_then(Value::as_f64);
        let y = map.get(&format!("y{i}")).and_then(Value::as_f64);
        if let (Some(x), Some(y)) = (x, y) {
            frame.keypoints[i] = Some(Keypoint::new(x as f32, y as f32));
        }
    }
    frame
}
