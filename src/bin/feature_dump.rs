//! 録画データセットの動き特徴量を JSON で出力する
//!
//! 使い方: feature_dump <dataset.json> [--fps 30] [--windowed]
//!
//! `--windowed` では分類器と同じく 60 フレーム窓を 30 フレームごとに評価する。

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

use tempo_bridge::pose::dataset;
use tempo_bridge::pose::features::{centroid_velocity, mean_of_rows, DEFAULT_FPS};
use tempo_bridge::pose::{acceleration_features, velocity_features, CaptureWindow, PoseFrame, PoseSample};

#[derive(Parser)]
#[command(name = "feature_dump", about = "Velocity/acceleration summary per recorded sample")]
struct Cli {
    dataset: PathBuf,
    #[arg(long, default_value_t = DEFAULT_FPS)]
    fps: f32,
    /// サンプル全体ではなく 60 フレームの推論窓ごとに集計
    #[arg(long)]
    windowed: bool,
}

#[derive(Serialize, Debug, PartialEq)]
struct FeatureSummary {
    mean_velocity: f32,
    mean_acceleration: f32,
    peak_centroid_velocity: f32,
}

impl FeatureSummary {
    fn of(frames: &[PoseFrame], dt: f32) -> Self {
        Self {
            mean_velocity: mean_of_rows(&velocity_features(frames, dt)),
            mean_acceleration: mean_of_rows(&acceleration_features(frames, dt)),
            peak_centroid_velocity: centroid_velocity(frames, dt).into_iter().fold(0.0, f32::max),
        }
    }
}

#[derive(Serialize)]
struct SampleSummary {
    index: usize,
    label: Option<String>,
    frames: usize,
    #[serde(flatten)]
    features: FeatureSummary,
}

#[derive(Serialize)]
struct WindowSummary {
    sample: usize,
    label: Option<String>,
    /// このフレーム数まで流した時点の推論
    end_frame: usize,
    #[serde(flatten)]
    features: FeatureSummary,
}

fn sample_summaries(samples: &[PoseSample], dt: f32) -> Vec<SampleSummary> {
    samples
        .iter()
        .enumerate()
        .map(|(index, sample)| SampleSummary {
            index,
            label: sample.label.clone(),
            frames: sample.frames.len(),
            features: FeatureSummary::of(&sample.frames, dt),
        })
        .collect()
}

fn window_summaries(samples: &[PoseSample], dt: f32) -> Vec<WindowSummary> {
    let mut out = Vec::new();
    for (index, sample) in samples.iter().enumerate() {
        // サンプルごとに窓をリセット
        let mut window = CaptureWindow::default();
        for (end_frame, frames) in window.replay(&sample.frames) {
            out.push(WindowSummary {
                sample: index,
                label: sample.label.clone(),
                end_frame,
                features: FeatureSummary::of(&frames, dt),
            });
        }
    }
    out
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    anyhow::ensure!(cli.fps > 0.0, "--fps must be positive");
    let dt = 1.0 / cli.fps;

    let samples = dataset::load(&cli.dataset)
        .with_context(|| format!("failed to load {}", cli.dataset.display()))?;

    let json = if cli.windowed {
        serde_json::to_string_pretty(&window_summaries(&samples, dt))?
    } else {
        serde_json::to_string_pretty(&sample_summaries(&samples, dt))?
    };
    println!("{json}");
    Ok(())
}
