//! 動き分類器に渡す関節ごとの特徴量

use super::keypoint::{KeypointIndex, PoseFrame};

/// 関節ごとの値 1 行分 (速度または加速度)
pub type JointRow = [f32; KeypointIndex::COUNT];

pub const DEFAULT_FPS: f32 = 30.0;

/// 連続フレーム間の関節速度: 距離 / dt。
///
/// どちらかのフレームで欠損した関節は 0。出力行数がフレーム数と
/// 一致するよう最終行を複製する
pub fn velocity_features(frames: &[PoseFrame], dt: f32) -> Vec<JointRow> {
    let mut rows: Vec<JointRow> = frames
        .windows(2)
        .map(|pair| {
            let mut row = [0.0; KeypointIndex::COUNT];
            for (j, v) in row.iter_mut().enumerate() {
                if let (Some(a), Some(b)) = (&pair[0].keypoints[j], &pair[1].keypoints[j]) {
                    *v = a.distance(b) / dt;
                }
            }
            row
        })
        .collect();
    repeat_last(&mut rows);
    rows
}

/// 関節速度の変化の絶対値: |v[i+1] - v[i]| / dt。最終行は複製
pub fn acceleration_features(frames: &[PoseFrame], dt: f32) -> Vec<JointRow> {
    let velocities = velocity_features(frames, dt);
    let mut rows: Vec<JointRow> = velocities
        .windows(2)
        .map(|pair| {
            let mut row = [0.0; KeypointIndex::COUNT];
            for (j, a) in row.iter_mut().enumerate() {
                *a = (pair[1][j] - pair[0][j]).abs() / dt;
            }
            row
        })
        .collect();
    repeat_last(&mut rows);
    rows
}

fn repeat_last(rows: &mut Vec<JointRow>) {
    if let Some(last) = rows.last().copied() {
        rows.push(last);
    }
}

/// 連続フレーム間の重心の速度 (関節が 1 つも無いフレームは
/// 飛ばす)
pub fn centroid_velocity(frames: &[PoseFrame], dt: f32) -> Vec<f32> {
    let centroids: Vec<_> = frames.iter().filter_map(PoseFrame::centroid).collect();
    centroids
        .windows(2)
        .map(|pair| pair[0].distance(&pair[1]) / dt)
        .collect()
}

/// 全行・全値の平均。行が無ければ 0
pub fn mean_of_rows(rows: &[JointRow]) -> f32 {
    if rows.is_empty() {
        return 0.0;
    }
    let total: f32 = rows.iter().flat_map(|r| r.iter()).sum();
    total / (rows.len() * KeypointIndex::COUNT) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::keypoint::Keypoint;

    const DT: f32 = 1.0 / DEFAULT_FPS;

    fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() < eps
    }

    fn moving(n: usize, step: f32) -> Vec<PoseFrame> {
        (0..n)
            .map(|i| PoseFrame::uniform(Keypoint::new(i as f32 * step, 0.0)))
            .collect()
    }

    #[test]
    fn test_stationary_pose_has_zero_velocity() {
        let frames = vec![PoseFrame::uniform(Keypoint::new(5.0, 5.0)); 10];
        let v = velocity_features(&frames, DT);
        assert_eq!(v.len(), 10);
        assert!(v.iter().all(|row| row.iter().all(|&x| x == 0.0)));
    }

    #[test]
    fn test_constant_motion() {
        let frames = moving(5, 2.0);
        let v = velocity_features(&frames, DT);
        assert_eq!(v.len(), 5);
        for row in &v {
            assert!(approx_eq(row[0], 60.0, 1e-3));
        }
        let a = acceleration_features(&frames, DT);
        assert_eq!(a.len(), 5);
        assert!(a.iter().all(|row| row.iter().all(|&x| approx_eq(x, 0.0, 1e-3))));
    }

    #[test]
    fn test_acceleration_from_speed_change() {
        // 位置 0, 1, 3: 速度 30, 60 px/s
        let frames: Vec<PoseFrame> = [0.0, 1.0, 3.0]
            .iter()
            .map(|&x| PoseFrame::uniform(Keypoint::new(x, 0.0)))
            .collect();
        let a = acceleration_features(&frames, DT);
        assert_eq!(a.len(), 3);
        assert!(approx_eq(a[0][0], 900.0, 1e-1));
        // 速度の最終行は複製なので変化は 0
        assert!(approx_eq(a[1][0], 0.0, 1e-3));
        assert_eq!(a[2], a[1]);
    }

    #[test]
    fn test_missing_joint_contributes_zero() {
        let mut frames = moving(2, 1.0);
        frames[1].keypoints[KeypointIndex::LeftWrist as usize] = None;
        let v = velocity_features(&frames, DT);
        assert_eq!(v[0][KeypointIndex::LeftWrist as usize], 0.0);
        assert!(v[0][KeypointIndex::Nose as usize] > 0.0);
    }

    #[test]
    fn test_short_input() {
        assert!(velocity_features(&[], DT).is_empty());
        assert!(velocity_features(&moving(1, 1.0), DT).is_empty());
        assert!(acceleration_features(&moving(1, 1.0), DT).is_empty());
    }

    #[test]
    fn test_centroid_velocity_and_mean() {
        let frames = moving(3, 1.0);
        let v = centroid_velocity(&frames, DT);
        assert_eq!(v.len(), 2);
        assert!(approx_eq(v[0], 30.0, 1e-3));

        let rows = velocity_features(&frames, DT);
        assert!(approx_eq(mean_of_rows(&rows), 30.0, 1e-3));
        assert_eq!(mean_of_rows(&[]), 0.0);
    }
}
