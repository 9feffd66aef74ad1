use std::collections::VecDeque;

use super::keypoint::PoseFrame;

/// 30fps で 2 秒
pub const DEFAULT_CAPACITY: usize = 60;
/// 1 秒に 1 回推論
pub const DEFAULT_STRIDE: usize = 30;

/// 連続推論用の直近フレームのスライディングウィンドウ
pub struct CaptureWindow {
    frames: VecDeque<PoseFrame>,
    capacity: usize,
    stride: usize,
    pushed: u64,
}

impl CaptureWindow {
    pub fn new(capacity: usize, stride: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
            stride: stride.max(1),
            pushed: 0,
        }
    }

    /// フレームを追加する。満杯なら最古のフレームを捨てる。
    /// `stride` 回ごとに true (推論タイミング) を返す
    pub fn push(&mut self, frame: PoseFrame) -> bool {
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
        self.pushed += 1;
        self.pushed % self.stride as u64 == 0
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.frames.len() == self.capacity
    }

    /// ウィンドウの中身を最終フレームの複製で capacity まで埋めたもの。
    /// 空なら空列
    pub fn padded(&self) -> Vec<PoseFrame> {
        let mut out: Vec<PoseFrame> = self.frames.iter().cloned().collect();
        if let Some(last) = self.frames.back() {
            out.resize(self.capacity, last.clone());
        }
        out
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.pushed = 0;
    }

    /// 録画済みフレームを順に流し込み、推論タイミングごとに
    /// (そこまでのフレーム数, padded ウィンドウ) を返す
    pub fn replay<'a, I>(&mut self, frames: I) -> Vec<(usize, Vec<PoseFrame>)>
    where
        I: IntoIterator<Item = &'a PoseFrame>,
    {
        let mut windows = Vec::new();
        for (i, frame) in frames.into_iter().enumerate() {
            if self.push(frame.clone()) {
                windows.push((i + 1, self.padded()));
            }
        }
        windows
    }
}

impl Default for CaptureWindow {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_STRIDE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::keypoint::Keypoint;

    fn frame(x: f32) -> PoseFrame {
        PoseFrame::uniform(Keypoint::new(x, 0.0))
    }

    #[test]
    fn test_prediction_due_every_stride() {
        let mut window = CaptureWindow::new(60, 30);
        let due: Vec<usize> = (1..=90).filter(|&i| window.push(frame(i as f32))).collect();
        assert_eq!(due, vec![30, 60, 90]);
    }

    #[test]
    fn test_slides_when_full() {
        let mut window = CaptureWindow::new(3, 1);
        for i in 0..5 {
            window.push(frame(i as f32));
        }
        assert!(window.is_full());
        let xs: Vec<f32> = window
            .padded()
            .iter()
            .map(|f| f.keypoints[0].unwrap().x)
            .collect();
        assert_eq!(xs, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_padded_repeats_last_frame() {
        let mut window = CaptureWindow::new(5, 30);
        window.push(frame(1.0));
        window.push(frame(2.0));
        let padded = window.padded();
        assert_eq!(padded.len(), 5);
        assert_eq!(padded[4], frame(2.0));
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn test_replay_recorded_frames() {
        let frames: Vec<PoseFrame> = (0..75).map(|i| frame(i as f32)).collect();
        let mut window = CaptureWindow::default();
        let windows = window.replay(&frames);

        let ends: Vec<usize> = windows.iter().map(|(end, _)| *end).collect();
        assert_eq!(ends, vec![30, 60]);
        // 1 回目はまだ 30 フレームしかないので最終フレームで埋まる
        assert_eq!(windows[0].1.len(), 60);
        assert_eq!(windows[0].1[59], frame(29.0));
        assert_eq!(windows[1].1[0], frame(0.0));
        assert_eq!(windows[1].1[59], frame(59.0));
    }

    #[test]
    fn test_empty_and_clear() {
        let mut window = CaptureWindow::default();
        assert!(window.padded().is_empty());
        window.push(frame(0.0));
        window.clear();
        assert!(window.is_empty());
    }
}
