/// BlazePose の 33 キーポイントインデックス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum KeypointIndex {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl KeypointIndex {
    pub const COUNT: usize = 33;

    pub const ALL: [KeypointIndex; Self::COUNT] = [
        Self::Nose,
        Self::LeftEyeInner,
        Self::LeftEye,
        Self::LeftEyeOuter,
        Self::RightEyeInner,
        Self::RightEye,
        Self::RightEyeOuter,
        Self::LeftEar,
        Self::RightEar,
        Self::MouthLeft,
        Self::MouthRight,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftPinky,
        Self::RightPinky,
        Self::LeftIndex,
        Self::RightIndex,
        Self::LeftThumb,
        Self::RightThumb,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
        Self::LeftHeel,
        Self::RightHeel,
        Self::LeftFootIndex,
        Self::RightFootIndex,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// 単一キーポイント (ピクセル座標)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Keypoint) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// 1フレーム分の姿勢。欠損した関節は None
#[derive(Debug, Clone, PartialEq)]
pub struct PoseFrame {
    pub keypoints: [Option<Keypoint>; KeypointIndex::COUNT],
}

impl PoseFrame {
    pub fn new(keypoints: [Option<Keypoint>; KeypointIndex::COUNT]) -> Self {
        Self { keypoints }
    }

    /// 全関節が同じ位置にあるフレーム
    pub fn uniform(point: Keypoint) -> Self {
        Self::new([Some(point); KeypointIndex::COUNT])
    }

    pub fn get(&self, index: KeypointIndex) -> Option<&Keypoint> {
        self.keypoints[index as usize].as_ref()
    }

    pub fn present_count(&self) -> usize {
        self.keypoints.iter().filter(|k| k.is_some()).count()
    }

    /// 検出された関節の平均位置 (代表点)
    pub fn centroid(&self) -> Option<Keypoint> {
        let present: Vec<&Keypoint> = self.keypoints.iter().flatten().collect();
        if present.is_empty() {
            return None;
        }
        let n = present.len() as f32;
        let x = present.iter().map(|k| k.x).sum::<f32>() / n;
        let y = present.iter().map(|k| k.y).sum::<f32>() / n;
        Some(Keypoint::new(x, y))
    }
}

impl Default for PoseFrame {
    fn default() -> Self {
        Self {
            keypoints: [None; KeypointIndex::COUNT],
        }
    }
}
