pub mod capture;
pub mod dataset;
pub mod features;
pub mod keypoint;
pub mod label;

pub use capture::CaptureWindow;
pub use dataset::PoseSample;
pub use features::{acceleration_features, velocity_features, JointRow};
pub use keypoint::{Keypoint, KeypointIndex, PoseFrame};
pub use label::{classifier_event, classifier_label};
