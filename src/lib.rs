pub mod aggregate;
pub mod bridge;
pub mod config;
pub mod decision;
pub mod emitter;
pub mod error;
pub mod event;
pub mod logging;
pub mod mapping;
pub mod pose;
pub mod protocol;
pub mod server;
pub mod window;

pub use bridge::Bridge;
pub use decision::{ControlDecision, TempoPolicy};
pub use emitter::ControlEmitter;
pub use error::{BridgeError, Result};
pub use event::{ClassificationEvent, FeatureKind, WireEvent};
