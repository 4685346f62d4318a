//! Playback synchronization: the clock estimator, the structure tracker, the
//! scrub gesture machine and the `Visualizer` context tying them together.

pub mod clock;
pub mod events;
pub mod metadata;
pub mod progress;
pub mod scrub;
pub mod tracker;
pub mod visualizer;

pub use clock::{ClockEstimator, WallClock};
pub use events::{dispatch, PlaybackControl, PlayerEvent, PlayerListener, SharedMetadata};
pub use metadata::TimedMetadata;
pub use progress::PlaybackProgress;
pub use visualizer::{CameraPose, FrameOutcome, StageStatus, Visualizer};
