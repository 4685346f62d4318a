pub mod lyric_layout;
pub mod rings;

pub use lyric_layout::{LyricLayout, LyricLine, LyricWord};
pub use rings::{RingField, RingId, RingKind, RingTint, TransientRing};
