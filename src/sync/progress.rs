/// What the visualizer currently knows about playback.
///
/// Unit references are indices into the timing data; `None` means nothing is
/// active at the current position, which is a valid state and distinct from
/// every concrete unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackProgress {
    /// Last authoritative position in milliseconds.
    pub position: f64,
    pub beat: Option<usize>,
    pub chord: Option<usize>,
    pub chorus: Option<usize>,
    pub phrase: Option<usize>,
    pub word: Option<usize>,
    pub char: Option<usize>,
    pub volume: f32,
    pub is_playing: bool,
    pub ready: bool,
}
