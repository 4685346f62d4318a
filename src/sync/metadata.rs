//! Timed-metadata vocabulary shared by the tracker, the layout engine and the
//! song file loader.
//!
//! Every unit is an immutable, time-ranged record. Identity is the `index`
//! assigned at load time, so "the same beat" means "the same index" no matter
//! how many times the source is queried.

use serde::{Deserialize, Serialize};

/// Anything with a half-open `[start_time, end_time)` range in milliseconds.
pub trait TimeSpan {
    fn start_time(&self) -> f64;
    fn end_time(&self) -> f64;

    fn contains(&self, t: f64) -> bool {
        self.start_time() <= t && t < self.end_time()
    }
}

/// Finds the latest-starting item whose range contains `t`.
///
/// `items` must be sorted by start time.
pub fn find_active<T: TimeSpan>(items: &[T], t: f64) -> Option<&T> {
    let idx = items.partition_point(|item| item.start_time() <= t);
    let candidate = items.get(idx.checked_sub(1)?)?;
    candidate.contains(t).then_some(candidate)
}

macro_rules! impl_time_span {
    ($($ty:ty),* $(,)?) => {
        $(impl TimeSpan for $ty {
            fn start_time(&self) -> f64 {
                self.start_time
            }

            fn end_time(&self) -> f64 {
                self.end_time
            }
        })*
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beat {
    #[serde(skip)]
    pub index: usize,
    pub start_time: f64,
    pub end_time: f64,
    /// Position inside the bar, starting at 1.
    pub position: u32,
    /// Beats per bar.
    pub length: u32,
}

impl Beat {
    pub fn starts_bar(&self) -> bool {
        self.position == 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chord {
    #[serde(skip)]
    pub index: usize,
    pub name: String,
    pub start_time: f64,
    pub end_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chorus {
    #[serde(skip)]
    pub index: usize,
    pub start_time: f64,
    pub end_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phrase {
    #[serde(skip)]
    pub index: usize,
    pub start_time: f64,
    pub end_time: f64,
    pub words: Vec<Word>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    #[serde(skip)]
    pub index: usize,
    pub text: String,
    #[serde(default)]
    pub pos: PartOfSpeech,
    pub start_time: f64,
    pub end_time: f64,
    #[serde(default)]
    pub chars: Vec<LyricChar>,
}

impl Word {
    /// Length in characters, which is also the word's width in world units.
    pub fn text_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricChar {
    #[serde(skip)]
    pub index: usize,
    pub text: String,
    pub start_time: f64,
    pub end_time: f64,
}

impl_time_span!(Beat, Chord, Chorus, Phrase, Word, LyricChar);

/// Part-of-speech tags attached to every lyric word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartOfSpeech {
    /// Noun
    N,
    /// Pronoun
    PN,
    /// Verb
    V,
    /// Adverb
    R,
    /// Adjective
    J,
    /// Adnominal adjective
    A,
    /// Particle
    P,
    /// Modal
    M,
    /// Interrogative
    W,
    /// Determiner
    D,
    /// Conjunction
    I,
    /// Interjection
    U,
    /// Prefix
    F,
    /// Symbol
    S,
    /// Other
    #[default]
    X,
}

impl PartOfSpeech {
    pub fn is_emphasized(self) -> bool {
        self == PartOfSpeech::N
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VideoInformation {
    pub duration: f64,
    pub char_count: usize,
    pub word_count: usize,
}

/// Queries the visualizer runs against a song's timing data.
pub trait TimedMetadata: Send + Sync {
    fn find_beat(&self, t: f64) -> Option<&Beat>;
    fn find_chord(&self, t: f64) -> Option<&Chord>;
    fn find_chorus(&self, t: f64) -> Option<&Chorus>;
    fn find_phrase(&self, t: f64) -> Option<&Phrase>;
    fn find_word(&self, t: f64) -> Option<&Word>;
    fn find_char(&self, t: f64) -> Option<&LyricChar>;
    fn vocal_amplitude(&self, t: f64) -> f32;
    fn video_information(&self) -> VideoInformation;
    /// All phrases in playback order.
    fn phrases(&self) -> &[Phrase];
}
