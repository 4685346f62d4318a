use serde::{self, Deserialize};
use std::path::PathBuf;
use thiserror::Error;

use bevy::{
    asset::{io::Reader, Asset, AssetLoader, LoadContext, ReadAssetBytesError},
    prelude::*,
    reflect::TypePath,
};

use crate::sync::metadata::{
    find_active, Beat, Chord, Chorus, LyricChar, Phrase, TimeSpan, TimedMetadata,
    VideoInformation, Word,
};

/// On-disk layout of a `song.timing` file.
#[derive(Debug, Clone, Deserialize)]
pub struct SongTimingDocument {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub beats: Vec<Beat>,
    #[serde(default)]
    pub chords: Vec<Chord>,
    #[serde(default)]
    pub choruses: Vec<Chorus>,
    #[serde(default)]
    pub phrases: Vec<Phrase>,
    #[serde(default)]
    pub vocal_amplitude: Option<VocalAmplitude>,
}

/// Vocal loudness sampled at a fixed interval from time zero.
#[derive(Debug, Clone, Deserialize)]
pub struct VocalAmplitude {
    pub interval_ms: f64,
    pub samples: Vec<f32>,
}

impl VocalAmplitude {
    /// Linearly interpolated amplitude; zero outside the sampled range.
    pub fn at(&self, t: f64) -> f32 {
        if self.samples.is_empty() || self.interval_ms <= 0.0 || t < 0.0 {
            return 0.0;
        }
        let slot = t / self.interval_ms;
        let lower = slot.floor() as usize;
        let Some(&a) = self.samples.get(lower) else {
            return 0.0;
        };
        let b = self.samples.get(lower + 1).copied().unwrap_or(a);
        let frac = (slot - lower as f64) as f32;
        a + (b - a) * frac
    }
}

/// Where a word or char lives inside the phrase tree.
#[derive(Debug, Clone, Copy)]
struct UnitSpan {
    start_time: f64,
    end_time: f64,
    phrase: usize,
    word: usize,
    char: usize,
}

impl TimeSpan for UnitSpan {
    fn start_time(&self) -> f64 {
        self.start_time
    }

    fn end_time(&self) -> f64 {
        self.end_time
    }
}

#[derive(Asset, TypePath, Debug)]
pub struct SongTiming {
    pub title: String,
    pub artist: String,
    beats: Vec<Beat>,
    chords: Vec<Chord>,
    choruses: Vec<Chorus>,
    phrases: Vec<Phrase>,
    word_spans: Vec<UnitSpan>,
    char_spans: Vec<UnitSpan>,
    vocal_amplitude: Option<VocalAmplitude>,
    info: VideoInformation,
}

fn sort_by_start<T: TimeSpan>(items: &mut [T]) {
    items.sort_by(|a, b| a.start_time().total_cmp(&b.start_time()));
}

impl SongTiming {
    pub fn from_document(document: SongTimingDocument) -> Self {
        let SongTimingDocument {
            title,
            artist,
            duration,
            mut beats,
            mut chords,
            mut choruses,
            mut phrases,
            vocal_amplitude,
        } = document;

        sort_by_start(&mut beats);
        sort_by_start(&mut chords);
        sort_by_start(&mut choruses);
        sort_by_start(&mut phrases);
        for (index, beat) in beats.iter_mut().enumerate() {
            beat.index = index;
        }
        for (index, chord) in chords.iter_mut().enumerate() {
            chord.index = index;
        }
        for (index, chorus) in choruses.iter_mut().enumerate() {
            chorus.index = index;
        }

        let mut word_spans = Vec::new();
        let mut char_spans = Vec::new();
        let mut word_count = 0;
        let mut char_count = 0;
        for (phrase_idx, phrase) in phrases.iter_mut().enumerate() {
            phrase.index = phrase_idx;
            sort_by_start(&mut phrase.words);
            for (word_idx, word) in phrase.words.iter_mut().enumerate() {
                word.index = word_count;
                word_count += 1;
                word_spans.push(UnitSpan {
                    start_time: word.start_time,
                    end_time: word.end_time,
                    phrase: phrase_idx,
                    word: word_idx,
                    char: 0,
                });

                sort_by_start(&mut word.chars);
                for (char_idx, ch) in word.chars.iter_mut().enumerate() {
                    ch.index = char_count;
                    char_count += 1;
                    char_spans.push(UnitSpan {
                        start_time: ch.start_time,
                        end_time: ch.end_time,
                        phrase: phrase_idx,
                        word: word_idx,
                        char: char_idx,
                    });
                }
            }
        }
        sort_by_start(&mut word_spans);
        sort_by_start(&mut char_spans);

        let last_end = beats
            .iter()
            .map(TimeSpan::end_time)
            .chain(phrases.iter().map(TimeSpan::end_time))
            .fold(0.0, f64::max);

        Self {
            title,
            artist,
            info: VideoInformation {
                duration: duration.unwrap_or(last_end),
                char_count,
                word_count,
            },
            beats,
            chords,
            choruses,
            phrases,
            word_spans,
            char_spans,
            vocal_amplitude,
        }
    }

    pub fn from_yaml(bytes: &[u8]) -> Result<Self, serde_yaml::Error> {
        let document: SongTimingDocument = serde_yaml::from_slice(bytes)?;
        Ok(Self::from_document(document))
    }

    /// Replaces the duration when the file leaves it out and the audio stream knows better.
    pub fn fill_duration(&mut self, duration_ms: f64) {
        if duration_ms > self.info.duration {
            self.info.duration = duration_ms;
        }
    }
}

impl TimedMetadata for SongTiming {
    fn find_beat(&self, t: f64) -> Option<&Beat> {
        find_active(&self.beats, t)
    }

    fn find_chord(&self, t: f64) -> Option<&Chord> {
        find_active(&self.chords, t)
    }

    fn find_chorus(&self, t: f64) -> Option<&Chorus> {
        find_active(&self.choruses, t)
    }

    fn find_phrase(&self, t: f64) -> Option<&Phrase> {
        find_active(&self.phrases, t)
    }

    fn find_word(&self, t: f64) -> Option<&Word> {
        let span = find_active(&self.word_spans, t)?;
        self.phrases.get(span.phrase)?.words.get(span.word)
    }

    fn find_char(&self, t: f64) -> Option<&LyricChar> {
        let span = find_active(&self.char_spans, t)?;
        self.phrases
            .get(span.phrase)?
            .words
            .get(span.word)?
            .chars
            .get(span.char)
    }

    fn vocal_amplitude(&self, t: f64) -> f32 {
        self.vocal_amplitude.as_ref().map_or(0.0, |amp| amp.at(t))
    }

    fn video_information(&self) -> VideoInformation {
        self.info
    }

    fn phrases(&self) -> &[Phrase] {
        &self.phrases
    }
}

#[derive(Default)]
pub struct SongTimingLoader;

#[derive(Debug, Error)]
pub enum SongTimingLoaderError {
    #[error("Failed to read asset bytes: {0}")]
    ReadBytes(#[from] ReadAssetBytesError),

    #[error("Failed to parse song.timing: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl AssetLoader for SongTimingLoader {
    type Asset = SongTiming;
    type Settings = ();
    type Error = SongTimingLoaderError;

    fn extensions(&self) -> &[&str] {
        &["timing"]
    }

    async fn load(
        &self,
        _reader: &mut dyn Reader,
        _settings: &(),
        load_context: &mut LoadContext<'_>,
    ) -> Result<Self::Asset, Self::Error> {
        let timing_path: PathBuf = load_context.path().to_path_buf();
        let bytes = load_context.read_asset_bytes(timing_path).await?;
        let timing = SongTiming::from_yaml(&bytes)?;
        info!(
            "Loaded timing for '{}' by {}: {} phrases, {} words",
            timing.title,
            timing.artist,
            timing.phrases.len(),
            timing.info.word_count
        );
        Ok(timing)
    }
}
