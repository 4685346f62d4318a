use bevy::log::debug;

use crate::components::rings::{RingField, RingKind, RingTint};
use crate::file::settings::RingSettings;
use crate::sync::metadata::TimedMetadata;
use crate::sync::progress::PlaybackProgress;

/// Hands out palette slots in order, wrapping at the palette length.
#[derive(Debug, Clone)]
pub struct ColorSpinner {
    next: usize,
    len: usize,
}

impl ColorSpinner {
    pub fn new(len: usize) -> Self {
        Self { next: 0, len: len.max(1) }
    }

    pub fn pick(&mut self) -> usize {
        let slot = self.next % self.len;
        self.next = self.next.wrapping_add(1);
        slot
    }
}

/// What changed on one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerTick {
    pub beat_changed: bool,
    pub chorus_changed: bool,
}

/// Watches the musical structure under the playback position and fires
/// one-shot effects when it changes.
#[derive(Debug, Clone)]
pub struct BeatTracker {
    colorful: bool,
    spinner: ColorSpinner,
}

impl BeatTracker {
    pub fn new(palette_len: usize) -> Self {
        Self {
            colorful: false,
            spinner: ColorSpinner::new(palette_len),
        }
    }

    /// Whether rings spawned from now on take palette colours.
    pub fn is_colorful(&self) -> bool {
        self.colorful
    }

    pub fn tick(
        &mut self,
        progress: &mut PlaybackProgress,
        source: &dyn TimedMetadata,
        rings: &mut RingField,
        ring_settings: &RingSettings,
    ) -> TrackerTick {
        let now = progress.position;
        let mut tick = TrackerTick::default();

        let beat = source.find_beat(now);
        let beat_index = beat.map(|b| b.index);
        if progress.beat != beat_index {
            progress.beat = beat_index;
            tick.beat_changed = true;
            debug!("update beat: {:?}", beat);

            let kind = if beat.is_some_and(|b| b.starts_bar()) {
                RingKind::Filled
            } else {
                RingKind::Outline
            };
            let tint = if self.colorful {
                RingTint::Palette(self.spinner.pick())
            } else {
                RingTint::Neutral
            };
            rings.spawn(kind, tint, ring_settings);
        }

        progress.chord = source.find_chord(now).map(|c| c.index);

        let chorus = source.find_chorus(now);
        let chorus_index = chorus.map(|c| c.index);
        if progress.chorus != chorus_index {
            progress.chorus = chorus_index;
            tick.chorus_changed = true;
            debug!("update chorus: {:?}", chorus);
            self.colorful = chorus.is_some();
        }

        progress.phrase = source.find_phrase(now).map(|p| p.index);
        progress.word = source.find_word(now).map(|w| w.index);
        progress.char = source.find_char(now).map(|c| c.index);
        progress.volume = source.vocal_amplitude(now);

        tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::metadata::{find_active, Beat, Chord, Chorus, LyricChar, Phrase, VideoInformation, Word};

    #[derive(Default)]
    struct Fixture {
        beats: Vec<Beat>,
        choruses: Vec<Chorus>,
    }

    impl TimedMetadata for Fixture {
        fn find_beat(&self, t: f64) -> Option<&Beat> {
            find_active(&self.beats, t)
        }
        fn find_chord(&self, _t: f64) -> Option<&Chord> {
            None
        }
        fn find_chorus(&self, t: f64) -> Option<&Chorus> {
            find_active(&self.choruses, t)
        }
        fn find_phrase(&self, _t: f64) -> Option<&Phrase> {
            None
        }
        fn find_word(&self, _t: f64) -> Option<&Word> {
            None
        }
        fn find_char(&self, _t: f64) -> Option<&LyricChar> {
            None
        }
        fn vocal_amplitude(&self, _t: f64) -> f32 {
            0.25
        }
        fn video_information(&self) -> VideoInformation {
            VideoInformation::default()
        }
        fn phrases(&self) -> &[Phrase] {
            &[]
        }
    }

    fn beats(spans: &[(f64, f64, u32)]) -> Vec<Beat> {
        spans
            .iter()
            .enumerate()
            .map(|(index, &(start_time, end_time, position))| Beat {
                index,
                start_time,
                end_time,
                position,
                length: 4,
            })
            .collect()
    }

    fn tick_at(
        tracker: &mut BeatTracker,
        progress: &mut PlaybackProgress,
        source: &Fixture,
        rings: &mut RingField,
        t: f64,
    ) -> TrackerTick {
        progress.position = t;
        tracker.tick(progress, source, rings, &RingSettings::default())
    }

    #[test]
    fn test_color_spinner_cycles() {
        let mut spinner = ColorSpinner::new(3);
        let picks: Vec<usize> = (0..7).map(|_| spinner.pick()).collect();
        assert_eq!(picks, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn test_one_ring_per_beat_transition() {
        let source = Fixture {
            beats: beats(&[(0.0, 500.0, 1), (500.0, 1_000.0, 2)]),
            ..Default::default()
        };
        let mut tracker = BeatTracker::new(6);
        let mut progress = PlaybackProgress::default();
        let mut rings = RingField::default();

        // Absent -> beat 0 is a transition.
        assert!(tick_at(&mut tracker, &mut progress, &source, &mut rings, 10.0).beat_changed);
        // Re-querying inside the same beat is not.
        assert!(!tick_at(&mut tracker, &mut progress, &source, &mut rings, 100.0).beat_changed);
        assert!(!tick_at(&mut tracker, &mut progress, &source, &mut rings, 499.0).beat_changed);
        assert!(tick_at(&mut tracker, &mut progress, &source, &mut rings, 500.0).beat_changed);
        // Beat 1 -> absent is a transition too.
        assert!(tick_at(&mut tracker, &mut progress, &source, &mut rings, 1_200.0).beat_changed);
        assert!(!tick_at(&mut tracker, &mut progress, &source, &mut rings, 1_300.0).beat_changed);

        let kinds: Vec<RingKind> = rings.rings().iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![RingKind::Filled, RingKind::Outline, RingKind::Outline]);
        assert_eq!(progress.beat, None);
    }

    #[test]
    fn test_chorus_toggles_colorful_mode_once_per_transition() {
        let source = Fixture {
            choruses: vec![Chorus { index: 0, start_time: 1_000.0, end_time: 2_000.0 }],
            ..Default::default()
        };
        let mut tracker = BeatTracker::new(6);
        let mut progress = PlaybackProgress::default();
        let mut rings = RingField::default();

        assert!(!tick_at(&mut tracker, &mut progress, &source, &mut rings, 0.0).chorus_changed);
        assert!(!tracker.is_colorful());
        assert!(tick_at(&mut tracker, &mut progress, &source, &mut rings, 1_000.0).chorus_changed);
        assert!(tracker.is_colorful());
        assert!(!tick_at(&mut tracker, &mut progress, &source, &mut rings, 1_500.0).chorus_changed);
        assert!(tick_at(&mut tracker, &mut progress, &source, &mut rings, 2_000.0).chorus_changed);
        assert!(!tracker.is_colorful());
    }

    #[test]
    fn test_ring_tint_is_fixed_at_spawn_time() {
        let source = Fixture {
            beats: beats(&[(0.0, 500.0, 1), (500.0, 1_000.0, 2), (1_000.0, 1_500.0, 3)]),
            choruses: vec![Chorus { index: 0, start_time: 500.0, end_time: 1_000.0 }],
        };
        let mut tracker = BeatTracker::new(6);
        let mut progress = PlaybackProgress::default();
        let mut rings = RingField::default();

        tick_at(&mut tracker, &mut progress, &source, &mut rings, 0.0);
        tick_at(&mut tracker, &mut progress, &source, &mut rings, 500.0);
        tick_at(&mut tracker, &mut progress, &source, &mut rings, 1_000.0);

        let tints: Vec<RingTint> = rings.rings().iter().map(|r| r.tint).collect();
        // The beat at 500 is evaluated before the chorus at 500 flips the mode on,
        // and the beat at 1000 before the chorus ending at 1000 flips it off.
        assert_eq!(tints, vec![RingTint::Neutral, RingTint::Neutral, RingTint::Palette(0)]);
        assert!(!tracker.is_colorful());

        let source = Fixture {
            beats: beats(&[(0.0, 500.0, 1), (600.0, 1_000.0, 2), (1_000.0, 1_500.0, 3)]),
            choruses: vec![Chorus { index: 0, start_time: 500.0, end_time: 1_200.0 }],
        };
        let mut tracker = BeatTracker::new(6);
        let mut progress = PlaybackProgress::default();
        let mut rings = RingField::default();
        for t in [0.0, 550.0, 600.0, 1_000.0, 1_300.0] {
            tick_at(&mut tracker, &mut progress, &source, &mut rings, t);
        }
        let tints: Vec<RingTint> = rings.rings().iter().map(|r| r.tint).collect();
        assert_eq!(
            tints,
            vec![
                RingTint::Neutral,
                RingTint::Neutral,
                RingTint::Palette(0),
                RingTint::Palette(1),
            ]
        );
    }

    #[test]
    fn test_recorded_fields_follow_position() {
        let source = Fixture::default();
        let mut tracker = BeatTracker::new(6);
        let mut progress = PlaybackProgress::default();
        let mut rings = RingField::default();
        tick_at(&mut tracker, &mut progress, &source, &mut rings, 42.0);
        assert_eq!(progress.volume, 0.25);
        assert_eq!(progress.chord, None);
        assert!(rings.is_empty());
    }
}
