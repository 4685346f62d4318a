use bevy::log::info;

use crate::file::settings::TimelineSettings;
use crate::sync::metadata::{PartOfSpeech, Phrase};

#[derive(Debug, Clone, PartialEq)]
pub struct LyricWord {
    pub text: String,
    pub pos: PartOfSpeech,
    pub start_time: f64,
    pub end_time: f64,
    /// Width in world units, one per character.
    pub len: f64,
    pub visible: bool,
    /// Horizontal centre. Negative infinity when the word has nothing to chain from.
    pub x: f64,
}

impl LyricWord {
    pub fn is_emphasized(&self) -> bool {
        self.pos.is_emphasized()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LyricLine {
    pub words: Vec<LyricWord>,
    /// Shared y and z offset that separates overlapping lines.
    pub depth: f32,
}

/// Lines of words laid out along the x axis as playback advances.
#[derive(Debug, Clone, Default)]
pub struct LyricLayout {
    lines: Vec<LyricLine>,
}

impl LyricLayout {
    pub fn build(phrases: &[Phrase], settings: &TimelineSettings) -> Self {
        let cycle = settings.line_cycle.max(1);
        let lines = phrases
            .iter()
            .enumerate()
            .map(|(line_idx, phrase)| {
                let words: Vec<LyricWord> = phrase
                    .words
                    .iter()
                    .take_while(|word| word.start_time < phrase.end_time)
                    .map(|word| LyricWord {
                        text: word.text.clone(),
                        pos: word.pos,
                        start_time: word.start_time,
                        end_time: word.end_time,
                        len: word.text_len() as f64,
                        visible: false,
                        x: 0.0,
                    })
                    .collect();

                let tagged: Vec<String> = words
                    .iter()
                    .map(|word| format!("{}({:?})", word.text, word.pos))
                    .collect();
                info!("{}: \"{}\"", phrase.start_time, tagged.join(" "));

                LyricLine {
                    words,
                    depth: (line_idx % cycle) as f32 - 1.0,
                }
            })
            .collect();

        Self { lines }
    }

    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    pub fn word_count(&self) -> usize {
        self.lines.iter().map(|line| line.words.len()).sum()
    }

    /// Recomputes visibility and position of every word for `progress`.
    ///
    /// A line leader's left edge sits at `(start - progress) * speed + offset`.
    /// Every later word is butted against the previous one, so a line moves as
    /// one rigid body and only the leader's timing matters.
    pub fn update(&mut self, progress: f64, settings: &TimelineSettings) {
        for line in &mut self.lines {
            let mut previous: Option<(bool, f64, f64)> = None;
            for word in &mut line.words {
                word.visible = word.start_time < progress
                    && word.end_time < progress + settings.visibility_window_ms;

                if word.visible {
                    let left_edge = match previous {
                        None => (word.start_time - progress) * settings.speed_factor + settings.lead_offset,
                        Some((true, x, len)) => x + len / 2.0,
                        Some((false, _, _)) => f64::NEG_INFINITY,
                    };
                    word.x = left_edge + word.len / 2.0;
                }

                previous = Some((word.visible, word.x, word.len));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::metadata::Word;

    fn word(text: &str, start_time: f64, end_time: f64) -> Word {
        Word {
            index: 0,
            text: text.to_string(),
            pos: PartOfSpeech::X,
            start_time,
            end_time,
            chars: Vec::new(),
        }
    }

    fn phrase(start_time: f64, end_time: f64, words: Vec<Word>) -> Phrase {
        Phrase { index: 0, start_time, end_time, words }
    }

    fn settings() -> TimelineSettings {
        TimelineSettings::default()
    }

    #[test]
    fn test_build_starts_invisible_and_cycles_depth() {
        let phrases: Vec<Phrase> = (0..4)
            .map(|i| phrase(i as f64 * 1_000.0, i as f64 * 1_000.0 + 900.0, vec![word("a", i as f64 * 1_000.0, i as f64 * 1_000.0 + 100.0)]))
            .collect();
        let layout = LyricLayout::build(&phrases, &settings());
        let depths: Vec<f32> = layout.lines().iter().map(|line| line.depth).collect();
        assert_eq!(depths, vec![-1.0, 0.0, 1.0, -1.0]);
        assert!(layout.lines().iter().flat_map(|l| &l.words).all(|w| !w.visible));
    }

    #[test]
    fn test_build_stops_at_words_past_phrase_end() {
        let phrases = vec![phrase(0.0, 1_000.0, vec![word("in", 0.0, 500.0), word("out", 1_000.0, 1_500.0), word("late", 1_200.0, 1_300.0)])];
        let layout = LyricLayout::build(&phrases, &settings());
        assert_eq!(layout.word_count(), 1);
    }

    #[test]
    fn test_visibility_window_examples() {
        let phrases = vec![
            phrase(0.0, 300_000.0, vec![word("past", 3_000.0, 4_000.0)]),
            phrase(0.0, 300_000.0, vec![word("long", 3_000.0, 210_000.0)]),
            phrase(0.0, 300_000.0, vec![word("soon", 6_000.0, 7_000.0)]),
            phrase(0.0, 300_000.0, vec![word("edge", 3_000.0, 205_000.0)]),
        ];
        let mut layout = LyricLayout::build(&phrases, &settings());
        layout.update(5_000.0, &settings());
        let visible: Vec<bool> = layout.lines().iter().map(|l| l.words[0].visible).collect();
        assert_eq!(visible, vec![true, false, false, false]);
    }

    #[test]
    fn test_followers_chain_off_leader_regardless_of_timing() {
        let phrases = vec![phrase(
            0.0,
            10_000.0,
            vec![word("one", 1_000.0, 1_500.0), word("to", 1_100.0, 1_200.0), word("three", 1_200.0, 9_000.0)],
        )];
        let mut layout = LyricLayout::build(&phrases, &settings());
        layout.update(2_000.0, &settings());

        let words = &layout.lines()[0].words;
        let leader_x = (1_000.0 - 2_000.0) * 0.005 + 10.0 + 3.0 / 2.0;
        assert!((words[0].x - leader_x).abs() < 1e-9);
        assert!((words[1].x - (words[0].x + 3.0 / 2.0 + 2.0 / 2.0)).abs() < 1e-9);
        assert!((words[2].x - (words[1].x + 2.0 / 2.0 + 5.0 / 2.0)).abs() < 1e-9);

        // Moving a follower's own start time does not move it.
        let phrases = vec![phrase(
            0.0,
            10_000.0,
            vec![word("one", 1_000.0, 1_500.0), word("to", 1_900.0, 1_950.0), word("three", 1_950.0, 9_000.0)],
        )];
        let mut shifted = LyricLayout::build(&phrases, &settings());
        shifted.update(2_000.0, &settings());
        assert_eq!(shifted.lines()[0].words[1].x, words[1].x);
    }

    #[test]
    fn test_leader_drifts_left_as_progress_advances() {
        let phrases = vec![phrase(0.0, 10_000.0, vec![word("go", 1_000.0, 2_000.0)])];
        let mut layout = LyricLayout::build(&phrases, &settings());
        layout.update(2_000.0, &settings());
        let before = layout.lines()[0].words[0].x;
        layout.update(3_000.0, &settings());
        let after = layout.lines()[0].words[0].x;
        assert!((before - after - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_follower_of_hidden_word_goes_off_screen() {
        let phrases = vec![phrase(
            0.0,
            500_000.0,
            vec![word("far", 1_000.0, 400_000.0), word("near", 1_100.0, 1_200.0)],
        )];
        let mut layout = LyricLayout::build(&phrases, &settings());
        layout.update(2_000.0, &settings());
        let words = &layout.lines()[0].words;
        assert!(!words[0].visible);
        assert!(words[1].visible);
        assert_eq!(words[1].x, f64::NEG_INFINITY);
    }

    #[test]
    fn test_future_words_stay_hidden() {
        let phrases = vec![phrase(0.0, 10_000.0, vec![word("later", 6_000.0, 7_000.0)])];
        let mut layout = LyricLayout::build(&phrases, &settings());
        layout.update(6_000.0, &settings());
        assert!(!layout.lines()[0].words[0].visible);
        layout.update(6_001.0, &settings());
        assert!(layout.lines()[0].words[0].visible);
    }
}
