//! Readability scoring.
//!
//! Flesch Reading Ease and Flesch-Kincaid grade level, with syllables
//! counted by a vowel-group heuristic.

use super::content_analysis::{Difficulty, Readability};
use super::keywords::{split_sentences, split_words};

/// Reading-ease score at or above which text counts as easy
pub const EASY_THRESHOLD: f64 = 70.0;
/// Reading-ease score at or below which text counts as hard
pub const HARD_THRESHOLD: f64 = 30.0;

/// Readability scorer for text analysis
#[derive(Debug, Default, Clone, Copy)]
pub struct ReadabilityScorer;

impl ReadabilityScorer {
    pub fn new() -> Self {
        Self
    }

    /// Count syllables in a word: one per group of consecutive vowels
    /// (`y` included), minus a trailing silent `e`, never less than one.
    pub fn count_syllables(&self, word: &str) -> usize {
        let lower = word.to_lowercase();
        let mut groups = 0;
        let mut previous_was_vowel = false;

        for c in lower.chars() {
            let vowel = matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
            if vowel && !previous_was_vowel {
                groups += 1;
            }
            previous_was_vowel = vowel;
        }

        if groups > 1 && lower.ends_with('e') && !lower.ends_with("le") {
            groups -= 1;
        }

        groups.max(1)
    }

    /// Map a reading-ease score to its bucket
    pub fn difficulty(score: f64) -> Difficulty {
        if score >= EASY_THRESHOLD {
            Difficulty::Easy
        } else if score <= HARD_THRESHOLD {
            Difficulty::Hard
        } else {
            Difficulty::Medium
        }
    }

    /// Analyze text and return readability metrics
    pub fn analyze(&self, text: &str) -> Readability {
        let words: Vec<&str> = split_words(text)
            .filter(|w| w.chars().any(|c| c.is_alphabetic()))
            .collect();

        if words.is_empty() {
            return Readability {
                score: 0.0,
                grade_level: 0.0,
                difficulty: Difficulty::Medium,
                sentence_count: 0,
                word_count: 0,
                syllable_count: 0,
            };
        }

        // At least one sentence if there's any text
        let sentence_count = split_sentences(text)
            .filter(|s| split_words(s).next().is_some())
            .count()
            .max(1);
        let word_count = words.len();
        let syllable_count: usize = words.iter().map(|w| self.count_syllables(w)).sum();

        let avg_sentence_length = word_count as f64 / sentence_count as f64;
        let avg_syllables_per_word = syllable_count as f64 / word_count as f64;

        let score = 206.835 - 1.015 * avg_sentence_length - 84.6 * avg_syllables_per_word;
        let grade_level = 0.39 * avg_sentence_length + 11.8 * avg_syllables_per_word - 15.59;

        Readability {
            score,
            grade_level,
            difficulty: Self::difficulty(score),
            sentence_count,
            word_count,
            syllable_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syllable_heuristic() {
        let scorer = ReadabilityScorer::new();
        assert_eq!(scorer.count_syllables("cat"), 1);
        assert_eq!(scorer.count_syllables("away"), 2);
        assert_eq!(scorer.count_syllables("quickly"), 2);
        assert_eq!(scorer.count_syllables("there"), 1);
        assert_eq!(scorer.count_syllables("table"), 2);
        assert_eq!(scorer.count_syllables("readability"), 5);
        assert_eq!(scorer.count_syllables("rhythm"), 1);
    }

    #[test]
    fn test_simple_text_is_easy() {
        let scorer = ReadabilityScorer::new();
        let metrics = scorer.analyze("The dog ran. The cat sat. We had fun.");
        assert_eq!(metrics.sentence_count, 3);
        assert_eq!(metrics.difficulty, Difficulty::Easy);
    }

    #[test]
    fn test_dense_text_is_hard() {
        let scorer = ReadabilityScorer::new();
        let text = "Institutional heterogeneity notwithstanding, macroeconomic \
                    stabilization necessitates comprehensive intergovernmental \
                    coordination regarding international monetary liberalization";
        let metrics = scorer.analyze(text);
        assert_eq!(metrics.difficulty, Difficulty::Hard);
        assert!(metrics.grade_level > 12.0);
    }

    #[test]
    fn test_empty_text() {
        let metrics = ReadabilityScorer::new().analyze("");
        assert_eq!(metrics.word_count, 0);
        assert_eq!(metrics.score, 0.0);
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(ReadabilityScorer::difficulty(70.0), Difficulty::Easy);
        assert_eq!(ReadabilityScorer::difficulty(69.9), Difficulty::Medium);
        assert_eq!(ReadabilityScorer::difficulty(30.0), Difficulty::Hard);
        assert_eq!(ReadabilityScorer::difficulty(30.1), Difficulty::Medium);
    }
}
