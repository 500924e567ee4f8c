//! Lexicon-based sentiment scoring with simple negation handling.

use super::content_analysis::{Polarity, Sentiment};
use super::keywords::split_words;

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "amazing", "awesome", "wonderful", "fantastic", "love",
    "loved", "best", "happy", "success", "successful", "win", "wins", "won", "beautiful",
    "brilliant", "positive", "improve", "improved", "benefit", "gain", "gains", "growth",
    "breakthrough", "celebrate", "enjoy", "helpful", "impressive", "innovative", "perfect",
    "strong", "hope", "hopeful", "exciting", "delight", "recommend", "safe", "recovery",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "terrible", "awful", "horrible", "worst", "hate", "hated", "poor", "fail",
    "failed", "failure", "loss", "losses", "crisis", "danger", "dangerous", "sad", "angry",
    "negative", "decline", "crash", "problem", "problems", "risk", "threat", "war", "death",
    "died", "killed", "attack", "scandal", "fraud", "broken", "weak", "worse", "disaster",
    "collapse", "fear", "pain", "warning",
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "without", "hardly", "isn't", "wasn't", "don't", "doesn't", "didn't",
    "can't", "won't", "nor",
];

/// Polarity magnitude below which the label is neutral
const NEUTRAL_BAND: f64 = 0.1;

#[derive(Debug, Default, Clone, Copy)]
pub struct SentimentAnalyzer;

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, text: &str) -> Sentiment {
        let words: Vec<String> = split_words(text).map(|w| w.to_lowercase()).collect();
        if words.is_empty() {
            return Sentiment::neutral();
        }

        let mut positive = 0.0f64;
        let mut negative = 0.0f64;

        for (index, word) in words.iter().enumerate() {
            let value = if POSITIVE_WORDS.contains(&word.as_str()) {
                1.0
            } else if NEGATIVE_WORDS.contains(&word.as_str()) {
                -1.0
            } else {
                continue;
            };

            // A negation within the previous two words flips the polarity
            let negated = words[index.saturating_sub(2)..index]
                .iter()
                .any(|w| NEGATIONS.contains(&w.as_str()));
            let value = if negated { -value } else { value };

            if value > 0.0 {
                positive += value;
            } else {
                negative -= value;
            }
        }

        let opinionated = positive + negative;
        if opinionated == 0.0 {
            return Sentiment::neutral();
        }

        let polarity = ((positive - negative) / opinionated).clamp(-1.0, 1.0);
        // Density of opinion words, saturating at one in ten
        let intensity = (opinionated / words.len() as f64 * 10.0).min(1.0);
        let label = if polarity.abs() < NEUTRAL_BAND {
            Polarity::Neutral
        } else if polarity > 0.0 {
            Polarity::Positive
        } else {
            Polarity::Negative
        };

        Sentiment {
            polarity,
            intensity,
            label,
        }
    }
}
