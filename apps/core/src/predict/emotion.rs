//! Emotional tone from eight fixed emotion lexicons.

use serde::{Deserialize, Serialize};

use crate::brain::keywords::split_words;
use crate::brain::{Polarity, Sentiment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Joy,
    Trust,
    Fear,
    Surprise,
    Sadness,
    Disgust,
    Anger,
    Anticipation,
}

impl Emotion {
    pub fn name(&self) -> &'static str {
        match self {
            Emotion::Joy => "joy",
            Emotion::Trust => "trust",
            Emotion::Fear => "fear",
            Emotion::Surprise => "surprise",
            Emotion::Sadness => "sadness",
            Emotion::Disgust => "disgust",
            Emotion::Anger => "anger",
            Emotion::Anticipation => "anticipation",
        }
    }
}

/// Scored in this order; earlier lexicons win ties
const LEXICONS: &[(Emotion, &[&str])] = &[
    (
        Emotion::Joy,
        &["happy", "joy", "delight", "celebrate", "fun", "smile", "love", "cheer", "glad", "wonderful"],
    ),
    (
        Emotion::Trust,
        &["trust", "reliable", "safe", "secure", "honest", "proven", "loyal", "faith", "depend", "confident"],
    ),
    (
        Emotion::Fear,
        &["fear", "afraid", "scared", "threat", "danger", "risk", "panic", "terror", "worry", "anxious"],
    ),
    (
        Emotion::Surprise,
        &["surprise", "unexpected", "sudden", "shock", "astonishing", "amazing", "suddenly", "wow", "stunning", "unbelievable"],
    ),
    (
        Emotion::Sadness,
        &["sad", "grief", "loss", "mourn", "tragic", "lonely", "cry", "sorrow", "died", "miss"],
    ),
    (
        Emotion::Disgust,
        &["disgust", "gross", "vile", "corrupt", "nasty", "filthy", "rotten", "scandal", "awful", "repulsive"],
    ),
    (
        Emotion::Anger,
        &["anger", "angry", "rage", "furious", "outrage", "hate", "attack", "fight", "hostile", "blame"],
    ),
    (
        Emotion::Anticipation,
        &["expect", "soon", "upcoming", "plan", "future", "await", "launch", "prepare", "tomorrow", "next"],
    ),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionScore {
    pub emotion: Emotion,
    pub intensity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionProfile {
    /// One entry per emotion, in lexicon order
    pub scores: Vec<EmotionScore>,
    pub dominant: Option<Emotion>,
    pub tone: String,
}

impl EmotionProfile {
    pub fn intensity(&self, emotion: Emotion) -> f64 {
        self.scores
            .iter()
            .find(|s| s.emotion == emotion)
            .map(|s| s.intensity)
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EmotionPredictor;

impl EmotionPredictor {
    pub fn new() -> Self {
        Self
    }

    pub fn predict(&self, text: &str, sentiment: &Sentiment) -> EmotionProfile {
        let words: Vec<String> = split_words(text).map(|w| w.to_lowercase()).collect();

        let mut scores = Vec::with_capacity(LEXICONS.len());
        let mut dominant: Option<(Emotion, usize)> = None;

        for (emotion, lexicon) in LEXICONS {
            let hits = words
                .iter()
                .filter(|w| lexicon.contains(&w.as_str()))
                .count();
            let intensity = if words.is_empty() {
                0.0
            } else {
                (hits as f64 * 10.0 / words.len() as f64).min(1.0)
            };
            scores.push(EmotionScore {
                emotion: *emotion,
                intensity,
            });

            if hits > dominant.map(|(_, best)| best).unwrap_or(0) {
                dominant = Some((*emotion, hits));
            }
        }

        let dominant = dominant.map(|(emotion, _)| emotion);
        EmotionProfile {
            scores,
            tone: combined_tone(sentiment.label, dominant),
            dominant,
        }
    }
}

fn combined_tone(polarity: Polarity, dominant: Option<Emotion>) -> String {
    let Some(emotion) = dominant else {
        return polarity.label().to_string();
    };

    let named = match (polarity, emotion) {
        (Polarity::Positive, Emotion::Joy) => "joyful",
        (Polarity::Positive, Emotion::Trust) => "reassuring",
        (Polarity::Positive, Emotion::Surprise) => "delighted",
        (Polarity::Positive, Emotion::Anticipation) => "hopeful",
        (Polarity::Negative, Emotion::Fear) => "anxious",
        (Polarity::Negative, Emotion::Sadness) => "somber",
        (Polarity::Negative, Emotion::Disgust) => "repulsed",
        (Polarity::Negative, Emotion::Anger) => "hostile",
        (Polarity::Negative, Emotion::Surprise) => "shocking",
        (Polarity::Negative, Emotion::Anticipation) => "apprehensive",
        _ => return format!("{}_{}", polarity.label(), emotion.name()),
    };
    named.to_string()
}
