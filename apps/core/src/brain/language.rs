//! Language detection by stopword incidence.

use super::content_analysis::{Language, LanguageResult};
use super::keywords::split_words;

const ENGLISH_MARKERS: &[&str] = &[
    "the", "and", "is", "are", "was", "were", "of", "to", "in", "that", "it", "with", "for",
    "this", "have", "from", "you", "not", "but", "what",
];

const FRENCH_MARKERS: &[&str] = &[
    "le", "la", "les", "un", "une", "des", "du", "et", "est", "sont", "pour", "dans", "avec",
    "que", "qui", "pas", "sur", "nous", "vous", "cette",
];

const SPANISH_MARKERS: &[&str] = &[
    "el", "los", "las", "una", "y", "es", "son", "para", "con", "que", "por", "del", "pero",
    "como", "esta", "este", "muy", "sus", "también", "porque",
];

const GERMAN_MARKERS: &[&str] = &[
    "der", "die", "das", "und", "ist", "sind", "nicht", "mit", "ein", "eine", "für", "auf",
    "den", "dem", "von", "zu", "auch", "sich", "wir", "ich",
];

/// Checked in this order; earlier entries win ties
const LANGUAGES: &[(Language, &[&str])] = &[
    (Language::English, ENGLISH_MARKERS),
    (Language::French, FRENCH_MARKERS),
    (Language::Spanish, SPANISH_MARKERS),
    (Language::German, GERMAN_MARKERS),
];

#[derive(Debug, Default, Clone, Copy)]
pub struct LanguageDetector;

impl LanguageDetector {
    pub fn new() -> Self {
        Self
    }

    /// Detect the dominant language. Defaults to English with low confidence.
    pub fn detect(&self, text: &str) -> LanguageResult {
        let words: Vec<String> = split_words(text).map(|w| w.to_lowercase()).collect();
        if words.is_empty() {
            return LanguageResult {
                primary: Language::English,
                confidence: 0.1,
            };
        }

        let counts: Vec<(Language, usize)> = LANGUAGES
            .iter()
            .map(|(language, markers)| {
                let hits = words
                    .iter()
                    .filter(|w| markers.contains(&w.as_str()))
                    .count();
                (*language, hits)
            })
            .collect();

        let total: usize = counts.iter().map(|(_, hits)| hits).sum();
        let mut best = (Language::English, 0usize);
        for &(language, hits) in &counts {
            if hits > best.1 {
                best = (language, hits);
            }
        }

        if total == 0 {
            return LanguageResult {
                primary: Language::English,
                confidence: 0.2,
            };
        }

        // Share of marker hits, damped for very short inputs
        let share = best.1 as f64 / total as f64;
        let coverage = (total as f64 / 5.0).min(1.0);
        LanguageResult {
            primary: best.0,
            confidence: (share * coverage).clamp(0.0, 1.0),
        }
    }
}
