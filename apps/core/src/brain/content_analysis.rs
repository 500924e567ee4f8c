//! Content Analysis - Output structure of the content analyzer.
//!
//! Everything here is derived purely from a page visit. No timestamps or
//! timings are recorded so identical input serializes to identical bytes.

use serde::{Deserialize, Serialize};

use super::keywords::Keyword;
use super::keywords::Topic;

/// Category assigned when nothing else matches.
pub const GENERAL_CATEGORY: &str = "general";

/// Detected language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    French,
    Spanish,
    German,
}

impl Language {
    /// Returns the ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::French => "fr",
            Language::Spanish => "es",
            Language::German => "de",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageResult {
    pub primary: Language,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: String,
    pub hits: usize,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub primary: String,
    pub confidence: f64,
    pub hits: usize,
    pub alternatives: Vec<CategoryScore>,
}

impl CategoryResult {
    pub fn general(confidence: f64) -> Self {
        Self {
            primary: GENERAL_CATEGORY.to_string(),
            confidence,
            hits: 0,
            alternatives: vec![],
        }
    }

    pub fn is_general(&self) -> bool {
        self.primary == GENERAL_CATEGORY
    }
}

/// Readability bucket derived from the Flesch reading-ease score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Readability {
    /// Flesch reading ease (higher is easier)
    pub score: f64,
    /// Flesch-Kincaid grade level
    pub grade_level: f64,
    pub difficulty: Difficulty,
    pub sentence_count: usize,
    pub word_count: usize,
    pub syllable_count: usize,
}

/// Sentiment polarity label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negative,
    Neutral,
}

impl Polarity {
    pub fn label(&self) -> &'static str {
        match self {
            Polarity::Positive => "positive",
            Polarity::Negative => "negative",
            Polarity::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    /// -1.0 (negative) to 1.0 (positive)
    pub polarity: f64,
    /// 0.0 - 1.0
    pub intensity: f64,
    pub label: Polarity,
}

impl Sentiment {
    pub fn neutral() -> Self {
        Self {
            polarity: 0.0,
            intensity: 0.0,
            label: Polarity::Neutral,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entities {
    pub people: Vec<String>,
    pub places: Vec<String>,
    pub organizations: Vec<String>,
    pub dates: Vec<String>,
}

impl Entities {
    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
            && self.places.is_empty()
            && self.organizations.is_empty()
            && self.dates.is_empty()
    }
}

/// Complete content analysis of one page visit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentAnalysis {
    pub url: String,
    pub category: CategoryResult,
    pub language: LanguageResult,
    pub readability: Readability,
    /// Ranked topics, at most 10
    pub topics: Vec<Topic>,
    /// Ranked keywords, at most 15
    pub keywords: Vec<Keyword>,
    pub sentiment: Sentiment,
    pub entities: Entities,
    pub word_count: usize,
    /// Set when the input was empty or unusable and defaults were returned
    pub degraded: bool,
}

impl ContentAnalysis {
    /// The low-confidence default used for empty or malformed input
    pub fn fallback(url: &str) -> Self {
        Self {
            url: url.to_string(),
            category: CategoryResult::general(0.1),
            language: LanguageResult {
                primary: Language::English,
                confidence: 0.1,
            },
            readability: Readability {
                score: 0.0,
                grade_level: 0.0,
                difficulty: Difficulty::Medium,
                sentence_count: 0,
                word_count: 0,
                syllable_count: 0,
            },
            topics: vec![],
            keywords: vec![],
            sentiment: Sentiment::neutral(),
            entities: Entities::default(),
            word_count: 0,
            degraded: true,
        }
    }

    /// Get a summary for logging
    pub fn summary(&self) -> String {
        format!(
            "Category: {} ({:.0}%), Keywords: {}, Readability: {:.1} ({}), Sentiment: {}",
            self.category.primary,
            self.category.confidence * 100.0,
            self.keywords.len(),
            self.readability.score,
            self.readability.difficulty.label(),
            self.sentiment.label.label(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_defaults() {
        let analysis = ContentAnalysis::fallback("https://x.y");
        assert!(analysis.degraded);
        assert_eq!(analysis.category.primary, GENERAL_CATEGORY);
        assert!(analysis.category.confidence <= 0.3);
        assert_eq!(analysis.language.primary, Language::English);
        assert_eq!(analysis.sentiment.label, Polarity::Neutral);
    }

    #[test]
    fn test_language_codes() {
        assert_eq!(Language::English.code(), "en");
        assert_eq!(Language::French.code(), "fr");
        assert_eq!(Language::Spanish.code(), "es");
        assert_eq!(Language::German.code(), "de");
    }

    #[test]
    fn test_summary() {
        let summary = ContentAnalysis::fallback("u").summary();
        assert!(summary.contains("Category: general"));
        assert!(summary.contains("Keywords: 0"));
    }
}
