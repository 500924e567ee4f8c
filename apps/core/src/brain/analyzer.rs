//! Content Analyzer - Main orchestrator for the brain module.
//!
//! Coordinates category classification, language detection, readability,
//! keyword/topic extraction, entity extraction and sentiment scoring.
//!
//! The analyzer is a total function: empty or unusable input yields
//! `ContentAnalysis::fallback` instead of an error.

use tracing::debug;

use super::category::CategoryClassifier;
use super::content_analysis::ContentAnalysis;
use super::entities::EntityExtractor;
use super::keywords::KeywordExtractor;
use super::language::LanguageDetector;
use super::readability::ReadabilityScorer;
use super::sentiment::SentimentAnalyzer;
use crate::models::PageVisit;

/// Main content analyzer that orchestrates all analysis components
pub struct ContentAnalyzer {
    category_classifier: CategoryClassifier,
    language_detector: LanguageDetector,
    readability_scorer: ReadabilityScorer,
    keyword_extractor: KeywordExtractor,
    entity_extractor: EntityExtractor,
    sentiment_analyzer: SentimentAnalyzer,
}

impl Default for ContentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentAnalyzer {
    /// Create a new analyzer with the fixed heuristic tables
    pub fn new() -> Self {
        Self {
            category_classifier: CategoryClassifier::new(),
            language_detector: LanguageDetector::new(),
            readability_scorer: ReadabilityScorer::new(),
            keyword_extractor: KeywordExtractor::new(),
            entity_extractor: EntityExtractor::new(),
            sentiment_analyzer: SentimentAnalyzer::new(),
        }
    }

    /// Analyze a page visit
    pub fn analyze_visit(&self, visit: &PageVisit) -> ContentAnalysis {
        self.analyze(&visit.url, &visit.title, &visit.text)
    }

    /// Analyze raw page text and title
    pub fn analyze(&self, url: &str, title: &str, text: &str) -> ContentAnalysis {
        if text.trim().is_empty() || !text.chars().any(|c| c.is_alphabetic()) {
            debug!(url, "Empty or non-textual page, using fallback analysis");
            return ContentAnalysis::fallback(url);
        }

        // The title is scored alongside the body for classification and keywords
        let combined = if title.trim().is_empty() {
            text.to_string()
        } else {
            format!("{}.\n{}", title.trim(), text)
        };

        // 1. Keywords (nouns/verbs) drive category scoring
        let keywords = self.keyword_extractor.extract(&combined);
        let content_words = self.keyword_extractor.content_words(&combined);

        // 2. Category
        let category = self.category_classifier.classify(&content_words);

        // 3. Language
        let language = self.language_detector.detect(text);

        // 4. Readability (body only)
        let readability = self.readability_scorer.analyze(text);

        // 5. Entities, then topics (entities feed topics)
        let entities = self.entity_extractor.extract(&combined);
        let topics = self
            .keyword_extractor
            .extract_topics(text, title, &keywords, &entities);

        // 6. Sentiment
        let sentiment = self.sentiment_analyzer.analyze(text);

        let analysis = ContentAnalysis {
            url: url.to_string(),
            category,
            language,
            word_count: readability.word_count,
            readability,
            topics,
            keywords,
            sentiment,
            entities,
            degraded: false,
        };

        debug!(url, summary = %analysis.summary(), "Content analyzed");
        analysis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::content_analysis::{Difficulty, Polarity, GENERAL_CATEGORY};

    #[test]
    fn test_basic_analysis() {
        let analyzer = ContentAnalyzer::new();
        let analysis = analyzer.analyze(
            "https://dev.blog/rust",
            "Shipping software in Rust",
            "Our developer team rewrote the server software in Rust. The code is faster and the \
             cloud bill dropped. We love the result.",
        );

        assert_eq!(analysis.category.primary, "technology");
        assert!(analysis.category.confidence >= 0.99);
        assert!(!analysis.keywords.is_empty());
        assert_eq!(analysis.sentiment.label, Polarity::Positive);
        assert!(!analysis.degraded);
    }

    #[test]
    fn test_empty_text_falls_back() {
        let analysis = ContentAnalyzer::new().analyze("https://x", "A title", "   ");
        assert!(analysis.degraded);
        assert_eq!(analysis.category.primary, GENERAL_CATEGORY);
        assert!(analysis.category.confidence <= 0.3);
    }

    #[test]
    fn test_symbols_only_falls_back() {
        let analysis = ContentAnalyzer::new().analyze("https://x", "", "12 34 !!! ---");
        assert!(analysis.degraded);
    }

    #[test]
    fn test_easy_text_bucket() {
        let analysis = ContentAnalyzer::new().analyze("u", "", "The dog ran. The cat sat. We had fun.");
        assert_eq!(analysis.readability.difficulty, Difficulty::Easy);
    }

    #[test]
    fn test_caps_are_respected() {
        let text = (0..200)
            .map(|i| format!("topic{}word alpha{}beta", i, i))
            .collect::<Vec<_>>()
            .join(". ");
        let analysis = ContentAnalyzer::new().analyze("u", "", &text);
        assert!(analysis.keywords.len() <= 15);
        assert!(analysis.topics.len() <= 10);
    }
}
