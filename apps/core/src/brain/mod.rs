//! # Brain Module
//!
//! Fast, table-driven content analysis for Attune.
//! Turns a page visit into structured features BEFORE anything touches the profile.
//!
//! ## Components
//! - `category`: Category classification against an ordered keyword table
//! - `language`: Stopword-incidence language detection
//! - `readability`: Flesch reading ease and Flesch-Kincaid grade
//! - `keywords`: TF-IDF keyword extraction, part-of-speech tags and topics
//! - `entities`: Regex/gazetteer named-entity extraction
//! - `sentiment`: Lexicon sentiment with negation handling
//! - `content_analysis`: Output data structure
//! - `analyzer`: Main orchestrator

pub mod analyzer;
pub mod category;
pub mod content_analysis;
pub mod entities;
pub mod keywords;
pub mod language;
pub mod readability;
pub mod sentiment;

pub use analyzer::ContentAnalyzer;
pub use category::{CategoryClassifier, CATEGORY_TABLE};
pub use content_analysis::{
    CategoryResult, CategoryScore, ContentAnalysis, Difficulty, Entities, Language,
    LanguageResult, Polarity, Readability, Sentiment, GENERAL_CATEGORY,
};
pub use entities::EntityExtractor;
pub use keywords::{Keyword, KeywordExtractor, PartOfSpeech, Topic};
pub use language::LanguageDetector;
pub use readability::ReadabilityScorer;
pub use sentiment::SentimentAnalyzer;
