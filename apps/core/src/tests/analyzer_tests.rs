//! Analyzer and Predictor Tests
//!
//! Properties of the pure pipeline stages: reproducible output, the
//! readability formula and the low-confidence fallback.

use super::fixtures::{analyze, t0, tech_visit, visit, TECH_TEXT};
use crate::brain::{ContentAnalyzer, Difficulty, ReadabilityScorer, GENERAL_CATEGORY};
use crate::models::VisitContext;
use crate::predict::{EmotionPredictor, EngagementPredictor};

#[cfg(test)]
mod determinism_tests {
    use super::*;

    #[test]
    fn test_identical_input_serializes_identically() {
        let page = tech_visit(t0());
        let first = serde_json::to_string(&ContentAnalyzer::new().analyze_visit(&page)).unwrap();
        let second = serde_json::to_string(&ContentAnalyzer::new().analyze_visit(&page)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_visit_time_does_not_leak_into_analysis() {
        let morning = analyze(&tech_visit(t0()));
        let later = analyze(&tech_visit(t0() + chrono::Duration::days(30)));
        assert_eq!(morning, later);
    }

    #[test]
    fn test_repeated_runs_keep_keyword_order() {
        let analyzer = ContentAnalyzer::new();
        let reference = analyzer.analyze("u", "", TECH_TEXT).keywords;
        for _ in 0..20 {
            assert_eq!(analyzer.analyze("u", "", TECH_TEXT).keywords, reference);
        }
    }
}

#[cfg(test)]
mod readability_tests {
    use super::*;

    #[test]
    fn test_single_sentence_flesch_score() {
        // 1 sentence, 10 words, 12 syllables
        let text = "The happy dog ran to the park and sat today.";
        let metrics = ReadabilityScorer::new().analyze(text);

        assert_eq!(metrics.sentence_count, 1);
        assert_eq!(metrics.word_count, 10);
        assert_eq!(metrics.syllable_count, 12);
        assert!((metrics.score - 95.165).abs() < 1e-6, "score = {}", metrics.score);
        assert_eq!(metrics.difficulty, Difficulty::Easy);
    }

    #[test]
    fn test_analyzer_reports_same_readability() {
        let text = "The happy dog ran to the park and sat today.";
        let analysis = ContentAnalyzer::new().analyze("u", "", text);
        assert_eq!(analysis.readability, ReadabilityScorer::new().analyze(text));
    }
}

#[cfg(test)]
mod fallback_tests {
    use super::*;

    #[test]
    fn test_empty_page_is_general_and_neutral() {
        let page = visit("https://blank.example/", "", t0());
        let analysis = analyze(&page);

        assert!(analysis.degraded);
        assert_eq!(analysis.category.primary, GENERAL_CATEGORY);
        assert!(analysis.category.confidence <= 0.3);

        let prediction =
            EngagementPredictor::new().predict(&analysis, &VisitContext::from(&page), 0.9, t0());
        assert_eq!(prediction.score, 0.5);
        assert!(prediction.factors.is_empty());
    }

    #[test]
    fn test_whitespace_and_symbols_fall_back() {
        for text in ["   \n\t ", "#### 1234 ----", "🙂🙂🙂"] {
            let analysis = ContentAnalyzer::new().analyze("u", "", text);
            assert!(analysis.degraded, "expected fallback for {:?}", text);
            assert_eq!(analysis.category.primary, GENERAL_CATEGORY);
        }
    }

    #[test]
    fn test_emotion_of_empty_page_has_no_dominant() {
        let analysis = analyze(&visit("https://blank.example/", "", t0()));
        let emotion = EmotionPredictor::new().predict("", &analysis.sentiment);
        assert!(emotion.dominant.is_none());
    }
}

#[cfg(test)]
mod pipeline_tests {
    use super::*;

    #[test]
    fn test_technology_page_end_to_end() {
        let page = tech_visit(t0());
        let analysis = analyze(&page);
        assert!(!analysis.degraded);
        assert_eq!(analysis.category.primary, "technology");
        assert!(analysis.keywords.iter().any(|k| k.word == "developer"));

        let prediction =
            EngagementPredictor::new().predict(&analysis, &VisitContext::from(&page), 0.0, t0());
        assert!((0.0..=1.0).contains(&prediction.score));
        assert_eq!(prediction.factors.len(), 7);
        assert!(prediction.confidence > 0.1);
    }
}
