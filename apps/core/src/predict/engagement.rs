//! Engagement prediction.
//!
//! A fixed-weight linear combination of seven factors, each in `[0, 1]`:
//!
//! | factor             | weight |
//! |--------------------|--------|
//! | content quality    | 0.25   |
//! | readability        | 0.15   |
//! | media richness     | 0.15   |
//! | interactivity      | 0.10   |
//! | personal relevance | 0.20   |
//! | timeliness         | 0.10   |
//! | social signals     | 0.05   |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::brain::ContentAnalysis;
use crate::models::VisitContext;

pub const CONTENT_QUALITY: &str = "content_quality";
pub const READABILITY: &str = "readability";
pub const MEDIA_RICHNESS: &str = "media_richness";
pub const INTERACTIVITY: &str = "interactivity";
pub const PERSONAL_RELEVANCE: &str = "personal_relevance";
pub const TIMELINESS: &str = "timeliness";
pub const SOCIAL_SIGNALS: &str = "social_signals";

const WEIGHTS: [(&str, f64); 7] = [
    (CONTENT_QUALITY, 0.25),
    (READABILITY, 0.15),
    (MEDIA_RICHNESS, 0.15),
    (INTERACTIVITY, 0.10),
    (PERSONAL_RELEVANCE, 0.20),
    (TIMELINESS, 0.10),
    (SOCIAL_SIGNALS, 0.05),
];

/// Score returned for degraded (empty-text) analyses.
pub const NEUTRAL_SCORE: f64 = 0.5;
const DEGRADED_CONFIDENCE: f64 = 0.1;

const HIGH_THRESHOLD: f64 = 0.7;
const MEDIUM_THRESHOLD: f64 = 0.4;

/// Flesch score the readability factor peaks at.
const IDEAL_READING_EASE: f64 = 65.0;
const TIMELINESS_HALF_LIFE_DAYS: f64 = 7.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementBucket {
    Low,
    Medium,
    High,
}

impl EngagementBucket {
    pub fn from_score(score: f64) -> Self {
        if score >= HIGH_THRESHOLD {
            EngagementBucket::High
        } else if score >= MEDIUM_THRESHOLD {
            EngagementBucket::Medium
        } else {
            EngagementBucket::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementFactor {
    pub name: String,
    pub value: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementPrediction {
    pub score: f64,
    pub factors: Vec<EngagementFactor>,
    pub bucket: EngagementBucket,
    pub confidence: f64,
}

impl EngagementPrediction {
    /// Value of a named factor, if present
    pub fn factor(&self, name: &str) -> Option<f64> {
        self.factors.iter().find(|f| f.name == name).map(|f| f.value)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EngagementPredictor;

impl EngagementPredictor {
    pub fn new() -> Self {
        Self
    }

    /// Predict engagement for one visit.
    ///
    /// `relevance` is the profile's relevance to this content, `now` anchors timeliness.
    pub fn predict(
        &self,
        analysis: &ContentAnalysis,
        context: &VisitContext,
        relevance: f64,
        now: DateTime<Utc>,
    ) -> EngagementPrediction {
        if analysis.degraded {
            return EngagementPrediction {
                score: NEUTRAL_SCORE,
                factors: vec![],
                bucket: EngagementBucket::from_score(NEUTRAL_SCORE),
                confidence: DEGRADED_CONFIDENCE,
            };
        }

        let values = [
            content_quality(analysis, context),
            readability(analysis),
            media_richness(context),
            interactivity(context),
            relevance,
            timeliness(context, now),
            social_signals(context),
        ];

        self.combine(&values, telemetry_confidence(context))
    }

    fn combine(&self, values: &[f64; 7], confidence: f64) -> EngagementPrediction {
        let factors: Vec<EngagementFactor> = WEIGHTS
            .iter()
            .zip(values.iter())
            .map(|(&(name, weight), &value)| EngagementFactor {
                name: name.to_string(),
                value: unit_or_zero(value),
                weight,
            })
            .collect();

        let score = factors
            .iter()
            .map(|f| f.value * f.weight)
            .sum::<f64>()
            .clamp(0.0, 1.0);

        EngagementPrediction {
            score,
            bucket: EngagementBucket::from_score(score),
            factors,
            confidence,
        }
    }
}

/// Missing or non-finite factors contribute nothing
fn unit_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn content_quality(analysis: &ContentAnalysis, context: &VisitContext) -> f64 {
    let length = (analysis.word_count as f64 / 600.0).min(1.0);
    let html = &context.html;
    let structure = 0.5 * (html.headings as f64 / 3.0).min(1.0)
        + 0.5 * (html.paragraphs as f64 / 10.0).min(1.0);
    0.4 * length + 0.3 * structure + 0.3 * analysis.category.confidence
}

fn readability(analysis: &ContentAnalysis) -> f64 {
    if analysis.readability.word_count == 0 {
        return 0.0;
    }
    1.0 - (analysis.readability.score - IDEAL_READING_EASE).abs() / IDEAL_READING_EASE
}

fn media_richness(context: &VisitContext) -> f64 {
    let html = &context.html;
    (html.images as f64 * 0.1 + html.videos as f64 * 0.35 + html.code_blocks as f64 * 0.15)
        .min(1.0)
}

fn interactivity(context: &VisitContext) -> f64 {
    let html = &context.html;
    let layout =
        (html.forms as f64 * 0.3 + html.buttons as f64 * 0.05 + html.links as f64 * 0.01).min(1.0);
    let observed = (context.interactions.total() as f64 / 20.0).min(1.0);
    0.5 * layout + 0.5 * observed
}

fn timeliness(context: &VisitContext, now: DateTime<Utc>) -> f64 {
    let Some(published) = context.signals.published_at else {
        return 0.0;
    };
    let age_days = (now - published).num_seconds() as f64 / 86_400.0;
    if age_days <= 0.0 {
        return 1.0;
    }
    0.5f64.powf(age_days / TIMELINESS_HALF_LIFE_DAYS)
}

fn social_signals(context: &VisitContext) -> f64 {
    let signals = &context.signals;
    if signals.shares.is_none() && signals.comments.is_none() {
        return 0.0;
    }
    let total = signals.shares.unwrap_or(0) + 2 * signals.comments.unwrap_or(0);
    ((1.0 + total as f64).ln() / 1001f64.ln()).min(1.0)
}

/// More dwell time and deeper scrolling mean the telemetry says more
fn telemetry_confidence(context: &VisitContext) -> f64 {
    let dwell = (context.dwell_time_secs / 60.0).min(1.0);
    (0.2 + 0.4 * dwell + 0.4 * context.scroll_depth).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::ContentAnalyzer;
    use crate::models::{ContentSignals, HtmlSummary, InteractionCounts};
    use chrono::Duration;

    fn context(now: DateTime<Utc>) -> VisitContext {
        VisitContext {
            url: "https://example.com/a".to_string(),
            domain: Some("example.com".to_string()),
            title: String::new(),
            timestamp: now,
            dwell_time_secs: 30.0,
            scroll_depth: 0.5,
            interactions: InteractionCounts::default(),
            html: HtmlSummary::default(),
            signals: ContentSignals::default(),
        }
    }

    #[test]
    fn test_degraded_analysis_is_neutral() {
        let now = Utc::now();
        let analysis = ContentAnalysis::fallback("u");
        let prediction = EngagementPredictor::new().predict(&analysis, &context(now), 0.9, now);
        assert_eq!(prediction.score, 0.5);
        assert_eq!(prediction.bucket, EngagementBucket::Medium);
        assert!(prediction.confidence < 0.2);
    }

    #[test]
    fn test_non_finite_relevance_counts_as_zero() {
        let now = Utc::now();
        let analysis = ContentAnalyzer::new().analyze("u", "", "The software team shipped code.");
        let prediction =
            EngagementPredictor::new().predict(&analysis, &context(now), f64::NAN, now);
        assert_eq!(prediction.factor(PERSONAL_RELEVANCE), Some(0.0));
        assert!(prediction.score.is_finite());
        assert!((0.0..=1.0).contains(&prediction.score));
    }

    #[test]
    fn test_weights_sum_to_one() {
        let total: f64 = WEIGHTS.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_all_factors_at_max_is_one() {
        let prediction = EngagementPredictor::new().combine(&[1.0; 7], 1.0);
        assert!((prediction.score - 1.0).abs() < 1e-9);
        assert_eq!(prediction.bucket, EngagementBucket::High);
    }

    #[test]
    fn test_fresh_content_is_timely() {
        let now = Utc::now();
        let mut ctx = context(now);
        assert_eq!(timeliness(&ctx, now), 0.0);

        ctx.signals.published_at = Some(now - Duration::days(7));
        assert!((timeliness(&ctx, now) - 0.5).abs() < 1e-6);

        ctx.signals.published_at = Some(now + Duration::hours(1));
        assert_eq!(timeliness(&ctx, now), 1.0);
    }

    #[test]
    fn test_relevance_raises_score() {
        let now = Utc::now();
        let analysis = ContentAnalyzer::new().analyze(
            "u",
            "Cloud software",
            "The software developer team moved the server code to the cloud.",
        );
        let predictor = EngagementPredictor::new();
        let low = predictor.predict(&analysis, &context(now), 0.0, now);
        let high = predictor.predict(&analysis, &context(now), 1.0, now);
        assert!((high.score - low.score - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_buckets() {
        assert_eq!(EngagementBucket::from_score(0.7), EngagementBucket::High);
        assert_eq!(EngagementBucket::from_score(0.4), EngagementBucket::Medium);
        assert_eq!(EngagementBucket::from_score(0.39), EngagementBucket::Low);
    }
}
