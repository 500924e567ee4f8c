//! Folds one analyzed visit into a user profile.
//!
//! The tracker never mutates the profile it is given. It returns an updated
//! copy that the owning actor commits only if the rest of the visit (the
//! visit-log write) succeeds.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use tracing::debug;
use uuid::Uuid;

use super::model::{
    BehaviorPattern, ContentFormat, ContentPreference, EvolutionEntry, FocusShare, Interest,
    InteractionStyle,
    PatternSnapshot, PersonalityEstimate, PersonalityTrait, PreferenceCategory, SessionLength,
    TimeOfDay, UserProfile, PERSONALITY_BASELINE,
};
use crate::brain::{ContentAnalysis, Difficulty, Polarity};
use crate::config::TrackerConfig;
use crate::error::AppError;
use crate::models::{VisitContext, VisitRecord};
use crate::predict::EngagementPrediction;

/// Where a piece of interest evidence came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EvidenceSource {
    Keyword,
    Category,
}

impl EvidenceSource {
    fn as_str(&self) -> &'static str {
        match self {
            EvidenceSource::Keyword => "keyword",
            EvidenceSource::Category => "category",
        }
    }
}

#[derive(Debug, Clone)]
pub struct InterestTracker {
    config: TrackerConfig,
}

impl Default for InterestTracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl InterestTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Returns `profile` with interests, behavior patterns, preferences and
    /// personality updated for one visit.
    pub fn apply(
        &self,
        profile: &UserProfile,
        analysis: &ContentAnalysis,
        engagement: &EngagementPrediction,
        context: &VisitContext,
    ) -> Result<UserProfile, AppError> {
        if !engagement.score.is_finite() {
            return Err(AppError::Validation(format!(
                "Non-finite engagement score for {}",
                context.url
            )));
        }
        let score = engagement.score.clamp(0.0, 1.0);

        let mut updated = profile.clone();
        updated.visit_count += 1;
        updated.updated_at = context.timestamp;

        self.update_interests(&mut updated, analysis, score, context);
        self.update_behavior(&mut updated, analysis, context);
        self.update_preferences(&mut updated, analysis, context);
        self.update_personality(&mut updated, analysis, context);

        debug!(
            user_id = %updated.user_id,
            interests = updated.interests.len(),
            patterns = updated.behavior_patterns.len(),
            "Profile updated from visit"
        );
        Ok(updated)
    }

    fn update_interests(
        &self,
        profile: &mut UserProfile,
        analysis: &ContentAnalysis,
        engagement: f64,
        context: &VisitContext,
    ) {
        let cfg = &self.config;
        let evidence = self.evidence(analysis);
        let origin = context.domain.as_deref().unwrap_or(context.url.as_str());

        // Decay everything the visit did not mention
        profile.interests.retain(|topic, interest| {
            if evidence.contains_key(topic) {
                return true;
            }
            interest.strength = (interest.strength * cfg.interest_decay).max(0.0);
            interest.strength >= cfg.prune_floor
        });

        for (topic, (relevance, source)) in evidence {
            let entry = EvolutionEntry {
                timestamp: context.timestamp,
                strength: 0.0,
                context: format!("{}:{}", source.as_str(), origin),
            };
            match profile.interests.get_mut(&topic) {
                Some(interest) => {
                    interest.strength = (interest.strength * cfg.interest_decay
                        + engagement * relevance * cfg.reinforcement_rate)
                        .clamp(0.0, 1.0);
                    interest.last_updated = context.timestamp;
                    let strength = interest.strength;
                    interest.record(EvolutionEntry { strength, ..entry }, cfg.evolution_cap);
                }
                None => {
                    let factor = match source {
                        EvidenceSource::Keyword => cfg.keyword_initial_factor,
                        EvidenceSource::Category => cfg.category_initial_factor,
                    };
                    let mut interest = Interest::new(&topic, engagement * factor, context.timestamp);
                    let strength = interest.strength;
                    interest.record(EvolutionEntry { strength, ..entry }, cfg.evolution_cap);
                    profile.interests.insert(topic, interest);
                }
            }
        }

        if profile.interests.len() > cfg.max_interests {
            let keep: Vec<String> = profile
                .top_interests(cfg.max_interests)
                .into_iter()
                .map(|i| i.topic.clone())
                .collect();
            profile.interests.retain(|topic, _| keep.contains(topic));
        }
    }

    /// Keywords at keyword relevance, then the primary category, which wins on collision.
    fn evidence(&self, analysis: &ContentAnalysis) -> BTreeMap<String, (f64, EvidenceSource)> {
        let mut evidence = BTreeMap::new();
        if analysis.degraded {
            return evidence;
        }
        for keyword in &analysis.keywords {
            evidence.insert(
                keyword.word.to_lowercase(),
                (self.config.keyword_relevance, EvidenceSource::Keyword),
            );
        }
        if !analysis.category.is_general() {
            evidence.insert(
                analysis.category.primary.to_lowercase(),
                (self.config.category_relevance, EvidenceSource::Category),
            );
        }
        evidence
    }

    fn update_behavior(
        &self,
        profile: &mut UserProfile,
        analysis: &ContentAnalysis,
        context: &VisitContext,
    ) {
        let snapshot = PatternSnapshot {
            time_of_day: TimeOfDay::at(context.timestamp),
            session_length: SessionLength::from_dwell(context.dwell_time_secs),
            category: analysis.category.primary.clone(),
            complexity: analysis.readability.difficulty,
            format: ContentFormat::detect(&context.html),
            interaction_style: InteractionStyle::from_counts(&context.interactions),
        };

        let existing = if self.config.aggregate_behavior_patterns {
            let signature = snapshot.signature();
            profile
                .behavior_patterns
                .iter_mut()
                .find(|p| p.snapshot.signature() == signature)
        } else {
            None
        };

        match existing {
            Some(pattern) => {
                pattern.frequency += 1;
                pattern.last_seen = context.timestamp;
                pattern.add_context(context.domain.as_deref());
            }
            None => {
                let mut pattern = BehaviorPattern {
                    id: Uuid::new_v4().to_string(),
                    snapshot,
                    frequency: 1,
                    contexts: Default::default(),
                    strength: 0.0,
                    first_seen: context.timestamp,
                    last_seen: context.timestamp,
                };
                pattern.add_context(context.domain.as_deref());
                profile.behavior_patterns.push(pattern);
            }
        }

        if profile.behavior_patterns.len() > self.config.max_behavior_patterns {
            // Evict the least recently seen
            profile.behavior_patterns.sort_by_key(|p| std::cmp::Reverse(p.last_seen));
            profile
                .behavior_patterns
                .truncate(self.config.max_behavior_patterns);
        }

        refresh_pattern_strengths(profile);
    }

    fn update_preferences(
        &self,
        profile: &mut UserProfile,
        analysis: &ContentAnalysis,
        context: &VisitContext,
    ) {
        let cfg = &self.config;
        for category in PreferenceCategory::ALL {
            let observed = observe(category, analysis, context);
            match profile.preferences.get_mut(&category) {
                Some(pref) => {
                    let matched = if pref.preferred == observed { 1.0 } else { 0.0 };
                    pref.weight = (pref.weight * cfg.preference_momentum
                        + (1.0 - cfg.preference_momentum) * matched)
                        .clamp(0.0, 1.0);
                    if pref.weight < cfg.preference_switch_threshold {
                        pref.preferred = observed;
                        pref.weight = SEED_WEIGHT;
                    }
                    pref.confidence = (pref.confidence + cfg.preference_confidence_step).min(1.0);
                    pref.observations += 1;
                    pref.updated_at = context.timestamp;
                }
                None => {
                    profile.preferences.insert(
                        category,
                        ContentPreference {
                            category,
                            preferred: observed,
                            weight: SEED_WEIGHT,
                            confidence: cfg.preference_confidence_step.min(1.0),
                            observations: 1,
                            updated_at: context.timestamp,
                        },
                    );
                }
            }
        }
    }

    fn update_personality(
        &self,
        profile: &mut UserProfile,
        analysis: &ContentAnalysis,
        context: &VisitContext,
    ) {
        let cfg = &self.config;
        for personality_trait in PersonalityTrait::ALL {
            let target = (PERSONALITY_BASELINE + trait_delta(personality_trait, analysis, context))
                .clamp(0.0, 1.0);
            let estimate = profile
                .personality
                .entry(personality_trait)
                .or_insert_with(|| PersonalityEstimate::baseline(personality_trait));
            estimate.score = (estimate.score * cfg.personality_momentum
                + target * (1.0 - cfg.personality_momentum))
                .clamp(0.0, 1.0);
            estimate.confidence = (estimate.confidence + cfg.personality_confidence_step).min(1.0);
        }
    }
}

/// Result of one re-analysis pass over a profile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReanalysisSummary {
    pub stale_patterns: usize,
    pub compacted_entries: usize,
    pub focus_categories: usize,
}

impl InterestTracker {
    /// Periodic maintenance: pattern strengths, stale-pattern decay, evolution
    /// compaction and the recent-focus summary.
    ///
    /// Patterns not seen within `window` lose half their strength per further window.
    pub fn reanalyze(
        &self,
        profile: &mut UserProfile,
        recent_visits: &[VisitRecord],
        now: DateTime<Utc>,
        window: Duration,
    ) -> ReanalysisSummary {
        let mut summary = ReanalysisSummary::default();

        refresh_pattern_strengths(profile);
        let window_secs = window.num_seconds().max(1) as f64;
        for pattern in &mut profile.behavior_patterns {
            let overdue = (now - pattern.last_seen - window).num_seconds();
            if overdue > 0 {
                pattern.strength *= 0.5f64.powf(overdue as f64 / window_secs);
                summary.stale_patterns += 1;
            }
        }

        let cap = self.config.evolution_cap;
        let floor = self.config.prune_floor;
        for interest in profile.interests.values_mut() {
            while interest.evolution.len() > cap {
                interest.evolution.pop_front();
                summary.compacted_entries += 1;
            }
        }
        profile.interests.retain(|_, interest| interest.strength >= floor);

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for visit in recent_visits {
            *counts.entry(visit.category.as_str()).or_default() += 1;
        }
        let total = recent_visits.len().max(1) as f64;
        let mut focus: Vec<FocusShare> = counts
            .into_iter()
            .map(|(category, count)| FocusShare {
                category: category.to_string(),
                share: count as f64 / total,
            })
            .collect();
        focus.sort_by(|a, b| {
            b.share
                .partial_cmp(&a.share)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.category.cmp(&b.category))
        });
        summary.focus_categories = focus.len();
        profile.recent_focus = focus;

        summary
    }
}

/// Weight given to a preference on first observation and after migration.
const SEED_WEIGHT: f64 = 0.5;

/// Strength of each pattern as its share of all visits.
pub(crate) fn refresh_pattern_strengths(profile: &mut UserProfile) {
    let total = profile.visit_count.max(1) as f64;
    for pattern in &mut profile.behavior_patterns {
        pattern.strength = (pattern.frequency as f64 / total).clamp(0.0, 1.0);
    }
}

fn observe(category: PreferenceCategory, analysis: &ContentAnalysis, context: &VisitContext) -> String {
    let html = &context.html;
    let value = match category {
        PreferenceCategory::Format => ContentFormat::detect(html).as_str(),
        PreferenceCategory::Length => match analysis.word_count {
            0..=299 => "short",
            300..=1199 => "medium",
            _ => "long",
        },
        PreferenceCategory::Complexity => analysis.readability.difficulty.label(),
        PreferenceCategory::VisualRichness => match html.images + html.videos {
            0 => "text_only",
            1..=5 => "moderate",
            _ => "rich",
        },
        PreferenceCategory::Interactivity => {
            if html.forms > 0 || html.buttons > 3 || context.interactions.key_presses > 0 {
                "interactive"
            } else {
                "static"
            }
        }
    };
    value.to_string()
}

/// Additive deviation from the 0.5 baseline that one visit suggests for a trait.
fn trait_delta(
    personality_trait: PersonalityTrait,
    analysis: &ContentAnalysis,
    context: &VisitContext,
) -> f64 {
    let category = analysis.category.primary.as_str();
    let sentiment = &analysis.sentiment;
    let dwell = context.dwell_time_secs;

    match personality_trait {
        PersonalityTrait::Openness => {
            let mut delta = match category {
                "science" | "technology" | "education" => 0.2,
                "travel" | "food" | "entertainment" => 0.1,
                _ => 0.0,
            };
            if analysis.readability.difficulty == Difficulty::Hard {
                delta += 0.1;
            }
            delta
        }
        PersonalityTrait::Conscientiousness => {
            let mut delta = match category {
                "business" | "finance" | "education" => 0.2,
                _ => 0.0,
            };
            if dwell >= 120.0 && context.scroll_depth >= 0.8 {
                delta += 0.15;
            } else if dwell < 10.0 {
                delta -= 0.1;
            }
            delta
        }
        PersonalityTrait::Extraversion => {
            let mut delta = match category {
                "sports" | "entertainment" | "politics" => 0.15,
                _ => 0.0,
            };
            if context.interactions.clicks >= 10 {
                delta += 0.1;
            }
            delta
        }
        PersonalityTrait::Agreeableness => match sentiment.label {
            Polarity::Positive => 0.15 * sentiment.intensity.max(0.5),
            Polarity::Negative => -0.1 * sentiment.intensity.max(0.5),
            Polarity::Neutral => 0.0,
        },
        PersonalityTrait::Neuroticism => match sentiment.label {
            Polarity::Negative => 0.2 * sentiment.intensity.max(0.5),
            Polarity::Positive => -0.05,
            Polarity::Neutral => 0.0,
        },
    }
}
