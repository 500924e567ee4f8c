//! Read-side personalization: suggestions and interface settings derived
//! from a profile snapshot. Nothing here mutates the profile.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::mood::MoodSample;
use crate::profile::{
    ContentPreference, PersonalityTrait, PreferenceCategory, TimeOfDay, UserProfile,
};

const OPENNESS_THRESHOLD: f64 = 0.7;
const CONSCIENTIOUSNESS_THRESHOLD: f64 = 0.7;
const NEUROTICISM_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestSummary {
    pub topic: String,
    pub strength: f64,
    pub trending: bool,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Interest,
    Pattern,
    Contextual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub title: String,
    pub reason: String,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityLevel {
    Simple,
    Standard,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InformationDensity {
    Sparse,
    Balanced,
    Dense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutStyle {
    Freeform,
    Organized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorScheme {
    Default,
    Calming,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceSettings {
    pub complexity: ComplexityLevel,
    pub information_density: InformationDensity,
    pub interaction_style: LayoutStyle,
    pub color_scheme: ColorScheme,
}

impl Default for InterfaceSettings {
    fn default() -> Self {
        Self {
            complexity: ComplexityLevel::Standard,
            information_density: InformationDensity::Balanced,
            interaction_style: LayoutStyle::Freeform,
            color_scheme: ColorScheme::Default,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalizedContent {
    pub user_id: String,
    pub generated_at: DateTime<Utc>,
    pub top_interests: Vec<InterestSummary>,
    pub preferences: BTreeMap<PreferenceCategory, ContentPreference>,
    pub suggestions: Vec<Suggestion>,
    pub interface: InterfaceSettings,
    pub current_mood: Option<MoodSample>,
    pub personality: BTreeMap<PersonalityTrait, f64>,
}

#[derive(Debug, Clone)]
pub struct Recommender {
    top_n: usize,
    max_suggestions: usize,
}

impl Default for Recommender {
    fn default() -> Self {
        Self::new(5, 10)
    }
}

impl Recommender {
    pub fn new(top_n: usize, max_suggestions: usize) -> Self {
        Self {
            top_n,
            max_suggestions,
        }
    }

    pub fn recommend(&self, profile: &UserProfile, now: DateTime<Utc>) -> PersonalizedContent {
        let top_interests = profile
            .top_interests(self.top_n)
            .into_iter()
            .map(|i| InterestSummary {
                topic: i.topic.clone(),
                strength: i.strength,
                trending: i.is_trending(),
                last_updated: i.last_updated,
            })
            .collect::<Vec<_>>();

        PersonalizedContent {
            user_id: profile.user_id.clone(),
            generated_at: now,
            suggestions: self.suggestions(profile, &top_interests, now),
            top_interests,
            preferences: profile.preferences.clone(),
            interface: interface_settings(profile),
            current_mood: profile.current_mood().cloned(),
            personality: profile
                .personality
                .iter()
                .map(|(t, estimate)| (*t, estimate.score))
                .collect(),
        }
    }

    fn suggestions(
        &self,
        profile: &UserProfile,
        top_interests: &[InterestSummary],
        now: DateTime<Utc>,
    ) -> Vec<Suggestion> {
        let mut suggestions = Vec::new();

        for interest in top_interests {
            let boost = if interest.trending { 0.1 } else { 0.0 };
            suggestions.push(Suggestion {
                kind: SuggestionKind::Interest,
                title: format!("More about {}", interest.topic),
                reason: if interest.trending {
                    format!("Your interest in {} is growing", interest.topic)
                } else {
                    format!("You often read about {}", interest.topic)
                },
                score: (interest.strength + boost).min(1.0),
            });
        }

        let mut patterns: Vec<_> = profile.behavior_patterns.iter().collect();
        patterns.sort_by(|a, b| {
            b.strength
                .partial_cmp(&a.strength)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.snapshot.signature().cmp(&b.snapshot.signature()))
        });

        let current = TimeOfDay::at(now);
        for pattern in patterns.iter().take(self.top_n) {
            let snapshot = &pattern.snapshot;
            suggestions.push(Suggestion {
                kind: SuggestionKind::Pattern,
                title: format!("{} {} content", snapshot.category, snapshot.format.as_str()),
                reason: format!("Seen {} times", pattern.frequency),
                score: pattern.strength * 0.8,
            });
            if snapshot.time_of_day == current {
                suggestions.push(Suggestion {
                    kind: SuggestionKind::Contextual,
                    title: format!("{} for the {}", snapshot.category, current.as_str()),
                    reason: format!("You usually read {} in the {}", snapshot.category, current.as_str()),
                    score: pattern.strength * 0.9,
                });
            }
        }

        suggestions.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.title.cmp(&b.title))
        });
        let mut seen = Vec::new();
        suggestions.retain(|s| {
            if seen.contains(&s.title) {
                false
            } else {
                seen.push(s.title.clone());
                true
            }
        });
        suggestions.truncate(self.max_suggestions);
        suggestions
    }
}

/// Personality-driven interface adjustments. Neuroticism overrides density.
pub fn interface_settings(profile: &UserProfile) -> InterfaceSettings {
    let mut settings = InterfaceSettings::default();

    if profile.personality_score(PersonalityTrait::Openness) > OPENNESS_THRESHOLD {
        settings.complexity = ComplexityLevel::Advanced;
        settings.information_density = InformationDensity::Dense;
    }
    if profile.personality_score(PersonalityTrait::Conscientiousness) > CONSCIENTIOUSNESS_THRESHOLD {
        settings.interaction_style = LayoutStyle::Organized;
    }
    if profile.personality_score(PersonalityTrait::Neuroticism) > NEUROTICISM_THRESHOLD {
        settings.color_scheme = ColorScheme::Calming;
        settings.information_density = InformationDensity::Sparse;
    }

    settings
}
