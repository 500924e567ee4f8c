//! The user profile aggregate and its parts.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::str::FromStr;

use crate::brain::{ContentAnalysis, Difficulty};
use crate::error::AppError;
use crate::models::{HtmlSummary, InteractionCounts};
use crate::mood::MoodSample;

/// Strength velocity above which an interest counts as trending.
pub const TRENDING_VELOCITY: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionEntry {
    pub timestamp: DateTime<Utc>,
    pub strength: f64,
    /// What reinforced the interest (`keyword` or `category`) and where
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interest {
    pub topic: String,
    pub strength: f64,
    pub evolution: VecDeque<EvolutionEntry>,
    pub last_updated: DateTime<Utc>,
}

impl Interest {
    pub fn new(topic: &str, strength: f64, at: DateTime<Utc>) -> Self {
        Self {
            topic: topic.to_string(),
            strength: strength.clamp(0.0, 1.0),
            evolution: VecDeque::new(),
            last_updated: at,
        }
    }

    /// Appends to the evolution ring buffer, evicting the oldest entry past `cap`.
    pub fn record(&mut self, entry: EvolutionEntry, cap: usize) {
        self.evolution.push_back(entry);
        while self.evolution.len() > cap {
            self.evolution.pop_front();
        }
    }

    /// Strength change across the evolution window.
    pub fn velocity(&self) -> f64 {
        match (self.evolution.front(), self.evolution.back()) {
            (Some(first), Some(last)) if self.evolution.len() > 1 => last.strength - first.strength,
            _ => 0.0,
        }
    }

    pub fn is_trending(&self) -> bool {
        self.velocity() > TRENDING_VELOCITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Night,
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Afternoon,
            17..=21 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }

    pub fn at(timestamp: DateTime<Utc>) -> Self {
        Self::from_hour(timestamp.hour())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Night => "night",
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionLength {
    Glance,
    Short,
    Medium,
    Long,
}

impl SessionLength {
    pub fn from_dwell(secs: f64) -> Self {
        if secs < 15.0 {
            SessionLength::Glance
        } else if secs < 60.0 {
            SessionLength::Short
        } else if secs < 300.0 {
            SessionLength::Medium
        } else {
            SessionLength::Long
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionLength::Glance => "glance",
            SessionLength::Short => "short",
            SessionLength::Medium => "medium",
            SessionLength::Long => "long",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentFormat {
    Video,
    Code,
    Gallery,
    Interactive,
    Article,
    Text,
}

impl ContentFormat {
    /// Dominant format from the page structure, checked in declaration order.
    pub fn detect(html: &HtmlSummary) -> Self {
        if html.videos > 0 {
            ContentFormat::Video
        } else if html.code_blocks >= 2 {
            ContentFormat::Code
        } else if html.images >= 6 && html.images > html.paragraphs {
            ContentFormat::Gallery
        } else if html.forms > 0 || html.buttons >= 5 {
            ContentFormat::Interactive
        } else if html.headings > 0 || html.paragraphs >= 3 {
            ContentFormat::Article
        } else {
            ContentFormat::Text
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentFormat::Video => "video",
            ContentFormat::Code => "code",
            ContentFormat::Gallery => "gallery",
            ContentFormat::Interactive => "interactive",
            ContentFormat::Article => "article",
            ContentFormat::Text => "text",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionStyle {
    Passive,
    Scanner,
    Clicker,
    Typist,
}

impl InteractionStyle {
    pub fn from_counts(counts: &InteractionCounts) -> Self {
        if counts.total() == 0 {
            return InteractionStyle::Passive;
        }
        let (clicks, scrolls, keys) = (counts.clicks, counts.scrolls, counts.key_presses);
        if keys >= clicks && keys >= scrolls {
            InteractionStyle::Typist
        } else if clicks >= scrolls {
            InteractionStyle::Clicker
        } else {
            InteractionStyle::Scanner
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionStyle::Passive => "passive",
            InteractionStyle::Scanner => "scanner",
            InteractionStyle::Clicker => "clicker",
            InteractionStyle::Typist => "typist",
        }
    }
}

/// What a single visit looked like, behaviorally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatternSnapshot {
    pub time_of_day: TimeOfDay,
    pub session_length: SessionLength,
    pub category: String,
    pub complexity: Difficulty,
    pub format: ContentFormat,
    pub interaction_style: InteractionStyle,
}

impl PatternSnapshot {
    /// Key identical snapshots are aggregated under.
    pub fn signature(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}",
            self.time_of_day.as_str(),
            self.session_length.as_str(),
            self.category,
            self.complexity.label(),
            self.format.as_str(),
            self.interaction_style.as_str()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorPattern {
    pub id: String,
    pub snapshot: PatternSnapshot,
    pub frequency: u64,
    /// Most recent distinct domains the pattern was seen on
    pub contexts: VecDeque<String>,
    pub strength: f64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// Maximum number of domains remembered per pattern.
pub const PATTERN_CONTEXT_CAP: usize = 10;

impl BehaviorPattern {
    pub fn add_context(&mut self, domain: Option<&str>) {
        let Some(domain) = domain else {
            return;
        };
        self.contexts.retain(|d| d != domain);
        self.contexts.push_back(domain.to_string());
        while self.contexts.len() > PATTERN_CONTEXT_CAP {
            self.contexts.pop_front();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceCategory {
    Format,
    Length,
    Complexity,
    VisualRichness,
    Interactivity,
}

impl PreferenceCategory {
    pub const ALL: [PreferenceCategory; 5] = [
        PreferenceCategory::Format,
        PreferenceCategory::Length,
        PreferenceCategory::Complexity,
        PreferenceCategory::VisualRichness,
        PreferenceCategory::Interactivity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PreferenceCategory::Format => "format",
            PreferenceCategory::Length => "length",
            PreferenceCategory::Complexity => "complexity",
            PreferenceCategory::VisualRichness => "visual_richness",
            PreferenceCategory::Interactivity => "interactivity",
        }
    }
}

impl fmt::Display for PreferenceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PreferenceCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| AppError::Validation(format!("Unknown preference category: {}", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPreference {
    pub category: PreferenceCategory,
    pub preferred: String,
    /// Moving average of how often the preferred value is observed
    pub weight: f64,
    pub confidence: f64,
    pub observations: u64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonalityTrait {
    Openness,
    Conscientiousness,
    Extraversion,
    Agreeableness,
    Neuroticism,
}

impl PersonalityTrait {
    pub const ALL: [PersonalityTrait; 5] = [
        PersonalityTrait::Openness,
        PersonalityTrait::Conscientiousness,
        PersonalityTrait::Extraversion,
        PersonalityTrait::Agreeableness,
        PersonalityTrait::Neuroticism,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PersonalityTrait::Openness => "openness",
            PersonalityTrait::Conscientiousness => "conscientiousness",
            PersonalityTrait::Extraversion => "extraversion",
            PersonalityTrait::Agreeableness => "agreeableness",
            PersonalityTrait::Neuroticism => "neuroticism",
        }
    }
}

impl fmt::Display for PersonalityTrait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PersonalityTrait {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| AppError::Validation(format!("Unknown personality trait: {}", s)))
    }
}

/// Neutral starting score of every trait.
pub const PERSONALITY_BASELINE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalityEstimate {
    #[serde(rename = "trait")]
    pub personality_trait: PersonalityTrait,
    pub score: f64,
    pub confidence: f64,
}

impl PersonalityEstimate {
    pub fn baseline(personality_trait: PersonalityTrait) -> Self {
        Self {
            personality_trait,
            score: PERSONALITY_BASELINE,
            confidence: 0.0,
        }
    }
}

/// Share of recent visits that fell into one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusShare {
    pub category: String,
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub interests: BTreeMap<String, Interest>,
    pub behavior_patterns: Vec<BehaviorPattern>,
    pub preferences: BTreeMap<PreferenceCategory, ContentPreference>,
    pub personality: BTreeMap<PersonalityTrait, PersonalityEstimate>,
    pub mood_history: VecDeque<MoodSample>,
    pub recent_focus: Vec<FocusShare>,
    pub visit_count: u64,
    pub interaction_count: u64,
    /// Interactions recorded since the retraining hook last fired
    pub interactions_since_retrain: u64,
}

impl UserProfile {
    /// A fresh profile: no interests, every personality trait at baseline.
    pub fn new(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            created_at: now,
            updated_at: now,
            interests: BTreeMap::new(),
            behavior_patterns: Vec::new(),
            preferences: BTreeMap::new(),
            personality: PersonalityTrait::ALL
                .into_iter()
                .map(|t| (t, PersonalityEstimate::baseline(t)))
                .collect(),
            mood_history: VecDeque::new(),
            recent_focus: Vec::new(),
            visit_count: 0,
            interaction_count: 0,
            interactions_since_retrain: 0,
        }
    }

    pub fn interest_strength(&self, topic: &str) -> f64 {
        self.interests
            .get(&topic.to_lowercase())
            .map(|i| i.strength)
            .unwrap_or(0.0)
    }

    /// Interests ranked by strength, ties broken by topic.
    pub fn top_interests(&self, n: usize) -> Vec<&Interest> {
        let mut ranked: Vec<&Interest> = self.interests.values().collect();
        ranked.sort_by(|a, b| {
            b.strength
                .partial_cmp(&a.strength)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.topic.cmp(&b.topic))
        });
        ranked.truncate(n);
        ranked
    }

    pub fn personality_score(&self, personality_trait: PersonalityTrait) -> f64 {
        self.personality
            .get(&personality_trait)
            .map(|p| p.score)
            .unwrap_or(PERSONALITY_BASELINE)
    }

    /// How well this content matches existing interests, in `[0, 1]`.
    ///
    /// Weighted 0.6 on the category interest and 0.4 on the mean strength of
    /// the keywords the profile already tracks.
    pub fn relevance_to(&self, analysis: &ContentAnalysis) -> f64 {
        if analysis.degraded {
            return 0.0;
        }
        let category = self.interest_strength(&analysis.category.primary);
        let known: Vec<f64> = analysis
            .keywords
            .iter()
            .filter_map(|k| self.interests.get(&k.word.to_lowercase()))
            .map(|i| i.strength)
            .collect();
        let keywords = if known.is_empty() {
            0.0
        } else {
            known.iter().sum::<f64>() / known.len() as f64
        };
        (0.6 * category + 0.4 * keywords).clamp(0.0, 1.0)
    }

    pub fn current_mood(&self) -> Option<&MoodSample> {
        self.mood_history.back()
    }

    /// Appends a mood sample, evicting the oldest past `cap`.
    pub fn push_mood(&mut self, sample: MoodSample, cap: usize) {
        self.mood_history.push_back(sample);
        while self.mood_history.len() > cap {
            self.mood_history.pop_front();
        }
    }

    /// Drops mood samples, behavior patterns and evolution entries older than `cutoff`.
    pub fn forget_before(&mut self, cutoff: DateTime<Utc>) -> ForgetReport {
        let moods = self.mood_history.len();
        self.mood_history.retain(|m| m.timestamp >= cutoff);

        let patterns = self.behavior_patterns.len();
        self.behavior_patterns.retain(|p| p.last_seen >= cutoff);

        let mut evolution_entries = 0;
        for interest in self.interests.values_mut() {
            let before = interest.evolution.len();
            interest.evolution.retain(|e| e.timestamp >= cutoff);
            evolution_entries += before - interest.evolution.len();
        }

        ForgetReport {
            mood_samples: moods - self.mood_history.len(),
            patterns: patterns - self.behavior_patterns.len(),
            evolution_entries,
        }
    }
}

/// What `UserProfile::forget_before` removed from memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForgetReport {
    pub mood_samples: usize,
    pub patterns: usize,
    pub evolution_entries: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::ContentAnalyzer;
    use crate::mood::{BehaviorMetrics, MoodLabel};

    #[test]
    fn test_new_profile_has_baseline_personality() {
        let profile = UserProfile::new("u1", Utc::now());
        assert_eq!(profile.personality.len(), 5);
        assert!(profile
            .personality
            .values()
            .all(|p| p.score == 0.5 && p.confidence == 0.0));
        assert!(profile.interests.is_empty());
    }

    #[test]
    fn test_evolution_is_capped() {
        let now = Utc::now();
        let mut interest = Interest::new("rust", 0.1, now);
        for i in 0..30 {
            interest.record(
                EvolutionEntry {
                    timestamp: now,
                    strength: i as f64 / 100.0,
                    context: "keyword".to_string(),
                },
                20,
            );
        }
        assert_eq!(interest.evolution.len(), 20);
        assert_eq!(interest.evolution.front().map(|e| e.strength), Some(0.10));
        assert!(interest.is_trending());
    }

    #[test]
    fn test_top_interests_ties_by_topic() {
        let now = Utc::now();
        let mut profile = UserProfile::new("u1", now);
        for (topic, strength) in [("zeta", 0.5), ("alpha", 0.5), ("mid", 0.7)] {
            profile
                .interests
                .insert(topic.to_string(), Interest::new(topic, strength, now));
        }
        let top: Vec<&str> = profile.top_interests(3).iter().map(|i| i.topic.as_str()).collect();
        assert_eq!(top, vec!["mid", "alpha", "zeta"]);
    }

    #[test]
    fn test_mood_history_is_fifo() {
        let now = Utc::now();
        let mut profile = UserProfile::new("u1", now);
        for i in 0..60 {
            profile.push_mood(
                MoodSample::new(
                    now + chrono::Duration::seconds(i),
                    MoodLabel::Neutral,
                    0.4,
                    BehaviorMetrics::default(),
                ),
                50,
            );
        }
        assert_eq!(profile.mood_history.len(), 50);
        assert_eq!(
            profile.mood_history.front().map(|m| m.timestamp),
            Some(now + chrono::Duration::seconds(10))
        );
    }

    #[test]
    fn test_forget_before_trims_history() {
        let now = Utc::now();
        let old = now - chrono::Duration::days(40);
        let mut profile = UserProfile::new("u1", now);
        let mut interest = Interest::new("rust", 0.3, now);
        for at in [old, now] {
            interest.record(
                EvolutionEntry {
                    timestamp: at,
                    strength: 0.3,
                    context: "keyword".to_string(),
                },
                20,
            );
        }
        profile.interests.insert("rust".to_string(), interest);
        for at in [old, old, now] {
            profile.push_mood(
                MoodSample::new(at, MoodLabel::Relaxed, 0.6, BehaviorMetrics::default()),
                50,
            );
        }

        let report = profile.forget_before(now - chrono::Duration::days(30));
        assert_eq!(report.mood_samples, 2);
        assert_eq!(report.evolution_entries, 1);
        assert_eq!(profile.mood_history.len(), 1);
        // the interest itself survives
        assert!(profile.interests.contains_key("rust"));
    }

    #[test]
    fn test_relevance_uses_category_interest() {
        let now = Utc::now();
        let mut profile = UserProfile::new("u1", now);
        profile
            .interests
            .insert("technology".to_string(), Interest::new("technology", 1.0, now));
        let analysis = ContentAnalyzer::new().analyze(
            "u",
            "",
            "The software team deployed the server code to the cloud.",
        );
        assert!((profile.relevance_to(&analysis) - 0.6).abs() < 1e-9);
        assert_eq!(profile.relevance_to(&ContentAnalysis::fallback("u")), 0.0);
    }

    #[test]
    fn test_signature_distinguishes_snapshots() {
        let a = PatternSnapshot {
            time_of_day: TimeOfDay::from_hour(9),
            session_length: SessionLength::from_dwell(30.0),
            category: "technology".to_string(),
            complexity: Difficulty::Medium,
            format: ContentFormat::detect(&HtmlSummary::default()),
            interaction_style: InteractionStyle::from_counts(&InteractionCounts::default()),
        };
        let mut b = a.clone();
        assert_eq!(a.signature(), b.signature());
        b.time_of_day = TimeOfDay::Evening;
        assert_ne!(a.signature(), b.signature());
        assert_eq!(a.signature(), "morning|short|technology|medium|text|passive");
    }
}
