//! Mood inference from recent interaction telemetry.
//!
//! The classifier is stateless: it looks at a window of events and the time
//! of day and maps a few behavior metrics through fixed thresholds. The
//! window itself is owned by the profile actor.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::config::MoodConfig;
use crate::error::AppError;
use crate::models::{InteractionEvent, InteractionKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodLabel {
    Focused,
    Impatient,
    Exploring,
    Productive,
    Relaxed,
    Neutral,
    Distracted,
    InsufficientData,
}

impl MoodLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoodLabel::Focused => "focused",
            MoodLabel::Impatient => "impatient",
            MoodLabel::Exploring => "exploring",
            MoodLabel::Productive => "productive",
            MoodLabel::Relaxed => "relaxed",
            MoodLabel::Neutral => "neutral",
            MoodLabel::Distracted => "distracted",
            MoodLabel::InsufficientData => "insufficient_data",
        }
    }
}

impl fmt::Display for MoodLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MoodLabel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "focused" => Ok(MoodLabel::Focused),
            "impatient" => Ok(MoodLabel::Impatient),
            "exploring" => Ok(MoodLabel::Exploring),
            "productive" => Ok(MoodLabel::Productive),
            "relaxed" => Ok(MoodLabel::Relaxed),
            "neutral" => Ok(MoodLabel::Neutral),
            "distracted" => Ok(MoodLabel::Distracted),
            "insufficient_data" => Ok(MoodLabel::InsufficientData),
            other => Err(AppError::Validation(format!("Unknown mood label: {}", other))),
        }
    }
}

/// Metrics the mood was inferred from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BehaviorMetrics {
    pub event_count: usize,
    /// Mean gap between consecutive events, in seconds
    pub avg_gap_secs: f64,
    /// Coefficient of variation of the gaps
    pub gap_variation: f64,
    pub click_ratio: f64,
    pub scroll_ratio: f64,
    pub keyboard_ratio: f64,
    /// UTC hour, 0 - 23
    pub hour_of_day: u32,
    /// Days from Monday, 0 - 6
    pub weekday: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodSample {
    /// Unique per sample; several samples can share a timestamp.
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub mood: MoodLabel,
    pub confidence: f64,
    pub metrics: BehaviorMetrics,
}

impl MoodSample {
    pub fn new(
        timestamp: DateTime<Utc>,
        mood: MoodLabel,
        confidence: f64,
        metrics: BehaviorMetrics,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp,
            mood,
            confidence,
            metrics,
        }
    }
}

/// Recent interaction events, bounded by count and by age.
#[derive(Debug, Clone)]
pub struct InteractionWindow {
    events: VecDeque<InteractionEvent>,
    capacity: usize,
    max_age: Duration,
}

impl InteractionWindow {
    pub fn new(capacity: usize, max_age: Duration) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity.min(256)),
            capacity,
            max_age,
        }
    }

    pub fn from_config(config: &MoodConfig) -> Self {
        let secs = i64::try_from(config.window_secs).unwrap_or(i64::MAX);
        Self::new(config.window_capacity, Duration::seconds(secs))
    }

    pub fn push(&mut self, event: InteractionEvent) {
        self.events.push_back(event);
        while self.events.len() > self.capacity {
            self.events.pop_front();
        }
    }

    /// Drops events older than the window's age bound, relative to `now`.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.max_age;
        self.events.retain(|e| e.timestamp >= cutoff);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events in timestamp order
    pub fn snapshot(&self) -> Vec<InteractionEvent> {
        let mut events: Vec<InteractionEvent> = self.events.iter().cloned().collect();
        events.sort_by_key(|e| e.timestamp);
        events
    }
}

#[derive(Debug, Clone)]
pub struct MoodClassifier {
    min_events: usize,
}

impl Default for MoodClassifier {
    fn default() -> Self {
        Self::new(&MoodConfig::default())
    }
}

impl MoodClassifier {
    pub fn new(config: &MoodConfig) -> Self {
        Self {
            min_events: config.min_events,
        }
    }

    /// Classify the current mood from events sorted by timestamp.
    pub fn infer(&self, events: &[InteractionEvent], now: DateTime<Utc>) -> MoodSample {
        let metrics = BehaviorMetrics::compute(events, now);

        if metrics.event_count < self.min_events {
            return MoodSample::new(now, MoodLabel::InsufficientData, 0.0, metrics);
        }

        let (mood, base) = classify(&metrics);
        // Small windows say less
        let sample_factor = 0.5 + 0.5 * (metrics.event_count as f64 / 20.0).min(1.0);

        MoodSample::new(
            now,
            mood,
            (base * sample_factor).clamp(0.0, 1.0),
            metrics,
        )
    }
}

impl BehaviorMetrics {
    pub fn compute(events: &[InteractionEvent], now: DateTime<Utc>) -> Self {
        let mut metrics = BehaviorMetrics {
            event_count: events.len(),
            hour_of_day: now.hour(),
            weekday: now.weekday().num_days_from_monday(),
            ..Default::default()
        };
        if events.is_empty() {
            return metrics;
        }

        let count = events.len() as f64;
        let ratio = |kind: InteractionKind| {
            events.iter().filter(|e| e.kind == kind).count() as f64 / count
        };
        metrics.click_ratio = ratio(InteractionKind::Click);
        metrics.scroll_ratio = ratio(InteractionKind::Scroll);
        metrics.keyboard_ratio = ratio(InteractionKind::Keyboard);

        let gaps: Vec<f64> = events
            .windows(2)
            .map(|pair| {
                let millis = (pair[1].timestamp - pair[0].timestamp).num_milliseconds();
                millis.max(0) as f64 / 1000.0
            })
            .collect();
        if gaps.is_empty() {
            return metrics;
        }

        let mean = gaps.iter().sum::<f64>() / gaps.len() as f64;
        let variance = gaps.iter().map(|g| (g - mean).powi(2)).sum::<f64>() / gaps.len() as f64;
        metrics.avg_gap_secs = mean;
        metrics.gap_variation = if mean > 0.0 {
            variance.sqrt() / mean
        } else {
            0.0
        };
        metrics
    }

    fn is_leisure_time(&self) -> bool {
        self.weekday >= 5 || self.hour_of_day >= 20 || self.hour_of_day < 6
    }
}

/// First matching rule wins. Returns the label and its base confidence.
fn classify(m: &BehaviorMetrics) -> (MoodLabel, f64) {
    if m.keyboard_ratio >= 0.5 && m.avg_gap_secs <= 3.0 {
        return (MoodLabel::Productive, 0.6 + 0.3 * m.keyboard_ratio);
    }
    if m.click_ratio >= 0.5 && m.avg_gap_secs < 1.0 {
        return (MoodLabel::Impatient, 0.6 + 0.3 * (1.0 - m.avg_gap_secs));
    }
    if m.gap_variation > 1.5 {
        return (
            MoodLabel::Distracted,
            (0.5 + (m.gap_variation - 1.5) * 0.1).min(0.9),
        );
    }
    if m.scroll_ratio >= 0.6 && m.avg_gap_secs < 5.0 {
        return (
            MoodLabel::Exploring,
            0.55 + 0.3 * (m.scroll_ratio - 0.6) / 0.4,
        );
    }
    if m.gap_variation < 0.5 && (1.0..=10.0).contains(&m.avg_gap_secs) {
        return (MoodLabel::Focused, 0.7 - 0.4 * m.gap_variation);
    }
    if m.avg_gap_secs > 10.0 {
        return (MoodLabel::Relaxed, 0.6);
    }
    if m.is_leisure_time() {
        return (MoodLabel::Relaxed, 0.35);
    }
    (MoodLabel::Neutral, 0.4)
}
