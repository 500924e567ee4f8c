use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// Counts of structural elements, as summarized by the rendering host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlSummary {
    pub headings: u32,
    pub paragraphs: u32,
    pub images: u32,
    pub videos: u32,
    pub links: u32,
    pub forms: u32,
    pub buttons: u32,
    pub code_blocks: u32,
}

/// Aggregate interaction counts observed while the page was open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionCounts {
    pub clicks: u32,
    pub scrolls: u32,
    pub key_presses: u32,
}

impl InteractionCounts {
    pub fn total(&self) -> u64 {
        self.clicks as u64 + self.scrolls as u64 + self.key_presses as u64
    }
}

/// A single navigation, as supplied by the rendering host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageVisit {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub html: HtmlSummary,
    /// Free-form metadata (e.g. `published_at`, `shares`, `comments`).
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
    /// Seconds the page was in the foreground.
    #[serde(default)]
    pub dwell_time_secs: f64,
    /// Fraction of the page scrolled through, 0.0 - 1.0.
    #[serde(default)]
    pub scroll_depth: f64,
    #[serde(default)]
    pub interactions: InteractionCounts,
}

/// Kind of a raw interaction event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Click,
    Scroll,
    Keyboard,
}

/// One interaction event from the host's telemetry stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub kind: InteractionKind,
    pub timestamp: DateTime<Utc>,
}

impl InteractionEvent {
    pub fn new(kind: InteractionKind, timestamp: DateTime<Utc>) -> Self {
        Self { kind, timestamp }
    }
}

/// The text-free part of a visit that the profile keeps after analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitContext {
    pub url: String,
    pub domain: Option<String>,
    pub title: String,
    pub timestamp: DateTime<Utc>,
    pub dwell_time_secs: f64,
    pub scroll_depth: f64,
    pub interactions: InteractionCounts,
    pub html: HtmlSummary,
    pub signals: ContentSignals,
}

/// Publication and social data picked out of the free-form visit metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentSignals {
    pub published_at: Option<DateTime<Utc>>,
    pub shares: Option<u64>,
    pub comments: Option<u64>,
}

impl ContentSignals {
    /// Reads `published_at` (RFC 3339 or `YYYY-MM-DD`), `shares` and `comments`.
    /// Unparsable entries are treated as absent.
    pub fn from_metadata(metadata: &BTreeMap<String, String>) -> Self {
        let published_at = metadata.get("published_at").and_then(|raw| {
            let raw = raw.trim();
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                        .map(|dt| dt.and_utc())
                })
        });
        let count = |key: &str| metadata.get(key).and_then(|raw| raw.trim().parse::<u64>().ok());

        Self {
            published_at,
            shares: count("shares"),
            comments: count("comments"),
        }
    }
}

impl From<&PageVisit> for VisitContext {
    fn from(visit: &PageVisit) -> Self {
        Self {
            url: visit.url.clone(),
            domain: domain_of(&visit.url),
            title: visit.title.clone(),
            timestamp: visit.timestamp,
            dwell_time_secs: sanitize(visit.dwell_time_secs, f64::MAX),
            scroll_depth: sanitize(visit.scroll_depth, 1.0),
            interactions: visit.interactions.clone(),
            html: visit.html.clone(),
            signals: ContentSignals::from_metadata(&visit.metadata),
        }
    }
}

/// Host component of a URL, without a leading `www.`.
pub fn domain_of(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw).ok()?;
    let host = parsed.host_str()?;
    Some(host.trim_start_matches("www.").to_string())
}

fn sanitize(value: f64, max: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, max)
    } else {
        0.0
    }
}

/// Row written to the visit log for each visit folded into a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitRecord {
    pub id: String,
    pub user_id: String,
    pub url: String,
    pub title: String,
    pub category: String,
    pub engagement: f64,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_extraction() {
        assert_eq!(
            domain_of("https://www.example.com/a/b?c=d").as_deref(),
            Some("example.com")
        );
        assert_eq!(domain_of("not a url"), None);
    }

    #[test]
    fn test_context_sanitizes_telemetry() {
        let visit = PageVisit {
            url: "https://news.site/x".to_string(),
            title: "t".to_string(),
            text: "body".to_string(),
            html: HtmlSummary::default(),
            metadata: BTreeMap::new(),
            timestamp: Utc::now(),
            dwell_time_secs: f64::NAN,
            scroll_depth: 3.0,
            interactions: InteractionCounts::default(),
        };
        let ctx = VisitContext::from(&visit);
        assert_eq!(ctx.dwell_time_secs, 0.0);
        assert_eq!(ctx.scroll_depth, 1.0);
        assert_eq!(ctx.domain.as_deref(), Some("news.site"));
    }

    #[test]
    fn test_signals_from_metadata() {
        let mut metadata = BTreeMap::new();
        metadata.insert("published_at".to_string(), "2024-05-01".to_string());
        metadata.insert("shares".to_string(), "120".to_string());
        metadata.insert("comments".to_string(), "lots".to_string());

        let signals = ContentSignals::from_metadata(&metadata);
        assert_eq!(
            signals.published_at.map(|d| d.to_rfc3339()).as_deref(),
            Some("2024-05-01T00:00:00+00:00")
        );
        assert_eq!(signals.shares, Some(120));
        assert_eq!(signals.comments, None);
    }

    #[test]
    fn test_visit_deserializes_with_defaults() {
        let json = r#"{"url":"https://a.b","timestamp":"2024-05-01T10:00:00Z"}"#;
        let visit: PageVisit = serde_json::from_str(json).unwrap();
        assert!(visit.text.is_empty());
        assert_eq!(visit.interactions.total(), 0);
    }
}
