//! Named-entity extraction using regex patterns and a small gazetteer.
//!
//! People, places, organizations and dates are returned deduplicated, in order
//! of first appearance.

use regex::Regex;
use std::sync::LazyLock;

use super::content_analysis::Entities;

const MONTHS: &str = "January|February|March|April|May|June|July|August|September|October|November|December";

const KNOWN_PLACES: &[&str] = &[
    "New York", "San Francisco", "Los Angeles", "United States", "United Kingdom", "Hong Kong",
    "London", "Paris", "Tokyo", "Berlin", "Lisbon", "Madrid", "Rome", "Beijing", "Moscow",
    "Sydney", "Toronto", "Chicago", "Seattle", "Boston", "Dublin", "Amsterdam", "India", "China",
    "Japan", "France", "Germany", "Spain", "Italy", "Canada", "Brazil", "Mexico", "Australia",
    "Russia", "Europe", "Asia", "Africa", "America", "Ukraine", "Portugal",
];

/// Capitalized words that start phrases but are never names
const NOT_NAMES: &[&str] = &[
    "The", "A", "An", "This", "That", "These", "Those", "In", "On", "At", "For", "From", "With",
    "And", "But", "Or", "If", "When", "While", "After", "Before", "Our", "Your", "Their", "His",
    "Her", "Its", "We", "They", "It", "He", "She", "I", "You", "New", "Monday", "Tuesday",
    "Wednesday", "Thursday", "Friday", "Saturday", "Sunday", "January", "February", "March",
    "April", "May", "June", "July", "August", "September", "October", "November", "December",
    "Read", "More", "Click", "Share", "Home", "Breaking", "News", "Mr", "Mrs", "Ms", "Dr", "Prof",
    "Sir", "Dame", "Yesterday", "Today", "Tomorrow",
];

const NOT_ORGANIZATIONS: &[&str] = &["OK", "TV", "AM", "PM", "FAQ", "USA", "UK", "US", "EU"];

static HONORIFIC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:Mr|Mrs|Ms|Dr|Prof|Sir|Dame)\.?\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)")
        .expect("Invalid regex: honorific pattern")
});

static NAME_BIGRAM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z][a-z]+)\s+([A-Z][a-z]+)\b").expect("Invalid regex: name bigram pattern")
});

static ORGANIZATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b((?:[A-Z][A-Za-z&]+\s+){1,3}(?:Inc|Corp|Corporation|Ltd|LLC|Group|University|Institute|Foundation|Company|Bank|Agency|Association|Labs))\b",
    )
    .expect("Invalid regex: organization suffix pattern")
});

static KNOWN_PLACE_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    KNOWN_PLACES
        .iter()
        .map(|place| {
            let pattern = format!(r"\b{}\b", regex::escape(place));
            (
                *place,
                Regex::new(&pattern).expect("Invalid regex: known place pattern"),
            )
        })
        .collect()
});

static ACRONYM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z]{2,5})\b").expect("Invalid regex: acronym pattern")
});

static PLACE_PREPOSITION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:in|at|from|near)\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)")
        .expect("Invalid regex: place preposition pattern")
});

static DATE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"\b\d{4}-\d{2}-\d{2}\b").expect("Invalid regex: ISO date"),
        Regex::new(r"\b\d{1,2}/\d{1,2}/\d{2,4}\b").expect("Invalid regex: numeric date"),
        Regex::new(&format!(
            r"\b(?:{})\s+\d{{1,2}}(?:st|nd|rd|th)?(?:,\s*\d{{4}})?\b",
            MONTHS
        ))
        .expect("Invalid regex: month-first date"),
        Regex::new(&format!(r"\b\d{{1,2}}\s+(?:{})\s+\d{{4}}\b", MONTHS))
            .expect("Invalid regex: day-first date"),
    ]
});

#[derive(Debug, Default, Clone, Copy)]
pub struct EntityExtractor;

impl EntityExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, text: &str) -> Entities {
        if text.trim().is_empty() {
            return Entities::default();
        }

        let mut dates = Vec::new();
        for pattern in DATE_PATTERNS.iter() {
            for m in pattern.find_iter(text) {
                dates.push((m.start(), m.as_str().to_string()));
            }
        }

        let mut organizations = Vec::new();
        for caps in ORGANIZATION_PATTERN.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                let name = strip_leading_article(m.as_str());
                organizations.push((m.start(), name));
            }
        }
        for caps in ACRONYM_PATTERN.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                if !NOT_ORGANIZATIONS.contains(&m.as_str()) {
                    organizations.push((m.start(), m.as_str().to_string()));
                }
            }
        }

        let mut places = Vec::new();
        for (place, pattern) in KNOWN_PLACE_PATTERNS.iter() {
            if let Some(m) = pattern.find(text) {
                places.push((m.start(), place.to_string()));
            }
        }
        for caps in PLACE_PREPOSITION_PATTERN.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                let candidate = m.as_str();
                let first = candidate.split_whitespace().next().unwrap_or(candidate);
                if !NOT_NAMES.contains(&first) && !contains_name(&organizations, candidate) {
                    places.push((m.start(), candidate.to_string()));
                }
            }
        }

        let mut people = Vec::new();
        for caps in HONORIFIC_PATTERN.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                people.push((m.start(), m.as_str().to_string()));
            }
        }
        for caps in NAME_BIGRAM_PATTERN.captures_iter(text) {
            let (Some(whole), Some(first), Some(last)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            let name = whole.as_str();
            if NOT_NAMES.contains(&first.as_str())
                || NOT_NAMES.contains(&last.as_str())
                || contains_name(&places, name)
                || contains_name(&organizations, name)
            {
                continue;
            }
            people.push((whole.start(), name.to_string()));
        }

        Entities {
            people: in_order_of_appearance(people),
            places: in_order_of_appearance(places),
            organizations: in_order_of_appearance(organizations),
            dates: in_order_of_appearance(dates),
        }
    }
}

fn strip_leading_article(name: &str) -> String {
    name.strip_prefix("The ").unwrap_or(name).to_string()
}

fn contains_name(found: &[(usize, String)], candidate: &str) -> bool {
    found
        .iter()
        .any(|(_, name)| name.contains(candidate) || candidate.contains(name.as_str()))
}

fn in_order_of_appearance(mut found: Vec<(usize, String)>) -> Vec<String> {
    found.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    let mut seen = Vec::new();
    for (_, name) in found {
        if !seen.contains(&name) {
            seen.push(name);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dates() {
        let entities = EntityExtractor::new()
            .extract("Released on 2024-03-15 and updated March 20, 2024 or 21/03/2024.");
        assert_eq!(
            entities.dates,
            vec!["2024-03-15", "March 20, 2024", "21/03/2024"]
        );
    }

    #[test]
    fn test_people_with_honorific() {
        let entities = EntityExtractor::new().extract("Yesterday Dr. Ada Lovelace gave a talk.");
        assert_eq!(entities.people, vec!["Ada Lovelace"]);
    }

    #[test]
    fn test_organizations() {
        let entities = EntityExtractor::new()
            .extract("Shares of Acme Corp rose while NASA and Stanford University partnered.");
        assert!(entities.organizations.contains(&"Acme Corp".to_string()));
        assert!(entities.organizations.contains(&"NASA".to_string()));
        assert!(entities.organizations.contains(&"Stanford University".to_string()));
    }

    #[test]
    fn test_places() {
        let entities =
            EntityExtractor::new().extract("She moved from Lisbon to New York and lives in Brooklyn.");
        assert_eq!(entities.places, vec!["Lisbon", "New York", "Brooklyn"]);
        assert!(entities.people.is_empty());
    }

    #[test]
    fn test_empty_text() {
        assert!(EntityExtractor::new().extract("   ").is_empty());
    }
}
