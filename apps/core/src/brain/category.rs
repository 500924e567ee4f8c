//! Category classification against a fixed, ordered keyword table.
//!
//! The table is a slice, not a map: when two categories score the same number
//! of hits the one listed first wins, independent of any container order.

use super::content_analysis::{CategoryResult, CategoryScore};

/// Ordered (category, keywords) table
pub const CATEGORY_TABLE: &[(&str, &[&str])] = &[
    (
        "technology",
        &[
            "software", "hardware", "computer", "programming", "code", "developer", "app",
            "algorithm", "internet", "cloud", "database", "startup", "smartphone", "robot",
            "api", "server", "linux", "rust", "python", "javascript", "chip", "processor",
            "technology", "tech", "digital", "cyber", "network", "gadget", "browser",
        ],
    ),
    (
        "science",
        &[
            "research", "study", "scientist", "experiment", "physics", "chemistry", "biology",
            "space", "planet", "galaxy", "climate", "species", "molecule", "quantum", "theory",
            "laboratory", "discovery", "evolution", "genome", "telescope", "science", "nasa",
        ],
    ),
    (
        "business",
        &[
            "company", "market", "startup", "revenue", "profit", "ceo", "industry", "customer",
            "sales", "merger", "acquisition", "business", "corporate", "brand", "retail",
            "strategy", "growth", "enterprise", "management", "economy", "trade",
        ],
    ),
    (
        "finance",
        &[
            "stock", "investor", "investment", "bank", "fund", "bond", "interest", "inflation",
            "crypto", "bitcoin", "dividend", "portfolio", "earnings", "finance", "loan",
            "mortgage", "tax", "budget", "currency", "price",
        ],
    ),
    (
        "health",
        &[
            "health", "doctor", "patient", "hospital", "disease", "medicine", "vaccine",
            "treatment", "symptom", "nutrition", "fitness", "exercise", "diet", "mental",
            "therapy", "virus", "wellness", "sleep", "clinic", "drug",
        ],
    ),
    (
        "sports",
        &[
            "game", "team", "player", "coach", "season", "match", "league", "score",
            "tournament", "championship", "football", "soccer", "basketball", "tennis",
            "olympic", "goal", "win", "athlete", "stadium", "cup",
        ],
    ),
    (
        "entertainment",
        &[
            "movie", "film", "music", "song", "album", "actor", "actress", "celebrity", "show",
            "series", "episode", "concert", "festival", "streaming", "netflix", "book", "novel",
            "artist", "gaming", "television",
        ],
    ),
    (
        "politics",
        &[
            "government", "election", "president", "minister", "senate", "congress", "policy",
            "vote", "law", "party", "campaign", "parliament", "democracy", "political",
            "diplomat", "court", "legislation", "governor",
        ],
    ),
    (
        "education",
        &[
            "school", "student", "teacher", "university", "college", "course", "learning",
            "education", "lesson", "tutorial", "exam", "degree", "curriculum", "class",
            "training", "academic", "lecture",
        ],
    ),
    (
        "travel",
        &[
            "travel", "trip", "flight", "hotel", "destination", "tourism", "tourist", "beach",
            "vacation", "airport", "journey", "passport", "itinerary", "resort", "cruise",
            "backpacking", "city",
        ],
    ),
    (
        "food",
        &[
            "recipe", "food", "cooking", "restaurant", "chef", "meal", "kitchen", "ingredient",
            "dish", "bake", "flavor", "cuisine", "dinner", "lunch", "breakfast", "vegan",
            "wine", "coffee",
        ],
    ),
];

/// Hit count at which confidence saturates
const FULL_CONFIDENCE_HITS: f64 = 3.0;
const MAX_ALTERNATIVES: usize = 3;

/// Scores content words against `CATEGORY_TABLE`
#[derive(Debug, Default, Clone, Copy)]
pub struct CategoryClassifier;

impl CategoryClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Number of words that hit each category, in table order
    fn score(&self, words: &[String]) -> Vec<(&'static str, usize)> {
        CATEGORY_TABLE
            .iter()
            .map(|(category, keywords)| {
                let hits = words
                    .iter()
                    .filter(|word| {
                        keywords.contains(&word.as_str())
                            || word
                                .strip_suffix('s')
                                .is_some_and(|singular| keywords.contains(&singular))
                    })
                    .count();
                (*category, hits)
            })
            .collect()
    }

    fn confidence(hits: usize) -> f64 {
        (hits as f64 / FULL_CONFIDENCE_HITS).min(1.0)
    }

    /// Classify from lowercased content words (nouns and verbs of the page)
    pub fn classify(&self, words: &[String]) -> CategoryResult {
        let scores = self.score(words);

        // Strictly greater keeps the earliest table entry on ties
        let mut best: Option<(&'static str, usize)> = None;
        for &(category, hits) in &scores {
            if hits > 0 && best.map_or(true, |(_, best_hits)| hits > best_hits) {
                best = Some((category, hits));
            }
        }

        let Some((primary, hits)) = best else {
            return CategoryResult::general(0.2);
        };

        let mut alternatives: Vec<CategoryScore> = scores
            .iter()
            .filter(|(category, hits)| *hits > 0 && *category != primary)
            .map(|(category, hits)| CategoryScore {
                category: category.to_string(),
                hits: *hits,
                confidence: Self::confidence(*hits),
            })
            .collect();
        // Stable sort: equal hit counts stay in table order
        alternatives.sort_by(|a, b| b.hits.cmp(&a.hits));
        alternatives.truncate(MAX_ALTERNATIVES);

        CategoryResult {
            primary: primary.to_string(),
            confidence: Self::confidence(hits),
            hits,
            alternatives,
        }
    }
}
