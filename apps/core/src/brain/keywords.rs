//! Keyword and topic extraction.
//!
//! Keywords are ranked with a TF-IDF approximation (term frequency times a
//! heuristic inverse document frequency). Topics are noun phrases, named
//! entities and noun keywords, ranked by an importance heuristic.
//! All ranking ties are broken alphabetically so output is deterministic.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use super::content_analysis::Entities;

/// Stopwords for English
pub(crate) const STOPWORDS_EN: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "nor", "for", "yet", "so", "i", "you", "he", "she", "it",
    "we", "they", "me", "him", "her", "us", "them", "my", "your", "his", "its", "our", "their",
    "mine", "yours", "hers", "ours", "theirs", "this", "that", "these", "those", "who", "whom",
    "which", "what", "whose", "is", "am", "are", "was", "were", "be", "been", "being", "have",
    "has", "had", "having", "do", "does", "did", "doing", "will", "would", "shall", "should",
    "can", "could", "may", "might", "must", "in", "on", "at", "to", "from", "by", "with", "about",
    "against", "between", "into", "through", "during", "before", "after", "above", "below", "up",
    "down", "out", "off", "over", "under", "again", "further", "here", "there", "where", "when",
    "why", "how", "all", "each", "every", "both", "few", "more", "most", "other", "some", "any",
    "no", "not", "only", "own", "same", "than", "too", "very", "just", "also", "now", "then",
    "once", "always", "never", "if", "because", "as", "until", "while", "although", "though",
    "yes", "maybe", "of", "s", "t", "ve", "re", "ll", "d", "m", "said", "says", "like", "get",
    "got", "one", "two", "new", "many", "much", "even", "still", "well", "back", "way", "make",
];

/// Stopwords for French
pub(crate) const STOPWORDS_FR: &[&str] = &[
    "le", "la", "les", "un", "une", "des", "du", "de", "et", "ou", "où", "mais", "donc", "car",
    "je", "tu", "il", "elle", "on", "nous", "vous", "ils", "elles", "ce", "cet", "cette", "ces",
    "qui", "que", "quoi", "dont", "ne", "pas", "plus", "très", "être", "est", "sont", "était",
    "avoir", "ont", "avait", "faire", "fait", "dans", "sur", "sous", "avec", "sans", "pour",
    "par", "entre", "avant", "après", "comme", "tout", "tous", "toute", "toutes", "aussi",
    "leur", "leurs", "son", "ses", "sa", "mon", "ma", "mes", "notre", "votre", "nos", "vos",
];

/// Part of speech, guessed from capitalization and suffixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartOfSpeech {
    Noun,
    ProperNoun,
    Verb,
    Adjective,
    Adverb,
}

impl PartOfSpeech {
    pub fn is_nominal(&self) -> bool {
        matches!(self, PartOfSpeech::Noun | PartOfSpeech::ProperNoun)
    }
}

/// A ranked keyword
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub word: String,
    pub frequency: usize,
    /// TF-IDF score
    pub score: f64,
    pub part_of_speech: PartOfSpeech,
}

/// A ranked topic (phrase, entity or noun keyword)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub term: String,
    pub frequency: usize,
    pub importance: f64,
}

/// Keyword and topic extractor
pub struct KeywordExtractor {
    stopwords: HashSet<&'static str>,
    min_word_length: usize,
    max_keywords: usize,
    max_topics: usize,
    /// IDF approximation for terms known to be specific
    idf_weights: HashMap<&'static str, f64>,
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordExtractor {
    /// 15 keywords, 10 topics, words of at least 3 characters
    pub fn new() -> Self {
        Self::with_config(3, 15, 10)
    }

    pub fn with_config(min_word_length: usize, max_keywords: usize, max_topics: usize) -> Self {
        let stopwords: HashSet<&'static str> =
            STOPWORDS_EN.iter().chain(STOPWORDS_FR.iter()).copied().collect();

        let mut idf_weights = HashMap::new();

        // Very specific terms (high IDF)
        for term in [
            "algorithm", "database", "vaccine", "election", "earnings", "quantum", "climate",
            "recipe", "tournament", "genome",
        ] {
            idf_weights.insert(term, 2.5);
        }

        // Broad but topical terms
        for term in [
            "software", "market", "health", "science", "government", "travel", "music", "data",
            "research", "team",
        ] {
            idf_weights.insert(term, 2.0);
        }

        // Generic web filler
        for term in [
            "page", "click", "read", "share", "comment", "subscribe", "website", "article", "time",
            "people", "year", "day",
        ] {
            idf_weights.insert(term, 0.5);
        }

        Self {
            stopwords,
            min_word_length,
            max_keywords,
            max_topics,
            idf_weights,
        }
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(word)
    }

    fn is_content_word(&self, word: &str) -> bool {
        word.chars().count() >= self.min_word_length
            && !self.is_stopword(word)
            && !word.chars().all(|c| c.is_numeric())
    }

    /// Lowercased content words of the text, in order
    pub fn content_words(&self, text: &str) -> Vec<String> {
        split_words(text)
            .map(|w| w.to_lowercase())
            .filter(|w| self.is_content_word(w))
            .collect()
    }

    /// Get IDF weight for a word (approximated)
    fn idf(&self, word: &str) -> f64 {
        if let Some(&weight) = self.idf_weights.get(word) {
            return weight;
        }

        // Longer words tend to be more specific
        let length_factor = (word.chars().count() as f64 / 6.0).min(1.5);

        // Hyphenated or snake_case words are usually technical
        let special_char_bonus = if word.contains('_') || word.contains('-') {
            0.5
        } else {
            0.0
        };

        1.0 + length_factor + special_char_bonus
    }

    /// Extract the top keywords from a text
    pub fn extract(&self, text: &str) -> Vec<Keyword> {
        let mut frequency: BTreeMap<String, usize> = BTreeMap::new();
        // (capitalized mid-sentence, lowercase) occurrence counts
        let mut casing: BTreeMap<String, (usize, usize)> = BTreeMap::new();
        let mut total = 0usize;

        for sentence in split_sentences(text) {
            for (position, raw) in split_words(sentence).enumerate() {
                let word = raw.to_lowercase();
                if !self.is_content_word(&word) {
                    continue;
                }
                total += 1;
                *frequency.entry(word.clone()).or_insert(0) += 1;

                let entry = casing.entry(word).or_insert((0, 0));
                let capitalized = raw.chars().next().is_some_and(|c| c.is_uppercase());
                if !capitalized {
                    entry.1 += 1;
                } else if position > 0 {
                    entry.0 += 1;
                }
            }
        }

        if total == 0 {
            return vec![];
        }

        let mut keywords: Vec<Keyword> = frequency
            .into_iter()
            .map(|(word, count)| {
                let tf = count as f64 / total as f64;
                let score = tf * self.idf(&word);
                let (capitalized_mid, lowercase) = casing.get(&word).copied().unwrap_or((0, 0));
                let part_of_speech = if capitalized_mid > 0 && lowercase == 0 {
                    PartOfSpeech::ProperNoun
                } else {
                    guess_part_of_speech(&word)
                };
                Keyword {
                    word,
                    frequency: count,
                    score,
                    part_of_speech,
                }
            })
            .collect();

        keywords.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.word.cmp(&b.word))
        });
        keywords.truncate(self.max_keywords);
        keywords
    }

    /// Extract ranked topics from noun phrases, entities and noun keywords
    pub fn extract_topics(
        &self,
        text: &str,
        title: &str,
        keywords: &[Keyword],
        entities: &Entities,
    ) -> Vec<Topic> {
        let title_lower = title.to_lowercase();
        let text_lower = text.to_lowercase();
        // term -> (frequency, length weight)
        let mut candidates: BTreeMap<String, (usize, f64)> = BTreeMap::new();

        for sentence in split_sentences(text) {
            let words: Vec<String> = split_words(sentence).map(|w| w.to_lowercase()).collect();
            let mut run: Vec<&str> = Vec::new();
            for word in words.iter().map(String::as_str).chain(std::iter::once("")) {
                if !word.is_empty() && self.is_content_word(word) {
                    run.push(word);
                    continue;
                }
                for n in 2..=3 {
                    for window in run.windows(n) {
                        let phrase = window.join(" ");
                        let weight = if n == 2 { 1.5 } else { 1.8 };
                        let entry = candidates.entry(phrase).or_insert((0, weight));
                        entry.0 += 1;
                    }
                }
                run.clear();
            }
        }

        for keyword in keywords.iter().filter(|k| k.part_of_speech.is_nominal()) {
            let entry = candidates
                .entry(keyword.word.clone())
                .or_insert((0, 1.0));
            entry.0 = entry.0.max(keyword.frequency);
        }

        for entity in entities
            .people
            .iter()
            .chain(entities.organizations.iter())
            .chain(entities.places.iter())
        {
            let term = entity.to_lowercase();
            let occurrences = text_lower.matches(term.as_str()).count().max(1);
            let entry = candidates.entry(term).or_insert((0, 2.0));
            entry.0 = entry.0.max(occurrences);
            entry.1 = entry.1.max(2.0);
        }

        let mut topics: Vec<Topic> = candidates
            .into_iter()
            .map(|(term, (frequency, weight))| {
                let title_boost = if !title_lower.is_empty() && title_lower.contains(&term) {
                    1.5
                } else {
                    1.0
                };
                Topic {
                    importance: frequency as f64 * weight * title_boost,
                    term,
                    frequency,
                }
            })
            .collect();

        topics.sort_by(|a, b| {
            b.importance
                .partial_cmp(&a.importance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.term.cmp(&b.term))
        });
        topics.truncate(self.max_topics);
        topics
    }
}

/// Split on anything that is not part of a word
pub(crate) fn split_words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric() && c != '_' && c != '-' && c != '\'')
        .map(|w| w.trim_matches(|c: char| c == '-' || c == '\''))
        .filter(|w| !w.is_empty())
}

/// Split into sentences on terminal punctuation and line breaks
pub(crate) fn split_sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split(['.', '!', '?', '\n', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn guess_part_of_speech(word: &str) -> PartOfSpeech {
    let len = word.chars().count();
    if len > 4 && word.ends_with("ly") {
        return PartOfSpeech::Adverb;
    }
    if len > 4
        && ["ing", "ed", "ize", "ise", "ify"]
            .iter()
            .any(|suffix| word.ends_with(suffix))
    {
        return PartOfSpeech::Verb;
    }
    if len > 4
        && ["ous", "ful", "ive", "able", "ible", "less", "ical", "ic"]
            .iter()
            .any(|suffix| word.ends_with(suffix))
    {
        return PartOfSpeech::Adjective;
    }
    PartOfSpeech::Noun
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_extraction() {
        let extractor = KeywordExtractor::new();

        let text = "The database stores records. A database index speeds up every database query.";
        let keywords = extractor.extract(text);

        assert!(!keywords.is_empty());
        assert_eq!(keywords[0].word, "database");
        assert_eq!(keywords[0].frequency, 3);
        assert_eq!(keywords[0].part_of_speech, PartOfSpeech::Noun);
    }

    #[test]
    fn test_stopword_filtering() {
        let extractor = KeywordExtractor::new();
        assert!(extractor.extract("the a an is are was were").is_empty());
    }

    #[test]
    fn test_empty_text() {
        let extractor = KeywordExtractor::new();
        assert!(extractor.extract("").is_empty());
        assert!(extractor.extract("   ").is_empty());
    }

    #[test]
    fn test_keyword_cap() {
        let extractor = KeywordExtractor::new();
        let text = (0..40)
            .map(|i| format!("word{}abc", i))
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(extractor.extract(&text).len(), 15);
    }

    #[test]
    fn test_proper_noun_detection() {
        let extractor = KeywordExtractor::new();
        let keywords = extractor.extract("We visited Lisbon last summer. Friends love Lisbon.");
        let lisbon = keywords.iter().find(|k| k.word == "lisbon").unwrap();
        assert_eq!(lisbon.part_of_speech, PartOfSpeech::ProperNoun);
    }

    #[test]
    fn test_suffix_tags() {
        assert_eq!(guess_part_of_speech("quickly"), PartOfSpeech::Adverb);
        assert_eq!(guess_part_of_speech("running"), PartOfSpeech::Verb);
        assert_eq!(guess_part_of_speech("wonderful"), PartOfSpeech::Adjective);
        assert_eq!(guess_part_of_speech("garden"), PartOfSpeech::Noun);
    }

    #[test]
    fn test_ties_break_alphabetically() {
        let extractor = KeywordExtractor::new();
        let keywords = extractor.extract("zebra apple mango");
        let words: Vec<&str> = keywords.iter().map(|k| k.word.as_str()).collect();
        // Same length and frequency: identical scores
        assert_eq!(words, vec!["apple", "mango", "zebra"]);
    }

    #[test]
    fn test_topics_include_phrases() {
        let extractor = KeywordExtractor::new();
        let text = "Machine learning models need data. Machine learning is everywhere.";
        let keywords = extractor.extract(text);
        let topics = extractor.extract_topics(text, "Machine learning", &keywords, &Entities::default());
        assert_eq!(topics[0].term, "machine learning");
        assert_eq!(topics[0].frequency, 2);
        assert!(topics.len() <= 10);
    }
}
