// File: src/benchmark.rs
use crate::core::engine::Translator;
use crate::core::jamo::contains_hangul;
use crate::core::types::{Direction, TranslateOptions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// The bundled evaluation corpus.
pub const BENCHMARK_CORPUS: &str = include_str!("../data/benchmark.json");

/// Minimum case score to pass.
pub const PASS_THRESHOLD: f64 = 0.75;

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "to", "of", "in", "on", "at", "is", "am", "are", "was", "were", "be", "i", "you", "it", "and",
    "do", "does", "did",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkCase {
    pub id: String,
    pub category: String,
    pub input: String,
    pub direction: Direction,
    pub expected: String,
    /// Words the output must contain. Derived from `expected` when absent.
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
}

impl BenchmarkCase {
    pub fn keywords(&self) -> Vec<String> {
        match &self.keywords {
            Some(k) => k.iter().map(|w| normalize(w)).filter(|w| !w.is_empty()).collect(),
            None => normalize(&self.expected)
                .split_whitespace()
                .filter(|w| !STOP_WORDS.contains(w))
                .map(str::to_string)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseReport {
    pub id: String,
    pub category: String,
    pub input: String,
    pub expected: String,
    pub actual: String,
    pub score: f64,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub passed: usize,
    pub total: usize,
    /// Mean case score.
    pub score: f64,
    pub details: Vec<CaseReport>,
}

impl BenchmarkReport {
    /// `(passed, total)` per category.
    pub fn by_category(&self) -> BTreeMap<&str, (usize, usize)> {
        let mut out: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
        for d in &self.details {
            let slot = out.entry(d.category.as_str()).or_default();
            slot.1 += 1;
            if d.passed {
                slot.0 += 1;
            }
        }
        out
    }
}

fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect::<String>()
        .to_lowercase()
}

fn words(output: &str) -> Vec<String> {
    output
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

/// English keywords match whole words (plural -s allowed); Korean ones
/// match the start of a word, since particles and endings follow the stem.
fn keyword_matches(word: &str, keyword: &str, direction: Direction) -> bool {
    match direction {
        Direction::KoEn => {
            word == keyword || word.strip_prefix(keyword).map_or(false, |rest| rest == "s" || rest == "es")
        }
        Direction::EnKo => word.starts_with(keyword),
    }
}

/// Words still written in the source language.
fn untranslated(word: &str, direction: Direction) -> bool {
    match direction {
        Direction::KoEn => contains_hangul(word),
        Direction::EnKo => word.chars().any(|c| c.is_ascii_alphabetic()),
    }
}

/// Scores `output` against `keywords`, which must appear in order.
///
/// The in-order share is the longest common subsequence of keywords and
/// output words over the keyword count. It is scaled by the share of output
/// words that are in the target language. 1.0 when there are no keywords and
/// nothing is left untranslated.
pub fn keyword_score(output: &str, keywords: &[String], direction: Direction) -> f64 {
    let words = words(output);
    let keywords: Vec<&str> = keywords.iter().flat_map(|k| k.split_whitespace()).collect();
    let ordered = if keywords.is_empty() {
        1.0
    } else {
        let mut table = vec![vec![0usize; words.len() + 1]; keywords.len() + 1];
        for (i, keyword) in keywords.iter().enumerate() {
            for (j, word) in words.iter().enumerate() {
                table[i + 1][j + 1] = if keyword_matches(word, keyword, direction) {
                    table[i][j] + 1
                } else {
                    table[i][j + 1].max(table[i + 1][j])
                };
            }
        }
        table[keywords.len()][words.len()] as f64 / keywords.len() as f64
    };
    if words.is_empty() {
        return if keywords.is_empty() { 1.0 } else { 0.0 };
    }
    let leftover = words.iter().filter(|w| untranslated(w, direction)).count();
    ordered * (1.0 - leftover as f64 / words.len() as f64)
}

pub fn load_benchmark(json: &str) -> Result<Vec<BenchmarkCase>, serde_json::Error> {
    serde_json::from_str(json)
}

pub fn builtin_benchmark() -> Result<Vec<BenchmarkCase>, serde_json::Error> {
    load_benchmark(BENCHMARK_CORPUS)
}

/// Runs every case through `translator`. Deterministic for a fixed
/// translator and corpus.
pub fn run_benchmark(translator: &Translator, cases: &[BenchmarkCase]) -> BenchmarkReport {
    let details: Vec<CaseReport> = cases
        .iter()
        .map(|case| {
            let actual = translator
                .translate(&case.input, case.direction, TranslateOptions::default())
                .unwrap_or_default();
            let score = keyword_score(&actual, &case.keywords(), case.direction);
            debug!(id = %case.id, score, %actual, "benchmark case");
            CaseReport {
                id: case.id.clone(),
                category: case.category.clone(),
                input: case.input.clone(),
                expected: case.expected.clone(),
                actual,
                score,
                passed: score >= PASS_THRESHOLD,
            }
        })
        .collect();
    let total = details.len();
    let passed = details.iter().filter(|d| d.passed).count();
    let score = if total == 0 { 0.0 } else { details.iter().map(|d| d.score).sum::<f64>() / total as f64 };
    BenchmarkReport { passed, total, score, details }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_keywords_drop_stop_words() {
        let case = BenchmarkCase {
            id: "x".into(),
            category: "category".into(),
            input: "나는 학교에 갔다".into(),
            direction: Direction::KoEn,
            expected: "I went to the school.".into(),
            keywords: None,
        };
        assert_eq!(case.keywords(), vec!["went", "school"]);
    }

    fn keys(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn keyword_score_is_a_fraction() {
        let keywords = keys(&["drink", "tea"]);
        assert_eq!(keyword_score("I drink coffee.", &keywords, Direction::KoEn), 0.5);
        assert_eq!(keyword_score("Drink TEA!", &keywords, Direction::KoEn), 1.0);
        assert_eq!(keyword_score("anything", &[], Direction::KoEn), 1.0);
    }

    #[test]
    fn keywords_match_whole_words_in_order() {
        let school = keys(&["went", "school"]);
        assert!(keyword_score("School went 에.", &school, Direction::KoEn) < PASS_THRESHOLD);
        assert!(keyword_score("I went to the schoolyard.", &school, Direction::KoEn) < PASS_THRESHOLD);
        assert_eq!(keyword_score("I went to school.", &school, Direction::KoEn), 1.0);
        assert_eq!(keyword_score("They went to schools.", &school, Direction::KoEn), 1.0);

        let snow = keys(&["snow", "fell"]);
        assert!(keyword_score("Snow got off.", &snow, Direction::KoEn) < PASS_THRESHOLD);
    }

    #[test]
    fn untranslated_words_cost_points() {
        let bank = keys(&["돈", "은행", "갔"]);
        assert!(keyword_score("나는 은행에 deposit에 돈을 갔다.", &bank, Direction::EnKo) < PASS_THRESHOLD);
        assert_eq!(keyword_score("나는 돈을 입금하러 은행에 갔다.", &bank, Direction::EnKo), 1.0);
        assert!(keyword_score("학교에 갔다", &[], Direction::KoEn) < PASS_THRESHOLD);
    }

    #[test]
    fn bundled_corpus_covers_categories() {
        let cases = builtin_benchmark().unwrap();
        for category in ["category", "context", "localization", "professional", "polysemy", "spacing", "typo", "word-order", "figurative"] {
            assert!(cases.iter().any(|c| c.category == category), "{}", category);
        }
    }

    #[test]
    fn repeated_runs_score_identically() {
        let t = Translator::builtin().unwrap();
        let cases = builtin_benchmark().unwrap();
        let first = run_benchmark(&t, &cases);
        let second = run_benchmark(&t, &cases);
        assert_eq!(first, second);
        assert_eq!(first.total, cases.len());
    }
}
