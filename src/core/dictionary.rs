// File: src/core/dictionary.rs
//! The in-memory dictionary store.
//!
//! Entries are registered through [`DictionaryBuilder`] (bundled partitions
//! plus host-injected records), validated there, then frozen into an immutable
//! [`DictionaryStore`] that every pipeline stage reads through a shared reference.

use crate::core::jamo::{self, has_batchim};
use crate::core::types::{
    Category, DictionaryEntry, Direction, EntryDirection, EntryId, PartOfSpeech, Sense,
};
use crate::error::DictionaryError;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// Bundled partitions, compiled into the binary.
const BUILTIN_PARTITIONS: &[(&str, &str)] = &[
    ("general", include_str!("../../data/lexicon/general.json")),
    ("food", include_str!("../../data/lexicon/food.json")),
    ("transport", include_str!("../../data/lexicon/transport.json")),
    ("technology", include_str!("../../data/lexicon/technology.json")),
    ("medical", include_str!("../../data/lexicon/medical.json")),
    ("legal", include_str!("../../data/lexicon/legal.json")),
    ("sports", include_str!("../../data/lexicon/sports.json")),
    ("nature", include_str!("../../data/lexicon/nature.json")),
    ("polysemy", include_str!("../../data/lexicon/polysemy.json")),
    ("idioms", include_str!("../../data/lexicon/idioms.json")),
    ("phrasal-verbs", include_str!("../../data/lexicon/phrasal_verbs.json")),
    ("proper-nouns", include_str!("../../data/lexicon/proper_nouns.json")),
];

/// Tags that describe grammatical behaviour rather than a subject domain.
/// They never take part in domain voting.
pub const ATTRIBUTE_TAGS: &[&str] = &[
    "mass",
    "person",
    "male",
    "female",
    "plural",
    "place-no-article",
    "time",
    "motion",
    "animal",
    "question",
    "transport-mode",
    "weather",
    "body",
    "counter",
    // Mood and register tags matched against the analyzed context.
    "joy",
    "sadness",
    "anger",
    "surprise",
    "apology",
    "gratitude",
    "formal",
    "polite",
    "casual",
    "honorific",
    "professional",
];

pub fn is_attribute_tag(tag: &str) -> bool {
    ATTRIBUTE_TAGS.contains(&tag)
}

/// A bundle of entries as delivered by the host or the bundled data files.
#[derive(Debug, Clone, Deserialize)]
pub struct Partition {
    pub partition: String,
    /// Added to every sense that carries no domain tag of its own.
    #[serde(default)]
    pub domain: Option<String>,
    /// Applied to entries left at the default `word` category.
    #[serde(default)]
    pub category: Option<Category>,
    pub entries: Vec<DictionaryEntry>,
}

impl Partition {
    pub fn from_json(json: &str) -> Result<Self, DictionaryError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Entries with partition-level defaults applied.
    pub fn into_entries(self) -> Vec<DictionaryEntry> {
        let Partition { domain, category, entries, .. } = self;
        entries
            .into_iter()
            .map(|mut entry| {
                if let Some(category) = category {
                    if entry.category == Category::Word {
                        entry.category = category;
                    }
                }
                if let Some(domain) = &domain {
                    for sense in &mut entry.senses {
                        if sense.domain_tags.iter().all(|t| is_attribute_tag(t)) {
                            sense.domain_tags.insert(domain.clone());
                        }
                    }
                }
                entry
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InjectionReport {
    pub added_entries: usize,
    pub added_senses: usize,
    pub replaced_senses: usize,
    pub skipped_senses: usize,
}

fn is_korean(headword: &str) -> bool {
    jamo::contains_hangul(headword)
}

/// Normalized lookup key: Korean is matched exactly, English case-insensitively.
fn normalize_key(word: &str) -> String {
    let trimmed = word.split_whitespace().collect::<Vec<_>>().join(" ");
    if is_korean(&trimmed) {
        trimmed
    } else {
        trimmed.to_lowercase()
    }
}

fn validate(mut entry: DictionaryEntry) -> Result<DictionaryEntry, DictionaryError> {
    entry.headword = entry.headword.trim().to_string();
    if entry.headword.is_empty() {
        return Err(DictionaryError::EmptyHeadword);
    }
    if entry.senses.is_empty() {
        return Err(DictionaryError::NoSenses { headword: entry.headword });
    }
    for sense in &mut entry.senses {
        sense.gloss = sense.gloss.trim().to_string();
        if sense.gloss.is_empty() {
            return Err(DictionaryError::InvalidSense {
                headword: entry.headword.clone(),
                reason: "empty gloss".to_string(),
            });
        }
        if !sense.priority.is_finite() {
            return Err(DictionaryError::InvalidSense {
                headword: entry.headword.clone(),
                reason: format!("priority {} is not finite", sense.priority),
            });
        }
        if sense.id.trim().is_empty() {
            sense.id = sense.gloss.clone();
        }
    }
    Ok(entry)
}

fn sort_senses(senses: &mut [Sense]) {
    // Stable: equal priorities keep registration order.
    senses.sort_by(|a, b| b.priority.total_cmp(&a.priority));
}

/// Mutable staging area. Only the builder accepts new entries.
#[derive(Debug, Default)]
pub struct DictionaryBuilder {
    entries: Vec<DictionaryEntry>,
    index: HashMap<String, EntryId>,
}

impl DictionaryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every bundled partition.
    pub fn with_builtin(mut self) -> Result<Self, DictionaryError> {
        for (name, json) in BUILTIN_PARTITIONS {
            let partition = Partition::from_json(json)?;
            let report = self.inject(partition.into_entries())?;
            debug!(partition = name, ?report, "loaded bundled partition");
        }
        Ok(self)
    }

    pub fn with_partition(mut self, partition: Partition) -> Result<Self, DictionaryError> {
        self.inject(partition.into_entries())?;
        Ok(self)
    }

    /// Merges entries into the staging store.
    ///
    /// A sense with the same headword and gloss as a registered one is skipped
    /// unless its entry is flagged `override`. The whole batch is validated
    /// before anything is merged, so a rejected batch leaves the builder unchanged.
    pub fn inject(&mut self, entries: Vec<DictionaryEntry>) -> Result<InjectionReport, DictionaryError> {
        let validated = entries
            .into_iter()
            .map(|entry| {
                validate(entry).map_err(|err| {
                    warn!(%err, "rejected dictionary entry");
                    err
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let mut report = InjectionReport::default();
        for entry in validated {
            let key = normalize_key(&entry.headword);
            match self.index.get(&key) {
                None => {
                    let mut entry = entry;
                    sort_senses(&mut entry.senses);
                    report.added_entries += 1;
                    report.added_senses += entry.senses.len();
                    self.index.insert(key, self.entries.len());
                    self.entries.push(entry);
                }
                Some(&id) => {
                    let existing = &mut self.entries[id];
                    if entry.override_existing {
                        existing.category = entry.category;
                        existing.direction = entry.direction;
                    }
                    for sense in entry.senses {
                        let same = existing
                            .senses
                            .iter()
                            .position(|s| s.gloss.eq_ignore_ascii_case(&sense.gloss));
                        match same {
                            Some(pos) if entry.override_existing => {
                                existing.senses[pos] = sense;
                                report.replaced_senses += 1;
                            }
                            Some(_) => report.skipped_senses += 1,
                            None => {
                                existing.senses.push(sense);
                                report.added_senses += 1;
                            }
                        }
                    }
                    sort_senses(&mut existing.senses);
                }
            }
        }
        Ok(report)
    }

    /// Freezes the staged entries, deriving reverse entries for bidirectional records.
    ///
    /// A gloss becomes a reverse headword only when no entry was registered
    /// explicitly under it; reverse senses inherit domain tags and priority.
    pub fn build(self) -> DictionaryStore {
        let DictionaryBuilder { mut entries, mut index } = self;
        let explicit = entries.len();

        // Reverse senses accumulate per gloss, in registration order.
        let mut reverse: Vec<(String, Sense, Category)> = Vec::new();
        for entry in entries.iter().filter(|e| e.direction == EntryDirection::Bidirectional) {
            for sense in &entry.senses {
                let mut back = Sense::new(&entry.headword, sense.pos);
                back.domain_tags = sense.domain_tags.clone();
                back.priority = sense.priority;
                reverse.push((sense.gloss.clone(), back, entry.category));
            }
        }
        for (gloss, sense, category) in reverse {
            let key = normalize_key(&gloss);
            let id = match index.get(&key) {
                // Explicitly registered headwords keep their own senses.
                Some(&id) if id < explicit => continue,
                Some(&id) => id,
                None => {
                    let reverse_direction = if is_korean(&gloss) {
                        EntryDirection::KoEn
                    } else {
                        EntryDirection::EnKo
                    };
                    let mut entry = DictionaryEntry::new(&gloss, Vec::new());
                    entry.direction = reverse_direction;
                    entry.category = if key.contains(' ') && category == Category::Word {
                        Category::Compound
                    } else {
                        category
                    };
                    index.insert(key, entries.len());
                    entries.push(entry);
                    entries.len() - 1
                }
            };
            let target = &mut entries[id];
            if !target.senses.iter().any(|s| s.gloss == sense.gloss) {
                target.senses.push(sense);
            }
        }
        for entry in entries.iter_mut().skip(explicit) {
            sort_senses(&mut entry.senses);
        }

        let mut store = DictionaryStore {
            entries,
            ko_words: HashMap::new(),
            en_words: HashMap::new(),
            ko_phrases: HashMap::new(),
            en_phrases: HashMap::new(),
            max_phrase_words: 1,
            domains: BTreeMap::new(),
        };
        for (id, entry) in store.entries.iter().enumerate() {
            let key = normalize_key(&entry.headword);
            let korean = is_korean(&entry.headword);
            let multiword = key.contains(' ');
            if multiword || entry.category.is_phrase() {
                store.max_phrase_words = store.max_phrase_words.max(key.split(' ').count());
                let table = if korean { &mut store.ko_phrases } else { &mut store.en_phrases };
                table.insert(key.clone(), id);
            }
            if !multiword {
                let table = if korean { &mut store.ko_words } else { &mut store.en_words };
                table.insert(key, id);
            }
            for sense in &entry.senses {
                for tag in sense.domain_tags.iter().filter(|t| !is_attribute_tag(t)) {
                    let ids = store.domains.entry(tag.clone()).or_default();
                    if ids.last() != Some(&id) {
                        ids.push(id);
                    }
                }
            }
        }
        info!(
            entries = store.entries.len(),
            domains = store.domains.len(),
            "dictionary store frozen"
        );
        store
    }
}

/// An entry within fuzzy distance of a query.
#[derive(Debug, Clone, Copy)]
pub struct FuzzyMatch<'a> {
    pub entry: &'a DictionaryEntry,
    pub distance: f64,
}

/// Immutable dictionary shared by every translation call.
#[derive(Debug)]
pub struct DictionaryStore {
    entries: Vec<DictionaryEntry>,
    ko_words: HashMap<String, EntryId>,
    en_words: HashMap<String, EntryId>,
    ko_phrases: HashMap<String, EntryId>,
    en_phrases: HashMap<String, EntryId>,
    max_phrase_words: usize,
    domains: BTreeMap<String, Vec<EntryId>>,
}

impl DictionaryStore {
    pub fn builder() -> DictionaryBuilder {
        DictionaryBuilder::new()
    }

    /// Store holding only the bundled partitions.
    pub fn builtin() -> Result<Self, DictionaryError> {
        Ok(Self::builder().with_builtin()?.build())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: EntryId) -> Option<&DictionaryEntry> {
        self.entries.get(id)
    }

    fn words(&self, direction: Direction) -> &HashMap<String, EntryId> {
        match direction {
            Direction::KoEn => &self.ko_words,
            Direction::EnKo => &self.en_words,
        }
    }

    fn phrases(&self, direction: Direction) -> &HashMap<String, EntryId> {
        match direction {
            Direction::KoEn => &self.ko_phrases,
            Direction::EnKo => &self.en_phrases,
        }
    }

    /// Exact single-word lookup; English is case-insensitive.
    pub fn lookup(&self, word: &str, direction: Direction) -> Option<&DictionaryEntry> {
        self.words(direction)
            .get(&normalize_key(word))
            .map(|&id| &self.entries[id])
    }

    pub fn contains(&self, word: &str, direction: Direction) -> bool {
        self.words(direction).contains_key(&normalize_key(word))
    }

    /// Longest idiom or phrasal verb starting at `words[0]`.
    /// Returns the number of words consumed with the matching entry.
    pub fn lookup_phrase(&self, words: &[&str], direction: Direction) -> Option<(usize, &DictionaryEntry)> {
        let table = self.phrases(direction);
        let longest = self.max_phrase_words.min(words.len());
        (1..=longest).rev().find_map(|n| {
            let key = normalize_key(&words[..n].join(" "));
            table.get(&key).map(|&id| (n, &self.entries[id]))
        })
    }

    /// Entries within `max_distance` of `word`, nearest first, then by priority.
    ///
    /// Korean uses keyboard-weighted jamo distance, English plain Levenshtein.
    pub fn fuzzy_lookup(&self, word: &str, direction: Direction, max_distance: f64) -> Vec<FuzzyMatch<'_>> {
        let query = normalize_key(word);
        let korean = is_korean(&query);
        let query_len = if korean { jamo::to_jamo(&query).len() } else { query.chars().count() } as f64;
        let mut found: Vec<(EntryId, f64)> = self
            .words(direction)
            .iter()
            .filter_map(|(key, &id)| {
                let key_len = if korean { jamo::to_jamo(key).len() } else { key.chars().count() } as f64;
                if (key_len - query_len).abs() > max_distance {
                    return None;
                }
                let distance = if korean {
                    jamo::jamo_edit_distance(&query, key)
                } else {
                    jamo::levenshtein(&query, key) as f64
                };
                (distance <= max_distance).then_some((id, distance))
            })
            .collect();
        found.sort_by(|a, b| {
            a.1.total_cmp(&b.1)
                .then_with(|| self.entries[b.0].top_priority().total_cmp(&self.entries[a.0].top_priority()))
                .then_with(|| a.0.cmp(&b.0))
        });
        found
            .into_iter()
            .map(|(id, distance)| FuzzyMatch { entry: &self.entries[id], distance })
            .collect()
    }

    /// Korean verb or adjective registered under `stem + 다`.
    pub fn korean_predicate(&self, stem: &str) -> Option<&DictionaryEntry> {
        if stem.is_empty() {
            return None;
        }
        self.lookup(&format!("{}다", stem), Direction::KoEn).filter(|e| {
            e.senses
                .iter()
                .any(|s| matches!(s.pos, PartOfSpeech::Verb | PartOfSpeech::Adjective))
        })
    }

    pub fn domain_names(&self) -> impl Iterator<Item = &str> {
        self.domains.keys().map(String::as_str)
    }

    pub fn entries_in_domain(&self, domain: &str) -> impl Iterator<Item = &DictionaryEntry> {
        self.domains
            .get(domain)
            .into_iter()
            .flatten()
            .map(|&id| &self.entries[id])
    }

    pub fn iter(&self) -> impl Iterator<Item = &DictionaryEntry> {
        self.entries.iter()
    }
}

// --- Declension tables ---

/// Korean case particles whose form depends on the preceding syllable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleCase {
    Topic,
    Subject,
    Object,
    Comitative,
    Directional,
    Copula,
}

/// Picks the allomorph of `case` that follows `word`.
pub fn particle_for(word: &str, case: ParticleCase) -> &'static str {
    let coda = jamo::final_coda(word);
    let closed = has_batchim(word);
    match case {
        ParticleCase::Topic => if closed { "은" } else { "는" },
        ParticleCase::Subject => if closed { "이" } else { "가" },
        ParticleCase::Object => if closed { "을" } else { "를" },
        ParticleCase::Comitative => if closed { "과" } else { "와" },
        ParticleCase::Directional => {
            if closed && coda != Some('ㄹ') { "으로" } else { "로" }
        }
        ParticleCase::Copula => if closed { "이다" } else { "다" },
    }
}

/// English personal pronoun paradigm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PronounForms {
    pub nominative: &'static str,
    pub accusative: &'static str,
    pub possessive: &'static str,
    pub person: u8,
    pub plural: bool,
}

pub const ENGLISH_PRONOUNS: &[PronounForms] = &[
    PronounForms { nominative: "I", accusative: "me", possessive: "my", person: 1, plural: false },
    PronounForms { nominative: "you", accusative: "you", possessive: "your", person: 2, plural: false },
    PronounForms { nominative: "he", accusative: "him", possessive: "his", person: 3, plural: false },
    PronounForms { nominative: "she", accusative: "her", possessive: "her", person: 3, plural: false },
    PronounForms { nominative: "it", accusative: "it", possessive: "its", person: 3, plural: false },
    PronounForms { nominative: "we", accusative: "us", possessive: "our", person: 1, plural: true },
    PronounForms { nominative: "they", accusative: "them", possessive: "their", person: 3, plural: true },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PronounCase {
    Nominative,
    Accusative,
    Possessive,
}

impl PronounForms {
    pub fn form(&self, case: PronounCase) -> &'static str {
        match case {
            PronounCase::Nominative => self.nominative,
            PronounCase::Accusative => self.accusative,
            PronounCase::Possessive => self.possessive,
        }
    }
}

/// Paradigm whose nominative is `lemma`.
pub fn english_pronoun(lemma: &str) -> Option<&'static PronounForms> {
    ENGLISH_PRONOUNS
        .iter()
        .find(|p| p.nominative.eq_ignore_ascii_case(lemma))
}

/// Paradigm and case of any inflected pronoun form ("him" -> he, accusative).
/// "her" resolves to the accusative reading.
pub fn parse_english_pronoun(form: &str) -> Option<(&'static PronounForms, PronounCase)> {
    let lower = form.to_lowercase();
    ENGLISH_PRONOUNS.iter().find_map(|p| {
        if p.nominative.eq_ignore_ascii_case(&lower) {
            Some((p, PronounCase::Nominative))
        } else if p.accusative == lower {
            Some((p, PronounCase::Accusative))
        } else if p.possessive == lower {
            Some((p, PronounCase::Possessive))
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(headword: &str, gloss: &str, priority: f64) -> DictionaryEntry {
        let mut sense = Sense::new(gloss, PartOfSpeech::Noun);
        sense.priority = priority;
        DictionaryEntry::new(headword, vec![sense])
    }

    #[test]
    fn builtin_partitions_load() {
        let store = DictionaryStore::builtin().expect("bundled data must parse");
        assert!(store.len() > 200);
        assert!(store.lookup("학교", Direction::KoEn).is_some());
        assert_eq!(store.lookup("School", Direction::EnKo).unwrap().primary().gloss, "학교");
        assert!(store.domain_names().any(|d| d == "technology"));
    }

    #[test]
    fn polysemous_senses_are_priority_ordered() {
        let store = DictionaryStore::builtin().unwrap();
        let cha = store.lookup("차", Direction::KoEn).unwrap();
        assert!(cha.is_polysemous());
        let ids: Vec<&str> = cha.senses.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["car", "tea", "difference"]);
    }

    #[test]
    fn idiom_is_matched_before_single_words() {
        let store = DictionaryStore::builtin().unwrap();
        let words = ["piece", "of", "cake", "today"];
        let (n, entry) = store.lookup_phrase(&words, Direction::EnKo).unwrap();
        assert_eq!(n, 3);
        assert_eq!(entry.category, Category::Idiom);
    }

    #[test]
    fn fuzzy_lookup_sorts_by_distance() {
        let mut builder = DictionaryStore::builder();
        builder
            .inject(vec![entry("학교", "school", 1.0), entry("학생", "student", 1.0)])
            .unwrap();
        let store = builder.build();
        let found = store.fuzzy_lookup("핵교", Direction::KoEn, 1.5);
        assert_eq!(found[0].entry.headword, "학교");
        assert!(found.iter().all(|m| m.distance <= 1.5));
    }

    #[test]
    fn injection_respects_override_flag() {
        let mut builder = DictionaryStore::builder();
        builder.inject(vec![entry("사과", "apple", 1.0)]).unwrap();

        let report = builder.inject(vec![entry("사과", "apple", 5.0)]).unwrap();
        assert_eq!(report.skipped_senses, 1);

        let mut forced = entry("사과", "apple", 5.0);
        forced.override_existing = true;
        let report = builder.inject(vec![forced, entry("사과", "apology", 0.5)]).unwrap();
        assert_eq!(report.replaced_senses, 1);
        assert_eq!(report.added_senses, 1);

        let store = builder.build();
        let sagwa = store.lookup("사과", Direction::KoEn).unwrap();
        assert_eq!(sagwa.senses[0].priority, 5.0);
        assert_eq!(sagwa.senses.len(), 2);
    }

    #[test]
    fn invalid_entries_are_rejected_at_load() {
        let mut builder = DictionaryStore::builder();
        assert!(matches!(
            builder.inject(vec![DictionaryEntry::new("  ", vec![Sense::new("x", PartOfSpeech::Noun)])]),
            Err(DictionaryError::EmptyHeadword)
        ));
        assert!(matches!(
            builder.inject(vec![DictionaryEntry::new("빈", vec![])]),
            Err(DictionaryError::NoSenses { .. })
        ));
        assert!(matches!(
            builder.inject(vec![entry("값", "value", f64::NAN)]),
            Err(DictionaryError::InvalidSense { .. })
        ));
    }

    #[test]
    fn particle_allomorphs_follow_final_consonant() {
        assert_eq!(particle_for("학생", ParticleCase::Topic), "은");
        assert_eq!(particle_for("학교", ParticleCase::Object), "를");
        assert_eq!(particle_for("지하철", ParticleCase::Directional), "로");
        assert_eq!(particle_for("버스", ParticleCase::Directional), "로");
        assert_eq!(particle_for("책상", ParticleCase::Directional), "으로");
        assert_eq!(particle_for("의사", ParticleCase::Copula), "다");
    }

    #[test]
    fn pronoun_cases() {
        let (p, case) = parse_english_pronoun("him").unwrap();
        assert_eq!(p.nominative, "he");
        assert_eq!(case, PronounCase::Accusative);
        assert_eq!(english_pronoun("we").unwrap().form(PronounCase::Possessive), "our");
    }
}
