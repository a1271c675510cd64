// src/core/types.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A unique identifier for a registered dictionary entry (its registration index).
pub type EntryId = usize;

/// Translation direction requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "ko-en")]
    KoEn,
    #[serde(rename = "en-ko")]
    EnKo,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::KoEn => "ko-en",
            Direction::EnKo => "en-ko",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ko-en" | "ko" | "koen" => Ok(Direction::KoEn),
            "en-ko" | "en" | "enko" => Ok(Direction::EnKo),
            other => Err(format!("unknown direction '{}', expected ko-en or en-ko", other)),
        }
    }
}

/// Which way a dictionary record may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryDirection {
    KoEn,
    EnKo,
    #[default]
    Bidirectional,
}

/// Structural category of an entry. Idioms and phrasal verbs are matched
/// before single words (longest match first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    #[default]
    Word,
    Compound,
    Idiom,
    PhrasalVerb,
    ProperNoun,
}

impl Category {
    pub fn is_phrase(&self) -> bool {
        matches!(self, Category::Idiom | Category::PhrasalVerb)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PartOfSpeech {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Pronoun,
    Determiner,
    Numeral,
    Interjection,
    Phrase,
}

/// One meaning of a headword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sense {
    /// Stable identifier; defaults to the gloss when the source leaves it empty.
    #[serde(default)]
    pub id: String,
    pub gloss: String,
    pub pos: PartOfSpeech,
    #[serde(default, rename = "domains")]
    pub domain_tags: BTreeSet<String>,
    #[serde(default = "default_priority")]
    pub priority: f64,
    /// Co-occurring keywords that favour this sense.
    #[serde(default)]
    pub triggers: Vec<String>,
}

fn default_priority() -> f64 {
    1.0
}

impl Sense {
    pub fn new(gloss: &str, pos: PartOfSpeech) -> Self {
        Self {
            id: gloss.to_string(),
            gloss: gloss.to_string(),
            pos,
            domain_tags: BTreeSet::new(),
            priority: default_priority(),
            triggers: Vec::new(),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.domain_tags.contains(tag)
    }
}

/// A headword with its senses, ordered by priority (highest first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub headword: String,
    pub senses: Vec<Sense>,
    #[serde(default)]
    pub direction: EntryDirection,
    #[serde(default)]
    pub category: Category,
    /// Replace senses already registered under the same headword and gloss.
    #[serde(default, rename = "override")]
    pub override_existing: bool,
}

impl DictionaryEntry {
    pub fn new(headword: &str, senses: Vec<Sense>) -> Self {
        Self {
            headword: headword.to_string(),
            senses,
            direction: EntryDirection::default(),
            category: Category::default(),
            override_existing: false,
        }
    }

    /// Context-free default sense.
    pub fn primary(&self) -> &Sense {
        &self.senses[0]
    }

    pub fn is_polysemous(&self) -> bool {
        self.senses.len() > 1
    }

    pub fn top_priority(&self) -> f64 {
        self.senses.first().map(|s| s.priority).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MorphemeKind {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Pronoun,
    Determiner,
    Numeral,
    Interjection,
    Particle,
    Ending,
    Inflection,
    /// English closed-class words handled by the grammar rather than the dictionary.
    Preposition,
    Conjunction,
    Auxiliary,
    Unknown,
}

impl From<PartOfSpeech> for MorphemeKind {
    fn from(pos: PartOfSpeech) -> Self {
        match pos {
            PartOfSpeech::Noun | PartOfSpeech::Phrase => MorphemeKind::Noun,
            PartOfSpeech::Verb => MorphemeKind::Verb,
            PartOfSpeech::Adjective => MorphemeKind::Adjective,
            PartOfSpeech::Adverb => MorphemeKind::Adverb,
            PartOfSpeech::Pronoun => MorphemeKind::Pronoun,
            PartOfSpeech::Determiner => MorphemeKind::Determiner,
            PartOfSpeech::Numeral => MorphemeKind::Numeral,
            PartOfSpeech::Interjection => MorphemeKind::Interjection,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrammaticalRole {
    Subject,
    Topic,
    Object,
    Possessive,
    Locative,
    Source,
    Directional,
    Instrumental,
    Comitative,
    Dative,
    Additive,
    Restrictive,
    Comparative,
    Similative,
    Distributive,
    Limit,
    Origin,
    /// Copula (`이다`) attached to a noun.
    Copula,
    Predicate,
    /// Clause-linking ending.
    Connective(Connective),
    /// Adnominal (modifier) ending.
    Modifier,
    /// Sentence-final ending (mood/politeness carrier).
    Final,
    Tense,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Connective {
    And,
    So,
    But,
    If,
    Because,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tense {
    Present,
    Past,
    Future,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Inflection {
    Past,
    PastParticiple,
    Progressive,
    ThirdPerson,
    Plural,
    Possessive,
    Comparative,
    Superlative,
}

/// Smallest meaningful unit produced by the analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Morpheme {
    pub surface: String,
    pub lemma: String,
    pub kind: MorphemeKind,
    pub role: GrammaticalRole,
    #[serde(default)]
    pub tense: Option<Tense>,
    #[serde(default)]
    pub inflection: Option<Inflection>,
}

impl Morpheme {
    pub fn new(surface: &str, lemma: &str, kind: MorphemeKind, role: GrammaticalRole) -> Self {
        Self {
            surface: surface.to_string(),
            lemma: lemma.to_string(),
            kind,
            role,
            tense: None,
            inflection: None,
        }
    }

    /// Pass-through morpheme for a token nothing could resolve.
    pub fn unknown(surface: &str) -> Self {
        Self::new(surface, surface, MorphemeKind::Unknown, GrammaticalRole::None)
    }

    pub fn with_tense(mut self, tense: Tense) -> Self {
        self.tense = Some(tense);
        self
    }

    pub fn with_inflection(mut self, inflection: Inflection) -> Self {
        self.inflection = Some(inflection);
        self
    }

    pub fn is_stem(&self) -> bool {
        !matches!(
            self.kind,
            MorphemeKind::Particle | MorphemeKind::Ending | MorphemeKind::Inflection
        ) && !self.is_function_word()
    }

    pub fn is_function_word(&self) -> bool {
        matches!(
            self.kind,
            MorphemeKind::Preposition | MorphemeKind::Conjunction | MorphemeKind::Auxiliary
        )
    }

    pub fn is_predicate(&self) -> bool {
        matches!(self.kind, MorphemeKind::Verb | MorphemeKind::Adjective)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Formality {
    Casual,
    Formal,
    #[default]
    Neutral,
    Friendly,
    Literal,
}

impl FromStr for Formality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "casual" => Ok(Formality::Casual),
            "formal" => Ok(Formality::Formal),
            "neutral" => Ok(Formality::Neutral),
            "friendly" => Ok(Formality::Friendly),
            "literal" => Ok(Formality::Literal),
            other => Err(format!("unknown formality '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TranslateOptions {
    #[serde(default)]
    pub formality: Option<Formality>,
}

impl TranslateOptions {
    pub fn with_formality(formality: Formality) -> Self {
        Self { formality: Some(formality) }
    }
}

/// Non-fatal conditions recorded during a translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Warning {
    UnresolvedToken { surface: String },
    AmbiguousSense { word: String, chosen: String, candidates: Vec<String> },
    /// A word outside the dictionary was read as a near headword.
    TypoCorrected { surface: String, corrected: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnresolvedToken { surface } => {
                write!(f, "unresolved token '{}' passed through", surface)
            }
            Warning::AmbiguousSense { word, chosen, candidates } => write!(
                f,
                "ambiguous sense for '{}': tie between {} resolved to '{}'",
                word,
                candidates.join("/"),
                chosen
            ),
            Warning::TypoCorrected { surface, corrected } => {
                write!(f, "'{}' read as a typo of '{}'", surface, corrected)
            }
        }
    }
}

/// Outcome of one `translate` call. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationResult {
    output: String,
    confidence: f64,
    matched_entries: Vec<DictionaryEntry>,
    warnings: Vec<Warning>,
}

impl TranslationResult {
    pub(crate) fn new(
        output: String,
        confidence: f64,
        matched_entries: Vec<DictionaryEntry>,
        warnings: Vec<Warning>,
    ) -> Self {
        Self {
            output,
            confidence: confidence.clamp(0.0, 1.0),
            matched_entries,
            warnings,
        }
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn matched_entries(&self) -> &[DictionaryEntry] {
        &self.matched_entries
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }

    pub fn into_output(self) -> String {
        self.output
    }
}

/// Intermediate spacing artifact handed to the analyzer.
#[derive(Debug, Clone, PartialEq)]
pub struct SpacingCorrection {
    pub tokens: Vec<String>,
    pub confidence: f64,
}

impl SpacingCorrection {
    pub fn text(&self) -> String {
        self.tokens.join(" ")
    }
}
