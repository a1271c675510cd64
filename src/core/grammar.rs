// File: src/core/grammar.rs
//! Clause restructuring and target-language generation.
//!
//! Korean is head-final with roles marked by particles; English is SVO with
//! roles marked by position. Each direction parses a sentence of resolved
//! words into a small clause structure, then renders that structure in the
//! target order, adding what the source leaves implicit: articles, auxiliaries
//! and elided subjects for English; particles and speech-level endings for
//! Korean.

use crate::core::context::{Entity, EntityRole, EntityTracker, Gender};
use crate::core::dictionary::{english_pronoun, particle_for, ParticleCase, PronounCase, PronounForms};
use crate::core::jamo::{final_coda, has_batchim, replace_last, decompose};
use crate::core::morphology::{
    eu_linked, formal_present, infinitive, inflect, modifier_form, past_stem, plain_present,
};
use crate::core::types::{
    Category, Connective, Formality, GrammaticalRole, Inflection, Morpheme, MorphemeKind, PartOfSpeech, Sense, Tense,
};
use std::collections::BTreeSet;
use tracing::trace;

use GrammaticalRole as R;

const QUESTION_ENDINGS: &[&str] = &["니", "냐", "습니까", "니까", "까"];
const IMPERATIVE_ENDINGS: &[&str] = &["세요", "으세요", "십시오", "으십시오", "어라", "아라"];
const PLURAL_NUMBERS: &[&str] = &["two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "many"];
/// Native Korean numbers as they appear before a counter (세 개, 네 명).
const COUNTED_NUMBERS: &[(&str, &str)] = &[
    ("한", "one"),
    ("두", "two"),
    ("세", "three"),
    ("네", "four"),
    ("다섯", "five"),
    ("여섯", "six"),
    ("일곱", "seven"),
    ("여덟", "eight"),
    ("아홉", "nine"),
    ("열", "ten"),
];
/// Counters and what they count when no noun precedes the number.
const COUNTERS: &[(&str, &str)] = &[
    ("개", "item"),
    ("명", "person"),
    ("분", "person"),
    ("마리", "animal"),
    ("권", "book"),
    ("잔", "cup"),
    ("병", "bottle"),
    ("장", "sheet"),
    ("대", "machine"),
    ("그릇", "bowl"),
    ("송이", "flower"),
    ("켤레", "pair"),
];
const DEMONSTRATIVES: &[&str] = &["this", "that", "these", "those"];
/// Adverbs placed before the verb rather than at the end of the clause.
const MID_ADVERBS: &[&str] = &["always", "often", "already", "still", "really", "never", "usually", "very", "too"];
/// Korean stems that conjugate like adjectives in the plain style (있다, not 있는다).
const STATIVE_STEMS: &[&str] = &["있", "없", "계시"];

/// Target-language rendering of a resolved source word.
#[derive(Debug, Clone, PartialEq)]
pub struct Gloss {
    pub text: String,
    pub pos: PartOfSpeech,
    pub tags: BTreeSet<String>,
    pub category: Category,
}

impl Gloss {
    pub fn from_sense(sense: &Sense, category: Category) -> Self {
        Self {
            text: sense.gloss.clone(),
            pos: sense.pos,
            tags: sense.domain_tags.clone(),
            category,
        }
    }

    fn has(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Modality {
    #[default]
    Plain,
    Progressive,
    Want,
    Can,
    Cannot,
    Future,
    /// -ㄹ 것 같다: will probably.
    Probably,
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Appends the sentence mark. Fragments (greetings, bare nouns) only keep
/// punctuation the source had.
fn punctuate(body: String, terminal: Option<char>, question: bool, full: bool) -> String {
    if body.is_empty() {
        return body;
    }
    match (question, terminal) {
        (true, _) => format!("{}?", body),
        (false, Some(mark)) => format!("{}{}", body, mark),
        (false, None) if full => format!("{}.", body),
        (false, None) => body,
    }
}

// ---------------------------------------------------------------------------
// Korean → English
// ---------------------------------------------------------------------------

/// One Korean word (eojeol) after analysis and sense resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct KoreanWord {
    pub surface: String,
    pub morphemes: Vec<Morpheme>,
    /// `None` when nothing resolved the stem; the surface is passed through.
    pub gloss: Option<Gloss>,
    /// Matched as a whole idiom; the gloss is emitted verbatim.
    pub idiom: bool,
    /// Earlier entity a pronoun (그녀, 그것) points back at.
    pub referent: Option<Entity>,
}

impl KoreanWord {
    pub fn new(surface: &str, morphemes: Vec<Morpheme>, gloss: Option<Gloss>) -> Self {
        Self { surface: surface.to_string(), morphemes, gloss, idiom: false, referent: None }
    }

    /// A matched idiom; `headword` is its dictionary form (눈이 높다 for 눈이 높아요).
    pub fn idiom(surface: &str, headword: &str, gloss: Gloss) -> Self {
        let kind = MorphemeKind::from(gloss.pos);
        Self {
            surface: surface.to_string(),
            morphemes: vec![Morpheme::new(surface, headword, kind, R::None)],
            gloss: Some(gloss),
            idiom: true,
            referent: None,
        }
    }

    fn stem(&self) -> Option<&Morpheme> {
        self.morphemes.first()
    }

    fn lemma(&self) -> &str {
        self.stem().map(|m| m.lemma.as_str()).unwrap_or("")
    }

    fn affixes(&self) -> &[Morpheme] {
        self.morphemes.get(1..).unwrap_or(&[])
    }

    fn text(&self) -> String {
        match &self.gloss {
            Some(g) => g.text.clone(),
            None => self.stem().map(|m| m.surface.clone()).unwrap_or_else(|| self.surface.clone()),
        }
    }

    fn is_predicate(&self) -> bool {
        !self.idiom && self.stem().map_or(false, Morpheme::is_predicate)
    }

    fn is_nominal(&self) -> bool {
        !self.idiom
            && self.stem().map_or(false, |m| {
                matches!(m.kind, MorphemeKind::Noun | MorphemeKind::Pronoun | MorphemeKind::Unknown)
            })
    }

    /// Case role of the attached particles. Stacked particles (학교에서는)
    /// report the inner, more specific role.
    fn case_role(&self) -> Option<GrammaticalRole> {
        let roles: Vec<GrammaticalRole> = self
            .affixes()
            .iter()
            .filter(|m| m.kind == MorphemeKind::Particle && !matches!(m.role, R::Additive | R::Restrictive))
            .map(|m| m.role)
            .collect();
        roles
            .iter()
            .copied()
            .find(|r| *r != R::Topic)
            .or_else(|| roles.first().copied())
    }

    fn has_role(&self, role: GrammaticalRole) -> bool {
        self.affixes().iter().any(|m| m.role == role)
    }

    fn copula(&self) -> Option<&Morpheme> {
        self.affixes().iter().find(|m| m.role == R::Copula)
    }

    fn connective(&self) -> Option<Connective> {
        match self.affixes().last()?.role {
            R::Connective(c) => Some(c),
            _ => None,
        }
    }

    fn last_ending(&self) -> Option<&Morpheme> {
        self.affixes().last().filter(|m| m.kind == MorphemeKind::Ending)
    }

    fn is_modifier(&self) -> bool {
        self.last_ending().map_or(false, |m| m.role == R::Modifier)
    }

    fn has_explicit_tense(&self) -> bool {
        self.affixes().iter().any(|m| m.role == R::Tense)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Subject,
    Object,
    Complement,
    Oblique,
    Bare,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Article {
    Definite,
    Indefinite,
}

#[derive(Debug, Clone, Default)]
struct NounPhrase {
    head: String,
    korean: String,
    tags: BTreeSet<String>,
    proper: bool,
    pronoun: Option<&'static PronounForms>,
    modifiers: Vec<String>,
    possessor: Option<Box<NounPhrase>>,
    conjuncts: Vec<NounPhrase>,
    plural: bool,
    question: bool,
    only: bool,
    every: bool,
    /// Antecedent of a pronoun, re-mentioned instead of the pronoun itself.
    referent: Option<Entity>,
}

impl NounPhrase {
    fn from_word(word: &KoreanWord) -> Self {
        let korean = word.lemma().to_string();
        match &word.gloss {
            Some(g) => {
                let pronoun = if g.pos == PartOfSpeech::Pronoun { english_pronoun(&g.text) } else { None };
                Self {
                    head: g.text.clone(),
                    korean,
                    tags: g.tags.clone(),
                    proper: g.category == Category::ProperNoun
                        || word.idiom
                        || (g.pos == PartOfSpeech::Pronoun && pronoun.is_none()),
                    pronoun,
                    plural: g.has("plural") && pronoun.is_none(),
                    question: g.has("question"),
                    referent: word.referent.clone(),
                    ..Default::default()
                }
            }
            None => Self { head: word.text(), korean, proper: true, ..Default::default() },
        }
    }

    /// Bare counter (두 명, 세 잔) standing for what it counts.
    fn counted(counter: &str, fallback: &str) -> Self {
        let mut tags = BTreeSet::new();
        if fallback == "person" {
            tags.insert("person".to_string());
        }
        Self { head: fallback.to_string(), korean: counter.to_string(), tags, ..Default::default() }
    }

    fn pronoun(lemma: &str) -> Self {
        let forms = english_pronoun(lemma);
        let mut tags = BTreeSet::new();
        if lemma != "it" {
            tags.insert("person".to_string());
        }
        Self {
            head: forms.map(|p| p.nominative).unwrap_or(lemma).to_string(),
            korean: lemma.to_string(),
            tags,
            pronoun: forms,
            ..Default::default()
        }
    }

    /// A pronoun standing for a tracked entity.
    fn from_entity(entity: &Entity) -> Self {
        if english_pronoun(&entity.english).is_some() {
            return Self::pronoun(&entity.english);
        }
        let lemma = if entity.plural {
            "they"
        } else {
            match entity.gender {
                Gender::Male => "he",
                Gender::Female => "she",
                Gender::Unknown => "they",
                Gender::Neuter => "it",
            }
        };
        let mut np = Self::pronoun(lemma);
        np.korean = entity.korean.clone();
        np
    }

    fn has(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// (person, plural) for verb agreement.
    fn agreement(&self) -> (u8, bool) {
        if !self.conjuncts.is_empty() {
            return (3, true);
        }
        match self.pronoun {
            Some(p) => (p.person, p.plural),
            None => (3, self.plural),
        }
    }

    fn entity(&self, role: EntityRole) -> Entity {
        if let Some(referent) = &self.referent {
            return Entity { role, ..referent.clone() };
        }
        let mut tags = self.tags.clone();
        if let Some(p) = self.pronoun {
            if p.plural {
                tags.insert("plural".to_string());
            }
            match p.nominative {
                "he" => {
                    tags.insert("male".to_string());
                }
                "she" => {
                    tags.insert("female".to_string());
                }
                _ => {}
            }
        }
        let korean = if self.korean.is_empty() { &self.head } else { &self.korean };
        Entity::from_tags(korean, &self.head, &tags, role, self.proper)
    }

    fn article(&self, position: Position, tracker: &EntityTracker) -> Option<Article> {
        if self.proper || self.question || self.has("mass") || self.has("place-no-article") {
            return None;
        }
        if self.modifiers.first().map_or(false, |m| DEMONSTRATIVES.contains(&m.as_str())) {
            return None;
        }
        if self.has("time") {
            return (position == Position::Oblique).then_some(Article::Definite);
        }
        if position != Position::Bare && tracker.contains_english(&self.head) {
            return Some(Article::Definite);
        }
        match position {
            Position::Subject | Position::Oblique => Some(Article::Definite),
            Position::Object | Position::Complement if !self.plural => Some(Article::Indefinite),
            _ => None,
        }
    }

    fn render(&self, position: Position, tracker: &EntityTracker) -> String {
        let mut parts: Vec<String> = self.conjuncts.iter().map(|c| c.render_single(position, tracker)).collect();
        parts.push(self.render_single(position, tracker));
        match parts.len() {
            1 => parts.remove(0),
            n => format!("{} and {}", parts[..n - 1].join(", "), parts[n - 1]),
        }
    }

    fn render_single(&self, position: Position, tracker: &EntityTracker) -> String {
        if let Some(p) = self.pronoun {
            let case = match position {
                Position::Subject | Position::Complement => PronounCase::Nominative,
                _ => PronounCase::Accusative,
            };
            return p.form(case).to_string();
        }
        let mut head = self.head.clone();
        if self.plural && !self.proper && !self.has("plural") && !self.has("mass") {
            head = inflect(&head, Inflection::Plural);
        }
        let mut words: Vec<String> = Vec::new();
        if self.only {
            words.push("only".to_string());
        }
        let article = if let Some(owner) = &self.possessor {
            words.push(owner.possessive(tracker));
            None
        } else if self.every {
            words.push("every".to_string());
            None
        } else {
            self.article(position, tracker)
        };
        words.extend(self.modifiers.iter().cloned());
        words.push(head);
        match article {
            Some(Article::Definite) => words.insert(words.len() - self.modifiers.len() - 1, "the".to_string()),
            Some(Article::Indefinite) => {
                let next = self.modifiers.first().unwrap_or(&self.head);
                let a = if next.starts_with(|c: char| "aeiouAEIOU".contains(c)) { "an" } else { "a" };
                words.insert(words.len() - self.modifiers.len() - 1, a.to_string());
            }
            None => {}
        }
        words.join(" ")
    }

    fn possessive(&self, tracker: &EntityTracker) -> String {
        match self.pronoun {
            Some(p) => p.possessive.to_string(),
            None => inflect(&self.render_single(Position::Subject, tracker), Inflection::Possessive),
        }
    }
}

/// English clause assembled from one Korean clause.
#[derive(Debug, Clone, Default)]
struct EnglishClause {
    interjections: Vec<String>,
    subject: Option<NounPhrase>,
    second_subject: Option<NounPhrase>,
    object: Option<NounPhrase>,
    complement: Option<NounPhrase>,
    fragments: Vec<NounPhrase>,
    adjective: Option<String>,
    verb: Option<String>,
    verb_tags: BTreeSet<String>,
    predicate_lemma: String,
    obliques: Vec<(GrammaticalRole, NounPhrase)>,
    adverbs: Vec<String>,
    wh_adverb: Option<String>,
    times: Vec<NounPhrase>,
    tense: Option<Tense>,
    explicit_tense: bool,
    negated: bool,
    modality: Modality,
    question: bool,
    imperative: bool,
    polite: bool,
    also: bool,
    connective: Option<Connective>,
}

enum Lexical {
    Be(Option<String>),
    Verb(String),
}

struct VerbGroup {
    aux: Option<String>,
    rest: Vec<String>,
}

fn be_form(tense: Tense, person: u8, plural: bool) -> &'static str {
    match tense {
        Tense::Past if plural || person == 2 => "were",
        Tense::Past => "was",
        _ if person == 1 && !plural => "am",
        _ if plural || person == 2 => "are",
        _ => "is",
    }
}

fn do_form(tense: Tense, person: u8, plural: bool) -> &'static str {
    match tense {
        Tense::Past => "did",
        _ if person == 3 && !plural => "does",
        _ => "do",
    }
}

fn finite(verb: &str, tense: Tense, person: u8, plural: bool) -> String {
    match tense {
        Tense::Past => inflect(verb, Inflection::Past),
        _ if person == 3 && !plural => inflect(verb, Inflection::ThirdPerson),
        _ => verb.to_string(),
    }
}

#[allow(clippy::too_many_arguments)]
fn verb_group(
    lexical: &Lexical,
    modality: Modality,
    tense: Tense,
    negated: bool,
    invert: bool,
    (person, plural): (u8, bool),
    mid: &[String],
) -> VerbGroup {
    let past = tense == Tense::Past;
    let modal = match modality {
        Modality::Future | Modality::Probably => Some("will"),
        Modality::Can | Modality::Cannot => Some(if past { "could" } else { "can" }),
        _ => None,
    };
    let negated = negated || modality == Modality::Cannot;
    let mut rest: Vec<String> = Vec::new();
    if modality == Modality::Probably {
        rest.push("probably".to_string());
    }
    if negated {
        rest.push("not".to_string());
    }
    match lexical {
        Lexical::Be(predicate) => {
            let aux = match modal {
                Some(m) => {
                    rest.push("be".to_string());
                    m
                }
                None => be_form(tense, person, plural),
            };
            rest.extend(mid.iter().cloned());
            rest.extend(predicate.iter().cloned());
            VerbGroup { aux: Some(aux.to_string()), rest }
        }
        Lexical::Verb(verb) => {
            let verb = if modality == Modality::Want { format!("want to {}", verb) } else { verb.clone() };
            rest.extend(mid.iter().cloned());
            if modality == Modality::Progressive {
                rest.push(inflect(&verb, Inflection::Progressive));
                return VerbGroup { aux: Some(be_form(tense, person, plural).to_string()), rest };
            }
            if let Some(m) = modal {
                rest.push(verb);
                return VerbGroup { aux: Some(m.to_string()), rest };
            }
            if negated || invert {
                rest.push(verb);
                return VerbGroup { aux: Some(do_form(tense, person, plural).to_string()), rest };
            }
            rest.push(finite(&verb, tense, person, plural));
            VerbGroup { aux: None, rest }
        }
    }
}

fn preposition(role: GrammaticalRole, np: &NounPhrase, motion: bool, be: bool) -> Option<&'static str> {
    let time = np.has("time");
    match role {
        R::Locative if time => Some(if np.head == "weekend" { "on" } else { "in" }),
        R::Locative if motion && np.head == "home" => None,
        R::Locative if motion => Some("to"),
        R::Locative if be => Some(if np.has("place-no-article") { "at" } else { "in" }),
        R::Locative => Some("at"),
        R::Source if motion => Some("from"),
        R::Source => Some("at"),
        R::Directional if np.has("transport-mode") => Some("by"),
        R::Directional if motion => Some("to"),
        R::Directional => Some("with"),
        R::Comitative => Some("with"),
        R::Dative => Some("to"),
        R::Limit if time => Some("until"),
        R::Limit => Some("to"),
        R::Origin => Some("from"),
        R::Comparative => Some("than"),
        R::Similative => Some("like"),
        _ => None,
    }
}

/// English attributive form of a Korean modifier (큰 → big, 자는 → sleeping).
fn attributive(word: &KoreanWord) -> String {
    let text = word.text();
    if word.stem().map(|m| m.kind) != Some(MorphemeKind::Verb) {
        return text;
    }
    let completed = word.affixes().iter().any(|m| m.role == R::Modifier && matches!(m.surface.as_str(), "ㄴ" | "은"));
    if completed {
        inflect(&text, Inflection::PastParticiple)
    } else {
        inflect(&text, Inflection::Progressive)
    }
}

impl EnglishClause {
    fn has_predicate(&self) -> bool {
        self.verb.is_some() || self.adjective.is_some() || self.complement.is_some()
    }

    fn set_predicate(&mut self, word: &KoreanWord) {
        let Some(stem) = word.stem() else { return };
        self.predicate_lemma = stem.lemma.clone();
        let mut text = word.text();
        if let Some(rest) = text.strip_prefix("not ") {
            self.negated = !self.negated;
            text = rest.to_string();
        }
        let adjective = stem.kind == MorphemeKind::Adjective
            || word.gloss.as_ref().map_or(false, |g| g.pos == PartOfSpeech::Adjective);
        if adjective && text != "be" {
            self.adjective = Some(text);
        } else {
            self.verb_tags = word.gloss.as_ref().map(|g| g.tags.clone()).unwrap_or_default();
            self.verb = Some(text);
        }
    }

    /// Tense, mood and clause link carried by the word that ends the predicate.
    fn finish_with(&mut self, word: &KoreanWord) {
        let tense = word.stem().and_then(|m| m.tense);
        if word.has_explicit_tense() {
            self.tense = tense;
            self.explicit_tense = true;
        } else if self.tense.is_none() {
            self.tense = tense;
        }
        if let Some(end) = word.last_ending() {
            if end.role == R::Final {
                let surface = end.surface.as_str();
                self.question |= QUESTION_ENDINGS.contains(&surface);
                if IMPERATIVE_ENDINGS.contains(&surface) {
                    self.imperative = true;
                    self.polite = !matches!(surface, "어라" | "아라");
                }
            }
        }
        self.connective = word.connective();
    }

    /// Resolves constructions that need the whole clause.
    fn settle(&mut self) {
        // 나는 돈이 있다: possession.
        if matches!(self.predicate_lemma.as_str(), "있다" | "없다") && self.second_subject.is_some() {
            self.verb = Some("have".to_string());
            self.object = self.second_subject.take();
        }
        // 나는 학생이 아니다: the marked noun is the complement.
        if self.predicate_lemma == "아니다" {
            if let Some(np) = self.second_subject.take() {
                self.complement = Some(np);
                self.verb = None;
            }
        }
        // 나는 배가 아프다: the topic owns the subject.
        if self.adjective.is_some() {
            if let (Some(owner), Some(mut inner)) = (self.subject.take(), self.second_subject.take()) {
                if owner.pronoun.is_some() || owner.has("person") {
                    inner.possessor = Some(Box::new(owner));
                    self.subject = Some(inner);
                } else {
                    self.subject = Some(owner);
                    self.fragments.push(inner);
                }
            }
        }
        if let Some(np) = self.second_subject.take() {
            if self.object.is_none() {
                self.object = Some(np);
            } else {
                self.fragments.push(np);
            }
        }
        // 배가 아프다: a body part hurts, and is the speaker's unless owned.
        if self.predicate_lemma == "아프다" {
            if let Some(part) = self.subject.as_mut().filter(|s| s.has("body")) {
                if part.possessor.is_none() {
                    part.possessor = Some(Box::new(NounPhrase::pronoun("I")));
                }
                self.adjective = None;
                self.verb = Some("hurt".to_string());
            }
        }
        // 비가 오다, 눈이 오다: it rains, it snows.
        if self.predicate_lemma == "오다" {
            let weather = self.subject.as_ref().filter(|s| s.has("weather")).map(|s| s.head.clone());
            if let Some(verb) = weather {
                self.subject = Some(NounPhrase::pronoun("it"));
                self.verb = Some(verb);
                self.verb_tags.clear();
            }
        }
        if self.tense == Some(Tense::Future) && self.modality == Modality::Plain {
            self.modality = Modality::Future;
        }
    }

    fn render(&self, tracker: &EntityTracker) -> String {
        if !self.has_predicate() {
            return self.render_fragment(tracker);
        }
        let motion = self.verb_tags.contains("motion");
        let comparative = self.obliques.iter().any(|(r, _)| *r == R::Comparative);

        let mut wh = self.wh_adverb.clone();
        let subject_is_wh = self.subject.as_ref().map_or(false, |s| s.question);
        let mut object = self.object.clone();
        let mut complement = self.complement.clone();
        let mut obliques = self.obliques.clone();
        if wh.is_none() && !subject_is_wh {
            if object.as_ref().map_or(false, |o| o.question) {
                wh = object.take().map(|o| o.head);
            } else if complement.as_ref().map_or(false, |o| o.question) {
                wh = complement.take().map(|o| o.head);
            } else if let Some(i) = obliques.iter().position(|(_, np)| np.question) {
                wh = Some(obliques.remove(i).1.head);
            }
        }
        let question = self.question || wh.is_some() || subject_is_wh;
        let invert = question && !subject_is_wh;

        let lexical = if let Some(adj) = &self.adjective {
            let adj = if comparative { inflect(adj, Inflection::Comparative) } else { adj.clone() };
            Lexical::Be(Some(adj))
        } else if let Some(np) = &complement {
            Lexical::Be(Some(np.render(Position::Complement, tracker)))
        } else if self.complement.is_some() || self.verb.as_deref() == Some("be") {
            Lexical::Be(None)
        } else {
            Lexical::Verb(self.verb.clone().unwrap_or_default())
        };
        let be = matches!(lexical, Lexical::Be(_));

        let (mid, late): (Vec<String>, Vec<String>) =
            self.adverbs.iter().cloned().partition(|a| MID_ADVERBS.contains(&a.as_str()));
        let tense = self.tense.unwrap_or(Tense::Present);
        let agreement = self.subject.as_ref().map_or((3, false), NounPhrase::agreement);
        let group = verb_group(&lexical, self.modality, tense, self.negated, invert, agreement, &mid);

        let mut words: Vec<String> = Vec::new();
        if self.imperative && !question {
            if self.polite && !self.negated {
                words.push("please".to_string());
            }
            if self.negated {
                words.push("do not".to_string());
            }
            words.extend(mid.iter().cloned());
            match &lexical {
                Lexical::Be(predicate) => {
                    words.push("be".to_string());
                    words.extend(predicate.iter().cloned());
                }
                Lexical::Verb(verb) => words.push(verb.clone()),
            }
        } else {
            let subject = self
                .subject
                .as_ref()
                .map(|s| s.render(Position::Subject, tracker))
                .unwrap_or_default();
            if let Some(w) = &wh {
                words.push(w.clone());
            }
            if invert {
                words.extend(group.aux);
                words.push(subject);
                words.extend(group.rest);
            } else {
                words.push(subject);
                let mut rest = group.rest.into_iter().peekable();
                if let Some(aux) = group.aux {
                    if aux == "can" && rest.peek().map(String::as_str) == Some("not") {
                        rest.next();
                        words.push("cannot".to_string());
                    } else {
                        words.push(aux);
                    }
                }
                words.extend(rest);
            }
        }
        if let Some(o) = &object {
            words.push(o.render(Position::Object, tracker));
        }
        for np in &self.fragments {
            words.push(np.render(Position::Object, tracker));
        }
        for (role, np) in &obliques {
            let prep = preposition(*role, np, motion, be);
            let position = if prep == Some("by") && np.has("transport-mode") {
                Position::Bare
            } else {
                Position::Oblique
            };
            let rendered = np.render(position, tracker);
            words.push(match prep {
                Some(p) => format!("{} {}", p, rendered),
                None => rendered,
            });
        }
        if self.also {
            words.push("too".to_string());
        }
        words.extend(late);
        words.extend(self.times.iter().map(|t| t.render(Position::Bare, tracker)));

        let body = words.into_iter().filter(|w| !w.is_empty()).collect::<Vec<_>>().join(" ");
        if self.interjections.is_empty() {
            body
        } else {
            format!("{}, {}", self.interjections.join(", "), body)
        }
    }

    /// Greetings, idioms and verbless noun phrases.
    fn render_fragment(&self, tracker: &EntityTracker) -> String {
        let mut parts: Vec<String> = Vec::new();
        for np in self.subject.iter().chain(&self.object).chain(&self.fragments) {
            parts.push(np.render(Position::Bare, tracker));
        }
        for (role, np) in &self.obliques {
            let rendered = np.render(Position::Oblique, tracker);
            parts.push(match preposition(*role, np, false, false) {
                Some(p) => format!("{} {}", p, rendered),
                None => rendered,
            });
        }
        parts.extend(self.adverbs.iter().cloned());
        parts.extend(self.times.iter().map(|t| t.render(Position::Bare, tracker)));
        let body = parts.join(" ");
        let mut pieces = self.interjections.clone();
        if !body.is_empty() {
            pieces.push(body);
        }
        pieces.join(", ")
    }
}

/// Splits a Korean sentence after each connective ending, keeping auxiliary
/// chains (-고 있다, -고 싶다) inside their clause.
fn split_korean_clauses(words: &[KoreanWord]) -> Vec<&[KoreanWord]> {
    let mut clauses = Vec::new();
    let mut start = 0;
    for (i, word) in words.iter().enumerate() {
        let Some(connective) = word.connective() else { continue };
        let next = words.get(i + 1).map(KoreanWord::lemma).unwrap_or("");
        if connective == Connective::And && matches!(next, "있다" | "싶다") {
            continue;
        }
        if i + 1 < words.len() && word.is_predicate() {
            clauses.push(&words[start..=i]);
            start = i + 1;
        }
    }
    if start < words.len() {
        clauses.push(&words[start..]);
    }
    clauses
}

/// 이/그/저 before a noun: this or that. Before a noun with the copula
/// (저 학생이에요) they stay pronouns.
fn demonstrative(word: &KoreanWord, next: Option<&KoreanWord>) -> Option<&'static str> {
    let det = match word.surface.as_str() {
        "이" => "this",
        "그" | "저" => "that",
        _ => return None,
    };
    let next = next?;
    (next.is_nominal() && next.copula().is_none()).then_some(det)
}

fn counter(word: &KoreanWord) -> Option<(&'static str, &'static str)> {
    let stem = word.stem()?;
    COUNTERS.iter().copied().find(|(c, _)| *c == stem.surface)
}

/// English number of a word standing before a counter.
fn counted_number(word: &KoreanWord, next: Option<&KoreanWord>) -> Option<String> {
    next.and_then(counter)?;
    if word.surface.chars().all(|c| c.is_ascii_digit()) {
        return Some(word.surface.clone());
    }
    COUNTED_NUMBERS
        .iter()
        .find(|(k, _)| *k == word.surface)
        .map(|(_, n)| n.to_string())
}

fn is_plural_number(modifier: &str) -> bool {
    PLURAL_NUMBERS.contains(&modifier) || modifier.parse::<u32>().map_or(false, |n| n > 1)
}

fn parse_korean_clause(words: &[KoreanWord]) -> EnglishClause {
    let mut c = EnglishClause::default();
    let mut modifiers: Vec<String> = Vec::new();
    let mut possessor: Option<NounPhrase> = None;
    let mut coordinated: Vec<NounPhrase> = Vec::new();
    // 사과 세 개: the noun waits for its counter.
    let mut counted: Option<NounPhrase> = None;
    let mut after_number = false;
    let mut i = 0;
    while i < words.len() {
        let number_before = std::mem::take(&mut after_number);
        let word = &words[i];
        let next = words.get(i + 1);
        let next_lemma = next.map(KoreanWord::lemma).unwrap_or("");
        let Some(stem) = word.stem() else {
            i += 1;
            continue;
        };

        if let Some(det) = demonstrative(word, next) {
            modifiers.push(det.to_string());
            i += 1;
            continue;
        }
        if let Some(number) = counted_number(word, next) {
            modifiers.push(number);
            after_number = true;
            i += 1;
            continue;
        }

        if word.idiom {
            match word.gloss.as_ref().map(|g| g.pos) {
                Some(PartOfSpeech::Interjection) => c.interjections.push(word.text()),
                _ if word.lemma().ends_with('다') => {
                    c.verb = Some(word.text());
                    c.predicate_lemma = word.lemma().to_string();
                }
                _ => c.fragments.push(NounPhrase::from_word(word)),
            }
            i += 1;
            continue;
        }

        if word.is_predicate() {
            // -고 있다 / -고 싶다
            if word.connective() == Some(Connective::And) && matches!(next_lemma, "있다" | "싶다") {
                c.modality = if next_lemma == "있다" { Modality::Progressive } else { Modality::Want };
                c.set_predicate(word);
                if let Some(aux) = next {
                    c.finish_with(aux);
                }
                i += 2;
                continue;
            }
            // -지 않다
            if word.last_ending().map_or(false, |m| m.surface == "지") && next_lemma == "않다" {
                c.negated = true;
                c.set_predicate(word);
                if let Some(aux) = next {
                    c.finish_with(aux);
                }
                i += 2;
                continue;
            }
            if word.is_modifier() {
                let after = words.get(i + 2);
                let after_lemma = after.map(KoreanWord::lemma).unwrap_or("");
                // -ㄹ 수 있다 / 없다
                if next_lemma == "수" && matches!(after_lemma, "있다" | "없다") {
                    c.modality = if after_lemma == "있다" { Modality::Can } else { Modality::Cannot };
                    c.set_predicate(word);
                    if let Some(aux) = after {
                        c.finish_with(aux);
                    }
                    i += 3;
                    continue;
                }
                // -ㄹ 것 같다
                if matches!(next_lemma, "것" | "거") && after_lemma == "같다" {
                    c.modality = Modality::Probably;
                    c.set_predicate(word);
                    if let Some(aux) = after {
                        c.finish_with(aux);
                    }
                    i += 3;
                    continue;
                }
                // -ㄹ 것이다 / 거예요
                if matches!(next_lemma, "것" | "거") && next.map_or(false, |n| n.copula().is_some()) {
                    c.modality = Modality::Future;
                    c.set_predicate(word);
                    if let Some(aux) = next {
                        c.finish_with(aux);
                    }
                    i += 2;
                    continue;
                }
                modifiers.push(attributive(word));
                i += 1;
                continue;
            }
            c.set_predicate(word);
            c.finish_with(word);
            i += 1;
            continue;
        }

        match stem.kind {
            MorphemeKind::Adverb => match stem.lemma.as_str() {
                "안" => c.negated = true,
                "못" => c.modality = Modality::Cannot,
                _ if word.gloss.as_ref().map_or(false, |g| g.has("question")) => c.wh_adverb = Some(word.text()),
                _ => c.adverbs.push(word.text()),
            },
            MorphemeKind::Interjection => c.interjections.push(word.text()),
            MorphemeKind::Numeral | MorphemeKind::Determiner => modifiers.push(word.text()),
            _ => {
                let mut np = match counter(word).filter(|_| number_before) {
                    Some((korean, fallback)) => {
                        counted.take().unwrap_or_else(|| NounPhrase::counted(korean, fallback))
                    }
                    None => NounPhrase::from_word(word),
                };
                np.plural |= modifiers.iter().any(|m| is_plural_number(m));
                np.modifiers = std::mem::take(&mut modifiers);
                np.possessor = possessor.take().map(Box::new).or(np.possessor.take());
                np.conjuncts.append(&mut coordinated);
                np.only = word.has_role(R::Restrictive);
                c.also |= word.has_role(R::Additive);

                if let Some(copula) = word.copula() {
                    if copula.tense.is_some() {
                        c.tense = copula.tense;
                        c.explicit_tense = true;
                    }
                    c.question |= copula.surface == "입니까";
                    c.predicate_lemma = "이다".to_string();
                    c.complement = Some(np);
                    i += 1;
                    continue;
                }
                match word.case_role() {
                    Some(R::Possessive) => possessor = Some(np),
                    Some(R::Subject) | Some(R::Topic) => {
                        if c.subject.is_none() {
                            c.subject = Some(np);
                        } else if c.second_subject.is_none() {
                            c.second_subject = Some(np);
                        } else {
                            c.fragments.push(np);
                        }
                    }
                    Some(R::Object) if c.object.is_none() => c.object = Some(np),
                    Some(R::Object) => c.fragments.push(np),
                    // A와 B: coordination when another noun follows.
                    Some(R::Comitative) if next.map_or(false, KoreanWord::is_nominal) => {
                        let mut chain = std::mem::take(&mut np.conjuncts);
                        chain.push(np);
                        coordinated = chain;
                    }
                    Some(R::Distributive) => {
                        np.every = true;
                        c.obliques.push((R::None, np));
                    }
                    Some(role) => c.obliques.push((role, np)),
                    None if words.get(i + 2).and_then(counter).is_some()
                        && next.map_or(false, |n| counted_number(n, words.get(i + 2)).is_some()) =>
                    {
                        counted = Some(np);
                    }
                    None => {
                        let next_is_predicate = next.map_or(false, KoreanWord::is_predicate);
                        if np.has("time") {
                            c.times.push(np);
                        } else if c.subject.is_none()
                            && (np.pronoun.is_some() || np.has("person") || !next_is_predicate)
                        {
                            c.subject = Some(np);
                        } else if c.object.is_none() {
                            c.object = Some(np);
                        } else {
                            c.fragments.push(np);
                        }
                    }
                }
            }
        }
        i += 1;
    }
    c.fragments.extend(coordinated);
    c.fragments.extend(counted);
    c.adverbs.extend(modifiers);
    c.settle();
    c
}

fn restore_subject(c: &mut EnglishClause, tracker: &EntityTracker) {
    if c.subject.is_some() || c.imperative || !c.has_predicate() {
        return;
    }
    let tracked = tracker
        .iter()
        .find(|e| e.role == EntityRole::Subject)
        .filter(|e| !(c.question && e.english == "I"));
    c.subject = Some(match tracked {
        Some(entity) => NounPhrase::from_entity(entity),
        None => NounPhrase::pronoun(if c.question { "you" } else { "I" }),
    });
}

fn remember_english(c: &EnglishClause, tracker: &mut EntityTracker) {
    if let Some(s) = c.subject.as_ref().filter(|s| !s.question) {
        tracker.mention(s.entity(EntityRole::Subject));
    }
    if let Some(o) = c.object.as_ref().filter(|o| !o.question && o.pronoun.is_none()) {
        tracker.mention(o.entity(EntityRole::Object));
    }
}

fn join_english(pieces: Vec<(String, Option<Connective>)>) -> String {
    let count = pieces.len();
    let mut out = String::new();
    for (i, (text, link)) in pieces.into_iter().enumerate() {
        if text.is_empty() {
            continue;
        }
        let link = if i + 1 == count { None } else { link };
        match link {
            Some(Connective::If) => out.push_str(&format!("if {}, ", text)),
            Some(Connective::Because) => out.push_str(&format!("because {}, ", text)),
            Some(Connective::And) => out.push_str(&format!("{}, and ", text)),
            Some(Connective::So) => out.push_str(&format!("{}, so ", text)),
            Some(Connective::But) => out.push_str(&format!("{}, but ", text)),
            None => {
                out.push_str(&text);
                out.push(' ');
            }
        }
    }
    out.trim_end_matches(&[',', ' '][..]).to_string()
}

/// Renders one Korean sentence in English. Entities mentioned along the way
/// are recorded in `tracker` so that later sentences can restore subjects.
pub fn korean_to_english(words: &[KoreanWord], terminal: Option<char>, tracker: &mut EntityTracker) -> String {
    let mut clauses: Vec<EnglishClause> = split_korean_clauses(words).into_iter().map(parse_korean_clause).collect();
    let Some(last) = clauses.len().checked_sub(1) else {
        return String::new();
    };
    // Non-final clauses without tense of their own follow the main clause.
    let main_tense = clauses[last].tense;
    let question = terminal == Some('?') || clauses[last].question;
    for (i, c) in clauses.iter_mut().enumerate() {
        if i < last {
            c.question = false;
            if !c.explicit_tense {
                c.tense = main_tense.or(c.tense);
            }
        } else {
            c.question = question;
        }
    }
    let full = clauses.iter().any(EnglishClause::has_predicate);
    let mut pieces = Vec::with_capacity(clauses.len());
    for c in clauses.iter_mut() {
        restore_subject(c, tracker);
        let text = c.render(tracker);
        remember_english(c, tracker);
        pieces.push((text, c.connective));
    }
    let body = capitalize(&join_english(pieces));
    trace!(body = %body, "korean clause rendered");
    punctuate(body, terminal.filter(|t| *t != '?'), question, full)
}

// ---------------------------------------------------------------------------
// English → Korean
// ---------------------------------------------------------------------------

/// Syntactic slot of an English word, guessed from its neighbours. Used to
/// prefer senses of the matching part of speech (work: 일하다 vs 일).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Nominal,
    Predicate,
    Modifier,
    Any,
}

impl Slot {
    pub fn admits(self, pos: PartOfSpeech) -> bool {
        use PartOfSpeech as P;
        match self {
            Slot::Nominal => matches!(pos, P::Noun | P::Pronoun | P::Numeral | P::Phrase),
            Slot::Predicate => matches!(pos, P::Verb | P::Adjective | P::Phrase),
            Slot::Modifier => matches!(pos, P::Adjective | P::Numeral | P::Determiner),
            Slot::Any => true,
        }
    }
}

pub fn english_slots(morphemes: &[Morpheme]) -> Vec<Slot> {
    morphemes
        .iter()
        .enumerate()
        .map(|(i, m)| {
            if m.is_function_word() || matches!(m.kind, MorphemeKind::Pronoun | MorphemeKind::Determiner) {
                return Slot::Any;
            }
            let next_is_noun = morphemes.get(i + 1).map_or(false, |n| n.kind == MorphemeKind::Noun);
            if let Some(prev) = i.checked_sub(1).map(|j| &morphemes[j]) {
                match prev.kind {
                    MorphemeKind::Determiner => {
                        return if next_is_noun { Slot::Modifier } else { Slot::Nominal };
                    }
                    MorphemeKind::Preposition if prev.lemma == "to" && i >= 2 && morphemes[i - 2].is_predicate() => {
                        return Slot::Predicate;
                    }
                    MorphemeKind::Preposition => return Slot::Nominal,
                    MorphemeKind::Pronoun if prev.role == R::Possessive => return Slot::Nominal,
                    MorphemeKind::Pronoun if prev.role == R::Subject => return Slot::Predicate,
                    MorphemeKind::Auxiliary => return Slot::Predicate,
                    _ => {}
                }
            }
            match m.inflection {
                Some(Inflection::Past | Inflection::PastParticiple | Inflection::Progressive | Inflection::ThirdPerson) => {
                    Slot::Predicate
                }
                Some(Inflection::Plural | Inflection::Possessive) => Slot::Nominal,
                Some(Inflection::Comparative | Inflection::Superlative) => Slot::Modifier,
                None => Slot::Any,
            }
        })
        .collect()
}

/// One English word after analysis and sense resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct EnglishWord {
    pub surface: String,
    pub morpheme: Morpheme,
    pub gloss: Option<Gloss>,
    /// Matched as a whole idiom; the gloss is emitted verbatim.
    pub idiom: bool,
    /// A comma followed the word in the source.
    pub comma: bool,
    /// Earlier entity a pronoun points back at.
    pub referent: Option<Entity>,
}

impl EnglishWord {
    pub fn new(surface: &str, morpheme: Morpheme, gloss: Option<Gloss>) -> Self {
        Self { surface: surface.to_string(), morpheme, gloss, idiom: false, comma: false, referent: None }
    }

    fn pos(&self) -> Option<PartOfSpeech> {
        self.gloss.as_ref().map(|g| g.pos)
    }

    fn is_verbal(&self) -> bool {
        (self.morpheme.kind == MorphemeKind::Auxiliary && self.morpheme.lemma != "not")
            || self.pos() == Some(PartOfSpeech::Verb)
    }

    fn is_conjunction(&self) -> bool {
        self.morpheme.kind == MorphemeKind::Conjunction
    }

    fn is_nominal(&self) -> bool {
        matches!(self.pos(), Some(PartOfSpeech::Noun)) || (self.gloss.is_none() && self.morpheme.kind == MorphemeKind::Unknown)
    }
}

#[derive(Debug, Clone, Default)]
struct KoreanNp {
    text: String,
    english: String,
    tags: BTreeSet<String>,
    proper: bool,
    /// English nominative of a personal pronoun.
    pronoun: Option<&'static str>,
    modifiers: Vec<String>,
    possessor: Option<Box<KoreanNp>>,
    conjuncts: Vec<KoreanNp>,
    plural: bool,
    question: bool,
    /// An idiom's gloss, rendered as is.
    idiom: bool,
}

fn polite(formality: Formality) -> bool {
    matches!(formality, Formality::Formal | Formality::Friendly)
}

fn korean_pronoun(lemma: &str, formality: Formality) -> &'static str {
    match lemma {
        "I" if polite(formality) => "저",
        "I" => "나",
        "we" if polite(formality) => "저희",
        "we" => "우리",
        "you" if polite(formality) => "당신",
        "you" => "너",
        "he" => "그",
        "she" => "그녀",
        "they" => "그들",
        _ => "그것",
    }
}

/// Attaches a case particle, with the contracted pronoun forms (내가, 누가).
fn attach(text: &str, case: ParticleCase) -> String {
    if case == ParticleCase::Subject {
        match text {
            "나" => return "내가".to_string(),
            "저" => return "제가".to_string(),
            "너" => return "네가".to_string(),
            "누구" => return "누가".to_string(),
            _ => {}
        }
    }
    format!("{}{}", text, particle_for(text, case))
}

impl KoreanNp {
    fn from_word(word: &EnglishWord) -> Self {
        match &word.gloss {
            Some(g) => Self {
                text: g.text.clone(),
                english: word.morpheme.lemma.clone(),
                tags: g.tags.clone(),
                proper: g.category == Category::ProperNoun,
                plural: word.morpheme.inflection == Some(Inflection::Plural),
                question: g.has("question"),
                ..Default::default()
            },
            None => Self {
                text: word.surface.clone(),
                english: word.surface.clone(),
                proper: true,
                ..Default::default()
            },
        }
    }

    fn pronoun(lemma: &'static str) -> Self {
        let mut tags = BTreeSet::new();
        if lemma != "it" {
            tags.insert("person".to_string());
        }
        Self { english: lemma.to_string(), tags, pronoun: Some(lemma), ..Default::default() }
    }

    fn from_entity(entity: &Entity) -> Self {
        Self {
            text: entity.korean.clone(),
            english: entity.english.clone(),
            proper: entity.proper,
            ..Default::default()
        }
    }

    fn head(&self, formality: Formality) -> String {
        match self.pronoun {
            Some(p) => korean_pronoun(p, formality).to_string(),
            None if self.plural && self.tags.contains("person") => format!("{}들", self.text),
            None => self.text.clone(),
        }
    }

    fn render_single(&self, formality: Formality) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(owner) = &self.possessor {
            parts.push(owner.possessive(formality));
        }
        parts.extend(self.modifiers.iter().cloned());
        parts.push(self.head(formality));
        parts.join(" ")
    }

    fn render(&self, formality: Formality) -> String {
        let mut all = vec![self.render_single(formality)];
        all.extend(self.conjuncts.iter().map(|c| c.render_single(formality)));
        let last = all.pop().unwrap_or_default();
        all.iter()
            .map(|a| attach(a, ParticleCase::Comitative))
            .chain(std::iter::once(last))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn possessive(&self, formality: Formality) -> String {
        match self.pronoun {
            Some("I") if polite(formality) => "제".to_string(),
            Some("I") => "내".to_string(),
            Some("you") if !polite(formality) => "네".to_string(),
            Some("we") => korean_pronoun("we", formality).to_string(),
            _ => format!("{}의", self.render(formality)),
        }
    }

    fn is_person(&self) -> bool {
        self.tags.contains("person") || self.pronoun.map_or(false, |p| p != "it")
    }

    fn entity(&self, role: EntityRole) -> Entity {
        Entity::from_tags(&self.text, &self.english, &self.tags, role, self.proper)
    }
}

#[derive(Debug, Clone, Copy)]
enum NpSlot {
    Subject,
    Object,
    Complement,
    Oblique(usize),
}

/// Korean clause assembled from one English clause.
#[derive(Debug, Clone, Default)]
struct KoreanClause {
    lead: Option<Connective>,
    interjections: Vec<String>,
    subject: Option<KoreanNp>,
    object: Option<KoreanNp>,
    possessed: Option<KoreanNp>,
    complement: Option<KoreanNp>,
    adjective: Option<String>,
    verb: Option<String>,
    verb_english: String,
    verb_tags: BTreeSet<String>,
    obliques: Vec<(String, KoreanNp)>,
    adverbs: Vec<String>,
    wh_adverb: Option<String>,
    times: Vec<KoreanNp>,
    tense: Option<Tense>,
    negated: bool,
    modality: Modality,
    question: bool,
    imperative: bool,
    be: bool,
    existential: bool,
    possession: bool,
    starts_with_aux: bool,
    /// Dummy "it" of weather verbs (it rains).
    impersonal: bool,
    /// -(으)러 form of a to-infinitive after a motion verb (went to buy).
    purpose: Option<String>,
}

#[derive(Default)]
struct ParseState {
    verb_seen: bool,
    preposition: Option<String>,
    modifiers: Vec<String>,
    possessor: Option<KoreanNp>,
    coordinate: bool,
    last: Option<NpSlot>,
    to_infinitive: bool,
}

impl KoreanClause {
    fn np_mut(&mut self, slot: NpSlot) -> Option<&mut KoreanNp> {
        match slot {
            NpSlot::Subject => self.subject.as_mut(),
            NpSlot::Object => self.object.as_mut(),
            NpSlot::Complement => self.complement.as_mut(),
            NpSlot::Oblique(i) => self.obliques.get_mut(i).map(|(_, np)| np),
        }
    }

    fn has_predicate(&self) -> bool {
        self.verb.is_some() || self.adjective.is_some() || self.complement.is_some()
    }

    /// Puts a noun phrase in its grammatical place by position and the
    /// preposition before it.
    fn place(&mut self, st: &mut ParseState, mut np: KoreanNp) {
        np.modifiers = std::mem::take(&mut st.modifiers);
        // stay home, go home: a place with no preposition.
        if st.preposition.is_none() && !st.coordinate && self.verb.is_some() && np.english == "home" {
            let p = if self.verb_tags.contains("motion") { "to" } else { "at" };
            st.preposition = Some(p.to_string());
        }
        if np.possessor.is_none() {
            np.possessor = st.possessor.take().map(Box::new);
        }
        if st.coordinate {
            st.coordinate = false;
            if let Some(prev) = st.last.and_then(|s| self.np_mut(s)) {
                prev.conjuncts.push(np);
                return;
            }
        }
        match st.preposition.take() {
            Some(p) if p == "of" => {
                if let Some(prev) = st.last.and_then(|s| self.np_mut(s)) {
                    prev.possessor = Some(Box::new(np));
                    return;
                }
                self.obliques.push((p, np));
                st.last = Some(NpSlot::Oblique(self.obliques.len() - 1));
                return;
            }
            Some(p) => {
                self.obliques.push((p, np));
                st.last = Some(NpSlot::Oblique(self.obliques.len() - 1));
                return;
            }
            None => {}
        }
        if np.tags.contains("time") && np.pronoun.is_none() {
            self.times.push(np);
            st.last = None;
            return;
        }
        let before_predicate = self.verb.is_none() && self.adjective.is_none();
        if self.subject.is_none()
            && before_predicate
            && (!st.verb_seen || self.starts_with_aux || self.existential)
        {
            self.subject = Some(np);
            st.last = Some(NpSlot::Subject);
            return;
        }
        if before_predicate && self.be && !self.possession {
            self.complement = Some(np);
            st.last = Some(NpSlot::Complement);
            return;
        }
        // "give him a book": the first object was the recipient.
        if let Some(first) = self.object.take() {
            self.obliques.push(("to".to_string(), first));
        }
        self.object = Some(np);
        st.last = Some(NpSlot::Object);
    }

    fn settle(&mut self, sentence_question: bool) {
        // "Where is the bathroom?": the wh-word is the predicate.
        let wh_subject = self.subject.as_ref().map_or(false, |s| s.question);
        if self.be && wh_subject && self.complement.as_ref().map_or(false, |c| !c.question) {
            std::mem::swap(&mut self.subject, &mut self.complement);
        }
        // "It is a piece of cake": the idiom carries the meaning.
        if self.complement.as_ref().map_or(false, |c| c.idiom) && self.subject.as_ref().map_or(false, |s| s.pronoun == Some("it")) {
            self.subject = None;
        }
        if self.possession && self.verb.is_none() {
            self.possessed = self.object.take();
            self.verb = Some("있다".to_string());
        }
        if self.verb_english == "want" && self.modality != Modality::Want && self.object.is_some() {
            self.verb = Some("원하다".to_string());
        }
        if !self.has_predicate() && (self.be || self.existential) {
            self.verb = Some("있다".to_string());
        }
        self.question |= (self.starts_with_aux && self.subject.is_some()) || sentence_question;
        self.imperative = self.subject.is_none()
            && !self.question
            && !self.existential
            && !self.possession
            && !self.impersonal
            && self.lead.is_none()
            && self.verb.is_some();
    }

    fn stative(&self) -> bool {
        self.verb.as_deref().map_or(true, |v| matches!(v, "있다" | "살다" | "없다" | "머물다"))
    }

    fn oblique(&self, preposition: &str, np: &KoreanNp, formality: Formality) -> String {
        let text = np.render(formality);
        let motion = self.verb_tags.contains("motion");
        let time = np.tags.contains("time");
        match preposition {
            "to" | "into" if np.is_person() => format!("{}에게", text),
            "to" | "into" => format!("{}에", text),
            "at" | "in" | "on" if time || motion || self.stative() => format!("{}에", text),
            "at" | "in" | "on" => format!("{}에서", text),
            "from" if np.is_person() => format!("{}에게서", text),
            "from" => format!("{}에서", text),
            "with" if np.is_person() => format!("{} 함께", attach(&text, ParticleCase::Comitative)),
            "with" | "by" => attach(&text, ParticleCase::Directional),
            "for" => format!("{} 위해", attach(&text, ParticleCase::Object)),
            "than" => format!("{}보다", text),
            "until" => format!("{}까지", text),
            "of" => format!("{}의", text),
            _ => format!("{}에", text),
        }
    }

    fn render(&self, end: ClauseEnd, formality: Formality) -> String {
        let mut parts: Vec<String> = self.interjections.clone();
        if !self.has_predicate() {
            for np in self.subject.iter().chain(&self.object).chain(&self.times) {
                parts.push(np.render(formality));
            }
            for (p, np) in &self.obliques {
                parts.push(self.oblique(p, np, formality));
            }
            parts.extend(self.adverbs.iter().cloned());
            return parts.join(" ");
        }
        parts.extend(self.times.iter().map(|t| t.render(formality)));
        if let Some(s) = &self.subject {
            let case = if s.question || self.existential || !(s.pronoun.is_some() || s.proper) {
                ParticleCase::Subject
            } else {
                ParticleCase::Topic
            };
            parts.push(attach(&s.render(formality), case));
        }
        if let Some(wh) = &self.wh_adverb {
            parts.push(wh.clone());
        }
        for (p, np) in &self.obliques {
            parts.push(self.oblique(p, np, formality));
        }
        if let Some(p) = &self.possessed {
            parts.push(attach(&p.render(formality), ParticleCase::Subject));
        }
        if let Some(o) = &self.object {
            parts.push(attach(&o.render(formality), ParticleCase::Object));
        }
        parts.extend(self.adverbs.iter().cloned());
        parts.extend(self.purpose.iter().cloned());
        parts.push(self.predicate(formality).finish(end, formality));
        parts.join(" ")
    }

    fn predicate(&self, formality: Formality) -> KoreanPredicate {
        let negated = self.negated;
        if let (Some(np), None, None) = (&self.complement, &self.verb, &self.adjective) {
            let noun = np.render(formality);
            if self.modality == Modality::Future {
                let become_ = modifier_form("되", MorphemeKind::Verb, Tense::Future);
                let prefix = format!("{} {}{} ", attach(&noun, ParticleCase::Subject), if negated { "안 " } else { "" }, become_);
                return KoreanPredicate { prefix, core: Core::Future };
            }
            if negated {
                return KoreanPredicate {
                    prefix: format!("{} ", attach(&noun, ParticleCase::Subject)),
                    core: Core::NotCopula,
                };
            }
            return KoreanPredicate { prefix: String::new(), core: Core::Copula(noun) };
        }
        let (lemma, kind) = match (&self.adjective, &self.verb) {
            (Some(adj), _) => (adj.as_str(), MorphemeKind::Adjective),
            (None, Some(verb)) => (verb.as_str(), MorphemeKind::Verb),
            (None, None) => return KoreanPredicate { prefix: String::new(), core: Core::Text(String::new()) },
        };
        let Some(stem) = lemma.strip_suffix('다').filter(|s| !s.is_empty()) else {
            return KoreanPredicate { prefix: String::new(), core: Core::Text(lemma.to_string()) };
        };
        // 있다 negates to 없다.
        let (stem, negated) = if stem == "있" && negated && self.modality == Modality::Plain {
            ("없", false)
        } else {
            (stem, negated)
        };
        let kind = if STATIVE_STEMS.contains(&stem) { MorphemeKind::Adjective } else { kind };
        let not = if negated { "안 " } else { "" };
        let verb = |stem: &str, kind| Core::Verb { stem: stem.to_string(), kind };
        match self.modality {
            Modality::Progressive => KoreanPredicate {
                prefix: format!("{}{}고 ", not, stem),
                core: verb("있", MorphemeKind::Adjective),
            },
            Modality::Want if negated => KoreanPredicate {
                prefix: format!("{}고 싶지 ", stem),
                core: verb("않", MorphemeKind::Adjective),
            },
            Modality::Want => KoreanPredicate {
                prefix: format!("{}고 ", stem),
                core: verb("싶", MorphemeKind::Adjective),
            },
            Modality::Can | Modality::Cannot => {
                let able = if self.modality == Modality::Cannot || negated { "없" } else { "있" };
                KoreanPredicate {
                    prefix: format!("{} 수 ", modifier_form(stem, MorphemeKind::Verb, Tense::Future)),
                    core: verb(able, MorphemeKind::Adjective),
                }
            }
            Modality::Future | Modality::Probably => KoreanPredicate {
                prefix: format!("{}{} ", not, modifier_form(stem, kind, Tense::Future)),
                core: Core::Future,
            },
            Modality::Plain if negated && kind == MorphemeKind::Adjective => KoreanPredicate {
                prefix: format!("{}지 ", stem),
                core: verb("않", MorphemeKind::Adjective),
            },
            // 좋아하지 않는다, 안 먹는다
            Modality::Plain if negated && stem.len() > '하'.len_utf8() && stem.ends_with('하') => KoreanPredicate {
                prefix: format!("{}지 ", stem),
                core: verb("않", MorphemeKind::Verb),
            },
            Modality::Plain if negated => KoreanPredicate { prefix: "안 ".to_string(), core: verb(stem, MorphemeKind::Verb) },
            Modality::Plain => KoreanPredicate { prefix: String::new(), core: verb(stem, kind) },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mood {
    Statement,
    Question,
    Imperative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClauseEnd {
    Final(Mood, Tense),
    Link(Connective, Tense),
}

#[derive(Debug, Clone, PartialEq)]
enum Core {
    Verb { stem: String, kind: MorphemeKind },
    /// Noun + 이다.
    Copula(String),
    /// 아니다 after a subject-marked noun.
    NotCopula,
    /// -ㄹ 것이다 after a modifier prefix.
    Future,
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
struct KoreanPredicate {
    prefix: String,
    core: Core,
}

impl KoreanPredicate {
    fn finish(&self, end: ClauseEnd, formality: Formality) -> String {
        let tail = match (&self.core, end) {
            (Core::Verb { stem, kind }, ClauseEnd::Final(mood, tense)) => conjugate(stem, *kind, tense, mood, formality),
            (Core::Verb { stem, .. }, ClauseEnd::Link(connective, tense)) => link(stem, tense, connective),
            (Core::Copula(noun), ClauseEnd::Final(mood, tense)) => {
                format!("{}{}", noun, copula_ending(noun, tense, mood, formality))
            }
            (Core::Copula(noun), ClauseEnd::Link(connective, tense)) => {
                format!("{}{}", noun, copula_link(noun, connective, tense))
            }
            (Core::NotCopula, ClauseEnd::Final(mood, tense)) => not_copula(tense, mood, formality),
            (Core::NotCopula, ClauseEnd::Link(connective, tense)) => not_copula_link(connective, tense),
            (Core::Future, end) => {
                let noun = if matches!(formality, Formality::Friendly | Formality::Casual) { "거" } else { "것" };
                match end {
                    ClauseEnd::Final(mood, _) => {
                        let mood = if mood == Mood::Imperative { Mood::Statement } else { mood };
                        format!("{}{}", noun, copula_ending(noun, Tense::Present, mood, formality))
                    }
                    ClauseEnd::Link(connective, _) => format!("{}{}", noun, copula_link(noun, connective, Tense::Present)),
                }
            }
            (Core::Text(text), _) => text.clone(),
        };
        format!("{}{}", self.prefix, tail)
    }
}

fn drop_rieul(stem: &str) -> String {
    match (final_coda(stem), stem.chars().last().and_then(|c| decompose(c).ok())) {
        (Some('ㄹ'), Some(last)) => replace_last(stem, last.with_coda(None)).unwrap_or_else(|_| stem.to_string()),
        _ => stem.to_string(),
    }
}

/// Sentence-final form of a predicate stem in the requested speech level:
/// formal 합쇼체, friendly 해요체, casual 해체, neutral and literal 해라체.
fn conjugate(stem: &str, kind: MorphemeKind, tense: Tense, mood: Mood, formality: Formality) -> String {
    let question = mood == Mood::Question;
    if mood == Mood::Imperative {
        return match formality {
            Formality::Formal => format!("{}십시오", eu_linked(stem)),
            Formality::Friendly => format!("{}세요", eu_linked(stem)),
            Formality::Casual => infinitive(stem),
            Formality::Neutral | Formality::Literal => format!("{}라", infinitive(stem)),
        };
    }
    if tense == Tense::Past {
        let past = past_stem(stem);
        return match formality {
            Formality::Formal => format!("{}{}", past, if question { "습니까" } else { "습니다" }),
            Formality::Friendly => format!("{}어요", past),
            Formality::Casual => format!("{}어", past),
            Formality::Neutral | Formality::Literal => format!("{}{}", past, if question { "니" } else { "다" }),
        };
    }
    match formality {
        Formality::Formal => {
            let form = formal_present(stem);
            if question {
                format!("{}까", form.strip_suffix('다').unwrap_or(&form))
            } else {
                form
            }
        }
        Formality::Friendly => format!("{}요", infinitive(stem)),
        Formality::Casual => infinitive(stem),
        Formality::Neutral | Formality::Literal if question => format!("{}니", drop_rieul(stem)),
        Formality::Neutral | Formality::Literal if kind == MorphemeKind::Adjective => format!("{}다", stem),
        Formality::Neutral | Formality::Literal => plain_present(stem),
    }
}

/// Clause-linking form: -고, -지만, -아서/어서, -면, -니까.
fn link(stem: &str, tense: Tense, connective: Connective) -> String {
    let past = tense == Tense::Past;
    match connective {
        Connective::And if past => format!("{}고", past_stem(stem)),
        Connective::And => format!("{}고", stem),
        Connective::But if past => format!("{}지만", past_stem(stem)),
        Connective::But => format!("{}지만", stem),
        Connective::So => format!("{}서", infinitive(stem)),
        Connective::If if past => format!("{}으면", past_stem(stem)),
        Connective::If => format!("{}면", eu_linked(stem)),
        Connective::Because if past => format!("{}으니까", past_stem(stem)),
        Connective::Because => format!("{}니까", eu_linked(stem)),
    }
}

fn copula_ending(noun: &str, tense: Tense, mood: Mood, formality: Formality) -> String {
    let closed = has_batchim(noun);
    let question = mood == Mood::Question;
    if tense == Tense::Past {
        let base = if closed { "이었" } else { "였" };
        return match formality {
            Formality::Formal => format!("{}{}", base, if question { "습니까" } else { "습니다" }),
            Formality::Friendly => format!("{}어요", base),
            Formality::Casual => format!("{}어", base),
            Formality::Neutral | Formality::Literal => format!("{}{}", base, if question { "니" } else { "다" }),
        };
    }
    let ending = match formality {
        Formality::Formal if question => "입니까",
        Formality::Formal => "입니다",
        Formality::Friendly if closed => "이에요",
        Formality::Friendly => "예요",
        Formality::Casual if closed => "이야",
        Formality::Casual => "야",
        _ if question && closed => "이니",
        _ if question => "니",
        _ if closed => "이다",
        _ => "다",
    };
    ending.to_string()
}

fn copula_link(noun: &str, connective: Connective, tense: Tense) -> String {
    let i = if has_batchim(noun) { "이" } else { "" };
    if tense == Tense::Past {
        let base = if has_batchim(noun) { "이었" } else { "였" };
        return match connective {
            Connective::And => format!("{}고", base),
            Connective::But => format!("{}지만", base),
            Connective::So => format!("{}라서", i),
            Connective::If => format!("{}으면", base),
            Connective::Because => format!("{}으니까", base),
        };
    }
    match connective {
        Connective::And => format!("{}고", i),
        Connective::But => format!("{}지만", i),
        Connective::So => format!("{}라서", i),
        Connective::If => format!("{}면", i),
        Connective::Because => format!("{}니까", i),
    }
}

fn not_copula(tense: Tense, mood: Mood, formality: Formality) -> String {
    let question = mood == Mood::Question;
    let form = match (tense, formality) {
        (Tense::Past, Formality::Formal) if question => "아니었습니까",
        (Tense::Past, Formality::Formal) => "아니었습니다",
        (Tense::Past, Formality::Friendly) => "아니었어요",
        (Tense::Past, Formality::Casual) => "아니었어",
        (Tense::Past, _) if question => "아니었니",
        (Tense::Past, _) => "아니었다",
        (_, Formality::Formal) if question => "아닙니까",
        (_, Formality::Formal) => "아닙니다",
        (_, Formality::Friendly) => "아니에요",
        (_, Formality::Casual) => "아니야",
        (_, _) if question => "아니니",
        (_, _) => "아니다",
    };
    form.to_string()
}

fn not_copula_link(connective: Connective, tense: Tense) -> String {
    let base = if tense == Tense::Past { "아니었" } else { "아니" };
    match connective {
        Connective::And => format!("{}고", base),
        Connective::But => format!("{}지만", base),
        Connective::So => "아니라서".to_string(),
        Connective::If if tense == Tense::Past => "아니었으면".to_string(),
        Connective::If => "아니면".to_string(),
        Connective::Because if tense == Tense::Past => "아니었으니까".to_string(),
        Connective::Because => "아니니까".to_string(),
    }
}

/// Splits an English sentence at subordinating conjunctions, and at
/// coordinating ones that introduce a new verb (not "tea and coffee").
fn split_english_clauses(words: &[EnglishWord]) -> Vec<(Option<Connective>, &[EnglishWord])> {
    let mut clauses = Vec::new();
    let mut lead = None;
    let mut start = 0;
    for (i, word) in words.iter().enumerate() {
        if let (true, R::Connective(connective)) = (word.is_conjunction(), word.morpheme.role) {
            let introduces_clause = match connective {
                Connective::If | Connective::Because => true,
                _ => words[i + 1..]
                    .iter()
                    .take_while(|w| !w.is_conjunction())
                    .any(EnglishWord::is_verbal),
            };
            if introduces_clause {
                if i > start {
                    clauses.push((lead, &words[start..i]));
                }
                lead = Some(connective);
                start = i + 1;
                continue;
            }
        }
        if word.comma && matches!(lead, Some(Connective::If | Connective::Because)) && i + 1 < words.len() {
            clauses.push((lead, &words[start..=i]));
            lead = None;
            start = i + 1;
        }
    }
    if start < words.len() {
        clauses.push((lead, &words[start..]));
    }
    clauses
}

fn korean_attributive(lemma: &str) -> String {
    match lemma.strip_suffix('다').filter(|s| !s.is_empty()) {
        Some(stem) => modifier_form(stem, MorphemeKind::Adjective, Tense::Present),
        None => lemma.to_string(),
    }
}

fn parse_english_clause(words: &[EnglishWord], lead: Option<Connective>, literal: bool) -> KoreanClause {
    let mut c = KoreanClause { lead, ..Default::default() };
    let mut st = ParseState::default();
    c.starts_with_aux = words
        .first()
        .map_or(false, |w| w.morpheme.kind == MorphemeKind::Auxiliary && w.morpheme.lemma != "not");

    for (i, w) in words.iter().enumerate() {
        let m = &w.morpheme;
        let lower = w.surface.to_lowercase();
        let next = words.get(i + 1);
        if w.idiom {
            let Some(g) = &w.gloss else { continue };
            if c.be && c.complement.is_none() && g.pos != PartOfSpeech::Interjection {
                c.complement = Some(KoreanNp {
                    text: g.text.clone(),
                    english: w.surface.clone(),
                    idiom: true,
                    ..Default::default()
                });
            } else {
                c.interjections.push(g.text.clone());
            }
            continue;
        }
        if lower == "please" {
            continue;
        }
        if lower == "there" && next.map_or(false, |n| n.morpheme.lemma == "be") {
            c.existential = true;
            continue;
        }
        match m.kind {
            MorphemeKind::Determiner if w.gloss.is_none() => continue,
            MorphemeKind::Auxiliary => {
                st.verb_seen = true;
                match m.lemma.as_str() {
                    "not" => c.negated = true,
                    "be" => {
                        c.be = true;
                        if c.modality != Modality::Future && m.tense.is_some() {
                            c.tense = m.tense;
                        }
                    }
                    "do" => c.tense = m.tense.or(c.tense),
                    "will" => c.modality = Modality::Future,
                    "can" => {
                        c.modality = Modality::Can;
                        if m.tense == Some(Tense::Past) {
                            c.tense = Some(Tense::Past);
                        }
                    }
                    "have" => {
                        let perfect = next.map_or(false, |n| {
                            matches!(n.morpheme.inflection, Some(Inflection::Past | Inflection::PastParticiple))
                        });
                        if perfect {
                            c.tense = Some(Tense::Past);
                        } else if c.verb.is_none() {
                            c.possession = true;
                            c.verb_english = "have".to_string();
                            c.tense = m.tense.or(c.tense);
                        }
                    }
                    _ => {}
                }
                continue;
            }
            MorphemeKind::Preposition => {
                let verb_follows = next.map_or(false, |n| n.pos() == Some(PartOfSpeech::Verb));
                if m.lemma == "to" && c.verb.is_some() && verb_follows {
                    st.to_infinitive = true;
                } else {
                    st.preposition = Some(m.lemma.clone());
                }
                continue;
            }
            MorphemeKind::Conjunction => {
                st.coordinate = true;
                continue;
            }
            MorphemeKind::Pronoun if english_pronoun(&m.lemma).is_some() => {
                let Some(forms) = english_pronoun(&m.lemma) else { continue };
                let owner_of_next = lower == forms.possessive
                    && next.map_or(false, |n| matches!(n.pos(), Some(PartOfSpeech::Noun | PartOfSpeech::Adjective)));
                // it rains, it is snowing
                let weather_verb = words[i + 1..]
                    .iter()
                    .find(|n| n.morpheme.kind != MorphemeKind::Auxiliary)
                    .and_then(|n| n.gloss.as_ref())
                    .map_or(false, |g| g.pos == PartOfSpeech::Verb && g.has("weather"));
                if forms.nominative == "it" && weather_verb {
                    c.impersonal = true;
                    continue;
                }
                let mut np = KoreanNp::pronoun(forms.nominative);
                if let Some(entity) = w.referent.as_ref().filter(|_| forms.nominative == "it" && !literal) {
                    np = KoreanNp::from_entity(entity);
                }
                if m.role == R::Possessive || owner_of_next {
                    st.possessor = Some(np);
                } else {
                    c.place(&mut st, np);
                }
                continue;
            }
            _ => {}
        }

        let Some(g) = &w.gloss else {
            c.place(&mut st, KoreanNp::from_word(w));
            continue;
        };
        match g.pos {
            PartOfSpeech::Interjection => c.interjections.push(g.text.clone()),
            PartOfSpeech::Verb => {
                if c.verb.is_none() && !c.possession {
                    st.verb_seen = true;
                    c.verb = Some(g.text.clone());
                    c.verb_english = m.lemma.clone();
                    c.verb_tags = g.tags.clone();
                    match m.inflection {
                        Some(Inflection::Progressive) if c.be => c.modality = Modality::Progressive,
                        Some(Inflection::Past | Inflection::PastParticiple) if c.modality != Modality::Future => {
                            c.tense = Some(Tense::Past)
                        }
                        _ => {}
                    }
                } else if st.to_infinitive {
                    st.to_infinitive = false;
                    if c.verb_english == "want" {
                        c.modality = Modality::Want;
                        c.verb = Some(g.text.clone());
                        c.verb_tags = g.tags.clone();
                    } else if c.verb_tags.contains("motion") {
                        if let Some(stem) = g.text.strip_suffix('다') {
                            c.purpose = Some(format!("{}러", eu_linked(stem)));
                        }
                    }
                }
            }
            PartOfSpeech::Adjective => {
                if next.map_or(false, EnglishWord::is_nominal) {
                    st.modifiers.push(korean_attributive(&g.text));
                } else if c.verb.is_none() {
                    st.verb_seen = true;
                    c.adjective = Some(g.text.clone());
                } else {
                    c.adverbs.push(korean_attributive(&g.text));
                }
            }
            PartOfSpeech::Adverb if g.has("question") => {
                c.wh_adverb = Some(g.text.clone());
                c.question = true;
            }
            PartOfSpeech::Adverb => c.adverbs.push(g.text.clone()),
            PartOfSpeech::Numeral | PartOfSpeech::Determiner => st.modifiers.push(g.text.clone()),
            _ => {
                if matches!(lower.as_str(), "this" | "that") && next.map_or(false, EnglishWord::is_nominal) {
                    st.modifiers.push(if lower == "this" { "이" } else { "저" }.to_string());
                    continue;
                }
                let np = KoreanNp::from_word(w);
                if np.question {
                    c.question = true;
                }
                c.place(&mut st, np);
            }
        }
    }
    c
}

fn remember_korean(c: &KoreanClause, tracker: &mut EntityTracker) {
    if let Some(s) = c.subject.as_ref().filter(|s| s.pronoun.is_none() && !s.question) {
        tracker.mention(s.entity(EntityRole::Subject));
    }
    for np in c.object.iter().chain(&c.possessed).filter(|o| o.pronoun.is_none() && !o.question) {
        tracker.mention(np.entity(EntityRole::Object));
    }
}

/// Renders one English sentence in Korean at the requested speech level.
pub fn english_to_korean(
    words: &[EnglishWord],
    terminal: Option<char>,
    formality: Formality,
    tracker: &mut EntityTracker,
) -> String {
    let literal = formality == Formality::Literal;
    let split = split_english_clauses(words);
    let count = split.len();
    let mut clauses: Vec<KoreanClause> = split
        .into_iter()
        .enumerate()
        .map(|(i, (lead, ws))| {
            let mut c = parse_english_clause(ws, lead, literal);
            c.settle(terminal == Some('?') && i + 1 == count);
            c
        })
        .collect();
    // Conditions and causes come first in Korean.
    for i in 1..clauses.len() {
        let subordinate = |c: &KoreanClause| matches!(c.lead, Some(Connective::If | Connective::Because));
        if subordinate(&clauses[i]) && !subordinate(&clauses[i - 1]) {
            clauses.swap(i - 1, i);
        }
    }
    let Some(last) = clauses.len().checked_sub(1) else {
        return String::new();
    };
    let question = clauses[last].question;
    let full = clauses.iter().any(KoreanClause::has_predicate);
    let mut parts = Vec::with_capacity(clauses.len());
    for (i, c) in clauses.iter().enumerate() {
        let tense = c.tense.unwrap_or(Tense::Present);
        let end = if i == last {
            let mood = if c.question {
                Mood::Question
            } else if c.imperative {
                Mood::Imperative
            } else {
                Mood::Statement
            };
            ClauseEnd::Final(mood, tense)
        } else {
            let connective = match c.lead {
                Some(k @ (Connective::If | Connective::Because)) => k,
                _ => clauses[i + 1]
                    .lead
                    .filter(|k| !matches!(k, Connective::If | Connective::Because))
                    .unwrap_or(Connective::And),
            };
            ClauseEnd::Link(connective, tense)
        };
        parts.push(c.render(end, formality));
        remember_korean(c, tracker);
    }
    let body = parts.into_iter().filter(|p| !p.is_empty()).collect::<Vec<_>>().join(" ");
    trace!(body = %body, "english clause rendered");
    punctuate(body, terminal.filter(|t| *t != '?'), question, full)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn korean_speech_levels() {
        let v = MorphemeKind::Verb;
        let st = Mood::Statement;
        assert_eq!(conjugate("가", v, Tense::Present, st, Formality::Formal), "갑니다");
        assert_eq!(conjugate("가", v, Tense::Present, Mood::Question, Formality::Formal), "갑니까");
        assert_eq!(conjugate("먹", v, Tense::Present, st, Formality::Friendly), "먹어요");
        assert_eq!(conjugate("먹", v, Tense::Present, st, Formality::Casual), "먹어");
        assert_eq!(conjugate("먹", v, Tense::Present, st, Formality::Neutral), "먹는다");
        assert_eq!(conjugate("크", MorphemeKind::Adjective, Tense::Present, st, Formality::Neutral), "크다");
        assert_eq!(conjugate("가", v, Tense::Past, st, Formality::Neutral), "갔다");
        assert_eq!(conjugate("하", v, Tense::Past, st, Formality::Formal), "했습니다");
        assert_eq!(conjugate("마시", v, Tense::Past, st, Formality::Friendly), "마셨어요");
        assert_eq!(conjugate("만들", v, Tense::Present, Mood::Question, Formality::Neutral), "만드니");
        assert_eq!(conjugate("앉", v, Tense::Present, Mood::Imperative, Formality::Friendly), "앉으세요");
        assert_eq!(conjugate("가", v, Tense::Present, Mood::Imperative, Formality::Neutral), "가라");
    }

    #[test]
    fn clause_links() {
        assert_eq!(link("먹", Tense::Present, Connective::And), "먹고");
        assert_eq!(link("가", Tense::Past, Connective::But), "갔지만");
        assert_eq!(link("오", Tense::Past, Connective::So), "와서");
        assert_eq!(link("먹", Tense::Present, Connective::If), "먹으면");
        assert_eq!(link("가", Tense::Present, Connective::Because), "가니까");
    }

    #[test]
    fn copula_follows_batchim() {
        let st = Mood::Statement;
        assert_eq!(copula_ending("학생", Tense::Present, st, Formality::Neutral), "이다");
        assert_eq!(copula_ending("의사", Tense::Present, st, Formality::Friendly), "예요");
        assert_eq!(copula_ending("학생", Tense::Present, st, Formality::Friendly), "이에요");
        assert_eq!(copula_ending("학생", Tense::Past, st, Formality::Formal), "이었습니다");
        assert_eq!(not_copula(Tense::Present, st, Formality::Formal), "아닙니다");
        assert_eq!(copula_link("학생", Connective::So, Tense::Present), "이라서");
    }

    #[test]
    fn pronoun_particles_contract() {
        assert_eq!(attach("나", ParticleCase::Subject), "내가");
        assert_eq!(attach("누구", ParticleCase::Subject), "누가");
        assert_eq!(attach("책", ParticleCase::Object), "책을");
        assert_eq!(attach("친구", ParticleCase::Comitative), "친구와");
    }

    #[test]
    fn english_verb_groups() {
        let mid: Vec<String> = Vec::new();
        let go = Lexical::Verb("go".to_string());
        let g = verb_group(&go, Modality::Plain, Tense::Past, false, false, (1, false), &mid);
        assert_eq!((g.aux, g.rest), (None, vec!["went".to_string()]));
        let g = verb_group(&go, Modality::Plain, Tense::Present, true, false, (3, false), &mid);
        assert_eq!(g.aux.as_deref(), Some("does"));
        assert_eq!(g.rest, vec!["not", "go"]);
        let g = verb_group(&go, Modality::Progressive, Tense::Present, false, false, (1, false), &mid);
        assert_eq!(g.aux.as_deref(), Some("am"));
        assert_eq!(g.rest, vec!["going"]);
        let g = verb_group(&go, Modality::Want, Tense::Present, false, false, (3, false), &mid);
        assert_eq!(g.rest, vec!["wants to go"]);
        let be = Lexical::Be(Some("a student".to_string()));
        let g = verb_group(&be, Modality::Plain, Tense::Past, false, true, (2, false), &mid);
        assert_eq!(g.aux.as_deref(), Some("were"));
    }

    #[test]
    fn probable_future_takes_probably() {
        let rain = Lexical::Verb("rain".to_string());
        let g = verb_group(&rain, Modality::Probably, Tense::Present, false, false, (3, false), &[]);
        assert_eq!(g.aux.as_deref(), Some("will"));
        assert_eq!(g.rest, vec!["probably", "rain"]);
    }

    #[test]
    fn ha_verbs_negate_with_ji_anh() {
        let end = ClauseEnd::Final(Mood::Statement, Tense::Present);
        let like = KoreanClause { verb: Some("좋아하다".to_string()), negated: true, ..Default::default() };
        assert_eq!(like.predicate(Formality::Neutral).finish(end, Formality::Neutral), "좋아하지 않는다");
        let eat = KoreanClause { verb: Some("먹다".to_string()), negated: true, ..Default::default() };
        assert_eq!(eat.predicate(Formality::Neutral).finish(end, Formality::Neutral), "안 먹는다");
    }

    #[test]
    fn wh_word_becomes_the_predicate() {
        let mut c = KoreanClause {
            be: true,
            subject: Some(KoreanNp { text: "어디".to_string(), question: true, ..Default::default() }),
            complement: Some(KoreanNp { text: "화장실".to_string(), english: "bathroom".to_string(), ..Default::default() }),
            ..Default::default()
        };
        c.settle(true);
        assert_eq!(c.subject.map(|s| s.text).as_deref(), Some("화장실"));
        assert_eq!(c.complement.map(|s| s.text).as_deref(), Some("어디"));
    }

    #[test]
    fn slots_follow_neighbours() {
        let m = |lemma: &str, kind, role| Morpheme::new(lemma, lemma, kind, role);
        let ms = vec![
            m("I", MorphemeKind::Pronoun, R::Subject),
            m("park", MorphemeKind::Noun, R::None),
            m("the", MorphemeKind::Determiner, R::None),
            m("car", MorphemeKind::Noun, R::None),
        ];
        assert_eq!(english_slots(&ms), vec![Slot::Any, Slot::Predicate, Slot::Any, Slot::Nominal]);
        assert!(Slot::Predicate.admits(PartOfSpeech::Verb));
        assert!(!Slot::Nominal.admits(PartOfSpeech::Verb));
    }
}
