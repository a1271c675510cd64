// File: src/core/context.rs
use crate::core::dictionary::{is_attribute_tag, DictionaryStore};
use crate::core::morphology::MorphologicalAnalyzer;
use crate::core::types::{Direction, Formality, Sense};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::trace;

/// Weights of the polysemy scoring function. Tuned offline by
/// [`crate::learning::optimize_weights`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Trigger found in the word right after the target.
    pub immediate_after: f64,
    /// Trigger found in the word right before the target.
    pub immediate_before: f64,
    /// Trigger within the context window.
    pub near_context: f64,
    /// Trigger anywhere else in the sentence or earlier sentences.
    pub full_sentence: f64,
    pub domain_match: f64,
    /// Multiplier on the sense's own priority.
    pub priority: f64,
    /// Sense tagged with the clause's emotion, register or speaker type.
    pub register_match: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            immediate_after: 4.0,
            immediate_before: 3.0,
            near_context: 1.5,
            full_sentence: 0.3,
            domain_match: 1.5,
            priority: 1.0,
            register_match: 1.0,
        }
    }
}

impl ScoringWeights {
    pub const LEN: usize = 7;

    pub fn to_array(&self) -> [f64; Self::LEN] {
        [
            self.immediate_after,
            self.immediate_before,
            self.near_context,
            self.full_sentence,
            self.domain_match,
            self.priority,
            self.register_match,
        ]
    }

    pub fn from_array(v: [f64; Self::LEN]) -> Self {
        Self {
            immediate_after: v[0],
            immediate_before: v[1],
            near_context: v[2],
            full_sentence: v[3],
            domain_match: v[4],
            priority: v[5],
            register_match: v[6],
        }
    }
}

/// A context word: its surface form and the lemma of its stem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextToken {
    pub surface: String,
    pub lemma: String,
}

impl ContextToken {
    /// Surface or lemma begins with `trigger` (마시 for 마셨다 via 마시다).
    fn matches(&self, trigger: &str) -> bool {
        let trigger = trigger.to_lowercase();
        self.surface.to_lowercase().starts_with(&trigger) || self.lemma.to_lowercase().starts_with(&trigger)
    }

    /// Register markers: Korean endings may sit anywhere inside the word,
    /// English markers must be the whole word.
    fn has_marker(&self, marker: &str) -> bool {
        if marker.is_ascii() {
            self.surface.eq_ignore_ascii_case(marker) || self.lemma.eq_ignore_ascii_case(marker)
        } else {
            self.surface.contains(marker)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Emotion {
    Neutral,
    Joy,
    Sadness,
    Anger,
    Surprise,
    Apology,
    Gratitude,
}

impl Emotion {
    /// Sense tag a clause in this mood favours.
    pub fn tag(self) -> Option<&'static str> {
        match self {
            Emotion::Neutral => None,
            Emotion::Joy => Some("joy"),
            Emotion::Sadness => Some("sadness"),
            Emotion::Anger => Some("anger"),
            Emotion::Surprise => Some("surprise"),
            Emotion::Apology => Some("apology"),
            Emotion::Gratitude => Some("gratitude"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Situation {
    Neutral,
    Formal,
    Polite,
    Casual,
}

impl Situation {
    pub fn tag(self) -> Option<&'static str> {
        match self {
            Situation::Neutral => None,
            Situation::Formal => Some("formal"),
            Situation::Polite => Some("polite"),
            Situation::Casual => Some("casual"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeakerType {
    Unknown,
    Peer,
    Superior,
    Professional,
}

impl SpeakerType {
    pub fn tag(self) -> Option<&'static str> {
        match self {
            SpeakerType::Unknown | SpeakerType::Peer => None,
            SpeakerType::Superior => Some("honorific"),
            SpeakerType::Professional => Some("professional"),
        }
    }
}

const EMOTION_MARKERS: &[(Emotion, &[&str])] = &[
    (Emotion::Joy, &["기쁘", "기뻐", "행복", "신나", "최고", "happy", "glad", "great", "wonderful"]),
    (Emotion::Sadness, &["슬프", "슬퍼", "우울", "외로", "울다", "sad", "cry", "cried", "lonely"]),
    (Emotion::Anger, &["화나", "화가", "짜증", "싫어", "angry", "hate", "annoyed"]),
    (Emotion::Surprise, &["깜짝", "놀라", "놀랐", "wow", "surprised", "amazing"]),
    (Emotion::Apology, &["미안", "죄송", "sorry", "apolog"]),
    (Emotion::Gratitude, &["감사", "고맙", "고마워", "thank"]),
];

const FORMAL_MARKERS: &[&str] = &["습니다", "습니까", "니다", "니까", "십시오", "께서", "please", "sir", "madam", "kindly"];
const CASUAL_MARKERS: &[&str] = &["hey", "gonna", "wanna", "yeah", "dude", "guys"];
const HONORIFIC_MARKERS: &[&str] = &["께서", "님", "드리", "sir", "madam"];
const PROFESSIONAL_DOMAINS: &[&str] = &["medical", "legal", "technology"];

/// What a clause is about and how it is said.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextAnalysis {
    pub domain: Option<String>,
    pub emotion: Emotion,
    pub situation: Situation,
    pub speaker: SpeakerType,
    pub tokens: Vec<ContextToken>,
    /// Words of earlier sentences in the same call; they score at
    /// `full_sentence` weight.
    pub history: Vec<ContextToken>,
}

impl ContextAnalysis {
    /// Position of the first token whose surface or stem equals `word`.
    pub fn position_of(&self, word: &str) -> Option<usize> {
        self.tokens
            .iter()
            .position(|t| t.lemma == word || t.surface == word || t.surface.starts_with(word))
    }

    pub fn with_history(mut self, history: impl IntoIterator<Item = ContextToken>) -> Self {
        self.history.extend(history);
        self
    }

    /// Sense tags favoured by the clause's emotion, register and speaker.
    pub fn register_tags(&self) -> impl Iterator<Item = &'static str> {
        [self.emotion.tag(), self.situation.tag(), self.speaker.tag()].into_iter().flatten()
    }

    /// Output formality suggested by the source's register.
    pub fn suggested_formality(&self) -> Option<Formality> {
        match self.situation {
            Situation::Formal => Some(Formality::Formal),
            Situation::Polite => Some(Formality::Friendly),
            Situation::Casual => Some(Formality::Casual),
            Situation::Neutral => None,
        }
    }
}

/// Outcome of polysemy scoring for one word.
#[derive(Debug, Clone, PartialEq)]
pub struct SenseChoice<'e> {
    pub index: usize,
    pub sense: &'e Sense,
    /// Margin between the best and runner-up scores, relative to the best.
    pub confidence: f64,
    /// Scoring ended in a tie and the deterministic tie-break decided.
    pub tied: bool,
    /// Sense ids that shared the best score.
    pub candidates: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextEngine {
    weights: ScoringWeights,
    window: usize,
}

impl Default for ContextEngine {
    fn default() -> Self {
        Self::new(ScoringWeights::default(), 3)
    }
}

impl ContextEngine {
    pub fn new(weights: ScoringWeights, window: usize) -> Self {
        Self { weights, window: window.max(1) }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Splits a clause into context tokens (surface + stem lemma).
    pub fn context_tokens(
        dict: &DictionaryStore,
        analyzer: &MorphologicalAnalyzer,
        clause: &str,
        direction: Direction,
    ) -> Vec<ContextToken> {
        clause
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| c.is_ascii_punctuation() && c != '\''))
            .filter(|w| !w.is_empty())
            .map(|surface| {
                let lemma = analyzer
                    .analyze(dict, surface, direction)
                    .into_iter()
                    .find(|m| m.is_stem())
                    .map(|m| m.lemma)
                    .unwrap_or_else(|| surface.to_string());
                ContextToken { surface: surface.to_string(), lemma }
            })
            .collect()
    }

    /// Tags a clause with its domain, emotion, register and speaker type.
    pub fn analyze_context(
        &self,
        dict: &DictionaryStore,
        analyzer: &MorphologicalAnalyzer,
        clause: &str,
        direction: Direction,
    ) -> ContextAnalysis {
        let tokens = Self::context_tokens(dict, analyzer, clause, direction);
        self.analyze_tokens(dict, tokens, direction)
    }

    pub fn analyze_tokens(&self, dict: &DictionaryStore, tokens: Vec<ContextToken>, direction: Direction) -> ContextAnalysis {
        let domain = detect_domain(dict, &tokens, direction);
        let emotion = detect_emotion(&tokens);
        let situation = detect_situation(&tokens, direction);
        let speaker = detect_speaker(&tokens, situation, domain.as_deref());
        trace!(?domain, ?emotion, ?situation, ?speaker, "context analyzed");
        ContextAnalysis { domain, emotion, situation, speaker, tokens, history: Vec::new() }
    }

    /// Picks the sense of the word at `target` that best fits the context.
    ///
    /// Score = priority weight × sense priority, plus the domain weight when
    /// the sense is tagged with the clause domain, plus one positional weight
    /// per context word containing one of the sense's triggers. Ties go to the
    /// higher priority, then to the earlier-registered sense, and are reported.
    pub fn resolve_polysemy<'e>(&self, target: usize, context: &ContextAnalysis, senses: &'e [Sense]) -> Option<SenseChoice<'e>> {
        let first = senses.first()?;
        if senses.len() == 1 {
            return Some(SenseChoice {
                index: 0,
                sense: first,
                confidence: 1.0,
                tied: false,
                candidates: vec![first.id.clone()],
            });
        }
        let scores: Vec<f64> = senses.iter().map(|s| self.score(target, context, s)).collect();

        // Senses are stored priority-first with stable registration order, so
        // the first index among equal scores already applies the tie-break.
        let best_score = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let tied: Vec<usize> = (0..senses.len())
            .filter(|&i| (scores[i] - best_score).abs() < 1e-9)
            .collect();
        let index = tied
            .iter()
            .copied()
            .max_by(|&a, &b| senses[a].priority.total_cmp(&senses[b].priority).then(b.cmp(&a)))
            .unwrap_or(0);
        let runner_up = scores
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != index)
            .map(|(_, &s)| s)
            .fold(f64::NEG_INFINITY, f64::max);
        let confidence = if best_score > 0.0 {
            ((best_score - runner_up) / best_score).clamp(0.0, 1.0)
        } else {
            0.0
        };
        trace!(?scores, chosen = %senses[index].id, "polysemy resolved");
        Some(SenseChoice {
            index,
            sense: &senses[index],
            confidence,
            tied: tied.len() > 1,
            candidates: tied.iter().map(|&i| senses[i].id.clone()).collect(),
        })
    }

    fn score(&self, target: usize, context: &ContextAnalysis, sense: &Sense) -> f64 {
        let w = &self.weights;
        let mut score = w.priority * sense.priority;
        if let Some(domain) = &context.domain {
            if sense.has_tag(domain) {
                score += w.domain_match;
            }
        }
        if context.register_tags().any(|tag| sense.has_tag(tag)) {
            score += w.register_match;
        }
        if sense.triggers.is_empty() {
            return score;
        }
        let hit = |token: &ContextToken| sense.triggers.iter().any(|t| token.matches(t));
        for (pos, token) in context.tokens.iter().enumerate() {
            if pos == target || !hit(token) {
                continue;
            }
            let offset = pos as isize - target as isize;
            score += match offset {
                1 => w.immediate_after,
                -1 => w.immediate_before,
                d if d.unsigned_abs() <= self.window => w.near_context,
                _ => w.full_sentence,
            };
        }
        score += context.history.iter().filter(|t| hit(t)).count() as f64 * w.full_sentence;
        score
    }
}

/// Plurality vote over the domain tags of unambiguous words. A tie means no domain.
pub fn detect_domain(dict: &DictionaryStore, tokens: &[ContextToken], direction: Direction) -> Option<String> {
    let mut votes: BTreeMap<&str, usize> = BTreeMap::new();
    for token in tokens {
        let Some(entry) = dict
            .lookup(&token.lemma, direction)
            .or_else(|| dict.lookup(&token.surface, direction))
        else {
            continue;
        };
        if entry.is_polysemous() {
            continue;
        }
        for tag in &entry.primary().domain_tags {
            if tag != "general" && !is_attribute_tag(tag) {
                *votes.entry(tag.as_str()).or_default() += 1;
            }
        }
    }
    let best = votes.values().copied().max()?;
    let mut leaders = votes.iter().filter(|(_, &n)| n == best);
    let (domain, _) = leaders.next()?;
    if leaders.next().is_some() {
        return None;
    }
    Some(domain.to_string())
}

fn count_markers(tokens: &[ContextToken], markers: &[&str]) -> usize {
    tokens
        .iter()
        .filter(|t| markers.iter().any(|m| t.has_marker(m)))
        .count()
}

fn detect_emotion(tokens: &[ContextToken]) -> Emotion {
    let mut best = (0, Emotion::Neutral);
    for (emotion, markers) in EMOTION_MARKERS {
        let n = tokens.iter().filter(|t| markers.iter().any(|m| t.matches(m))).count();
        if n > best.0 {
            best = (n, *emotion);
        }
    }
    best.1
}

fn detect_situation(tokens: &[ContextToken], direction: Direction) -> Situation {
    if count_markers(tokens, FORMAL_MARKERS) > 0 {
        return Situation::Formal;
    }
    if count_markers(tokens, CASUAL_MARKERS) > 0 {
        return Situation::Casual;
    }
    if direction == Direction::KoEn {
        if let Some(last) = tokens.last() {
            if last.surface.ends_with('요') {
                return Situation::Polite;
            }
            if ["야", "어", "아", "지", "니"].iter().any(|e| last.surface.ends_with(e)) {
                return Situation::Casual;
            }
        }
    }
    Situation::Neutral
}

fn detect_speaker(tokens: &[ContextToken], situation: Situation, domain: Option<&str>) -> SpeakerType {
    if count_markers(tokens, HONORIFIC_MARKERS) > 0 {
        SpeakerType::Superior
    } else if domain.map_or(false, |d| PROFESSIONAL_DOMAINS.contains(&d)) {
        SpeakerType::Professional
    } else if situation == Situation::Casual {
        SpeakerType::Peer
    } else {
        SpeakerType::Unknown
    }
}

// --- Referent tracking ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Neuter,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityRole {
    Subject,
    Object,
    Other,
}

/// A noun mentioned earlier in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub korean: String,
    pub english: String,
    pub role: EntityRole,
    pub gender: Gender,
    pub plural: bool,
    pub person: bool,
    pub proper: bool,
}

impl Entity {
    /// Builds an entity from a resolved sense and the words on both sides.
    pub fn from_sense(korean: &str, english: &str, sense: &Sense, role: EntityRole, proper: bool) -> Self {
        Self::from_tags(korean, english, &sense.domain_tags, role, proper)
    }

    pub fn from_tags(korean: &str, english: &str, tags: &BTreeSet<String>, role: EntityRole, proper: bool) -> Self {
        let person = tags.contains("person");
        let gender = if tags.contains("male") {
            Gender::Male
        } else if tags.contains("female") {
            Gender::Female
        } else if person {
            Gender::Unknown
        } else {
            Gender::Neuter
        };
        Self {
            korean: korean.to_string(),
            english: english.to_string(),
            role,
            gender,
            plural: tags.contains("plural"),
            person,
            proper,
        }
    }

    /// Whether a pronoun with these features may refer to this entity.
    fn agrees_with(&self, reference: &Reference) -> bool {
        if reference.plural {
            return self.plural;
        }
        if self.plural {
            return false;
        }
        match reference.gender {
            Gender::Male => self.gender == Gender::Male || (self.person && self.gender == Gender::Unknown),
            Gender::Female => self.gender == Gender::Female || (self.person && self.gender == Gender::Unknown),
            Gender::Neuter => !self.person,
            Gender::Unknown => true,
        }
    }
}

/// Rolling window of recently mentioned entities, most recent last.
/// Owned by the caller when history should persist across calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityTracker {
    window_size: usize,
    history: VecDeque<Entity>,
}

impl Default for EntityTracker {
    fn default() -> Self {
        Self::new(5)
    }
}

impl EntityTracker {
    pub fn new(window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self { window_size, history: VecDeque::with_capacity(window_size) }
    }

    /// Records a mention. A repeated entity moves to the front of the window.
    /// O(n) in the window size.
    pub fn mention(&mut self, entity: Entity) {
        self.history.retain(|e| e.korean != entity.korean);
        if self.history.len() == self.window_size {
            self.history.pop_front();
        }
        self.history.push_back(entity);
    }

    /// Most recent entity agreeing with `reference`, preferring `role`.
    pub fn resolve(&self, reference: &Reference, role: EntityRole) -> Option<&Entity> {
        self.history
            .iter()
            .rev()
            .find(|e| e.role == role && e.agrees_with(reference))
            .or_else(|| self.history.iter().rev().find(|e| e.agrees_with(reference)))
    }

    pub fn most_recent(&self) -> Option<&Entity> {
        self.history.back()
    }

    pub fn contains_english(&self, english: &str) -> bool {
        self.history.iter().any(|e| e.english.eq_ignore_ascii_case(english))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.history.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}

/// A pronoun or demonstrative that points back at an earlier entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub surface: String,
    /// Word index in the text.
    pub position: usize,
    pub gender: Gender,
    pub plural: bool,
}

impl Reference {
    pub fn new(surface: &str, gender: Gender, plural: bool) -> Self {
        Self { surface: surface.to_string(), position: 0, gender, plural }
    }
}

/// (pronoun, gender, plural, stands alone). Bare 그 is the demonstrative
/// (그 책), so it only counts as "he" with a particle attached.
const KOREAN_REFERENCES: &[(&str, Gender, bool, bool)] = &[
    ("그녀", Gender::Female, false, true),
    ("그들", Gender::Unknown, true, true),
    ("그것", Gender::Neuter, false, true),
    ("이것", Gender::Neuter, false, true),
    ("저것", Gender::Neuter, false, true),
    ("그거", Gender::Neuter, false, true),
    ("그", Gender::Male, false, false),
];

const REFERENCE_PARTICLES: &[&str] = &["은", "는", "이", "가", "을", "를", "의", "에게", "한테", "도", "만", "랑", "와", "과"];

fn korean_reference(word: &str) -> Option<(Gender, bool)> {
    KOREAN_REFERENCES.iter().find_map(|&(pronoun, gender, plural, bare)| {
        let rest = word.strip_prefix(pronoun)?;
        let whole = if rest.is_empty() { bare } else { REFERENCE_PARTICLES.contains(&rest) };
        whole.then_some((gender, plural))
    })
}

const ENGLISH_REFERENCES: &[(&str, Gender, bool)] = &[
    ("he", Gender::Male, false),
    ("him", Gender::Male, false),
    ("his", Gender::Male, false),
    ("she", Gender::Female, false),
    ("her", Gender::Female, false),
    ("it", Gender::Neuter, false),
    ("its", Gender::Neuter, false),
    ("they", Gender::Unknown, true),
    ("them", Gender::Unknown, true),
    ("their", Gender::Unknown, true),
];

/// Finds pronouns in `text` that refer back to earlier entities.
pub fn detect_context_reference(text: &str, direction: Direction) -> Vec<Reference> {
    text.split_whitespace()
        .enumerate()
        .filter_map(|(position, word)| {
            let word = word.trim_matches(|c: char| c.is_ascii_punctuation());
            let found = match direction {
                Direction::KoEn => korean_reference(word),
                Direction::EnKo => {
                    let lower = word.to_lowercase();
                    ENGLISH_REFERENCES
                        .iter()
                        .find(|(p, ..)| *p == lower)
                        .map(|&(_, gender, plural)| (gender, plural))
                }
            };
            found.map(|(gender, plural)| Reference {
                surface: word.to_string(),
                position,
                gender,
                plural,
            })
        })
        .collect()
}

/// Entity a detected reference points back at. Neuter references (it, 그것)
/// look for an earlier object first, personal ones for an earlier subject.
pub fn resolve_entity_reference<'t>(tracker: &'t EntityTracker, reference: &Reference) -> Option<&'t Entity> {
    let role = if reference.gender == Gender::Neuter { EntityRole::Object } else { EntityRole::Subject };
    tracker.resolve(reference, role)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::PartOfSpeech;

    fn resolve(sentence: &str, word: &str) -> String {
        let dict = DictionaryStore::builtin().unwrap();
        let analyzer = MorphologicalAnalyzer::new();
        let engine = ContextEngine::default();
        let context = engine.analyze_context(&dict, &analyzer, sentence, Direction::KoEn);
        let target = context.position_of(word).unwrap();
        let entry = dict.lookup(word, Direction::KoEn).unwrap();
        engine.resolve_polysemy(target, &context, &entry.senses).unwrap().sense.id.clone()
    }

    #[test]
    fn cha_follows_context() {
        assert_eq!(resolve("차를 마시다", "차"), "tea");
        assert_eq!(resolve("차를 운전하다", "차"), "car");
        assert_eq!(resolve("두 수의 차를 빼다", "차"), "difference");
    }

    #[test]
    fn tada_near_sea_means_ride() {
        assert_eq!(resolve("바다에서 배를 타다", "배"), "ship");
        assert_eq!(resolve("배가 아프다", "배"), "stomach");
    }

    #[test]
    fn ties_fall_back_to_priority_then_order() {
        let mut a = Sense::new("first", PartOfSpeech::Noun);
        a.priority = 1.0;
        let mut b = Sense::new("second", PartOfSpeech::Noun);
        b.priority = 1.0;
        let senses = vec![a, b];
        let context = ContextAnalysis {
            domain: None,
            emotion: Emotion::Neutral,
            situation: Situation::Neutral,
            speaker: SpeakerType::Unknown,
            tokens: vec![],
            history: vec![],
        };
        let choice = ContextEngine::default().resolve_polysemy(0, &context, &senses).unwrap();
        assert_eq!(choice.sense.id, "first");
        assert!(choice.tied);
        assert_eq!(choice.candidates, vec!["first", "second"]);
    }

    #[test]
    fn domain_vote_ignores_general_and_ties() {
        let dict = DictionaryStore::builtin().unwrap();
        let analyzer = MorphologicalAnalyzer::new();
        let engine = ContextEngine::default();
        let c = engine.analyze_context(&dict, &analyzer, "컴퓨터에 프로그램을 설치했다", Direction::KoEn);
        assert_eq!(c.domain.as_deref(), Some("technology"));
        let c = engine.analyze_context(&dict, &analyzer, "나는 학교에 갔다", Direction::KoEn);
        assert_eq!(c.domain, None);
    }

    #[test]
    fn register_and_emotion_markers() {
        let dict = DictionaryStore::builtin().unwrap();
        let analyzer = MorphologicalAnalyzer::new();
        let engine = ContextEngine::default();
        let c = engine.analyze_context(&dict, &analyzer, "정말 감사합니다", Direction::KoEn);
        assert_eq!(c.situation, Situation::Formal);
        assert_eq!(c.emotion, Emotion::Gratitude);
        let c = engine.analyze_context(&dict, &analyzer, "hey I am so sad", Direction::EnKo);
        assert_eq!(c.situation, Situation::Casual);
        assert_eq!(c.emotion, Emotion::Sadness);
    }

    #[test]
    fn tracker_resolves_most_recent_agreeing_entity() {
        let mut person = Sense::new("Cheolsu", PartOfSpeech::Noun);
        person.domain_tags.extend(["person".to_string(), "male".to_string()]);
        let book = Sense::new("book", PartOfSpeech::Noun);

        let mut tracker = EntityTracker::new(2);
        tracker.mention(Entity::from_sense("철수", "Cheolsu", &person, EntityRole::Subject, true));
        tracker.mention(Entity::from_sense("책", "book", &book, EntityRole::Object, false));

        let he = Reference::new("he", Gender::Male, false);
        assert_eq!(tracker.resolve(&he, EntityRole::Subject).unwrap().korean, "철수");
        let it = Reference::new("it", Gender::Neuter, false);
        assert_eq!(tracker.resolve(&it, EntityRole::Object).unwrap().korean, "책");

        // Window of two: a third mention evicts the oldest.
        tracker.mention(Entity::from_sense("펜", "pen", &book, EntityRole::Object, false));
        assert!(tracker.resolve(&he, EntityRole::Subject).is_none());
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn references_are_detected() {
        let refs = detect_context_reference("I met Tom. He gave it to me", Direction::EnKo);
        let found: Vec<&str> = refs.iter().map(|r| r.surface.as_str()).collect();
        assert_eq!(found, vec!["He", "it"]);
        let refs = detect_context_reference("그는 그것을 샀다", Direction::KoEn);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].gender, Gender::Male);
    }

    #[test]
    fn reference_words_must_be_whole_tokens() {
        for text in ["그림의 떡", "그런 날이 있다", "그 책을 읽었다", "그래서 갔다"] {
            assert!(detect_context_reference(text, Direction::KoEn).is_empty(), "{}", text);
        }
        let refs = detect_context_reference("그가 왔다", Direction::KoEn);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].surface, "그가");
    }

    #[test]
    fn neuter_references_resolve_to_objects() {
        let person = Sense::new("Cheolsu", PartOfSpeech::Noun);
        let book = Sense::new("book", PartOfSpeech::Noun);
        let mut tracker = EntityTracker::new(5);
        tracker.mention(Entity::from_sense("책", "book", &book, EntityRole::Object, false));
        tracker.mention(Entity::from_sense("철수", "Cheolsu", &person, EntityRole::Subject, true));
        let refs = detect_context_reference("It was good", Direction::EnKo);
        assert_eq!(resolve_entity_reference(&tracker, &refs[0]).unwrap().english, "book");
    }

    #[test]
    fn place_names_are_not_emotion_markers() {
        let dict = DictionaryStore::builtin().unwrap();
        let analyzer = MorphologicalAnalyzer::new();
        let engine = ContextEngine::default();
        let c = engine.analyze_context(&dict, &analyzer, "서울에 갔다", Direction::KoEn);
        assert_eq!(c.emotion, Emotion::Neutral);
        let c = engine.analyze_context(&dict, &analyzer, "they went home", Direction::EnKo);
        assert_eq!(c.situation, Situation::Neutral);
        let c = engine.analyze_context(&dict, &analyzer, "그는 많이 울었다", Direction::KoEn);
        assert_eq!(c.emotion, Emotion::Sadness);
    }

    #[test]
    fn mood_tags_break_ties_between_senses() {
        let apple = Sense::new("apple", PartOfSpeech::Noun);
        let mut apology = Sense::new("apology", PartOfSpeech::Noun);
        apology.domain_tags.insert("apology".to_string());
        let senses = vec![apple, apology];
        let mut context = ContextAnalysis {
            domain: None,
            emotion: Emotion::Apology,
            situation: Situation::Neutral,
            speaker: SpeakerType::Unknown,
            tokens: vec![],
            history: vec![],
        };
        let engine = ContextEngine::default();
        assert_eq!(engine.resolve_polysemy(0, &context, &senses).unwrap().sense.id, "apology");
        context.emotion = Emotion::Neutral;
        assert_eq!(engine.resolve_polysemy(0, &context, &senses).unwrap().sense.id, "apple");
    }
}
