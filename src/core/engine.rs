// File: src/core/engine.rs
use crate::config::TranslatorConfig;
use crate::core::context::{
    detect_context_reference, resolve_entity_reference, ContextAnalysis, ContextEngine, ContextToken, Entity,
    EntityTracker,
};
use crate::core::dictionary::{english_pronoun, DictionaryStore, InjectionReport};
use crate::core::grammar::{self, english_slots, EnglishWord, Gloss, KoreanWord, Slot};
use crate::core::jamo::contains_hangul;
use crate::core::morphology::{expand_contractions, MorphologicalAnalyzer};
use crate::core::spacing::{split_edges, SpacingCorrector};
use crate::core::types::{
    Category, Direction, DictionaryEntry, Formality, GrammaticalRole, Inflection, Morpheme, MorphemeKind,
    PartOfSpeech, Sense, SpacingCorrection, TranslateOptions, TranslationResult, Warning,
};
use crate::error::{DictionaryError, InitError, TranslateError};
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Pipeline stages, in the order one call passes through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ReceiveInput,
    SpacingCorrection,
    Tokenize,
    MorphologicalAnalysis,
    ContextAnalysis,
    DictionaryResolution,
    ClauseRestructuring,
    TargetGeneration,
    Result,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ReceiveInput => "receive_input",
            Stage::SpacingCorrection => "spacing_correction",
            Stage::Tokenize => "tokenize",
            Stage::MorphologicalAnalysis => "morphological_analysis",
            Stage::ContextAnalysis => "context_analysis",
            Stage::DictionaryResolution => "dictionary_resolution",
            Stage::ClauseRestructuring => "clause_restructuring",
            Stage::TargetGeneration => "target_generation",
            Stage::Result => "result",
        };
        f.write_str(name)
    }
}

/// Per-call bookkeeping behind [`TranslationResult`].
#[derive(Debug, Default)]
struct Ledger {
    matched: Vec<DictionaryEntry>,
    warnings: Vec<Warning>,
    tokens: usize,
    resolved: usize,
    margins: Vec<f64>,
    spacing: Vec<f64>,
    typos: i32,
}

impl Ledger {
    fn hit(&mut self, entry: &DictionaryEntry, words: usize, margin: f64) {
        self.tokens += words;
        self.resolved += words;
        self.margins.push(margin);
        if !self.matched.iter().any(|e| e.headword == entry.headword) {
            self.matched.push(entry.clone());
        }
    }

    fn miss(&mut self, surface: &str) {
        self.tokens += 1;
        self.warnings.push(Warning::UnresolvedToken { surface: surface.to_string() });
    }

    fn typo(&mut self, surface: &str, corrected: &str) {
        self.typos += 1;
        self.warnings.push(Warning::TypoCorrected {
            surface: surface.to_string(),
            corrected: corrected.to_string(),
        });
    }

    /// Resolved share × (0.5 + 0.5 × mean sense margin) × mean spacing
    /// confidence, lowered by a quarter for every corrected typo.
    fn confidence(&self) -> f64 {
        let mean = |v: &[f64]| if v.is_empty() { 1.0 } else { v.iter().sum::<f64>() / v.len() as f64 };
        let coverage = if self.tokens == 0 { 1.0 } else { self.resolved as f64 / self.tokens as f64 };
        coverage * (0.5 + 0.5 * mean(&self.margins)) * mean(&self.spacing) * TYPO_PENALTY.powi(self.typos)
    }
}

const TYPO_PENALTY: f64 = 0.75;

/// Abbreviations whose period does not end a sentence.
const ABBREVIATIONS: &[&str] = &["mr", "mrs", "ms", "dr", "st", "vs", "etc", "prof", "jr", "sr"];

/// Splits on sentence punctuation and newlines, keeping the mark.
///
/// A period inside a number (3.5) or after a listed abbreviation (Dr.) stays
/// in the sentence. A run of marks (?!, ...) ends the sentence once, with its
/// last mark.
fn split_sentences(text: &str) -> Vec<(String, Option<char>)> {
    let mut sentences: Vec<(String, Option<char>)> = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = text.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if !matches!(c, '.' | '?' | '!' | '\n') {
            current.push(c);
            continue;
        }
        let next = chars.get(i + 1).copied();
        if c == '.' {
            let inside_word = next.map_or(false, |n| n.is_ascii_alphanumeric());
            let last_word = current.rsplit(char::is_whitespace).next().unwrap_or("").to_lowercase();
            if inside_word || ABBREVIATIONS.contains(&last_word.as_str()) {
                current.push(c);
                continue;
            }
        }
        if c != '\n' && next.map_or(false, |n| matches!(n, '.' | '?' | '!')) {
            continue;
        }
        let mark = (c != '\n').then_some(c);
        let sentence = current.trim();
        if !sentence.is_empty() {
            sentences.push((sentence.to_string(), mark));
        }
        current.clear();
    }
    if !current.trim().is_empty() {
        sentences.push((current.trim().to_string(), None));
    }
    sentences
}

/// Rule-based Korean ↔ English translator.
///
/// Holds only immutable state, so one instance can serve concurrent calls.
/// Conversational state lives in an [`EntityTracker`] owned by the caller.
#[derive(Debug, Clone)]
pub struct Translator {
    dict: Arc<DictionaryStore>,
    analyzer: MorphologicalAnalyzer,
    context: ContextEngine,
    config: TranslatorConfig,
}

impl Translator {
    pub fn new(dict: Arc<DictionaryStore>) -> Self {
        Self::with_config(dict, TranslatorConfig::default())
    }

    pub fn with_config(dict: Arc<DictionaryStore>, config: TranslatorConfig) -> Self {
        Self {
            dict,
            analyzer: MorphologicalAnalyzer::new(),
            context: ContextEngine::new(config.weights, config.context_window),
            config,
        }
    }

    /// Translator over the bundled partitions only.
    pub fn builtin() -> Result<Self, DictionaryError> {
        Ok(Self::new(Arc::new(DictionaryStore::builtin()?)))
    }

    pub fn dictionary(&self) -> &DictionaryStore {
        &self.dict
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    pub fn context_engine(&self) -> &ContextEngine {
        &self.context
    }

    pub fn analyzer(&self) -> &MorphologicalAnalyzer {
        &self.analyzer
    }

    /// Fresh entity window sized by the config.
    pub fn new_tracker(&self) -> EntityTracker {
        EntityTracker::new(self.config.entity_window)
    }

    fn spacing(&self) -> SpacingCorrector<'_> {
        SpacingCorrector::new(&self.dict, &self.analyzer, self.config.typo_threshold)
            .with_max_word_len(self.config.max_word_len)
    }

    pub fn correct_spacing(&self, text: &str) -> SpacingCorrection {
        self.spacing().correct_spacing_full(text)
    }

    pub fn analyze(&self, token: &str, direction: Direction) -> Vec<Morpheme> {
        self.analyzer.analyze(&self.dict, token, direction)
    }

    pub fn analyze_context(&self, clause: &str, direction: Direction) -> ContextAnalysis {
        self.context.analyze_context(&self.dict, &self.analyzer, clause, direction)
    }

    /// Best-effort translation. Warnings are dropped; only empty input fails.
    pub fn translate(&self, input: &str, direction: Direction, options: TranslateOptions) -> Result<String, TranslateError> {
        Ok(self.translate_with_diagnostics(input, direction, options)?.into_output())
    }

    pub fn translate_with_diagnostics(
        &self,
        input: &str,
        direction: Direction,
        options: TranslateOptions,
    ) -> Result<TranslationResult, TranslateError> {
        let mut tracker = self.new_tracker();
        self.translate_in_conversation(input, direction, options, &mut tracker)
    }

    /// Like [`Self::translate_with_diagnostics`], with entity history kept in
    /// `tracker` across calls so later sentences can restore elided subjects.
    pub fn translate_in_conversation(
        &self,
        input: &str,
        direction: Direction,
        options: TranslateOptions,
        tracker: &mut EntityTracker,
    ) -> Result<TranslationResult, TranslateError> {
        // 1. Receive input
        debug!(stage = %Stage::ReceiveInput, %direction, chars = input.chars().count());
        if input.trim().is_empty() {
            return Err(TranslateError::EmptyInput);
        }
        let formality = match options.formality {
            Some(formality) => formality,
            None if direction == Direction::EnKo => self
                .analyze_context(input, direction)
                .suggested_formality()
                .unwrap_or(self.config.default_formality),
            None => self.config.default_formality,
        };

        let mut ledger = Ledger::default();
        let mut history: Vec<ContextToken> = Vec::new();
        let mut outputs = Vec::new();
        for (sentence, terminal) in split_sentences(input) {
            let rendered = match direction {
                Direction::KoEn => self.korean_sentence(&sentence, terminal, tracker, &mut history, &mut ledger),
                Direction::EnKo => {
                    self.english_sentence(&sentence, terminal, formality, tracker, &mut history, &mut ledger)
                }
            };
            // Nothing rendered: pass the sentence through rather than drop it.
            outputs.push(if rendered.trim().is_empty() { sentence } else { rendered });
        }
        let output = outputs.join(" ");
        let confidence = ledger.confidence();
        debug!(stage = %Stage::Result, confidence, warnings = ledger.warnings.len());
        Ok(TranslationResult::new(output, confidence, ledger.matched, ledger.warnings))
    }

    fn context_for(&self, tokens: &[String], direction: Direction, history: &[ContextToken]) -> ContextAnalysis {
        let clause = tokens.join(" ");
        let tokens = ContextEngine::context_tokens(&self.dict, &self.analyzer, &clause, direction);
        self.context
            .analyze_tokens(&self.dict, tokens, direction)
            .with_history(history.iter().cloned())
    }

    /// Sense of `entry` chosen for the word at `position`, restricted to `slot`
    /// when any sense fits it.
    fn choose_sense(
        &self,
        entry: &DictionaryEntry,
        position: usize,
        context: &ContextAnalysis,
        slot: Slot,
        ledger: &mut Ledger,
    ) -> Sense {
        let fitting: Vec<Sense> = entry.senses.iter().filter(|s| slot.admits(s.pos)).cloned().collect();
        let senses: &[Sense] = if fitting.is_empty() { &entry.senses } else { &fitting };
        match self.context.resolve_polysemy(position, context, senses) {
            Some(choice) => {
                if choice.tied && choice.candidates.len() > 1 {
                    ledger.warnings.push(Warning::AmbiguousSense {
                        word: entry.headword.clone(),
                        chosen: choice.sense.id.clone(),
                        candidates: choice.candidates.clone(),
                    });
                }
                let margin = if senses.len() > 1 { choice.confidence } else { 1.0 };
                ledger.hit(entry, 1, margin);
                choice.sense.clone()
            }
            None => {
                ledger.hit(entry, 1, 1.0);
                entry.primary().clone()
            }
        }
    }

    // --- Korean source ---

    fn korean_sentence(
        &self,
        sentence: &str,
        terminal: Option<char>,
        tracker: &mut EntityTracker,
        history: &mut Vec<ContextToken>,
        ledger: &mut Ledger,
    ) -> String {
        // 2. Spacing correction
        debug!(stage = %Stage::SpacingCorrection);
        let spaced = self.spacing().correct_spacing_full(sentence);
        ledger.spacing.push(spaced.confidence);

        // 3. Tokenize
        let tokens: Vec<String> = spaced
            .tokens
            .iter()
            .map(|t| split_edges(t).1.to_string())
            .filter(|t| !t.is_empty())
            .collect();
        debug!(stage = %Stage::Tokenize, tokens = tokens.len());

        // 4. Context analysis
        let context = self.context_for(&tokens, Direction::KoEn, history);
        debug!(stage = %Stage::ContextAnalysis, domain = ?context.domain, situation = ?context.situation);

        // 5. Morphological analysis and dictionary resolution, idioms first.
        debug!(stage = %Stage::MorphologicalAnalysis);
        debug!(stage = %Stage::DictionaryResolution);
        let mut words = Vec::with_capacity(tokens.len());
        let mut starts = Vec::with_capacity(tokens.len());
        let mut i = 0;
        while i < tokens.len() {
            starts.push(i);
            if let Some((n, word)) = self.korean_phrase(&tokens[i..], ledger) {
                words.push(word);
                i += n;
                continue;
            }
            words.push(self.korean_word(&tokens[i], i, &context, ledger));
            i += 1;
        }
        for (at, entity) in referents(&tokens, Direction::KoEn, tracker) {
            if let Some(j) = starts.iter().position(|&s| s == at) {
                words[j].referent = Some(entity);
            }
        }
        history.extend(context.tokens);

        // 6. Restructure and generate
        debug!(stage = %Stage::ClauseRestructuring, words = words.len());
        let rendered = grammar::korean_to_english(&words, terminal, tracker);
        debug!(stage = %Stage::TargetGeneration, output = %rendered);
        rendered
    }

    /// Dictionary form used for idiom matching: predicates by lemma, the rest by surface.
    fn korean_idiom_key(&self, token: &str) -> String {
        match self.analyzer.analyze_korean(&self.dict, token).first() {
            Some(m) if m.is_predicate() => m.lemma.clone(),
            _ => token.to_string(),
        }
    }

    fn korean_phrase(&self, rest: &[String], ledger: &mut Ledger) -> Option<(usize, KoreanWord)> {
        let surfaces: Vec<&str> = rest.iter().map(String::as_str).collect();
        let (n, entry) = self.dict.lookup_phrase(&surfaces, Direction::KoEn).or_else(|| {
            let keys: Vec<String> = rest.iter().take(6).map(|t| self.korean_idiom_key(t)).collect();
            let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
            self.dict.lookup_phrase(&keys, Direction::KoEn).filter(|(n, _)| *n > 1)
        })?;
        let surface = rest[..n].join(" ");
        let sense = entry.primary();
        let gloss = Gloss::from_sense(sense, entry.category);
        ledger.hit(entry, n, 1.0);
        trace!(surface = %surface, headword = %entry.headword, "phrase matched");
        if entry.category == Category::Idiom || sense.pos == PartOfSpeech::Interjection || n == 1 {
            return Some((n, KoreanWord::idiom(&surface, &entry.headword, gloss)));
        }
        // Multi-word compound: keep the particles of its last word.
        let kind = MorphemeKind::from(sense.pos);
        let mut morphemes = vec![Morpheme::new(&entry.headword, &entry.headword, kind, GrammaticalRole::None)];
        morphemes.extend(self.analyzer.analyze_korean(&self.dict, &rest[n - 1]).into_iter().skip(1));
        Some((n, KoreanWord::new(&surface, morphemes, Some(gloss))))
    }

    fn korean_word(&self, token: &str, position: usize, context: &ContextAnalysis, ledger: &mut Ledger) -> KoreanWord {
        let mut morphemes = self.analyzer.analyze_korean(&self.dict, token);
        if morphemes.is_empty() {
            return KoreanWord::new(token, morphemes, None);
        }
        let stem = &morphemes[0];
        let mut entry = match stem.kind {
            MorphemeKind::Unknown => None,
            _ => self.dict.lookup(&stem.lemma, Direction::KoEn),
        };
        // noun + 하다 with no verb entry: act through the noun.
        let mut via_noun = None;
        if entry.is_none() && stem.is_predicate() {
            via_noun = stem
                .lemma
                .strip_suffix("하다")
                .and_then(|noun| self.dict.lookup(noun, Direction::KoEn));
        }
        // Probable typo of a headword. One syllable is too little to go on.
        if entry.is_none() && via_noun.is_none() && contains_hangul(&stem.surface) && stem.surface.chars().count() > 1 {
            if let Some(found) = self
                .dict
                .fuzzy_lookup(&stem.surface, Direction::KoEn, self.config.typo_threshold)
                .into_iter()
                .next()
            {
                let headword = &found.entry.headword;
                trace!(surface = %stem.surface, corrected = %headword, distance = found.distance, "typo corrected");
                ledger.typo(&stem.surface, headword);
                morphemes = self.reanalyze_corrected(token, &morphemes[0], found.entry);
                entry = Some(found.entry);
            }
        }
        let is_numeral = morphemes[0].kind == MorphemeKind::Numeral;
        let gloss = match (entry, via_noun) {
            (Some(entry), _) => {
                let sense = self.choose_sense(entry, position, context, Slot::Any, ledger);
                Some(Gloss::from_sense(&sense, entry.category))
            }
            (None, Some(noun)) => {
                ledger.hit(noun, 1, 1.0);
                let mut gloss = Gloss::from_sense(noun.primary(), noun.category);
                gloss.pos = PartOfSpeech::Verb;
                Some(gloss)
            }
            (None, None) if is_numeral => {
                ledger.tokens += 1;
                ledger.resolved += 1;
                None
            }
            (None, None) => {
                trace!(token, "unresolved korean token");
                ledger.miss(token);
                None
            }
        };
        KoreanWord::new(token, morphemes, gloss)
    }

    /// Morphemes of `token` with its mistyped stem replaced by `entry`'s
    /// headword, so the particles and endings after it are read again.
    fn reanalyze_corrected(&self, token: &str, stem: &Morpheme, entry: &DictionaryEntry) -> Vec<Morpheme> {
        let predicate = matches!(entry.primary().pos, PartOfSpeech::Verb | PartOfSpeech::Adjective);
        let base: &str = if predicate { entry.headword.strip_suffix('다').unwrap_or(&entry.headword) } else { &entry.headword };
        let rest = token.strip_prefix(stem.surface.as_str()).unwrap_or("");
        let morphemes = self.analyzer.analyze_korean(&self.dict, &format!("{}{}", base, rest));
        if morphemes.first().map_or(false, |m| m.lemma == entry.headword) {
            return morphemes;
        }
        let mut corrected = self.analyzer.analyze_korean(&self.dict, token);
        if let Some(first) = corrected.first_mut() {
            first.lemma = entry.headword.clone();
            first.kind = MorphemeKind::from(entry.primary().pos);
        }
        corrected
    }

    // --- English source ---

    fn english_sentence(
        &self,
        sentence: &str,
        terminal: Option<char>,
        formality: Formality,
        tracker: &mut EntityTracker,
        history: &mut Vec<ContextToken>,
        ledger: &mut Ledger,
    ) -> String {
        // 2. Tokenize (contractions expanded, commas remembered)
        let expanded = expand_contractions(sentence);
        let mut tokens: Vec<String> = Vec::new();
        let mut commas: Vec<bool> = Vec::new();
        for raw in expanded.split_whitespace() {
            let (_, core, suffix) = split_edges(raw);
            if core.is_empty() {
                if let Some(last) = commas.last_mut() {
                    *last |= raw.contains(',');
                }
                continue;
            }
            tokens.push(core.to_string());
            commas.push(suffix.contains(','));
        }
        debug!(stage = %Stage::Tokenize, tokens = tokens.len());

        // 3. Morphological analysis
        let morphemes: Vec<Morpheme> = tokens.iter().map(|t| self.analyzer.analyze_english(&self.dict, t)).collect();
        let slots = english_slots(&morphemes);
        debug!(stage = %Stage::MorphologicalAnalysis);

        // 4. Context analysis
        let context = self.context_for(&tokens, Direction::EnKo, history);
        debug!(stage = %Stage::ContextAnalysis, domain = ?context.domain, situation = ?context.situation);

        // 5. Dictionary resolution, phrases first.
        debug!(stage = %Stage::DictionaryResolution);
        let mut words: Vec<EnglishWord> = Vec::with_capacity(tokens.len());
        let mut starts = Vec::with_capacity(tokens.len());
        let mut i = 0;
        while i < tokens.len() {
            starts.push(i);
            if let Some((n, mut word)) = self.english_phrase(&tokens[i..], &morphemes[i..], ledger) {
                word.comma = commas[i + n - 1];
                words.push(word);
                i += n;
                continue;
            }
            let mut word = self.english_word(&tokens[i], morphemes[i].clone(), slots[i], i, &context, ledger);
            word.comma = commas[i];
            words.push(word);
            i += 1;
        }
        for (at, entity) in referents(&tokens, Direction::EnKo, tracker) {
            if let Some(j) = starts.iter().position(|&s| s == at) {
                words[j].referent = Some(entity);
            }
        }
        history.extend(context.tokens);

        // 6. Restructure and generate
        debug!(stage = %Stage::ClauseRestructuring, words = words.len(), ?formality);
        let rendered = grammar::english_to_korean(&words, terminal, formality, tracker);
        debug!(stage = %Stage::TargetGeneration, output = %rendered);
        rendered
    }

    fn english_phrase(&self, tokens: &[String], morphemes: &[Morpheme], ledger: &mut Ledger) -> Option<(usize, EnglishWord)> {
        let surfaces: Vec<&str> = tokens.iter().map(String::as_str).collect();
        let (n, entry) = self.dict.lookup_phrase(&surfaces, Direction::EnKo).or_else(|| {
            let lemmas: Vec<&str> = morphemes.iter().map(|m| m.lemma.as_str()).collect();
            self.dict.lookup_phrase(&lemmas, Direction::EnKo).filter(|(n, _)| *n > 1)
        })?;
        // A single listed word is only a phrase when it is an idiom (hello).
        let sense = entry.primary();
        let idiom = entry.category == Category::Idiom || sense.pos == PartOfSpeech::Interjection;
        if n == 1 && !idiom {
            return None;
        }
        let surface = tokens[..n].join(" ");
        let gloss = Gloss::from_sense(sense, entry.category);
        ledger.hit(entry, n, 1.0);
        trace!(surface = %surface, headword = %entry.headword, "phrase matched");
        // A phrasal verb inflects through its first word (looked after).
        let first = &morphemes[0];
        let mut morpheme = Morpheme::new(&surface, &entry.headword, MorphemeKind::from(sense.pos), GrammaticalRole::None);
        morpheme.inflection = first.inflection;
        morpheme.tense = first.tense;
        let mut word = EnglishWord::new(&surface, morpheme, Some(gloss));
        word.idiom = idiom;
        Some((n, word))
    }

    fn english_word(
        &self,
        surface: &str,
        mut morpheme: Morpheme,
        slot: Slot,
        position: usize,
        context: &ContextAnalysis,
        ledger: &mut Ledger,
    ) -> EnglishWord {
        let article = morpheme.kind == MorphemeKind::Determiner && matches!(morpheme.lemma.as_str(), "a" | "an" | "the");
        let personal = morpheme.kind == MorphemeKind::Pronoun && english_pronoun(&morpheme.lemma).is_some();
        if morpheme.is_function_word() || article || personal {
            ledger.tokens += 1;
            ledger.resolved += 1;
            return EnglishWord::new(surface, morpheme, None);
        }
        let mut entry = self
            .dict
            .lookup(&morpheme.lemma, Direction::EnKo)
            .or_else(|| self.dict.lookup(surface, Direction::EnKo));
        // Only words the analyzer could not place at all, long enough that
        // one slip still leaves them recognisable. Capitalised words past the
        // first are likely names.
        let name_like = position > 0 && surface.starts_with(|c: char| c.is_uppercase());
        let typo_candidate = morpheme.kind == MorphemeKind::Unknown
            && !name_like
            && surface.chars().count() >= 5
            && surface.chars().all(|c| c.is_ascii_alphabetic());
        if entry.is_none() && typo_candidate {
            if let Some(found) = self
                .dict
                .fuzzy_lookup(surface, Direction::EnKo, self.config.typo_threshold.min(1.0))
                .into_iter()
                .next()
            {
                trace!(surface, corrected = %found.entry.headword, "typo corrected");
                ledger.typo(surface, &found.entry.headword);
                morpheme.lemma = found.entry.headword.clone();
                entry = Some(found.entry);
            }
        }
        let Some(entry) = entry else {
            if morpheme.kind == MorphemeKind::Numeral || surface.chars().all(|c| c.is_ascii_digit()) {
                ledger.tokens += 1;
                ledger.resolved += 1;
            } else {
                trace!(surface, "unresolved english token");
                ledger.miss(surface);
            }
            return EnglishWord::new(surface, morpheme, None);
        };
        let sense = self.choose_sense(entry, position, context, slot, ledger);
        // The chosen sense decides between plural noun and third-person verb.
        morpheme.kind = MorphemeKind::from(sense.pos);
        morpheme.inflection = match (morpheme.inflection, sense.pos) {
            (Some(Inflection::Plural), PartOfSpeech::Verb) => Some(Inflection::ThirdPerson),
            (Some(Inflection::ThirdPerson), PartOfSpeech::Noun) => Some(Inflection::Plural),
            (other, _) => other,
        };
        EnglishWord::new(surface, morpheme, Some(Gloss::from_sense(&sense, entry.category)))
    }
}

/// Tracked entities the pronouns among `tokens` point back at, by token index.
fn referents(tokens: &[String], direction: Direction, tracker: &EntityTracker) -> Vec<(usize, Entity)> {
    detect_context_reference(&tokens.join(" "), direction)
        .iter()
        .filter_map(|r| resolve_entity_reference(tracker, r).map(|e| (r.position, e.clone())))
        .collect()
}

static SHARED: OnceCell<Translator> = OnceCell::new();

/// One-time initialization of the process-wide translator with extra
/// host-supplied entries merged over the bundled partitions. Must run before
/// the first [`shared`] call.
pub fn inject_dictionary_data(entries: Vec<DictionaryEntry>) -> Result<InjectionReport, InitError> {
    init_shared(TranslatorConfig::default(), entries)
}

pub fn init_shared(config: TranslatorConfig, entries: Vec<DictionaryEntry>) -> Result<InjectionReport, InitError> {
    if SHARED.get().is_some() {
        return Err(InitError::AlreadyInitialized);
    }
    let mut builder = DictionaryStore::builder().with_builtin()?;
    let report = builder.inject(entries)?;
    let translator = Translator::with_config(Arc::new(builder.build()), config);
    SHARED.set(translator).map_err(|_| InitError::AlreadyInitialized)?;
    info!(?report, "shared translator initialized");
    Ok(report)
}

/// The process-wide translator, built from the bundled partitions on first
/// access if nothing initialized it explicitly.
pub fn shared() -> Result<&'static Translator, InitError> {
    Ok(SHARED.get_or_try_init(Translator::builtin)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translator() -> Translator {
        Translator::builtin().unwrap()
    }

    #[test]
    fn splits_sentences_keeping_marks() {
        let s = split_sentences("나는 갔다. 너는? \n 좋아");
        assert_eq!(
            s,
            vec![
                ("나는 갔다".to_string(), Some('.')),
                ("너는".to_string(), Some('?')),
                ("좋아".to_string(), None),
            ]
        );
    }

    #[test]
    fn periods_inside_numbers_and_titles_do_not_split() {
        assert_eq!(split_sentences("It costs 3.5 dollars."), vec![("It costs 3.5 dollars".to_string(), Some('.'))]);
        assert_eq!(split_sentences("Dr. Kim came. Really?!"), vec![
            ("Dr. Kim came".to_string(), Some('.')),
            ("Really".to_string(), Some('!')),
        ]);
        assert_eq!(split_sentences("그래서..."), vec![("그래서".to_string(), Some('.'))]);
    }

    #[test]
    fn typo_correction_is_reported_and_costs_confidence() {
        let t = translator();
        let clean = t.translate_with_diagnostics("학교에 갔다", Direction::KoEn, TranslateOptions::default()).unwrap();
        let typo = t.translate_with_diagnostics("학꾜에 갔다", Direction::KoEn, TranslateOptions::default()).unwrap();
        assert!(typo.output().contains("school"), "{}", typo.output());
        assert!(!typo.output().contains('에'), "{}", typo.output());
        assert!(typo
            .warnings()
            .iter()
            .any(|w| matches!(w, Warning::TypoCorrected { corrected, .. } if corrected == "학교")));
        assert!(typo.confidence() < clean.confidence());
    }

    #[test]
    fn short_or_known_english_words_are_not_typos() {
        let t = translator();
        // "cat" is too short to correct; "rains" is a known inflection.
        let result = t.translate_with_diagnostics("The cet sleeps", Direction::EnKo, TranslateOptions::default()).unwrap();
        assert!(!result.warnings().iter().any(|w| matches!(w, Warning::TypoCorrected { .. })));
        let result = t.translate_with_diagnostics("I like cofee", Direction::EnKo, TranslateOptions::default()).unwrap();
        assert!(result.output().contains("커피"), "{}", result.output());
    }

    #[test]
    fn pronouns_take_their_referent_from_the_conversation() {
        let t = translator();
        let mut tracker = t.new_tracker();
        let opts = TranslateOptions::with_formality(Formality::Neutral);
        t.translate_in_conversation("I bought an apple.", Direction::EnKo, opts, &mut tracker).unwrap();
        let next = t.translate_in_conversation("It was delicious.", Direction::EnKo, opts, &mut tracker).unwrap();
        assert!(next.output().contains("사과"), "{}", next.output());
    }

    #[test]
    fn empty_input_is_rejected() {
        let t = translator();
        assert_eq!(t.translate("   ", Direction::KoEn, TranslateOptions::default()), Err(TranslateError::EmptyInput));
    }

    #[test]
    fn unknown_words_pass_through_with_warning() {
        let t = translator();
        let result = t
            .translate_with_diagnostics("나는 뷁을 먹었다", Direction::KoEn, TranslateOptions::default())
            .unwrap();
        assert!(result.output().contains("뷁"), "{}", result.output());
        assert!(result
            .warnings()
            .iter()
            .any(|w| matches!(w, Warning::UnresolvedToken { surface } if surface.contains("뷁"))));
        assert!(result.confidence() < 1.0);
    }

    #[test]
    fn polysemy_follows_context() {
        let t = translator();
        let tea = t.translate("차를 마시다", Direction::KoEn, TranslateOptions::default()).unwrap();
        let car = t.translate("차를 운전하다", Direction::KoEn, TranslateOptions::default()).unwrap();
        assert!(tea.contains("tea"), "{}", tea);
        assert!(car.contains("car"), "{}", car);
    }

    #[test]
    fn conversation_restores_subject() {
        let t = translator();
        let mut tracker = t.new_tracker();
        let opts = TranslateOptions::default();
        t.translate_in_conversation("그녀는 학교에 갔다.", Direction::KoEn, opts, &mut tracker).unwrap();
        let next = t.translate_in_conversation("밥을 먹었다.", Direction::KoEn, opts, &mut tracker).unwrap();
        assert!(next.output().starts_with("She"), "{}", next.output());
    }

    #[test]
    fn matched_entries_are_reported() {
        let t = translator();
        let result = t
            .translate_with_diagnostics("I drink water", Direction::EnKo, TranslateOptions::default())
            .unwrap();
        assert!(result.matched_entries().iter().any(|e| e.headword == "water"));
        assert!(contains_hangul(result.output()));
    }
}
