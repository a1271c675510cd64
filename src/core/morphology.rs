// File: src/core/morphology.rs
//! Morphological analysis.
//!
//! Korean tokens (eojeol) are split into one stem plus particles or endings by
//! walking two suffix tries from the end of the word. English tokens are reduced
//! to a lemma plus at most one inflection. Both analyzers validate candidate
//! stems against the dictionary and never fail: an unknown token comes back as
//! a single [`MorphemeKind::Unknown`] morpheme.
//!
//! The inverse operations used by generation (Korean conjugation, English
//! inflection) live here as well so that both directions share one table of
//! irregular forms.

use crate::core::dictionary::{parse_english_pronoun, DictionaryStore};
use crate::core::jamo::{self, decompose, final_coda, replace_last, Syllable};
use crate::core::trie::SuffixTrie;
use crate::core::types::{
    Connective, Direction, GrammaticalRole, Inflection, Morpheme, MorphemeKind, PartOfSpeech, Tense,
};
use std::collections::HashMap;
use tracing::trace;

/// Maximum number of nested strip steps for one Korean token.
const MAX_STRIP_DEPTH: usize = 6;

/// Phonological condition on the syllable an affix attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum After {
    Any,
    Consonant,
    Vowel,
    /// Vowel-final or ending in ㄹ (`로`).
    VowelOrRieul,
    /// Consonant-final other than ㄹ (`으로`).
    ConsonantNotRieul,
}

impl After {
    fn admits(self, stem: &str) -> bool {
        let coda = final_coda(stem);
        match self {
            After::Any => true,
            After::Consonant => coda.is_some(),
            After::Vowel => coda.is_none(),
            After::VowelOrRieul => coda.is_none() || coda == Some('ㄹ'),
            After::ConsonantNotRieul => coda.is_some() && coda != Some('ㄹ'),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Affix {
    kind: MorphemeKind,
    role: GrammaticalRole,
    tense: Option<Tense>,
    after: After,
}

const fn particle(role: GrammaticalRole, after: After) -> Affix {
    Affix { kind: MorphemeKind::Particle, role, tense: None, after }
}

const fn copula(tense: Option<Tense>, after: After) -> Affix {
    Affix { kind: MorphemeKind::Ending, role: GrammaticalRole::Copula, tense, after }
}

const fn ending(role: GrammaticalRole, tense: Option<Tense>) -> Affix {
    Affix { kind: MorphemeKind::Ending, role, tense, after: After::Any }
}

use GrammaticalRole as R;

/// Case particles and the copula, attached to nominals.
const KOREAN_PARTICLES: &[(&str, Affix)] = &[
    ("이", particle(R::Subject, After::Consonant)),
    ("가", particle(R::Subject, After::Vowel)),
    ("은", particle(R::Topic, After::Consonant)),
    ("는", particle(R::Topic, After::Vowel)),
    ("을", particle(R::Object, After::Consonant)),
    ("를", particle(R::Object, After::Vowel)),
    ("의", particle(R::Possessive, After::Any)),
    ("에", particle(R::Locative, After::Any)),
    ("에서", particle(R::Source, After::Any)),
    ("로", particle(R::Directional, After::VowelOrRieul)),
    ("으로", particle(R::Directional, After::ConsonantNotRieul)),
    ("와", particle(R::Comitative, After::Vowel)),
    ("과", particle(R::Comitative, After::Consonant)),
    ("랑", particle(R::Comitative, After::Vowel)),
    ("이랑", particle(R::Comitative, After::Consonant)),
    ("하고", particle(R::Comitative, After::Any)),
    ("에게", particle(R::Dative, After::Any)),
    ("한테", particle(R::Dative, After::Any)),
    ("께", particle(R::Dative, After::Any)),
    ("도", particle(R::Additive, After::Any)),
    ("만", particle(R::Restrictive, After::Any)),
    ("까지", particle(R::Limit, After::Any)),
    ("부터", particle(R::Origin, After::Any)),
    ("보다", particle(R::Comparative, After::Any)),
    ("처럼", particle(R::Similative, After::Any)),
    ("마다", particle(R::Distributive, After::Any)),
    ("이다", copula(None, After::Consonant)),
    ("입니다", copula(None, After::Any)),
    ("입니까", copula(None, After::Any)),
    ("이에요", copula(None, After::Consonant)),
    ("예요", copula(None, After::Vowel)),
    ("이야", copula(None, After::Consonant)),
    ("이었다", copula(Some(Tense::Past), After::Consonant)),
    ("였다", copula(Some(Tense::Past), After::Vowel)),
    ("이었어요", copula(Some(Tense::Past), After::Consonant)),
    ("였어요", copula(Some(Tense::Past), After::Vowel)),
    ("이었습니다", copula(Some(Tense::Past), After::Consonant)),
    ("였습니다", copula(Some(Tense::Past), After::Vowel)),
];

/// Verbal endings, attached to predicate stems.
const KOREAN_ENDINGS: &[(&str, Affix)] = &[
    ("다", ending(R::Final, None)),
    ("요", ending(R::Final, None)),
    ("어요", ending(R::Final, None)),
    ("아요", ending(R::Final, None)),
    ("어", ending(R::Final, None)),
    ("아", ending(R::Final, None)),
    ("습니다", ending(R::Final, None)),
    ("니다", ending(R::Final, None)),
    ("습니까", ending(R::Final, None)),
    ("는다", ending(R::Final, None)),
    ("니", ending(R::Final, None)),
    ("냐", ending(R::Final, None)),
    ("세요", ending(R::Final, None)),
    ("으세요", ending(R::Final, None)),
    ("십시오", ending(R::Final, None)),
    ("으십시오", ending(R::Final, None)),
    ("어라", ending(R::Final, None)),
    ("아라", ending(R::Final, None)),
    ("지", ending(R::Final, None)),
    ("고", ending(R::Connective(Connective::And), None)),
    ("서", ending(R::Connective(Connective::So), None)),
    ("아서", ending(R::Connective(Connective::So), None)),
    ("어서", ending(R::Connective(Connective::So), None)),
    ("지만", ending(R::Connective(Connective::But), None)),
    ("는데", ending(R::Connective(Connective::But), None)),
    ("은데", ending(R::Connective(Connective::But), None)),
    ("면", ending(R::Connective(Connective::If), None)),
    ("으면", ending(R::Connective(Connective::If), None)),
    ("니까", ending(R::Connective(Connective::Because), None)),
    ("으니까", ending(R::Connective(Connective::Because), None)),
    ("는", ending(R::Modifier, None)),
    ("은", ending(R::Modifier, None)),
    ("을", ending(R::Modifier, Some(Tense::Future))),
    ("었", ending(R::Tense, Some(Tense::Past))),
    ("았", ending(R::Tense, Some(Tense::Past))),
    ("였", ending(R::Tense, Some(Tense::Past))),
    ("겠", ending(R::Tense, Some(Tense::Future))),
];

/// Korean stems whose conjugation deviates from the regular rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Irregular {
    /// ㄷ becomes ㄹ before a vowel (듣다 → 들어).
    Digeut,
    /// ㅂ becomes 우/오 before a vowel (춥다 → 추워, 돕다 → 도와).
    Bieup,
    /// ㅅ drops before a vowel (짓다 → 지어).
    Siot,
    /// ㅎ drops and the vowel fronts (하얗다 → 하얘).
    Hieut,
    /// 르 doubles its ㄹ (모르다 → 몰라).
    Reu,
}

pub const IRREGULAR_STEMS: &[(&str, Irregular)] = &[
    ("듣", Irregular::Digeut),
    ("걷", Irregular::Digeut),
    ("돕", Irregular::Bieup),
    ("춥", Irregular::Bieup),
    ("덥", Irregular::Bieup),
    ("고맙", Irregular::Bieup),
    ("어렵", Irregular::Bieup),
    ("쉽", Irregular::Bieup),
    ("맵", Irregular::Bieup),
    ("새롭", Irregular::Bieup),
    ("굽", Irregular::Bieup),
    ("줍", Irregular::Bieup),
    ("짓", Irregular::Siot),
    ("낫", Irregular::Siot),
    ("하얗", Irregular::Hieut),
    ("빨갛", Irregular::Hieut),
    ("노랗", Irregular::Hieut),
    ("파랗", Irregular::Hieut),
    ("까맣", Irregular::Hieut),
    ("그렇", Irregular::Hieut),
    ("이렇", Irregular::Hieut),
    ("저렇", Irregular::Hieut),
    ("모르", Irregular::Reu),
    ("부르", Irregular::Reu),
    ("빠르", Irregular::Reu),
];

pub fn irregular_class(stem: &str) -> Option<Irregular> {
    IRREGULAR_STEMS
        .iter()
        .find(|(s, _)| *s == stem)
        .map(|&(_, class)| class)
}

fn last_syllable(word: &str) -> Option<Syllable> {
    word.chars().last().and_then(|c| decompose(c).ok())
}

fn bright_stem(stem: &str) -> bool {
    last_syllable(stem).map(|s| s.is_bright()).unwrap_or(false)
}

/// Appends a syllable built from `onset`-less jamo to `word`: `ㅇ` + nucleus.
fn push_vowel_syllable(word: &str, nucleus: char) -> String {
    match jamo::compose('ㅇ', nucleus, None) {
        Ok(c) => format!("{}{}", word, c),
        Err(_) => word.to_string(),
    }
}

fn with_last(word: &str, f: impl FnOnce(Syllable) -> Syllable) -> Option<String> {
    let last = last_syllable(word)?;
    replace_last(word, f(last)).ok()
}

/// The 아/어 ("infinitive") form of a Korean stem, with contraction and
/// irregular alternations applied: 가 → 가, 먹 → 먹어, 하 → 해, 마시 → 마셔,
/// 오 → 와, 쓰 → 써, 모르 → 몰라, 춥 → 추워.
pub fn infinitive(stem: &str) -> String {
    let Some(last) = last_syllable(stem) else {
        return format!("{}어", stem);
    };
    let head: String = {
        let mut chars: Vec<char> = stem.chars().collect();
        chars.pop();
        chars.into_iter().collect()
    };
    if stem.ends_with('하') {
        return format!("{}해", head);
    }
    match irregular_class(stem) {
        Some(Irregular::Digeut) => {
            let base = with_last(stem, |s| s.with_coda(Some('ㄹ'))).unwrap_or_else(|| stem.to_string());
            return push_vowel_syllable(&base, if last.is_bright() { 'ㅏ' } else { 'ㅓ' });
        }
        Some(Irregular::Bieup) => {
            let base = with_last(stem, |s| s.with_coda(None)).unwrap_or_else(|| stem.to_string());
            // 돕다/곱다 keep the bright vowel.
            let nucleus = if stem == "돕" { 'ㅘ' } else { 'ㅝ' };
            return push_vowel_syllable(&base, nucleus);
        }
        Some(Irregular::Siot) => {
            let base = with_last(stem, |s| s.with_coda(None)).unwrap_or_else(|| stem.to_string());
            return push_vowel_syllable(&base, if last.is_bright() { 'ㅏ' } else { 'ㅓ' });
        }
        Some(Irregular::Hieut) => {
            // 하얗 → 하얘, 그렇 → 그래, 허옇 → 허예
            let nucleus = match last.nucleus {
                'ㅑ' => 'ㅒ',
                'ㅕ' => 'ㅖ',
                _ => 'ㅐ',
            };
            return with_last(stem, |s| s.with_coda(None).with_nucleus(nucleus))
                .unwrap_or_else(|| format!("{}어", stem));
        }
        Some(Irregular::Reu) => {
            // 모르 → 몰라: the preceding syllable takes ㄹ, 르 becomes 라/러.
            let prev_bright = bright_stem(&head);
            let Some(doubled) = with_last(&head, |s| s.with_coda(Some('ㄹ'))) else {
                return format!("{}러", stem);
            };
            return format!("{}{}", doubled, if prev_bright { '라' } else { '러' });
        }
        None => {}
    }
    if last.coda.is_some() {
        return format!("{}{}", stem, if last.is_bright() { '아' } else { '어' });
    }
    let contracted = match last.nucleus {
        'ㅏ' | 'ㅓ' | 'ㅐ' | 'ㅔ' | 'ㅕ' => Some(last),
        'ㅗ' => Some(last.with_nucleus('ㅘ')),
        'ㅜ' => Some(last.with_nucleus('ㅝ')),
        'ㅣ' => Some(last.with_nucleus('ㅕ')),
        'ㅚ' => Some(last.with_nucleus('ㅙ')),
        'ㅡ' => {
            let nucleus = if bright_stem(&head) { 'ㅏ' } else { 'ㅓ' };
            Some(last.with_nucleus(nucleus))
        }
        _ => None,
    };
    match contracted.and_then(|s| replace_last(stem, s).ok()) {
        Some(form) => form,
        None => push_vowel_syllable(stem, if last.is_bright() { 'ㅏ' } else { 'ㅓ' }),
    }
}

/// Past stem: the infinitive with ㅆ fused in (가 → 갔, 먹 → 먹었, 하 → 했).
pub fn past_stem(stem: &str) -> String {
    let inf = infinitive(stem);
    with_last(&inf, |s| s.with_coda(Some('ㅆ'))).unwrap_or_else(|| format!("{}었", stem))
}

/// Fuses a consonant (ㄴ, ㄹ, ㅂ) onto a vowel-final stem, or inserts the
/// linking syllable `으`/`스` after a consonant-final one.
///
/// `linker` is the syllable used after consonants: `은`/`을` for modifiers,
/// `습` for the formal ending.
fn attach_consonant(stem: &str, consonant: char, linker: &str) -> String {
    let Some(last) = last_syllable(stem) else {
        return format!("{}{}", stem, linker);
    };
    match irregular_class(stem) {
        Some(Irregular::Bieup) if linker != "습" => {
            // 춥 + ㄴ → 추운
            let base = with_last(stem, |s| s.with_coda(None)).unwrap_or_else(|| stem.to_string());
            return match jamo::compose('ㅇ', 'ㅜ', Some(consonant)) {
                Ok(c) => format!("{}{}", base, c),
                Err(_) => format!("{}{}", stem, linker),
            };
        }
        Some(Irregular::Digeut) if linker != "습" => {
            let base = with_last(stem, |s| s.with_coda(Some('ㄹ'))).unwrap_or_else(|| stem.to_string());
            return format!("{}{}", base, linker);
        }
        Some(Irregular::Siot) if linker != "습" => {
            let base = with_last(stem, |s| s.with_coda(None)).unwrap_or_else(|| stem.to_string());
            return format!("{}{}", base, linker);
        }
        Some(Irregular::Hieut) if linker != "습" => {
            return with_last(stem, |s| s.with_coda(Some(consonant))).unwrap_or_else(|| format!("{}{}", stem, linker));
        }
        _ => {}
    }
    match last.coda {
        None => with_last(stem, |s| s.with_coda(Some(consonant))).unwrap_or_else(|| format!("{}{}", stem, linker)),
        // ㄹ-final stems drop ㄹ before ㄴ/ㅂ and absorb ㄹ.
        Some('ㄹ') if consonant == 'ㄹ' => stem.to_string(),
        Some('ㄹ') => with_last(stem, |s| s.with_coda(Some(consonant))).unwrap_or_else(|| format!("{}{}", stem, linker)),
        Some(_) => format!("{}{}", stem, linker),
    }
}

/// 합쇼체 present: 갑니다, 먹습니다, 만듭니다.
pub fn formal_present(stem: &str) -> String {
    match final_coda(stem) {
        Some(c) if c != 'ㄹ' => format!("{}습니다", stem),
        _ => format!("{}니다", attach_consonant(stem, 'ㅂ', "습")),
    }
}

/// 해라체 present of a verb: 간다, 먹는다, 만든다.
pub fn plain_present(stem: &str) -> String {
    match final_coda(stem) {
        Some(c) if c != 'ㄹ' => format!("{}는다", stem),
        _ => format!("{}다", attach_consonant(stem, 'ㄴ', "는")),
    }
}

/// Adnominal form: `ㄴ/은` for adjectives (and completed actions), `는` for
/// ongoing actions, `ㄹ/을` for prospective ones.
pub fn modifier_form(stem: &str, kind: MorphemeKind, tense: Tense) -> String {
    match tense {
        Tense::Future => attach_consonant(stem, 'ㄹ', "을"),
        Tense::Present if kind == MorphemeKind::Verb || stem.ends_with("있") || stem.ends_with("없") => {
            match final_coda(stem) {
                Some('ㄹ') => format!("{}는", with_last(stem, |s| s.with_coda(None)).unwrap_or_else(|| stem.to_string())),
                _ => format!("{}는", stem),
            }
        }
        _ => attach_consonant(stem, 'ㄴ', "은"),
    }
}

/// Appends `ending` to the infinitive-based past stem (`갔` + `습니다`).
pub fn past_with(stem: &str, ending: &str) -> String {
    format!("{}{}", past_stem(stem), ending)
}

/// The 으-linked form used before `세요`/`면`: 가 → 가, 읽 → 읽으, 만들 → 만들.
pub fn eu_linked(stem: &str) -> String {
    match final_coda(stem) {
        Some(c) if c != 'ㄹ' => match irregular_class(stem) {
            Some(Irregular::Bieup) => {
                let base = with_last(stem, |s| s.with_coda(None)).unwrap_or_else(|| stem.to_string());
                format!("{}우", base)
            }
            Some(Irregular::Digeut) => {
                let base = with_last(stem, |s| s.with_coda(Some('ㄹ'))).unwrap_or_else(|| stem.to_string());
                format!("{}으", base)
            }
            _ => format!("{}으", stem),
        },
        Some(_) => with_last(stem, |s| s.with_coda(None)).unwrap_or_else(|| stem.to_string()),
        None => stem.to_string(),
    }
}

// --- English tables ---

/// (form, lemma, inflection)
const ENGLISH_IRREGULARS: &[(&str, &str, Inflection)] = &[
    ("went", "go", Inflection::Past),
    ("gone", "go", Inflection::PastParticiple),
    ("ate", "eat", Inflection::Past),
    ("eaten", "eat", Inflection::PastParticiple),
    ("saw", "see", Inflection::Past),
    ("seen", "see", Inflection::PastParticiple),
    ("did", "do", Inflection::Past),
    ("done", "do", Inflection::PastParticiple),
    ("had", "have", Inflection::Past),
    ("made", "make", Inflection::Past),
    ("came", "come", Inflection::Past),
    ("took", "take", Inflection::Past),
    ("taken", "take", Inflection::PastParticiple),
    ("gave", "give", Inflection::Past),
    ("given", "give", Inflection::PastParticiple),
    ("bought", "buy", Inflection::Past),
    ("sold", "sell", Inflection::Past),
    ("met", "meet", Inflection::Past),
    ("wrote", "write", Inflection::Past),
    ("written", "write", Inflection::PastParticiple),
    ("drank", "drink", Inflection::Past),
    ("drunk", "drink", Inflection::PastParticiple),
    ("slept", "sleep", Inflection::Past),
    ("knew", "know", Inflection::Past),
    ("known", "know", Inflection::PastParticiple),
    ("thought", "think", Inflection::Past),
    ("taught", "teach", Inflection::Past),
    ("found", "find", Inflection::Past),
    ("left", "leave", Inflection::Past),
    ("ran", "run", Inflection::Past),
    ("sat", "sit", Inflection::Past),
    ("stood", "stand", Inflection::Past),
    ("felt", "feel", Inflection::Past),
    ("heard", "hear", Inflection::Past),
    ("said", "say", Inflection::Past),
    ("told", "tell", Inflection::Past),
    ("got", "get", Inflection::Past),
    ("spoke", "speak", Inflection::Past),
    ("lost", "lose", Inflection::Past),
    ("won", "win", Inflection::Past),
    ("built", "build", Inflection::Past),
    ("sent", "send", Inflection::Past),
    ("began", "begin", Inflection::Past),
    ("wore", "wear", Inflection::Past),
    ("became", "become", Inflection::Past),
    ("understood", "understand", Inflection::Past),
    ("swam", "swim", Inflection::Past),
    ("read", "read", Inflection::Past),
    ("rode", "ride", Inflection::Past),
    ("ridden", "ride", Inflection::PastParticiple),
    ("drove", "drive", Inflection::Past),
    ("driven", "drive", Inflection::PastParticiple),
    ("flew", "fly", Inflection::Past),
    ("flown", "fly", Inflection::PastParticiple),
    ("hurt", "hurt", Inflection::Past),
    ("fell", "fall", Inflection::Past),
    ("fallen", "fall", Inflection::PastParticiple),
    ("broke", "break", Inflection::Past),
    ("broken", "break", Inflection::PastParticiple),
    ("chose", "choose", Inflection::Past),
    ("chosen", "choose", Inflection::PastParticiple),
    ("forgot", "forget", Inflection::Past),
    ("forgotten", "forget", Inflection::PastParticiple),
    ("got", "get", Inflection::PastParticiple),
    ("sang", "sing", Inflection::Past),
    ("threw", "throw", Inflection::Past),
    ("grew", "grow", Inflection::Past),
    ("drew", "draw", Inflection::Past),
    ("blew", "blow", Inflection::Past),
    ("woke", "wake", Inflection::Past),
    ("rose", "rise", Inflection::Past),
    ("hid", "hide", Inflection::Past),
    ("bit", "bite", Inflection::Past),
    ("caught", "catch", Inflection::Past),
    ("brought", "bring", Inflection::Past),
    ("fought", "fight", Inflection::Past),
    ("kept", "keep", Inflection::Past),
    ("paid", "pay", Inflection::Past),
    ("put", "put", Inflection::Past),
    ("cut", "cut", Inflection::Past),
    ("hit", "hit", Inflection::Past),
    ("let", "let", Inflection::Past),
    ("shut", "shut", Inflection::Past),
    ("spent", "spend", Inflection::Past),
    ("lent", "lend", Inflection::Past),
    ("held", "hold", Inflection::Past),
    ("led", "lead", Inflection::Past),
    ("fed", "feed", Inflection::Past),
    ("meant", "mean", Inflection::Past),
    ("shown", "show", Inflection::PastParticiple),
    ("children", "child", Inflection::Plural),
    ("men", "man", Inflection::Plural),
    ("women", "woman", Inflection::Plural),
    ("people", "person", Inflection::Plural),
    ("feet", "foot", Inflection::Plural),
    ("teeth", "tooth", Inflection::Plural),
    ("mice", "mouse", Inflection::Plural),
    ("better", "good", Inflection::Comparative),
    ("best", "good", Inflection::Superlative),
    ("worse", "bad", Inflection::Comparative),
    ("worst", "bad", Inflection::Superlative),
];

/// Closed-class English words: (form, lemma, kind, role, tense).
const ENGLISH_FUNCTION_WORDS: &[(&str, &str, MorphemeKind, GrammaticalRole, Option<Tense>)] = &[
    ("a", "a", MorphemeKind::Determiner, R::None, None),
    ("an", "a", MorphemeKind::Determiner, R::None, None),
    ("the", "the", MorphemeKind::Determiner, R::None, None),
    ("am", "be", MorphemeKind::Auxiliary, R::None, Some(Tense::Present)),
    ("is", "be", MorphemeKind::Auxiliary, R::None, Some(Tense::Present)),
    ("are", "be", MorphemeKind::Auxiliary, R::None, Some(Tense::Present)),
    ("be", "be", MorphemeKind::Auxiliary, R::None, None),
    ("was", "be", MorphemeKind::Auxiliary, R::None, Some(Tense::Past)),
    ("were", "be", MorphemeKind::Auxiliary, R::None, Some(Tense::Past)),
    ("been", "be", MorphemeKind::Auxiliary, R::None, Some(Tense::Past)),
    ("do", "do", MorphemeKind::Auxiliary, R::None, Some(Tense::Present)),
    ("does", "do", MorphemeKind::Auxiliary, R::None, Some(Tense::Present)),
    ("did", "do", MorphemeKind::Auxiliary, R::None, Some(Tense::Past)),
    ("will", "will", MorphemeKind::Auxiliary, R::None, Some(Tense::Future)),
    ("would", "will", MorphemeKind::Auxiliary, R::None, Some(Tense::Past)),
    ("can", "can", MorphemeKind::Auxiliary, R::None, Some(Tense::Present)),
    ("could", "can", MorphemeKind::Auxiliary, R::None, Some(Tense::Past)),
    ("not", "not", MorphemeKind::Auxiliary, R::None, None),
    ("have", "have", MorphemeKind::Auxiliary, R::None, Some(Tense::Present)),
    ("has", "have", MorphemeKind::Auxiliary, R::None, Some(Tense::Present)),
    ("had", "have", MorphemeKind::Auxiliary, R::None, Some(Tense::Past)),
    ("to", "to", MorphemeKind::Preposition, R::Directional, None),
    ("into", "to", MorphemeKind::Preposition, R::Directional, None),
    ("at", "at", MorphemeKind::Preposition, R::Locative, None),
    ("in", "in", MorphemeKind::Preposition, R::Locative, None),
    ("on", "on", MorphemeKind::Preposition, R::Locative, None),
    ("from", "from", MorphemeKind::Preposition, R::Source, None),
    ("with", "with", MorphemeKind::Preposition, R::Comitative, None),
    ("by", "by", MorphemeKind::Preposition, R::Instrumental, None),
    ("for", "for", MorphemeKind::Preposition, R::Dative, None),
    ("of", "of", MorphemeKind::Preposition, R::Possessive, None),
    ("than", "than", MorphemeKind::Preposition, R::Comparative, None),
    ("until", "until", MorphemeKind::Preposition, R::Limit, None),
    ("and", "and", MorphemeKind::Conjunction, R::Connective(Connective::And), None),
    ("so", "so", MorphemeKind::Conjunction, R::Connective(Connective::So), None),
    ("but", "but", MorphemeKind::Conjunction, R::Connective(Connective::But), None),
    ("if", "if", MorphemeKind::Conjunction, R::Connective(Connective::If), None),
    ("because", "because", MorphemeKind::Conjunction, R::Connective(Connective::Because), None),
];

#[derive(Debug, Clone, Copy)]
enum Restore {
    /// Nothing to add back (walk+ed).
    Plain,
    /// Restore a final e (lik+ed).
    E,
    /// Undouble the final consonant (stopp+ed).
    Undouble,
    /// Replace with y (stud+ied).
    Y,
}

#[derive(Debug, Clone)]
struct SuffixRule {
    /// `None` for -s, whose reading (plural or 3rd person) depends on the lemma.
    inflection: Option<Inflection>,
    restores: &'static [Restore],
}

const ENGLISH_SUFFIXES: &[(&str, Option<Inflection>, &[Restore])] = &[
    ("'s", Some(Inflection::Possessive), &[Restore::Plain]),
    ("s", None, &[Restore::Plain]),
    ("es", None, &[Restore::Plain, Restore::E]),
    ("ies", None, &[Restore::Y]),
    ("ed", Some(Inflection::Past), &[Restore::Plain, Restore::E, Restore::Undouble]),
    ("ied", Some(Inflection::Past), &[Restore::Y]),
    ("ing", Some(Inflection::Progressive), &[Restore::Plain, Restore::E, Restore::Undouble]),
    ("er", Some(Inflection::Comparative), &[Restore::Plain, Restore::E, Restore::Undouble]),
    ("ier", Some(Inflection::Comparative), &[Restore::Y]),
    ("est", Some(Inflection::Superlative), &[Restore::Plain, Restore::E, Restore::Undouble]),
    ("iest", Some(Inflection::Superlative), &[Restore::Y]),
];

fn restore(base: &str, how: Restore) -> Option<String> {
    match how {
        Restore::Plain => Some(base.to_string()),
        Restore::E => Some(format!("{}e", base)),
        Restore::Y => Some(format!("{}y", base)),
        Restore::Undouble => {
            let mut chars = base.chars().rev();
            let (a, b) = (chars.next()?, chars.next()?);
            (a == b && !"aeiou".contains(a)).then(|| base[..base.len() - a.len_utf8()].to_string())
        }
    }
}

/// Splits words into morphemes for both languages. Built once, shared by all calls.
#[derive(Debug, Clone)]
pub struct MorphologicalAnalyzer {
    particles: SuffixTrie<Affix>,
    endings: SuffixTrie<Affix>,
    english_suffixes: SuffixTrie<SuffixRule>,
    /// Alternate stem shapes of irregular predicates (들 → 듣, 추워 → 춥).
    irregular_variants: HashMap<String, String>,
}

impl Default for MorphologicalAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl MorphologicalAnalyzer {
    pub fn new() -> Self {
        let mut particles = SuffixTrie::new();
        for (suffix, affix) in KOREAN_PARTICLES {
            particles.insert(suffix, *affix);
        }
        let mut endings = SuffixTrie::new();
        for (suffix, affix) in KOREAN_ENDINGS {
            endings.insert(suffix, *affix);
        }
        let mut english_suffixes = SuffixTrie::new();
        for (suffix, inflection, restores) in ENGLISH_SUFFIXES {
            english_suffixes.insert(suffix, SuffixRule { inflection: *inflection, restores });
        }
        let mut irregular_variants = HashMap::new();
        for (stem, _) in IRREGULAR_STEMS {
            for variant in irregular_variants_of(stem) {
                irregular_variants.entry(variant).or_insert_with(|| stem.to_string());
            }
        }
        Self { particles, endings, english_suffixes, irregular_variants }
    }

    /// Analyzes one token in the given source language.
    pub fn analyze(&self, dict: &DictionaryStore, token: &str, direction: Direction) -> Vec<Morpheme> {
        match direction {
            Direction::KoEn => self.analyze_korean(dict, token),
            Direction::EnKo => vec![self.analyze_english(dict, token)],
        }
    }

    /// Splits a Korean word into its stem and attached particles or endings.
    ///
    /// Order: whole-word headword, nominal + particles, predicate + endings,
    /// unknown stem + particle, and finally a single unknown morpheme.
    pub fn analyze_korean(&self, dict: &DictionaryStore, token: &str) -> Vec<Morpheme> {
        let token = token.trim();
        if token.is_empty() {
            return Vec::new();
        }
        if !jamo::contains_hangul(token) {
            let kind = if token.chars().all(|c| c.is_ascii_digit()) {
                MorphemeKind::Numeral
            } else {
                MorphemeKind::Unknown
            };
            return vec![Morpheme::new(token, token, kind, GrammaticalRole::None)];
        }

        // 1. The whole token is a headword.
        if let Some(entry) = dict.lookup(token, Direction::KoEn) {
            let kind = MorphemeKind::from(entry.primary().pos);
            let role = if matches!(kind, MorphemeKind::Verb | MorphemeKind::Adjective) {
                GrammaticalRole::Predicate
            } else {
                GrammaticalRole::None
            };
            return vec![Morpheme::new(token, token, kind, role)];
        }

        // 2. Nominal followed by particles (or the copula).
        if let Some((stem, mut affixes)) = self.strip_particles(dict, token, 2) {
            let kind = nominal_kind(dict, &stem).unwrap_or(MorphemeKind::Noun);
            let tense = affixes.iter().find_map(|m| m.tense);
            let mut head = Morpheme::new(&stem, &stem, kind, GrammaticalRole::None);
            head.tense = tense;
            affixes.insert(0, head);
            trace!(token, stem = %stem, "nominal split");
            return affixes;
        }

        // 3. Predicate stem followed by endings.
        if let Some((stem, endings)) = self.strip_endings(dict, token, MAX_STRIP_DEPTH) {
            let lemma = format!("{}다", stem);
            let kind = dict
                .korean_predicate(&stem)
                .map(|e| MorphemeKind::from(e.primary().pos))
                .unwrap_or(MorphemeKind::Verb);
            let tense = endings
                .iter()
                .filter(|m| m.role == GrammaticalRole::Tense)
                .find_map(|m| m.tense)
                .unwrap_or(Tense::Present);
            let mut out = vec![Morpheme::new(&stem, &lemma, kind, GrammaticalRole::Predicate).with_tense(tense)];
            out.extend(endings);
            trace!(token, lemma = %lemma, "predicate split");
            return out;
        }

        // 4. Unknown stem, but a recognisable particle: keep the role.
        for m in self.particles.matches(token) {
            let rest = &token[..m.split_at];
            if m.payload.kind == MorphemeKind::Particle
                && rest.chars().count() >= 2
                && m.payload.after.admits(rest)
            {
                return vec![Morpheme::unknown(rest), affix_morpheme(m.suffix, m.payload)];
            }
        }

        vec![Morpheme::unknown(token)]
    }

    fn strip_particles(&self, dict: &DictionaryStore, word: &str, depth: usize) -> Option<(String, Vec<Morpheme>)> {
        if depth == 0 {
            return None;
        }
        for m in self.particles.matches(word) {
            let rest = &word[..m.split_at];
            if rest.is_empty() || !m.payload.after.admits(rest) {
                continue;
            }
            // 공부하고 is a verb form, not 공부 + comitative 하고.
            if m.suffix == "하고" && dict.korean_predicate(&format!("{}하", rest)).is_some() {
                continue;
            }
            let affix = affix_morpheme(m.suffix, m.payload);
            if nominal_kind(dict, rest).is_some() {
                return Some((rest.to_string(), vec![affix]));
            }
            // Stacked particles (학교에서는): the copula never stacks.
            if m.payload.kind == MorphemeKind::Particle {
                if let Some((stem, mut inner)) = self.strip_particles(dict, rest, depth - 1) {
                    inner.push(affix);
                    return Some((stem, inner));
                }
            }
        }
        None
    }

    /// Returns the predicate stem (without 다) and the endings in surface order.
    fn strip_endings(&self, dict: &DictionaryStore, word: &str, depth: usize) -> Option<(String, Vec<Morpheme>)> {
        if word.is_empty() || depth == 0 {
            return None;
        }
        if dict.korean_predicate(word).is_some() {
            return Some((word.to_string(), Vec::new()));
        }
        if let Some(stem) = self.irregular_variants.get(word) {
            return Some((stem.clone(), Vec::new()));
        }
        for candidate in contraction_candidates(word) {
            if dict.korean_predicate(&candidate).is_some() {
                return Some((candidate, Vec::new()));
            }
        }
        // noun + 하다 for action nouns missing a verb entry.
        if let Some(noun) = word.strip_suffix('하') {
            if nominal_kind(dict, noun) == Some(MorphemeKind::Noun) {
                return Some((word.to_string(), Vec::new()));
            }
        }

        // Endings fused into the final syllable as a coda.
        if let Some(last) = last_syllable(word) {
            let fused = match last.coda {
                Some('ㄴ') => Some(ending(R::Modifier, None)),
                Some('ㄹ') => Some(ending(R::Modifier, Some(Tense::Future))),
                Some('ㅂ') => Some(ending(R::Final, None)),
                Some('ㅆ') => Some(ending(R::Tense, Some(Tense::Past))),
                _ => None,
            };
            if let (Some(affix), Some(coda)) = (fused, last.coda) {
                if let Ok(open) = replace_last(word, last.with_coda(None)) {
                    if let Some((stem, mut endings)) = self.strip_endings(dict, &open, depth - 1) {
                        endings.push(affix_morpheme(&coda.to_string(), &affix));
                        return Some((stem, endings));
                    }
                }
            }
        }

        for m in self.endings.matches(word) {
            let rest = &word[..m.split_at];
            if rest.is_empty() {
                continue;
            }
            let after_fused_b = final_coda(rest) == Some('ㅂ');
            if m.suffix == "니다" && !after_fused_b {
                continue;
            }
            if let Some((stem, mut endings)) = self.strip_endings(dict, rest, depth - 1) {
                let mut morpheme = affix_morpheme(m.suffix, m.payload);
                // 갑니까: formal question, not the causal 니까.
                if m.suffix == "니까" && after_fused_b {
                    morpheme.role = GrammaticalRole::Final;
                }
                endings.push(morpheme);
                return Some((stem, endings));
            }
        }
        None
    }

    /// Reduces an English word to its lemma plus at most one inflection.
    pub fn analyze_english(&self, dict: &DictionaryStore, token: &str) -> Morpheme {
        let lower = token.trim().to_lowercase();
        if lower.is_empty() {
            return Morpheme::unknown(token);
        }

        // 1. Closed-class words.
        if let Some(&(_, lemma, kind, role, tense)) =
            ENGLISH_FUNCTION_WORDS.iter().find(|(form, ..)| *form == lower)
        {
            let mut m = Morpheme::new(token, lemma, kind, role);
            m.tense = tense;
            return m;
        }
        if let Some((forms, case)) = parse_english_pronoun(&lower) {
            let role = match case {
                crate::core::dictionary::PronounCase::Nominative => R::Subject,
                crate::core::dictionary::PronounCase::Accusative => R::Object,
                crate::core::dictionary::PronounCase::Possessive => R::Possessive,
            };
            return Morpheme::new(token, forms.nominative, MorphemeKind::Pronoun, role);
        }

        // 2. Listed as is.
        if let Some(entry) = dict.lookup(&lower, Direction::EnKo) {
            let kind = MorphemeKind::from(entry.primary().pos);
            return Morpheme::new(token, &entry.headword, kind, R::None);
        }

        // 3. Irregular forms.
        if let Some(&(_, lemma, inflection)) = ENGLISH_IRREGULARS.iter().find(|(form, ..)| *form == lower) {
            let kind = dict
                .lookup(lemma, Direction::EnKo)
                .map(|e| MorphemeKind::from(e.primary().pos))
                .unwrap_or(MorphemeKind::Verb);
            return Morpheme::new(token, lemma, kind, R::None).with_inflection(inflection);
        }

        // 4. Regular suffixes, validated against the dictionary.
        for m in self.english_suffixes.matches(&lower) {
            let base = &lower[..m.split_at];
            if base.chars().count() < 2 {
                continue;
            }
            for how in m.payload.restores {
                let Some(candidate) = restore(base, *how) else { continue };
                let Some(entry) = dict.lookup(&candidate, Direction::EnKo) else { continue };
                let pos = entry.primary().pos;
                let inflection = m.payload.inflection.unwrap_or(if pos == PartOfSpeech::Noun {
                    Inflection::Plural
                } else {
                    Inflection::ThirdPerson
                });
                trace!(token, lemma = %candidate, ?inflection, "english suffix stripped");
                return Morpheme::new(token, &entry.headword, MorphemeKind::from(pos), R::None)
                    .with_inflection(inflection);
            }
        }

        Morpheme::unknown(token)
    }
}

fn affix_morpheme(surface: &str, affix: &Affix) -> Morpheme {
    let mut m = Morpheme::new(surface, surface, affix.kind, affix.role);
    m.tense = affix.tense;
    m
}

/// Kind of `word` when it is a registered nominal (noun, pronoun, numeral).
fn nominal_kind(dict: &DictionaryStore, word: &str) -> Option<MorphemeKind> {
    let entry = dict.lookup(word, Direction::KoEn)?;
    entry.senses.iter().find_map(|s| match s.pos {
        PartOfSpeech::Noun | PartOfSpeech::Phrase => Some(MorphemeKind::Noun),
        PartOfSpeech::Pronoun => Some(MorphemeKind::Pronoun),
        PartOfSpeech::Numeral => Some(MorphemeKind::Numeral),
        _ => None,
    })
}

/// Stems a contracted final syllable could have come from:
/// 마셔 → 마시, 와 → 오, 배워 → 배우, 해 → 하, 돼 → 되, 써 → 쓰, 아파 → 아프.
fn contraction_candidates(word: &str) -> Vec<String> {
    let Some(last) = last_syllable(word) else {
        return Vec::new();
    };
    if last.coda.is_some() {
        return Vec::new();
    }
    let nuclei: &[char] = match last.nucleus {
        'ㅕ' => &['ㅣ'],
        'ㅘ' => &['ㅗ'],
        'ㅝ' => &['ㅜ'],
        'ㅙ' => &['ㅚ'],
        'ㅐ' if last.onset == 'ㅎ' => &['ㅏ'],
        'ㅓ' | 'ㅏ' => &['ㅡ'],
        _ => &[],
    };
    nuclei
        .iter()
        .filter_map(|&n| replace_last(word, last.with_nucleus(n)).ok())
        .collect()
}

/// Surface shapes an irregular stem takes before vowel-initial endings.
fn irregular_variants_of(stem: &str) -> Vec<String> {
    let mut out = Vec::new();
    let Some(class) = irregular_class(stem) else {
        return out;
    };
    out.push(infinitive(stem));
    match class {
        Irregular::Digeut => {
            if let Some(v) = with_last(stem, |s| s.with_coda(Some('ㄹ'))) {
                out.push(v);
            }
        }
        Irregular::Bieup => {
            if let Some(base) = with_last(stem, |s| s.with_coda(None)) {
                out.push(format!("{}우", base));
                out.push(format!("{}오", base));
            }
        }
        Irregular::Siot => {
            if let Some(v) = with_last(stem, |s| s.with_coda(None)) {
                out.push(v);
            }
        }
        Irregular::Hieut => {
            if let Some(v) = with_last(stem, |s| s.with_coda(None)) {
                out.push(v);
            }
        }
        Irregular::Reu => {}
    }
    out
}

// --- English generation ---

fn is_vowel(c: char) -> bool {
    "aeiou".contains(c)
}

/// Consonant-vowel-consonant ending of a short word, whose last consonant doubles.
fn doubles_final(word: &str) -> bool {
    let chars: Vec<char> = word.chars().collect();
    let n = chars.len();
    if !(3..=4).contains(&n) || !chars.iter().all(|c| c.is_ascii_lowercase()) {
        return false;
    }
    let (a, b, c) = (chars[n - 3], chars[n - 2], chars[n - 1]);
    !is_vowel(a) && is_vowel(b) && !is_vowel(c) && !"wxy".contains(c)
        && chars[..n - 2].iter().filter(|&&ch| is_vowel(ch)).count() == 0
}

/// `word` with its last character repeated (stop → stopp).
fn doubled(word: &str) -> String {
    match word.chars().last() {
        Some(c) => format!("{}{}", word, c),
        None => String::new(),
    }
}

/// Inflects a single English word.
fn inflect_word(word: &str, inflection: Inflection) -> String {
    if let Some(&(form, ..)) = ENGLISH_IRREGULARS
        .iter()
        .find(|&&(_, lemma, inf)| lemma == word && inf == inflection)
    {
        return form.to_string();
    }
    if inflection == Inflection::PastParticiple {
        return inflect_word(word, Inflection::Past);
    }
    let ends_consonant_y = word.ends_with('y')
        && word.chars().rev().nth(1).map(|c| !is_vowel(c)).unwrap_or(false);
    match inflection {
        Inflection::Past | Inflection::PastParticiple => {
            if word.ends_with('e') {
                format!("{}d", word)
            } else if ends_consonant_y {
                format!("{}ied", &word[..word.len() - 1])
            } else if doubles_final(word) {
                format!("{}ed", doubled(word))
            } else {
                format!("{}ed", word)
            }
        }
        Inflection::ThirdPerson | Inflection::Plural => {
            if word == "be" {
                "is".to_string()
            } else if word == "have" {
                "has".to_string()
            } else if ["s", "x", "z", "ch", "sh", "o"].iter().any(|s| word.ends_with(s)) {
                format!("{}es", word)
            } else if ends_consonant_y {
                format!("{}ies", &word[..word.len() - 1])
            } else {
                format!("{}s", word)
            }
        }
        Inflection::Progressive => {
            if word.ends_with("ie") {
                format!("{}ying", &word[..word.len() - 2])
            } else if word.ends_with('e') && !word.ends_with("ee") && word != "be" {
                format!("{}ing", &word[..word.len() - 1])
            } else if doubles_final(word) {
                format!("{}ing", doubled(word))
            } else {
                format!("{}ing", word)
            }
        }
        Inflection::Possessive => {
            if word.ends_with('s') {
                format!("{}'", word)
            } else {
                format!("{}'s", word)
            }
        }
        Inflection::Comparative | Inflection::Superlative => {
            let suffix = if inflection == Inflection::Comparative { "er" } else { "est" };
            if word.ends_with('e') {
                format!("{}{}", word, &suffix[1..])
            } else if ends_consonant_y {
                format!("{}i{}", &word[..word.len() - 1], suffix)
            } else if doubles_final(word) {
                format!("{}{}", doubled(word), suffix)
            } else {
                format!("{}{}", word, suffix)
            }
        }
    }
}

/// Inflects an English lemma. Multi-word lemmas (phrasal verbs, glosses like
/// "wake up") inflect their first word; plurals and possessives their last.
pub fn inflect(lemma: &str, inflection: Inflection) -> String {
    let words: Vec<&str> = lemma.split(' ').collect();
    if words.len() == 1 {
        return inflect_word(lemma, inflection);
    }
    let mut out: Vec<String> = words.iter().map(|w| w.to_string()).collect();
    let at = match inflection {
        Inflection::Plural | Inflection::Possessive => out.len() - 1,
        _ => 0,
    };
    out[at] = inflect_word(words[at], inflection);
    out.join(" ")
}

/// Expands English contractions so each word can be analyzed on its own.
pub fn expand_contractions(text: &str) -> String {
    let mut out = Vec::new();
    for word in text.split_whitespace() {
        let normalized = word.replace('\u{2019}', "'");
        let lower = normalized.to_lowercase();
        let expanded: Option<String> = match lower.as_str() {
            "can't" | "cannot" => Some("can not".into()),
            "won't" => Some("will not".into()),
            "let's" => Some("let us".into()),
            _ => None,
        };
        if let Some(e) = expanded {
            out.push(e);
            continue;
        }
        let rules: &[(&str, &str)] = &[
            ("n't", " not"),
            ("'m", " am"),
            ("'re", " are"),
            ("'ll", " will"),
            ("'ve", " have"),
            ("'d", " would"),
        ];
        let mut replaced = None;
        for (suffix, with) in rules {
            if let Some(head) = strip_suffix_ci(&normalized, suffix) {
                replaced = Some(format!("{}{}", head, with));
                break;
            }
        }
        if replaced.is_none() {
            // 's after a pronoun is "is"; after a noun it stays possessive.
            if let Some(head) = strip_suffix_ci(&normalized, "'s") {
                if ["it", "he", "she", "that", "what", "there", "who", "where"].contains(&head.to_lowercase().as_str()) {
                    replaced = Some(format!("{} is", head));
                }
            }
        }
        out.push(replaced.unwrap_or(normalized));
    }
    out.join(" ")
}

fn strip_suffix_ci<'a>(word: &'a str, suffix: &str) -> Option<&'a str> {
    let split = word.len().checked_sub(suffix.len())?;
    (word.is_char_boundary(split) && word[split..].eq_ignore_ascii_case(suffix) && split > 0).then(|| &word[..split])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict() -> DictionaryStore {
        DictionaryStore::builtin().unwrap()
    }

    fn lemmas(ms: &[Morpheme]) -> Vec<&str> {
        ms.iter().map(|m| m.lemma.as_str()).collect()
    }

    #[test]
    fn noun_with_particles() {
        let (d, a) = (dict(), MorphologicalAnalyzer::new());
        let ms = a.analyze_korean(&d, "학교에서는");
        assert_eq!(lemmas(&ms), vec!["학교", "에서", "는"]);
        assert_eq!(ms[1].role, GrammaticalRole::Source);
        assert_eq!(ms[2].role, GrammaticalRole::Topic);

        let ms = a.analyze_korean(&d, "차를");
        assert_eq!(lemmas(&ms), vec!["차", "를"]);
        assert_eq!(ms[1].role, GrammaticalRole::Object);
    }

    #[test]
    fn particle_allomorph_must_agree() {
        let (d, a) = (dict(), MorphologicalAnalyzer::new());
        // 을 needs a final consonant, so 학교을 is not 학교 + object marker.
        let ms = a.analyze_korean(&d, "학교을");
        assert_ne!(ms[0].lemma, "학교");
    }

    #[test]
    fn predicates_recover_dictionary_form() {
        let (d, a) = (dict(), MorphologicalAnalyzer::new());
        for (surface, lemma, tense) in [
            ("갔다", "가다", Tense::Past),
            ("먹었어요", "먹다", Tense::Past),
            ("마셔요", "마시다", Tense::Present),
            ("공부합니다", "공부하다", Tense::Present),
            ("먹습니다", "먹다", Tense::Present),
            ("했다", "하다", Tense::Past),
            ("가겠다", "가다", Tense::Future),
            ("왔어", "오다", Tense::Past),
        ] {
            let ms = a.analyze_korean(&d, surface);
            assert_eq!(ms[0].lemma, lemma, "{}", surface);
            assert_eq!(ms[0].tense, Some(tense), "{}", surface);
        }
    }

    #[test]
    fn irregular_stems_are_checked_first() {
        let (d, a) = (dict(), MorphologicalAnalyzer::new());
        for (surface, lemma) in [
            ("들었다", "듣다"),
            ("도와요", "돕다"),
            ("추워요", "춥다"),
            ("몰라요", "모르다"),
            ("불렀다", "부르다"),
            ("하얘요", "하얗다"),
            ("써요", "쓰다"),
            ("아파요", "아프다"),
            ("바빠요", "바쁘다"),
        ] {
            assert_eq!(a.analyze_korean(&d, surface)[0].lemma, lemma, "{}", surface);
        }
    }

    #[test]
    fn connective_and_copula_endings() {
        let (d, a) = (dict(), MorphologicalAnalyzer::new());
        let ms = a.analyze_korean(&d, "먹고");
        assert_eq!(ms.last().unwrap().role, GrammaticalRole::Connective(Connective::And));
        let ms = a.analyze_korean(&d, "학생입니다");
        assert_eq!(lemmas(&ms), vec!["학생", "입니다"]);
        assert_eq!(ms[1].role, GrammaticalRole::Copula);
        let ms = a.analyze_korean(&d, "공부하고");
        assert_eq!(ms[0].lemma, "공부하다");
    }

    #[test]
    fn unknown_tokens_pass_through() {
        let (d, a) = (dict(), MorphologicalAnalyzer::new());
        let ms = a.analyze_korean(&d, "뷁뷁");
        assert_eq!(ms.len(), 1);
        assert_eq!(ms[0].kind, MorphemeKind::Unknown);
        assert_eq!(ms[0].lemma, ms[0].surface);

        // Unknown stem but a known particle keeps the split.
        let ms = a.analyze_korean(&d, "뷁뷁을");
        assert_eq!(ms[0].kind, MorphemeKind::Unknown);
        assert_eq!(ms[1].role, GrammaticalRole::Object);

        let m = a.analyze_english(&d, "Zxqv");
        assert_eq!(m.kind, MorphemeKind::Unknown);
        assert_eq!(m.lemma, "Zxqv");
    }

    #[test]
    fn english_inflections() {
        let (d, a) = (dict(), MorphologicalAnalyzer::new());
        let cases = [
            ("went", "go", Some(Inflection::Past)),
            ("eating", "eat", Some(Inflection::Progressive)),
            ("liked", "like", Some(Inflection::Past)),
            ("stopped", "stop", Some(Inflection::Past)),
            ("studies", "study", Some(Inflection::ThirdPerson)),
            ("books", "book", Some(Inflection::Plural)),
            ("children", "child", Some(Inflection::Plural)),
        ];
        for (surface, lemma, inflection) in cases {
            let m = a.analyze_english(&d, surface);
            assert_eq!(m.lemma, lemma, "{}", surface);
            assert_eq!(m.inflection, inflection, "{}", surface);
        }
        assert_eq!(a.analyze_english(&d, "him").lemma, "he");
        assert_eq!(a.analyze_english(&d, "was").lemma, "be");
    }

    #[test]
    fn english_generation_inverts_analysis() {
        assert_eq!(inflect("go", Inflection::Past), "went");
        assert_eq!(inflect("study", Inflection::ThirdPerson), "studies");
        assert_eq!(inflect("watch", Inflection::ThirdPerson), "watches");
        assert_eq!(inflect("make", Inflection::Progressive), "making");
        assert_eq!(inflect("run", Inflection::Progressive), "running");
        assert_eq!(inflect("stop", Inflection::Past), "stopped");
        assert_eq!(inflect("look after", Inflection::Past), "looked after");
        assert_eq!(inflect("big", Inflection::Comparative), "bigger");
    }

    #[test]
    fn korean_conjugation_primitives() {
        assert_eq!(infinitive("가"), "가");
        assert_eq!(infinitive("먹"), "먹어");
        assert_eq!(infinitive("하"), "해");
        assert_eq!(infinitive("공부하"), "공부해");
        assert_eq!(infinitive("마시"), "마셔");
        assert_eq!(infinitive("오"), "와");
        assert_eq!(infinitive("배우"), "배워");
        assert_eq!(infinitive("쓰"), "써");
        assert_eq!(infinitive("아프"), "아파");
        assert_eq!(infinitive("모르"), "몰라");
        assert_eq!(infinitive("춥"), "추워");
        assert_eq!(infinitive("돕"), "도와");
        assert_eq!(infinitive("듣"), "들어");
        assert_eq!(infinitive("되"), "돼");
        assert_eq!(past_stem("가"), "갔");
        assert_eq!(past_stem("먹"), "먹었");
        assert_eq!(formal_present("가"), "갑니다");
        assert_eq!(formal_present("먹"), "먹습니다");
        assert_eq!(formal_present("만들"), "만듭니다");
        assert_eq!(plain_present("가"), "간다");
        assert_eq!(plain_present("먹"), "먹는다");
        assert_eq!(plain_present("만들"), "만든다");
        assert_eq!(modifier_form("크", MorphemeKind::Adjective, Tense::Present), "큰");
        assert_eq!(modifier_form("춥", MorphemeKind::Adjective, Tense::Present), "추운");
        assert_eq!(modifier_form("맛있", MorphemeKind::Adjective, Tense::Present), "맛있는");
        assert_eq!(modifier_form("가", MorphemeKind::Verb, Tense::Future), "갈");
        assert_eq!(modifier_form("먹", MorphemeKind::Verb, Tense::Future), "먹을");
    }

    #[test]
    fn h_irregular_stems_front_their_vowel() {
        assert_eq!(infinitive("하얗"), "하얘");
        assert_eq!(infinitive("빨갛"), "빨개");
        assert_eq!(infinitive("그렇"), "그래");
    }

    #[test]
    fn english_inflection_handles_irregulars_and_non_ascii() {
        assert_eq!(inflect("ride", Inflection::Past), "rode");
        assert_eq!(inflect("fall", Inflection::Past), "fell");
        assert_eq!(inflect("hurt", Inflection::Past), "hurt");
        assert_eq!(inflect("tañ", Inflection::Past), "tañed");
        assert_eq!(inflect("café", Inflection::Plural), "cafés");
        assert_eq!(inflect("naïve", Inflection::Progressive), "naïving");
        let (d, a) = (dict(), MorphologicalAnalyzer::new());
        assert_eq!(a.analyze_english(&d, "fell").lemma, "fall");
        assert_eq!(a.analyze_english(&d, "rode").lemma, "ride");
    }

    #[test]
    fn contractions_expand() {
        assert_eq!(expand_contractions("I don't know"), "I do not know");
        assert_eq!(expand_contractions("It's cold"), "It is cold");
        assert_eq!(expand_contractions("I can't go"), "I can not go");
        assert_eq!(expand_contractions("Tom's book"), "Tom's book");
    }
}
