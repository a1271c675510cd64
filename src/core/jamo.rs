// File: src/core/jamo.rs
//! Hangul syllable decomposition/composition and jamo-space edit distance.
//!
//! Jamo are represented as Hangul Compatibility Jamo (`ㄱ`, `ㅏ`, ...), which is
//! what users type and what the rest of the crate compares against.

use crate::error::HangulError;

const SYLLABLE_BASE: u32 = 0xAC00;
const SYLLABLE_LAST: u32 = 0xD7A3;
const NUCLEUS_COUNT: u32 = 21;
const CODA_COUNT: u32 = 28;

/// Initial consonants, in Unicode order (19).
pub const ONSETS: [char; 19] = [
    'ㄱ', 'ㄲ', 'ㄴ', 'ㄷ', 'ㄸ', 'ㄹ', 'ㅁ', 'ㅂ', 'ㅃ', 'ㅅ', 'ㅆ', 'ㅇ', 'ㅈ', 'ㅉ', 'ㅊ', 'ㅋ',
    'ㅌ', 'ㅍ', 'ㅎ',
];

/// Vowels, in Unicode order (21).
pub const NUCLEI: [char; 21] = [
    'ㅏ', 'ㅐ', 'ㅑ', 'ㅒ', 'ㅓ', 'ㅔ', 'ㅕ', 'ㅖ', 'ㅗ', 'ㅘ', 'ㅙ', 'ㅚ', 'ㅛ', 'ㅜ', 'ㅝ', 'ㅞ',
    'ㅟ', 'ㅠ', 'ㅡ', 'ㅢ', 'ㅣ',
];

/// Final consonants, in Unicode order. Index 0 is "no coda" (28 slots).
pub const CODAS: [Option<char>; 28] = [
    None,
    Some('ㄱ'),
    Some('ㄲ'),
    Some('ㄳ'),
    Some('ㄴ'),
    Some('ㄵ'),
    Some('ㄶ'),
    Some('ㄷ'),
    Some('ㄹ'),
    Some('ㄺ'),
    Some('ㄻ'),
    Some('ㄼ'),
    Some('ㄽ'),
    Some('ㄾ'),
    Some('ㄿ'),
    Some('ㅀ'),
    Some('ㅁ'),
    Some('ㅂ'),
    Some('ㅄ'),
    Some('ㅅ'),
    Some('ㅆ'),
    Some('ㅇ'),
    Some('ㅈ'),
    Some('ㅊ'),
    Some('ㅋ'),
    Some('ㅌ'),
    Some('ㅍ'),
    Some('ㅎ'),
];

/// A decomposed syllable block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Syllable {
    pub onset: char,
    pub nucleus: char,
    pub coda: Option<char>,
}

impl Syllable {
    pub fn compose(&self) -> Result<char, HangulError> {
        compose(self.onset, self.nucleus, self.coda)
    }

    /// Same syllable with its final consonant replaced (or removed).
    pub fn with_coda(self, coda: Option<char>) -> Self {
        Self { coda, ..self }
    }

    pub fn with_nucleus(self, nucleus: char) -> Self {
        Self { nucleus, ..self }
    }

    /// True for "bright" vowels, which take `-아` rather than `-어`.
    pub fn is_bright(&self) -> bool {
        matches!(self.nucleus, 'ㅏ' | 'ㅗ' | 'ㅑ' | 'ㅘ')
    }
}

pub fn is_hangul_syllable(c: char) -> bool {
    (SYLLABLE_BASE..=SYLLABLE_LAST).contains(&(c as u32))
}

/// True when the string contains at least one precomposed Hangul syllable.
pub fn contains_hangul(text: &str) -> bool {
    text.chars().any(is_hangul_syllable)
}

pub fn decompose(c: char) -> Result<Syllable, HangulError> {
    if !is_hangul_syllable(c) {
        return Err(HangulError::InvalidSyllable(c));
    }
    let offset = c as u32 - SYLLABLE_BASE;
    let onset = offset / (NUCLEUS_COUNT * CODA_COUNT);
    let nucleus = (offset / CODA_COUNT) % NUCLEUS_COUNT;
    let coda = offset % CODA_COUNT;
    Ok(Syllable {
        onset: ONSETS[onset as usize],
        nucleus: NUCLEI[nucleus as usize],
        coda: CODAS[coda as usize],
    })
}

pub fn compose(onset: char, nucleus: char, coda: Option<char>) -> Result<char, HangulError> {
    let o = ONSETS
        .iter()
        .position(|&j| j == onset)
        .ok_or(HangulError::InvalidJamo(onset))? as u32;
    let n = NUCLEI
        .iter()
        .position(|&j| j == nucleus)
        .ok_or(HangulError::InvalidJamo(nucleus))? as u32;
    let t = match coda {
        None => 0,
        Some(c) => CODAS
            .iter()
            .position(|&j| j == Some(c))
            .ok_or(HangulError::InvalidJamo(c))? as u32,
    };
    let code = SYLLABLE_BASE + (o * NUCLEUS_COUNT + n) * CODA_COUNT + t;
    char::from_u32(code).ok_or(HangulError::InvalidJamo(onset))
}

/// Final consonant of the last syllable, if the word ends in a Hangul syllable.
pub fn final_coda(word: &str) -> Option<char> {
    word.chars().last().and_then(|c| decompose(c).ok()).and_then(|s| s.coda)
}

/// Whether a word "ends in a consonant" for particle allomorph selection.
/// Non-Hangul endings (digits, Latin) are treated as vowel-final.
pub fn has_batchim(word: &str) -> bool {
    final_coda(word).is_some()
}

/// Replaces the last syllable of `word` with `syllable`.
pub fn replace_last(word: &str, syllable: Syllable) -> Result<String, HangulError> {
    let mut chars: Vec<char> = word.chars().collect();
    let last = chars.pop().ok_or(HangulError::InvalidSyllable('\0'))?;
    decompose(last)?;
    chars.push(syllable.compose()?);
    Ok(chars.into_iter().collect())
}

/// Flattens text into its jamo sequence. Non-syllable characters pass through.
pub fn to_jamo(text: &str) -> Vec<char> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        match decompose(c) {
            Ok(s) => {
                out.push(s.onset);
                out.push(s.nucleus);
                if let Some(coda) = s.coda {
                    out.push(coda);
                }
            }
            Err(_) => out.push(c),
        }
    }
    out
}

/// Jamo distance under which two words count as "the same word, possibly mistyped".
pub const TYPO_THRESHOLD: f64 = 1.5;

// 2-beolsik layout: (row, column) of each key.
fn key_position(j: char) -> Option<(i32, i32)> {
    Some(match j {
        'ㅂ' | 'ㅃ' => (0, 0),
        'ㅈ' | 'ㅉ' => (0, 1),
        'ㄷ' | 'ㄸ' => (0, 2),
        'ㄱ' | 'ㄲ' => (0, 3),
        'ㅅ' | 'ㅆ' => (0, 4),
        'ㅛ' => (0, 5),
        'ㅕ' => (0, 6),
        'ㅑ' => (0, 7),
        'ㅐ' | 'ㅒ' => (0, 8),
        'ㅔ' | 'ㅖ' => (0, 9),
        'ㅁ' => (1, 0),
        'ㄴ' => (1, 1),
        'ㅇ' => (1, 2),
        'ㄹ' => (1, 3),
        'ㅎ' => (1, 4),
        'ㅗ' => (1, 5),
        'ㅓ' => (1, 6),
        'ㅏ' => (1, 7),
        'ㅣ' => (1, 8),
        'ㅋ' => (2, 0),
        'ㅌ' => (2, 1),
        'ㅊ' => (2, 2),
        'ㅍ' => (2, 3),
        'ㅠ' => (2, 4),
        'ㅜ' => (2, 5),
        'ㅡ' => (2, 6),
        _ => return None,
    })
}

fn is_tense_pair(a: char, b: char) -> bool {
    const PAIRS: [(char, char); 5] = [('ㄱ', 'ㄲ'), ('ㄷ', 'ㄸ'), ('ㅂ', 'ㅃ'), ('ㅅ', 'ㅆ'), ('ㅈ', 'ㅉ')];
    PAIRS
        .iter()
        .any(|&(x, y)| (a == x && b == y) || (a == y && b == x))
}

/// Substitution cost between two jamo. Symmetric in its arguments.
fn substitution_cost(a: char, b: char) -> f64 {
    if a == b {
        return 0.0;
    }
    if is_tense_pair(a, b) {
        return 0.3;
    }
    match (key_position(a), key_position(b)) {
        (Some((ra, ca)), Some((rb, cb))) => {
            let (dr, dc) = ((ra - rb).abs(), (ca - cb).abs());
            if dr <= 1 && dc <= 1 {
                0.5
            } else {
                let dist = ((dr * dr + dc * dc) as f64).sqrt();
                if dist < 1.5 {
                    0.6
                } else if dist < 2.5 {
                    0.8
                } else {
                    1.0
                }
            }
        }
        _ => 1.0,
    }
}

/// Keyboard-weighted Levenshtein distance over jamo sequences.
///
/// Insertions and deletions cost 1; substitutions cost less when the two
/// jamo are a plain/tense pair or neighbouring keys. O(m*n) in jamo count.
pub fn jamo_edit_distance(a: &str, b: &str) -> f64 {
    let x = to_jamo(a);
    let y = to_jamo(b);
    weighted_levenshtein(&x, &y, substitution_cost)
}

/// Plain Levenshtein distance over characters (used for English).
pub fn levenshtein(a: &str, b: &str) -> usize {
    let x: Vec<char> = a.chars().collect();
    let y: Vec<char> = b.chars().collect();
    weighted_levenshtein(&x, &y, |p, q| if p == q { 0.0 } else { 1.0 }) as usize
}

fn weighted_levenshtein(x: &[char], y: &[char], sub: impl Fn(char, char) -> f64) -> f64 {
    if x.is_empty() {
        return y.len() as f64;
    }
    if y.is_empty() {
        return x.len() as f64;
    }
    let mut prev: Vec<f64> = (0..=y.len()).map(|j| j as f64).collect();
    let mut curr = vec![0.0; y.len() + 1];
    for (i, &xc) in x.iter().enumerate() {
        curr[0] = (i + 1) as f64;
        for (j, &yc) in y.iter().enumerate() {
            let substitute = prev[j] + sub(xc, yc);
            let delete = prev[j + 1] + 1.0;
            let insert = curr[j] + 1.0;
            curr[j + 1] = substitute.min(delete).min(insert);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[y.len()]
}

/// Whether `a` and `b` are close enough to be the same word with a typo.
pub fn is_probable_typo(a: &str, b: &str, threshold: f64) -> bool {
    jamo_edit_distance(a, b) <= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_over_whole_syllable_block() {
        for code in SYLLABLE_BASE..=SYLLABLE_LAST {
            let c = char::from_u32(code).unwrap();
            let s = decompose(c).unwrap();
            assert_eq!(compose(s.onset, s.nucleus, s.coda).unwrap(), c);
        }
    }

    #[test]
    fn decompose_known_syllables() {
        let s = decompose('한').unwrap();
        assert_eq!((s.onset, s.nucleus, s.coda), ('ㅎ', 'ㅏ', Some('ㄴ')));
        let s = decompose('가').unwrap();
        assert_eq!(s.coda, None);
    }

    #[test]
    fn rejects_non_syllables() {
        assert_eq!(decompose('a'), Err(HangulError::InvalidSyllable('a')));
        assert_eq!(decompose('ㄱ'), Err(HangulError::InvalidSyllable('ㄱ')));
        assert_eq!(compose('ㅏ', 'ㅏ', None), Err(HangulError::InvalidJamo('ㅏ')));
    }

    #[test]
    fn single_vowel_typo_is_cheaper_than_syllable_swap() {
        let d = jamo_edit_distance("하고", "하구");
        assert!(d > 0.0 && d <= 1.0, "got {}", d);
        assert!(is_probable_typo("하고", "하구", TYPO_THRESHOLD));
        assert!(!is_probable_typo("학교", "사람", TYPO_THRESHOLD));
    }

    #[test]
    fn distance_is_symmetric() {
        let words = ["안녕하세요", "안녕하세유", "학교", "핵교", "갔다", "값다", "hello", "", "차"];
        for a in words {
            for b in words {
                assert_eq!(jamo_edit_distance(a, b), jamo_edit_distance(b, a), "{} / {}", a, b);
            }
        }
    }

    #[test]
    fn batchim_detection() {
        assert!(has_batchim("학생"));
        assert!(!has_batchim("학교"));
        assert!(!has_batchim("GPU"));
        assert_eq!(final_coda("물"), Some('ㄹ'));
    }

    #[test]
    fn english_levenshtein() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
    }
}
