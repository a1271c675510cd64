// File: src/core/spacing.rs
//! Korean spacing correction.
//!
//! Two problems are handled separately and then composed: missing spaces
//! ("나는학교에갔다") are recovered by dynamic-programming segmentation, and
//! character-by-character spacing ("안 녕 하 세 요") is merged back into words.
//! Both use the same integer cost per candidate word so that running the
//! composition on its own output changes nothing.

use crate::core::dictionary::DictionaryStore;
use crate::core::jamo::{contains_hangul, is_hangul_syllable};
use crate::core::morphology::MorphologicalAnalyzer;
use crate::core::types::{Direction, Morpheme, MorphemeKind, SpacingCorrection};
use tracing::{debug, trace};

/// Longest candidate word, in syllables.
pub const MAX_WORD_LEN: usize = 10;
/// Cost per syllable of a fragment nothing can resolve.
const UNKNOWN_SYLLABLE_COST: u32 = 15;
/// Tokens this short are never re-segmented.
const SHORT_TOKEN: usize = 2;
/// Bound on merge/recover rounds in [`SpacingCorrector::correct_spacing_full`].
const MAX_ROUNDS: usize = 8;

fn resolved(morphemes: &[Morpheme]) -> bool {
    !morphemes.is_empty() && morphemes.iter().all(|m| m.kind != MorphemeKind::Unknown)
}

/// Borrowed view over the dictionary and analyzer for one correction call.
#[derive(Debug, Clone, Copy)]
pub struct SpacingCorrector<'a> {
    dict: &'a DictionaryStore,
    analyzer: &'a MorphologicalAnalyzer,
    typo_threshold: f64,
    max_word_len: usize,
}

impl<'a> SpacingCorrector<'a> {
    pub fn new(dict: &'a DictionaryStore, analyzer: &'a MorphologicalAnalyzer, typo_threshold: f64) -> Self {
        Self { dict, analyzer, typo_threshold, max_word_len: MAX_WORD_LEN }
    }

    pub fn with_max_word_len(mut self, max_word_len: usize) -> Self {
        self.max_word_len = max_word_len.max(1);
        self
    }

    /// Whether the token analyzes into known morphemes only.
    pub fn is_resolvable(&self, token: &str) -> bool {
        resolved(&self.analyzer.analyze_korean(self.dict, token))
    }

    fn typo_cost(&self, word: &str) -> Option<u32> {
        self.dict
            .fuzzy_lookup(word, Direction::KoEn, self.typo_threshold)
            .first()
            .map(|best| ((best.distance * 10.0).round() as u32).max(1))
    }

    /// Cost of treating `token` as one word: 0 when it resolves, the scaled
    /// jamo distance to the nearest headword when it (or its stem, ahead of
    /// known particles) is a probable typo, and a per-syllable penalty
    /// otherwise.
    pub fn token_cost(&self, token: &str) -> u32 {
        if !contains_hangul(token) {
            return 0;
        }
        let morphemes = self.analyzer.analyze_korean(self.dict, token);
        if resolved(&morphemes) {
            return 0;
        }
        if let Some(cost) = self.typo_cost(token) {
            return cost;
        }
        // 학꾜에: misspelled stem, known particle.
        if let [stem, affixes @ ..] = morphemes.as_slice() {
            if stem.kind == MorphemeKind::Unknown && !affixes.is_empty() && resolved(affixes) {
                if let Some(cost) = self.typo_cost(&stem.surface) {
                    return cost;
                }
            }
        }
        self.unknown_cost(token)
    }

    fn unknown_cost(&self, token: &str) -> u32 {
        UNKNOWN_SYLLABLE_COST * token.chars().count() as u32
    }

    /// Splits each over-long unresolvable token into the cheapest sequence of
    /// dictionary words. Short, resolvable and non-Korean tokens are kept as is.
    pub fn recover_spacing(&self, text: &str) -> SpacingCorrection {
        let mut tokens = Vec::new();
        for token in text.split_whitespace() {
            let (prefix, core, suffix) = split_edges(token);
            if core.chars().count() <= SHORT_TOKEN || !core.chars().all(is_hangul_syllable) {
                tokens.push(token.to_string());
                continue;
            }
            let original = self.token_cost(core);
            if original == 0 {
                tokens.push(token.to_string());
                continue;
            }
            let (cost, pieces) = self.segment(core);
            // A split that leaves a piece nothing can read (그림의 → 그 림의)
            // is worse than the unknown word.
            let readable = pieces.iter().all(|p| self.token_cost(p) < self.unknown_cost(p));
            if cost < original && pieces.len() > 1 && readable {
                trace!(token, ?pieces, cost, original, "recovered spacing");
                let last = pieces.len() - 1;
                for (i, piece) in pieces.into_iter().enumerate() {
                    let mut piece = piece;
                    if i == 0 {
                        piece.insert_str(0, prefix);
                    }
                    if i == last {
                        piece.push_str(suffix);
                    }
                    tokens.push(piece);
                }
            } else {
                tokens.push(token.to_string());
            }
        }
        self.scored(tokens)
    }

    /// Minimum-cost segmentation of a run of syllables. Ties go to fewer words.
    fn segment(&self, run: &str) -> (u32, Vec<String>) {
        let chars: Vec<char> = run.chars().collect();
        let n = chars.len();
        // best[i] = (cost, words) for chars[..i], with the split point it came from.
        let mut best: Vec<Option<((u32, usize), usize)>> = vec![None; n + 1];
        best[0] = Some(((0, 0), 0));
        for end in 1..=n {
            for start in end.saturating_sub(self.max_word_len)..end {
                let Some(((cost, count), _)) = best[start] else { continue };
                let word: String = chars[start..end].iter().collect();
                let candidate = (cost + self.token_cost(&word), count + 1);
                if best[end].map_or(true, |(current, _)| candidate < current) {
                    best[end] = Some((candidate, start));
                }
            }
        }
        let mut pieces = Vec::new();
        let mut end = n;
        while end > 0 {
            let Some((_, start)) = best[end] else { break };
            pieces.push(chars[start..end].iter().collect());
            end = start;
        }
        pieces.reverse();
        let cost = best[n].map(|((c, _), _)| c).unwrap_or(u32::MAX);
        (cost, pieces)
    }

    /// Joins runs of short Korean tokens when the joined word is strictly
    /// cheaper than its pieces ("안 녕 하 세 요" → "안녕하세요").
    pub fn merge_wrong_spacing(&self, text: &str) -> SpacingCorrection {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let mut out = Vec::with_capacity(tokens.len());
        let is_short = |t: &str| {
            let len = t.chars().count();
            len <= SHORT_TOKEN && t.chars().all(is_hangul_syllable)
        };
        let mut i = 0;
        while i < tokens.len() {
            if !is_short(tokens[i]) {
                out.push(tokens[i].to_string());
                i += 1;
                continue;
            }
            // Longest run of short tokens starting here, within the word length bound.
            let mut end = i;
            let mut chars = tokens[i].chars().count();
            while end + 1 < tokens.len()
                && is_short(tokens[end + 1])
                && chars + tokens[end + 1].chars().count() <= self.max_word_len
            {
                end += 1;
                chars += tokens[end].chars().count();
            }
            let mut merged = None;
            for last in (i + 1..=end).rev() {
                let pieces = &tokens[i..=last];
                let joined: String = pieces.concat();
                let separate: u32 = pieces.iter().map(|p| self.token_cost(p)).sum();
                if self.token_cost(&joined) < separate {
                    merged = Some((joined, last));
                    break;
                }
            }
            match merged {
                Some((joined, last)) => {
                    trace!(from = i, to = last, word = %joined, "merged over-spaced run");
                    out.push(joined);
                    i = last + 1;
                }
                None => {
                    out.push(tokens[i].to_string());
                    i += 1;
                }
            }
        }
        self.scored(out)
    }

    /// Merge, then recover, repeated until the text stops changing.
    pub fn correct_spacing_full(&self, text: &str) -> SpacingCorrection {
        let mut current = text.split_whitespace().collect::<Vec<_>>().join(" ");
        for round in 0..MAX_ROUNDS {
            let merged = self.merge_wrong_spacing(&current);
            let recovered = self.recover_spacing(&merged.text());
            let next = recovered.text();
            if next == current {
                debug!(rounds = round + 1, "spacing reached a fixed point");
                return recovered;
            }
            current = next;
        }
        self.scored(current.split_whitespace().map(str::to_string).collect())
    }

    /// Confidence is the share of Korean tokens that resolve exactly.
    fn scored(&self, tokens: Vec<String>) -> SpacingCorrection {
        let korean: Vec<&String> = tokens.iter().filter(|t| contains_hangul(t)).collect();
        let confidence = if korean.is_empty() {
            1.0
        } else {
            let resolved = korean
                .iter()
                .filter(|t| self.is_resolvable(split_edges(t).1))
                .count();
            resolved as f64 / korean.len() as f64
        };
        SpacingCorrection { tokens, confidence }
    }
}

/// Separates leading and trailing ASCII punctuation from a token.
pub(crate) fn split_edges(token: &str) -> (&str, &str, &str) {
    let start = token
        .char_indices()
        .find(|(_, c)| !c.is_ascii_punctuation())
        .map(|(i, _)| i)
        .unwrap_or(token.len());
    let end = token
        .char_indices()
        .rev()
        .find(|(_, c)| !c.is_ascii_punctuation())
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(start)
        .max(start);
    (&token[..start], &token[start..end], &token[end..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::jamo::TYPO_THRESHOLD;

    fn with_corrector<T>(f: impl FnOnce(SpacingCorrector<'_>) -> T) -> T {
        let dict = DictionaryStore::builtin().unwrap();
        let analyzer = MorphologicalAnalyzer::new();
        f(SpacingCorrector::new(&dict, &analyzer, TYPO_THRESHOLD))
    }

    #[test]
    fn recovers_missing_spaces() {
        with_corrector(|c| {
            let out = c.recover_spacing("나는학교에갔다");
            assert!(out.tokens.len() >= 3, "{:?}", out.tokens);
            assert!(out.tokens.iter().any(|t| t == "나는" || t == "나"));
            assert!(out.tokens.iter().any(|t| t == "학교에" || t == "학교"));
            assert!(out.tokens.iter().any(|t| t == "갔다"));
            assert_eq!(out.confidence, 1.0);
        });
    }

    #[test]
    fn merges_character_spacing() {
        with_corrector(|c| {
            assert_eq!(c.merge_wrong_spacing("안 녕 하 세 요").text(), "안녕하세요");
        });
    }

    #[test]
    fn leaves_correct_text_alone() {
        with_corrector(|c| {
            let text = "나는 학교에 갔다";
            assert_eq!(c.correct_spacing_full(text).text(), text);
            assert_eq!(c.recover_spacing("hello world").text(), "hello world");
        });
    }

    #[test]
    fn trailing_punctuation_survives_segmentation() {
        with_corrector(|c| {
            let out = c.recover_spacing("나는학교에갔다.");
            assert_eq!(out.tokens.last().map(String::as_str), Some("갔다."));
        });
    }

    #[test]
    fn full_correction_is_idempotent() {
        with_corrector(|c| {
            for text in ["나는학교에갔다", "안 녕 하 세 요", "차를 마시다", "친구를만났다 고 말했다", "뷁뷁뷁"] {
                let once = c.correct_spacing_full(text);
                let twice = c.correct_spacing_full(&once.text());
                assert_eq!(once.text(), twice.text(), "{}", text);
            }
        });
    }

    #[test]
    fn unreadable_pieces_block_a_split() {
        with_corrector(|c| {
            assert_eq!(c.recover_spacing("그뷁뷁").tokens, vec!["그뷁뷁"]);
            assert_eq!(c.recover_spacing("그림의 떡").tokens, vec!["그림의", "떡"]);
        });
    }

    #[test]
    fn misspelled_stem_keeps_its_particle() {
        with_corrector(|c| {
            assert!(c.token_cost("학꾜에") < UNKNOWN_SYLLABLE_COST);
            assert_eq!(c.correct_spacing_full("학꾜에 갔다").tokens, vec!["학꾜에", "갔다"]);
        });
    }

    #[test]
    fn edges_split() {
        assert_eq!(split_edges("\"갔다.\""), ("\"", "갔다", ".\""));
        assert_eq!(split_edges("..."), ("...", "", ""));
    }
}
