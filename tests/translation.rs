use hanyeong_core::core::jamo::{compose, contains_hangul, decompose, jamo_edit_distance};
use hanyeong_core::persistence::{load_weights, save_weights, WeightSnapshot};
use hanyeong_core::{
    Direction, DictionaryEntry, DictionaryStore, Formality, ScoringWeights, Sense, TranslateError, TranslateOptions,
    Translator, Warning,
};
use hanyeong_core::core::types::PartOfSpeech;
use std::sync::Arc;

fn translator() -> Translator {
    Translator::builtin().expect("bundled dictionary loads")
}

fn ko(t: &Translator, text: &str) -> String {
    t.translate(text, Direction::KoEn, TranslateOptions::default()).unwrap()
}

fn en(t: &Translator, text: &str, formality: Formality) -> String {
    t.translate(text, Direction::EnKo, TranslateOptions::with_formality(formality)).unwrap()
}

#[test]
fn every_syllable_round_trips() {
    for code in 0xAC00u32..=0xD7A3 {
        let c = char::from_u32(code).unwrap();
        let s = decompose(c).unwrap();
        assert_eq!(compose(s.onset, s.nucleus, s.coda).unwrap(), c);
    }
}

#[test]
fn jamo_distance_is_symmetric() {
    let words = ["학교", "핵교", "사과", "사가", "안녕하세요", "커피", "school", "", "밥"];
    for a in words {
        for b in words {
            assert_eq!(jamo_edit_distance(a, b), jamo_edit_distance(b, a), "{} / {}", a, b);
        }
    }
}

#[test]
fn greeting_both_ways() {
    let t = translator();
    assert!(!ko(&t, "안녕하세요").trim().is_empty());
    assert!(contains_hangul(&en(&t, "Hello", Formality::Neutral)));
}

#[test]
fn empty_input_is_the_only_error() {
    let t = translator();
    for input in ["", "   ", "\n\t"] {
        assert_eq!(t.translate(input, Direction::KoEn, TranslateOptions::default()), Err(TranslateError::EmptyInput));
        assert_eq!(t.translate(input, Direction::EnKo, TranslateOptions::default()), Err(TranslateError::EmptyInput));
    }
    for input in ["ㅋㅋㅋ", "xyzzy 123", "!!!", "학교에갔다고요?", "The zorblax gleeped", "😀"] {
        assert!(t.translate(input, Direction::KoEn, TranslateOptions::default()).is_ok(), "{}", input);
        assert!(t.translate(input, Direction::EnKo, TranslateOptions::default()).is_ok(), "{}", input);
    }
}

#[test]
fn unknown_english_passes_through() {
    let t = translator();
    let result = t
        .translate_with_diagnostics("I like zorblax", Direction::EnKo, TranslateOptions::default())
        .unwrap();
    assert!(result.output().contains("zorblax"), "{}", result.output());
    assert!(result.warnings().iter().any(|w| matches!(w, Warning::UnresolvedToken { .. })));
}

#[test]
fn spacing_is_recovered_and_merged() {
    let t = translator();
    let recovered = t.correct_spacing("나는학교에갔다");
    assert!(recovered.tokens.len() >= 3, "{:?}", recovered.tokens);
    assert!(recovered.tokens.iter().any(|w| w == "나는" || w == "나"));
    assert!(recovered.tokens.iter().any(|w| w == "학교에" || w == "학교"));
    assert!(recovered.tokens.iter().any(|w| w == "갔다"));

    assert_eq!(t.correct_spacing("안 녕 하 세 요").text(), "안녕하세요");
}

#[test]
fn spacing_correction_is_idempotent() {
    let t = translator();
    for input in ["나는학교에갔다", "안 녕 하 세 요", "나는 학교에 갔다"] {
        let once = t.correct_spacing(input).text();
        let twice = t.correct_spacing(&once).text();
        assert_eq!(once, twice, "{}", input);
    }
}

#[test]
fn polysemy_in_full_translations() {
    let t = translator();
    assert!(ko(&t, "차를 마시다").contains("tea"));
    assert!(ko(&t, "차를 운전하다").contains("car"));
    assert!(ko(&t, "두 수의 차를 빼다").contains("difference"));
}

#[test]
fn korean_sentence_becomes_svo() {
    let t = translator();
    let out = ko(&t, "나는 학교에 갔다.");
    assert!(out.starts_with("I went"), "{}", out);
    assert!(out.contains("school"), "{}", out);
}

#[test]
fn formality_changes_korean_endings() {
    let t = translator();
    let formal = en(&t, "I drink water.", Formality::Formal);
    let casual = en(&t, "I drink water.", Formality::Casual);
    assert!(formal.contains("마십니다"), "{}", formal);
    assert!(!casual.contains("니다"), "{}", casual);
    assert_ne!(formal, casual);
}

#[test]
fn injected_entries_are_translated() {
    let mut builder = DictionaryStore::builder().with_builtin().unwrap();
    let report = builder
        .inject(vec![DictionaryEntry::new("떡볶이", vec![Sense::new("tteokbokki", PartOfSpeech::Noun)])])
        .unwrap();
    assert_eq!(report.added_entries, 1);
    let t = Translator::new(Arc::new(builder.build()));
    assert!(ko(&t, "나는 떡볶이를 먹었다").contains("tteokbokki"));
}

#[test]
fn translation_is_deterministic() {
    let t = translator();
    let a = t.translate_with_diagnostics("배가 아파서 병원에 갔다", Direction::KoEn, TranslateOptions::default());
    let b = t.translate_with_diagnostics("배가 아파서 병원에 갔다", Direction::KoEn, TranslateOptions::default());
    assert_eq!(a, b);
}

#[test]
fn translator_is_shareable_across_threads() {
    let t = Arc::new(translator());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let t = Arc::clone(&t);
            std::thread::spawn(move || ko(&t, "차를 마시다"))
        })
        .collect();
    let outputs: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(outputs.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn saved_weights_drive_a_translator() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weights.bin");
    let weights = ScoringWeights { near_context: 2.0, ..ScoringWeights::default() };
    save_weights(&WeightSnapshot { weights, score: 0.5 }, &path).unwrap();
    let loaded = load_weights(&path).unwrap();
    assert_eq!(loaded.weights, weights);
    let config = hanyeong_core::TranslatorConfig { weights: loaded.weights, ..Default::default() };
    let t = Translator::with_config(Arc::new(DictionaryStore::builtin().unwrap()), config);
    assert_eq!(t.config().weights.near_context, 2.0);
}

#[test]
fn idiom_is_not_read_as_a_pronoun() {
    let t = translator();
    let out = ko(&t, "그림의 떡");
    assert!(out.contains("pie in the sky"), "{}", out);
    assert!(!out.contains("Him"), "{}", out);
}

#[test]
fn misspelled_stem_keeps_its_particle() {
    let t = translator();
    for input in ["학꾜에 갔다", "핵교에 갔다"] {
        let out = ko(&t, input);
        assert!(out.contains("school"), "{}", out);
        assert!(!contains_hangul(&out), "{}", out);
    }
}

#[test]
fn english_conditionals_and_negation() {
    let t = translator();
    let out = en(&t, "If it rains, I will stay home.", Formality::Neutral);
    assert!(out.contains("비가 오면"), "{}", out);
    assert!(!out.contains('별'), "{}", out);
    let out = en(&t, "I don't like coffee", Formality::Neutral);
    assert!(out.contains("좋아하지 않"), "{}", out);
}

#[test]
fn context_picks_irregular_verbs_and_weather_senses() {
    let t = translator();
    let out = ko(&t, "배를 타고 바다에 갔다");
    assert!(out.contains("rode"), "{}", out);
    let out = ko(&t, "눈이 내렸다");
    assert!(out.contains("fell"), "{}", out);
    assert!(!out.contains("got off"), "{}", out);
}

#[test]
fn demonstratives_counters_and_modals() {
    let t = translator();
    let out = ko(&t, "이 책은 재미있다");
    assert!(out.starts_with("This book"), "{}", out);
    let out = ko(&t, "사과 세 개를 샀다");
    assert!(out.contains("three apples"), "{}", out);
    assert!(!out.contains("dog"), "{}", out);
    let out = ko(&t, "내일 비가 올 것 같다");
    assert!(out.contains("probably rain"), "{}", out);
    let out = ko(&t, "눈이 아프다");
    assert!(out.contains("eye"), "{}", out);
}

#[test]
fn basic_adjectives_and_wh_questions() {
    let t = translator();
    let out = en(&t, "The car is red", Formality::Neutral);
    assert!(out.contains("빨갛") || out.contains("빨간"), "{}", out);
    assert!(!out.contains("red"), "{}", out);
    let out = en(&t, "Where is the bathroom?", Formality::Neutral);
    assert!(out.contains("화장실이 어디"), "{}", out);
}

#[test]
fn idiom_complement_replaces_dummy_subject() {
    let t = translator();
    let out = en(&t, "It is a piece of cake", Formality::Neutral);
    assert!(out.contains("식은 죽 먹기"), "{}", out);
    assert!(!out.contains("그것"), "{}", out);
}

#[test]
fn injected_non_ascii_gloss_does_not_panic() {
    let mut builder = DictionaryStore::builder().with_builtin().unwrap();
    builder
        .inject(vec![DictionaryEntry::new("뛰뛰다", vec![Sense::new("tañ", PartOfSpeech::Verb)])])
        .unwrap();
    let t = Translator::new(Arc::new(builder.build()));
    let out = ko(&t, "나는 뛰뛰었다");
    assert!(out.contains("tañ"), "{}", out);
}

#[test]
fn decimals_stay_in_one_sentence() {
    let t = translator();
    let out = en(&t, "It costs 3.5 dollars", Formality::Neutral);
    assert!(out.contains("3.5"), "{}", out);
}
