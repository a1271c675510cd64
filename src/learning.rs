// File: src/learning.rs
use crate::core::context::{ContextEngine, ScoringWeights};
use crate::core::engine::Translator;
use crate::core::types::Direction;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, info};

/// The bundled sense-disambiguation corpus.
pub const WSD_CORPUS: &str = include_str!("../data/wsd.json");

/// One sense-disambiguation check: `target` in `sentence` should resolve to
/// the sense whose id is `expected_sense`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WsdCase {
    pub id: String,
    pub sentence: String,
    pub target: String,
    pub expected_sense: String,
    #[serde(default = "default_direction")]
    pub direction: Direction,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_direction() -> Direction {
    Direction::KoEn
}

fn default_weight() -> f64 {
    1.0
}

pub fn load_wsd_corpus(json: &str) -> Result<Vec<WsdCase>, serde_json::Error> {
    serde_json::from_str(json)
}

pub fn builtin_wsd_corpus() -> Result<Vec<WsdCase>, serde_json::Error> {
    load_wsd_corpus(WSD_CORPUS)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizerOptions {
    pub population_size: usize,
    pub generations: usize,
    pub elite_count: usize,
    /// Chance that each weight of a child is perturbed.
    pub mutation_rate: f64,
    pub seed: u64,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self { population_size: 20, generations: 50, elite_count: 4, mutation_rate: 0.2, seed: 42 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseOutcome {
    pub id: String,
    pub passed: bool,
    pub actual_sense: Option<String>,
    pub expected_sense: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub best_weights: ScoringWeights,
    pub best_score: f64,
    /// Generations actually run; fewer than requested when a perfect score is reached.
    pub generations: usize,
    pub outcomes: Vec<CaseOutcome>,
}

/// Sense id chosen for the case's target under `weights`, if the target is
/// in the dictionary.
fn resolve_case(translator: &Translator, engine: &ContextEngine, case: &WsdCase) -> Option<String> {
    let dict = translator.dictionary();
    let entry = dict.lookup(&case.target, case.direction)?;
    let context = engine.analyze_context(dict, translator.analyzer(), &case.sentence, case.direction);
    // Compounds (군밤) contain the target without starting with it.
    let position = context
        .position_of(&case.target)
        .or_else(|| context.tokens.iter().position(|t| t.surface.contains(&case.target)))
        .unwrap_or(0);
    let choice = engine.resolve_polysemy(position, &context, &entry.senses)?;
    Some(choice.sense.id.clone())
}

fn outcomes_for(translator: &Translator, weights: ScoringWeights, corpus: &[WsdCase]) -> Vec<CaseOutcome> {
    let engine = ContextEngine::new(weights, translator.config().context_window);
    corpus
        .iter()
        .map(|case| {
            let actual = resolve_case(translator, &engine, case);
            CaseOutcome {
                id: case.id.clone(),
                passed: actual.as_deref() == Some(case.expected_sense.as_str()),
                actual_sense: actual,
                expected_sense: case.expected_sense.clone(),
            }
        })
        .collect()
}

/// Weighted share of `corpus` resolved to the expected sense, in `0.0..=1.0`.
pub fn evaluate_weights(translator: &Translator, weights: ScoringWeights, corpus: &[WsdCase]) -> f64 {
    let total: f64 = corpus.iter().map(|c| c.weight).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let passed: f64 = outcomes_for(translator, weights, corpus)
        .iter()
        .zip(corpus)
        .filter(|(o, _)| o.passed)
        .map(|(_, c)| c.weight)
        .sum();
    passed / total
}

const MIN_WEIGHT: f64 = 0.1;
const TOURNAMENT_SIZE: usize = 3;

#[derive(Debug, Clone, Copy)]
struct Candidate {
    weights: [f64; ScoringWeights::LEN],
    score: f64,
}

fn random_weights(rng: &mut StdRng, base: &[f64; ScoringWeights::LEN]) -> [f64; ScoringWeights::LEN] {
    let mut w = *base;
    for v in w.iter_mut() {
        *v = (*v * rng.gen_range(0.5..2.0)).max(MIN_WEIGHT);
    }
    w
}

fn crossover(rng: &mut StdRng, a: &[f64; ScoringWeights::LEN], b: &[f64; ScoringWeights::LEN]) -> [f64; ScoringWeights::LEN] {
    let mut child = [0.0; ScoringWeights::LEN];
    for i in 0..ScoringWeights::LEN {
        let roll: f64 = rng.gen();
        child[i] = if roll < 0.4 {
            a[i]
        } else if roll < 0.8 {
            b[i]
        } else {
            (a[i] + b[i]) / 2.0
        };
    }
    child
}

/// Perturbs each weight by up to ±30% with probability `rate`.
fn mutate(rng: &mut StdRng, weights: &mut [f64; ScoringWeights::LEN], rate: f64) {
    for v in weights.iter_mut() {
        if rng.gen_bool(rate.clamp(0.0, 1.0)) {
            let delta = rng.gen_range(-0.3..0.3) * *v;
            *v = (*v + delta).max(MIN_WEIGHT);
        }
    }
}

fn tournament<'p>(rng: &mut StdRng, population: &'p [Candidate]) -> &'p Candidate {
    let mut best = &population[rng.gen_range(0..population.len())];
    for _ in 1..TOURNAMENT_SIZE {
        let challenger = &population[rng.gen_range(0..population.len())];
        if challenger.score > best.score {
            best = challenger;
        }
    }
    best
}

fn by_score_desc(a: &Candidate, b: &Candidate) -> Ordering {
    b.score.total_cmp(&a.score)
}

/// Genetic search for scoring weights that maximise [`evaluate_weights`].
///
/// Deterministic for a given seed: all randomness comes from one seeded
/// generator on the calling thread, and rayon only scores the candidates.
pub fn optimize_weights(
    translator: &Translator,
    initial: ScoringWeights,
    corpus: &[WsdCase],
    options: OptimizerOptions,
) -> OptimizationResult {
    let mut rng = StdRng::seed_from_u64(options.seed);
    let size = options.population_size.max(2);
    let elite = options.elite_count.min(size);
    let score_all = |genomes: Vec<[f64; ScoringWeights::LEN]>| -> Vec<Candidate> {
        genomes
            .into_par_iter()
            .map(|weights| Candidate { weights, score: evaluate_weights(translator, ScoringWeights::from_array(weights), corpus) })
            .collect()
    };

    let base = initial.to_array();
    let mut genomes = vec![base];
    genomes.extend((1..size).map(|_| random_weights(&mut rng, &base)));
    let mut population = score_all(genomes);
    let mut best = population[0];
    let mut generations = 0;

    for generation in 0..options.generations {
        population.sort_by(by_score_desc);
        if population[0].score > best.score {
            best = population[0];
        }
        info!(generation, best_score = best.score, "optimizer generation");
        if best.score >= 1.0 {
            break;
        }
        generations = generation + 1;

        let mut children = Vec::with_capacity(size - elite);
        while children.len() < size - elite {
            let a = tournament(&mut rng, &population).weights;
            let b = tournament(&mut rng, &population).weights;
            let mut child = crossover(&mut rng, &a, &b);
            mutate(&mut rng, &mut child, options.mutation_rate);
            children.push(child);
        }
        let mut next: Vec<Candidate> = population[..elite].to_vec();
        next.extend(score_all(children));
        population = next;
    }
    population.sort_by(by_score_desc);
    if population[0].score > best.score {
        best = population[0];
    }

    let best_weights = ScoringWeights::from_array(best.weights);
    debug!(?best_weights, best_score = best.score, generations, "optimization finished");
    OptimizationResult {
        best_weights,
        best_score: best.score,
        generations,
        outcomes: outcomes_for(translator, best_weights, corpus),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translator() -> Translator {
        Translator::builtin().unwrap()
    }

    #[test]
    fn bundled_corpus_parses() {
        let corpus = builtin_wsd_corpus().unwrap();
        assert!(corpus.len() >= 20);
        assert!(corpus.iter().any(|c| c.direction == Direction::EnKo));
    }

    #[test]
    fn default_weights_resolve_tea_and_car() {
        let t = translator();
        let corpus = builtin_wsd_corpus().unwrap();
        let cases: Vec<WsdCase> = corpus.into_iter().filter(|c| c.id == "cha-2" || c.id == "cha-4").collect();
        assert_eq!(evaluate_weights(&t, ScoringWeights::default(), &cases), 1.0);
    }

    #[test]
    fn optimizer_is_reproducible_and_never_regresses() {
        let t = translator();
        let corpus = builtin_wsd_corpus().unwrap();
        let options = OptimizerOptions { population_size: 6, generations: 3, elite_count: 2, ..Default::default() };
        let baseline = evaluate_weights(&t, ScoringWeights::default(), &corpus);
        let a = optimize_weights(&t, ScoringWeights::default(), &corpus, options);
        let b = optimize_weights(&t, ScoringWeights::default(), &corpus, options);
        assert_eq!(a, b);
        assert!(a.best_score >= baseline);
        assert_eq!(a.outcomes.len(), corpus.len());
    }

    #[test]
    fn empty_corpus_scores_zero() {
        assert_eq!(evaluate_weights(&translator(), ScoringWeights::default(), &[]), 0.0);
    }
}
