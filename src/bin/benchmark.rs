use anyhow::Context;
use clap::Parser;
use crossterm::style::Stylize;
use hanyeong_core::benchmark::{builtin_benchmark, load_benchmark, run_benchmark};
use hanyeong_core::core::engine::Translator;
use hanyeong_core::learning::{builtin_wsd_corpus, evaluate_weights, load_wsd_corpus, optimize_weights, OptimizerOptions};
use hanyeong_core::persistence::{load_weights, save_weights, WeightSnapshot};
use hanyeong_core::{DictionaryStore, ScoringWeights, TranslatorConfig};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Runs the translation benchmark and the sense-disambiguation tests
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Tune the context scoring weights on the WSD corpus
    #[arg(long)]
    optimize: bool,

    #[arg(long, default_value_t = 50)]
    generations: usize,

    #[arg(long, default_value_t = 20)]
    population: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Start from (and benchmark with) previously saved weights
    #[arg(long)]
    weights: Option<PathBuf>,

    /// Where to write the optimized weights
    #[arg(long)]
    save_weights: Option<PathBuf>,

    /// Benchmark corpus (JSON); the bundled one when omitted
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// WSD corpus (JSON); the bundled one when omitted
    #[arg(long)]
    wsd: Option<PathBuf>,

    /// Print every case, not just failures
    #[arg(short, long)]
    verbose: bool,
}

fn translator_with(dict: &Arc<DictionaryStore>, weights: ScoringWeights) -> Translator {
    let config = TranslatorConfig { weights, ..TranslatorConfig::default() };
    Translator::with_config(Arc::clone(dict), config)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let dict = Arc::new(DictionaryStore::builtin()?);
    let mut weights = match &args.weights {
        Some(path) => load_weights(path).with_context(|| format!("loading {}", path.display()))?.weights,
        None => ScoringWeights::default(),
    };
    let wsd = match &args.wsd {
        Some(path) => load_wsd_corpus(&fs::read_to_string(path)?)?,
        None => builtin_wsd_corpus()?,
    };

    let translator = translator_with(&dict, weights);
    let wsd_score = evaluate_weights(&translator, weights, &wsd);
    println!("WSD: {:.1}% over {} cases", wsd_score * 100.0, wsd.len());

    if args.optimize {
        let options = OptimizerOptions {
            population_size: args.population,
            generations: args.generations,
            seed: args.seed,
            ..OptimizerOptions::default()
        };
        let result = optimize_weights(&translator, weights, &wsd, options);
        println!(
            "optimized: {:.1}% -> {:.1}% after {} generations",
            wsd_score * 100.0,
            result.best_score * 100.0,
            result.generations
        );
        println!("{:#?}", result.best_weights);
        for outcome in result.outcomes.iter().filter(|o| !o.passed) {
            println!(
                "  {} {}: expected {}, got {}",
                "FAIL".red(),
                outcome.id,
                outcome.expected_sense,
                outcome.actual_sense.as_deref().unwrap_or("-")
            );
        }
        if let Some(path) = &args.save_weights {
            save_weights(&WeightSnapshot { weights: result.best_weights, score: result.best_score }, path)?;
            println!("weights saved to '{}'", path.display());
        }
        weights = result.best_weights;
    }

    let cases = match &args.corpus {
        Some(path) => load_benchmark(&fs::read_to_string(path)?)?,
        None => builtin_benchmark()?,
    };
    let report = run_benchmark(&translator_with(&dict, weights), &cases);
    for d in &report.details {
        if d.passed && !args.verbose {
            continue;
        }
        let mark = if d.passed { "PASS".green() } else { "FAIL".red() };
        println!("  {} [{}] {} -> {} (expected {}, {:.2})", mark, d.category, d.input, d.actual, d.expected, d.score);
    }
    for (category, (passed, total)) in report.by_category() {
        println!("  {:<14} {}/{}", category, passed, total);
    }
    println!(
        "benchmark: {} passed / {} total, score {:.3}",
        report.passed.to_string().bold(),
        report.total,
        report.score
    );
    Ok(())
}
