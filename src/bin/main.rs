use anyhow::Context;
use clap::Parser;
use crossterm::style::Stylize;
use crossterm::{execute, terminal};
use hanyeong_core::core::engine::Translator;
use hanyeong_core::persistence::{load_entries, load_weights};
use hanyeong_core::{
    load_config_from_file, Direction, DictionaryStore, EntityTracker, Formality, TranslateOptions, TranslationResult,
    TranslatorConfig,
};
use std::io::{stdin, stdout, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Rule-based Korean <-> English translator
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Text to translate; starts an interactive session when omitted
    text: Option<String>,

    /// ko-en or en-ko
    #[arg(short, long, default_value = "ko-en")]
    direction: Direction,

    /// casual, formal, neutral, friendly or literal
    #[arg(short, long)]
    formality: Option<Formality>,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Extra dictionary entries (JSON partition or array)
    #[arg(long)]
    entries: Option<PathBuf>,

    /// Tuned weights written by run_wsd_tests --save-weights
    #[arg(long)]
    weights: Option<PathBuf>,

    /// Print confidence, matched entries and warnings
    #[arg(long)]
    diag: bool,
}

fn build_translator(args: &Args) -> anyhow::Result<Translator> {
    let mut config = match &args.config {
        Some(path) => load_config_from_file(path).with_context(|| format!("loading {}", path.display()))?,
        None => TranslatorConfig::default(),
    };
    if let Some(path) = &args.weights {
        config.weights = load_weights(path).with_context(|| format!("loading {}", path.display()))?.weights;
    }
    let mut builder = DictionaryStore::builder().with_builtin()?;
    if let Some(path) = &args.entries {
        let report = builder.inject(load_entries(path)?)?;
        tracing::info!(?report, "host entries injected");
    }
    Ok(Translator::with_config(Arc::new(builder.build()), config))
}

fn print_result(result: &TranslationResult, diag: bool) {
    println!("{}", result.output().bold());
    if !diag {
        return;
    }
    println!("  {} {:.2}", "confidence".dark_grey(), result.confidence());
    let matched: Vec<&str> = result.matched_entries().iter().map(|e| e.headword.as_str()).collect();
    if !matched.is_empty() {
        println!("  {} {}", "matched".dark_grey(), matched.join(", "));
    }
    for warning in result.warning_messages() {
        println!("  {} {}", "warning".yellow(), warning);
    }
}

fn print_banner(direction: Direction, formality: Option<Formality>, diag: bool) -> anyhow::Result<()> {
    execute!(stdout(), terminal::Clear(terminal::ClearType::All), crossterm::cursor::MoveTo(0, 0))?;
    println!("{}", "Hanyeong translator".bold());
    println!("---------------------------------------------------------------");
    println!(":ko / :en switch direction, :formal :friendly :casual :neutral :literal");
    println!(":diag toggles diagnostics, :reset forgets the conversation, 'exit' quits.\n");
    println!(
        "direction {}  formality {}  diagnostics {}",
        direction.as_str().cyan(),
        formality.map_or("auto".to_string(), |f| format!("{:?}", f).to_lowercase()).cyan(),
        if diag { "on" } else { "off" }.cyan()
    );
    Ok(())
}

fn repl(translator: &Translator, args: &Args) -> anyhow::Result<()> {
    let mut direction = args.direction;
    let mut formality = args.formality;
    let mut diag = args.diag;
    let mut tracker: EntityTracker = translator.new_tracker();
    print_banner(direction, formality, diag)?;

    loop {
        print!("\n{} ", format!("{}>", direction.as_str()).green());
        stdout().flush()?;
        let mut line = String::new();
        if stdin().read_line(&mut line)? == 0 {
            break;
        }
        let cmd = line.trim();
        match cmd {
            "exit" | ":q" => break,
            "" => continue,
            ":ko" => direction = Direction::KoEn,
            ":en" => direction = Direction::EnKo,
            ":diag" => diag = !diag,
            ":reset" => tracker.clear(),
            ":clear" => print_banner(direction, formality, diag)?,
            s if s.starts_with(':') => match s[1..].parse::<Formality>() {
                Ok(f) => formality = Some(f),
                Err(e) => println!("{}", e.red()),
            },
            text => {
                match translator.translate_in_conversation(text, direction, TranslateOptions { formality }, &mut tracker) {
                    Ok(result) => print_result(&result, diag),
                    Err(e) => println!("{}", e.to_string().red()),
                }
            }
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();
    let translator = build_translator(&args)?;

    match &args.text {
        Some(text) => {
            let result = translator.translate_with_diagnostics(text, args.direction, TranslateOptions { formality: args.formality })?;
            print_result(&result, args.diag);
            Ok(())
        }
        None => repl(&translator, &args),
    }
}
