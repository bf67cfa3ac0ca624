// Cantilena preprocessing — CLI entry point.
//
// Walks a dataset of score JSON files and produces everything generation
// needs: per-song encoded token files, the delimiter-joined single-file
// corpus, the vocabulary mapping, and a trained n-gram model. Also reports
// how many training pairs the corpus yields at the configured sequence
// length, for anyone training an external model on the same corpus.
//
// Usage:
//   cargo run --bin preprocess -- [--dataset DIR] [--encoded DIR]
//     [--corpus PATH] [--mapping PATH] [--model PATH] [--seq-len N]
//     [--time-step T]

use cantilena::config::PipelineConfig;
use cantilena::corpus::{build_single_file_corpus, preprocess};
use cantilena::predict::NgramPredictor;
use cantilena::quantize::DurationSet;
use cantilena::vocab::Vocabulary;
use cantilena::window::training_pairs;

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();

    let mut config = PipelineConfig::default();
    if let Some(dir) = parse_flag(&args, "--dataset") {
        config.dataset_dir = dir;
    }
    if let Some(dir) = parse_flag(&args, "--encoded") {
        config.encoded_dir = dir;
    }
    if let Some(path) = parse_flag(&args, "--corpus") {
        config.corpus_path = path;
    }
    if let Some(path) = parse_flag(&args, "--mapping") {
        config.mapping_path = path;
    }
    if let Some(path) = parse_flag(&args, "--model") {
        config.model_path = path;
    }
    if let Some(n) = parse_flag(&args, "--seq-len") {
        config.sequence_length = n;
    }
    if let Some(step) = parse_flag(&args, "--time-step") {
        config.time_step = step;
    }

    println!("=== Cantilena Preprocessing ===");
    println!("Dataset: {}", config.dataset_dir.display());
    println!("Sequence length: {}", config.sequence_length);
    println!("Time step: {} quarter-lengths", config.time_step);
    println!();

    println!("[1/4] Encoding scores...");
    let mut durations = DurationSet::default();
    let stats = match preprocess(&config, &mut durations) {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("  Error preprocessing dataset: {e}");
            std::process::exit(1);
        }
    };
    println!(
        "  {} loaded, {} parse failures, {} rejected, {} encoded.",
        stats.loaded, stats.failed_parse, stats.rejected, stats.encoded
    );
    if stats.skipped_events > 0 {
        println!("  {} events skipped during encoding.", stats.skipped_events);
    }

    println!("[2/4] Building single-file corpus...");
    let corpus_text = match build_single_file_corpus(
        &config.encoded_dir,
        &config.corpus_path,
        config.sequence_length,
    ) {
        Ok(corpus) => corpus,
        Err(e) => {
            eprintln!("  Error building corpus: {e}");
            std::process::exit(1);
        }
    };
    println!(
        "  {} tokens -> {}",
        corpus_text.split_whitespace().count(),
        config.corpus_path.display()
    );

    println!("[3/4] Building vocabulary...");
    let vocab = Vocabulary::build(&corpus_text);
    if let Err(e) = vocab.save(&config.mapping_path) {
        eprintln!("  Error saving mapping: {e}");
        std::process::exit(1);
    }
    println!(
        "  {} distinct tokens -> {}",
        vocab.len(),
        config.mapping_path.display()
    );

    println!("[4/4] Training n-gram model...");
    let corpus_ids = match vocab.encode_text(&corpus_text) {
        Ok(ids) => ids,
        Err(e) => {
            eprintln!("  Error mapping corpus to IDs: {e}");
            std::process::exit(1);
        }
    };
    let pairs = training_pairs(&corpus_ids, config.sequence_length);
    println!(
        "  {} training pairs at sequence length {}.",
        pairs.len(),
        config.sequence_length
    );
    let model = NgramPredictor::train(&corpus_ids, vocab.len());
    if let Err(e) = model.save(&config.model_path) {
        eprintln!("  Error saving model: {e}");
        std::process::exit(1);
    }
    println!("  Model -> {}", config.model_path.display());
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}
