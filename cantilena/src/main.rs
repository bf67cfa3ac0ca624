// Cantilena melody generation — CLI entry point.
//
// Loads the persisted vocabulary and n-gram model, samples a melody from
// a seed, decodes it, and writes a MIDI file.
//
// Usage:
//   cargo run --bin generate -- [output.mid] [--seed "60 _ 62 _"] [--steps N]
//     [--temperature T] [--max-seq-len N] [--tempo BPM] [--mapping PATH]
//     [--model PATH] [--rng-seed N]

use cantilena::config::PipelineConfig;
use cantilena::decode::decode_melody;
use cantilena::midi::write_melody_midi;
use cantilena::predict::{NgramPredictor, Predictor};
use cantilena::sample::{GeneratorConfig, MelodyGenerator};
use cantilena::vocab::Vocabulary;
use cantilena_prng::MelodyRng;
use std::path::PathBuf;

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();

    let defaults = PipelineConfig::default();
    let output_path: PathBuf = args
        .get(1)
        .filter(|s| !s.starts_with("--"))
        .map(PathBuf::from)
        .unwrap_or(defaults.output_path);
    let seed_text: String =
        parse_flag(&args, "--seed").unwrap_or_else(|| "60 _ 62 _ 64 _".to_string());
    let num_steps: usize = parse_flag(&args, "--steps").unwrap_or(250);
    let temperature: f64 = parse_flag(&args, "--temperature").unwrap_or(0.9);
    let max_seq_len: usize =
        parse_flag(&args, "--max-seq-len").unwrap_or(defaults.sequence_length);
    let tempo: u16 = parse_flag(&args, "--tempo").unwrap_or(120);
    let mapping_path: PathBuf = parse_flag(&args, "--mapping").unwrap_or(defaults.mapping_path);
    let model_path: PathBuf = parse_flag(&args, "--model").unwrap_or(defaults.model_path);
    let rng_seed: u64 = parse_flag(&args, "--rng-seed").unwrap_or_else(entropy_seed);

    println!("=== Cantilena Melody Generator ===");
    println!("Seed: \"{seed_text}\"");
    println!("Temperature: {temperature}");
    println!("Max steps: {num_steps}");
    println!("RNG seed: {rng_seed}");
    println!();

    println!("[1/4] Loading vocabulary from {}...", mapping_path.display());
    let vocab = match Vocabulary::load(&mapping_path) {
        Ok(vocab) => vocab,
        Err(e) => {
            eprintln!("  Error loading vocabulary: {e}");
            eprintln!("  Run the preprocess binary first.");
            std::process::exit(1);
        }
    };
    println!("  {} tokens.", vocab.len());

    println!("[2/4] Loading model...");
    let model = if model_path.exists() {
        match NgramPredictor::load(&model_path) {
            Ok(model) => {
                println!("  Loaded {}.", model_path.display());
                model
            }
            Err(e) => {
                println!(
                    "  Failed to load {}: {e}. Using uniform model.",
                    model_path.display()
                );
                NgramPredictor::untrained(vocab.len())
            }
        }
    } else {
        println!(
            "  No model file at {}. Using uniform model.",
            model_path.display()
        );
        NgramPredictor::untrained(vocab.len())
    };
    let model = if model.vocab_size() == vocab.len() {
        model
    } else {
        println!(
            "  Model vocabulary size {} does not match mapping ({}). Using uniform model.",
            model.vocab_size(),
            vocab.len()
        );
        NgramPredictor::untrained(vocab.len())
    };

    println!("[3/4] Sampling melody...");
    let generator_config = GeneratorConfig {
        num_steps,
        max_seq_len,
        temperature,
        sequence_length: defaults.sequence_length,
    };
    let generator = MelodyGenerator::new(&vocab, &model, generator_config);
    let mut rng = MelodyRng::new(rng_seed);
    let melody = match generator.generate(&seed_text, &mut rng) {
        Ok(melody) => melody,
        Err(e) => {
            eprintln!("  Error generating melody: {e}");
            std::process::exit(1);
        }
    };
    let seed_len = seed_text.split_whitespace().count();
    println!(
        "  {} tokens ({} generated).",
        melody.len(),
        melody.len() - seed_len
    );

    println!("[4/4] Writing MIDI to {}...", output_path.display());
    let events = match decode_melody(&melody, defaults.time_step) {
        Ok(events) => events,
        Err(e) => {
            eprintln!("  Error decoding melody: {e}");
            std::process::exit(1);
        }
    };
    match write_melody_midi(&events, &output_path, tempo) {
        Ok(()) => {
            println!("  Done! {} events.", events.len());
        }
        Err(e) => {
            eprintln!("  Error writing MIDI: {e}");
            std::process::exit(1);
        }
    }

    println!();
    println!(
        "Play with: timidity {} (or any MIDI player)",
        output_path.display()
    );
}

/// Seed from the wall clock when the caller didn't pin one.
fn entropy_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}
