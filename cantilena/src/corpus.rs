// Corpus construction: from a directory of score files to one token stream.
//
// The offline preprocessing pass: load each score, reject scores with
// invalid durations, widen the duration whitelist with any novel values,
// transpose to C major / A minor, encode to the symbolic alphabet, and
// write each song's token string to its own numbered file. A second pass
// joins the per-song files into a single corpus string with a
// `sequence_length`-long delimiter run after every song, trailing
// whitespace trimmed.
//
// Individual bad scores are logged and skipped — one malformed file must
// not sink a whole dataset — and the counts end up in `PreprocessStats`
// so the caller can see what happened.

use crate::config::PipelineConfig;
use crate::encode::encode_score;
use crate::error::PipelineError;
use crate::quantize::{DurationSet, scan_durations};
use crate::score::Score;
use crate::symbol::{DELIMITER_TOKEN, symbols_to_string};
use crate::transpose::transpose_to_c;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// Outcome counters for a preprocessing run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreprocessStats {
    /// Score files parsed successfully.
    pub loaded: usize,
    /// Score files that failed to parse.
    pub failed_parse: usize,
    /// Scores rejected for non-positive durations.
    pub rejected: usize,
    /// Scores encoded and written out.
    pub encoded: usize,
    /// Events skipped inside otherwise-good scores.
    pub skipped_events: usize,
}

/// Load every `.json` score under `dir`, recursively, in sorted path order.
/// Parse failures are logged and counted, not fatal.
pub fn load_scores(dir: &Path, stats: &mut PreprocessStats) -> Result<Vec<Score>, PipelineError> {
    let mut paths = Vec::new();
    collect_score_paths(dir, &mut paths)?;
    paths.sort();

    let mut scores = Vec::new();
    for path in paths {
        match Score::load(&path) {
            Ok(score) => {
                debug!("loaded {}", path.display());
                scores.push(score);
                stats.loaded += 1;
            }
            Err(e) => {
                warn!("failed to load {}: {e}", path.display());
                stats.failed_parse += 1;
            }
        }
    }
    info!(
        "{} scores loaded, {} failed",
        stats.loaded, stats.failed_parse
    );
    Ok(scores)
}

fn collect_score_paths(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_score_paths(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            out.push(path);
        }
    }
    Ok(())
}

/// Preprocess an entire dataset directory into per-song encoded files.
///
/// The duration set is widened in place with whatever novel values the
/// scans report; pass a fresh `DurationSet::default()` unless a previous
/// run's widened set should carry over.
pub fn preprocess(
    config: &PipelineConfig,
    durations: &mut DurationSet,
) -> Result<PreprocessStats, PipelineError> {
    let mut stats = PreprocessStats::default();
    let scores = load_scores(&config.dataset_dir, &mut stats)?;
    std::fs::create_dir_all(&config.encoded_dir)?;

    for (i, score) in scores.into_iter().enumerate() {
        let scan = match scan_durations(&score, durations) {
            Ok(scan) => scan,
            Err(e) => {
                warn!("score {i} rejected: {e}");
                stats.rejected += 1;
                continue;
            }
        };
        if !scan.is_clean() {
            warn!("score {i}: widening duration set with {:?}", scan.novel);
            durations.widen(&scan.novel);
        }

        let score = transpose_to_c(score);
        let (symbols, encode_stats) = encode_score(&score, config.time_step);
        stats.skipped_events += encode_stats.skipped();

        std::fs::write(
            config.encoded_dir.join(i.to_string()),
            symbols_to_string(&symbols),
        )?;
        stats.encoded += 1;
    }

    Ok(stats)
}

/// Join all encoded songs into one corpus string and write it out.
///
/// Every song is followed by `sequence_length` delimiter tokens; the
/// trailing whitespace is trimmed. Returns the corpus string.
pub fn build_single_file_corpus(
    encoded_dir: &Path,
    corpus_path: &Path,
    sequence_length: usize,
) -> Result<String, PipelineError> {
    let delimiter_run = format!("{DELIMITER_TOKEN} ").repeat(sequence_length);

    let mut paths: Vec<PathBuf> = std::fs::read_dir(encoded_dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()?;
    paths.retain(|path| path.is_file());
    paths.sort();

    let mut corpus = String::new();
    for path in paths {
        let song = std::fs::read_to_string(&path)?;
        let song = song.trim();
        if song.is_empty() {
            debug!("{} encoded to nothing, skipping", path.display());
            continue;
        }
        corpus.push_str(song);
        corpus.push(' ');
        corpus.push_str(&delimiter_run);
    }
    let corpus = corpus.trim_end().to_string();

    std::fs::write(corpus_path, &corpus)?;
    Ok(corpus)
}
