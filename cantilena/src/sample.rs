// Temperature-controlled autoregressive melody sampling.
//
// Generation mirrors the training-time representation: the raw seed is
// padded with a run of delimiter start symbols, mapped to integer IDs,
// and the predictor produces a next-token distribution that is
// temperature-rescaled and sampled. Sampling the delimiter ends the
// melody early (the delimiter itself is never emitted); otherwise the
// loop runs until the step budget is spent.
//
// The injected `MelodyRng` is the only source of randomness, so a fixed
// seed reproduces a melody exactly. The predictor call is the one
// long-latency step per iteration; an optional cancellation flag is
// checked between iterations so a caller can abort a slow generation.

use crate::error::PipelineError;
use crate::predict::Predictor;
use crate::symbol::DELIMITER_TOKEN;
use crate::vocab::{TokenId, Vocabulary};
use cantilena_prng::MelodyRng;
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};

/// Sampler parameters.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Maximum number of tokens to generate.
    pub num_steps: usize,
    /// Longest context window handed to the predictor.
    pub max_seq_len: usize,
    /// Sampling sharpness: toward 0 approaches argmax, large values
    /// approach uniform. Must be finite and > 0.
    pub temperature: f64,
    /// Length of the delimiter run used as start padding (the training
    /// sequence length).
    pub sequence_length: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            num_steps: 128,
            max_seq_len: 64,
            temperature: 1.0,
            sequence_length: 64,
        }
    }
}

/// Autoregressive melody generator over a read-only vocabulary and an
/// opaque next-token predictor.
pub struct MelodyGenerator<'a> {
    vocab: &'a Vocabulary,
    predictor: &'a dyn Predictor,
    config: GeneratorConfig,
}

impl<'a> MelodyGenerator<'a> {
    pub fn new(
        vocab: &'a Vocabulary,
        predictor: &'a dyn Predictor,
        config: GeneratorConfig,
    ) -> Self {
        MelodyGenerator {
            vocab,
            predictor,
            config,
        }
    }

    /// Generate a melody from a whitespace-separated seed string.
    ///
    /// Returns the seed tokens plus every sampled token, delimiter
    /// excluded.
    pub fn generate(
        &self,
        seed: &str,
        rng: &mut MelodyRng,
    ) -> Result<Vec<String>, PipelineError> {
        self.generate_with_cancel(seed, None, rng)
    }

    /// Like `generate`, but checks `cancel` between iterations and returns
    /// the melody produced so far once the flag is set.
    pub fn generate_with_cancel(
        &self,
        seed: &str,
        cancel: Option<&AtomicBool>,
        rng: &mut MelodyRng,
    ) -> Result<Vec<String>, PipelineError> {
        let temperature = self.config.temperature;
        if !temperature.is_finite() || temperature <= 0.0 {
            return Err(PipelineError::InvalidTemperature { temperature });
        }
        if self.vocab.is_empty() {
            return Err(PipelineError::VocabCorrupt {
                reason: "empty vocabulary".to_string(),
            });
        }

        let seed_tokens: Vec<String> = seed.split_whitespace().map(str::to_string).collect();
        let mut melody = seed_tokens.clone();

        // Delimiter start padding, only when the delimiter is in the
        // vocabulary (an all-one-song corpus has none).
        let mut context: Vec<TokenId> = Vec::new();
        if let Ok(delimiter) = self.vocab.id(DELIMITER_TOKEN) {
            context.extend(std::iter::repeat_n(delimiter, self.config.sequence_length));
        } else {
            debug!("delimiter not in vocabulary; generating without start padding");
        }
        for token in &seed_tokens {
            context.push(self.vocab.id(token)?);
        }

        for _ in 0..self.config.num_steps {
            if let Some(flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    debug!("generation cancelled after {} tokens", melody.len());
                    break;
                }
            }

            let start = context.len().saturating_sub(self.config.max_seq_len);
            let probs = self.predictor.predict(&context[start..]);
            if probs.len() != self.vocab.len() {
                return Err(PipelineError::PredictorShape {
                    expected: self.vocab.len(),
                    got: probs.len(),
                });
            }

            let next = sample_with_temperature(&probs, temperature, rng) as TokenId;
            context.push(next);

            let Some(token) = self.vocab.token(next) else {
                return Err(PipelineError::VocabCorrupt {
                    reason: format!("sampled id {next} out of range"),
                });
            };
            if token == DELIMITER_TOKEN {
                break;
            }
            melody.push(token.to_string());
        }

        Ok(melody)
    }
}

/// Rescale a probability vector by temperature and draw one index.
///
/// ln(p) / T, exponentiate, renormalize: the categorical draw over the
/// rescaled weights divides by their sum implicitly. Log-weights are
/// shifted by their maximum before exponentiating so small temperatures
/// cannot underflow every weight to zero. Zero-probability entries stay
/// at zero (ln 0 = -inf).
pub(crate) fn sample_with_temperature(
    probs: &[f64],
    temperature: f64,
    rng: &mut MelodyRng,
) -> usize {
    debug_assert!(!probs.is_empty());
    let logits: Vec<f64> = probs.iter().map(|&p| p.ln() / temperature).collect();
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        // Degenerate input (all zeros): nothing to prefer.
        return rng.range_usize(0, probs.len());
    }

    let weights: Vec<f64> = logits.iter().map(|&l| (l - max).exp()).collect();
    let total: f64 = weights.iter().sum();
    let target = rng.next_f64() * total;
    let mut cumulative = 0.0;
    for (i, &weight) in weights.iter().enumerate() {
        cumulative += weight;
        if cumulative > target {
            return i;
        }
    }
    probs.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Predictor that always returns the same distribution.
    struct Fixed {
        probs: Vec<f64>,
    }

    impl Predictor for Fixed {
        fn vocab_size(&self) -> usize {
            self.probs.len()
        }

        fn predict(&self, _context: &[TokenId]) -> Vec<f64> {
            self.probs.clone()
        }
    }

    fn vocab_4() -> Vocabulary {
        // Sorted IDs: "/" = 0, "60" = 1, "_" = 2, "r" = 3.
        Vocabulary::build("60 _ r /")
    }

    fn config(num_steps: usize, temperature: f64) -> GeneratorConfig {
        GeneratorConfig {
            num_steps,
            max_seq_len: 8,
            temperature,
            sequence_length: 4,
        }
    }

    #[test]
    fn non_positive_temperature_is_rejected() {
        let vocab = vocab_4();
        let predictor = Fixed {
            probs: vec![0.25; 4],
        };
        let mut rng = MelodyRng::new(1);
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let generator = MelodyGenerator::new(&vocab, &predictor, config(4, bad));
            let err = generator.generate("60", &mut rng).unwrap_err();
            assert!(matches!(err, PipelineError::InvalidTemperature { .. }));
        }
    }

    #[test]
    fn unknown_seed_token_is_rejected() {
        let vocab = vocab_4();
        let predictor = Fixed {
            probs: vec![0.25; 4],
        };
        let generator = MelodyGenerator::new(&vocab, &predictor, config(4, 1.0));
        let mut rng = MelodyRng::new(1);
        let err = generator.generate("61", &mut rng).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::UnknownSymbol { token } if token == "61"
        ));
    }

    #[test]
    fn delimiter_stops_generation_and_is_never_emitted() {
        let vocab = vocab_4();
        // Delimiter ("/", ID 0) with probability 1.
        let predictor = Fixed {
            probs: vec![1.0, 0.0, 0.0, 0.0],
        };
        let generator = MelodyGenerator::new(&vocab, &predictor, config(100, 1.0));
        let mut rng = MelodyRng::new(1);
        let melody = generator.generate("60 _", &mut rng).unwrap();
        assert_eq!(melody, ["60", "_"]);
    }

    #[test]
    fn step_budget_bounds_the_melody() {
        let vocab = vocab_4();
        // Always "60" (ID 1): never stops on its own.
        let predictor = Fixed {
            probs: vec![0.0, 1.0, 0.0, 0.0],
        };
        let generator = MelodyGenerator::new(&vocab, &predictor, config(5, 1.0));
        let mut rng = MelodyRng::new(1);
        let melody = generator.generate("r", &mut rng).unwrap();
        assert_eq!(melody.len(), 6);
        assert!(melody[1..].iter().all(|t| t == "60"));
    }

    #[test]
    fn generation_is_deterministic_for_a_fixed_rng_seed() {
        let vocab = vocab_4();
        let predictor = Fixed {
            probs: vec![0.1, 0.4, 0.3, 0.2],
        };
        let generator = MelodyGenerator::new(&vocab, &predictor, config(32, 1.0));

        let mut rng_a = MelodyRng::new(77);
        let mut rng_b = MelodyRng::new(77);
        let a = generator.generate("60", &mut rng_a).unwrap();
        let b = generator.generate("60", &mut rng_b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn cancellation_returns_the_melody_so_far() {
        let vocab = vocab_4();
        let predictor = Fixed {
            probs: vec![0.0, 1.0, 0.0, 0.0],
        };
        let generator = MelodyGenerator::new(&vocab, &predictor, config(1000, 1.0));
        let cancel = AtomicBool::new(true);
        let mut rng = MelodyRng::new(1);
        let melody = generator
            .generate_with_cancel("60 _", Some(&cancel), &mut rng)
            .unwrap();
        assert_eq!(melody, ["60", "_"]);
    }

    #[test]
    fn predictor_shape_mismatch_is_an_error() {
        let vocab = vocab_4();
        let predictor = Fixed {
            probs: vec![0.5, 0.5],
        };
        let generator = MelodyGenerator::new(&vocab, &predictor, config(4, 1.0));
        let mut rng = MelodyRng::new(1);
        let err = generator.generate("60", &mut rng).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::PredictorShape {
                expected: 4,
                got: 2,
            }
        ));
    }

    #[test]
    fn temperature_one_keeps_a_uniform_distribution_uniform() {
        let probs = vec![0.25; 4];
        let mut rng = MelodyRng::new(42);
        let mut counts = [0usize; 4];
        let draws = 20_000;
        for _ in 0..draws {
            counts[sample_with_temperature(&probs, 1.0, &mut rng)] += 1;
        }
        // Each outcome should land near draws/4; allow 10% relative slack.
        let expected = draws / 4;
        for (i, &count) in counts.iter().enumerate() {
            assert!(
                count.abs_diff(expected) < expected / 10,
                "outcome {i} drawn {count} times, expected ~{expected}"
            );
        }
    }

    #[test]
    fn low_temperature_sharpens_toward_argmax() {
        let probs = vec![0.2, 0.5, 0.3];
        let mut rng = MelodyRng::new(7);
        let mut argmax = 0;
        let draws = 2_000;
        for _ in 0..draws {
            if sample_with_temperature(&probs, 0.05, &mut rng) == 1 {
                argmax += 1;
            }
        }
        assert!(argmax > draws * 99 / 100, "argmax drawn {argmax}/{draws}");
    }

    #[test]
    fn high_temperature_flattens_the_distribution() {
        let probs = vec![0.9, 0.1];
        let mut rng = MelodyRng::new(7);
        let mut rare = 0;
        let draws = 10_000;
        for _ in 0..draws {
            if sample_with_temperature(&probs, 100.0, &mut rng) == 1 {
                rare += 1;
            }
        }
        // At T=100 the 0.9/0.1 split is nearly even; the rare outcome
        // should appear far more often than its raw 10%.
        assert!(rare > draws * 4 / 10, "rare outcome drawn {rare}/{draws}");
    }

    #[test]
    fn zero_probability_entries_are_never_drawn() {
        let probs = vec![0.0, 1.0, 0.0];
        let mut rng = MelodyRng::new(3);
        for _ in 0..1_000 {
            assert_eq!(sample_with_temperature(&probs, 0.7, &mut rng), 1);
        }
    }
}
