// Duration quantization against an acceptable-duration whitelist.
//
// The time-step encoder assumes every duration comes from a known set of
// quarter-length values, so the corpus pass vets each score first. A scan
// rejects the whole score on a non-positive duration and reports any
// positive duration missing from the set; the caller then decides whether
// to widen the set with the novel values and keep the score. The scan
// itself never mutates its inputs, and `has_acceptable_durations` is a
// pure predicate — widening is a separate, explicit step.

use crate::error::PipelineError;
use crate::score::Score;
use log::warn;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Quarter-length durations accepted by default: 16th note through whole
/// note, including the common dotted values.
pub const DEFAULT_DURATIONS: [f64; 8] = [0.25, 0.5, 0.75, 1.0, 1.5, 2.0, 3.0, 4.0];

/// The ordered set of quarter-length durations the pipeline accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationSet {
    values: BTreeSet<OrderedFloat<f64>>,
}

impl Default for DurationSet {
    fn default() -> Self {
        Self::new(&DEFAULT_DURATIONS)
    }
}

impl DurationSet {
    pub fn new(durations: &[f64]) -> Self {
        DurationSet {
            values: durations.iter().copied().map(OrderedFloat).collect(),
        }
    }

    pub fn contains(&self, duration: f64) -> bool {
        self.values.contains(&OrderedFloat(duration))
    }

    /// Add novel durations to the set. The only mutation path; scans never
    /// call this themselves.
    pub fn widen(&mut self, novel: &[f64]) {
        self.values.extend(novel.iter().copied().map(OrderedFloat));
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The accepted durations in ascending order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().map(|v| v.into_inner())
    }
}

/// Result of scanning a score's durations: the positive durations that are
/// not yet in the acceptable set, deduplicated, in encounter order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DurationScan {
    pub novel: Vec<f64>,
}

impl DurationScan {
    /// True when every duration was already acceptable.
    pub fn is_clean(&self) -> bool {
        self.novel.is_empty()
    }
}

/// Scan every note/rest/chord duration in a score.
///
/// Fails with `InvalidDuration` on the first non-positive duration — the
/// whole score is unusable. Otherwise returns the novel durations for the
/// caller to `widen` with. Unknown event kinds carry no duration and are
/// ignored here; the encoder accounts for them.
pub fn scan_durations(score: &Score, set: &DurationSet) -> Result<DurationScan, PipelineError> {
    let mut novel: Vec<f64> = Vec::new();
    for event in score.flatten() {
        let Some(duration) = event.duration() else {
            continue;
        };
        if duration <= 0.0 {
            return Err(PipelineError::InvalidDuration { duration });
        }
        if !set.contains(duration) && !novel.contains(&duration) {
            warn!("unacceptable duration {duration} found");
            novel.push(duration);
        }
    }
    Ok(DurationScan { novel })
}

/// Pure predicate: true when every duration is positive and already in the
/// set. Never mutates anything.
pub fn has_acceptable_durations(score: &Score, set: &DurationSet) -> bool {
    score.flatten().all(|event| match event.duration() {
        Some(duration) => duration > 0.0 && set.contains(duration),
        None => true,
    })
}
