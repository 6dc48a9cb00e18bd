//! Classification metrics.
//!
//! Metrics are evaluation helpers (they do not participate in backprop).

use std::cmp::Ordering;

/// Index of the largest entry, ties broken by first occurrence.
///
/// NaN entries never win. Returns `None` for an empty slice.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            // Only a strictly greater value replaces the best, so NaN never does.
            Some((_, b)) if v.partial_cmp(&b) != Some(Ordering::Greater) => {}
            None if v.is_nan() => {}
            _ => best = Some((i, v)),
        }
    }
    // All-NaN input still has a (meaningless) first index.
    best.map(|(i, _)| i)
        .or_else(|| (!values.is_empty()).then_some(0))
}

/// Outcome of evaluating a network against labeled examples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalReport {
    pub correct: usize,
    pub total: usize,
}

impl EvalReport {
    /// Fraction of correctly classified examples; `0.0` when `total == 0`.
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_first_occurrence_wins_ties() {
        assert_eq!(argmax(&[0.1, 0.9, 0.9, 0.2]), Some(1));
        assert_eq!(argmax(&[0.5, 0.5]), Some(0));
        assert_eq!(argmax(&[3.0]), Some(0));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn argmax_skips_nan() {
        assert_eq!(argmax(&[f64::NAN, 0.2, 0.1]), Some(1));
        assert_eq!(argmax(&[0.2, f64::NAN, 0.7]), Some(2));
        assert_eq!(argmax(&[f64::NAN, f64::NAN]), Some(0));
    }

    #[test]
    fn accuracy_handles_empty() {
        assert_eq!(EvalReport { correct: 0, total: 0 }.accuracy(), 0.0);
        assert_eq!(EvalReport { correct: 3, total: 4 }.accuracy(), 0.75);
    }
}
