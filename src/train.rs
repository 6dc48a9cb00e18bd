//! Mini-batch stochastic gradient descent and evaluation.
//!
//! Epochs run strictly in sequence and so do the mini-batches inside an epoch: each
//! batch starts from the parameters left by the previous one.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info, trace};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::metrics::argmax;
use crate::network::check_learning_rate;
use crate::{Error, EvalReport, LabeledExample, Network, Result, Scratch, TrainingExample};

/// How training examples are reordered at the start of every epoch.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shuffle {
    /// Uniform shuffle from a freshly seeded RNG per `train` call.
    #[default]
    Random,
    /// Reproducible uniform shuffle; the RNG is seeded once per `train` call.
    Seeded(u64),
    /// Keep the input order.
    None,
}

/// Hyperparameters for [`Network::train`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SgdConfig {
    pub epochs: usize,
    /// The last mini-batch of an epoch is shorter when this does not divide the
    /// training set size.
    pub mini_batch_size: usize,
    pub learning_rate: f64,
    pub shuffle: Shuffle,
}

impl Default for SgdConfig {
    fn default() -> Self {
        Self {
            epochs: 30,
            mini_batch_size: 10,
            learning_rate: 3.0,
            shuffle: Shuffle::Random,
        }
    }
}

impl SgdConfig {
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(Error::InvalidConfig("epochs must be > 0".to_owned()));
        }
        if self.mini_batch_size == 0 {
            return Err(Error::InvalidConfig(
                "mini_batch_size must be > 0".to_owned(),
            ));
        }
        check_learning_rate(self.learning_rate)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpochReport {
    /// 0-based epoch index.
    pub epoch: usize,
    pub mini_batches: usize,
    /// Validation result after the epoch, when validation data was supplied.
    pub validation: Option<EvalReport>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainReport {
    pub epochs: Vec<EpochReport>,
}

impl TrainReport {
    /// Validation result of the last epoch, if any.
    pub fn final_validation(&self) -> Option<EvalReport> {
        self.epochs.last().and_then(|e| e.validation)
    }
}

fn at_example(set: &str, idx: usize, err: Error) -> Error {
    match err {
        Error::InvalidShape(msg) => Error::InvalidShape(format!("{set} example {idx}: {msg}")),
        Error::InvalidData(msg) => Error::InvalidData(format!("{set} example {idx}: {msg}")),
        other => other,
    }
}

impl Network {
    /// Train with mini-batch SGD.
    ///
    /// Every example (training and validation) is shape-checked before the first
    /// update, so a bad example never leaves the network half-trained. When
    /// `validation` is given, the network is evaluated after each epoch and the
    /// result is logged and recorded in the report.
    pub fn train(
        &mut self,
        training: &[TrainingExample],
        validation: Option<&[LabeledExample]>,
        cfg: &SgdConfig,
    ) -> Result<TrainReport> {
        cfg.validate()?;
        if training.is_empty() {
            return Err(Error::InvalidData(
                "training set must not be empty".to_owned(),
            ));
        }
        for (i, ex) in training.iter().enumerate() {
            self.check_input(&ex.input)
                .and_then(|()| self.check_target(&ex.target))
                .map_err(|e| at_example("training", i, e))?;
        }
        if let Some(v) = validation {
            self.check_labeled(v)?;
        }

        let mut rng = match cfg.shuffle {
            Shuffle::Random => Some(StdRng::from_rng(&mut rand::rng())),
            Shuffle::Seeded(seed) => Some(StdRng::seed_from_u64(seed)),
            Shuffle::None => None,
        };

        let mut order: Vec<usize> = (0..training.len()).collect();
        let mut trainer = self.trainer();
        let mut eval_scratch = self.scratch();
        let batches = training.len().div_ceil(cfg.mini_batch_size);
        let mut epochs = Vec::with_capacity(cfg.epochs);

        for epoch in 0..cfg.epochs {
            if let Some(rng) = rng.as_mut() {
                order.shuffle(rng);
            }

            for (b, chunk) in order.chunks(cfg.mini_batch_size).enumerate() {
                debug!(epoch, batch = b + 1, batches, "processing mini-batch");
                self.apply_batch(
                    &mut trainer,
                    chunk.iter().map(|&i| &training[i]),
                    chunk.len(),
                    cfg.learning_rate,
                )?;
            }

            let epoch_validation = match validation {
                Some(v) => Some(self.evaluate_with(v, &mut eval_scratch)?),
                None => None,
            };
            match epoch_validation {
                Some(r) => info!(
                    epoch,
                    correct = r.correct,
                    total = r.total,
                    "epoch {}: {} / {} correctly classified",
                    epoch,
                    r.correct,
                    r.total
                ),
                None => info!(epoch, batches, "epoch {} complete", epoch),
            }

            epochs.push(EpochReport {
                epoch,
                mini_batches: batches,
                validation: epoch_validation,
            });
        }

        Ok(TrainReport { epochs })
    }

    /// Number of examples whose predicted class (index of the largest output,
    /// first occurrence on ties) equals the expected label.
    pub fn evaluate(&self, examples: &[LabeledExample]) -> Result<usize> {
        Ok(self.evaluate_report(examples)?.correct)
    }

    /// Like [`Network::evaluate`], also reporting the total.
    pub fn evaluate_report(&self, examples: &[LabeledExample]) -> Result<EvalReport> {
        self.check_labeled(examples)?;
        let mut scratch = self.scratch();
        self.evaluate_with(examples, &mut scratch)
    }

    /// Predicted class for one input.
    pub fn classify(&self, input: &[f64]) -> Result<usize> {
        let out = self.feedforward(input)?;
        argmax(&out).ok_or_else(|| Error::Internal("network produced an empty output".to_owned()))
    }

    /// Mean cost `½‖a − y‖²` over `examples`.
    pub fn cost(&self, examples: &[TrainingExample]) -> Result<f64> {
        if examples.is_empty() {
            return Err(Error::InvalidData("examples must not be empty".to_owned()));
        }
        let mut scratch = self.scratch();
        let mut total = 0.0;
        for (i, ex) in examples.iter().enumerate() {
            self.check_target(&ex.target)
                .map_err(|e| at_example("cost", i, e))?;
            let out = self
                .feedforward_into(&ex.input, &mut scratch)
                .map_err(|e| at_example("cost", i, e))?;
            total += 0.5
                * out
                    .iter()
                    .zip(ex.target.iter())
                    .map(|(a, y)| (a - y) * (a - y))
                    .sum::<f64>();
        }
        Ok(total / examples.len() as f64)
    }

    fn evaluate_with(&self, examples: &[LabeledExample], scratch: &mut Scratch) -> Result<EvalReport> {
        let mut correct = 0;
        for ex in examples {
            let out = self.feedforward_into(&ex.input, scratch)?;
            let predicted = argmax(out)
                .ok_or_else(|| Error::Internal("network produced an empty output".to_owned()))?;
            trace!(expected = ex.label, predicted, "evaluated example");
            if predicted == ex.label {
                correct += 1;
            }
        }
        Ok(EvalReport {
            correct,
            total: examples.len(),
        })
    }

    fn check_labeled(&self, examples: &[LabeledExample]) -> Result<()> {
        for (i, ex) in examples.iter().enumerate() {
            self.check_input(&ex.input)
                .map_err(|e| at_example("labeled", i, e))?;
            if ex.label >= self.output_size() {
                return Err(Error::InvalidData(format!(
                    "labeled example {i}: class {} out of range for {} output neurons",
                    ex.label,
                    self.output_size()
                )));
            }
        }
        Ok(())
    }
}
