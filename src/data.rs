//! Labeled examples.
//!
//! Training uses `(input, target)` pairs; evaluation uses `(input, class)` pairs where
//! `class` is the index of the output neuron expected to fire hardest.

use crate::{Error, Result, Vector};

/// An `(input, target)` pair for training.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    pub input: Vector,
    pub target: Vector,
}

impl TrainingExample {
    pub fn new(input: impl Into<Vector>, target: impl Into<Vector>) -> Self {
        Self {
            input: input.into(),
            target: target.into(),
        }
    }

    /// Build a training example whose target is the one-hot encoding of `class`.
    pub fn from_class(input: impl Into<Vector>, class: usize, classes: usize) -> Result<Self> {
        Ok(Self {
            input: input.into(),
            target: one_hot(class, classes)?,
        })
    }
}

/// An `(input, expected class index)` pair for evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledExample {
    pub input: Vector,
    pub label: usize,
}

impl LabeledExample {
    pub fn new(input: impl Into<Vector>, label: usize) -> Self {
        Self {
            input: input.into(),
            label,
        }
    }
}

/// A length-`classes` vector with `1.0` at `class` and `0.0` elsewhere.
pub fn one_hot(class: usize, classes: usize) -> Result<Vector> {
    if class >= classes {
        return Err(Error::InvalidData(format!(
            "class {class} out of range for {classes} classes"
        )));
    }
    let mut v = Vector::zeros(classes);
    v[class] = 1.0;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_hot_sets_single_entry() {
        let v = one_hot(2, 4).unwrap();
        assert_eq!(v.as_slice(), &[0.0, 0.0, 1.0, 0.0]);
        assert!(one_hot(4, 4).is_err());
    }

    #[test]
    fn from_class_builds_target() {
        let ex = TrainingExample::from_class([0.1, 0.2], 0, 2).unwrap();
        assert_eq!(ex.input.as_slice(), &[0.1, 0.2]);
        assert_eq!(ex.target.as_slice(), &[1.0, 0.0]);
    }
}
