//! The sigmoid multilayer perceptron.
//!
//! Parameters are stored per non-input layer `l` (0-based over `sizes[1..]`):
//! - `biases[l]`: `Vector` of length `sizes[l + 1]`
//! - `weights[l]`: `Matrix` of shape `(sizes[l + 1], sizes[l])`, one row per neuron
//!
//! Forward: `z_l = weights[l] · a_l + biases[l]`, `a_{l+1} = sigmoid(z_l)`, `a_0 = input`.
//!
//! Backward (cost `½‖a − y‖²`):
//! - output layer: `delta = (a_out − y) ⊙ sigmoid'(z_out)`
//! - earlier layers: `delta_l = (weights[l + 1]ᵀ · delta_{l+1}) ⊙ sigmoid'(z_l)`
//! - `nabla_b[l] = delta_l`, `nabla_w[l] = delta_l · a_lᵀ`

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::activation::{sigmoid, sigmoid_prime};
use crate::sampling::standard_normal;
use crate::tensor::is_vector;
use crate::{Error, Matrix, Result, TrainingExample, Vector};

#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    sizes: Vec<usize>,
    biases: Vec<Vector>,
    weights: Vec<Matrix>,
}

/// Reusable buffers for forward and backward passes.
///
/// Holds, per non-input layer, the pre-activation `z`, the activation, and the
/// backpropagated delta. The output of the most recent forward pass lives here.
#[derive(Debug, Clone)]
pub struct Scratch {
    zs: Vec<Vector>,
    activations: Vec<Vector>,
    deltas: Vec<Vector>,
}

/// Per-layer parameter gradients, shaped exactly like a network's biases and weights.
///
/// `Network::backprop_into` overwrites them; allocate once via `Network::gradients()`
/// and reuse across examples.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradients {
    biases: Vec<Vector>,
    weights: Vec<Matrix>,
}

/// Reusable buffers for mini-batch training of a specific `Network`.
#[derive(Debug, Clone)]
pub struct Trainer {
    pub scratch: Scratch,
    /// Gradients of the most recent example.
    pub grads: Gradients,
    /// Gradients summed over the current mini-batch.
    nabla: Gradients,
}

pub(crate) fn validate_sizes(sizes: &[usize]) -> Result<()> {
    if sizes.len() < 3 {
        return Err(Error::InvalidConfig(format!(
            "network needs at least 3 layers (input, hidden, output), got {}",
            sizes.len()
        )));
    }
    if let Some(i) = sizes.iter().position(|&s| s == 0) {
        return Err(Error::InvalidConfig(format!(
            "all layer sizes must be > 0, layer {i} has size 0"
        )));
    }
    Ok(())
}

#[inline]
fn layer_input<'a>(input: &'a [f64], activations: &'a [Vector], layer: usize) -> &'a [f64] {
    if layer == 0 {
        input
    } else {
        &activations[layer - 1]
    }
}

impl Network {
    /// Build a network with standard-normal parameters from the thread RNG.
    pub fn new(sizes: &[usize]) -> Result<Self> {
        Self::new_with_rng(sizes, &mut rand::rng())
    }

    pub fn new_with_seed(sizes: &[usize], seed: u64) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::new_with_rng(sizes, &mut rng)
    }

    /// Build a network whose biases and weights are independent standard-normal draws.
    ///
    /// Biases are sampled first (layer by layer), then weights (row by row).
    pub fn new_with_rng<R: Rng + ?Sized>(sizes: &[usize], rng: &mut R) -> Result<Self> {
        validate_sizes(sizes)?;

        let mut biases = Vec::with_capacity(sizes.len() - 1);
        for &n in &sizes[1..] {
            biases.push(Vector::filled(n, || standard_normal(&mut *rng)));
        }

        let mut weights = Vec::with_capacity(sizes.len() - 1);
        for w in sizes.windows(2) {
            weights.push(Matrix::filled(w[1], w[0], || standard_normal(&mut *rng))?);
        }

        debug!(?sizes, "initialised network");
        Ok(Self {
            sizes: sizes.to_vec(),
            biases,
            weights,
        })
    }

    /// Build a network from explicit parameters, one bias vector and one weight matrix
    /// per non-input layer.
    ///
    /// Layer sizes are recovered as `[weights[0].cols(), biases[0].len(), biases[1].len(), ..]`.
    pub fn from_parts(biases: Vec<Vector>, weights: Vec<Matrix>) -> Result<Self> {
        if biases.len() != weights.len() {
            return Err(Error::InvalidShape(format!(
                "got {} bias vectors but {} weight matrices",
                biases.len(),
                weights.len()
            )));
        }
        let Some(first) = weights.first() else {
            return Err(Error::InvalidConfig(
                "network must have at least one non-input layer".to_owned(),
            ));
        };

        let mut sizes = Vec::with_capacity(weights.len() + 1);
        sizes.push(first.cols());
        for (l, (b, w)) in biases.iter().zip(&weights).enumerate() {
            let prev = sizes[l];
            if w.rows() != b.len() {
                return Err(Error::InvalidShape(format!(
                    "layer {l}: weight matrix has {} rows but bias vector has len {}",
                    w.rows(),
                    b.len()
                )));
            }
            if w.cols() != prev {
                return Err(Error::InvalidShape(format!(
                    "layer {l}: weight matrix has {} columns but previous layer has {prev} neurons",
                    w.cols()
                )));
            }
            sizes.push(b.len());
        }
        validate_sizes(&sizes)?;

        Ok(Self {
            sizes,
            biases,
            weights,
        })
    }

    /// Neuron count of every layer, input layer first.
    #[inline]
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Number of layers including the input layer.
    #[inline]
    pub fn num_layers(&self) -> usize {
        self.sizes.len()
    }

    #[inline]
    pub fn input_size(&self) -> usize {
        self.sizes[0]
    }

    #[inline]
    pub fn output_size(&self) -> usize {
        self.sizes[self.sizes.len() - 1]
    }

    #[inline]
    pub fn biases(&self) -> &[Vector] {
        &self.biases
    }

    #[inline]
    pub fn weights(&self) -> &[Matrix] {
        &self.weights
    }

    pub fn scratch(&self) -> Scratch {
        Scratch::new(self)
    }

    pub fn gradients(&self) -> Gradients {
        Gradients::new(self)
    }

    /// Convenience constructor: allocate all training buffers.
    #[inline]
    pub fn trainer(&self) -> Trainer {
        Trainer::new(self)
    }

    /// Output of the network for `input`.
    pub fn feedforward(&self, input: &[f64]) -> Result<Vector> {
        let mut scratch = self.scratch();
        let out = self.feedforward_into(input, &mut scratch)?;
        Ok(Vector::from(out))
    }

    /// Forward pass writing every intermediate `z` and activation into `scratch`.
    ///
    /// Returns the output layer's activation. `scratch` must come from a network
    /// with the same layer sizes.
    pub fn feedforward_into<'a>(&self, input: &[f64], scratch: &'a mut Scratch) -> Result<&'a [f64]> {
        self.check_input(input)?;
        self.check_scratch(scratch)?;
        self.forward_unchecked(input, scratch);
        scratch.output()
    }

    /// Gradient of the cost `½‖a − target‖²` for a single example, shaped like the
    /// network's own biases and weights. Does not touch the live parameters.
    pub fn backprop(&self, input: &[f64], target: &[f64]) -> Result<Gradients> {
        let mut scratch = self.scratch();
        let mut grads = self.gradients();
        self.backprop_into(input, target, &mut scratch, &mut grads)?;
        Ok(grads)
    }

    /// Allocation-free [`Network::backprop`]: `grads` is overwritten.
    pub fn backprop_into(
        &self,
        input: &[f64],
        target: &[f64],
        scratch: &mut Scratch,
        grads: &mut Gradients,
    ) -> Result<()> {
        self.check_input(input)?;
        self.check_target(target)?;
        self.check_scratch(scratch)?;
        self.check_gradients(grads)?;

        self.forward_unchecked(input, scratch);

        let last = self.weights.len().checked_sub(1).ok_or_else(|| {
            Error::Internal("backprop on a network without layers".to_owned())
        })?;

        let zs = &scratch.zs;
        let activations = &scratch.activations;
        let deltas = &mut scratch.deltas;

        // Output layer.
        {
            let delta = &mut deltas[last];
            let out = &activations[last];
            for (((d, a), y), z) in delta.iter_mut().zip(out.iter()).zip(target).zip(zs[last].iter()) {
                *d = (a - y) * sigmoid_prime(*z);
            }
            grads.biases[last].copy_from_slice(delta);
            grads.weights[last].set_outer_unchecked(delta, layer_input(input, activations, last));
        }

        // Hidden layers, walking from the output towards the input.
        for l in (0..last).rev() {
            let (lower, upper) = deltas.split_at_mut(l + 1);
            let delta_next = &upper[0];
            let delta = &mut lower[l];

            self.weights[l + 1].transpose_mul_vec_into(delta_next, delta);
            for (d, z) in delta.iter_mut().zip(zs[l].iter()) {
                *d *= sigmoid_prime(*z);
            }

            grads.biases[l].copy_from_slice(delta);
            grads.weights[l].set_outer_unchecked(delta, layer_input(input, activations, l));
        }

        Ok(())
    }

    /// One gradient-descent step over `batch`: sums the per-example gradients and
    /// subtracts `eta / batch.len()` times the sum from every parameter.
    pub fn update_mini_batch(&mut self, batch: &[TrainingExample], eta: f64) -> Result<()> {
        let mut trainer = self.trainer();
        self.update_mini_batch_with(&mut trainer, batch, eta)
    }

    /// Allocation-free [`Network::update_mini_batch`] reusing `trainer`'s buffers.
    ///
    /// Parameters are only modified once every example in the batch has produced a
    /// gradient; a malformed example leaves the network untouched.
    pub fn update_mini_batch_with(
        &mut self,
        trainer: &mut Trainer,
        batch: &[TrainingExample],
        eta: f64,
    ) -> Result<()> {
        if batch.is_empty() {
            return Err(Error::InvalidData("mini-batch must not be empty".to_owned()));
        }
        check_learning_rate(eta)?;
        self.check_gradients(&trainer.nabla)?;
        self.apply_batch(trainer, batch.iter(), batch.len(), eta)
    }

    pub(crate) fn apply_batch<'a, I>(
        &mut self,
        trainer: &mut Trainer,
        examples: I,
        len: usize,
        eta: f64,
    ) -> Result<()>
    where
        I: IntoIterator<Item = &'a TrainingExample>,
    {
        debug_assert!(len > 0);
        trainer.nabla.fill_zero();
        for ex in examples {
            self.backprop_into(&ex.input, &ex.target, &mut trainer.scratch, &mut trainer.grads)?;
            trainer.nabla.add_assign_unchecked(&trainer.grads);
        }

        let scale = eta / len as f64;
        for (b, nb) in self.biases.iter_mut().zip(&trainer.nabla.biases) {
            b.scaled_sub_assign_unchecked(scale, nb);
        }
        for (w, nw) in self.weights.iter_mut().zip(&trainer.nabla.weights) {
            w.scaled_sub_assign_unchecked(scale, nw);
        }
        Ok(())
    }

    fn forward_unchecked(&self, input: &[f64], scratch: &mut Scratch) {
        let zs = &mut scratch.zs;
        let activations = &mut scratch.activations;

        for (l, (w, b)) in self.weights.iter().zip(&self.biases).enumerate() {
            // Borrow the previous activation immutably and the current one mutably.
            let (prev, rest) = activations.split_at_mut(l);
            let layer_in: &[f64] = if l == 0 { input } else { &prev[l - 1] };
            let z = &mut zs[l];

            w.mul_vec_into(layer_in, z);
            z.add_assign_unchecked(b);

            for (a, zv) in rest[0].iter_mut().zip(z.iter()) {
                *a = sigmoid(*zv);
            }
        }
    }

    pub(crate) fn check_input(&self, input: &[f64]) -> Result<()> {
        if input.len() != self.input_size() {
            return Err(Error::InvalidShape(format!(
                "input len {} does not match input layer size {}",
                input.len(),
                self.input_size()
            )));
        }
        if !is_vector(input) {
            return Err(Error::InvalidData("input contains non-finite values".to_owned()));
        }
        Ok(())
    }

    pub(crate) fn check_target(&self, target: &[f64]) -> Result<()> {
        if target.len() != self.output_size() {
            return Err(Error::InvalidShape(format!(
                "target len {} does not match output layer size {}",
                target.len(),
                self.output_size()
            )));
        }
        if !is_vector(target) {
            return Err(Error::InvalidData("target contains non-finite values".to_owned()));
        }
        Ok(())
    }

    fn check_scratch(&self, scratch: &Scratch) -> Result<()> {
        let layers = &self.sizes[1..];
        let matches = scratch.zs.len() == layers.len()
            && scratch.activations.len() == layers.len()
            && scratch.deltas.len() == layers.len()
            && layers.iter().enumerate().all(|(l, &n)| {
                scratch.zs[l].len() == n
                    && scratch.activations[l].len() == n
                    && scratch.deltas[l].len() == n
            });
        if !matches {
            return Err(Error::InvalidShape(format!(
                "scratch buffers do not match network layer sizes {:?}",
                self.sizes
            )));
        }
        Ok(())
    }

    fn check_gradients(&self, grads: &Gradients) -> Result<()> {
        let matches = grads.biases.len() == self.biases.len()
            && grads.weights.len() == self.weights.len()
            && grads.biases.iter().zip(&self.biases).all(|(g, b)| g.len() == b.len())
            && grads
                .weights
                .iter()
                .zip(&self.weights)
                .all(|(g, w)| g.shape() == w.shape());
        if !matches {
            return Err(Error::InvalidShape(format!(
                "gradient buffers do not match network layer sizes {:?}",
                self.sizes
            )));
        }
        Ok(())
    }
}

pub(crate) fn check_learning_rate(eta: f64) -> Result<()> {
    if !(eta.is_finite() && eta >= 0.0) {
        return Err(Error::InvalidConfig(format!(
            "learning rate must be finite and >= 0, got {eta}"
        )));
    }
    Ok(())
}

impl Trainer {
    pub fn new(network: &Network) -> Self {
        Self {
            scratch: Scratch::new(network),
            grads: Gradients::new(network),
            nabla: Gradients::new(network),
        }
    }

    /// Gradients summed over the most recent mini-batch (before scaling).
    #[inline]
    pub fn accumulated(&self) -> &Gradients {
        &self.nabla
    }
}

impl Scratch {
    pub fn new(network: &Network) -> Self {
        let zeros = || -> Vec<Vector> { network.sizes[1..].iter().map(|&n| Vector::zeros(n)).collect() };
        Self {
            zs: zeros(),
            activations: zeros(),
            deltas: zeros(),
        }
    }

    /// Output-layer activation of the most recent forward pass.
    pub fn output(&self) -> Result<&[f64]> {
        self.activations
            .last()
            .map(Vector::as_slice)
            .ok_or_else(|| Error::Internal("scratch holds no output activation".to_owned()))
    }

    /// Pre-activation `z` of non-input layer `layer` from the most recent forward pass.
    pub fn z(&self, layer: usize) -> Option<&[f64]> {
        self.zs.get(layer).map(Vector::as_slice)
    }

    /// Activation of non-input layer `layer` from the most recent forward pass.
    pub fn activation(&self, layer: usize) -> Option<&[f64]> {
        self.activations.get(layer).map(Vector::as_slice)
    }
}

impl Gradients {
    pub fn new(network: &Network) -> Self {
        let biases = network.biases.iter().map(|b| Vector::zeros(b.len())).collect();
        let weights = network
            .weights
            .iter()
            .map(|w| {
                let mut g = w.clone();
                g.fill_zero();
                g
            })
            .collect();
        Self { biases, weights }
    }

    #[inline]
    pub fn biases(&self) -> &[Vector] {
        &self.biases
    }

    #[inline]
    pub fn weights(&self) -> &[Matrix] {
        &self.weights
    }

    fn fill_zero(&mut self) {
        self.biases.iter_mut().for_each(Vector::fill_zero);
        self.weights.iter_mut().for_each(Matrix::fill_zero);
    }

    fn add_assign_unchecked(&mut self, other: &Gradients) {
        for (a, b) in self.biases.iter_mut().zip(&other.biases) {
            a.add_assign_unchecked(b);
        }
        for (a, b) in self.weights.iter_mut().zip(&other.weights) {
            a.add_assign_unchecked(b);
        }
    }
}
