//! A small sigmoid feed-forward network trained with backpropagation.
//!
//! `backprop-net` is a from-scratch implementation of a fully connected network with
//! sigmoid activations and a quadratic cost, trained by mini-batch stochastic gradient
//! descent. It is designed to be easy to read while keeping the per-example hot path
//! allocation-free.
//!
//! # Design goals
//!
//! - Predictable performance: reuse buffers ([`Scratch`] / [`Gradients`] / [`Trainer`])
//!   instead of allocating.
//! - Clear contracts: shapes are explicit and validated at the API boundary.
//! - Reproducibility: initialization and shuffling can be driven by a seed.
//!
//! # Checked vs unchecked
//!
//! The public operations (linear algebra helpers, [`Network::feedforward`],
//! [`Network::backprop`], [`Network::update_mini_batch`], [`Network::train`],
//! [`Network::evaluate`]) validate shapes and return [`Result`]. Internal kernels skip
//! the checks once the boundary has been validated and only `debug_assert!` their
//! contracts.
//!
//! # Data layout and shapes
//!
//! - Scalars are `f64`.
//! - [`Vector`] is a contiguous `Vec<f64>`; it derefs to `[f64]`.
//! - [`Matrix`] is row-major with shape `(rows, cols)`. Layer `l` weights have shape
//!   `(sizes[l + 1], sizes[l])`, so `weights[l][(j, k)]` connects neuron `k` of layer `l`
//!   to neuron `j` of layer `l + 1`.
//!
//! # Logging
//!
//! The crate emits [`tracing`] events (per epoch at `info`, per mini-batch at `debug`)
//! and never installs a subscriber.
//!
//! # Quick start
//!
//! ```rust
//! use backprop_net::{LabeledExample, Network, SgdConfig, Shuffle, TrainingExample};
//!
//! # fn main() -> backprop_net::Result<()> {
//! let xor: [([f64; 2], f64); 4] = [
//!     ([0.0, 0.0], 0.0),
//!     ([0.0, 1.0], 1.0),
//!     ([1.0, 0.0], 1.0),
//!     ([1.0, 1.0], 0.0),
//! ];
//! let train: Vec<TrainingExample> = xor
//!     .into_iter()
//!     .map(|(x, y)| TrainingExample::new(x, [y]))
//!     .collect();
//!
//! let mut net = Network::new_with_seed(&[2, 4, 1], 0)?;
//! let report = net.train(
//!     &train,
//!     None,
//!     &SgdConfig {
//!         epochs: 10,
//!         mini_batch_size: 2,
//!         learning_rate: 3.0,
//!         shuffle: Shuffle::Seeded(0),
//!     },
//! )?;
//! assert_eq!(report.epochs.len(), 10);
//!
//! let out = net.feedforward(&[1.0, 0.0])?;
//! assert_eq!(out.len(), 1);
//! assert!(net.evaluate(&[LabeledExample::new([1.0, 0.0], 0)])? <= 1);
//! Ok(())
//! # }
//! ```

//! # Allocation-free training (advanced)
//!
//! If you want to drive training yourself, allocate buffers once and reuse them
//! across steps:
//!
//! ```rust
//! use backprop_net::Network;
//!
//! # fn main() -> backprop_net::Result<()> {
//! let net = Network::new_with_seed(&[3, 8, 2], 0)?;
//! let mut trainer = net.trainer();
//!
//! let x = [0.1, -0.2, 0.3];
//! let t = [0.0, 1.0];
//! net.backprop_into(&x, &t, &mut trainer.scratch, &mut trainer.grads)?;
//! assert_eq!(trainer.grads.weights()[0].shape(), (8, 3));
//! Ok(())
//! # }
//! ```

pub mod activation;
pub mod data;
pub mod error;
pub(crate) mod matmul;
pub mod metrics;
pub mod network;
pub mod sampling;
pub mod serde_model;
pub mod tensor;
pub mod train;

pub use activation::{sigmoid, sigmoid_prime};
pub use data::{LabeledExample, TrainingExample, one_hot};
pub use error::{Error, Result};
pub use metrics::{EvalReport, argmax};
pub use network::{Gradients, Network, Scratch, Trainer};
pub use serde_model::NetworkParams;
pub use tensor::{
    Matrix, Vector, dot_product, hadamard, is_matrix, is_vector, matrix_add, matrix_subtract,
    matrix_times_matrix, new_matrix, new_vector, outer_product, scalar_times_matrix,
    scalar_times_vector, vector_add, vector_subtract, vector_times_matrix,
};
pub use train::{EpochReport, SgdConfig, Shuffle, TrainReport};
