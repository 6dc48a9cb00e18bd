//! Persisted network parameters (JSON I/O behind feature `serde`).
//!
//! The on-disk record is two nested arrays, one entry per non-input layer in layer
//! order:
//!
//! ```json
//! { "weights": [[[w, ..], ..], ..], "biases": [[b, ..], ..] }
//! ```
//!
//! `weights[l]` is a list of rows (one per neuron of layer `l + 1`, each with one
//! entry per neuron of layer `l`). Layer sizes are not stored: they are recovered
//! as `[weights[0][0].len(), biases[0].len(), biases[1].len(), ..]`.
//!
//! We do NOT serialize `Network` directly, so the format stays stable if the
//! in-memory layout changes. Loading validates shapes, layer consistency, and that
//! every parameter is finite.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::tensor::{is_matrix, is_vector};
use crate::{Error, Matrix, Network, Result, Vector};

#[cfg(feature = "serde")]
use std::path::Path;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkParams {
    pub weights: Vec<Vec<Vec<f64>>>,
    pub biases: Vec<Vec<f64>>,
}

impl NetworkParams {
    /// Check that the record describes a valid network.
    pub fn validate(&self) -> Result<()> {
        if self.weights.len() != self.biases.len() {
            return Err(Error::InvalidData(format!(
                "got {} weight matrices but {} bias vectors",
                self.weights.len(),
                self.biases.len()
            )));
        }
        if self.weights.len() < 2 {
            return Err(Error::InvalidData(format!(
                "need at least 2 non-input layers (hidden + output), got {}",
                self.weights.len()
            )));
        }

        for (l, (w, b)) in self.weights.iter().zip(&self.biases).enumerate() {
            if !is_matrix(w) {
                return Err(Error::InvalidData(format!(
                    "layer {l}: weights must be a non-empty rectangular matrix of finite values"
                )));
            }
            if b.is_empty() || !is_vector(b) {
                return Err(Error::InvalidData(format!(
                    "layer {l}: biases must be a non-empty vector of finite values"
                )));
            }
            if w.len() != b.len() {
                return Err(Error::InvalidData(format!(
                    "layer {l}: weight matrix has {} rows but bias vector has len {}",
                    w.len(),
                    b.len()
                )));
            }
            if l > 0 {
                let prev = self.biases[l - 1].len();
                if w[0].len() != prev {
                    return Err(Error::InvalidData(format!(
                        "layer {l}: weight matrix has {} columns but previous layer has {prev} neurons",
                        w[0].len()
                    )));
                }
            }
        }

        Ok(())
    }

    /// Layer sizes implied by the record, input layer first.
    pub fn sizes(&self) -> Result<Vec<usize>> {
        self.validate()?;
        let mut sizes = Vec::with_capacity(self.biases.len() + 1);
        sizes.push(self.weights[0][0].len());
        sizes.extend(self.biases.iter().map(Vec::len));
        Ok(sizes)
    }
}

impl From<&Network> for NetworkParams {
    fn from(network: &Network) -> Self {
        Self {
            weights: network.weights().iter().map(Matrix::to_rows).collect(),
            biases: network.biases().iter().map(|b| b.to_vec()).collect(),
        }
    }
}

impl TryFrom<NetworkParams> for Network {
    type Error = Error;

    fn try_from(value: NetworkParams) -> std::result::Result<Self, Self::Error> {
        value.validate()?;

        let mut weights = Vec::with_capacity(value.weights.len());
        for (l, w) in value.weights.iter().enumerate() {
            let m = Matrix::from_rows(w)
                .map_err(|e| Error::InvalidData(format!("layer {l} invalid: {e}")))?;
            weights.push(m);
        }
        let biases = value.biases.into_iter().map(Vector::new).collect();

        let network = Network::from_parts(biases, weights)
            .map_err(|e| Error::InvalidData(format!("inconsistent parameters: {e}")))?;
        debug!(sizes = ?network.sizes(), "imported network parameters");
        Ok(network)
    }
}

#[cfg(feature = "serde")]
impl Network {
    /// Serialize the parameters to a pretty-printed JSON string.
    pub fn to_json_string_pretty(&self) -> Result<String> {
        let params = NetworkParams::from(self);
        serde_json::to_string_pretty(&params)
            .map_err(|e| Error::InvalidData(format!("failed to serialize network: {e}")))
    }

    /// Serialize the parameters to a compact JSON string.
    pub fn to_json_string(&self) -> Result<String> {
        let params = NetworkParams::from(self);
        serde_json::to_string(&params)
            .map_err(|e| Error::InvalidData(format!("failed to serialize network: {e}")))
    }

    /// Parse a network from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let params: NetworkParams = serde_json::from_str(s)
            .map_err(|e| Error::InvalidData(format!("failed to parse network json: {e}")))?;
        params.try_into()
    }

    /// Save the parameters to a JSON file (pretty-printed).
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let s = self.to_json_string_pretty()?;
        let p = path.as_ref();
        std::fs::write(p, s)
            .map_err(|e| Error::InvalidData(format!("failed to write {}: {e}", p.display())))?;
        debug!(path = %p.display(), "saved network parameters");
        Ok(())
    }

    /// Load a network from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        let s = std::fs::read_to_string(p)
            .map_err(|e| Error::InvalidData(format!("failed to read {}: {e}", p.display())))?;
        Self::from_json_str(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_params() -> NetworkParams {
        NetworkParams {
            weights: vec![
                vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]],
                vec![vec![7.0, 8.0, 9.0]],
            ],
            biases: vec![vec![0.1, 0.2, 0.3], vec![0.4]],
        }
    }

    #[test]
    fn sizes_are_recovered_from_shapes() {
        assert_eq!(small_params().sizes().unwrap(), vec![2, 3, 1]);
    }

    #[test]
    fn export_then_import_is_identity() {
        let net = Network::new_with_seed(&[4, 3, 5, 2], 12).unwrap();
        let params = NetworkParams::from(&net);
        assert_eq!(params.sizes().unwrap(), net.sizes());
        let back = Network::try_from(params).unwrap();
        assert_eq!(back, net);
    }

    #[test]
    fn rejects_layer_inconsistent_shapes() {
        let mut p = small_params();
        p.biases[0].pop();
        let err = Network::try_from(p).unwrap_err();
        assert!(format!("{err}").contains("3 rows but bias vector has len 2"));

        let mut p = small_params();
        p.weights[1] = vec![vec![7.0, 8.0]];
        let err = Network::try_from(p).unwrap_err();
        assert!(format!("{err}").contains("previous layer has 3 neurons"));

        let mut p = small_params();
        p.weights[0][1].push(0.0);
        assert!(matches!(Network::try_from(p), Err(Error::InvalidData(_))));

        let mut p = small_params();
        p.biases.pop();
        assert!(Network::try_from(p).is_err());
    }

    #[test]
    fn rejects_too_few_layers_and_non_finite_values() {
        let p = NetworkParams {
            weights: vec![vec![vec![1.0, 2.0]]],
            biases: vec![vec![0.0]],
        };
        assert!(matches!(p.validate(), Err(Error::InvalidData(_))));

        let mut p = small_params();
        p.weights[0][0][0] = f64::NAN;
        assert!(p.validate().is_err());

        let mut p = small_params();
        p.biases[1][0] = f64::INFINITY;
        assert!(p.validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn golden_json_is_stable_and_roundtrips() {
        let net = Network::try_from(small_params()).unwrap();
        let json = net.to_json_string_pretty().unwrap();

        let golden = include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/golden/network_params.json"
        ))
        .trim_end();
        assert_eq!(json, golden);

        let loaded = Network::from_json_str(golden).unwrap();
        assert_eq!(loaded, net);
        assert_eq!(loaded.to_json_string_pretty().unwrap(), golden);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn compact_json_roundtrips_random_network() {
        let net = Network::new_with_seed(&[3, 4, 2], 77).unwrap();
        let loaded = Network::from_json_str(&net.to_json_string().unwrap()).unwrap();
        assert_eq!(loaded, net);
        assert_eq!(loaded.sizes(), net.sizes());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_roundtrip_preserves_every_bit_across_seeds() {
        for seed in 0..200 {
            let net = Network::new_with_seed(&[20, 15, 10], seed).unwrap();
            let loaded = Network::from_json_str(&net.to_json_string().unwrap()).unwrap();

            let bits = |n: &Network| -> Vec<u64> {
                n.biases()
                    .iter()
                    .flat_map(|b| b.iter())
                    .chain(n.weights().iter().flat_map(|w| w.as_slice()))
                    .map(|v| v.to_bits())
                    .collect()
            };
            assert_eq!(bits(&loaded), bits(&net), "seed {seed}");
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn rejects_malformed_json() {
        let err = Network::from_json_str(r#"{"weights": []}"#).unwrap_err();
        assert!(format!("{err}").contains("failed to parse"));

        let err = Network::from_json_str(r#"{"weights": [], "biases": []}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn save_and_load_file() {
        let net = Network::new_with_seed(&[2, 3, 1], 5).unwrap();
        let path = std::env::temp_dir().join(format!(
            "backprop_net_params_{}.json",
            std::process::id()
        ));
        net.save_json(&path).unwrap();
        let loaded = Network::load_json(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, net);

        assert!(Network::load_json(&path).is_err());
    }
}
