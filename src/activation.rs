//! Activation functions.
//!
//! Every non-input layer computes a pre-activation `z = W a + b` and squashes it
//! element-wise with the logistic sigmoid. The backward pass needs the derivative
//! evaluated at `z`, so the network caches `z` per layer instead of re-deriving it
//! from the activation.

/// Logistic sigmoid `1 / (1 + e^-x)`. Range `(0, 1)` for finite input.
#[inline]
pub fn sigmoid(x: f64) -> f64 {
    // Numerically stable sigmoid.
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

/// Derivative of [`sigmoid`], `sigmoid(x) * (1 - sigmoid(x))`.
#[inline]
pub fn sigmoid_prime(x: f64) -> f64 {
    let s = sigmoid(x);
    s * (1.0 - s)
}

/// Softplus `ln(1 + e^x)`.
///
/// Not used by the network itself.
#[inline]
pub fn softplus(x: f64) -> f64 {
    // ln(1 + e^x) = max(x, 0) + ln(1 + e^-|x|)
    x.max(0.0) + (-x.abs()).exp().ln_1p()
}
