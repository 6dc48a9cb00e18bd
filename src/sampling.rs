//! Random sampling helpers.
//!
//! Network parameters are drawn from a standard normal distribution (mean 0,
//! variance 1). The uniform and spread helpers are auxiliary and never used for
//! initialisation.

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

/// Uniform sample in `[low, high)`.
///
/// Returns `low` when the range is empty (`high <= low`).
pub fn uniform<R: Rng + ?Sized>(rng: &mut R, low: f64, high: f64) -> f64 {
    if high <= low {
        return low;
    }
    rng.random_range(low..high)
}

/// Cheap non-Gaussian "spread" sample `(u - 0.5) * 10` with `u` uniform in `[0, 1)`.
pub fn spread<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    (rng.random::<f64>() - 0.5) * 10.0
}

/// One draw from the standard normal distribution.
#[inline]
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    StandardNormal.sample(rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn uniform_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let x = uniform(&mut rng, -2.0, 3.0);
            assert!((-2.0..3.0).contains(&x));
        }
        assert_eq!(uniform(&mut rng, 1.0, 1.0), 1.0);
        assert_eq!(uniform(&mut rng, 4.0, 1.0), 4.0);
    }

    #[test]
    fn spread_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let x = spread(&mut rng);
            assert!((-5.0..5.0).contains(&x));
        }
    }

    #[test]
    fn standard_normal_moments() {
        let mut rng = StdRng::seed_from_u64(42);
        let n = 20_000;
        let xs: Vec<f64> = (0..n).map(|_| standard_normal(&mut rng)).collect();
        let mean = xs.iter().sum::<f64>() / n as f64;
        let var = xs.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.05, "mean={mean}");
        assert!((var - 1.0).abs() < 0.05, "var={var}");
    }
}
