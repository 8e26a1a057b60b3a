//! Weight initialization.
//!
//! Both schemes draw from a zero-mean normal distribution whose standard deviation
//! depends on the layer's fan-in, so activations keep a similar variance from one
//! layer to the next:
//!
//! - [`Init::Kaiming`] (He): `std = sqrt(2 / fan_in)`
//! - [`Init::Xavier`] (Glorot): `std = sqrt(2 / (fan_in + fan_out))`

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::{Error, Matrix, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Init {
    #[default]
    Kaiming,
    Xavier,
}

impl Init {
    #[inline]
    pub fn std_dev(self, fan_in: usize, fan_out: usize) -> f64 {
        match self {
            Init::Kaiming => (2.0 / fan_in as f64).sqrt(),
            Init::Xavier => (2.0 / (fan_in + fan_out) as f64).sqrt(),
        }
    }

    /// Sample a `fan_in x fan_out` weight matrix.
    pub fn weights<R: Rng + ?Sized>(
        self,
        fan_in: usize,
        fan_out: usize,
        rng: &mut R,
    ) -> Result<Matrix> {
        if fan_in == 0 || fan_out == 0 {
            return Err(Error::InvalidConfig(format!(
                "fan_in and fan_out must be > 0, got {fan_in} and {fan_out}"
            )));
        }

        let normal = Normal::new(0.0, self.std_dev(fan_in, fan_out))
            .map_err(|e| Error::InvalidConfig(format!("weight distribution: {e}")))?;
        let data = (0..fan_in * fan_out).map(|_| normal.sample(rng)).collect();
        Matrix::new(fan_in, fan_out, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn weights_have_fan_in_by_fan_out_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let w = Init::Kaiming.weights(3, 5, &mut rng).unwrap();
        assert_eq!(w.dims(), (3, 5));
        assert!(w.as_slice().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn same_seed_gives_same_weights() {
        let a = Init::Xavier
            .weights(4, 4, &mut StdRng::seed_from_u64(1))
            .unwrap();
        let b = Init::Xavier
            .weights(4, 4, &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn kaiming_variance_scales_with_fan_in() {
        let mut rng = StdRng::seed_from_u64(0);
        let fan_in = 50;
        let w = Init::Kaiming.weights(fan_in, 200, &mut rng).unwrap();
        let n = w.as_slice().len() as f64;
        let var = w.as_slice().iter().map(|v| v * v).sum::<f64>() / n;
        let expected = 2.0 / fan_in as f64;
        assert!(
            (var - expected).abs() < 0.1 * expected,
            "var={var} expected={expected}"
        );
    }

    #[test]
    fn zero_fan_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(Init::Kaiming.weights(0, 3, &mut rng).is_err());
    }
}
