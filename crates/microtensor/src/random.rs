//! Random tensor construction.
//!
//! Every element is a fresh leaf, so random tensors serve as trainable
//! parameters. Pass a seeded RNG for reproducible initialization.

use rand::Rng;
use rand::distr::StandardUniform;
use rand_distr::StandardNormal;

use crate::error::Result;
use crate::tensor::Tensor;

impl Tensor {
    /// Create a tensor with uniform random values in `[low, high)`.
    ///
    /// # Example
    ///
    /// ```
    /// use microtensor::Tensor;
    ///
    /// let t = Tensor::random(&[2, 3], -1.0, 1.0).unwrap();
    /// assert_eq!(t.shape(), &[2, 3]);
    /// assert!(t.values().iter().all(|v| (-1.0..1.0).contains(v)));
    /// ```
    pub fn random(shape: &[usize], low: f64, high: f64) -> Result<Self> {
        Self::random_with_rng(shape, low, high, &mut rand::rng())
    }

    /// Create a tensor with uniform random values in `[low, high)` using a
    /// specific RNG.
    ///
    /// # Example
    ///
    /// ```
    /// use microtensor::Tensor;
    /// use rand::SeedableRng;
    /// use rand::rngs::StdRng;
    ///
    /// let mut rng = StdRng::seed_from_u64(42);
    /// let t1 = Tensor::random_with_rng(&[2, 3], 0.0, 1.0, &mut rng).unwrap();
    ///
    /// let mut rng = StdRng::seed_from_u64(42);
    /// let t2 = Tensor::random_with_rng(&[2, 3], 0.0, 1.0, &mut rng).unwrap();
    ///
    /// assert_eq!(t1.values(), t2.values());
    /// ```
    pub fn random_with_rng<R: Rng>(
        shape: &[usize],
        low: f64,
        high: f64,
        rng: &mut R,
    ) -> Result<Self> {
        let width = high - low;
        Self::from_fn(shape, |_| {
            let unit: f64 = rng.sample(StandardUniform);
            low + width * unit
        })
    }

    /// Create a tensor with standard normal random values.
    ///
    /// # Example
    ///
    /// ```
    /// use microtensor::Tensor;
    ///
    /// let t = Tensor::randn(&[2, 3]).unwrap();
    /// assert_eq!(t.shape(), &[2, 3]);
    /// ```
    pub fn randn(shape: &[usize]) -> Result<Self> {
        Self::randn_with_rng(shape, &mut rand::rng())
    }

    /// Create a tensor with standard normal random values using a specific RNG.
    pub fn randn_with_rng<R: Rng>(shape: &[usize], rng: &mut R) -> Result<Self> {
        Self::from_fn(shape, |_| rng.sample::<f64, _>(StandardNormal))
    }
}
