use crate::domain::ports::RandomSource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Random source backed by a `StdRng`.
pub struct RngSource {
    rng: Mutex<StdRng>,
}

impl RngSource {
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// A reproducible source: the same seed yields the same sample sequence.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for RngSource {
    fn next_unit(&self) -> f64 {
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        rng.r#gen::<f64>()
    }
}

/// Deterministic source that replays a fixed list of samples, wrapping around
/// when exhausted.
pub struct SequenceSource {
    values: Vec<f64>,
    cursor: AtomicUsize,
}

impl SequenceSource {
    /// # Panics
    ///
    /// Panics if `values` is empty.
    pub fn new(values: Vec<f64>) -> Self {
        assert!(!values.is_empty(), "SequenceSource needs at least one value");
        Self {
            values,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Every sample is 0.5: mid-range latency, never below the failure threshold.
    pub fn always_succeed() -> Self {
        Self::new(vec![0.5])
    }

    /// Every sample is 0.0: minimum latency, always below the failure threshold.
    pub fn always_fail() -> Self {
        Self::new(vec![0.0])
    }
}

impl RandomSource for SequenceSource {
    fn next_unit(&self) -> f64 {
        let i = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.values[i % self.values.len()]
    }
}
