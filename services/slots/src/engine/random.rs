use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform randomness for reel draws and plinko bounces.
pub trait RandomSource: Send {
    /// A sample in `[0, 1)`.
    fn next_f64(&mut self) -> f64;
}

/// Uniform index in `0..n`. `n` must be non-zero.
pub fn pick<R: RandomSource + ?Sized>(random: &mut R, n: usize) -> usize {
    let index = (random.next_f64() * n as f64) as usize;
    index.min(n - 1)
}

/// `StdRng`-backed source, from OS entropy or a fixed seed.
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed list of samples, wrapping around at the end.
///
/// Values outside `[0, 1)` are clamped into it. An empty script yields `0.0`.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    values: Vec<f64>,
    position: usize,
}

impl ScriptedRandom {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        let below_one = 1.0 - f64::EPSILON;
        Self {
            values: values
                .into_iter()
                .map(|value| value.clamp(0.0, below_one))
                .collect(),
            position: 0,
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f64(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.position % self.values.len()];
        self.position += 1;
        value
    }
}
