pub mod calculator;
pub mod rng;

pub use calculator::{MetricCalculator, DEFAULT_JITTER_SEED, SPEED_MAX_KMH, SPEED_MIN_KMH};
pub use rng::XorShiftRng;
