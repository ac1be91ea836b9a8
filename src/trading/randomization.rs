//! Randomization Module
//!
//! Pacing jitter for trading runs. Buy/sell spacing and the gap between
//! wallets are drawn at random so the on-chain activity has no fixed rhythm.
//! Seeding makes every draw reproducible in tests.

use alloy::primitives::hex;
use rand::prelude::*;
use rand::rngs::StdRng;
use std::time::Duration;

/// Random source for run pacing
pub struct Randomizer {
    rng: StdRng,
}

impl Randomizer {
    /// Create a new randomizer with optional seed
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Create randomizer from entropy (random seed)
    pub fn from_entropy() -> Self {
        Self::new(None)
    }

    /// Generate a random delay within an inclusive millisecond range
    ///
    /// An inverted range collapses to `min_ms`.
    pub fn random_delay(&mut self, min_ms: u64, max_ms: u64) -> Duration {
        if max_ms <= min_ms {
            return Duration::from_millis(min_ms);
        }
        let delay_ms = self.rng.gen_range(min_ms..=max_ms);
        Duration::from_millis(delay_ms)
    }

    /// Decide whether to take an action with given probability
    pub fn should_act(&mut self, probability: f64) -> bool {
        self.rng.gen::<f64>() < probability
    }

    /// Random 32-byte hash rendered as `0x` + 64 hex
    pub fn random_hash(&mut self) -> String {
        let bytes: [u8; 32] = self.rng.gen();
        hex::encode_prefixed(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_with_seed() {
        let mut r1 = Randomizer::new(Some(12345));
        let mut r2 = Randomizer::new(Some(12345));

        // Same seed should produce same results
        assert_eq!(r1.random_delay(1000, 5000), r2.random_delay(1000, 5000));
        assert_eq!(r1.random_hash(), r2.random_hash());
    }

    #[test]
    fn test_delay_range() {
        let mut randomizer = Randomizer::new(Some(42));

        for _ in 0..100 {
            let delay = randomizer.random_delay(1000, 3000);
            assert!(delay.as_millis() >= 1000);
            assert!(delay.as_millis() <= 3000);
        }
    }

    #[test]
    fn test_inverted_range_collapses() {
        let mut randomizer = Randomizer::new(Some(42));
        assert_eq!(randomizer.random_delay(2000, 1000), Duration::from_millis(2000));
    }

    #[test]
    fn test_should_act_extremes() {
        let mut randomizer = Randomizer::new(Some(42));
        for _ in 0..100 {
            assert!(!randomizer.should_act(0.0));
            assert!(randomizer.should_act(1.0));
        }
    }

    #[test]
    fn test_random_hash_shape() {
        let mut randomizer = Randomizer::new(Some(42));
        let hash = randomizer.random_hash();
        assert_eq!(hash.len(), 66);
        assert!(hash.starts_with("0x"));
        assert!(hash[2..].chars().all(|c| c.is_ascii_hexdigit()));
    }
}
