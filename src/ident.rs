//! Random identifiers for polls, poll options and login state tokens.
//!
//! The generator owns its random source. Production code seeds it from the
//! operating system; tests hand in a seeded `StdRng` to get repeatable output.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::sync::{Mutex, PoisonError};

/// Alphabet identifiers are drawn from.
pub const CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Length of poll ids, option ids and CSRF state tokens.
pub const ID_LENGTH: usize = 12;

pub struct IdGenerator {
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl IdGenerator {
    pub fn new<R: RngCore + Send + 'static>(rng: R) -> Self {
        Self {
            rng: Mutex::new(Box::new(rng)),
        }
    }

    /// Generator seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Deterministic generator for tests.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Returns `length` characters drawn uniformly from [`CHARSET`].
    ///
    /// Uniqueness is not checked. With 62^12 possible ids collisions are
    /// treated as negligible and never retried.
    pub fn generate(&self, length: usize) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        (0..length)
            .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
            .collect()
    }

    pub fn id(&self) -> String {
        self.generate(ID_LENGTH)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl std::fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdGenerator").finish_non_exhaustive()
    }
}
