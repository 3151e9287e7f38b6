//! Random implementations.

use crate::infrastructure::ports::RandomPort;
use rand::distributions::Alphanumeric;
use rand::Rng;
use uuid::Uuid;

/// System random - uses real randomness.
pub struct SystemRandom;

impl SystemRandom {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomPort for SystemRandom {
    fn alphanumeric(&self, len: usize) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(|b| char::from(b).to_ascii_lowercase())
            .collect()
    }

    fn gen_uuid(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Fixed random for testing.
#[cfg(test)]
pub struct FixedRandom(pub &'static str);

#[cfg(test)]
impl RandomPort for FixedRandom {
    fn alphanumeric(&self, len: usize) -> String {
        self.0.chars().cycle().take(len).collect()
    }

    fn gen_uuid(&self) -> Uuid {
        Uuid::nil()
    }
}
