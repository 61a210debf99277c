use std::sync::Arc;

use rand::{
    Rng,
    distr::{Alphanumeric, SampleString},
};
use rearch::CapsuleHandle;

/// Length of every paste ID handed out by the server.
pub const PASTE_ID_LEN: usize = 6;

/// Generates a string of exactly `length` characters, each drawn uniformly
/// (with replacement) from `[A-Za-z0-9]`.
///
/// No uniqueness check is performed; a collision is left for the primary key
/// to reject at insert time.
pub fn generate_id<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    Alphanumeric.sample_string(rng, length)
}

pub trait IdGenerator: Send + Sync {
    fn generate_id(&self) -> String;
}

#[derive(Debug, Clone, Copy)]
pub struct RandomIdGenerator {
    length: usize,
}

impl RandomIdGenerator {
    #[must_use]
    pub const fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Default for RandomIdGenerator {
    fn default() -> Self {
        Self::new(PASTE_ID_LEN)
    }
}

impl IdGenerator for RandomIdGenerator {
    fn generate_id(&self) -> String {
        generate_id(&mut rand::rng(), self.length)
    }
}

pub fn id_generator_capsule(_: CapsuleHandle) -> Arc<dyn IdGenerator> {
    Arc::new(RandomIdGenerator::default())
}
