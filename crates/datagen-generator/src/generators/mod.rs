//! Primitive value generators shared by the domain producers.
//!
//! All generators draw from a caller-supplied RNG so that a seeded producer
//! is reproducible.

pub mod numeric;
pub mod pick;
pub mod timestamp;
pub mod uuid;

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Build the RNG for one producer.
///
/// With a base seed the result is deterministic; each producer passes a
/// different `salt` so they do not share a random stream. Without a seed
/// the RNG is seeded from OS entropy.
pub fn seeded_rng(seed: Option<u64>, salt: u64) -> StdRng {
    match seed {
        Some(base_seed) => {
            StdRng::seed_from_u64(base_seed.wrapping_add(salt.wrapping_mul(0x9E3779B97F4A7C15)))
        }
        None => StdRng::from_entropy(),
    }
}
