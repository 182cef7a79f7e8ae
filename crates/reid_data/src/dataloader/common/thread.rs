//! Thread-local state for loader threads.
//!
//! Every batch is transformed under its own RNG, seeded from
//! `(base_seed, epoch, batch_index)`. A batch therefore receives the same random
//! augmentations whichever worker (or the main thread) happens to process it.

use rand::distr::uniform::{SampleRange, SampleUniform};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng as _;
use rand::SeedableRng;
use std::cell::RefCell;

thread_local! {
    /// Worker ID (0 to num_workers-1), assigned when the worker thread is spawned.
    /// The main thread keeps 0.
    pub static WORKER_ID: RefCell<usize> = const { RefCell::new(0) };

    /// RNG used by random transforms for the batch currently being loaded.
    pub static WORKER_RNG: RefCell<Option<StdRng>> = const { RefCell::new(None) };
}

/// Seeds this thread's RNG for one batch.
/// Seed formula: base_seed + (epoch << 32) + batch_index
pub fn init_batch_rng(base_seed: u64, epoch: usize, batch_index: usize) {
    WORKER_RNG.with(|rng| {
        let seed = base_seed
            .wrapping_add((epoch as u64) << 32)
            .wrapping_add(batch_index as u64);
        *rng.borrow_mut() = Some(StdRng::seed_from_u64(seed));
    })
}

/// Runs `f` with the batch RNG, or with the thread RNG outside of a loader.
fn with_worker_rng<T>(f: impl FnOnce(&mut dyn rand::RngCore) -> T) -> T {
    WORKER_RNG.with(|rng| {
        let mut rng_ref = rng.borrow_mut();
        match rng_ref.as_mut() {
            Some(rng) => f(rng),
            None => f(&mut rand::rng()),
        }
    })
}

/// Random bool with probability `p` from the batch RNG.
/// Used by transforms like RandomHorizontalFlip to ensure determinism.
pub fn worker_gen_bool(p: f64) -> bool {
    with_worker_rng(|rng| rng.random_bool(p))
}

/// Uniform sample from `range` using the batch RNG.
pub fn worker_gen_range<T, R>(range: R) -> T
where
    T: SampleUniform,
    R: SampleRange<T>,
{
    with_worker_rng(|rng| rng.random_range(range))
}

/// Shuffles `items` in place with the batch RNG.
pub fn worker_shuffle<T>(items: &mut [T]) {
    with_worker_rng(|rng| items.shuffle(rng))
}
