use crate::error::ReidDataError;
use crate::index::SampleIndex;
use anyhow::{ensure, Result};
use rand::seq::SliceRandom;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::VecDeque;

/// A `Sampler` defines the order in which sample positions are drawn for one epoch.
///
/// # Associated type
/// - `Item`: `usize` positions for index samplers, `Vec<usize>` for batch samplers.
///
/// # Method
/// - `iter(epoch)`: returns the sequence for that epoch. Random samplers derive
///   their RNG from `base_seed` and `epoch`, so the same `(seed, epoch)` pair always
///   reproduces the same order while successive epochs reshuffle.
///
/// Implementations must be `Send + Sync` so a loader holding one can be moved to
/// or shared with other threads.
pub trait Sampler: Send + Sync {
    type Item: Send + Sync;

    fn iter(&self, epoch: usize) -> Box<dyn Iterator<Item = Self::Item> + Send + '_>;
}

/// Tag mixed into plan seeds. Batch augmentation RNGs are seeded from the same base
/// seed (`init_batch_rng`), and the two streams must not line up.
const PLAN_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

#[inline]
fn derive_rng_for_epoch(base_seed: u64, epoch: usize) -> StdRng {
    StdRng::seed_from_u64((base_seed ^ PLAN_STREAM).wrapping_add(epoch as u64))
}

/// ============================================================================
/// Yields positions sequentially `(0, 1, ..., dataset_size - 1)`.
///
/// Used for query/gallery evaluation where the order must be identical on every pass.
#[derive(Debug, Clone)]
pub struct SequentialSampler {
    dataset_size: usize,
}

impl SequentialSampler {
    pub fn new(dataset_size: usize) -> Self {
        Self { dataset_size }
    }
}

impl Sampler for SequentialSampler {
    type Item = usize;

    fn iter(&self, _epoch: usize) -> Box<dyn Iterator<Item = usize> + Send + '_> {
        Box::new(0..self.dataset_size)
    }
}

/// ============================================================================
/// Uniform random permutation of `0..dataset_size`, reshuffled every epoch.
///
/// # Example
/// ```ignore
/// let sampler = RandomSampler::new(1000, 42)?;
/// let epoch0: Vec<_> = sampler.iter(0).collect();
/// let epoch1: Vec<_> = sampler.iter(1).collect(); // different permutation
/// ```
#[derive(Debug, Clone)]
pub struct RandomSampler {
    dataset_size: usize,
    base_seed: u64,
}

impl RandomSampler {
    pub fn new(dataset_size: usize, base_seed: u64) -> Result<Self> {
        ensure!(
            dataset_size > 0,
            "RandomSampler needs a non-empty dataset, but got dataset_size={}",
            dataset_size
        );
        Ok(Self {
            dataset_size,
            base_seed,
        })
    }
}

impl Sampler for RandomSampler {
    type Item = usize;

    fn iter(&self, epoch: usize) -> Box<dyn Iterator<Item = usize> + Send + '_> {
        let mut rng = derive_rng_for_epoch(self.base_seed, epoch);
        let mut positions: Vec<usize> = (0..self.dataset_size).collect();
        positions.shuffle(&mut rng);
        Box::new(positions.into_iter())
    }
}

/// ============================================================================
/// Wraps a [`Sampler`] to yield groups of `batch_size` positions.
///
/// If `drop_last` is `true`, a trailing group smaller than `batch_size` is discarded.
///
/// # Example
/// ```ignore
/// let batch_sampler = BatchSampler::new(SequentialSampler::new(10), 4, false)?;
/// // [[0, 1, 2, 3], [4, 5, 6, 7], [8, 9]]
/// ```
#[derive(Debug, Clone)]
pub struct BatchSampler<S> {
    sampler: S,
    batch_size: usize,
    drop_last: bool,
}

impl<S: Sampler> BatchSampler<S> {
    pub fn new(sampler: S, batch_size: usize, drop_last: bool) -> Result<Self> {
        ensure!(
            batch_size > 0,
            "batch_size must be > 0, but got batch_size={}",
            batch_size
        );
        Ok(Self {
            sampler,
            batch_size,
            drop_last,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn inner(&self) -> &S {
        &self.sampler
    }
}

impl<S: Sampler> Sampler for BatchSampler<S> {
    type Item = Vec<S::Item>;

    fn iter(&self, epoch: usize) -> Box<dyn Iterator<Item = Self::Item> + Send + '_> {
        let mut sampler_iter = self.sampler.iter(epoch);
        let batch_size = self.batch_size;
        let drop_last = self.drop_last;

        Box::new(std::iter::from_fn(move || {
            let mini_batch: Vec<_> = sampler_iter.by_ref().take(batch_size).collect();
            if mini_batch.len() == batch_size || (!drop_last && !mini_batch.is_empty()) {
                Some(mini_batch)
            } else {
                None
            }
        }))
    }
}

/// ============================================================================
/// Builds one epoch's P×K permutation plan from a [`SampleIndex`].
///
/// The returned sequence splits into consecutive groups of `p * k` positions; each
/// group holds `p` distinct identities contributing exactly `k` positions each.
///
/// # Algorithm
/// 1. Every identity is turned into K-runs. Its positions are shuffled and cut into
///    disjoint runs of `k`. A final short run, or an identity with fewer than `k`
///    samples, is topped up by drawing with replacement from the identity's own
///    positions, so every run is exactly `k` long.
/// 2. Each identity's queue of runs is shuffled.
/// 3. Identities are shuffled into a cyclic queue. Groups are formed by popping `p`
///    identities from the front (they are distinct because an identity is queued at
///    most once), taking one run from each, and re-queueing those that still hold
///    runs. Once fewer than `p` identities remain, the leftover runs are dropped.
/// 4. Groups are concatenated in the order they were formed.
///
/// `p` and `k` must be non-zero and `p <= index.num_identities()`; use
/// [`IdentityBalancedSampler`] for validation and the clamping policy.
pub fn plan_with_rng<R: Rng + ?Sized>(
    index: &SampleIndex,
    p: usize,
    k: usize,
    rng: &mut R,
) -> Vec<usize> {
    let mut runs_per_identity: Vec<VecDeque<Vec<usize>>> = index
        .iter()
        .map(|(_, positions)| {
            let mut runs = split_into_runs(positions, k, rng);
            runs.shuffle(rng);
            VecDeque::from(runs)
        })
        .collect();

    let mut order: Vec<usize> = (0..runs_per_identity.len()).collect();
    order.shuffle(rng);
    let mut available: VecDeque<usize> = order.into();

    let mut plan = Vec::with_capacity(index.len() + p * k);
    while available.len() >= p {
        let group: Vec<usize> = available.drain(..p).collect();
        for slot in group {
            let runs = &mut runs_per_identity[slot];
            if let Some(run) = runs.pop_front() {
                plan.extend(run);
            }
            if !runs.is_empty() {
                available.push_back(slot);
            }
        }
    }
    plan
}

/// Cuts one identity's positions into runs of exactly `k`.
fn split_into_runs<R: Rng + ?Sized>(positions: &[usize], k: usize, rng: &mut R) -> Vec<Vec<usize>> {
    let mut shuffled = positions.to_vec();
    shuffled.shuffle(rng);

    shuffled
        .chunks(k)
        .map(|chunk| {
            let mut run = chunk.to_vec();
            while run.len() < k {
                run.push(positions[rng.random_range(0..positions.len())]);
            }
            run.shuffle(rng);
            run
        })
        .collect()
}

/// Identity-balanced sampler for metric-learning batches (P identities × K instances).
///
/// # Arguments
/// - `index`: identity index over the training samples
/// - `p`: identities per batch (must be >= 1)
/// - `k`: instances per identity per batch (must be >= 1)
/// - `base_seed`: base RNG seed; every epoch derives its own RNG from it
///
/// # Degraded batches
/// When `p` exceeds the number of identities it is clamped to that number and a
/// warning is logged; every batch then holds all identities. Call
/// [`identities_per_batch`](Self::identities_per_batch) for the effective value.
///
/// # Example
/// ```ignore
/// let sampler = IdentityBalancedSampler::new(index, 16, 4, 42)?;
/// let batches = BatchSampler::new(sampler, 64, true)?;
/// ```
#[derive(Debug, Clone)]
pub struct IdentityBalancedSampler {
    index: SampleIndex,
    p: usize,
    k: usize,
    base_seed: u64,
}

impl IdentityBalancedSampler {
    pub fn new(index: SampleIndex, p: usize, k: usize, base_seed: u64) -> Result<Self> {
        if p == 0 || k == 0 {
            return Err(ReidDataError::InvalidSamplingParams {
                p,
                k,
                reason: "p and k must both be at least 1".into(),
            }
            .into());
        }

        let num_identities = index.num_identities();
        let effective_p = if p > num_identities {
            log::warn!(
                "p={} exceeds the {} available identities; clamping to p={} (degraded batches of {} samples)",
                p,
                num_identities,
                num_identities,
                num_identities * k
            );
            num_identities
        } else {
            p
        };

        Ok(Self {
            index,
            p: effective_p,
            k,
            base_seed,
        })
    }

    /// Effective number of identities per batch (after clamping).
    pub fn identities_per_batch(&self) -> usize {
        self.p
    }

    pub fn instances_per_identity(&self) -> usize {
        self.k
    }

    /// `p * k`
    pub fn batch_size(&self) -> usize {
        self.p * self.k
    }

    pub fn index(&self) -> &SampleIndex {
        &self.index
    }

    /// The permutation plan for `epoch`.
    pub fn plan(&self, epoch: usize) -> Vec<usize> {
        let mut rng = derive_rng_for_epoch(self.base_seed, epoch);
        plan_with_rng(&self.index, self.p, self.k, &mut rng)
    }
}

impl Sampler for IdentityBalancedSampler {
    type Item = usize;

    fn iter(&self, epoch: usize) -> Box<dyn Iterator<Item = usize> + Send + '_> {
        Box::new(self.plan(epoch).into_iter())
    }
}
