/// Random treasure placement.
///
/// Two independent draws per board:
///   - cell indices: `amount` distinct indices, uniformly at random
///   - kinds: taken from a shuffled queue of every `TreasureKind`,
///     refilled and reshuffled whenever it runs dry
///
/// Everything goes through `SessionRng`, so a fixed seed reproduces a board.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::treasure::TreasureKind;

pub struct SessionRng {
    rng: StdRng,
    seed: u64,
}

impl SessionRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn from_random() -> Self {
        let seed: u64 = rand::rng().random();
        Self::new(seed)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }

    /// `amount` distinct indices in `0..length`, in random order.
    /// `amount` is clamped to `length`.
    pub fn distinct_indices(&mut self, length: usize, amount: usize) -> Vec<usize> {
        rand::seq::index::sample(&mut self.rng, length, amount.min(length)).into_vec()
    }
}

/// Draw-without-replacement queue over `TreasureKind::ALL`.
#[derive(Debug, Default)]
pub struct TreasureSampler {
    queue: Vec<TreasureKind>,
    refills: usize,
}

impl TreasureSampler {
    pub fn new() -> Self {
        TreasureSampler::default()
    }

    pub fn draw(&mut self, rng: &mut SessionRng) -> TreasureKind {
        if self.queue.is_empty() {
            self.queue.extend_from_slice(&TreasureKind::ALL);
            rng.shuffle(&mut self.queue);
            self.refills += 1;
        }
        // Queue was refilled above, so it is never empty here.
        self.queue.pop().unwrap_or(TreasureKind::Star)
    }

    /// How many times the queue has been (re)filled.
    pub fn refills(&self) -> usize {
        self.refills
    }
}

/// Pick treasure cells for a grid of `cell_count` cells.
/// Returns `(cell index, kind)` pairs; indices are distinct.
pub fn place_treasures(
    cell_count: usize,
    treasures: usize,
    rng: &mut SessionRng,
) -> Vec<(usize, TreasureKind)> {
    let indices = rng.distinct_indices(cell_count, treasures);
    let mut sampler = TreasureSampler::new();
    let placed: Vec<_> = indices
        .into_iter()
        .map(|idx| (idx, sampler.draw(rng)))
        .collect();
    tracing::debug!(placed = placed.len(), refills = sampler.refills(), "treasures buried");
    placed
}
