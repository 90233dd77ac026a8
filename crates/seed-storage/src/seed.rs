use serde::{Deserialize, Serialize};

/// A world seed together with where its search started, how much work it took,
/// and the filter it satisfies.
///
/// Both counters at zero means no search has run yet; such a seed is a pending
/// placeholder and its `seed` field carries no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Seed {
    filter: String,
    start: i64,
    structure_seeds_checked: u64,
    biome_seeds_checked: u64,
    seed: i64,
}

impl Seed {
    /// A placeholder describing where a search under `filter` should begin.
    pub fn new(filter: impl Into<String>, start: i64) -> Self {
        Self {
            filter: filter.into(),
            start,
            structure_seeds_checked: 0,
            biome_seeds_checked: 0,
            seed: 0,
        }
    }

    pub fn found(
        filter: impl Into<String>,
        start: i64,
        structure_seeds_checked: u64,
        biome_seeds_checked: u64,
        seed: i64,
    ) -> Self {
        Self {
            filter: filter.into(),
            start,
            structure_seeds_checked,
            biome_seeds_checked,
            seed,
        }
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Linear offset or RNG seed the search started from.
    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn structure_seeds_checked(&self) -> u64 {
        self.structure_seeds_checked
    }

    pub fn biome_seeds_checked(&self) -> u64 {
        self.biome_seeds_checked
    }

    /// Raw seed field, whether or not a search produced it.
    pub fn seed(&self) -> i64 {
        self.seed
    }

    pub fn is_valid(&self) -> bool {
        !self.filter.is_empty()
    }

    pub fn is_searched(&self) -> bool {
        self.structure_seeds_checked != 0 || self.biome_seeds_checked != 0
    }

    /// The world seed, once a search has actually produced one.
    pub fn world_seed(&self) -> Option<i64> {
        self.is_searched().then_some(self.seed)
    }
}
