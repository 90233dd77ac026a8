use crate::Seed;

/// Receives every seed accepted by a [`crate::SeedStorage`] it is registered with.
///
/// Called synchronously on the producer's thread; the same `Seed` is shown to every
/// listener in turn, so clone it if you need to keep it.
pub trait SeedListener: Send + Sync {
    fn new_seed(&self, seed: &Seed);
}

impl<F> SeedListener for F
where
    F: Fn(&Seed) + Send + Sync,
{
    fn new_seed(&self, seed: &Seed) {
        self(seed)
    }
}
