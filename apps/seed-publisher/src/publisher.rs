//! Glue between the local seed queue and the seed bank.

use std::num::NonZeroUsize;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use seed_storage::{Seed, SeedListener, SeedStorage};
use seedbank_client::{ExchangeError, FailureKind, SeedBankClient};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("authorization failed: {0}")]
    Authorize(#[source] ExchangeError),
    #[error("fetching the initial filter failed: {0}")]
    Categories(#[source] ExchangeError),
}

impl PublishError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PublishError::Authorize(err) | PublishError::Categories(err) => err.kind(),
        }
    }
}

/// Session established by [`Publisher::bootstrap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bootstrap {
    pub expires_at: DateTime<Utc>,
    pub filter: String,
}

/// Outcome of one [`Publisher::pump`] pass.
#[derive(Debug, Default)]
pub struct PumpReport {
    pub submitted: usize,
    /// Placeholders and filterless seeds dropped without submitting.
    pub skipped: usize,
    /// Filter returned by the last successful submit.
    pub filter: Option<String>,
    /// The seed whose submit failed, already taken off the queue.
    pub unsent: Option<(Seed, FailureKind)>,
}

/// Drains a [`SeedStorage`] into a [`SeedBankClient`].
///
/// Failures are reported, never retried; what to do next is up to the caller.
pub struct Publisher {
    storage: Arc<SeedStorage>,
    client: Arc<SeedBankClient>,
    announcer: Arc<dyn SeedListener>,
}

impl Publisher {
    pub fn new(storage: Arc<SeedStorage>, client: Arc<SeedBankClient>) -> Self {
        let announcer: Arc<dyn SeedListener> = Arc::new(|seed: &Seed| {
            debug!(
                target: "seedbank::publisher",
                filter = %seed.filter(),
                start = seed.start(),
                world_seed = ?seed.world_seed(),
                "seed discovered"
            );
        });
        storage.add_listener(Arc::clone(&announcer));
        Self {
            storage,
            client,
            announcer,
        }
    }

    pub fn storage(&self) -> &Arc<SeedStorage> {
        &self.storage
    }

    pub fn client(&self) -> &Arc<SeedBankClient> {
        &self.client
    }

    /// Authorize, then fetch the filter to search under.
    pub fn bootstrap(&self) -> Result<Bootstrap, PublishError> {
        let expires_at = self.client.try_authorize().map_err(PublishError::Authorize)?;
        let filter = self
            .client
            .try_get_categories()
            .map_err(PublishError::Categories)?;
        info!(target: "seedbank::publisher", %expires_at, filter = %filter, "session ready");
        Ok(Bootstrap { expires_at, filter })
    }

    /// Submit queued seeds until the queue is empty, `limit` submits have
    /// succeeded, or one fails.
    ///
    /// Every seed taken off the queue is consumed, including unsearched
    /// placeholders, so a search engine sharing this storage will not see
    /// them through `get_seed` afterwards.
    pub fn pump(&self, limit: Option<usize>) -> PumpReport {
        let mut report = PumpReport::default();
        while limit.map_or(true, |max| report.submitted < max) {
            let Some(seed) = self.storage.get_seed() else {
                break;
            };
            let Some(world_seed) = seed.world_seed().filter(|_| seed.is_valid()) else {
                debug!(
                    target: "seedbank::publisher",
                    filter = %seed.filter(),
                    start = seed.start(),
                    "dropping unsearched seed"
                );
                report.skipped += 1;
                continue;
            };

            match self.client.try_submit(world_seed) {
                Ok(next) => {
                    report.submitted += 1;
                    report.filter = Some(next);
                }
                Err(err) => {
                    warn!(
                        target: "seedbank::publisher",
                        world_seed,
                        kind = %err.kind(),
                        error = %err,
                        "submit failed; stopping"
                    );
                    report.unsent = Some((seed, err.kind()));
                    break;
                }
            }
        }
        report
    }
}

impl Drop for Publisher {
    fn drop(&mut self) {
        self.storage.remove_listener(&self.announcer);
    }
}

/// Resolve the `--threads` option: zero or negative means every available core.
pub fn worker_count(threads: i32) -> usize {
    match usize::try_from(threads) {
        Ok(n) if n > 0 => n,
        _ => std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1),
    }
}
