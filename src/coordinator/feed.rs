//! Where simulated oracles get the status codes they report.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::blockchain::{Address, FlightStatus};
use crate::config::FeedMode;
use crate::consensus::RequestKey;

/// Source of the status code an oracle reports for a request.
#[async_trait]
pub trait StatusFeed: Send + Sync {
    async fn status_for(&self, key: &RequestKey, oracle: &Address) -> FlightStatus;
}

/// Draws uniformly from every status code on each call.
pub struct RandomStatusFeed {
    rng: Mutex<ChaCha20Rng>,
}

impl RandomStatusFeed {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_entropy(),
        };
        Self { rng: Mutex::new(rng) }
    }
}

#[async_trait]
impl StatusFeed for RandomStatusFeed {
    async fn status_for(&self, _key: &RequestKey, _oracle: &Address) -> FlightStatus {
        let mut rng = self.rng.lock();
        FlightStatus::ALL
            .choose(&mut *rng)
            .copied()
            .unwrap_or(FlightStatus::Unknown)
    }
}

/// Always reports the same code.
#[derive(Debug, Clone, Copy)]
pub struct FixedStatusFeed(pub FlightStatus);

#[async_trait]
impl StatusFeed for FixedStatusFeed {
    async fn status_for(&self, _key: &RequestKey, _oracle: &Address) -> FlightStatus {
        self.0
    }
}

pub fn feed_for_mode(mode: FeedMode, seed: Option<u64>) -> Arc<dyn StatusFeed> {
    match mode {
        FeedMode::Random => Arc::new(RandomStatusFeed::new(seed)),
        FeedMode::OnTime => Arc::new(FixedStatusFeed(FlightStatus::OnTime)),
        FeedMode::LateAirline => Arc::new(FixedStatusFeed(FlightStatus::LateAirline)),
    }
}
