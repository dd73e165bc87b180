use std::sync::atomic::Ordering;
use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::mpsc;

use super::feed::StatusFeed;
use super::CoordinatorStats;
use crate::blockchain::{Address, SharedLedger};
use crate::consensus::{RequestKey, ResponseOutcome};

/// One response to submit for a request the oracle is eligible for.
#[derive(Debug, Clone)]
pub struct SubmissionJob {
    pub key: RequestKey,
    /// 0 for the first dispatch, then one per resubmission sweep.
    pub round: u32,
}

/// Runs until the dispatcher drops the sending half.
pub(crate) async fn run_worker(
    oracle: Address,
    ledger: SharedLedger,
    feed: Arc<dyn StatusFeed>,
    mut jobs: mpsc::Receiver<SubmissionJob>,
    stats: Arc<CoordinatorStats>,
) {
    while let Some(job) = jobs.recv().await {
        let code = feed.status_for(&job.key, &oracle).await;
        let key = job.key;

        match ledger.submit_response(key.index, key.airline, key.flight.clone(), key.timestamp, code, oracle) {
            Ok(outcome) => {
                stats.submitted.fetch_add(1, Ordering::Relaxed);
                match outcome {
                    ResponseOutcome::Finalized { code } => {
                        stats.finalized.fetch_add(1, Ordering::Relaxed);
                        debug!("Oracle {} finalized {} as {}", oracle.short(), key, code);
                    }
                    ResponseOutcome::Recorded { code, votes } => {
                        debug!(
                            "Oracle {} reported {} for {} (round {}, {} votes)",
                            oracle.short(),
                            code,
                            key,
                            job.round,
                            votes
                        );
                    }
                    ResponseOutcome::LateDissent { finalized } => {
                        debug!("Oracle {} dissented on {} already finalized as {}", oracle.short(), key, finalized);
                    }
                }
            }
            Err(e) if e.is_expected_race() => {
                stats.rejected.fetch_add(1, Ordering::Relaxed);
                debug!("Oracle {} lost race on {}: {}", oracle.short(), key, e);
            }
            Err(e) => {
                stats.rejected.fetch_add(1, Ordering::Relaxed);
                warn!("Oracle {} submission for {} failed: {}", oracle.short(), key, e);
            }
        }
    }
    debug!("Oracle worker {} stopped", oracle.short());
}
