//! Off-ledger oracle coordinator.
//!
//! A single dispatch task reads ledger notifications and fans submission jobs
//! out over bounded channels to one worker task per owned oracle identity.
//! A periodic sweep re-drives requests that are still open, so a tally that
//! misses quorum on the first pass gets fresh codes until it resolves or the
//! round limit is reached.

pub mod feed;
pub mod pool;
pub mod worker;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use log::{debug, info, warn};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

pub use feed::{feed_for_mode, FixedStatusFeed, RandomStatusFeed, StatusFeed};
pub use pool::{OracleIdentity, OraclePool};
pub use worker::SubmissionJob;

use crate::blockchain::{Address, Amount, FlightId, LedgerEvent, SharedLedger};
use crate::config::CoordinatorConfig;
use crate::consensus::RequestKey;
use crate::errors::{SuretyError, SuretyResult};
use crate::utils::format_time_diff;

#[derive(Debug, Default)]
pub struct CoordinatorStats {
    pub notifications: AtomicU64,
    pub dispatched: AtomicU64,
    pub dropped: AtomicU64,
    pub resubmitted: AtomicU64,
    pub submitted: AtomicU64,
    pub finalized: AtomicU64,
    pub rejected: AtomicU64,
    pub abandoned: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatsSnapshot {
    pub notifications: u64,
    pub dispatched: u64,
    pub dropped: u64,
    pub resubmitted: u64,
    pub submitted: u64,
    pub finalized: u64,
    pub rejected: u64,
    pub abandoned: u64,
}

impl CoordinatorStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            notifications: self.notifications.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            resubmitted: self.resubmitted.load(Ordering::Relaxed),
            submitted: self.submitted.load(Ordering::Relaxed),
            finalized: self.finalized.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
        }
    }
}

pub struct OracleCoordinator {
    ledger: SharedLedger,
    pool: OraclePool,
    feed: Arc<dyn StatusFeed>,
    config: CoordinatorConfig,
}

impl OracleCoordinator {
    pub fn new(
        ledger: SharedLedger,
        pool: OraclePool,
        feed: Arc<dyn StatusFeed>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            ledger,
            pool,
            feed,
            config,
        }
    }

    /// Registers any identities that are not registered yet, subscribes to
    /// the ledger and spawns the dispatcher and workers. Requests already
    /// open on the ledger are picked up immediately.
    pub fn start(mut self, registration_fee: Amount) -> SuretyResult<CoordinatorHandle> {
        if !self.pool.is_registered() {
            self.pool.register_all(&self.ledger, registration_fee)?;
        }

        let events = self.ledger.subscribe();
        let stats = Arc::new(CoordinatorStats::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut senders = HashMap::with_capacity(self.pool.len());
        let mut workers = Vec::with_capacity(self.pool.len());
        for identity in self.pool.identities() {
            let (tx, rx) = mpsc::channel(self.config.channel_capacity);
            senders.insert(identity.address, tx);
            workers.push(tokio::spawn(worker::run_worker(
                identity.address,
                self.ledger.clone(),
                Arc::clone(&self.feed),
                rx,
                Arc::clone(&stats),
            )));
        }

        info!(
            "Oracle coordinator started with {} workers, resubmit every {}ms",
            workers.len(),
            self.config.resubmit_interval_ms
        );

        let dispatcher = Dispatcher {
            ledger: self.ledger,
            pool: self.pool,
            senders,
            pending: HashMap::new(),
            stats: Arc::clone(&stats),
            resubmit_interval: Duration::from_millis(self.config.resubmit_interval_ms),
            max_rounds: self.config.max_resubmit_rounds,
        };
        let dispatcher = tokio::spawn(dispatcher.run(events, shutdown_rx));

        Ok(CoordinatorHandle {
            shutdown: shutdown_tx,
            dispatcher,
            workers,
            stats,
        })
    }
}

pub struct CoordinatorHandle {
    shutdown: watch::Sender<bool>,
    dispatcher: JoinHandle<()>,
    workers: Vec<JoinHandle<()>>,
    stats: Arc<CoordinatorStats>,
}

impl CoordinatorHandle {
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Stops dispatching; workers drain their queues and exit.
    pub async fn shutdown(self) -> SuretyResult<StatsSnapshot> {
        let _ = self.shutdown.send(true);
        self.dispatcher
            .await
            .map_err(|e| SuretyError::ChannelClosed(format!("dispatcher: {}", e)))?;
        for joined in join_all(self.workers).await {
            joined.map_err(|e| SuretyError::ChannelClosed(format!("worker: {}", e)))?;
        }
        let snapshot = self.stats.snapshot();
        info!("Oracle coordinator stopped: {:?}", snapshot);
        Ok(snapshot)
    }
}

struct Dispatcher {
    ledger: SharedLedger,
    pool: OraclePool,
    senders: HashMap<Address, mpsc::Sender<SubmissionJob>>,
    /// Requests dispatched and not yet seen resolved, with their sweep round.
    pending: HashMap<RequestKey, u32>,
    stats: Arc<CoordinatorStats>,
    resubmit_interval: Duration,
    max_rounds: u32,
}

impl Dispatcher {
    async fn run(mut self, mut events: broadcast::Receiver<LedgerEvent>, mut shutdown_rx: watch::Receiver<bool>) {
        self.resync();

        let mut sweep = tokio::time::interval(self.resubmit_interval);
        sweep.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        sweep.tick().await;

        loop {
            tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        debug!("Coordinator dispatcher shutting down");
                        break;
                    }
                }
                _ = sweep.tick() => self.sweep(),
                event = events.recv() => {
                    match event {
                        Ok(LedgerEvent::RequestOpened { index, airline, flight, timestamp }) => {
                            self.stats.notifications.fetch_add(1, Ordering::Relaxed);
                            self.on_request_opened(RequestKey::new(index, airline, flight, timestamp));
                        }
                        Ok(LedgerEvent::StatusFinalized { flight, timestamp, code }) => {
                            debug!("{}@{} finalized as {}", flight, timestamp, code);
                            self.forget_flight(&flight, timestamp);
                        }
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!("Coordinator lagged {} ledger events, resyncing", skipped);
                            self.resync();
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            debug!("Ledger event stream closed");
                            break;
                        }
                    }
                }
            }
        }
    }

    fn on_request_opened(&mut self, key: RequestKey) {
        if self.pending.contains_key(&key) {
            debug!("Duplicate notification for {} ignored", key);
            return;
        }
        if !self.ledger.is_request_open(&key) {
            debug!("Notification for resolved {} ignored", key);
            return;
        }
        self.pending.insert(key.clone(), 0);
        self.dispatch(&key, 0);
    }

    fn forget_flight(&mut self, flight: &FlightId, timestamp: u64) {
        self.pending
            .retain(|key, _| !(key.flight == *flight && key.timestamp == timestamp));
    }

    /// Adopts every open request the ledger knows about.
    fn resync(&mut self) {
        for key in self.ledger.open_requests() {
            if !self.pending.contains_key(&key) {
                self.pending.insert(key.clone(), 0);
                self.dispatch(&key, 0);
            }
        }
    }

    fn sweep(&mut self) {
        let mut redo = Vec::new();
        let mut abandon = Vec::new();
        for (key, round) in self.pending.iter_mut() {
            if !self.ledger.is_request_open(key) {
                abandon.push((key.clone(), false));
                continue;
            }
            *round += 1;
            if *round > self.max_rounds {
                abandon.push((key.clone(), true));
            } else {
                redo.push((key.clone(), *round));
            }
        }

        for (key, gave_up) in abandon {
            self.pending.remove(&key);
            if gave_up {
                self.stats.abandoned.fetch_add(1, Ordering::Relaxed);
                let opened = self
                    .ledger
                    .request(&key)
                    .map(|r| format_time_diff(r.opened_at, true))
                    .unwrap_or_default();
                warn!("Giving up on {} after {} rounds, opened {}", key, self.max_rounds, opened);
            }
        }
        for (key, round) in redo {
            self.stats.resubmitted.fetch_add(1, Ordering::Relaxed);
            self.dispatch(&key, round);
        }
    }

    fn dispatch(&self, key: &RequestKey, round: u32) {
        let mut eligible = 0;
        for identity in self.pool.matching(key.index) {
            let Some(sender) = self.senders.get(&identity.address) else {
                continue;
            };
            eligible += 1;
            let job = SubmissionJob {
                key: key.clone(),
                round,
            };
            match sender.try_send(job) {
                Ok(()) => {
                    self.stats.dispatched.fetch_add(1, Ordering::Relaxed);
                }
                Err(mpsc::error::TrySendError::Full(_)) => {
                    self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                    debug!("Worker {} queue full, dropped job for {}", identity.address.short(), key);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    warn!("Worker {} stopped, job for {} lost", identity.address.short(), key);
                }
            }
        }
        if eligible == 0 {
            debug!("No owned oracle holds index {} for {}", key.index, key);
        }
    }
}
