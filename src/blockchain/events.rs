use log::trace;
use serde::Serialize;
use tokio::sync::broadcast;

use super::{Address, Amount, FlightId, FlightStatus};
use crate::consensus::sharding::{IndexTriple, ShardIndex};

/// Default number of notifications buffered per subscriber.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Notifications emitted by successful ledger calls, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LedgerEvent {
    AirlineRegistered {
        airline: Address,
        sponsor: Address,
    },
    AirlineVoted {
        candidate: Address,
        voter: Address,
        votes: usize,
        required: usize,
    },
    AirlineFunded {
        airline: Address,
        total_funding: Amount,
    },
    FlightRegistered {
        airline: Address,
        flight: FlightId,
        timestamp: u64,
    },
    InsurancePurchased {
        insuree: Address,
        flight: FlightId,
        premium: Amount,
    },
    OracleRegistered {
        oracle: Address,
        indexes: IndexTriple,
    },
    RequestOpened {
        index: ShardIndex,
        airline: Address,
        flight: FlightId,
        timestamp: u64,
    },
    ResponseRecorded {
        oracle: Address,
        index: ShardIndex,
        flight: FlightId,
        timestamp: u64,
        code: FlightStatus,
    },
    StatusFinalized {
        flight: FlightId,
        timestamp: u64,
        code: FlightStatus,
    },
    InsureeCredited {
        insuree: Address,
        flight: FlightId,
        amount: Amount,
    },
    CreditWithdrawn {
        insuree: Address,
        amount: Amount,
    },
    OperationalChanged {
        operational: bool,
    },
}

/// Broadcast fan-out of ledger notifications. Every subscriber sees every
/// event published after it subscribed.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LedgerEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, events: Vec<LedgerEvent>) {
        for event in events {
            // No subscribers is not an error.
            if self.sender.send(event).is_err() {
                trace!("Ledger event dropped, no subscribers");
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
