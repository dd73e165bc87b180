#![allow(dead_code)]

use std::time::Duration;

use flightsurety_core::blockchain::{Address, EventBus, FlightId, SharedLedger, SuretyLedger};
use flightsurety_core::config::ProtocolParams;
use flightsurety_core::consensus::EntropySource;

pub const FLIGHT_TS: u64 = 1_700_000_000;

pub fn airline(n: u64) -> Address {
    Address::from_low_u64(n)
}

pub fn owner() -> Address {
    Address::from_low_u64(9_999)
}

pub fn flight() -> FlightId {
    FlightId::from("ND1309")
}

/// Ledger with airline 1 as the unfunded genesis airline.
pub fn new_ledger(entropy: Box<dyn EntropySource>) -> SharedLedger {
    let state = SuretyLedger::new(&ProtocolParams::default(), owner(), airline(1), true, entropy);
    SharedLedger::new(state, EventBus::new(256))
}

pub async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .is_ok()
}
