use super::*;
use crate::config::presets::{FUND_THRESHOLD, REGISTRATION_FEE};
use crate::config::ProtocolParams;
use crate::consensus::{EntropySource, ScriptedEntropy};
use tokio::sync::broadcast;

mod flight_tests;
mod insurance_tests;

pub const FLIGHT_TS: u64 = 1_700_000_000;

pub fn addr(n: u64) -> Address {
    Address::from_low_u64(n)
}

pub fn owner() -> Address {
    addr(1000)
}

pub fn genesis() -> Address {
    addr(1)
}

pub fn flight_id() -> FlightId {
    FlightId::from("ND1309")
}

pub fn ledger_with(params: &ProtocolParams, entropy: Box<dyn EntropySource>) -> SharedLedger {
    let ledger = SuretyLedger::new(params, owner(), genesis(), true, entropy);
    SharedLedger::new(ledger, EventBus::new(64))
}

/// Every shard draw is 7, so every oracle can answer every request.
pub fn test_ledger() -> SharedLedger {
    ledger_with(&ProtocolParams::default(), Box::new(ScriptedEntropy::new(vec![7])))
}

/// Genesis funded and flight ND1309 registered at `FLIGHT_TS`.
pub fn ledger_with_flight(params: &ProtocolParams) -> SharedLedger {
    let ledger = ledger_with(params, Box::new(ScriptedEntropy::new(vec![7])));
    ledger.fund_airline(genesis(), FUND_THRESHOLD).unwrap();
    ledger.register_flight(genesis(), FLIGHT_TS, flight_id()).unwrap();
    ledger
}

pub fn register_oracles(ledger: &SharedLedger, count: u64) -> Vec<Address> {
    (0..count)
        .map(|n| {
            let oracle = addr(500 + n);
            ledger.register_oracle(oracle, REGISTRATION_FEE).unwrap();
            oracle
        })
        .collect()
}

pub fn drain(rx: &mut broadcast::Receiver<LedgerEvent>) -> Vec<LedgerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
