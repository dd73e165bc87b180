mod common;

use std::sync::Arc;

use common::*;
use flightsurety_core::blockchain::{FlightStatus, UNIT};
use flightsurety_core::config::presets::{FUND_THRESHOLD, REGISTRATION_FEE};
use flightsurety_core::config::CoordinatorConfig;
use flightsurety_core::consensus::{ResponseOutcome, ScriptedEntropy};
use flightsurety_core::coordinator::{FixedStatusFeed, OracleCoordinator, OraclePool};
use flightsurety_core::errors::SuretyError;
use flightsurety_core::{Address, SharedLedger};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn insured_ledger(entropy: Box<dyn flightsurety_core::EntropySource>) -> (SharedLedger, Address) {
    let ledger = new_ledger(entropy);
    ledger.fund_airline(airline(1), FUND_THRESHOLD).unwrap();
    ledger.register_flight(airline(1), FLIGHT_TS, flight()).unwrap();
    let passenger = Address::from_low_u64(42);
    ledger.buy_insurance(&flight(), passenger, UNIT).unwrap();
    (ledger, passenger)
}

#[test]
fn test_three_matching_oracles_pay_out() {
    // Five oracles draw [0,1,2] [3,4,5] [6,7,2] [2,8,9] [9,9,9]; the request draws index 2.
    let script = vec![0, 1, 2, 3, 4, 5, 6, 7, 2, 2, 8, 9, 9, 9, 9, 2];
    let (ledger, passenger) = insured_ledger(Box::new(ScriptedEntropy::new(script)));

    let oracles: Vec<Address> = (0..5).map(|n| Address::from_low_u64(100 + n)).collect();
    for oracle in &oracles {
        ledger.register_oracle(*oracle, REGISTRATION_FEE).unwrap();
    }
    let key = ledger.request_status(airline(1), flight(), FLIGHT_TS).unwrap();
    assert_eq!(key.index, 2);

    let (eligible, foreign): (Vec<Address>, Vec<Address>) = oracles
        .iter()
        .partition(|oracle| ledger.oracle_indexes(oracle).unwrap().contains(key.index));
    assert_eq!(eligible, vec![oracles[0], oracles[2], oracles[3]]);

    for outsider in &foreign {
        assert!(matches!(
            ledger.submit_response(key.index, airline(1), flight(), FLIGHT_TS, FlightStatus::LateAirline, *outsider),
            Err(SuretyError::Unauthorized(_))
        ));
    }

    let mut last = None;
    for oracle in eligible.iter().take(3) {
        last = Some(
            ledger
                .submit_response(key.index, airline(1), flight(), FLIGHT_TS, FlightStatus::LateAirline, *oracle)
                .unwrap(),
        );
    }
    assert_eq!(last, Some(ResponseOutcome::Finalized { code: FlightStatus::LateAirline }));
    assert_eq!(ledger.flight(&flight()).unwrap().status, FlightStatus::LateAirline);
    assert_eq!(ledger.credit_of(&passenger), UNIT * 3 / 2);

    assert_eq!(ledger.withdraw_credit(passenger), Ok(UNIT * 3 / 2));
    assert_eq!(ledger.paid_to(&passenger), UNIT * 3 / 2);
    assert_eq!(ledger.credit_of(&passenger), 0);
    assert!(matches!(ledger.withdraw_credit(passenger), Err(SuretyError::NothingOwed(_))));
}

#[tokio::test]
async fn test_coordinator_drives_payout_end_to_end() {
    // Every draw is 4: all oracles hold index 4 and every request lands on it.
    let (ledger, passenger) = insured_ledger(Box::new(ScriptedEntropy::new(vec![4])));

    let pool = OraclePool::generate(6, &mut ChaCha20Rng::seed_from_u64(5));
    let config = CoordinatorConfig {
        resubmit_interval_ms: 25,
        ..CoordinatorConfig::default()
    };
    let handle = OracleCoordinator::new(
        ledger.clone(),
        pool,
        Arc::new(FixedStatusFeed(FlightStatus::LateAirline)),
        config,
    )
    .start(REGISTRATION_FEE)
    .unwrap();

    let key = ledger.request_status(airline(1), flight(), FLIGHT_TS).unwrap();
    assert!(wait_until(|| !ledger.is_request_open(&key)).await);
    let stats = handle.shutdown().await.unwrap();
    assert_eq!(stats.finalized, 1);

    assert_eq!(ledger.flight(&flight()).unwrap().status, FlightStatus::LateAirline);
    assert_eq!(ledger.withdraw_credit(passenger), Ok(UNIT * 3 / 2));
}
