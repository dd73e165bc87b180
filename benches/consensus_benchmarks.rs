use criterion::{black_box, criterion_group, criterion_main, Criterion};
use flightsurety_core::blockchain::{Address, EventBus, FlightId, FlightStatus, SharedLedger, SuretyLedger};
use flightsurety_core::config::presets::{FUND_THRESHOLD, REGISTRATION_FEE};
use flightsurety_core::config::ProtocolParams;
use flightsurety_core::consensus::{ChainEntropy, EntropySource, ScriptedEntropy, ShardAssigner};

pub fn benchmark_index_assignment(c: &mut Criterion) {
    let assigner = ShardAssigner::new(10);
    let mut entropy = ChainEntropy::new([7u8; 32]);
    let oracle = Address::from_low_u64(1);

    c.bench_function("chain_entropy_index_triple", |b| {
        b.iter(|| assigner.assign_indexes(&mut entropy as &mut dyn EntropySource, black_box(&oracle)))
    });
}

pub fn benchmark_tally_resolution(c: &mut Criterion) {
    let oracles: Vec<Address> = (0..3).map(|n| Address::from_low_u64(100 + n)).collect();

    c.bench_function("request_to_finalization", |b| {
        b.iter_batched(
            || {
                let state = SuretyLedger::new(
                    &ProtocolParams::default(),
                    Address::from_low_u64(1000),
                    Address::from_low_u64(1),
                    false,
                    Box::new(ScriptedEntropy::new(vec![3])),
                );
                let ledger = SharedLedger::new(state, EventBus::default());
                ledger.fund_airline(Address::from_low_u64(1), FUND_THRESHOLD).unwrap();
                ledger
                    .register_flight(Address::from_low_u64(1), 1_700_000_000, FlightId::from("ND1309"))
                    .unwrap();
                for oracle in &oracles {
                    ledger.register_oracle(*oracle, REGISTRATION_FEE).unwrap();
                }
                ledger
            },
            |ledger| {
                let key = ledger
                    .request_status(Address::from_low_u64(1), FlightId::from("ND1309"), 1_700_000_000)
                    .unwrap();
                for oracle in &oracles {
                    let _ = ledger.submit_response(
                        key.index,
                        key.airline,
                        key.flight.clone(),
                        key.timestamp,
                        FlightStatus::LateAirline,
                        *oracle,
                    );
                }
                black_box(ledger.is_request_open(&key))
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, benchmark_index_assignment, benchmark_tally_resolution);
criterion_main!(benches);
