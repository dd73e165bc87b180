use crate::blockchain::{Address, UNIT};
use crate::config::presets::FUND_THRESHOLD;
use crate::config::ProtocolParams;
use crate::consensus::entropy::{EntropySource, ScriptedEntropy};
use crate::consensus::governance::{AirlineGovernance, GovernanceParams};
use crate::consensus::oracle::{ConsensusParams, OracleConsensus};

mod sharding_tests;

pub fn addr(n: u64) -> Address {
    Address::from_low_u64(n)
}

pub fn new_governance() -> AirlineGovernance {
    AirlineGovernance::new(GovernanceParams::from_params(&ProtocolParams::default()), addr(1))
}

/// Genesis plus airlines 2..=count, all registered and funded. `count` must not exceed the bootstrap size.
pub fn governance_with_funded(count: u64) -> AirlineGovernance {
    let mut governance = new_governance();
    governance.fund_airline(addr(1), FUND_THRESHOLD).unwrap();
    for n in 2..=count {
        governance.register_airline(addr(n), addr(1)).unwrap();
        governance.fund_airline(addr(n), FUND_THRESHOLD).unwrap();
    }
    governance
}

pub fn consensus_with(entropy: Box<dyn EntropySource>) -> OracleConsensus {
    OracleConsensus::new(ConsensusParams::from_params(&ProtocolParams::default()), entropy)
}

/// Consensus whose draws replay `script`; oracle registration consumes three draws, a request one.
pub fn scripted_consensus(script: Vec<u8>) -> OracleConsensus {
    consensus_with(Box::new(ScriptedEntropy::new(script)))
}

pub const FEE: u64 = UNIT;
