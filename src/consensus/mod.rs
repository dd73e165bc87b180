pub mod entropy;
pub mod governance;
pub mod oracle;
pub mod sharding;

pub use entropy::{ChainEntropy, EntropySource, ScriptedEntropy, SeededEntropy};
pub use governance::{AirlineGovernance, AirlineState, FundingOutcome, RegistrationOutcome};
pub use oracle::{OracleConsensus, OracleRequest, RequestKey, ResponseOutcome};
pub use sharding::{IndexTriple, ShardAssigner, ShardIndex, INDEXES_PER_ORACLE};

#[cfg(test)]
mod tests;
