//! Oracle registration and per-request response tallies.
//!
//! A status request is keyed by `(index, airline, flight, timestamp)` where
//! `index` is a random shard index. Only oracles holding that index may
//! respond. The first status code whose responder set reaches the quorum
//! resolves the tally; nothing re-resolves it afterwards.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use log::{debug, info};
use serde::Serialize;

use super::entropy::EntropySource;
use super::sharding::{IndexTriple, ShardAssigner, ShardIndex};
use crate::blockchain::{Address, Amount, FlightId, FlightStatus};
use crate::config::ProtocolParams;
use crate::errors::{SuretyError, SuretyResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Oracle {
    pub address: Address,
    pub indexes: IndexTriple,
    pub fee_paid: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RequestKey {
    pub index: ShardIndex,
    pub airline: Address,
    pub flight: FlightId,
    pub timestamp: u64,
}

impl RequestKey {
    pub fn new(index: ShardIndex, airline: Address, flight: FlightId, timestamp: u64) -> Self {
        Self {
            index,
            airline,
            flight,
            timestamp,
        }
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} (airline {}, index {})",
            self.flight,
            self.timestamp,
            self.airline.short(),
            self.index
        )
    }
}

/// Tally of responses for one status request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OracleRequest {
    pub key: RequestKey,
    pub opened_at: u64,
    pub responses_by_code: BTreeMap<FlightStatus, BTreeSet<Address>>,
    pub resolved: Option<FlightStatus>,
}

impl OracleRequest {
    fn open(key: RequestKey, opened_at: u64) -> Self {
        Self {
            key,
            opened_at,
            responses_by_code: BTreeMap::new(),
            resolved: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    pub fn votes_for(&self, code: FlightStatus) -> usize {
        self.responses_by_code.get(&code).map(BTreeSet::len).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResponseOutcome {
    /// Counted; the tally is still open.
    Recorded { code: FlightStatus, votes: usize },
    /// This response brought `code` to quorum.
    Finalized { code: FlightStatus },
    /// Recorded against a tally already resolved for a different code; no effect.
    LateDissent { finalized: FlightStatus },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsensusParams {
    pub registration_fee: Amount,
    pub index_range: u8,
    pub quorum_count: usize,
}

impl ConsensusParams {
    pub fn from_params(params: &ProtocolParams) -> Self {
        Self {
            registration_fee: params.registration_fee,
            index_range: params.index_range,
            quorum_count: params.quorum_count,
        }
    }
}

pub struct OracleConsensus {
    params: ConsensusParams,
    assigner: ShardAssigner,
    entropy: Box<dyn EntropySource>,
    oracles: HashMap<Address, Oracle>,
    requests: HashMap<RequestKey, OracleRequest>,
}

impl fmt::Debug for OracleConsensus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleConsensus")
            .field("params", &self.params)
            .field("oracles", &self.oracles.len())
            .field("requests", &self.requests.len())
            .field("entropy", &"<entropy source>")
            .finish()
    }
}

impl OracleConsensus {
    pub fn new(params: ConsensusParams, entropy: Box<dyn EntropySource>) -> Self {
        Self {
            assigner: ShardAssigner::new(params.index_range),
            params,
            entropy,
            oracles: HashMap::new(),
            requests: HashMap::new(),
        }
    }

    pub fn params(&self) -> &ConsensusParams {
        &self.params
    }

    pub fn check_registration(&self, oracle: &Address, fee: Amount) -> SuretyResult<()> {
        if fee < self.params.registration_fee {
            return Err(SuretyError::InsufficientFee {
                paid: fee,
                required: self.params.registration_fee,
            });
        }
        if self.oracles.contains_key(oracle) {
            return Err(SuretyError::AlreadyRegistered(format!("oracle {}", oracle)));
        }
        Ok(())
    }

    pub fn register_oracle(&mut self, oracle: Address, fee: Amount) -> SuretyResult<IndexTriple> {
        self.check_registration(&oracle, fee)?;

        let indexes = self.assigner.assign_indexes(self.entropy.as_mut(), &oracle);
        debug!("Oracle {} assigned indexes {}", oracle.short(), indexes);
        self.oracles.insert(
            oracle,
            Oracle {
                address: oracle,
                indexes,
                fee_paid: fee,
            },
        );
        Ok(indexes)
    }

    pub fn indexes_of(&self, oracle: &Address) -> SuretyResult<IndexTriple> {
        self.oracles
            .get(oracle)
            .map(|o| o.indexes)
            .ok_or_else(|| SuretyError::Unauthorized(format!("{} is not a registered oracle", oracle)))
    }

    pub fn oracle(&self, oracle: &Address) -> Option<&Oracle> {
        self.oracles.get(oracle)
    }

    pub fn oracle_count(&self) -> usize {
        self.oracles.len()
    }

    /// Opens a tally under a freshly drawn shard index. When that key already
    /// exists the existing tally is kept and `false` is returned.
    pub fn open_request(
        &mut self,
        airline: Address,
        flight: FlightId,
        timestamp: u64,
        now: u64,
    ) -> (RequestKey, bool) {
        let index = self.assigner.request_index(self.entropy.as_mut(), &airline);
        let key = RequestKey::new(index, airline, flight, timestamp);

        if self.requests.contains_key(&key) {
            debug!("Request {} already exists", key);
            return (key, false);
        }

        info!("Opened status request {}", key);
        self.requests
            .insert(key.clone(), OracleRequest::open(key.clone(), now));
        (key, true)
    }

    pub fn submit_response(
        &mut self,
        key: &RequestKey,
        code: FlightStatus,
        oracle: Address,
    ) -> SuretyResult<ResponseOutcome> {
        let indexes = self.indexes_of(&oracle)?;
        if !indexes.contains(key.index) {
            return Err(SuretyError::Unauthorized(format!(
                "oracle {} does not hold index {}",
                oracle, key.index
            )));
        }

        let quorum = self.params.quorum_count;
        let request = self
            .requests
            .get_mut(key)
            .ok_or_else(|| SuretyError::NoSuchRequest(key.to_string()))?;

        if let Some(finalized) = request.resolved {
            if finalized == code {
                return Err(SuretyError::Stale(key.to_string()));
            }
            request.responses_by_code.entry(code).or_default().insert(oracle);
            debug!("Late {} response from {} on resolved {}", code, oracle.short(), key);
            return Ok(ResponseOutcome::LateDissent { finalized });
        }

        let responders = request.responses_by_code.entry(code).or_default();
        responders.insert(oracle);
        let votes = responders.len();

        if votes >= quorum {
            request.resolved = Some(code);
            info!("Request {} finalized as {} with {} responses", key, code, votes);
            return Ok(ResponseOutcome::Finalized { code });
        }

        Ok(ResponseOutcome::Recorded { code, votes })
    }

    /// Resolves every still-open tally for a flight to `code`, once the
    /// flight's status is settled. Returns the keys that were closed.
    pub fn close_flight(&mut self, flight: &FlightId, timestamp: u64, code: FlightStatus) -> Vec<RequestKey> {
        let mut closed = Vec::new();
        for request in self.requests.values_mut() {
            if request.key.flight == *flight && request.key.timestamp == timestamp && !request.is_resolved() {
                request.resolved = Some(code);
                closed.push(request.key.clone());
            }
        }
        closed
    }

    pub fn request(&self, key: &RequestKey) -> Option<&OracleRequest> {
        self.requests.get(key)
    }

    pub fn is_open(&self, key: &RequestKey) -> bool {
        self.requests
            .get(key)
            .map(|r| !r.is_resolved())
            .unwrap_or(false)
    }

    pub fn open_requests(&self) -> Vec<RequestKey> {
        let mut keys: Vec<RequestKey> = self
            .requests
            .values()
            .filter(|r| !r.is_resolved())
            .map(|r| r.key.clone())
            .collect();
        keys.sort();
        keys
    }
}
