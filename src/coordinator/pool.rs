//! Oracle identities owned by the coordinator.

use log::{debug, info, warn};
use rand::Rng;

use crate::blockchain::{Address, Amount, SharedLedger};
use crate::consensus::sharding::{index_coverage, IndexTriple, ShardIndex};
use crate::errors::{SuretyError, SuretyResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleIdentity {
    pub address: Address,
    /// Cached after registration; `None` until then.
    pub indexes: Option<IndexTriple>,
}

impl OracleIdentity {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            indexes: None,
        }
    }

    pub fn holds(&self, index: ShardIndex) -> bool {
        self.indexes.map(|t| t.contains(index)).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default)]
pub struct OraclePool {
    identities: Vec<OracleIdentity>,
}

impl OraclePool {
    /// `count` fresh random identities.
    pub fn generate<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Self {
        let identities = (0..count)
            .map(|_| OracleIdentity::new(Address::random(rng)))
            .collect();
        Self { identities }
    }

    pub fn from_addresses(addresses: impl IntoIterator<Item = Address>) -> Self {
        Self {
            identities: addresses.into_iter().map(OracleIdentity::new).collect(),
        }
    }

    /// Registers every identity with the ledger and caches its indices.
    /// Identities the ledger already knows are adopted with their existing indices.
    pub fn register_all(&mut self, ledger: &SharedLedger, fee: Amount) -> SuretyResult<usize> {
        let mut registered = 0;
        for identity in &mut self.identities {
            let indexes = match ledger.register_oracle(identity.address, fee) {
                Ok(indexes) => {
                    registered += 1;
                    indexes
                }
                Err(SuretyError::AlreadyRegistered(_)) => {
                    debug!("Oracle {} already registered, adopting its indexes", identity.address.short());
                    ledger.oracle_indexes(&identity.address)?
                }
                Err(e) => return Err(e),
            };
            identity.indexes = Some(indexes);
        }
        info!("Registered {} of {} oracle identities", registered, self.identities.len());
        Ok(registered)
    }

    /// Registered identities whose triple holds `index`.
    pub fn matching(&self, index: ShardIndex) -> impl Iterator<Item = &OracleIdentity> + '_ {
        self.identities.iter().filter(move |identity| identity.holds(index))
    }

    /// Distinct oracles per index in `[0, index_range)`.
    pub fn coverage(&self, index_range: u8) -> Vec<usize> {
        let triples: Vec<IndexTriple> = self.identities.iter().filter_map(|i| i.indexes).collect();
        index_coverage(&triples, index_range)
    }

    /// Indices served by fewer than `quorum` oracles. Requests landing there cannot finalize.
    pub fn under_covered(&self, index_range: u8, quorum: usize) -> Vec<ShardIndex> {
        let under: Vec<ShardIndex> = self
            .coverage(index_range)
            .into_iter()
            .enumerate()
            .filter(|(_, count)| *count < quorum)
            .map(|(index, _)| index as ShardIndex)
            .collect();
        if !under.is_empty() {
            warn!("Indexes {:?} have fewer than {} oracles", under, quorum);
        }
        under
    }

    pub fn identities(&self) -> &[OracleIdentity] {
        &self.identities
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn is_registered(&self) -> bool {
        self.identities.iter().all(|i| i.indexes.is_some())
    }
}
