//! Multiparty airline governance.
//!
//! Airlines move from `Registered` to `Funded` once their cumulative funding
//! reaches the threshold. Only funded airlines may sponsor new ones. While the
//! registry is smaller than the bootstrap size a single sponsor suffices; after
//! that a candidate needs votes from half the funded airlines, rounded up.

use std::collections::{BTreeSet, HashMap};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::blockchain::{Address, Amount};
use crate::config::ProtocolParams;
use crate::errors::{SuretyError, SuretyResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AirlineState {
    /// Candidate collecting votes.
    Unregistered,
    Registered,
    Funded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Airline {
    pub address: Address,
    pub state: AirlineState,
    pub votes_received: BTreeSet<Address>,
    pub funded_amount: Amount,
}

impl Airline {
    fn candidate(address: Address) -> Self {
        Self {
            address,
            state: AirlineState::Unregistered,
            votes_received: BTreeSet::new(),
            funded_amount: 0,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.state >= AirlineState::Registered
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RegistrationOutcome {
    Registered,
    Pending { votes: usize, required: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FundingOutcome {
    pub total_funding: Amount,
    /// True only for the call that crossed the threshold.
    pub newly_funded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GovernanceParams {
    pub bootstrap_size: usize,
    pub fund_threshold: Amount,
}

impl GovernanceParams {
    pub fn from_params(params: &ProtocolParams) -> Self {
        Self {
            bootstrap_size: params.bootstrap_size,
            fund_threshold: params.fund_threshold,
        }
    }
}

#[derive(Debug)]
pub struct AirlineGovernance {
    params: GovernanceParams,
    airlines: HashMap<Address, Airline>,
    registered_count: usize,
    funded_count: usize,
}

impl AirlineGovernance {
    /// Creates the registry with `genesis` registered but not yet funded.
    pub fn new(params: GovernanceParams, genesis: Address) -> Self {
        let mut airline = Airline::candidate(genesis);
        airline.state = AirlineState::Registered;

        let mut airlines = HashMap::new();
        airlines.insert(genesis, airline);

        Self {
            params,
            airlines,
            registered_count: 1,
            funded_count: 0,
        }
    }

    pub fn params(&self) -> &GovernanceParams {
        &self.params
    }

    /// Votes needed right now; always computed from the live funded count.
    pub fn required_votes(&self) -> usize {
        self.funded_count.div_ceil(2)
    }

    pub fn register_airline(
        &mut self,
        candidate: Address,
        sponsor: Address,
    ) -> SuretyResult<RegistrationOutcome> {
        if !self.is_funded(&sponsor) {
            return Err(SuretyError::NotFunded(sponsor.to_string()));
        }
        if self.is_airline(&candidate) {
            return Err(SuretyError::AlreadyRegistered(candidate.to_string()));
        }

        if self.registered_count < self.params.bootstrap_size {
            let airline = self
                .airlines
                .entry(candidate)
                .or_insert_with(|| Airline::candidate(candidate));
            airline.state = AirlineState::Registered;
            airline.votes_received.clear();
            self.registered_count += 1;
            info!(
                "Airline {} registered by sole sponsor {} ({} registered)",
                candidate.short(),
                sponsor.short(),
                self.registered_count
            );
            return Ok(RegistrationOutcome::Registered);
        }

        let required = self.required_votes();
        let airline = self
            .airlines
            .entry(candidate)
            .or_insert_with(|| Airline::candidate(candidate));
        if !airline.votes_received.insert(sponsor) {
            debug!("Duplicate vote from {} for {} ignored", sponsor.short(), candidate.short());
        }
        let votes = airline.votes_received.len();

        if votes >= required {
            airline.state = AirlineState::Registered;
            airline.votes_received.clear();
            self.registered_count += 1;
            info!(
                "Airline {} registered by consensus with {}/{} votes",
                candidate.short(),
                votes,
                required
            );
            return Ok(RegistrationOutcome::Registered);
        }

        debug!("Airline {} pending with {}/{} votes", candidate.short(), votes, required);
        Ok(RegistrationOutcome::Pending { votes, required })
    }

    pub fn fund_airline(&mut self, airline: Address, amount: Amount) -> SuretyResult<FundingOutcome> {
        if amount == 0 {
            return Err(SuretyError::InvalidAmount);
        }
        let threshold = self.params.fund_threshold;
        let record = match self.airlines.get_mut(&airline) {
            Some(record) if record.is_registered() => record,
            _ => return Err(SuretyError::NotRegistered(airline.to_string())),
        };

        record.funded_amount = record.funded_amount.saturating_add(amount);
        let newly_funded =
            record.state == AirlineState::Registered && record.funded_amount >= threshold;
        if newly_funded {
            record.state = AirlineState::Funded;
        }
        let total_funding = record.funded_amount;

        if newly_funded {
            self.funded_count += 1;
            info!(
                "Airline {} funded with {} ({} funded airlines)",
                airline.short(),
                total_funding,
                self.funded_count
            );
        }

        Ok(FundingOutcome {
            total_funding,
            newly_funded,
        })
    }

    /// Registered or funded.
    pub fn is_airline(&self, address: &Address) -> bool {
        self.airlines
            .get(address)
            .map(Airline::is_registered)
            .unwrap_or(false)
    }

    pub fn is_funded(&self, address: &Address) -> bool {
        self.airlines
            .get(address)
            .map(|a| a.state == AirlineState::Funded)
            .unwrap_or(false)
    }

    pub fn get_votes(&self, candidate: &Address) -> Vec<Address> {
        self.airlines
            .get(candidate)
            .map(|a| a.votes_received.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn airline(&self, address: &Address) -> Option<&Airline> {
        self.airlines.get(address)
    }

    pub fn registered_count(&self) -> usize {
        self.registered_count
    }

    pub fn funded_count(&self) -> usize {
        self.funded_count
    }
}
