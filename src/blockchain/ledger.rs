//! The ledger aggregate and its shared, serialized handle.
//!
//! `SuretyLedger` owns every piece of mutable state. `SharedLedger` stands in
//! for the ledger substrate: each entry point takes the lock once, validates
//! before mutating, applies the whole operation and publishes its events
//! before releasing, so every call is atomic and calls are totally ordered.

use std::sync::Arc;

use log::{debug, info};
use parking_lot::Mutex;
use tokio::sync::broadcast;

use super::access::AccessControl;
use super::events::{EventBus, LedgerEvent};
use super::flights::{Flight, FlightRegistry, FlightStatus};
use super::insurance::{InsuranceLedger, InsurancePolicy, PayoutTerms};
use super::treasury::{DepositKind, Treasury};
use super::{Address, Amount, FlightId};
use crate::config::ProtocolParams;
use crate::consensus::entropy::EntropySource;
use crate::consensus::governance::{
    Airline, AirlineGovernance, FundingOutcome, GovernanceParams, RegistrationOutcome,
};
use crate::consensus::oracle::{
    ConsensusParams, OracleConsensus, OracleRequest, RequestKey, ResponseOutcome,
};
use crate::consensus::sharding::{IndexTriple, ShardIndex};
use crate::errors::{SuretyError, SuretyResult};
use crate::utils::current_time;

/// Every piece of ledger state, constructed once per process.
#[derive(Debug)]
pub struct SuretyLedger {
    pub access: AccessControl,
    pub governance: AirlineGovernance,
    pub flights: FlightRegistry,
    pub insurance: InsuranceLedger,
    pub oracles: OracleConsensus,
    pub treasury: Treasury,
}

impl SuretyLedger {
    pub fn new(
        params: &ProtocolParams,
        owner: Address,
        genesis_airline: Address,
        enforce_authorization: bool,
        entropy: Box<dyn EntropySource>,
    ) -> Self {
        Self {
            access: AccessControl::new(owner, enforce_authorization),
            governance: AirlineGovernance::new(GovernanceParams::from_params(params), genesis_airline),
            flights: FlightRegistry::new(),
            insurance: InsuranceLedger::new(PayoutTerms::from_params(params)),
            oracles: OracleConsensus::new(ConsensusParams::from_params(params), entropy),
            treasury: Treasury::new(),
        }
    }

    fn register_airline(
        &mut self,
        candidate: Address,
        sponsor: Address,
        events: &mut Vec<LedgerEvent>,
    ) -> SuretyResult<RegistrationOutcome> {
        let outcome = self.governance.register_airline(candidate, sponsor)?;
        match outcome {
            RegistrationOutcome::Registered => {
                events.push(LedgerEvent::AirlineRegistered {
                    airline: candidate,
                    sponsor,
                });
            }
            RegistrationOutcome::Pending { votes, required } => {
                events.push(LedgerEvent::AirlineVoted {
                    candidate,
                    voter: sponsor,
                    votes,
                    required,
                });
            }
        }
        Ok(outcome)
    }

    fn fund_airline(
        &mut self,
        airline: Address,
        amount: Amount,
        events: &mut Vec<LedgerEvent>,
    ) -> SuretyResult<FundingOutcome> {
        let outcome = self.governance.fund_airline(airline, amount)?;
        self.treasury.deposit(DepositKind::AirlineFunding, airline, amount);
        if outcome.newly_funded {
            events.push(LedgerEvent::AirlineFunded {
                airline,
                total_funding: outcome.total_funding,
            });
        }
        Ok(outcome)
    }

    fn register_flight(
        &mut self,
        airline: Address,
        timestamp: u64,
        flight: FlightId,
        events: &mut Vec<LedgerEvent>,
    ) -> SuretyResult<Flight> {
        if !self.governance.is_funded(&airline) {
            return Err(SuretyError::NotFunded(airline.to_string()));
        }
        let registered = self.flights.register_flight(airline, timestamp, flight)?.clone();
        events.push(LedgerEvent::FlightRegistered {
            airline,
            flight: registered.id.clone(),
            timestamp,
        });
        Ok(registered)
    }

    fn buy_insurance(
        &mut self,
        flight: &FlightId,
        insuree: Address,
        premium: Amount,
        events: &mut Vec<LedgerEvent>,
    ) -> SuretyResult<InsurancePolicy> {
        let record = self
            .flights
            .flight(flight)
            .ok_or_else(|| SuretyError::UnknownFlight(flight.to_string()))?;
        if record.status_finalized {
            return Err(SuretyError::Stale(format!("flight {}", flight)));
        }

        let policy = self.insurance.buy_insurance(insuree, flight, premium)?.clone();
        self.treasury.deposit(DepositKind::Premium, insuree, premium);
        events.push(LedgerEvent::InsurancePurchased {
            insuree,
            flight: flight.clone(),
            premium,
        });
        Ok(policy)
    }

    fn register_oracle(
        &mut self,
        oracle: Address,
        fee: Amount,
        events: &mut Vec<LedgerEvent>,
    ) -> SuretyResult<IndexTriple> {
        let indexes = self.oracles.register_oracle(oracle, fee)?;
        self.treasury.deposit(DepositKind::OracleFee, oracle, fee);
        events.push(LedgerEvent::OracleRegistered { oracle, indexes });
        Ok(indexes)
    }

    fn request_status(
        &mut self,
        airline: Address,
        flight: FlightId,
        timestamp: u64,
        events: &mut Vec<LedgerEvent>,
    ) -> SuretyResult<RequestKey> {
        if !self.flights.matches(&airline, &flight, timestamp) {
            return Err(SuretyError::UnknownFlight(format!(
                "{}@{} for airline {}",
                flight, timestamp, airline
            )));
        }
        if self.flights.flight(&flight).map_or(false, |f| f.status_finalized) {
            return Err(SuretyError::Stale(format!("flight {}", flight)));
        }

        let (key, _fresh) = self.oracles.open_request(airline, flight, timestamp, current_time());
        // Re-announce open tallies so late subscribers still see them.
        if self.oracles.is_open(&key) {
            events.push(LedgerEvent::RequestOpened {
                index: key.index,
                airline: key.airline,
                flight: key.flight.clone(),
                timestamp: key.timestamp,
            });
        }
        Ok(key)
    }

    fn submit_response(
        &mut self,
        key: &RequestKey,
        code: FlightStatus,
        oracle: Address,
        events: &mut Vec<LedgerEvent>,
    ) -> SuretyResult<ResponseOutcome> {
        let outcome = self.oracles.submit_response(key, code, oracle)?;
        events.push(LedgerEvent::ResponseRecorded {
            oracle,
            index: key.index,
            flight: key.flight.clone(),
            timestamp: key.timestamp,
            code,
        });

        if let ResponseOutcome::Finalized { code } = outcome {
            self.finalize_status(&key.flight, key.timestamp, code, events)?;
        }
        Ok(outcome)
    }

    fn finalize_status(
        &mut self,
        flight: &FlightId,
        timestamp: u64,
        code: FlightStatus,
        events: &mut Vec<LedgerEvent>,
    ) -> SuretyResult<()> {
        if !self.flights.set_status(flight, timestamp, code)? {
            return Ok(());
        }
        let closed = self.oracles.close_flight(flight, timestamp, code);
        if !closed.is_empty() {
            debug!("Closed {} sibling requests for {}@{}", closed.len(), flight, timestamp);
        }
        events.push(LedgerEvent::StatusFinalized {
            flight: flight.clone(),
            timestamp,
            code,
        });
        if !code.triggers_payout() {
            return Ok(());
        }

        for (insuree, amount) in self.insurance.credit_insurees(flight) {
            events.push(LedgerEvent::InsureeCredited {
                insuree,
                flight: flight.clone(),
                amount,
            });
        }
        Ok(())
    }

    fn withdraw_credit(
        &mut self,
        insuree: Address,
        events: &mut Vec<LedgerEvent>,
    ) -> SuretyResult<Amount> {
        let owed = self.insurance.credit_of(&insuree);
        if owed == 0 {
            return Err(SuretyError::NothingOwed(insuree.to_string()));
        }
        self.treasury.can_cover(owed)?;

        let owed = self.insurance.withdraw_credit(&insuree)?;
        self.treasury.pay_out(insuree, owed)?;
        events.push(LedgerEvent::CreditWithdrawn {
            insuree,
            amount: owed,
        });
        Ok(owed)
    }
}

/// Serialized, shareable handle on the ledger. Clones share state; each
/// clone calls in as its own gateway identity.
#[derive(Clone)]
pub struct SharedLedger {
    inner: Arc<Mutex<SuretyLedger>>,
    bus: EventBus,
    gateway: Address,
}

impl SharedLedger {
    /// Wraps `ledger`, calling in as its owner.
    pub fn new(ledger: SuretyLedger, bus: EventBus) -> Self {
        let gateway = ledger.access.owner();
        Self {
            inner: Arc::new(Mutex::new(ledger)),
            bus,
            gateway,
        }
    }

    /// Same ledger, calling in as `gateway`.
    pub fn as_gateway(&self, gateway: Address) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            bus: self.bus.clone(),
            gateway,
        }
    }

    pub fn gateway(&self) -> Address {
        self.gateway
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.bus.subscribe()
    }

    fn execute<T>(
        &self,
        operation: &str,
        apply: impl FnOnce(&mut SuretyLedger, &mut Vec<LedgerEvent>) -> SuretyResult<T>,
    ) -> SuretyResult<T> {
        let mut ledger = self.inner.lock();
        let mut events = Vec::new();
        let result = ledger
            .access
            .require_operational()
            .and_then(|_| ledger.access.require_authorized(&self.gateway))
            .and_then(|_| apply(&mut ledger, &mut events));

        match &result {
            Ok(_) => self.bus.publish(events),
            Err(e) => debug!("{} rejected: {}", operation, e),
        }
        result
    }

    /// Read-only access to the ledger state.
    pub fn read<T>(&self, view: impl FnOnce(&SuretyLedger) -> T) -> T {
        view(&self.inner.lock())
    }

    pub fn register_airline(&self, candidate: Address, sponsor: Address) -> SuretyResult<RegistrationOutcome> {
        self.execute("register_airline", |ledger, events| {
            ledger.register_airline(candidate, sponsor, events)
        })
    }

    pub fn fund_airline(&self, airline: Address, amount: Amount) -> SuretyResult<FundingOutcome> {
        self.execute("fund_airline", |ledger, events| {
            ledger.fund_airline(airline, amount, events)
        })
    }

    pub fn register_flight(&self, airline: Address, timestamp: u64, flight: FlightId) -> SuretyResult<Flight> {
        self.execute("register_flight", |ledger, events| {
            ledger.register_flight(airline, timestamp, flight, events)
        })
    }

    pub fn buy_insurance(&self, flight: &FlightId, insuree: Address, premium: Amount) -> SuretyResult<InsurancePolicy> {
        self.execute("buy_insurance", |ledger, events| {
            ledger.buy_insurance(flight, insuree, premium, events)
        })
    }

    pub fn request_status(&self, airline: Address, flight: FlightId, timestamp: u64) -> SuretyResult<RequestKey> {
        self.execute("request_status", |ledger, events| {
            ledger.request_status(airline, flight, timestamp, events)
        })
    }

    pub fn register_oracle(&self, oracle: Address, fee: Amount) -> SuretyResult<IndexTriple> {
        self.execute("register_oracle", |ledger, events| {
            ledger.register_oracle(oracle, fee, events)
        })
    }

    pub fn submit_response(
        &self,
        index: ShardIndex,
        airline: Address,
        flight: FlightId,
        timestamp: u64,
        code: FlightStatus,
        oracle: Address,
    ) -> SuretyResult<ResponseOutcome> {
        let key = RequestKey::new(index, airline, flight, timestamp);
        self.execute("submit_response", |ledger, events| {
            ledger.submit_response(&key, code, oracle, events)
        })
    }

    pub fn withdraw_credit(&self, insuree: Address) -> SuretyResult<Amount> {
        self.execute("withdraw_credit", |ledger, events| {
            ledger.withdraw_credit(insuree, events)
        })
    }

    /// Owner-only; allowed while the ledger is paused so it can be resumed.
    pub fn set_operational(&self, caller: Address, operational: bool) -> SuretyResult<()> {
        let mut ledger = self.inner.lock();
        if ledger.access.set_operational(&caller, operational)? {
            info!("Operational status changed by {}", caller.short());
            self.bus.publish(vec![LedgerEvent::OperationalChanged { operational }]);
        }
        Ok(())
    }

    pub fn authorize_caller(&self, caller: Address, gateway: Address) -> SuretyResult<()> {
        self.inner.lock().access.authorize_caller(&caller, gateway)
    }

    pub fn deauthorize_caller(&self, caller: Address, gateway: &Address) -> SuretyResult<()> {
        self.inner.lock().access.deauthorize_caller(&caller, gateway)
    }

    pub fn is_operational(&self) -> bool {
        self.read(|l| l.access.is_operational())
    }

    pub fn is_airline(&self, address: &Address) -> bool {
        self.read(|l| l.governance.is_airline(address))
    }

    pub fn is_funded(&self, address: &Address) -> bool {
        self.read(|l| l.governance.is_funded(address))
    }

    pub fn get_votes(&self, candidate: &Address) -> Vec<Address> {
        self.read(|l| l.governance.get_votes(candidate))
    }

    pub fn airline(&self, address: &Address) -> Option<Airline> {
        self.read(|l| l.governance.airline(address).cloned())
    }

    pub fn list_flights(&self) -> Vec<FlightId> {
        self.read(|l| l.flights.list_flights().cloned().collect())
    }

    pub fn flight(&self, flight: &FlightId) -> Option<Flight> {
        self.read(|l| l.flights.flight(flight).cloned())
    }

    pub fn flight_exists(&self, flight: &FlightId) -> bool {
        self.read(|l| l.flights.flight_exists(flight))
    }

    pub fn policy(&self, insuree: &Address, flight: &FlightId) -> Option<InsurancePolicy> {
        self.read(|l| l.insurance.policy(insuree, flight).cloned())
    }

    pub fn credit_of(&self, insuree: &Address) -> Amount {
        self.read(|l| l.insurance.credit_of(insuree))
    }

    pub fn oracle_indexes(&self, oracle: &Address) -> SuretyResult<IndexTriple> {
        self.read(|l| l.oracles.indexes_of(oracle))
    }

    pub fn request(&self, key: &RequestKey) -> Option<OracleRequest> {
        self.read(|l| l.oracles.request(key).cloned())
    }

    pub fn is_request_open(&self, key: &RequestKey) -> bool {
        self.read(|l| l.oracles.is_open(key))
    }

    pub fn open_requests(&self) -> Vec<RequestKey> {
        self.read(|l| l.oracles.open_requests())
    }

    pub fn treasury_balance(&self) -> Amount {
        self.read(|l| l.treasury.balance)
    }

    pub fn paid_to(&self, insuree: &Address) -> Amount {
        self.read(|l| l.treasury.paid_to(insuree))
    }
}
