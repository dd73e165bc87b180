use std::collections::HashMap;

use log::{debug, info};
use serde::Serialize;

use super::{Address, Amount, FlightId};
use crate::config::ProtocolParams;
use crate::errors::{SuretyError, SuretyResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsurancePolicy {
    pub insuree: Address,
    pub flight: FlightId,
    pub premium_paid: Amount,
    pub credit_owed: Amount,
    /// Credit is granted at most once per policy.
    pub credited: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayoutTerms {
    pub max_premium: Amount,
    pub multiplier_numerator: u64,
    pub multiplier_denominator: u64,
}

impl PayoutTerms {
    pub fn from_params(params: &ProtocolParams) -> Self {
        Self {
            max_premium: params.max_premium,
            multiplier_numerator: params.payout_numerator,
            multiplier_denominator: params.payout_denominator,
        }
    }

    /// Credit owed for `premium`, rounded down to the nano-unit.
    pub fn payout_for(&self, premium: Amount) -> Amount {
        let scaled = premium as u128 * self.multiplier_numerator as u128
            / self.multiplier_denominator as u128;
        scaled.min(Amount::MAX as u128) as Amount
    }
}

/// Policies per insuree and flight, plus each insuree's aggregate unpaid credit.
#[derive(Debug)]
pub struct InsuranceLedger {
    terms: PayoutTerms,
    policies: HashMap<(Address, FlightId), InsurancePolicy>,
    insurees_by_flight: HashMap<FlightId, Vec<Address>>,
    credits: HashMap<Address, Amount>,
}

impl InsuranceLedger {
    pub fn new(terms: PayoutTerms) -> Self {
        Self {
            terms,
            policies: HashMap::new(),
            insurees_by_flight: HashMap::new(),
            credits: HashMap::new(),
        }
    }

    pub fn terms(&self) -> &PayoutTerms {
        &self.terms
    }

    /// Checks a purchase without applying it.
    pub fn check_purchase(&self, insuree: &Address, flight: &FlightId, premium: Amount) -> SuretyResult<()> {
        if premium == 0 {
            return Err(SuretyError::InvalidAmount);
        }
        let already_paid = self
            .policies
            .get(&(*insuree, flight.clone()))
            .map(|p| p.premium_paid)
            .unwrap_or(0);
        let total = already_paid.saturating_add(premium);
        if premium > self.terms.max_premium || total > self.terms.max_premium {
            return Err(SuretyError::PremiumTooHigh {
                premium,
                total,
                max: self.terms.max_premium,
            });
        }
        Ok(())
    }

    /// Creates a policy or tops up an existing one. Flight existence is
    /// checked by the caller.
    pub fn buy_insurance(
        &mut self,
        insuree: Address,
        flight: &FlightId,
        premium: Amount,
    ) -> SuretyResult<&InsurancePolicy> {
        self.check_purchase(&insuree, flight, premium)?;

        let key = (insuree, flight.clone());
        if !self.policies.contains_key(&key) {
            self.insurees_by_flight
                .entry(flight.clone())
                .or_default()
                .push(insuree);
        }
        let policy = self.policies.entry(key).or_insert_with(|| InsurancePolicy {
            insuree,
            flight: flight.clone(),
            premium_paid: 0,
            credit_owed: 0,
            credited: false,
        });
        policy.premium_paid += premium;
        debug!(
            "Policy for {} on {} now covers premium {}",
            insuree.short(),
            flight,
            policy.premium_paid
        );
        Ok(policy)
    }

    /// Credits every uncredited policy on `flight`. Returns the credited
    /// insurees and amounts.
    pub fn credit_insurees(&mut self, flight: &FlightId) -> Vec<(Address, Amount)> {
        let insurees = match self.insurees_by_flight.get(flight) {
            Some(insurees) => insurees.clone(),
            None => return Vec::new(),
        };

        let mut credited = Vec::with_capacity(insurees.len());
        for insuree in insurees {
            let Some(policy) = self.policies.get_mut(&(insuree, flight.clone())) else {
                continue;
            };
            if policy.credited {
                continue;
            }
            let amount = self.terms.payout_for(policy.premium_paid);
            policy.credit_owed += amount;
            policy.credited = true;
            *self.credits.entry(insuree).or_default() += amount;
            credited.push((insuree, amount));
        }

        if !credited.is_empty() {
            info!("Credited {} insuree(s) for flight {}", credited.len(), flight);
        }
        credited
    }

    /// Aggregate unpaid credit for `insuree`.
    pub fn credit_of(&self, insuree: &Address) -> Amount {
        self.credits.get(insuree).copied().unwrap_or(0)
    }

    /// Zeroes the aggregate credit of `insuree` and returns it. The caller
    /// performs the transfer inside the same ledger call.
    pub fn withdraw_credit(&mut self, insuree: &Address) -> SuretyResult<Amount> {
        let owed = self.credit_of(insuree);
        if owed == 0 {
            return Err(SuretyError::NothingOwed(insuree.to_string()));
        }

        self.credits.remove(insuree);
        for policy in self.policies.values_mut().filter(|p| p.insuree == *insuree) {
            policy.credit_owed = 0;
        }
        Ok(owed)
    }

    pub fn policy(&self, insuree: &Address, flight: &FlightId) -> Option<&InsurancePolicy> {
        self.policies.get(&(*insuree, flight.clone()))
    }

    pub fn policies_for_flight(&self, flight: &FlightId) -> Vec<&InsurancePolicy> {
        self.insurees_by_flight
            .get(flight)
            .map(|insurees| {
                insurees
                    .iter()
                    .filter_map(|insuree| self.policies.get(&(*insuree, flight.clone())))
                    .collect()
            })
            .unwrap_or_default()
    }
}
