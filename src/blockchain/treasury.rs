use std::collections::HashMap;

use serde::Serialize;

use super::{Address, Amount};
use crate::errors::{SuretyError, SuretyResult};

/// Why funds entered the treasury.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DepositKind {
    AirlineFunding,
    Premium,
    OracleFee,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TreasuryEntry {
    Deposit { kind: DepositKind, from: Address, amount: Amount },
    Payout { to: Address, amount: Amount },
}

/// Holds every payment made into the ledger and records outgoing transfers.
#[derive(Debug, Default)]
pub struct Treasury {
    pub balance: Amount,
    pub payouts: HashMap<Address, Amount>,
    pub history: Vec<TreasuryEntry>,
}

impl Treasury {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deposit(&mut self, kind: DepositKind, from: Address, amount: Amount) {
        self.balance = self.balance.saturating_add(amount);
        self.history.push(TreasuryEntry::Deposit { kind, from, amount });
    }

    pub fn can_cover(&self, amount: Amount) -> SuretyResult<()> {
        if amount > self.balance {
            return Err(SuretyError::InsufficientFunds {
                owed: amount,
                available: self.balance,
            });
        }
        Ok(())
    }

    /// Transfers `amount` out to `to`.
    pub fn pay_out(&mut self, to: Address, amount: Amount) -> SuretyResult<()> {
        self.can_cover(amount)?;
        self.balance -= amount;
        *self.payouts.entry(to).or_default() += amount;
        self.history.push(TreasuryEntry::Payout { to, amount });
        Ok(())
    }

    /// Total transferred out to `to` so far.
    pub fn paid_to(&self, to: &Address) -> Amount {
        self.payouts.get(to).copied().unwrap_or(0)
    }
}
