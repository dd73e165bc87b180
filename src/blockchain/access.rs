use std::collections::HashSet;

use log::info;

use super::Address;
use crate::errors::{SuretyError, SuretyResult};

/// Operational switch and the list of gateway identities allowed to invoke
/// ledger entry points. Only the owner may change either.
#[derive(Debug)]
pub struct AccessControl {
    owner: Address,
    operational: bool,
    enforce_authorization: bool,
    authorized: HashSet<Address>,
}

impl AccessControl {
    pub fn new(owner: Address, enforce_authorization: bool) -> Self {
        Self {
            owner,
            operational: true,
            enforce_authorization,
            authorized: HashSet::new(),
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_operational(&self) -> bool {
        self.operational
    }

    pub fn require_operational(&self) -> SuretyResult<()> {
        if !self.operational {
            return Err(SuretyError::NotOperational);
        }
        Ok(())
    }

    fn require_owner(&self, caller: &Address) -> SuretyResult<()> {
        if *caller != self.owner {
            return Err(SuretyError::Unauthorized(format!(
                "{} is not the ledger owner",
                caller
            )));
        }
        Ok(())
    }

    /// The owner is always authorized.
    pub fn is_authorized(&self, gateway: &Address) -> bool {
        !self.enforce_authorization || *gateway == self.owner || self.authorized.contains(gateway)
    }

    pub fn require_authorized(&self, gateway: &Address) -> SuretyResult<()> {
        if !self.is_authorized(gateway) {
            return Err(SuretyError::Unauthorized(format!(
                "{} is not an authorized caller",
                gateway
            )));
        }
        Ok(())
    }

    /// Returns whether the flag changed.
    pub fn set_operational(&mut self, caller: &Address, operational: bool) -> SuretyResult<bool> {
        self.require_owner(caller)?;
        if self.operational == operational {
            return Ok(false);
        }
        info!("Ledger operational status set to {}", operational);
        self.operational = operational;
        Ok(true)
    }

    pub fn authorize_caller(&mut self, caller: &Address, gateway: Address) -> SuretyResult<()> {
        self.require_owner(caller)?;
        self.authorized.insert(gateway);
        Ok(())
    }

    pub fn deauthorize_caller(&mut self, caller: &Address, gateway: &Address) -> SuretyResult<()> {
        self.require_owner(caller)?;
        self.authorized.remove(gateway);
        Ok(())
    }
}
