use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod access;
pub mod events;
pub mod flights;
pub mod insurance;
pub mod ledger;
pub mod treasury;

pub use access::AccessControl;
pub use events::{EventBus, LedgerEvent};
pub use flights::{Flight, FlightRegistry, FlightStatus};
pub use insurance::{InsuranceLedger, InsurancePolicy};
pub use ledger::{SharedLedger, SuretyLedger};
pub use treasury::Treasury;

#[cfg(test)]
mod tests;

/// Amounts are held in nano-units of the native currency.
pub type Amount = u64;

/// One whole unit of the native currency.
pub const UNIT: Amount = 1_000_000_000;

/// 20-byte account identity, displayed as `0x`-prefixed hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; 20]);

impl Address {
    pub fn new(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    /// Address ending in the big-endian bytes of `n`; handy for fixtures.
    pub fn from_low_u64(n: u64) -> Self {
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&n.to_be_bytes());
        Address(bytes)
    }

    pub fn random<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0u8; 20];
        rng.fill_bytes(&mut bytes);
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// First four bytes in hex, for log lines.
    pub fn short(&self) -> String {
        format!("0x{}", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches("0x");
        let raw = hex::decode(trimmed).map_err(|e| format!("invalid address {}: {}", s, e))?;
        let bytes: [u8; 20] = raw
            .try_into()
            .map_err(|_| format!("invalid address {}: expected 20 bytes", s))?;
        Ok(Address(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

/// Opaque flight identifier, globally unique across airlines.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlightId(Vec<u8>);

impl FlightId {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        FlightId(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for FlightId {
    fn from(name: &str) -> Self {
        FlightId(name.as_bytes().to_vec())
    }
}

impl fmt::Display for FlightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(name) => write!(f, "{}", name),
            Err(_) => write!(f, "0x{}", hex::encode(&self.0)),
        }
    }
}

impl fmt::Debug for FlightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FlightId({})", self)
    }
}
