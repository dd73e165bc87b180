use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::blockchain::{Amount, UNIT};

/// Airlines that can be registered by a single sponsor.
pub const BOOTSTRAP_SIZE: usize = 4;
/// Cumulative funding that makes an airline a participant.
pub const FUND_THRESHOLD: Amount = 10 * UNIT;
/// Largest premium an insuree may pay per flight.
pub const MAX_PREMIUM: Amount = UNIT;
/// Payout is premium * 3 / 2.
pub const PAYOUT_NUMERATOR: u64 = 3;
pub const PAYOUT_DENOMINATOR: u64 = 2;
/// Fee an oracle pays to register.
pub const REGISTRATION_FEE: Amount = UNIT;
/// Shard indices are drawn from `[0, INDEX_RANGE)`.
pub const INDEX_RANGE: u8 = 10;
/// Matching responses needed to finalize a status.
pub const QUORUM_COUNT: usize = 3;

/// Oracle identities owned by the coordinator by default.
pub const DEFAULT_ORACLE_COUNT: usize = 20;

/// Numeric rules of the protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolParams {
    pub bootstrap_size: usize,
    pub fund_threshold: Amount,
    pub max_premium: Amount,
    pub payout_numerator: u64,
    pub payout_denominator: u64,
    pub registration_fee: Amount,
    pub index_range: u8,
    pub quorum_count: usize,
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            bootstrap_size: BOOTSTRAP_SIZE,
            fund_threshold: FUND_THRESHOLD,
            max_premium: MAX_PREMIUM,
            payout_numerator: PAYOUT_NUMERATOR,
            payout_denominator: PAYOUT_DENOMINATOR,
            registration_fee: REGISTRATION_FEE,
            index_range: INDEX_RANGE,
            quorum_count: QUORUM_COUNT,
        }
    }
}

/// Where the coordinator's simulated oracles take their status codes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeedMode {
    /// Uniformly random among all status codes.
    #[default]
    Random,
    OnTime,
    LateAirline,
}

impl FromStr for FeedMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(FeedMode::Random),
            "on-time" | "ontime" => Ok(FeedMode::OnTime),
            "late-airline" | "lateairline" => Ok(FeedMode::LateAirline),
            other => Err(format!("unknown feed mode '{}', expected random, on-time or late-airline", other)),
        }
    }
}

impl fmt::Display for FeedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedMode::Random => write!(f, "random"),
            FeedMode::OnTime => write!(f, "on-time"),
            FeedMode::LateAirline => write!(f, "late-airline"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    pub oracle_count: usize,
    /// Jobs buffered per oracle worker.
    pub channel_capacity: usize,
    /// Period of the sweep that re-drives still-open requests.
    pub resubmit_interval_ms: u64,
    /// Sweeps per request before the coordinator gives up on it.
    pub max_resubmit_rounds: u32,
    pub feed: FeedMode,
    /// Seed for the random feed; unset means seeded from the OS.
    pub feed_seed: Option<u64>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            oracle_count: DEFAULT_ORACLE_COUNT,
            channel_capacity: 64,
            resubmit_interval_ms: 500,
            max_resubmit_rounds: 20,
            feed: FeedMode::Random,
            feed_seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Ledger owner as 0x-prefixed hex; generated at startup when unset.
    pub owner: Option<String>,
    /// Reject entry-point calls from gateways the owner has not authorized.
    pub enforce_caller_authorization: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuretyConfig {
    pub log_level: String,
    /// Seed for shard-index entropy; unset means a fresh OS beacon.
    pub entropy_seed: Option<u64>,
    pub protocol: ProtocolParams,
    pub coordinator: CoordinatorConfig,
    pub admin: AdminConfig,
}

impl Default for SuretyConfig {
    fn default() -> Self {
        Self::local()
    }
}

impl SuretyConfig {
    /// Single-process defaults.
    pub fn local() -> Self {
        Self {
            protocol: ProtocolParams::default(),
            coordinator: CoordinatorConfig::default(),
            admin: AdminConfig {
                owner: None,
                enforce_caller_authorization: true,
            },
            log_level: "info".to_string(),
            entropy_seed: None,
        }
    }

    /// Reproducible runs: fixed seeds, more oracles, verbose logs.
    pub fn devnet() -> Self {
        let mut config = Self::local();
        config.coordinator.oracle_count = 40;
        config.coordinator.resubmit_interval_ms = 200;
        config.coordinator.feed_seed = Some(7);
        config.entropy_seed = Some(42);
        config.log_level = "debug".to_string();
        config
    }
}
