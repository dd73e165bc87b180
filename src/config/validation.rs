use log::warn;

use super::presets::SuretyConfig;
use super::ConfigError;
use crate::blockchain::Address;
use crate::consensus::sharding::INDEXES_PER_ORACLE;

/// Outcome of validating a configuration.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigError>,
    /// Valid but likely to hurt liveness.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(ConfigError::Invalid(message.into()));
    }

    /// First error, if any.
    pub fn into_result(mut self) -> Result<Vec<String>, ConfigError> {
        if self.errors.is_empty() {
            Ok(self.warnings)
        } else {
            Err(self.errors.remove(0))
        }
    }
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &SuretyConfig) -> ValidationResult {
        let mut result = ValidationResult::default();
        let protocol = &config.protocol;

        if protocol.bootstrap_size == 0 {
            result.error("protocol.bootstrap_size must be at least 1");
        }
        if protocol.fund_threshold == 0 {
            result.error("protocol.fund_threshold must be greater than zero");
        }
        if protocol.max_premium == 0 {
            result.error("protocol.max_premium must be greater than zero");
        }
        if protocol.payout_denominator == 0 {
            result.error("protocol.payout_denominator must not be zero");
        }
        if protocol.index_range == 0 {
            result.error("protocol.index_range must be at least 1");
        }
        if protocol.quorum_count == 0 {
            result.error("protocol.quorum_count must be at least 1");
        }

        let coordinator = &config.coordinator;
        if coordinator.channel_capacity == 0 {
            result.error("coordinator.channel_capacity must be at least 1");
        }
        if coordinator.resubmit_interval_ms == 0 {
            result.error("coordinator.resubmit_interval_ms must be greater than zero");
        }

        if let Some(owner) = &config.admin.owner {
            if let Err(e) = owner.parse::<Address>() {
                result.error(format!("admin.owner: {}", e));
            }
        }

        if protocol.payout_numerator < protocol.payout_denominator {
            result
                .warnings
                .push("payout multiplier is below 1x; insurees receive less than their premium".to_string());
        }

        // Expected oracles per shard index; below quorum some requests can never finalize.
        if protocol.index_range > 0 {
            let expected = coordinator.oracle_count * INDEXES_PER_ORACLE / protocol.index_range as usize;
            if expected < protocol.quorum_count {
                result.warnings.push(format!(
                    "{} oracles over {} indices gives ~{} per index, below quorum {}",
                    coordinator.oracle_count, protocol.index_range, expected, protocol.quorum_count
                ));
            }
        }

        for warning in &result.warnings {
            warn!("Configuration warning: {}", warning);
        }
        result
    }
}
