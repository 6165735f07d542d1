use std::{path::Path, time::Duration};

use figment::{
    Figment, Metadata, Profile, Provider,
    providers::{Env, Format, Serialized, Toml},
    value::{Dict, Map},
};
use rollup_tx::{OfferRecancelPolicy, VerifierConfig};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Prefix of environment variables overriding configuration values, e.g.
/// `ROLLUP_BLOCK_CAPACITY=100`.
pub const ENV_PREFIX: &str = "ROLLUP_";

// RECANCEL POLICY
// ================================================================================================

/// Configuration counterpart of [`OfferRecancelPolicy`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecancelPolicy {
    #[default]
    Allow,
    Reject,
}

impl From<RecancelPolicy> for OfferRecancelPolicy {
    fn from(policy: RecancelPolicy) -> Self {
        match policy {
            RecancelPolicy::Allow => Self::Allow,
            RecancelPolicy::Reject => Self::Reject,
        }
    }
}

// BLOCK PRODUCER CONFIG
// ================================================================================================

/// Configuration of the block producer.
///
/// Values are layered: built-in defaults, then an optional TOML file, then environment variables
/// prefixed with [`ENV_PREFIX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockProducerConfig {
    /// Maximum number of transactions in a block.
    pub block_capacity: usize,
    /// Maximum time the oldest transaction of an open block waits before the block is sealed.
    pub seal_timeout_secs: u64,
    /// Time a committed block may wait for its proof before it is reported as stalled.
    pub stall_timeout_secs: u64,
    /// Maximum number of blocks the open block may be ahead of the last persisted block.
    pub max_height_lag: u64,
    pub offer_recancel_policy: RecancelPolicy,
}

impl Default for BlockProducerConfig {
    fn default() -> Self {
        Self {
            block_capacity: 50,
            seal_timeout_secs: 600,
            stall_timeout_secs: 600,
            max_height_lag: 10,
            offer_recancel_policy: RecancelPolicy::Allow,
        }
    }
}

impl BlockProducerConfig {
    /// Loads the configuration from the TOML file at `path` and the environment.
    ///
    /// Missing values fall back to their defaults, and a missing file is treated as empty.
    ///
    /// # Errors
    /// Returns an error if the sources cannot be parsed or the resulting configuration is
    /// invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_figment(
            Figment::from(Self::default())
                .merge(Toml::file(path.as_ref()))
                .merge(Env::prefixed(ENV_PREFIX)),
        )
    }

    /// Extracts and validates the configuration from an arbitrary figment.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn seal_timeout(&self) -> Duration {
        Duration::from_secs(self.seal_timeout_secs)
    }

    pub fn stall_timeout(&self) -> Duration {
        Duration::from_secs(self.stall_timeout_secs)
    }

    pub fn verifier_config(&self) -> VerifierConfig {
        VerifierConfig {
            offer_recancel_policy: self.offer_recancel_policy.into(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.block_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "block_capacity",
                reason: "a block must hold at least one transaction",
            });
        }
        if self.max_height_lag == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_height_lag",
                reason: "at least one block must be allowed ahead of the persisted block",
            });
        }
        Ok(())
    }
}

impl Provider for BlockProducerConfig {
    fn metadata(&self) -> Metadata {
        Metadata::named("block producer defaults")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        Serialized::defaults(self).data()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn file_values_override_defaults() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "block_capacity = 8")?;
        writeln!(file, "offer_recancel_policy = \"reject\"")?;

        let config = BlockProducerConfig::load(file.path())?;
        assert_eq!(config.block_capacity, 8);
        assert_eq!(config.seal_timeout(), Duration::from_secs(600));
        assert_eq!(config.verifier_config().offer_recancel_policy, OfferRecancelPolicy::Reject);
        Ok(())
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let figment = Figment::from(BlockProducerConfig::default())
            .merge(Serialized::default("block_capacity", 0));

        assert_matches!(
            BlockProducerConfig::from_figment(figment),
            Err(ConfigError::InvalidValue { field: "block_capacity", .. })
        );
    }
}
