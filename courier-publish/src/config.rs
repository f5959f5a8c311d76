//! Publisher configuration

use serde::{Deserialize, Serialize};

use crate::{circuit_breaker::CircuitBreakerConfig, policy::RetryPolicy};

const fn default_group_size() -> usize {
    10
}

fn default_target() -> String {
    "courier-outbound".to_string()
}

/// Configuration for the batch publisher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Identifier of the downstream queue or target
    #[serde(default = "default_target")]
    pub target: String,

    /// Entries per delivery group (clamped to the transport's batch limit)
    #[serde(default = "default_group_size")]
    pub group_size: usize,

    /// Retry scheduling for failed entries
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Circuit breaker guarding the downstream
    #[serde(default)]
    pub breaker: CircuitBreakerConfig,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            target: default_target(),
            group_size: default_group_size(),
            retry: RetryPolicy::default(),
            breaker: CircuitBreakerConfig::default(),
        }
    }
}

impl PublisherConfig {
    /// Validate the configuration
    ///
    /// # Errors
    /// If the target is blank, the group size is zero, or the backoff
    /// multiplier would shrink delays between rounds
    pub fn validate(&self) -> Result<(), crate::error::PublishError> {
        if self.target.trim().is_empty() {
            return Err(crate::error::PublishError::Configuration(
                "target must not be blank".to_string(),
            ));
        }
        if self.group_size == 0 {
            return Err(crate::error::PublishError::Configuration(
                "group_size must be at least 1".to_string(),
            ));
        }
        if self.retry.backoff_multiplier < 1.0 {
            return Err(crate::error::PublishError::Configuration(format!(
                "backoff_multiplier must be at least 1.0, got {}",
                self.retry.backoff_multiplier
            )));
        }
        Ok(())
    }
}
