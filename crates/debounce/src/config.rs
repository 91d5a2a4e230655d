//! Debounce configuration

use crate::error::DebounceError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest accepted quiet period (24 hours)
pub const MAX_DELAY_MS: u64 = 86_400_000;

/// Default quiet period when none is configured
pub const DEFAULT_DELAY_MS: u64 = 200;

/// Serializable debounce settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    /// Quiet period in milliseconds (0-86,400,000)
    pub delay_ms: u64,

    /// Name used in log events and failure reports
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_DELAY_MS,
            label: None,
        }
    }
}

impl DebounceConfig {
    /// Check that all values are within their valid ranges
    pub fn validate(&self) -> Result<(), DebounceError> {
        if self.delay_ms > MAX_DELAY_MS {
            return Err(DebounceError::DelayTooLarge {
                millis: u128::from(self.delay_ms),
                max: MAX_DELAY_MS,
            });
        }
        Ok(())
    }

    /// Quiet period as a [`Duration`]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Convert a signed millisecond count into a quiet period
///
/// Rejects negative values and values above [`MAX_DELAY_MS`].
pub fn delay_from_millis(millis: i64) -> Result<Duration, DebounceError> {
    let millis = u64::try_from(millis).map_err(|_| DebounceError::NegativeDelay(millis))?;
    if millis > MAX_DELAY_MS {
        return Err(DebounceError::DelayTooLarge {
            millis: u128::from(millis),
            max: MAX_DELAY_MS,
        });
    }
    Ok(Duration::from_millis(millis))
}
