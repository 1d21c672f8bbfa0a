//! Pool options and the raw-input parser

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Normalized option set the pool runs on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolOptions {
    /// Connections the pool keeps alive through initialization and reaping
    pub min: usize,
    /// Capacity, placeholders included
    pub max: usize,
    /// How long `acquire` waits before giving up
    pub acquire_timeout: Duration,
    /// Idle time after which the reaper may destroy a connection
    pub idle_timeout: Duration,
    /// Reaper period; `None` disables idle reaping
    pub check_interval: Option<Duration>,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            min: 0,
            max: 10,
            acquire_timeout: Duration::from_secs(60),
            idle_timeout: Duration::from_secs(30),
            check_interval: Some(Duration::from_secs(1)),
        }
    }
}

impl PoolOptions {
    /// Parse raw option input, filling defaults for absent fields.
    ///
    /// A non-positive `checkInterval` disables reaping.
    pub fn parse(raw: RawPoolOptions) -> Result<Self> {
        let defaults = Self::default();

        let min = match raw.min {
            Some(min) => usize::try_from(min)
                .map_err(|_| Error::configuration(format!("min must not be negative, got {min}")))?,
            None => defaults.min,
        };
        let max = match raw.max {
            Some(max) if max <= 0 => {
                return Err(Error::configuration(format!(
                    "max must be positive, got {max}"
                )));
            }
            Some(max) => usize::try_from(max)
                .map_err(|_| Error::configuration(format!("max out of range: {max}")))?,
            None => defaults.max,
        };

        let options = Self {
            min,
            max,
            acquire_timeout: positive_millis("acquireTimeout", raw.acquire_timeout)?
                .unwrap_or(defaults.acquire_timeout),
            idle_timeout: positive_millis("idleTimeout", raw.idle_timeout)?
                .unwrap_or(defaults.idle_timeout),
            check_interval: match raw.check_interval {
                Some(ms) if ms <= 0 => None,
                Some(ms) => Some(Duration::from_millis(ms.unsigned_abs())),
                None => defaults.check_interval,
            },
        };
        options.validate()?;
        Ok(options)
    }

    /// Check the option set for contradictions.
    pub fn validate(&self) -> Result<()> {
        if self.max == 0 {
            return Err(Error::configuration("max must be greater than 0"));
        }
        if self.min > self.max {
            return Err(Error::configuration(format!(
                "min ({}) must not exceed max ({})",
                self.min, self.max
            )));
        }
        if self.acquire_timeout.is_zero() {
            return Err(Error::configuration("acquire_timeout must be greater than 0"));
        }
        if self.idle_timeout.is_zero() {
            return Err(Error::configuration("idle_timeout must be greater than 0"));
        }
        Ok(())
    }

    /// The reaper period in effect. A zero interval counts as disabled.
    #[must_use]
    pub fn reap_period(&self) -> Option<Duration> {
        self.check_interval.filter(|period| !period.is_zero())
    }
}

fn positive_millis(field: &str, value: Option<i64>) -> Result<Option<Duration>> {
    match value {
        Some(ms) if ms <= 0 => Err(Error::configuration(format!(
            "{field} must be positive, got {ms}"
        ))),
        Some(ms) => Ok(Some(Duration::from_millis(ms.unsigned_abs()))),
        None => Ok(None),
    }
}

/// Raw option input: every field optional, durations in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct RawPoolOptions {
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub acquire_timeout: Option<i64>,
    pub idle_timeout: Option<i64>,
    pub check_interval: Option<i64>,
}

impl TryFrom<RawPoolOptions> for PoolOptions {
    type Error = Error;

    fn try_from(raw: RawPoolOptions) -> Result<Self> {
        Self::parse(raw)
    }
}
