//! Environment-driven configuration for the message board.
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `BOARD_ID_STRATEGY` | `random` or `sequential` | `random` |
//! | `BOARD_MAX_KEY_BYTES` | key bound, 16 to 64 | 64 |
//! | `BOARD_MAX_VALUE_BYTES` | encoded record bound, at least 128 | 1024 |
//! | `BOARD_DATA_DIR` | snapshot store directory | unset |
//! | `BOARD_DATABASE_URL` | `PostgreSQL` connection URL | unset |

use crate::board::domain::{IdStrategy, ParseIdStrategyError};
use crate::board::ports::StoreLimits;
use camino::Utf8PathBuf;
use std::env;
use std::num::ParseIntError;
use thiserror::Error;

/// Variable selecting the identifier strategy.
pub const ID_STRATEGY_ENV: &str = "BOARD_ID_STRATEGY";
/// Variable holding the key bound.
pub const MAX_KEY_BYTES_ENV: &str = "BOARD_MAX_KEY_BYTES";
/// Variable holding the encoded record bound.
pub const MAX_VALUE_BYTES_ENV: &str = "BOARD_MAX_VALUE_BYTES";
/// Variable naming the snapshot store directory.
pub const DATA_DIR_ENV: &str = "BOARD_DATA_DIR";
/// Variable holding the `PostgreSQL` connection URL.
pub const DATABASE_URL_ENV: &str = "BOARD_DATABASE_URL";

const MIN_KEY_BYTES: usize = 16;
const MAX_KEY_BYTES: usize = 64;
const MIN_VALUE_BYTES: usize = 128;

/// Errors returned while loading configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The identifier strategy name is unknown.
    #[error("{variable}: {source}")]
    InvalidIdStrategy {
        /// Variable holding the value.
        variable: &'static str,
        /// Parse failure.
        source: ParseIdStrategyError,
    },

    /// A numeric variable does not parse.
    #[error("{variable}: '{value}' is not a byte count: {source}")]
    InvalidNumber {
        /// Variable holding the value.
        variable: &'static str,
        /// Raw value.
        value: String,
        /// Parse failure.
        source: ParseIntError,
    },

    /// A numeric variable lies outside its accepted range.
    #[error("{variable}: {value} is outside {min}..={max}")]
    OutOfRange {
        /// Variable holding the value.
        variable: &'static str,
        /// Parsed value.
        value: usize,
        /// Smallest accepted value.
        min: usize,
        /// Largest accepted value.
        max: usize,
    },

    /// The key bound cannot hold identifiers of the chosen strategy.
    #[error("{strategy} identifiers need {required} key bytes, limit is {limit}")]
    KeyLimitTooSmall {
        /// Selected strategy.
        strategy: IdStrategy,
        /// Configured key bound.
        limit: usize,
        /// Bytes the strategy needs.
        required: usize,
    },
}

/// Message board configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardConfig {
    id_strategy: IdStrategy,
    limits: StoreLimits,
    data_dir: Option<Utf8PathBuf>,
    database_url: Option<String>,
}

impl BoardConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the first invalid variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the first invalid variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let id_strategy = read(ID_STRATEGY_ENV)
            .map(|value| IdStrategy::try_from(value.as_str()))
            .transpose()
            .map_err(|source| ConfigError::InvalidIdStrategy {
                variable: ID_STRATEGY_ENV,
                source,
            })?
            .unwrap_or_default();

        let max_key_bytes = read_bytes(
            MAX_KEY_BYTES_ENV,
            read(MAX_KEY_BYTES_ENV),
            StoreLimits::DEFAULT_MAX_KEY_BYTES,
            (MIN_KEY_BYTES, MAX_KEY_BYTES),
        )?;
        let max_value_bytes = read_bytes(
            MAX_VALUE_BYTES_ENV,
            read(MAX_VALUE_BYTES_ENV),
            StoreLimits::DEFAULT_MAX_VALUE_BYTES,
            (MIN_VALUE_BYTES, usize::MAX),
        )?;

        let config = Self {
            id_strategy,
            limits: StoreLimits::new(max_key_bytes, max_value_bytes),
            data_dir: read(DATA_DIR_ENV).map(Utf8PathBuf::from),
            database_url: read(DATABASE_URL_ENV),
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that the key bound fits the identifier strategy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::KeyLimitTooSmall`] when identifiers of the
    /// selected strategy could exceed the key bound.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        let required = self.id_strategy.max_key_bytes();
        let limit = self.limits.max_key_bytes();
        if limit < required {
            return Err(ConfigError::KeyLimitTooSmall {
                strategy: self.id_strategy,
                limit,
                required,
            });
        }
        Ok(())
    }

    /// Replaces the identifier strategy.
    #[must_use]
    pub const fn with_id_strategy(mut self, id_strategy: IdStrategy) -> Self {
        self.id_strategy = id_strategy;
        self
    }

    /// Replaces the store limits.
    #[must_use]
    pub const fn with_limits(mut self, limits: StoreLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Sets the snapshot store directory.
    #[must_use]
    pub fn with_data_dir(mut self, data_dir: impl Into<Utf8PathBuf>) -> Self {
        self.data_dir = Some(data_dir.into());
        self
    }

    /// Sets the `PostgreSQL` connection URL.
    #[must_use]
    pub fn with_database_url(mut self, database_url: impl Into<String>) -> Self {
        self.database_url = Some(database_url.into());
        self
    }

    /// Returns the identifier strategy.
    #[must_use]
    pub const fn id_strategy(&self) -> IdStrategy {
        self.id_strategy
    }

    /// Returns the store limits.
    #[must_use]
    pub const fn limits(&self) -> StoreLimits {
        self.limits
    }

    /// Returns the snapshot store directory, if configured.
    #[must_use]
    pub fn data_dir(&self) -> Option<&camino::Utf8Path> {
        self.data_dir.as_deref()
    }

    /// Returns the `PostgreSQL` connection URL, if configured.
    #[must_use]
    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }
}

fn read_bytes(
    variable: &'static str,
    raw: Option<String>,
    default: usize,
    (min, max): (usize, usize),
) -> Result<usize, ConfigError> {
    let Some(text) = raw else {
        return Ok(default);
    };
    let value = text
        .trim()
        .parse::<usize>()
        .map_err(|source| ConfigError::InvalidNumber {
            variable,
            value: text.clone(),
            source,
        })?;
    if !(min..=max).contains(&value) {
        return Err(ConfigError::OutOfRange {
            variable,
            value,
            min,
            max,
        });
    }
    Ok(value)
}
