//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Environment variables are read by the binaries only; the helpers
//! here take the raw `Option<String>` so parsing stays testable without touching process state.

use crate::constants::{
    DEFAULT_COLLABORATOR_TIMEOUT_MS, DEFAULT_DIRECTORY_RESULT_CAP, DEFAULT_MAXIMUM_CAPACITY,
    DEFAULT_MINIMUM_THRESHOLD, DEFAULT_SEARCH_RADIUS_KM,
};
use crate::{CoreError, CoreResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Alerting bounds applied to inventory records created by the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StockDefaults {
    pub minimum_threshold: u32,
    pub maximum_capacity: u32,
}

impl Default for StockDefaults {
    fn default() -> Self {
        Self {
            minimum_threshold: DEFAULT_MINIMUM_THRESHOLD,
            maximum_capacity: DEFAULT_MAXIMUM_CAPACITY,
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    inventory_data_dir: Option<PathBuf>,
    search_radius_km: f64,
    directory_result_cap: usize,
    collaborator_timeout: Duration,
    stock_defaults: StockDefaults,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            inventory_data_dir: None,
            search_radius_km: DEFAULT_SEARCH_RADIUS_KM,
            directory_result_cap: DEFAULT_DIRECTORY_RESULT_CAP,
            collaborator_timeout: Duration::from_millis(DEFAULT_COLLABORATOR_TIMEOUT_MS),
            stock_defaults: StockDefaults::default(),
        }
    }
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// `inventory_data_dir` of `None` selects the in-memory inventory store.
    pub fn new(
        inventory_data_dir: Option<PathBuf>,
        search_radius_km: f64,
        directory_result_cap: usize,
        collaborator_timeout: Duration,
        stock_defaults: StockDefaults,
    ) -> CoreResult<Self> {
        if !search_radius_km.is_finite() || search_radius_km <= 0.0 {
            return Err(CoreError::InvalidInput(
                "search_radius_km must be a positive number".into(),
            ));
        }
        if directory_result_cap == 0 {
            return Err(CoreError::InvalidInput(
                "directory_result_cap must be at least 1".into(),
            ));
        }
        if collaborator_timeout.is_zero() {
            return Err(CoreError::InvalidInput(
                "collaborator_timeout must be greater than zero".into(),
            ));
        }
        if stock_defaults.maximum_capacity == 0 {
            return Err(CoreError::InvalidInput(
                "maximum_capacity must be at least 1".into(),
            ));
        }

        Ok(Self {
            inventory_data_dir,
            search_radius_km,
            directory_result_cap,
            collaborator_timeout,
            stock_defaults,
        })
    }

    pub fn inventory_data_dir(&self) -> Option<&Path> {
        self.inventory_data_dir.as_deref()
    }

    pub fn search_radius_km(&self) -> f64 {
        self.search_radius_km
    }

    pub fn directory_result_cap(&self) -> usize {
        self.directory_result_cap
    }

    pub fn collaborator_timeout(&self) -> Duration {
        self.collaborator_timeout
    }

    pub fn stock_defaults(&self) -> StockDefaults {
        self.stock_defaults
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or_default<T: FromStr>(value: Option<String>, name: &str, default: T) -> CoreResult<T> {
    match non_blank(value) {
        None => Ok(default),
        Some(v) => v
            .parse::<T>()
            .map_err(|_| CoreError::InvalidInput(format!("{name} has an invalid value: '{v}'"))),
    }
}

/// Parse the inventory data directory from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns `None` (in-memory store).
pub fn inventory_data_dir_from_env_value(value: Option<String>) -> Option<PathBuf> {
    non_blank(value).map(PathBuf::from)
}

/// Parse the default search radius in kilometres.
pub fn search_radius_km_from_env_value(value: Option<String>) -> CoreResult<f64> {
    let radius = parse_or_default(value, "HEMO_SEARCH_RADIUS_KM", DEFAULT_SEARCH_RADIUS_KM)?;
    if !radius.is_finite() || radius <= 0.0 {
        return Err(CoreError::InvalidInput(
            "HEMO_SEARCH_RADIUS_KM must be a positive number".into(),
        ));
    }
    Ok(radius)
}

/// Parse the directory result cap used for donor matching.
pub fn directory_result_cap_from_env_value(value: Option<String>) -> CoreResult<usize> {
    parse_or_default(
        value,
        "HEMO_DIRECTORY_RESULT_CAP",
        DEFAULT_DIRECTORY_RESULT_CAP,
    )
}

/// Parse the collaborator timeout, given in milliseconds.
pub fn collaborator_timeout_from_env_value(value: Option<String>) -> CoreResult<Duration> {
    parse_or_default(
        value,
        "HEMO_COLLABORATOR_TIMEOUT_MS",
        DEFAULT_COLLABORATOR_TIMEOUT_MS,
    )
    .map(Duration::from_millis)
}

/// Parse the minimum stock threshold applied to new inventory records.
pub fn minimum_threshold_from_env_value(value: Option<String>) -> CoreResult<u32> {
    parse_or_default(value, "HEMO_MIN_THRESHOLD", DEFAULT_MINIMUM_THRESHOLD)
}

/// Parse the maximum capacity applied to new inventory records.
pub fn maximum_capacity_from_env_value(value: Option<String>) -> CoreResult<u32> {
    parse_or_default(value, "HEMO_MAX_CAPACITY", DEFAULT_MAXIMUM_CAPACITY)
}

/// Resolve a full [`CoreConfig`] through `lookup`, which maps an environment variable name to
/// its value. Binaries pass `|name| std::env::var(name).ok()`.
pub fn core_config_from_env_values(
    lookup: impl Fn(&str) -> Option<String>,
) -> CoreResult<CoreConfig> {
    CoreConfig::new(
        inventory_data_dir_from_env_value(lookup("INVENTORY_DATA_DIR")),
        search_radius_km_from_env_value(lookup("HEMO_SEARCH_RADIUS_KM"))?,
        directory_result_cap_from_env_value(lookup("HEMO_DIRECTORY_RESULT_CAP"))?,
        collaborator_timeout_from_env_value(lookup("HEMO_COLLABORATOR_TIMEOUT_MS"))?,
        StockDefaults {
            minimum_threshold: minimum_threshold_from_env_value(lookup("HEMO_MIN_THRESHOLD"))?,
            maximum_capacity: maximum_capacity_from_env_value(lookup("HEMO_MAX_CAPACITY"))?,
        },
    )
}
