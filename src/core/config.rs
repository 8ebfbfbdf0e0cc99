use crate::core::common::OxiheapError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Row-version slots per heap page. Bounded by the slot id width.
    pub page_capacity: usize,
    /// Whether catalog snapshots are written as pretty-printed JSON.
    pub snapshot_pretty: bool,
}

/// Builder for `Config`.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    page_capacity: Option<usize>,
    snapshot_pretty: Option<bool>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of row-version slots per heap page
    pub fn page_capacity(mut self, capacity: usize) -> Self {
        self.page_capacity = Some(capacity);
        self
    }

    /// Enables or disables pretty-printed catalog snapshots
    pub fn snapshot_pretty(mut self, pretty: bool) -> Self {
        self.snapshot_pretty = Some(pretty);
        self
    }

    /// Builds the `Config` instance with validation.
    ///
    /// # Errors
    ///
    /// Returns `OxiheapError::Configuration` if a value is out of range.
    pub fn build(self) -> Result<Config, OxiheapError> {
        let config = Config {
            page_capacity: self.page_capacity.unwrap_or(128),
            snapshot_pretty: self.snapshot_pretty.unwrap_or(false),
        };
        config.validate()?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self { page_capacity: 128, snapshot_pretty: false }
    }
}

impl Config {
    /// Creates a new `ConfigBuilder` for fluent configuration
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `OxiheapError::Configuration` if `page_capacity` is zero or
    /// exceeds what a slot id can address.
    pub fn validate(&self) -> Result<(), OxiheapError> {
        if self.page_capacity == 0 {
            return Err(OxiheapError::Configuration(
                "page_capacity must be greater than 0".to_string(),
            ));
        }
        if self.page_capacity > usize::from(u16::MAX) {
            return Err(OxiheapError::Configuration(format!(
                "page_capacity must not exceed {}",
                u16::MAX
            )));
        }
        Ok(())
    }

    /// Loads configuration from a TOML file. A missing file yields the
    /// default configuration.
    ///
    /// # Errors
    ///
    /// Returns `OxiheapError::Configuration` if the file cannot be parsed or
    /// fails validation, `OxiheapError::Io` on any other read failure.
    pub fn load_from_file(path: &Path) -> Result<Self, OxiheapError> {
        match fs::read_to_string(path) {
            Ok(contents) => {
                let config: Self = toml::from_str(&contents).map_err(|e| {
                    OxiheapError::Configuration(format!(
                        "Failed to parse config file '{}': {}",
                        path.display(),
                        e
                    ))
                })?;
                config.validate()?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(OxiheapError::Io(e)),
        }
    }

    /// Loads configuration from an optional TOML file path, defaulting when
    /// no path is given.
    ///
    /// # Errors
    ///
    /// Propagates `load_from_file` errors.
    pub fn load_or_default(optional_path: Option<&Path>) -> Result<Self, OxiheapError> {
        match optional_path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }
}
