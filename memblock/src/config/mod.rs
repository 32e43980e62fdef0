//! Configuration management for the memory block library.
//! Settings are `key=value` lines; see `ConfigManager::set_defaults` for the
//! recognised keys.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use core::fmt;
use core::str::FromStr;
use common::{BlockId, BLOCK_COUNT};
use lazy_static::lazy_static;
use log::LevelFilter;
use spin::Mutex;
use crate::block::block_store::BlockNames;
use crate::block::chunked::CHUNK_SIZE;
use crate::block::ramstore::DEFAULT_BLOCK_SIZE;

/// A single configuration value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    /// String value
    String(String),
    /// Integer value
    Integer(i64),
    /// Boolean value
    Boolean(bool),
}

impl ConfigValue {
    /// Create a string value
    pub fn string(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }

    /// Create an integer value
    pub fn integer(value: i64) -> Self {
        ConfigValue::Integer(value)
    }

    /// Create a boolean value
    pub fn boolean(value: bool) -> Self {
        ConfigValue::Boolean(value)
    }

    /// Parse a raw value the way it appears in a config file
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("true") {
            ConfigValue::boolean(true)
        } else if value.eq_ignore_ascii_case("false") {
            ConfigValue::boolean(false)
        } else if let Ok(int_value) = value.parse::<i64>() {
            ConfigValue::integer(int_value)
        } else {
            ConfigValue::string(value)
        }
    }

    /// Convert to string
    pub fn as_string(&self) -> String {
        match self {
            ConfigValue::String(s) => s.clone(),
            ConfigValue::Integer(i) => i.to_string(),
            ConfigValue::Boolean(b) => b.to_string(),
        }
    }

    /// Try to get as integer
    pub fn try_as_integer(&self) -> Option<i64> {
        match self {
            ConfigValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

/// A configuration value that could not be used
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { key: String, expected: &'static str },
}

impl ConfigError {
    fn invalid(key: &str, expected: &'static str) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            expected,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue { key, expected } => {
                write!(f, "invalid value for {}: expected {}", key, expected)
            }
        }
    }
}

/// Which store implementation backs the shared store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Byte-addressed blocks in RAM
    Ram,
    /// DDR-style memory addressed in 32-bit chunks
    Chunked,
}

/// Typed view of the `store.*` settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub block_size: usize,
    pub names: BlockNames,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Ram,
            block_size: DEFAULT_BLOCK_SIZE,
            names: BlockNames::default(),
        }
    }
}

impl StoreConfig {
    /// Check that a store can be built from these settings. Errors name the
    /// config key holding the offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_size == 0 {
            return Err(ConfigError::invalid("store.block_size", "a positive integer"));
        }
        if self.backend == StoreBackend::Chunked && self.block_size % CHUNK_SIZE != 0 {
            return Err(ConfigError::invalid("store.block_size", "a multiple of 4 for the chunked backend"));
        }

        for block in BlockId::ALL {
            let name = self.names.name(block);
            let taken = BlockId::ALL[..block.index()]
                .iter()
                .any(|earlier| self.names.name(*earlier) == name);
            if name.is_empty() || taken {
                return Err(ConfigError::invalid(&block_name_key(block), "a non-empty name unique among blocks"));
            }
        }
        Ok(())
    }
}

const DEFAULT_HEXDUMP_INDENT: usize = 2;

fn block_name_key(block: BlockId) -> String {
    format!("store.block{}.name", block.index())
}

/// Configuration manager
pub struct ConfigManager {
    /// Configuration values
    values: BTreeMap<String, ConfigValue>,
    /// Whether configuration has been modified
    modified: bool,
}

impl ConfigManager {
    /// Create a new, empty configuration manager
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
            modified: false,
        }
    }

    /// Get a configuration value
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    /// Set a configuration value
    pub fn set(&mut self, key: &str, value: ConfigValue) {
        self.values.insert(key.to_string(), value);
        self.modified = true;
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Replace the configuration with the contents of a config file
    pub fn load_from_str(&mut self, content: &str) {
        // Clear existing configuration
        self.values.clear();

        for line in content.lines() {
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            // Parse key=value
            if let Some(pos) = line.find('=') {
                let key = line[..pos].trim();
                let value = line[pos + 1..].trim();

                if key.is_empty() {
                    continue;
                }

                self.set(key, ConfigValue::parse(value));
            } else {
                log::debug!("Ignoring config line without '=': {}", line);
            }
        }

        self.modified = false;
    }

    /// Render the configuration in config file form
    pub fn to_text(&self) -> String {
        let mut content = String::new();
        content.push_str("# memblock configuration\n\n");

        for (key, value) in &self.values {
            content.push_str(&format!("{}={}\n", key, value.as_string()));
        }

        content
    }

    /// Set default configuration values
    pub fn set_defaults(&mut self) {
        let defaults = StoreConfig::default();

        // Store settings
        self.set("store.backend", ConfigValue::string("ram"));
        self.set("store.block_size", ConfigValue::integer(defaults.block_size as i64));
        for block in BlockId::ALL {
            self.set(&block_name_key(block), ConfigValue::string(defaults.names.name(block)));
        }

        // Output settings
        self.set("hexdump.indent", ConfigValue::integer(DEFAULT_HEXDUMP_INDENT as i64));
        self.set("log.level", ConfigValue::string("info"));

        self.modified = true;
    }

    /// Build the store settings, falling back to defaults for missing keys
    pub fn store_config(&self) -> Result<StoreConfig, ConfigError> {
        let defaults = StoreConfig::default();

        let backend = match self.get("store.backend") {
            None => defaults.backend,
            Some(value) => match value.as_string().as_str() {
                "ram" => StoreBackend::Ram,
                "chunked" => StoreBackend::Chunked,
                _ => return Err(ConfigError::invalid("store.backend", "\"ram\" or \"chunked\"")),
            },
        };

        let block_size = match self.get("store.block_size") {
            None => defaults.block_size,
            Some(value) => value
                .try_as_integer()
                .and_then(|size| usize::try_from(size).ok())
                .ok_or_else(|| ConfigError::invalid("store.block_size", "a positive integer"))?,
        };

        let mut names: [String; BLOCK_COUNT] = Default::default();
        for block in BlockId::ALL {
            names[block.index()] = match self.get(&block_name_key(block)) {
                None => defaults.names.name(block).to_string(),
                Some(value) => value.as_string(),
            };
        }

        let store_config = StoreConfig {
            backend,
            block_size,
            names: BlockNames::new(names),
        };
        store_config.validate()?;
        Ok(store_config)
    }

    /// Indent callers should use for hex dumps
    pub fn hexdump_indent(&self) -> Result<usize, ConfigError> {
        match self.get("hexdump.indent") {
            None => Ok(DEFAULT_HEXDUMP_INDENT),
            Some(value) => value
                .try_as_integer()
                .and_then(|indent| usize::try_from(indent).ok())
                .ok_or_else(|| ConfigError::invalid("hexdump.indent", "a non-negative integer")),
        }
    }

    /// Maximum level of log records to keep
    pub fn log_level(&self) -> Result<LevelFilter, ConfigError> {
        match self.get("log.level") {
            None => Ok(LevelFilter::Info),
            Some(value) => LevelFilter::from_str(&value.as_string())
                .map_err(|_| ConfigError::invalid("log.level", "off, error, warn, info, debug or trace")),
        }
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

// Global configuration manager
lazy_static! {
    static ref CONFIG: Mutex<ConfigManager> = {
        let mut config = ConfigManager::new();
        config.set_defaults();
        Mutex::new(config)
    };
}

/// Replace the global configuration with the contents of a config file.
///
/// The shared store is built on first use, so store settings loaded after
/// that point do not affect it.
pub fn load_from_str(content: &str) {
    CONFIG.lock().load_from_str(content);
    log::debug!("Configuration loaded");
}

/// Store settings from the global configuration
pub fn store_config() -> Result<StoreConfig, ConfigError> {
    CONFIG.lock().store_config()
}

/// Hex dump indent from the global configuration
pub fn hexdump_indent() -> Result<usize, ConfigError> {
    CONFIG.lock().hexdump_indent()
}

/// Log level from the global configuration
pub fn log_level() -> Result<LevelFilter, ConfigError> {
    CONFIG.lock().log_level()
}
