//! Container configuration
//!
//! Settings can be built in code with the `with_*` methods or loaded from a
//! TOML file:
//!
//! ```toml
//! depth = 1
//! max_items = 5
//! sortable = true
//!
//! [messages]
//! capacity = "You can add at most {max} menu items."
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Placeholder written into rewritten templates
pub const DEFAULT_PLACEHOLDER: &str = "{{index}}";

/// Distance kept between a server-rendered index and the first new one
pub const DEFAULT_SEED_MARGIN: u64 = 5;

/// Errors that can occur when loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Configuration for one replication container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerConfig {
    /// Number of replication containers enclosing this one
    pub depth: usize,
    /// Maximum number of live instances, `None` for unlimited
    pub max_items: Option<usize>,
    /// Whether instances carry an order that can be rearranged
    pub sortable: bool,
    /// Placeholder shown in rewritten templates
    pub placeholder: String,
    /// Added to the seed index before the first allocation
    pub seed_margin: u64,
    /// Text of the undo marker shown after a removal
    pub undo_message: String,
    /// Message shown when an undo would exceed `max_items`; `{max}` is replaced
    pub capacity_message: String,
}

/// TOML structure for deserializing container configs
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    depth: Option<usize>,
    max_items: Option<usize>,
    sortable: Option<bool>,
    placeholder: Option<String>,
    seed_margin: Option<u64>,
    messages: Option<TomlMessages>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlMessages {
    undo: Option<String>,
    capacity: Option<String>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            depth: 0,
            max_items: None,
            sortable: false,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            seed_margin: DEFAULT_SEED_MARGIN,
            undo_message: "Item removed.".to_string(),
            capacity_message: "You can add at most {max} items.".to_string(),
        }
    }
}

impl ContainerConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(content)?;
        let defaults = Self::default();
        let messages = parsed.messages;

        Ok(Self {
            depth: parsed.depth.unwrap_or(defaults.depth),
            max_items: parsed.max_items,
            sortable: parsed.sortable.unwrap_or(defaults.sortable),
            placeholder: parsed.placeholder.unwrap_or(defaults.placeholder),
            seed_margin: parsed.seed_margin.unwrap_or(defaults.seed_margin),
            undo_message: messages
                .as_ref()
                .and_then(|m| m.undo.clone())
                .unwrap_or(defaults.undo_message),
            capacity_message: messages
                .as_ref()
                .and_then(|m| m.capacity.clone())
                .unwrap_or(defaults.capacity_message),
        })
    }

    /// Configuration for a container nested directly inside this one
    pub fn child(&self) -> Self {
        Self {
            depth: self.depth + 1,
            ..Self::default()
        }
    }

    /// Set the nesting depth
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Set the maximum number of live instances
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = Some(max_items);
        self
    }

    /// Enable or disable ordering
    pub fn with_sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    /// Set the placeholder used in rewritten templates
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Set the margin added to the seed index
    pub fn with_seed_margin(mut self, margin: u64) -> Self {
        self.seed_margin = margin;
        self
    }

    /// Capacity message with the limit filled in
    pub fn capacity_text(&self) -> String {
        let max = self
            .max_items
            .map(|m| m.to_string())
            .unwrap_or_else(|| "unlimited".to_string());
        self.capacity_message.replace("{max}", &max)
    }
}
