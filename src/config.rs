//! Server configuration module.
//!
//! Handles loading and validating `adaptive-images.toml`. The configuration
//! is one explicit immutable struct handed to each component at construction
//! — there is no ambient/global state.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! source_root = "images"            # Read-only source image tree
//! cache_root = "ai-cache"           # Read-write variant cache
//! breakpoints = [1382, 992, 768, 480]
//! jpeg_quality = 80                 # 0-100, JPEG variants only
//! watch_cache = true                # mtime freshness check on every hit
//! mobile_first = true
//! default_raw = true                # serve original above the largest tier
//! cookie_name = "resolution"
//! browser_cache_seconds = 604800    # 7 days
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::breakpoints::BreakpointSet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Core configuration loaded from `adaptive-images.toml`.
///
/// All fields have defaults matching the stock config; user files need only
/// specify the values they want to override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Root of the source image tree. Read-only from the core's perspective.
    pub source_root: String,
    /// Root of the variant cache, laid out as `{cache_root}/{resolution}/...`.
    pub cache_root: String,
    /// Breakpoint widths in pixels. Order does not matter.
    pub breakpoints: Vec<u32>,
    /// Encoding quality for JPEG variants (0-100).
    pub jpeg_quality: u8,
    /// Compare cached mtimes against the source on every request. When off,
    /// an existing cache file is trusted unconditionally.
    pub watch_cache: bool,
    /// With no stored preference: inferred mobile clients get the smallest
    /// tier (true), or everyone gets the largest (false).
    pub mobile_first: bool,
    /// Serve the untouched source when the client is wider than the largest
    /// tier. When false, clamp to the largest tier instead.
    pub default_raw: bool,
    /// Cookie the transport layer stores the width preference under. The
    /// core only reports it back; it never touches cookies itself.
    pub cookie_name: String,
    /// Cache-control duration handed to the transport layer, in seconds.
    pub browser_cache_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            source_root: "images".to_string(),
            cache_root: "ai-cache".to_string(),
            breakpoints: vec![1382, 992, 768, 480],
            jpeg_quality: 80,
            watch_cache: true,
            mobile_first: true,
            default_raw: true,
            cookie_name: "resolution".to_string(),
            browser_cache_seconds: 60 * 60 * 24 * 7,
        }
    }
}

impl ServerConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.breakpoints.is_empty() {
            return Err(ConfigError::Validation(
                "breakpoints must not be empty".into(),
            ));
        }
        if self.breakpoints.contains(&0) {
            return Err(ConfigError::Validation(
                "breakpoints must all be positive".into(),
            ));
        }
        if self.jpeg_quality > 100 {
            return Err(ConfigError::Validation("jpeg_quality must be 0-100".into()));
        }
        if self.source_root.is_empty() {
            return Err(ConfigError::Validation(
                "source_root must not be empty".into(),
            ));
        }
        if self.cache_root.is_empty() {
            return Err(ConfigError::Validation(
                "cache_root must not be empty".into(),
            ));
        }
        if self.cookie_name.is_empty() {
            return Err(ConfigError::Validation(
                "cookie_name must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// The validated, ascending-sorted breakpoint set.
    pub fn breakpoint_set(&self) -> Result<BreakpointSet, ConfigError> {
        BreakpointSet::new(self.breakpoints.clone())
            .map_err(|e| ConfigError::Validation(e.to_string()))
    }
}

/// Stock config file with every option documented. Printed by `gen-config`.
pub fn stock_config_toml() -> &'static str {
    r#"# adaptive-images configuration
# All options are optional - defaults shown below.

# Read-only tree of source images. Requested paths resolve under this root.
source_root = "images"

# Read-write cache of resized variants, laid out as
# {cache_root}/{resolution}/{mirrored source path}.
cache_root = "ai-cache"

# Breakpoint widths in pixels. Order does not matter; a request always
# selects the smallest tier at or above the client width.
breakpoints = [1382, 992, 768, 480]

# JPEG encoding quality (0-100). PNG and GIF sources keep their own format.
jpeg_quality = 80

# Compare each cached variant's mtime against its source on every request,
# regenerating when the source is newer. Disable to trust existing cache
# files unconditionally.
watch_cache = true

# When no width preference is stored: give inferred mobile clients the
# smallest breakpoint (true), or the largest breakpoint to everyone (false).
mobile_first = true

# Serve the untouched source image when the client is wider than the
# largest breakpoint. When false, clamp to the largest breakpoint instead.
default_raw = true

# Cookie name the transport layer stores the client width preference under.
cookie_name = "resolution"

# Cache-control duration handed back to the transport layer, in seconds.
browser_cache_seconds = 604800
"#
}
