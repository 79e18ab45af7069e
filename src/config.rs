//! Compiler configuration.
//!
//! Defaults come from the host; everything can be overridden through the
//! builder methods or a TOML file (`--config`). All fields are optional in
//! TOML and unknown keys are rejected.
//!
//! ```toml
//! underscore_prefix = false
//! keep_asm = true
//! cc = "gcc"
//! ```

use crate::error::CompileError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    /// Prepend `_` to global symbol names (the Mach-O convention)
    pub underscore_prefix: bool,
    /// Keep the intermediate `.s` file next to the output executable
    pub keep_asm: bool,
    /// C toolchain driver used for preprocessing and assembling/linking
    pub cc: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            underscore_prefix: cfg!(target_os = "macos"),
            keep_asm: false,
            cc: "cc".to_string(),
        }
    }
}

impl CompilerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_underscore_prefix(mut self, underscore_prefix: bool) -> Self {
        self.underscore_prefix = underscore_prefix;
        self
    }

    pub fn with_keep_asm(mut self, keep_asm: bool) -> Self {
        self.keep_asm = keep_asm;
        self
    }

    pub fn with_cc(mut self, cc: impl Into<String>) -> Self {
        self.cc = cc.into();
        self
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml(toml_str: &str) -> Result<Self, CompileError> {
        toml::from_str(toml_str)
            .map_err(|e| CompileError::config(format!("failed to parse compiler config: {}", e)))
    }

    /// Load a configuration file.
    pub fn from_toml_file(path: &Path) -> Result<Self, CompileError> {
        let content = fs::read_to_string(path).map_err(|e| {
            CompileError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }
}
