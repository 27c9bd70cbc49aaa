//! Parser options.
//!
//! Options can be built in code or loaded from a TOML document:
//!
//! ```toml
//! allow_empty_phrase = true
//! trim_phrases = false
//! ```

use serde::{Deserialize, Serialize};

use crate::error::OptionsError;

/// Settings that adjust how a query is parsed and projected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParseOptions {
    /// Accept `''` (or quotes around only whitespace) as a phrase instead of failing with
    /// an empty-phrase error.
    pub allow_empty_phrase: bool,
    /// Trim whitespace just inside the quotes from phrase text. Spans are unaffected.
    pub trim_phrases: bool,
}

impl ParseOptions {
    /// Parses options from a TOML string. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, OptionsError> {
        toml::from_str(content).map_err(|source| OptionsError::ParseToml { source })
    }
}
