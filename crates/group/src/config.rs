use serde::{Deserialize, Serialize};

use crate::error::{GroupError, Result};

/// Defaults applied when creating groups.
///
/// ```toml
/// heap_size_hint = 512
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GroupConfig {
	/// Initial free space requested for a new name heap, in bytes.
	pub heap_size_hint: usize,
}

impl Default for GroupConfig {
	fn default() -> Self {
		Self { heap_size_hint: 256 }
	}
}

impl GroupConfig {
	/// Parses and validates a TOML document.
	pub fn from_toml(src: &str) -> Result<Self> {
		let config: Self = toml::from_str(src).map_err(|e| GroupError::Config(e.to_string()))?;
		if config.heap_size_hint == 0 {
			return Err(GroupError::Config("heap_size_hint must be positive".into()));
		}
		Ok(config)
	}
}
