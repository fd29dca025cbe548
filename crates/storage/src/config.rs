//! Container layout configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StorageError};

/// Sizes that shape how structures are laid out inside a container.
///
/// Loaded from TOML, with every field optional:
///
/// ```toml
/// sizeof_addr = 8
/// sizeof_size = 8
/// heap_align = 8
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContainerConfig {
	/// Width of an encoded address in bytes.
	pub sizeof_addr: u8,
	/// Width of an encoded length in bytes.
	pub sizeof_size: u8,
	/// Alignment of heap allocations and free blocks.
	pub heap_align: usize,
}

impl Default for ContainerConfig {
	fn default() -> Self {
		Self {
			sizeof_addr: 8,
			sizeof_size: 8,
			heap_align: 8,
		}
	}
}

impl ContainerConfig {
	/// Parses and validates a TOML document.
	pub fn from_toml(src: &str) -> Result<Self> {
		let config: Self = toml::from_str(src).map_err(|e| StorageError::Config(e.to_string()))?;
		config.validate()?;
		Ok(config)
	}

	/// Checks field ranges.
	pub fn validate(&self) -> Result<()> {
		for (field, width) in [("sizeof_addr", self.sizeof_addr), ("sizeof_size", self.sizeof_size)] {
			if !matches!(width, 2 | 4 | 8) {
				return Err(StorageError::Config(format!(
					"{field} must be 2, 4 or 8 (got {width})"
				)));
			}
		}
		if !self.heap_align.is_power_of_two() {
			return Err(StorageError::Config(format!(
				"heap_align must be a power of two (got {})",
				self.heap_align
			)));
		}
		Ok(())
	}

	/// Bytes a heap free block needs for its bookkeeping: a next-link and a size.
	#[inline]
	pub fn heap_free_overhead(&self) -> usize {
		2 * self.sizeof_size as usize
	}
}
