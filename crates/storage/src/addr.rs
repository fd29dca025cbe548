use std::fmt;

use serde::{Deserialize, Serialize};

/// Address of a persisted structure inside one container.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Addr(pub u64);

impl Addr {
	/// The undefined address; never handed out by the allocator.
	pub const UNDEF: Addr = Addr(u64::MAX);

	/// Returns true unless this is [`Addr::UNDEF`].
	#[inline]
	pub fn is_defined(self) -> bool {
		self != Self::UNDEF
	}
}

impl Default for Addr {
	fn default() -> Self {
		Self::UNDEF
	}
}

impl fmt::Display for Addr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.is_defined() {
			write!(f, "{:#x}", self.0)
		} else {
			f.write_str("UNDEF")
		}
	}
}

/// Byte offset of a NUL-terminated name inside a [`crate::LocalHeap`].
#[derive(
	Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct NameOffset(pub usize);

impl NameOffset {
	/// Offset of the empty string every symbol table heap starts with.
	pub const EMPTY: NameOffset = NameOffset(0);
}

impl fmt::Display for NameOffset {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}
