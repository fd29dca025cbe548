//! One-shot fault injection for partial-failure tests.

use crate::error::{Result, StorageError};

/// A collaborator call that can be made to fail once.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Fault {
	/// The next heap creation.
	HeapCreate,
	/// The next heap creation succeeds but leaves a name allocated at offset 0.
	HeapPrefill,
	/// The next name written into a heap.
	HeapInsert,
	/// The next index creation.
	IndexCreate,
	/// The next header message write.
	HeaderWrite,
	/// The next whole-index deletion.
	IndexDelete,
	/// The next heap deletion.
	HeapDelete,
}

impl Fault {
	fn label(self) -> &'static str {
		match self {
			Self::HeapCreate => "heap create",
			Self::HeapPrefill => "heap prefill",
			Self::HeapInsert => "heap insert",
			Self::IndexCreate => "index create",
			Self::HeaderWrite => "header write",
			Self::IndexDelete => "index delete",
			Self::HeapDelete => "heap delete",
		}
	}
}

/// Armed faults; each fires once.
#[derive(Debug, Default)]
pub(crate) struct Faults(Vec<Fault>);

impl Faults {
	#[cfg_attr(not(feature = "test-support"), allow(dead_code))]
	pub(crate) fn arm(&mut self, fault: Fault) {
		self.0.push(fault);
	}

	/// Disarms `point` and returns true if it was armed.
	pub(crate) fn take(&mut self, point: Fault) -> bool {
		let Some(idx) = self.0.iter().position(|&f| f == point) else {
			return false;
		};
		self.0.swap_remove(idx);
		tracing::debug!(fault = point.label(), "injected fault fired");
		true
	}

	/// Fails with [`StorageError::Injected`] if `point` was armed.
	pub(crate) fn trip(&mut self, point: Fault) -> Result<()> {
		if self.take(point) {
			return Err(StorageError::Injected(point.label()));
		}
		Ok(())
	}
}
