//! Local name heaps.
//!
//! # Role
//!
//! A local heap stores the NUL-terminated names referenced by index records. Allocation is
//! first-fit over an offset-ordered free list; blocks are aligned to the configured heap
//! alignment and freed neighbours coalesce.
//!
//! # Invariants
//!
//! - The free list is sorted by offset and no two blocks touch.
//! - Splitting a free block never leaves a remainder smaller than
//!   [`crate::ContainerConfig::heap_free_overhead`]; such a remainder is handed out with the
//!   allocation instead.

use crate::addr::NameOffset;
use crate::config::ContainerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FreeBlock {
	offset: usize,
	size: usize,
}

impl FreeBlock {
	fn end(&self) -> usize {
		self.offset + self.size
	}
}

/// Byte store of NUL-terminated names.
#[derive(Debug, Clone)]
pub struct LocalHeap {
	data: Vec<u8>,
	free: Vec<FreeBlock>,
	align: usize,
	free_overhead: usize,
}

#[inline]
fn align_up(n: usize, align: usize) -> usize {
	(n + align - 1) & !(align - 1)
}

impl LocalHeap {
	/// Creates a heap whose whole initial extent is one free block.
	///
	/// `config` must have passed [`ContainerConfig::validate`].
	pub(crate) fn new(size_hint: usize, config: &ContainerConfig) -> Self {
		let free_overhead = config.heap_free_overhead();
		let size = align_up(size_hint.max(free_overhead), config.heap_align);
		Self {
			data: vec![0; size],
			free: vec![FreeBlock { offset: 0, size }],
			align: config.heap_align,
			free_overhead,
		}
	}

	/// Current extent of the heap in bytes.
	pub fn len(&self) -> usize {
		self.data.len()
	}

	/// Returns true when nothing is allocated.
	pub fn is_empty(&self) -> bool {
		self.free_space() == self.data.len()
	}

	/// Total bytes on the free list.
	pub fn free_space(&self) -> usize {
		self.free.iter().map(|b| b.size).sum()
	}

	/// Stores `name` followed by a NUL and returns its offset.
	pub fn insert(&mut self, name: &[u8]) -> NameOffset {
		let need = align_up(name.len() + 1, self.align);
		let offset = match self.take_free(need) {
			Some(offset) => offset,
			None => {
				self.grow(need);
				self.take_free(need)
					.unwrap_or_else(|| unreachable!("heap grown by {need} bytes cannot fit {need}"))
			}
		};

		self.data[offset..offset + name.len()].copy_from_slice(name);
		self.data[offset + name.len()..offset + need].fill(0);
		NameOffset(offset)
	}

	/// Returns the name stored at `offset`, without its terminator.
	pub fn get(&self, offset: NameOffset) -> Option<&[u8]> {
		let tail = self.data.get(offset.0..)?;
		if self.free.iter().any(|b| b.offset <= offset.0 && offset.0 < b.end()) {
			return None;
		}
		let nul = tail.iter().position(|&b| b == 0)?;
		Some(&tail[..nul])
	}

	/// Returns `len` bytes starting at `offset` to the free list.
	///
	/// Returns false if the range is out of bounds or overlaps free space.
	pub fn remove(&mut self, offset: NameOffset, len: usize) -> bool {
		let size = align_up(len, self.align);
		let block = FreeBlock {
			offset: offset.0,
			size,
		};
		let overlaps = self
			.free
			.iter()
			.any(|b| b.offset < block.end() && block.offset < b.end());
		if size == 0 || block.end() > self.data.len() || overlaps {
			return false;
		}

		let at = self.free.partition_point(|b| b.offset < block.offset);
		self.free.insert(at, block);
		self.coalesce(at);
		true
	}

	fn take_free(&mut self, need: usize) -> Option<usize> {
		let idx = self.free.iter().position(|b| b.size >= need)?;
		let block = &mut self.free[idx];
		let offset = block.offset;
		if block.size - need >= self.free_overhead {
			block.offset += need;
			block.size -= need;
		} else {
			self.free.remove(idx);
		}
		Some(offset)
	}

	fn grow(&mut self, need: usize) {
		let old = self.data.len();
		let new = align_up((old * 2).max(old + need), self.align);
		self.data.resize(new, 0);

		let at = self.free.len();
		self.free.push(FreeBlock {
			offset: old,
			size: new - old,
		});
		self.coalesce(at);
	}

	/// Merges the block at `idx` with touching neighbours.
	fn coalesce(&mut self, mut idx: usize) {
		if idx + 1 < self.free.len() && self.free[idx].end() == self.free[idx + 1].offset {
			self.free[idx].size += self.free[idx + 1].size;
			self.free.remove(idx + 1);
		}
		if idx > 0 && self.free[idx - 1].end() == self.free[idx].offset {
			self.free[idx - 1].size += self.free[idx].size;
			self.free.remove(idx);
			idx -= 1;
		}
		debug_assert!(
			self.free.windows(2).all(|w| w[0].end() < w[1].offset),
			"free list unsorted or touching after coalescing block {idx}"
		);
	}
}

#[cfg(test)]
mod tests;
