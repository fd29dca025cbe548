//! Sorted name indexes.
//!
//! # Role
//!
//! An index keeps records ordered by the name each one points at in a [`LocalHeap`]. Records
//! are opaque payloads here; [`Index`] layers a typed record over them. Every operation is one
//! variant of [`IndexOp`], so find, insert and remove share a single dispatch path instead of
//! threading an operation code through mutable state.
//!
//! # Invariants
//!
//! - Slots are strictly increasing under the [`KeyOrder`] used to build them; callers must use
//!   the same ordering for every request against one index.
//! - The index owns the heap bytes of every key it holds: inserting writes the name, removing
//!   frees it.

use std::cmp::Ordering;
use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::addr::{Addr, NameOffset};
use crate::container::Container;
use crate::error::{Result, StorageError};
use crate::heap::LocalHeap;

/// Ordering of stored names against probe names.
pub trait KeyOrder {
	/// Compares a stored name with a probe, both without terminators.
	fn compare(stored: &[u8], probe: &[u8]) -> Ordering;
}

/// Plain byte-wise ordering, the same order `strcmp` gives NUL-terminated names.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteOrder;

impl KeyOrder for ByteOrder {
	#[inline]
	fn compare(stored: &[u8], probe: &[u8]) -> Ordering {
		stored.cmp(probe)
	}
}

/// One request against a sorted index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOp<'a> {
	/// Look up the record stored under `name`.
	Find { name: &'a str },
	/// Store `payload` under `name`; the name is written into the heap.
	Insert { name: &'a str, payload: Vec<u8> },
	/// Remove the record under `name`, or every record when `name` is `None`.
	Remove { name: Option<&'a str> },
}

/// Successful outcome of an [`IndexOp`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexReply {
	/// The record matching a find.
	Found { key: NameOffset, payload: Vec<u8> },
	/// Heap offset the inserted name was written to.
	Inserted { key: NameOffset },
	/// Number of records removed.
	Removed { count: usize },
}

#[derive(Debug, Clone)]
struct Slot {
	key: NameOffset,
	payload: Vec<u8>,
}

/// Ordered sequence of `(name offset, payload)` records.
#[derive(Debug, Clone, Default)]
pub struct SortedIndex {
	slots: Vec<Slot>,
}

impl SortedIndex {
	/// Number of records.
	pub fn len(&self) -> usize {
		self.slots.len()
	}

	/// Returns true if the index holds no records.
	pub fn is_empty(&self) -> bool {
		self.slots.is_empty()
	}

	/// Executes one request, dereferencing names through `heap`.
	pub fn exec<O: KeyOrder>(
		&mut self,
		heap_addr: Addr,
		heap: &mut LocalHeap,
		op: IndexOp<'_>,
	) -> Result<IndexReply> {
		match op {
			IndexOp::Find { name } => {
				let idx = self
					.search::<O>(heap_addr, heap, name.as_bytes())?
					.map_err(|_| StorageError::KeyNotFound(name.to_string()))?;
				let slot = &self.slots[idx];
				Ok(IndexReply::Found {
					key: slot.key,
					payload: slot.payload.clone(),
				})
			}
			IndexOp::Insert { name, payload } => {
				let at = match self.search::<O>(heap_addr, heap, name.as_bytes())? {
					Ok(_) => return Err(StorageError::DuplicateKey(name.to_string())),
					Err(at) => at,
				};
				let key = heap.insert(name.as_bytes());
				self.slots.insert(at, Slot { key, payload });
				Ok(IndexReply::Inserted { key })
			}
			IndexOp::Remove { name: Some(name) } => {
				let idx = self
					.search::<O>(heap_addr, heap, name.as_bytes())?
					.map_err(|_| StorageError::KeyNotFound(name.to_string()))?;
				free_name(heap_addr, heap, self.slots[idx].key, name.len())?;
				self.slots.remove(idx);
				Ok(IndexReply::Removed { count: 1 })
			}
			IndexOp::Remove { name: None } => {
				let count = self.slots.len();
				for slot in std::mem::take(&mut self.slots) {
					let len = stored_name(heap_addr, heap, slot.key)?.len();
					free_name(heap_addr, heap, slot.key, len)?;
				}
				Ok(IndexReply::Removed { count })
			}
		}
	}

	/// Visits records in key order with their decoded names.
	pub fn for_each<F>(&self, heap_addr: Addr, heap: &LocalHeap, mut f: F) -> Result<()>
	where
		F: FnMut(&str, NameOffset, &[u8]) -> Result<()>,
	{
		for slot in &self.slots {
			let raw = stored_name(heap_addr, heap, slot.key)?;
			let name = std::str::from_utf8(raw).map_err(|_| StorageError::BadName {
				heap: heap_addr,
				offset: slot.key,
			})?;
			f(name, slot.key, &slot.payload)?;
		}
		Ok(())
	}

	/// Binary search; `Ok(idx)` on a hit, `Err(insertion point)` on a miss.
	fn search<O: KeyOrder>(
		&self,
		heap_addr: Addr,
		heap: &LocalHeap,
		probe: &[u8],
	) -> Result<std::result::Result<usize, usize>> {
		let (mut lo, mut hi) = (0, self.slots.len());
		while lo < hi {
			let mid = lo + (hi - lo) / 2;
			let stored = stored_name(heap_addr, heap, self.slots[mid].key)?;
			match O::compare(stored, probe) {
				Ordering::Less => lo = mid + 1,
				Ordering::Greater => hi = mid,
				Ordering::Equal => return Ok(Ok(mid)),
			}
		}
		Ok(Err(lo))
	}
}

fn stored_name(heap_addr: Addr, heap: &LocalHeap, key: NameOffset) -> Result<&[u8]> {
	heap.get(key).ok_or(StorageError::BadOffset {
		heap: heap_addr,
		offset: key,
	})
}

fn free_name(heap_addr: Addr, heap: &mut LocalHeap, key: NameOffset, len: usize) -> Result<()> {
	if heap.remove(key, len + 1) {
		Ok(())
	} else {
		Err(StorageError::BadOffset {
			heap: heap_addr,
			offset: key,
		})
	}
}

/// Typed view over one sorted index and the heap holding its names.
///
/// Records are encoded with postcard; `O` picks the key ordering.
pub struct Index<'c, R, O = ByteOrder> {
	container: &'c Container,
	addr: Addr,
	heap: Addr,
	_marker: PhantomData<fn() -> (R, O)>,
}

impl<'c, R, O> Index<'c, R, O>
where
	R: Serialize + DeserializeOwned,
	O: KeyOrder,
{
	/// Binds the index at `addr` to the heap at `heap`.
	pub fn new(container: &'c Container, addr: Addr, heap: Addr) -> Self {
		Self {
			container,
			addr,
			heap,
			_marker: PhantomData,
		}
	}

	/// Looks up `name`; `Ok(None)` when absent.
	pub fn find(&self, name: &str) -> Result<Option<(NameOffset, R)>> {
		match self.exec(IndexOp::Find { name }) {
			Ok(IndexReply::Found { key, payload }) => Ok(Some((key, postcard::from_bytes(&payload)?))),
			Ok(reply) => unreachable!("find answered with {reply:?}"),
			Err(StorageError::KeyNotFound(_)) => Ok(None),
			Err(e) => Err(e),
		}
	}

	/// Inserts `record` under `name` and returns where the name was written.
	pub fn insert(&self, name: &str, record: &R) -> Result<NameOffset> {
		let payload = postcard::to_stdvec(record)?;
		match self.exec(IndexOp::Insert { name, payload })? {
			IndexReply::Inserted { key } => Ok(key),
			reply => unreachable!("insert answered with {reply:?}"),
		}
	}

	/// Removes the record under `name`.
	pub fn remove(&self, name: &str) -> Result<()> {
		match self.exec(IndexOp::Remove { name: Some(name) })? {
			IndexReply::Removed { .. } => Ok(()),
			reply => unreachable!("remove answered with {reply:?}"),
		}
	}

	/// Number of records.
	pub fn len(&self) -> Result<usize> {
		self.container.index_len(self.addr)
	}

	/// Returns true if the index holds no records.
	pub fn is_empty(&self) -> Result<bool> {
		Ok(self.len()? == 0)
	}

	/// Decodes every record in key order.
	pub fn entries(&self) -> Result<Vec<(String, NameOffset, R)>> {
		let mut out = Vec::new();
		self.container
			.index_for_each(self.addr, self.heap, |name, key, payload| {
				out.push((name.to_string(), key, postcard::from_bytes(payload)?));
				Ok(())
			})?;
		Ok(out)
	}

	/// Deletes every record, freeing their names, then the index itself.
	pub fn delete(self) -> Result<usize> {
		self.container.index_delete::<O>(self.addr, self.heap)
	}

	fn exec(&self, op: IndexOp<'_>) -> Result<IndexReply> {
		self.container.index_exec::<O>(self.addr, self.heap, op)
	}
}

#[cfg(test)]
mod tests;
