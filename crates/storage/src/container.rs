//! Container handle and collaborator entry points.
//!
//! # Role
//!
//! [`Container`] is the single owner of every heap, index and object header in one container.
//! Each entry point takes the state lock once, so a request that touches both an index and
//! its heap sees them consistently. The lock does not serialize sequences of calls; callers
//! that mutate one container from several threads must order their own work.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::addr::{Addr, NameOffset};
use crate::config::ContainerConfig;
use crate::error::{Result, StorageError};
use crate::fault::{Fault, Faults};
use crate::header::{HeaderMessage, MessageFlags, ObjectHeader, StoredMessage};
use crate::heap::LocalHeap;
use crate::index::{IndexOp, IndexReply, KeyOrder, SortedIndex};

/// Nominal on-disk footprint reserved for an index root node.
const INDEX_NODE_SIZE: usize = 544;

#[derive(Debug, Default)]
struct Space {
	next: u64,
	heaps: FxHashMap<Addr, LocalHeap>,
	indexes: FxHashMap<Addr, SortedIndex>,
	headers: FxHashMap<Addr, ObjectHeader>,
	faults: Faults,
}

impl Space {
	fn alloc(&mut self, size: usize) -> Addr {
		let addr = Addr(self.next);
		self.next += (size.max(1) as u64).next_multiple_of(8);
		addr
	}

	fn heap_mut(&mut self, addr: Addr) -> Result<&mut LocalHeap> {
		self.heaps.get_mut(&addr).ok_or(StorageError::NoSuchHeap(addr))
	}

	fn header(&self, addr: Addr) -> Result<&ObjectHeader> {
		let header = self.headers.get(&addr).ok_or(StorageError::NoSuchHeader(addr))?;
		if header.open_count == 0 {
			return Err(StorageError::HeaderClosed(addr));
		}
		Ok(header)
	}

	fn header_mut(&mut self, addr: Addr) -> Result<&mut ObjectHeader> {
		let header = self
			.headers
			.get_mut(&addr)
			.ok_or(StorageError::NoSuchHeader(addr))?;
		if header.open_count == 0 {
			return Err(StorageError::HeaderClosed(addr));
		}
		Ok(header)
	}
}

struct Shared {
	config: ContainerConfig,
	space: Mutex<Space>,
}

/// Cheap-clone handle to one container's storage.
///
/// Clones refer to the same container; [`Container::same_storage`] is the identity test
/// higher layers use to reject links across containers.
#[derive(Clone)]
pub struct Container {
	shared: Arc<Shared>,
}

impl std::fmt::Debug for Container {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Container")
			.field("id", &Arc::as_ptr(&self.shared))
			.field("config", &self.shared.config)
			.finish()
	}
}

impl Default for Container {
	fn default() -> Self {
		Self::with_valid(ContainerConfig::default())
	}
}

impl Container {
	/// Creates an empty container, rejecting layouts that fail [`ContainerConfig::validate`].
	pub fn new(config: ContainerConfig) -> Result<Self> {
		config.validate()?;
		Ok(Self::with_valid(config))
	}

	fn with_valid(config: ContainerConfig) -> Self {
		Self {
			shared: Arc::new(Shared {
				config,
				space: Mutex::new(Space::default()),
			}),
		}
	}

	/// Layout configuration.
	pub fn config(&self) -> &ContainerConfig {
		&self.shared.config
	}

	/// Returns true if both handles refer to the same container.
	pub fn same_storage(&self, other: &Container) -> bool {
		Arc::ptr_eq(&self.shared, &other.shared)
	}

	/// Arms a one-shot fault.
	#[cfg(feature = "test-support")]
	pub fn inject_fault(&self, fault: Fault) {
		self.shared.space.lock().faults.arm(fault);
	}

	/// Creates a local heap with at least `size_hint` bytes of initial free space.
	pub fn heap_create(&self, size_hint: usize) -> Result<Addr> {
		let mut space = self.shared.space.lock();
		space.faults.trip(Fault::HeapCreate)?;
		let mut heap = LocalHeap::new(size_hint, &self.shared.config);
		if space.faults.take(Fault::HeapPrefill) {
			heap.insert(b"?");
		}
		let addr = space.alloc(heap.len());
		space.heaps.insert(addr, heap);
		tracing::trace!(%addr, size_hint, "heap.create");
		Ok(addr)
	}

	/// Stores `name` in the heap at `addr`.
	pub fn heap_insert(&self, addr: Addr, name: &[u8]) -> Result<NameOffset> {
		let mut space = self.shared.space.lock();
		space.faults.trip(Fault::HeapInsert)?;
		let offset = space.heap_mut(addr)?.insert(name);
		tracing::trace!(%addr, %offset, len = name.len(), "heap.insert");
		Ok(offset)
	}

	/// Reads the name stored at `offset`.
	pub fn heap_name(&self, addr: Addr, offset: NameOffset) -> Result<String> {
		let space = self.shared.space.lock();
		let heap = space.heaps.get(&addr).ok_or(StorageError::NoSuchHeap(addr))?;
		let raw = heap.get(offset).ok_or(StorageError::BadOffset { heap: addr, offset })?;
		String::from_utf8(raw.to_vec()).map_err(|_| StorageError::BadName { heap: addr, offset })
	}

	/// Frees `len` bytes at `offset`.
	pub fn heap_remove(&self, addr: Addr, offset: NameOffset, len: usize) -> Result<()> {
		let mut space = self.shared.space.lock();
		if !space.heap_mut(addr)?.remove(offset, len) {
			return Err(StorageError::BadOffset { heap: addr, offset });
		}
		tracing::trace!(%addr, %offset, len, "heap.remove");
		Ok(())
	}

	/// Destroys the heap at `addr`.
	pub fn heap_delete(&self, addr: Addr) -> Result<()> {
		let mut space = self.shared.space.lock();
		space.faults.trip(Fault::HeapDelete)?;
		space.heaps.remove(&addr).ok_or(StorageError::NoSuchHeap(addr))?;
		tracing::trace!(%addr, "heap.delete");
		Ok(())
	}

	/// Returns true if a heap lives at `addr`.
	pub fn heap_exists(&self, addr: Addr) -> bool {
		self.shared.space.lock().heaps.contains_key(&addr)
	}

	/// Creates an empty sorted index.
	pub fn index_create(&self) -> Result<Addr> {
		let mut space = self.shared.space.lock();
		space.faults.trip(Fault::IndexCreate)?;
		let addr = space.alloc(INDEX_NODE_SIZE);
		space.indexes.insert(addr, SortedIndex::default());
		tracing::trace!(%addr, "index.create");
		Ok(addr)
	}

	/// Runs one request against the index at `index`, resolving names through `heap`.
	pub fn index_exec<O: KeyOrder>(
		&self,
		index: Addr,
		heap: Addr,
		op: IndexOp<'_>,
	) -> Result<IndexReply> {
		let mut guard = self.shared.space.lock();
		let space = &mut *guard;
		let tree = space
			.indexes
			.get_mut(&index)
			.ok_or(StorageError::NoSuchIndex(index))?;
		let names = space.heaps.get_mut(&heap).ok_or(StorageError::NoSuchHeap(heap))?;
		tracing::trace!(%index, %heap, ?op, "index.exec");
		tree.exec::<O>(heap, names, op)
	}

	/// Visits every record of an index in key order.
	pub fn index_for_each<F>(&self, index: Addr, heap: Addr, f: F) -> Result<()>
	where
		F: FnMut(&str, NameOffset, &[u8]) -> Result<()>,
	{
		let space = self.shared.space.lock();
		let tree = space.indexes.get(&index).ok_or(StorageError::NoSuchIndex(index))?;
		let names = space.heaps.get(&heap).ok_or(StorageError::NoSuchHeap(heap))?;
		tree.for_each(heap, names, f)
	}

	/// Number of records in the index at `index`.
	pub fn index_len(&self, index: Addr) -> Result<usize> {
		let space = self.shared.space.lock();
		let tree = space.indexes.get(&index).ok_or(StorageError::NoSuchIndex(index))?;
		Ok(tree.len())
	}

	/// Removes every record, freeing each name from `heap`, then destroys the index.
	///
	/// Returns the number of records removed. The heap must still exist.
	pub fn index_delete<O: KeyOrder>(&self, index: Addr, heap: Addr) -> Result<usize> {
		let mut guard = self.shared.space.lock();
		let space = &mut *guard;
		space.faults.trip(Fault::IndexDelete)?;
		let tree = space
			.indexes
			.get_mut(&index)
			.ok_or(StorageError::NoSuchIndex(index))?;
		let names = space.heaps.get_mut(&heap).ok_or(StorageError::NoSuchHeap(heap))?;
		let count = match tree.exec::<O>(heap, names, IndexOp::Remove { name: None })? {
			IndexReply::Removed { count } => count,
			reply => unreachable!("wildcard remove answered with {reply:?}"),
		};
		space.indexes.remove(&index);
		tracing::trace!(%index, %heap, count, "index.delete");
		Ok(count)
	}

	/// Returns true if an index lives at `addr`.
	pub fn index_exists(&self, addr: Addr) -> bool {
		self.shared.space.lock().indexes.contains_key(&addr)
	}

	/// Creates an object header with room for `size_hint` bytes of messages, opened once.
	pub fn header_create(&self, size_hint: usize) -> Result<Addr> {
		let mut space = self.shared.space.lock();
		let addr = space.alloc(size_hint);
		space.headers.insert(addr, ObjectHeader::new(size_hint));
		tracing::trace!(%addr, size_hint, "header.create");
		Ok(addr)
	}

	/// Opens another handle on the header at `addr`.
	pub fn header_open(&self, addr: Addr) -> Result<()> {
		let mut space = self.shared.space.lock();
		let header = space
			.headers
			.get_mut(&addr)
			.ok_or(StorageError::NoSuchHeader(addr))?;
		header.open_count += 1;
		Ok(())
	}

	/// Closes one handle on the header at `addr`.
	pub fn header_close(&self, addr: Addr) -> Result<()> {
		let mut space = self.shared.space.lock();
		let header = space.header_mut(addr)?;
		header.open_count -= 1;
		tracing::trace!(%addr, open = header.open_count, "header.close");
		Ok(())
	}

	/// Number of open handles on the header at `addr`.
	pub fn header_open_count(&self, addr: Addr) -> Result<usize> {
		let space = self.shared.space.lock();
		let header = space.headers.get(&addr).ok_or(StorageError::NoSuchHeader(addr))?;
		Ok(header.open_count())
	}

	/// Reads the first message of type `M`; `Ok(None)` if the header has none.
	pub fn header_read<M: HeaderMessage>(&self, addr: Addr) -> Result<Option<M>> {
		let space = self.shared.space.lock();
		let Some(msg) = space.header(addr)?.first(M::TYPE) else {
			return Ok(None);
		};
		Ok(Some(postcard::from_bytes(&msg.payload)?))
	}

	/// Writes `message`, replacing an existing message of the same type.
	///
	/// A message stored with [`MessageFlags::CONSTANT`] cannot be replaced.
	pub fn header_write<M: HeaderMessage>(
		&self,
		addr: Addr,
		flags: MessageFlags,
		message: &M,
	) -> Result<()> {
		let payload = postcard::to_stdvec(message)?;
		let mut space = self.shared.space.lock();
		space.faults.trip(Fault::HeaderWrite)?;
		let header = space.header_mut(addr)?;
		match header.position(M::TYPE) {
			Some(idx) if header.messages[idx].flags.contains(MessageFlags::CONSTANT) => {
				return Err(StorageError::ConstantMessage {
					header: addr,
					kind: M::TYPE,
				});
			}
			Some(idx) => {
				let existing = &mut header.messages[idx];
				existing.flags = flags;
				existing.payload = payload;
			}
			None => header.messages.push(StoredMessage {
				kind: M::TYPE,
				flags,
				payload,
			}),
		}
		tracing::trace!(%addr, kind = %M::TYPE, ?flags, "header.write");
		Ok(())
	}

	/// Runs `f` against the header at `addr`.
	pub fn with_header<T>(&self, addr: Addr, f: impl FnOnce(&ObjectHeader) -> T) -> Result<T> {
		let space = self.shared.space.lock();
		Ok(f(space.header(addr)?))
	}

	/// Runs `f` against the heap at `addr`.
	pub fn with_heap<T>(&self, addr: Addr, f: impl FnOnce(&LocalHeap) -> T) -> Result<T> {
		let space = self.shared.space.lock();
		let heap = space.heaps.get(&addr).ok_or(StorageError::NoSuchHeap(addr))?;
		Ok(f(heap))
	}
}
