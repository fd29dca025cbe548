//! Symbol table manager.
//!
//! # Role
//!
//! Orchestrates the name heap, the sorted name index and the group's object header to give
//! a group its directory semantics: create, find, insert, remove and delete, plus ordered
//! iteration.
//!
//! # Lifecycle
//!
//! Creation walks `Uninit → HeapReady → IndexReady → Committed`. A failed step undoes every
//! earlier one (index first, then heap) so no partial table survives. Deletion walks
//! `Committed → IndexDestroyed → HeapDestroyed`; the index goes first because dropping its
//! records frees their names from the heap. Deletion does not roll back: a failure reports
//! the stage reached and the container needs outside repair.

use std::fmt;
use std::ops::ControlFlow;

use arbor_storage::{Addr, ByteOrder, Container, MessageFlags, NameOffset, StorageError};

use crate::config::GroupConfig;
use crate::entry::{Entry, EntryCache};
use crate::error::{GroupError, Result};
use crate::message::StabMessage;
use crate::{node, path};

/// Progress of a table creation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CreateStage {
	/// Nothing exists yet.
	Uninit,
	/// The heap exists and holds the empty string at offset 0.
	HeapReady,
	/// The empty index exists too.
	IndexReady,
	/// The descriptor is written; the table is live.
	Committed,
}

impl fmt::Display for CreateStage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Uninit => write!(f, "uninit"),
			Self::HeapReady => write!(f, "heap_ready"),
			Self::IndexReady => write!(f, "index_ready"),
			Self::Committed => write!(f, "committed"),
		}
	}
}

/// Progress of a table deletion.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeleteStage {
	/// Both structures still exist.
	Committed,
	/// The index and its records are gone; the heap remains.
	IndexDestroyed,
	/// Both structures are gone.
	HeapDestroyed,
}

impl fmt::Display for DeleteStage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Committed => write!(f, "committed"),
			Self::IndexDestroyed => write!(f, "index_destroyed"),
			Self::HeapDestroyed => write!(f, "heap_destroyed"),
		}
	}
}

#[derive(Copy, Clone, Debug)]
enum Creation {
	Uninit,
	HeapReady { heap: Addr },
	IndexReady { heap: Addr, index: Addr },
	Committed { header: Addr, stab: StabMessage },
}

impl Creation {
	fn stage(&self) -> CreateStage {
		match self {
			Self::Uninit => CreateStage::Uninit,
			Self::HeapReady { .. } => CreateStage::HeapReady,
			Self::IndexReady { .. } => CreateStage::IndexReady,
			Self::Committed { .. } => CreateStage::Committed,
		}
	}

	fn init_err(&self, source: StorageError) -> GroupError {
		GroupError::Init {
			stage: self.stage(),
			source,
		}
	}

	fn advance(self, file: &Container, size_hint: usize) -> Result<Creation> {
		match self {
			Self::Uninit => {
				let heap = file.heap_create(size_hint).map_err(|e| self.init_err(e))?;
				let fresh = Self::HeapReady { heap };
				let empty = match file.heap_insert(heap, b"") {
					Ok(off) => off,
					Err(e) => {
						fresh.rollback(file);
						return Err(self.init_err(e));
					}
				};
				// Index searches treat offset 0 as the minimum key.
				if empty != NameOffset::EMPTY {
					tracing::error!(%heap, offset = %empty, "empty name not at heap offset 0");
					fresh.rollback(file);
					return Err(GroupError::HeapCorrupt(empty));
				}
				Ok(fresh)
			}
			Self::HeapReady { heap } => {
				let index = file.index_create().map_err(|e| self.init_err(e))?;
				Ok(Self::IndexReady { heap, index })
			}
			Self::IndexReady { heap, index } => {
				let stab = StabMessage { heap, index };
				let header = file
					.header_create(StabMessage::header_size(file.config()))
					.map_err(|e| self.init_err(e))?;
				if let Err(e) = file.header_write(header, MessageFlags::CONSTANT, &stab) {
					if let Err(close) = file.header_close(header) {
						tracing::warn!(%header, error = %close, "failed to close header after write failure");
					}
					return Err(self.init_err(e));
				}
				Ok(Self::Committed { header, stab })
			}
			Self::Committed { .. } => Ok(self),
		}
	}

	/// Undoes everything this stage created.
	fn rollback(self, file: &Container) {
		let (heap, index) = match self {
			Self::Uninit | Self::Committed { .. } => return,
			Self::HeapReady { heap } => (heap, None),
			Self::IndexReady { heap, index } => (heap, Some(index)),
		};
		tracing::warn!(stage = %self.stage(), %heap, ?index, "rolling back symbol table creation");
		if let Some(index) = index
			&& let Err(e) = file.index_delete::<ByteOrder>(index, heap)
		{
			tracing::warn!(%index, error = %e, "rollback: index delete failed");
		}
		if let Err(e) = file.heap_delete(heap) {
			tracing::warn!(%heap, error = %e, "rollback: heap delete failed");
		}
	}
}

/// Creates an empty symbol table and the object header describing it.
///
/// `size_hint` is the initial heap size; it is raised to fit at least the empty string. The
/// returned entry has no cached paths and caches the table addresses.
pub fn create(file: &Container, size_hint: usize) -> Result<Entry> {
	let size_hint = size_hint.max(file.config().heap_free_overhead() + 2);

	let mut state = Creation::Uninit;
	let (header, stab) = loop {
		if let Creation::Committed { header, stab } = state {
			break (header, stab);
		}
		state = match state.advance(file, size_hint) {
			Ok(next) => next,
			Err(e) => {
				state.rollback(file);
				return Err(e);
			}
		};
	};

	tracing::debug!(%header, heap = %stab.heap, index = %stab.index, size_hint, "stab.create");
	Ok(Entry::new(file.clone(), header).with_cache(EntryCache::SymbolTable {
		heap: stab.heap,
		index: stab.index,
	}))
}

/// Creates a symbol table with the configured heap size.
pub fn create_with(file: &Container, config: &GroupConfig) -> Result<Entry> {
	create(file, config.heap_size_hint)
}

/// Looks `name` up in `grp`.
///
/// The returned entry's paths are `grp`'s paths extended by `name`, i.e. the route taken on
/// this call, not any earlier one.
pub fn find(grp: &Entry, name: &str) -> Result<Entry> {
	check_name(name)?;
	let stab = descriptor(grp)?;

	let (key, record) = node::open(grp.file(), &stab)
		.find(name)
		.map_err(|source| GroupError::Lookup {
			name: name.to_string(),
			source,
		})?
		.ok_or_else(|| GroupError::NotFound {
			name: name.to_string(),
		})?;

	let mut obj = Entry::from_record(grp.file().clone(), record, key);
	path::insert_name(grp, &mut obj, name)?;
	Ok(obj)
}

/// Returns true if `grp` has a child named `name`.
pub fn contains(grp: &Entry, name: &str) -> Result<bool> {
	check_name(name)?;
	let stab = descriptor(grp)?;
	let hit = node::open(grp.file(), &stab)
		.find(name)
		.map_err(|source| GroupError::Lookup {
			name: name.to_string(),
			source,
		})?;
	Ok(hit.is_some())
}

/// Links `obj` into `grp` under `name`.
///
/// `obj`'s cached paths are rebuilt before the index is touched and stay rebuilt even if
/// the insertion fails. On success `obj` carries the heap offset of its new name.
pub fn insert(grp: &Entry, name: &str, obj: &mut Entry) -> Result<()> {
	check_name(name)?;
	if !grp.file().same_storage(obj.file()) {
		return Err(GroupError::CrossContainerLink);
	}

	path::insert_name(grp, obj, name)?;

	let stab = descriptor(grp)?;
	let key = node::open(grp.file(), &stab)
		.insert(name, &obj.record())
		.map_err(|source| GroupError::CannotInsert {
			name: name.to_string(),
			source,
		})?;
	obj.set_name_offset(key);

	tracing::debug!(group = %grp.header(), name, target = %obj.header(), offset = %key, "stab.insert");
	Ok(())
}

/// Unlinks `name` from `grp`.
///
/// A missing name is [`GroupError::NotFound`], the same kind [`find`] reports.
pub fn remove(grp: &Entry, name: &str) -> Result<()> {
	check_name(name)?;
	let stab = descriptor(grp)?;

	node::open(grp.file(), &stab)
		.remove(name)
		.map_err(|source| match source {
			StorageError::KeyNotFound(_) => GroupError::NotFound {
				name: name.to_string(),
			},
			source => GroupError::CannotRemove {
				name: name.to_string(),
				source,
			},
		})?;

	tracing::debug!(group = %grp.header(), name, "stab.remove");
	Ok(())
}

/// Destroys the symbol table whose index and heap live at the given addresses.
///
/// Called once, when the owning group is destroyed. Not safe to retry after a failure.
pub fn delete(file: &Container, heap: Addr, index: Addr) -> Result<()> {
	debug_assert!(heap.is_defined() && index.is_defined());

	let mut stage = DeleteStage::Committed;
	loop {
		let step = match stage {
			DeleteStage::Committed => node::open(file, &StabMessage { heap, index })
				.delete()
				.map(|records| {
					tracing::trace!(%index, records, "stab.delete: index destroyed");
					DeleteStage::IndexDestroyed
				}),
			DeleteStage::IndexDestroyed => file.heap_delete(heap).map(|()| DeleteStage::HeapDestroyed),
			DeleteStage::HeapDestroyed => break,
		};
		stage = step.map_err(|source| {
			tracing::warn!(reached = %stage, %heap, %index, error = %source, "symbol table delete failed");
			GroupError::Delete {
				reached: stage,
				source,
			}
		})?;
	}

	tracing::debug!(%heap, %index, "stab.delete");
	Ok(())
}

/// Visits every child of `grp` in name order until `f` breaks.
///
/// Each entry handed to `f` carries paths derived from `grp`, as [`find`] would build them.
pub fn iterate<F>(grp: &Entry, mut f: F) -> Result<ControlFlow<()>>
where
	F: FnMut(&str, &Entry) -> ControlFlow<()>,
{
	let stab = descriptor(grp)?;
	let records = node::open(grp.file(), &stab)
		.entries()
		.map_err(GroupError::Iterate)?;

	for (name, key, record) in records {
		let mut obj = Entry::from_record(grp.file().clone(), record, key);
		path::insert_name(grp, &mut obj, &name)?;
		if f(&name, &obj).is_break() {
			return Ok(ControlFlow::Break(()));
		}
	}
	Ok(ControlFlow::Continue(()))
}

/// Number of children of `grp`.
pub fn count(grp: &Entry) -> Result<usize> {
	let stab = descriptor(grp)?;
	node::open(grp.file(), &stab)
		.len()
		.map_err(GroupError::Iterate)
}

/// Reads the symbol table descriptor from `grp`'s header.
pub fn descriptor(grp: &Entry) -> Result<StabMessage> {
	match grp.file().header_read::<StabMessage>(grp.header()) {
		Ok(Some(stab)) => Ok(stab),
		Ok(None) => Err(GroupError::NotASymbolTable {
			header: grp.header(),
			source: None,
		}),
		Err(e) => Err(GroupError::NotASymbolTable {
			header: grp.header(),
			source: Some(e),
		}),
	}
}

fn check_name(name: &str) -> Result<()> {
	if name.is_empty() || name.contains('\0') {
		return Err(GroupError::InvalidName(name.to_string()));
	}
	Ok(())
}
