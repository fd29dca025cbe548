//! In-memory entry handles.

use arbor_storage::{Addr, Container, NameOffset, SharedStr};
use serde::{Deserialize, Serialize};

use crate::node::SymbolRecord;

/// What an entry already knows about its object without reading the header.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryCache {
	/// Nothing cached.
	#[default]
	Nothing,
	/// The object is a group; its symbol table lives at these addresses.
	SymbolTable {
		/// Name heap address.
		heap: Addr,
		/// Index address.
		index: Addr,
	},
}

/// How much of an entry [`Entry::copy`] carries over.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CopyDepth {
	/// Identity only; cached paths are left empty.
	Shallow,
	/// Identity plus shared references to the cached paths.
	Deep,
}

/// Live reference to one object in a container.
///
/// The header address is the identity. The user path (how the caller got here) and the
/// canonical path (where the object physically sits) are caches: they may be absent, and two
/// entries for one object may carry different user paths. Cloning is a deep copy that shares
/// the path cells.
#[derive(Debug, Clone)]
pub struct Entry {
	file: Container,
	header: Addr,
	cache: EntryCache,
	name_off: NameOffset,
	user_path: Option<SharedStr>,
	canon_path: Option<SharedStr>,
	user_path_hidden: bool,
}

impl Entry {
	/// Creates an entry for the object whose header lives at `header`, with no cached paths.
	pub fn new(file: Container, header: Addr) -> Self {
		Self {
			file,
			header,
			cache: EntryCache::Nothing,
			name_off: NameOffset::EMPTY,
			user_path: None,
			canon_path: None,
			user_path_hidden: false,
		}
	}

	/// Sets both cached paths, replacing and releasing any previous ones.
	pub fn with_paths(mut self, user: &str, canon: &str) -> Self {
		self.set_paths(
			Some(SharedStr::own(user.to_string())),
			Some(SharedStr::own(canon.to_string())),
		);
		self
	}

	pub(crate) fn with_cache(mut self, cache: EntryCache) -> Self {
		self.cache = cache;
		self
	}

	/// Rebuilds a path-less entry from an index record.
	pub(crate) fn from_record(file: Container, record: SymbolRecord, name_off: NameOffset) -> Self {
		Self {
			name_off,
			..Self::new(file, record.header).with_cache(record.cache)
		}
	}

	/// The persistable part of this entry; paths are never stored.
	pub(crate) fn record(&self) -> SymbolRecord {
		SymbolRecord {
			header: self.header,
			cache: self.cache,
		}
	}

	/// Container the object lives in.
	pub fn file(&self) -> &Container {
		&self.file
	}

	/// Header address; the object's identity.
	pub fn header(&self) -> Addr {
		self.header
	}

	/// Cached type information.
	pub fn cache(&self) -> EntryCache {
		self.cache
	}

	/// Heap offset of the name this entry was last linked under.
	pub fn name_offset(&self) -> NameOffset {
		self.name_off
	}

	pub(crate) fn set_name_offset(&mut self, off: NameOffset) {
		self.name_off = off;
	}

	/// Cached user path.
	pub fn user_path(&self) -> Option<&SharedStr> {
		self.user_path.as_ref()
	}

	/// Cached canonical path.
	pub fn canon_path(&self) -> Option<&SharedStr> {
		self.canon_path.as_ref()
	}

	/// Whether the user path is currently hidden (e.g. shadowed by a mount).
	pub fn is_user_path_hidden(&self) -> bool {
		self.user_path_hidden
	}

	/// Marks the user path hidden or visible.
	pub fn set_user_path_hidden(&mut self, hidden: bool) {
		self.user_path_hidden = hidden;
	}

	/// Returns true if both entries refer to the same object.
	pub fn same_object(&self, other: &Entry) -> bool {
		self.file.same_storage(&other.file) && self.header == other.header
	}

	/// Copies this entry to `depth`.
	pub fn copy(&self, depth: CopyDepth) -> Entry {
		match depth {
			CopyDepth::Deep => self.clone(),
			CopyDepth::Shallow => Self {
				file: self.file.clone(),
				header: self.header,
				cache: self.cache,
				name_off: self.name_off,
				user_path: None,
				canon_path: None,
				user_path_hidden: false,
			},
		}
	}

	/// Drops both cached paths and clears the hidden flag.
	pub fn release_names(&mut self) {
		self.user_path = None;
		self.canon_path = None;
		self.user_path_hidden = false;
	}

	/// Replaces both cached paths at once.
	pub(crate) fn set_paths(&mut self, user: Option<SharedStr>, canon: Option<SharedStr>) {
		self.release_names();
		self.user_path = user;
		self.canon_path = canon;
	}
}
