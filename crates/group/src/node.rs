//! Index records for symbol tables.

use arbor_storage::{Addr, ByteOrder, Container, Index};
use serde::{Deserialize, Serialize};

use crate::entry::EntryCache;
use crate::message::StabMessage;

/// Payload stored per child in a symbol table index.
///
/// The name offset is the index key and lives beside the payload; cached paths are never
/// persisted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolRecord {
	/// Header address of the child.
	pub header: Addr,
	/// Cached type information of the child.
	pub cache: EntryCache,
}

/// Symbol table index: [`SymbolRecord`]s ordered byte-wise by name.
pub(crate) type SymbolIndex<'c> = Index<'c, SymbolRecord, ByteOrder>;

pub(crate) fn open<'c>(file: &'c Container, stab: &StabMessage) -> SymbolIndex<'c> {
	Index::new(file, stab.index, stab.heap)
}
