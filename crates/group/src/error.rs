//! Error types for symbol table operations.

use std::collections::TryReserveError;

use arbor_storage::{Addr, NameOffset, StorageError};
use thiserror::Error;

use crate::stab::{CreateStage, DeleteStage};

/// Errors raised by symbol table operations.
#[derive(Debug, Error)]
pub enum GroupError {
	/// Names must be non-empty and free of NUL bytes.
	#[error("invalid name {0:?}")]
	InvalidName(String),

	/// Creating the heap, index or header failed; everything created so far was rolled back.
	#[error("can't create symbol table (reached {stage})")]
	Init {
		/// Last stage completed before the failure.
		stage: CreateStage,
		/// Underlying storage failure.
		#[source]
		source: StorageError,
	},

	/// The fresh heap did not place the empty string at offset 0.
	#[error("name heap corrupt: empty string landed at offset {0}, expected 0")]
	HeapCorrupt(NameOffset),

	/// The header has no readable symbol table descriptor.
	#[error("object at {header} is not a symbol table")]
	NotASymbolTable {
		/// Header address of the supposed group.
		header: Addr,
		/// Storage failure, when the header itself could not be read.
		#[source]
		source: Option<StorageError>,
	},

	/// No record under the name.
	#[error("{name:?} not found")]
	NotFound {
		/// The missing name.
		name: String,
	},

	/// The index failed while looking a name up.
	#[error("unable to look up {name:?}")]
	Lookup {
		/// The name being looked up.
		name: String,
		/// Underlying storage failure.
		#[source]
		source: StorageError,
	},

	/// The index rejected an insertion.
	#[error("unable to insert {name:?}")]
	CannotInsert {
		/// The name being inserted.
		name: String,
		/// Underlying storage failure or key collision.
		#[source]
		source: StorageError,
	},

	/// The index rejected a removal.
	#[error("unable to remove {name:?}")]
	CannotRemove {
		/// The name being removed.
		name: String,
		/// Underlying storage failure.
		#[source]
		source: StorageError,
	},

	/// The group and the entry being linked live in different containers.
	#[error("hard links across containers are not allowed")]
	CrossContainerLink,

	/// A path buffer could not be allocated.
	#[error("memory allocation failed while building a path")]
	NoSpace(#[from] TryReserveError),

	/// Reading table records for iteration failed.
	#[error("unable to iterate symbol table")]
	Iterate(#[source] StorageError),

	/// Tearing down a table failed part way.
	#[error("unable to delete symbol table (reached {reached})")]
	Delete {
		/// Last stage completed before the failure.
		reached: DeleteStage,
		/// Underlying storage failure.
		#[source]
		source: StorageError,
	},

	/// Invalid group configuration.
	#[error("invalid group config: {0}")]
	Config(String),
}

/// Result type for symbol table operations.
pub type Result<T> = std::result::Result<T, GroupError>;
