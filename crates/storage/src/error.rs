//! Error types for container storage operations.

use thiserror::Error;

use crate::addr::{Addr, NameOffset};
use crate::header::MessageType;

/// Errors raised by the collaborators stored inside a container.
#[derive(Debug, Error)]
pub enum StorageError {
	/// No local heap lives at the address.
	#[error("no local heap at {0}")]
	NoSuchHeap(Addr),

	/// No sorted index lives at the address.
	#[error("no sorted index at {0}")]
	NoSuchIndex(Addr),

	/// No object header lives at the address.
	#[error("no object header at {0}")]
	NoSuchHeader(Addr),

	/// The object header exists but every handle to it was closed.
	#[error("object header at {0} is not open")]
	HeaderClosed(Addr),

	/// A heap offset does not start a stored name.
	#[error("heap {heap}: offset {offset} is out of bounds")]
	BadOffset {
		/// Heap address.
		heap: Addr,
		/// Offending offset.
		offset: NameOffset,
	},

	/// A stored name is not valid UTF-8.
	#[error("heap {heap}: name at offset {offset} is not valid UTF-8")]
	BadName {
		/// Heap address.
		heap: Addr,
		/// Offset of the name.
		offset: NameOffset,
	},

	/// The index already holds a record under this name.
	#[error("duplicate key {0:?}")]
	DuplicateKey(String),

	/// The index holds no record under this name.
	#[error("key {0:?} not found")]
	KeyNotFound(String),

	/// A constant message cannot be overwritten.
	#[error("constant {kind} message in header {header} cannot be modified")]
	ConstantMessage {
		/// Header address.
		header: Addr,
		/// Message type.
		kind: MessageType,
	},

	/// A record or message failed to encode or decode.
	#[error("codec error: {0}")]
	Codec(#[from] postcard::Error),

	/// Invalid container configuration.
	#[error("invalid container config: {0}")]
	Config(String),

	/// A fault injected by a test.
	#[error("injected fault: {0}")]
	Injected(&'static str),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
