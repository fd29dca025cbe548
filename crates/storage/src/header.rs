//! Object headers and their typed messages.

use std::fmt;

use bitflags::bitflags;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Kinds of metadata message an object header can carry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MessageType {
	/// Symbol table descriptor: name heap and index addresses of a group.
	SymbolTable,
	/// Free-form comment attached to an object.
	Comment,
}

impl fmt::Display for MessageType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::SymbolTable => write!(f, "symbol_table"),
			Self::Comment => write!(f, "comment"),
		}
	}
}

bitflags! {
	/// Per-message storage flags.
	#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
	pub struct MessageFlags: u8 {
		/// The message is written once and never replaced or removed.
		const CONSTANT = 1 << 0;
	}
}

/// A typed message payload.
pub trait HeaderMessage: Serialize + DeserializeOwned {
	/// Slot this payload occupies in a header.
	const TYPE: MessageType;
}

#[derive(Debug, Clone)]
pub(crate) struct StoredMessage {
	pub(crate) kind: MessageType,
	pub(crate) flags: MessageFlags,
	pub(crate) payload: Vec<u8>,
}

/// Metadata header attached to one object.
#[derive(Debug, Clone)]
pub struct ObjectHeader {
	pub(crate) messages: Vec<StoredMessage>,
	pub(crate) size_hint: usize,
	pub(crate) open_count: usize,
}

impl ObjectHeader {
	pub(crate) fn new(size_hint: usize) -> Self {
		Self {
			messages: Vec::new(),
			size_hint,
			open_count: 1,
		}
	}

	/// Space reserved for messages at creation.
	pub fn size_hint(&self) -> usize {
		self.size_hint
	}

	/// Number of open handles to this header.
	pub fn open_count(&self) -> usize {
		self.open_count
	}

	/// Number of messages of `kind`.
	pub fn count(&self, kind: MessageType) -> usize {
		self.messages.iter().filter(|m| m.kind == kind).count()
	}

	pub(crate) fn first(&self, kind: MessageType) -> Option<&StoredMessage> {
		self.messages.iter().find(|m| m.kind == kind)
	}

	pub(crate) fn position(&self, kind: MessageType) -> Option<usize> {
		self.messages.iter().position(|m| m.kind == kind)
	}
}
