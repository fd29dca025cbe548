use arbor_storage::{Addr, ContainerConfig, HeaderMessage, MessageType};
use serde::{Deserialize, Serialize};

/// Symbol table descriptor stored in a group's object header.
///
/// Written once, as a constant message, when the group is created.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StabMessage {
	/// Address of the name heap.
	pub heap: Addr,
	/// Address of the sorted name index.
	pub index: Addr,
}

impl HeaderMessage for StabMessage {
	const TYPE: MessageType = MessageType::SymbolTable;
}

impl StabMessage {
	/// Header space reserved for a group: a message prefix plus two addresses.
	pub fn header_size(config: &ContainerConfig) -> usize {
		4 + 2 * config.sizeof_addr as usize
	}
}
