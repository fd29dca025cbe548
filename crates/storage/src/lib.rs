//! In-memory container storage primitives.
//!
//! A [`Container`] owns every persisted structure of one container: local name heaps,
//! sorted name indexes and object headers. Higher layers address them by [`Addr`] and never
//! hold references into the container state, so handles stay cheap to clone and share.
//!
//! # Key Types
//!
//! | Type | Role |
//! |------|------|
//! | [`Container`] | Shared handle to one container's storage. |
//! | [`LocalHeap`] | Byte store of NUL-terminated names with a free list. |
//! | [`SortedIndex`] | Ordered name index driven through [`IndexOp`] requests. |
//! | [`Index`] | Typed view over a sorted index with postcard-encoded records. |
//! | [`ObjectHeader`] | Typed metadata messages attached to one object. |
//! | [`SharedStr`] | Immutable reference-counted string cell. |
//!
//! # Invariants
//!
//! - Name comparisons inside an index always dereference the heap passed with the request;
//!   an index never outlives the usefulness of its heap, so indexes are deleted first.
//! - A constant header message cannot be replaced once written.

mod addr;
mod config;
mod container;
mod error;
mod fault;
mod header;
mod heap;
mod index;
mod shared_str;

pub use addr::{Addr, NameOffset};
pub use config::ContainerConfig;
pub use container::Container;
pub use error::{Result, StorageError};
#[cfg(feature = "test-support")]
pub use fault::Fault;
pub use header::{HeaderMessage, MessageFlags, MessageType, ObjectHeader};
pub use heap::LocalHeap;
pub use index::{ByteOrder, Index, IndexOp, IndexReply, KeyOrder, SortedIndex};
pub use shared_str::SharedStr;
