//! Group symbol tables.
//!
//! # Purpose
//!
//! Every group in a container owns one symbol table: a persistent name→entry directory made
//! of three coupled structures that are created and destroyed together:
//!
//! 1. a descriptor message in the group's object header naming the other two,
//! 2. a local name heap holding the NUL-terminated child names,
//! 3. a sorted name index whose records point at heap names and carry the child entry.
//!
//! # Mental Model
//!
//! Callers hold [`Entry`] handles. A handle's identity is its header address; the user and
//! canonical paths it carries are caches derived from the path used to reach it. The
//! functions in [`stab`] read a group's descriptor, drive its index, and keep the path caches
//! of the entries they hand back in step with the names they were reached through.
//!
//! # Key Types
//!
//! | Type | Role |
//! |------|------|
//! | [`Entry`] | Live reference to one object, with cached paths. |
//! | [`StabMessage`] | Descriptor message: heap and index addresses. |
//! | [`SymbolRecord`] | Payload stored per child in the index. |
//! | [`GroupConfig`] | Creation defaults loaded from TOML. |
//!
//! # Invariants
//!
//! - Heap offset 0 holds the empty string.
//!   - Enforced in: [`stab::create`].
//!   - Failure symptom: [`GroupError::HeapCorrupt`], with the partial table rolled back.
//!
//! - Names are unique within one table.
//!   - Enforced in: the index collision check reached through [`stab::insert`].
//!   - Failure symptom: [`GroupError::CannotInsert`].
//!
//! - Hard links never span containers.
//!   - Enforced in: [`stab::insert`], before any mutation.
//!   - Failure symptom: [`GroupError::CrossContainerLink`].
//!
//! - Cached paths are `parent + "/"? + name`, with no doubled separator.
//!   - Enforced in: [`path::join`].
//!
//! # Concurrency
//!
//! Every call is synchronous. Nothing here serializes find/insert/remove against each other
//! on one table; the layer that owns the container must.

mod config;
mod entry;
mod error;
mod message;
mod node;
pub mod path;
pub mod stab;

pub use config::GroupConfig;
pub use entry::{CopyDepth, Entry, EntryCache};
pub use error::{GroupError, Result};
pub use message::StabMessage;
pub use node::SymbolRecord;
pub use stab::{CreateStage, DeleteStage};
