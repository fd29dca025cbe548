//! Cached path maintenance.
//!
//! # Role
//!
//! When an object is reached through, or linked into, a group, its entry's cached paths are
//! rebuilt as the group's paths plus the component name. Both new paths are built before
//! either is installed, so an allocation failure leaves the target's old pair untouched.

use arbor_storage::SharedStr;

use crate::entry::Entry;
use crate::error::Result;

/// Component separator in cached paths.
pub const SEPARATOR: char = '/';

/// Appends `name` to `parent`, inserting a separator unless `parent` already ends in one.
///
/// The buffer is reserved at its exact final size; allocation failure is reported rather
/// than aborting.
pub fn join(parent: &str, name: &str) -> Result<String> {
	let needs_sep = !parent.ends_with(SEPARATOR);
	let len = parent.len() + usize::from(needs_sep) + name.len();

	let mut buf = String::new();
	buf.try_reserve_exact(len)?;
	buf.push_str(parent);
	if needs_sep {
		buf.push(SEPARATOR);
	}
	buf.push_str(name);
	debug_assert_eq!(buf.len(), len);
	Ok(buf)
}

/// Rebuilds `obj`'s cached paths as `loc`'s paths extended by `name`.
///
/// Does nothing when `loc` has no canonical path; `obj` keeps whatever it had. Otherwise the
/// old cells are released, the hidden flag cleared, and fresh cells installed. A location
/// with a canonical path but no user path yields a target with no user path.
pub(crate) fn insert_name(loc: &Entry, obj: &mut Entry, name: &str) -> Result<()> {
	let Some(loc_canon) = loc.canon_path() else {
		return Ok(());
	};

	let user = loc.user_path().map(|p| join(p, name)).transpose()?;
	let canon = join(loc_canon, name)?;

	obj.set_paths(user.map(SharedStr::own), Some(SharedStr::own(canon)));
	tracing::trace!(
		name,
		user = ?obj.user_path(),
		canon = ?obj.canon_path(),
		"path.insert_name"
	);
	Ok(())
}
