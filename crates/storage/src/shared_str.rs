use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Immutable reference-counted string cell.
///
/// Cloning increments the count, dropping decrements it, and the backing buffer is freed
/// with the last holder. Entry handles keep their cached paths in these cells so several
/// handles can share one path without copying it.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SharedStr(Arc<str>);

impl SharedStr {
	/// Takes ownership of `buffer` and wraps it in a fresh cell with a count of one.
	pub fn own(buffer: String) -> Self {
		Self(Arc::from(buffer))
	}

	/// Returns the string contents.
	#[inline]
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Returns the length in bytes.
	#[inline]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true for the empty string.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Number of live holders of this cell.
	pub fn ref_count(this: &Self) -> usize {
		Arc::strong_count(&this.0)
	}

	/// Returns true if both cells share one buffer.
	pub fn ptr_eq(a: &Self, b: &Self) -> bool {
		Arc::ptr_eq(&a.0, &b.0)
	}
}

impl Deref for SharedStr {
	type Target = str;

	fn deref(&self) -> &str {
		&self.0
	}
}

impl AsRef<str> for SharedStr {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

impl fmt::Debug for SharedStr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(&*self.0, f)
	}
}

impl fmt::Display for SharedStr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}
