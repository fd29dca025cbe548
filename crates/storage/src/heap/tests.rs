use proptest::prelude::*;

use super::*;

fn heap(size: usize) -> LocalHeap {
	LocalHeap::new(size, &ContainerConfig::default())
}

#[test]
fn first_insert_lands_at_zero() {
	let mut heap = heap(18);
	assert_eq!(heap.insert(b""), NameOffset::EMPTY);
	assert_eq!(heap.get(NameOffset::EMPTY), Some(&b""[..]));
}

#[test]
fn size_hint_is_clamped_to_free_overhead() {
	let heap = heap(1);
	assert_eq!(heap.len(), 16);
	assert!(heap.is_empty());
}

#[test]
fn inserts_are_aligned_and_terminated() {
	let mut heap = heap(64);
	let empty = heap.insert(b"");
	let a = heap.insert(b"alpha");
	let b = heap.insert(b"bravo-charlie");

	assert_eq!(empty.0, 0);
	assert_eq!(a.0, 8);
	assert_eq!(b.0, 16);
	assert_eq!(heap.get(a), Some(&b"alpha"[..]));
	assert_eq!(heap.get(b), Some(&b"bravo-charlie"[..]));
}

#[test]
fn grows_when_full() {
	let mut heap = heap(16);
	heap.insert(b"");
	let long = heap.insert(b"a-name-longer-than-the-initial-extent");
	assert!(heap.len() > 16);
	assert_eq!(heap.get(long), Some(&b"a-name-longer-than-the-initial-extent"[..]));
}

#[test]
fn removed_space_is_reused() {
	let mut heap = heap(64);
	heap.insert(b"");
	let a = heap.insert(b"first");
	let _b = heap.insert(b"second");

	assert!(heap.remove(a, b"first".len() + 1));
	assert_eq!(heap.get(a), None);

	let c = heap.insert(b"third");
	assert_eq!(c, a);
}

#[test]
fn remove_rejects_overlap_and_out_of_bounds() {
	let mut heap = heap(32);
	let a = heap.insert(b"name");
	assert!(heap.remove(a, 5));
	assert!(!heap.remove(a, 5));
	assert!(!heap.remove(NameOffset(4096), 1));
}

#[test]
fn freed_neighbours_coalesce() {
	let mut heap = heap(64);
	let a = heap.insert(b"aaaa");
	let b = heap.insert(b"bbbb");
	let before = heap.free.len();

	assert!(heap.remove(a, 5));
	assert!(heap.remove(b, 5));
	assert!(heap.free.len() <= before);
	assert!(heap.is_empty());
}

proptest! {
	/// Every live name reads back unchanged regardless of interleaved removals.
	#[test]
	fn prop_live_names_survive(names in prop::collection::vec("[a-z]{1,24}", 1..40)) {
		let mut heap = heap(16);
		heap.insert(b"");
		let mut live = Vec::new();
		for (i, name) in names.iter().enumerate() {
			let off = heap.insert(name.as_bytes());
			live.push((off, name.clone()));
			if i % 3 == 2 {
				let (off, name) = live.remove(0);
				prop_assert!(heap.remove(off, name.len() + 1));
			}
		}
		for (off, name) in &live {
			prop_assert_eq!(heap.get(*off), Some(name.as_bytes()));
		}
	}
}
