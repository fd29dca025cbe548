use std::cmp::Ordering;

use proptest::prelude::*;
use serde::{Deserialize, Serialize};

use super::*;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Rec {
	target: u64,
}

/// Orders names by length first, then bytes.
struct ShortFirst;

impl KeyOrder for ShortFirst {
	fn compare(stored: &[u8], probe: &[u8]) -> Ordering {
		stored.len().cmp(&probe.len()).then_with(|| stored.cmp(probe))
	}
}

fn setup() -> (Container, Addr, Addr) {
	let c = Container::default();
	let heap = c.heap_create(32).unwrap();
	c.heap_insert(heap, b"").unwrap();
	let index = c.index_create().unwrap();
	(c, index, heap)
}

#[test]
fn find_insert_remove() {
	let (c, addr, heap) = setup();
	let index: Index<'_, Rec> = Index::new(&c, addr, heap);

	let key = index.insert("child", &Rec { target: 7 }).unwrap();
	assert_ne!(key, NameOffset::EMPTY);
	assert_eq!(c.heap_name(heap, key).unwrap(), "child");

	let (found_key, rec) = index.find("child").unwrap().expect("child is indexed");
	assert_eq!(found_key, key);
	assert_eq!(rec, Rec { target: 7 });
	assert!(index.find("other").unwrap().is_none());

	index.remove("child").unwrap();
	assert!(index.find("child").unwrap().is_none());
	assert!(index.is_empty().unwrap());
}

#[test]
fn duplicate_insert_is_rejected() {
	let (c, addr, heap) = setup();
	let index: Index<'_, Rec> = Index::new(&c, addr, heap);
	index.insert("a", &Rec { target: 1 }).unwrap();

	let err = index.insert("a", &Rec { target: 2 }).unwrap_err();
	assert!(matches!(err, StorageError::DuplicateKey(name) if name == "a"));
	assert_eq!(index.len().unwrap(), 1);
	assert_eq!(index.find("a").unwrap().unwrap().1.target, 1);
}

#[test]
fn remove_missing_reports_key_not_found() {
	let (c, addr, heap) = setup();
	let index: Index<'_, Rec> = Index::new(&c, addr, heap);
	assert!(matches!(index.remove("ghost"), Err(StorageError::KeyNotFound(_))));
}

#[test]
fn ordering_strategy_drives_iteration() {
	let (c, addr, heap) = setup();
	let index: Index<'_, Rec, ShortFirst> = Index::new(&c, addr, heap);
	for (i, name) in ["ccc", "a", "bb", "b"].into_iter().enumerate() {
		index.insert(name, &Rec { target: i as u64 }).unwrap();
	}

	let names: Vec<_> = index.entries().unwrap().into_iter().map(|(n, _, _)| n).collect();
	assert_eq!(names, ["a", "b", "bb", "ccc"]);
	assert_eq!(index.find("bb").unwrap().unwrap().1.target, 2);
}

#[test]
fn failed_name_free_keeps_the_record() {
	let (c, addr, heap) = setup();
	let index: Index<'_, Rec> = Index::new(&c, addr, heap);
	// "" takes [0, 8); the 9-byte name takes the rest of the 32-byte heap.
	let key = index.insert("abcdefgh", &Rec { target: 3 }).unwrap();
	assert_eq!(key, NameOffset(8));

	// Free the tail of the name's block so the full-length free overlaps free space.
	c.heap_remove(heap, NameOffset(16), 8).unwrap();
	assert!(matches!(index.remove("abcdefgh"), Err(StorageError::BadOffset { .. })));
	assert_eq!(index.len().unwrap(), 1);
	assert_eq!(index.find("abcdefgh").unwrap().unwrap().1.target, 3);
}

#[test]
fn missing_heap_is_an_error_not_a_miss() {
	let (c, addr, heap) = setup();
	let index: Index<'_, Rec> = Index::new(&c, addr, heap);
	index.insert("x", &Rec { target: 0 }).unwrap();
	c.heap_delete(heap).unwrap();
	assert!(matches!(index.find("x"), Err(StorageError::NoSuchHeap(_))));
}

proptest! {
	/// Entries come back sorted and unique, whatever the insertion order.
	#[test]
	fn prop_entries_sorted(names in prop::collection::hash_set("[a-z0-9]{1,12}", 0..48)) {
		let (c, addr, heap) = setup();
		let index: Index<'_, Rec> = Index::new(&c, addr, heap);
		for (i, name) in names.iter().enumerate() {
			index.insert(name, &Rec { target: i as u64 }).unwrap();
		}

		let listed: Vec<String> = index.entries().unwrap().into_iter().map(|(n, _, _)| n).collect();
		let mut expected: Vec<String> = names.into_iter().collect();
		expected.sort();
		prop_assert_eq!(listed, expected);
	}
}
