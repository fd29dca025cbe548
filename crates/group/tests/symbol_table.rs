use std::collections::BTreeMap;
use std::ops::ControlFlow;

use arbor_group::{CreateStage, DeleteStage, Entry, EntryCache, GroupConfig, GroupError, stab};
use arbor_storage::{Addr, Container, ContainerConfig, Fault, NameOffset, StorageError};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn open_root(file: &Container) -> Entry {
	let grp = stab::create_with(file, &GroupConfig::default()).expect("root group");
	grp.with_paths("/", "/")
}

fn new_object(file: &Container) -> Entry {
	Entry::new(file.clone(), file.header_create(32).expect("object header"))
}

#[test]
fn nested_groups_build_paths_through_each_level() {
	let file = Container::default();
	let root = open_root(&file);

	let mut sub = stab::create(&file, 64).unwrap();
	stab::insert(&root, "sub", &mut sub).unwrap();
	assert_eq!(sub.canon_path().unwrap().as_str(), "/sub");

	let mut leaf = new_object(&file);
	stab::insert(&sub, "leaf", &mut leaf).unwrap();
	assert_eq!(leaf.canon_path().unwrap().as_str(), "/sub/leaf");

	let found_sub = stab::find(&root, "sub").unwrap();
	assert!(matches!(found_sub.cache(), EntryCache::SymbolTable { .. }));
	let found_leaf = stab::find(&found_sub, "leaf").unwrap();
	assert!(found_leaf.same_object(&leaf));
	assert_eq!(found_leaf.user_path().unwrap().as_str(), "/sub/leaf");
}

#[test]
fn hard_link_gives_one_object_two_names() {
	let file = Container::default();
	let root = open_root(&file);
	let mut obj = new_object(&file);
	stab::insert(&root, "first", &mut obj).unwrap();
	let mut alias = obj.clone();
	stab::insert(&root, "second", &mut alias).unwrap();

	let a = stab::find(&root, "first").unwrap();
	let b = stab::find(&root, "second").unwrap();
	assert!(a.same_object(&b));
	assert_eq!(a.canon_path().unwrap().as_str(), "/first");
	assert_eq!(b.canon_path().unwrap().as_str(), "/second");
	assert_eq!(obj.canon_path().unwrap().as_str(), "/first");
}

#[test]
fn second_handle_on_same_container_may_link() {
	let file = Container::default();
	let reopened = file.clone();
	let root = open_root(&file);
	let mut obj = new_object(&reopened);
	stab::insert(&root, "shared", &mut obj).unwrap();
	assert!(stab::contains(&root, "shared").unwrap());
}

#[test]
fn failed_descriptor_write_closes_header_and_rolls_back() {
	let file = Container::default();
	file.inject_fault(Fault::HeaderWrite);

	let err = stab::create(&file, 0).unwrap_err();
	assert!(matches!(
		err,
		GroupError::Init {
			stage: CreateStage::IndexReady,
			source: StorageError::Injected(_),
		}
	));

	// Fresh container layout: heap at 0, index right after the 24-byte heap, header after
	// the 544-byte index node.
	assert!(!file.heap_exists(Addr(0)));
	assert!(!file.index_exists(Addr(24)));
	assert_eq!(file.header_open_count(Addr(24 + 544)).unwrap(), 0);

	let grp = stab::create(&file, 0).unwrap();
	assert_eq!(stab::count(&grp).unwrap(), 0);
}

#[test]
fn failed_index_create_removes_heap() {
	let file = Container::default();
	file.inject_fault(Fault::IndexCreate);
	let err = stab::create(&file, 0).unwrap_err();
	assert!(matches!(
		err,
		GroupError::Init {
			stage: CreateStage::HeapReady,
			..
		}
	));
	assert!(!file.heap_exists(Addr(0)));
}

#[test]
fn failed_heap_create_reports_uninit() {
	let file = Container::default();
	file.inject_fault(Fault::HeapCreate);
	assert!(matches!(
		stab::create(&file, 0),
		Err(GroupError::Init {
			stage: CreateStage::Uninit,
			..
		})
	));
}

#[test]
fn failed_empty_name_insert_removes_heap() {
	let file = Container::default();
	file.inject_fault(Fault::HeapInsert);
	assert!(matches!(
		stab::create(&file, 0),
		Err(GroupError::Init {
			stage: CreateStage::Uninit,
			source: StorageError::Injected(_),
		})
	));
	assert!(!file.heap_exists(Addr(0)));
}

#[test]
fn empty_name_off_zero_is_heap_corruption() {
	let file = Container::default();
	file.inject_fault(Fault::HeapPrefill);
	let err = stab::create(&file, 0).unwrap_err();
	assert!(matches!(err, GroupError::HeapCorrupt(offset) if offset == NameOffset(8)));
	assert!(!file.heap_exists(Addr(0)));

	let grp = stab::create(&file, 0).unwrap();
	let desc = stab::descriptor(&grp).unwrap();
	assert_eq!(file.heap_name(desc.heap, NameOffset::EMPTY).unwrap(), "");
}

#[test]
fn delete_reports_stage_reached() {
	let file = Container::default();
	let root = open_root(&file);
	stab::insert(&root, "x", &mut new_object(&file)).unwrap();
	let desc = stab::descriptor(&root).unwrap();

	file.inject_fault(Fault::HeapDelete);
	let err = stab::delete(&file, desc.heap, desc.index).unwrap_err();
	assert!(matches!(
		err,
		GroupError::Delete {
			reached: DeleteStage::IndexDestroyed,
			..
		}
	));
	assert!(!file.index_exists(desc.index));
	assert!(file.heap_exists(desc.heap));
}

#[test]
fn delete_failing_on_index_leaves_both() {
	let file = Container::default();
	let root = open_root(&file);
	let desc = stab::descriptor(&root).unwrap();

	file.inject_fault(Fault::IndexDelete);
	assert!(matches!(
		stab::delete(&file, desc.heap, desc.index),
		Err(GroupError::Delete {
			reached: DeleteStage::Committed,
			..
		})
	));
	assert!(file.index_exists(desc.index));
	assert!(file.heap_exists(desc.heap));

	stab::delete(&file, desc.heap, desc.index).unwrap();
	assert!(stab::find(&root, "x").is_err());
}

#[test]
fn custom_address_width_sizes_group_header() {
	let file = Container::new(ContainerConfig::from_toml("sizeof_addr = 4").unwrap()).unwrap();
	let grp = stab::create(&file, 0).unwrap();
	let size = file.with_header(grp.header(), |h| h.size_hint()).unwrap();
	assert_eq!(size, 12);
}

proptest! {
	/// Whatever names are inserted, each one finds its own object and iteration lists
	/// exactly the inserted names in order.
	#[test]
	fn prop_insert_find_roundtrip(names in prop::collection::btree_set("[A-Za-z0-9_.-]{1,20}", 1..32)) {
		let file = Container::default();
		let root = open_root(&file);
		let mut objects = BTreeMap::new();
		for name in &names {
			let mut obj = new_object(&file);
			stab::insert(&root, name, &mut obj).unwrap();
			objects.insert(name.clone(), obj);
		}

		for (name, obj) in &objects {
			let found = stab::find(&root, name).unwrap();
			prop_assert!(found.same_object(obj));
			prop_assert_eq!(found.canon_path().unwrap().as_str(), format!("/{name}"));
		}

		let mut listed = Vec::new();
		let flow = stab::iterate(&root, |name, _| {
			listed.push(name.to_string());
			ControlFlow::Continue(())
		}).unwrap();
		prop_assert!(flow.is_continue());
		prop_assert_eq!(listed, names.into_iter().collect::<Vec<_>>());
		prop_assert_eq!(stab::count(&root).unwrap(), objects.len());
	}
}
