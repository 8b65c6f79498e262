use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{AutoPool, DYNAMIC_BIG_SIZE, POOLS, autorelease, pool_depth};
use crate::{CreateFlags, ObjectType, Ref, TypeFlags, TypeRef};

struct Counted(u32);

fn counted_type(freed: &Arc<AtomicUsize>) -> TypeRef {
	let freed = Arc::clone(freed);
	ObjectType::with_delete_procedure::<Counted, _>("Counted", TypeFlags::empty(), move |_, _| {
		freed.fetch_add(1, Ordering::SeqCst);
	})
	.unwrap()
}

fn dynamic_capacity(depth: usize) -> usize {
	POOLS.with_borrow(|pools| pools[depth].dynamic_items.capacity())
}

#[test]
fn test_drain_releases_each_object_once() {
	let freed = Arc::new(AtomicUsize::new(0));
	let ty = counted_type(&freed);
	let kept = Ref::create(&ty, Counted(7), CreateFlags::empty(), 0).unwrap();

	let mut pool = AutoPool::new();
	pool.track(kept.clone());
	for i in 0..10 {
		pool.track(Ref::create(&ty, Counted(i), CreateFlags::empty(), 0).unwrap());
	}
	assert_eq!(pool.len(), 11);
	assert_eq!(kept.ref_count(), 2);

	pool.drain();
	assert!(pool.is_empty());
	assert_eq!(kept.ref_count(), 1);
	assert_eq!(freed.load(Ordering::SeqCst), 10);

	pool.drain();
	assert_eq!(kept.ref_count(), 1);
	assert_eq!(freed.load(Ordering::SeqCst), 10);
}

#[test]
fn test_track_borrows_body_until_drain() {
	let freed = Arc::new(AtomicUsize::new(0));
	let ty = counted_type(&freed);
	let pool = AutoPool::new();
	let body = pool.track(Ref::create(&ty, Counted(42), CreateFlags::empty(), 0).unwrap());
	assert_eq!(body.0, 42);
	assert_eq!(freed.load(Ordering::SeqCst), 0);
	drop(pool);
	assert_eq!(freed.load(Ordering::SeqCst), 1);
}

#[test]
fn test_overflow_spills_and_big_storage_is_released() {
	let freed = Arc::new(AtomicUsize::new(0));
	let ty = counted_type(&freed);
	let mut pool = AutoPool::new();
	let depth = pool_depth() - 1;

	for i in 0..100 {
		pool.track(Ref::create(&ty, Counted(i), CreateFlags::empty(), 0).unwrap());
	}
	assert_eq!(pool.len(), 100);
	assert_eq!(dynamic_capacity(depth), 64);
	pool.drain();
	assert_eq!(dynamic_capacity(depth), 64);

	for i in 0..400 {
		pool.track(Ref::create(&ty, Counted(i), CreateFlags::empty(), 0).unwrap());
	}
	assert!(dynamic_capacity(depth) > DYNAMIC_BIG_SIZE);
	pool.drain();
	assert_eq!(dynamic_capacity(depth), 0);
	assert_eq!(freed.load(Ordering::SeqCst), 500);
}

#[test]
fn test_nested_pools_are_lifo() {
	let freed = Arc::new(AtomicUsize::new(0));
	let ty = counted_type(&freed);
	let base = pool_depth();

	let outer = AutoPool::new();
	let a = Ref::create(&ty, Counted(1), CreateFlags::empty(), 0).unwrap();
	{
		let _inner = AutoPool::new();
		assert_eq!(pool_depth(), base + 2);
		autorelease(a.clone());
		assert_eq!(outer.len(), 0);
	}
	assert_eq!(pool_depth(), base + 1);
	assert_eq!(a.ref_count(), 1);

	autorelease(a);
	assert_eq!(outer.len(), 1);
	drop(outer);
	assert_eq!(pool_depth(), base);
	assert_eq!(freed.load(Ordering::SeqCst), 1);
}

#[test]
fn test_delete_procedure_may_autorelease_during_drain() {
	let ty = ObjectType::create::<Counted>("Leaf", TypeFlags::empty()).unwrap();
	let leaf_ty = ty.clone();
	let parent_ty = ObjectType::with_delete_procedure::<Counted, _>("Parent", TypeFlags::empty(), move |_, _| {
		autorelease(Ref::create(&leaf_ty, Counted(0), CreateFlags::empty(), 0).unwrap());
	})
	.unwrap();

	let mut pool = AutoPool::new();
	pool.track(Ref::create(&parent_ty, Counted(1), CreateFlags::empty(), 0).unwrap());
	pool.drain();
	assert!(pool.is_empty());
	assert_eq!(ty.live_objects(), 0);
}

#[test]
#[should_panic(expected = "no active pool")]
fn test_autorelease_without_pool_is_fatal() {
	let ty = ObjectType::create::<Counted>("Orphan", TypeFlags::empty()).unwrap();
	std::thread::spawn(move || {
		autorelease(Ref::create(&ty, Counted(0), CreateFlags::empty(), 0).unwrap());
	})
	.join()
	.unwrap_or_else(|err| std::panic::resume_unwind(err));
}

#[test]
#[should_panic(expected = "freed while")]
fn test_out_of_order_free_is_fatal() {
	let outer = AutoPool::new();
	let _inner = AutoPool::new();
	drop(outer);
}
