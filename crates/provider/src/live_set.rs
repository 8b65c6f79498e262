use parking_lot::RwLock;
use vigil_hashtable::{AddOutcome, Hashtable, HashtableError};
use vigil_object::Ref;

/// An item kind that can be tracked in a [`LiveSet`].
pub trait Tracked: Send + Sync + 'static {
	type Key: ?Sized;

	/// Primary key. Must not change while the item is tracked.
	fn key(&self) -> &Self::Key;

	fn hash_key(key: &Self::Key) -> u32;

	fn key_eq(a: &Self::Key, b: &Self::Key) -> bool;
}

const INITIAL_CAPACITY: usize = 64;

/// Hashtable-backed set of the items currently known to exist.
///
/// The set owns one strong reference per item. Lookups clone a reference
/// under the shared lock, so the caller's handle stays valid after the
/// lock is released. No reference is ever dropped while the lock is held.
pub struct LiveSet<T: Tracked> {
	name: &'static str,
	table: RwLock<Hashtable<Ref<T>>>,
}

impl<T: Tracked> LiveSet<T> {
	pub fn new(name: &'static str) -> Self {
		let table = Hashtable::new(
			|item: &Ref<T>| T::hash_key(item.key()),
			|a: &Ref<T>, b: &Ref<T>| T::key_eq(a.key(), b.key()),
			INITIAL_CAPACITY,
		);
		Self {
			name,
			table: RwLock::new(table),
		}
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	/// Returns a new strong reference to the item with `key`.
	pub fn lookup(&self, key: &T::Key) -> Option<Ref<T>> {
		let table = self.table.read();
		table.find_with(T::hash_key(key), |item| T::key_eq(item.key(), key)).cloned()
	}

	pub fn contains(&self, key: &T::Key) -> bool {
		let table = self.table.read();
		table.find_with(T::hash_key(key), |item| T::key_eq(item.key(), key)).is_some()
	}

	/// Inserts `item`, transferring its reference to the set.
	///
	/// Returns `false` (and releases `item`) if an item with the same key is
	/// already tracked.
	pub fn insert(&self, item: Ref<T>) -> Result<bool, HashtableError> {
		let outcome = self.table.write().add(item)?;
		match outcome {
			AddOutcome::Added => Ok(true),
			AddOutcome::Existing(rejected) => {
				drop(rejected);
				Ok(false)
			}
		}
	}

	/// Unlinks the item with `key` and hands back the set's reference.
	pub fn remove(&self, key: &T::Key) -> Option<Ref<T>> {
		let hash = T::hash_key(key);
		self.table.write().remove_with(hash, |item| T::key_eq(item.key(), key))
	}

	/// Unlinks every item and hands back the set's references.
	pub fn clear(&self) -> Vec<Ref<T>> {
		let mut table = self.table.write();
		let mut cursor = 0;
		let mut items = Vec::with_capacity(table.len());
		while let Some(item) = table.enumerate(&mut cursor) {
			items.push(item.clone());
		}
		table.clear();
		items
	}

	/// References every tracked item.
	pub fn snapshot(&self) -> Vec<Ref<T>> {
		self.select(|_| true)
	}

	/// References every tracked item matching `pred`.
	///
	/// `pred` runs under the shared lock and must not touch this set.
	pub fn select(&self, mut pred: impl FnMut(&T) -> bool) -> Vec<Ref<T>> {
		let table = self.table.read();
		table.iter().filter(|item| pred(item)).cloned().collect()
	}

	/// Calls `f` for each item under the shared lock.
	pub fn for_each(&self, mut f: impl FnMut(&Ref<T>)) {
		let table = self.table.read();
		let mut cursor = 0;
		while let Some(item) = table.enumerate(&mut cursor) {
			f(item);
		}
	}

	pub fn len(&self) -> usize {
		self.table.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl<T: Tracked> std::fmt::Debug for LiveSet<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LiveSet")
			.field("name", &self.name)
			.field("len", &self.len())
			.finish()
	}
}
