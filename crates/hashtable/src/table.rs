use crate::HashtableError;

/// Hash function supplied by the table owner.
///
/// Entries considered equal by the paired [`EqualsFn`] must hash equally.
pub type HashFn<T> = fn(&T) -> u32;

/// Equality function supplied by the table owner.
pub type EqualsFn<T> = fn(&T, &T) -> bool;

/// Hash code marking an unused entry.
///
/// User hashes that collide with the sentinel are remapped to zero.
pub const DELETED_HASH: u32 = u32::MAX;

const INVALID_INDEX: u32 = u32::MAX;
const MIN_CAPACITY: usize = 16;
const MAX_CAPACITY: usize = 1 << 31;

#[derive(Debug)]
struct Entry<T> {
	hash: u32,
	/// Next entry in the bucket chain, or next free entry.
	next: u32,
	body: Option<T>,
}

impl<T> Entry<T> {
	const fn vacant() -> Self {
		Self {
			hash: DELETED_HASH,
			next: INVALID_INDEX,
			body: None,
		}
	}
}

/// Result of [`Hashtable::add`].
#[derive(Debug, PartialEq, Eq)]
pub enum AddOutcome<T> {
	/// The entry was inserted.
	Added,
	/// An equal entry already exists; the rejected entry is handed back.
	Existing(T),
}

/// Occupancy counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashtableStats {
	pub count: usize,
	pub capacity: usize,
	pub buckets: usize,
	/// Insertions that landed in an already occupied bucket.
	pub collisions: usize,
}

/// Hashtable with separate chaining through entry indices.
///
/// Buckets and entries are sized together and always a power of two, so
/// the bucket for a hash is `hash mod buckets`. The entry array doubles
/// (and every chain is rebuilt) once it is full and no freed entry is
/// available for reuse.
#[derive(Debug)]
pub struct Hashtable<T> {
	hash: HashFn<T>,
	equals: EqualsFn<T>,
	buckets: Vec<u32>,
	entries: Vec<Entry<T>>,
	count: usize,
	free_entry: u32,
	/// High-water mark: entries at or above this index were never used.
	next_entry: u32,
	collisions: usize,
}

impl<T> Hashtable<T> {
	/// Creates a table with room for at least `capacity` entries.
	pub fn new(hash: HashFn<T>, equals: EqualsFn<T>, capacity: usize) -> Self {
		let capacity = capacity.clamp(MIN_CAPACITY, MAX_CAPACITY).next_power_of_two();
		let mut entries = Vec::with_capacity(capacity);
		entries.resize_with(capacity, Entry::vacant);
		Self {
			hash,
			equals,
			buckets: vec![INVALID_INDEX; capacity],
			entries,
			count: 0,
			free_entry: INVALID_INDEX,
			next_entry: 0,
			collisions: 0,
		}
	}

	pub fn len(&self) -> usize {
		self.count
	}

	pub fn is_empty(&self) -> bool {
		self.count == 0
	}

	pub fn stats(&self) -> HashtableStats {
		HashtableStats {
			count: self.count,
			capacity: self.entries.len(),
			buckets: self.buckets.len(),
			collisions: self.collisions,
		}
	}

	/// Computes the stored hash code for `entry`.
	pub fn hash_of(&self, entry: &T) -> u32 {
		normalize((self.hash)(entry))
	}

	#[inline]
	fn bucket_of(hash: u32, buckets: usize) -> usize {
		hash as usize & (buckets - 1)
	}

	fn find_index(&self, hash: u32, mut pred: impl FnMut(&T) -> bool) -> Option<usize> {
		let hash = normalize(hash);
		let mut index = self.buckets[Self::bucket_of(hash, self.buckets.len())];
		while index != INVALID_INDEX {
			let entry = &self.entries[index as usize];
			if entry.hash == hash
				&& let Some(body) = &entry.body
				&& pred(body)
			{
				return Some(index as usize);
			}
			index = entry.next;
		}
		None
	}

	/// Adds `entry` unless an equal entry is already present.
	pub fn add(&mut self, entry: T) -> Result<AddOutcome<T>, HashtableError> {
		let hash = self.hash_of(&entry);
		let equals = self.equals;
		if self.find_index(hash, |existing| equals(existing, &entry)).is_some() {
			return Ok(AddOutcome::Existing(entry));
		}

		let index = if self.free_entry != INVALID_INDEX {
			let index = self.free_entry;
			self.free_entry = self.entries[index as usize].next;
			index
		} else {
			if self.next_entry as usize == self.entries.len() {
				self.grow()?;
			}
			let index = self.next_entry;
			self.next_entry += 1;
			index
		};

		let bucket = Self::bucket_of(hash, self.buckets.len());
		let head = self.buckets[bucket];
		if head != INVALID_INDEX {
			self.collisions += 1;
		}
		self.entries[index as usize] = Entry {
			hash,
			next: head,
			body: Some(entry),
		};
		self.buckets[bucket] = index;
		self.count += 1;
		Ok(AddOutcome::Added)
	}

	fn grow(&mut self) -> Result<(), HashtableError> {
		let old = self.entries.len();
		let new = old * 2;
		if new > MAX_CAPACITY {
			return Err(HashtableError::CapacityOverflow { requested: new });
		}

		let mut buckets = Vec::new();
		buckets.try_reserve_exact(new)?;
		buckets.resize(new, INVALID_INDEX);
		self.entries.try_reserve_exact(new - old)?;
		self.entries.resize_with(new, Entry::vacant);

		for index in 0..self.next_entry {
			let entry = &mut self.entries[index as usize];
			if entry.hash == DELETED_HASH {
				continue;
			}
			let bucket = Self::bucket_of(entry.hash, new);
			entry.next = buckets[bucket];
			buckets[bucket] = index;
		}
		self.buckets = buckets;
		Ok(())
	}

	/// Returns the entry equal to `key`.
	pub fn get(&self, key: &T) -> Option<&T> {
		let equals = self.equals;
		let index = self.find_index(self.hash_of(key), |existing| equals(existing, key))?;
		self.entries[index].body.as_ref()
	}

	/// Returns the entry equal to `key`, mutably.
	///
	/// Callers must not change the fields the hash depends on.
	pub fn get_mut(&mut self, key: &T) -> Option<&mut T> {
		let equals = self.equals;
		let index = self.find_index(self.hash_of(key), |existing| equals(existing, key))?;
		self.entries[index].body.as_mut()
	}

	/// Looks up by a precomputed hash and predicate, without a full entry.
	pub fn find_with(&self, hash: u32, pred: impl FnMut(&T) -> bool) -> Option<&T> {
		let index = self.find_index(hash, pred)?;
		self.entries[index].body.as_ref()
	}

	/// Removes and returns the entry equal to `key`.
	pub fn remove(&mut self, key: &T) -> Option<T> {
		let equals = self.equals;
		let hash = self.hash_of(key);
		self.remove_with(hash, |existing| equals(existing, key))
	}

	/// Removes and returns the first entry in `hash`'s chain matching `pred`.
	pub fn remove_with(&mut self, hash: u32, mut pred: impl FnMut(&T) -> bool) -> Option<T> {
		let hash = normalize(hash);
		let bucket = Self::bucket_of(hash, self.buckets.len());
		let mut prev = INVALID_INDEX;
		let mut index = self.buckets[bucket];

		while index != INVALID_INDEX {
			let entry = &self.entries[index as usize];
			let next = entry.next;
			let matched = entry.hash == hash && entry.body.as_ref().is_some_and(&mut pred);
			if matched {
				if prev == INVALID_INDEX {
					self.buckets[bucket] = next;
				} else {
					self.entries[prev as usize].next = next;
				}
				let entry = &mut self.entries[index as usize];
				entry.hash = DELETED_HASH;
				entry.next = self.free_entry;
				self.free_entry = index;
				self.count -= 1;
				return entry.body.take();
			}
			prev = index;
			index = next;
		}
		None
	}

	/// Advances `cursor` to the next live entry and returns it.
	///
	/// Start with a cursor of zero. The cursor only moves forward; the table
	/// cannot be mutated while a walk is in progress.
	pub fn enumerate(&self, cursor: &mut usize) -> Option<&T> {
		while *cursor < self.next_entry as usize {
			let entry = &self.entries[*cursor];
			*cursor += 1;
			if entry.hash != DELETED_HASH {
				return entry.body.as_ref();
			}
		}
		None
	}

	pub fn iter(&self) -> Iter<'_, T> {
		Iter { table: self, cursor: 0 }
	}

	/// Removes every entry, keeping storage.
	pub fn clear(&mut self) {
		self.buckets.fill(INVALID_INDEX);
		for entry in &mut self.entries[..self.next_entry as usize] {
			*entry = Entry::vacant();
		}
		self.count = 0;
		self.free_entry = INVALID_INDEX;
		self.next_entry = 0;
		self.collisions = 0;
	}
}

#[inline]
const fn normalize(hash: u32) -> u32 {
	if hash == DELETED_HASH { 0 } else { hash }
}

/// Iterator over live entries, built on [`Hashtable::enumerate`].
pub struct Iter<'a, T> {
	table: &'a Hashtable<T>,
	cursor: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
	type Item = &'a T;

	fn next(&mut self) -> Option<&'a T> {
		self.table.enumerate(&mut self.cursor)
	}
}

impl<'a, T> IntoIterator for &'a Hashtable<T> {
	type Item = &'a T;
	type IntoIter = Iter<'a, T>;

	fn into_iter(self) -> Iter<'a, T> {
		self.iter()
	}
}
