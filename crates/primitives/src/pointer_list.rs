/// Opaque handle to an item stored in a [`PointerList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerHandle(usize);

#[derive(Debug)]
enum Slot<T> {
	Occupied(T),
	Free { next: Option<usize> },
}

/// Unordered list whose items keep a stable handle until removed.
///
/// Freed slots are threaded into a free list and reused by later
/// insertions, so removal never shifts other items. Storage doubles when
/// full and is never shrunk.
#[derive(Debug)]
pub struct PointerList<T> {
	slots: Vec<Slot<T>>,
	free_head: Option<usize>,
	count: usize,
}

impl<T> Default for PointerList<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> PointerList<T> {
	pub const fn new() -> Self {
		Self {
			slots: Vec::new(),
			free_head: None,
			count: 0,
		}
	}

	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			slots: Vec::with_capacity(capacity),
			free_head: None,
			count: 0,
		}
	}

	pub fn len(&self) -> usize {
		self.count
	}

	pub fn is_empty(&self) -> bool {
		self.count == 0
	}

	/// Adds an item and returns its handle.
	pub fn add(&mut self, item: T) -> PointerHandle {
		self.count += 1;
		if let Some(index) = self.free_head {
			let Slot::Free { next } = self.slots[index] else {
				unreachable!("free list points at an occupied slot");
			};
			self.free_head = next;
			self.slots[index] = Slot::Occupied(item);
			return PointerHandle(index);
		}

		if self.slots.len() == self.slots.capacity() {
			let grow = self.slots.capacity().max(4);
			self.slots.reserve_exact(grow);
		}
		self.slots.push(Slot::Occupied(item));
		PointerHandle(self.slots.len() - 1)
	}

	/// Returns the handle of the first item matching `pred`.
	pub fn find(&self, mut pred: impl FnMut(&T) -> bool) -> Option<PointerHandle> {
		self.slots.iter().enumerate().find_map(|(index, slot)| match slot {
			Slot::Occupied(item) if pred(item) => Some(PointerHandle(index)),
			_ => None,
		})
	}

	pub fn get(&self, handle: PointerHandle) -> Option<&T> {
		match self.slots.get(handle.0)? {
			Slot::Occupied(item) => Some(item),
			Slot::Free { .. } => None,
		}
	}

	/// Removes the item behind `handle`, returning it.
	pub fn remove(&mut self, handle: PointerHandle) -> Option<T> {
		let slot = self.slots.get_mut(handle.0)?;
		if matches!(slot, Slot::Free { .. }) {
			return None;
		}
		let Slot::Occupied(item) = std::mem::replace(slot, Slot::Free { next: self.free_head }) else {
			unreachable!();
		};
		self.free_head = Some(handle.0);
		self.count -= 1;
		Some(item)
	}

	/// Removes every item, keeping storage.
	pub fn drain(&mut self) -> Vec<T> {
		let mut out = Vec::with_capacity(self.count);
		let len = self.slots.len();
		self.free_head = None;
		for index in (0..len).rev() {
			if let Slot::Occupied(item) = std::mem::replace(&mut self.slots[index], Slot::Free { next: self.free_head }) {
				out.push(item);
			}
			self.free_head = Some(index);
		}
		self.count = 0;
		out
	}

	pub fn iter(&self) -> impl Iterator<Item = &T> {
		self.slots.iter().filter_map(|slot| match slot {
			Slot::Occupied(item) => Some(item),
			Slot::Free { .. } => None,
		})
	}
}
