use std::fmt;

use vigil_callback::Callback;
use vigil_object::Ref;

use crate::Tracked;

/// Event callbacks published by one provider.
pub struct ProviderEvents<T: Tracked, M> {
	/// A new item entered the live set.
	pub added: Callback<Ref<T>>,
	/// An item's mutable state changed; carries old and new snapshots.
	pub modified: Callback<M>,
	/// An item left the live set. The item is still valid during the call.
	pub removed: Callback<Ref<T>>,
	/// A cycle completed.
	pub updated: Callback<()>,
}

impl<T: Tracked, M> Default for ProviderEvents<T, M> {
	fn default() -> Self {
		Self {
			added: Callback::new(),
			modified: Callback::new(),
			removed: Callback::new(),
			updated: Callback::new(),
		}
	}
}

impl<T: Tracked, M> fmt::Debug for ProviderEvents<T, M> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ProviderEvents")
			.field("added", &self.added.len())
			.field("modified", &self.modified.len())
			.field("removed", &self.removed.len())
			.field("updated", &self.updated.len())
			.finish()
	}
}
