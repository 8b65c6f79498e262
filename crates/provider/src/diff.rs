//! Generic enumerate-diff-notify step.
//!
//! [`synchronize`] brings a [`LiveSet`] in line with one enumeration batch.
//! Everything kind-specific (construction, in-place update, cross-reference
//! maintenance) is delegated to a [`SyncPolicy`].

use vigil_hashtable::Hashtable;
use vigil_object::{AutoPool, Ref};

use crate::{LiveSet, ProviderError, ProviderEvents, SourceError, Tracked};

/// Per-cycle state handed to policy hooks.
pub struct CycleContext<'a> {
	/// Pool drained when the cycle ends; temporaries may be parked here.
	pub pool: &'a AutoPool,
	/// Run id of the cycle in progress. Stamped on items created by it.
	pub run_id: u64,
}

/// Counts of the events fired by one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
	pub added: usize,
	pub modified: usize,
	pub removed: usize,
}

impl CycleReport {
	pub fn is_quiet(&self) -> bool {
		self.added == 0 && self.modified == 0 && self.removed == 0
	}
}

/// Kind-specific half of a provider.
pub trait SyncPolicy: Send + Sync + 'static {
	type Item: Tracked;
	type Record;
	/// Payload of the "modified" event.
	type Modified;

	/// Fetches one batch of raw records from the source.
	fn enumerate(&self) -> Result<Vec<Self::Record>, SourceError>;

	fn record_key(record: &Self::Record) -> &<Self::Item as Tracked>::Key;

	/// Builds a new item for a record not yet tracked.
	fn create(&self, record: &Self::Record, cx: &CycleContext<'_>) -> Result<Ref<Self::Item>, ProviderError>;

	/// Establishes cross-references for a new item before it is published.
	fn attach(&self, _item: &Ref<Self::Item>, _cx: &CycleContext<'_>) {}

	/// Called once a new item is in the live set, before "added" fires.
	fn added(&self, _item: &Ref<Self::Item>, _cx: &CycleContext<'_>) {}

	/// Tears down cross-references of an item about to be removed.
	fn detach(&self, _item: &Ref<Self::Item>, _cx: &CycleContext<'_>) {}

	/// Applies `record` to a tracked item, returning the "modified" payload
	/// if anything changed.
	fn update(&self, item: &Ref<Self::Item>, record: &Self::Record, cx: &CycleContext<'_>) -> Option<Self::Modified>;
}

/// Diffs `records` against `set`, firing events as it goes.
///
/// Removals are processed (and their events fired) before any addition or
/// modification. An error abandons the rest of the cycle; changes already
/// applied stay applied.
pub fn synchronize<P: SyncPolicy>(
	policy: &P,
	set: &LiveSet<P::Item>,
	events: &ProviderEvents<P::Item, P::Modified>,
	records: &[P::Record],
	cx: &CycleContext<'_>,
) -> Result<CycleReport, ProviderError> {
	let mut report = CycleReport::default();

	let mut present: Hashtable<&<P::Item as Tracked>::Key> = Hashtable::new(
		|key| <P::Item as Tracked>::hash_key(key),
		|a, b| <P::Item as Tracked>::key_eq(a, b),
		records.len(),
	);
	for record in records {
		present.add(P::record_key(record))?;
	}

	let stale = set.select(|item| {
		let key = item.key();
		present
			.find_with(<P::Item as Tracked>::hash_key(key), |candidate| {
				<P::Item as Tracked>::key_eq(candidate, key)
			})
			.is_none()
	});
	for item in stale {
		policy.detach(&item, cx);
		events.removed.invoke(&item);
		if let Some(owned) = set.remove(item.key()) {
			owned.dereference_defer();
		}
		cx.pool.track(item);
		report.removed += 1;
	}

	for record in records {
		let key = P::record_key(record);
		if let Some(item) = set.lookup(key) {
			if let Some(modified) = policy.update(&item, record, cx) {
				events.modified.invoke(&modified);
				report.modified += 1;
			}
			continue;
		}

		let item = policy.create(record, cx)?;
		policy.attach(&item, cx);
		if !set.insert(item.clone())? {
			policy.detach(&item, cx);
			continue;
		}
		policy.added(&item, cx);
		events.added.invoke(&item);
		report.added += 1;
	}

	Ok(report)
}
