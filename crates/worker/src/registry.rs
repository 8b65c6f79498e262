use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::TaskClass;

/// Status snapshot for one periodic job running on a worker thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerRecord {
	pub name: String,
	pub class: TaskClass,
	pub rounds: u64,
	pub failures: u64,
	pub last_error: Option<String>,
}

impl WorkerRecord {
	/// Creates a record with no completed rounds.
	pub fn new(name: impl Into<String>, class: TaskClass) -> Self {
		Self {
			name: name.into(),
			class,
			rounds: 0,
			failures: 0,
			last_error: None,
		}
	}
}

/// In-memory worker registry for status snapshots.
#[derive(Debug, Default, Clone)]
pub struct WorkerRegistry {
	inner: Arc<RwLock<HashMap<String, WorkerRecord>>>,
}

impl WorkerRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Upserts one record.
	pub fn upsert(&self, record: WorkerRecord) {
		if let Ok(mut guard) = self.inner.write() {
			guard.insert(record.name.clone(), record);
		}
	}

	/// Applies `f` to the named record, creating it first when missing.
	pub fn update(&self, name: &str, class: TaskClass, f: impl FnOnce(&mut WorkerRecord)) {
		if let Ok(mut guard) = self.inner.write() {
			let record = guard.entry(name.to_owned()).or_insert_with(|| WorkerRecord::new(name, class));
			f(record);
		}
	}

	/// Removes one record.
	pub fn remove(&self, name: &str) {
		if let Ok(mut guard) = self.inner.write() {
			guard.remove(name);
		}
	}

	/// Returns one record by name.
	pub fn get(&self, name: &str) -> Option<WorkerRecord> {
		self.inner.read().ok()?.get(name).cloned()
	}

	/// Returns snapshots sorted by name.
	pub fn snapshots(&self) -> Vec<WorkerRecord> {
		let Ok(guard) = self.inner.read() else {
			return Vec::new();
		};
		let mut records: Vec<_> = guard.values().cloned().collect();
		records.sort_by(|a, b| a.name.cmp(&b.name));
		records
	}
}
