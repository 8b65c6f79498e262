use std::fmt;
use std::sync::OnceLock;

use parking_lot::{Mutex, RwLock};
use strum::{Display, EnumString, IntoStaticStr};
use vigil_object::{CreateFlags, ObjectError, ObjectType, Ref, TypeFlags, TypeRef};
use vigil_primitives::{PointerList, hash_u32};

use crate::Tracked;
use crate::service::ServiceItem;

/// Coarse run state of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, IntoStaticStr)]
#[strum(ascii_case_insensitive)]
pub enum ProcessStatus {
	Running,
	Sleeping,
	Idle,
	Stopped,
	Zombie,
	Dead,
	#[default]
	Unknown,
}

/// Mutable part of a tracked process.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProcessStats {
	pub status: ProcessStatus,
	pub memory_bytes: u64,
	/// Percentage of one core.
	pub cpu_usage: f32,
}

/// One raw process as enumerated by a [`super::ProcessSource`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRecord {
	pub pid: u32,
	pub parent_pid: Option<u32>,
	pub name: String,
	pub status: ProcessStatus,
	pub memory_bytes: u64,
	pub cpu_usage: f32,
}

impl ProcessRecord {
	pub fn stats(&self) -> ProcessStats {
		ProcessStats {
			status: self.status,
			memory_bytes: self.memory_bytes,
			cpu_usage: self.cpu_usage,
		}
	}
}

static PROCESS_ITEM_TYPE: OnceLock<TypeRef> = OnceLock::new();

fn process_item_type() -> Result<&'static TypeRef, ObjectError> {
	if let Some(ty) = PROCESS_ITEM_TYPE.get() {
		return Ok(ty);
	}
	let ty = ObjectType::with_delete_procedure::<ProcessItem, _>("ProcessItem", TypeFlags::DEFER_DELETE, |item, _| {
		tracing::trace!(pid = item.pid, "process.item.delete");
	})?;
	Ok(PROCESS_ITEM_TYPE.get_or_init(|| ty))
}

/// A tracked process and the services it hosts.
pub struct ProcessItem {
	pid: u32,
	parent_pid: Option<u32>,
	name: String,
	run_id: u64,
	stats: RwLock<ProcessStats>,
	services: Mutex<PointerList<Ref<ServiceItem>>>,
}

impl ProcessItem {
	pub fn create(record: &ProcessRecord, run_id: u64) -> Result<Ref<Self>, ObjectError> {
		let item = Self {
			pid: record.pid,
			parent_pid: record.parent_pid,
			name: record.name.clone(),
			run_id,
			stats: RwLock::new(record.stats()),
			services: Mutex::new(PointerList::new()),
		};
		Ref::create(process_item_type()?, item, CreateFlags::empty(), 0)
	}

	pub fn pid(&self) -> u32 {
		self.pid
	}

	pub fn parent_pid(&self) -> Option<u32> {
		self.parent_pid
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn run_id(&self) -> u64 {
		self.run_id
	}

	pub fn stats(&self) -> ProcessStats {
		*self.stats.read()
	}

	pub(crate) fn replace_stats(&self, stats: ProcessStats) -> ProcessStats {
		std::mem::replace(&mut *self.stats.write(), stats)
	}

	/// Links `service` to this process. Returns `false` if already linked.
	pub fn add_service(&self, service: &Ref<ServiceItem>) -> bool {
		let mut services = self.services.lock();
		if services.find(|s| Ref::ptr_eq(s, service)).is_some() {
			return false;
		}
		services.add(service.clone());
		true
	}

	/// Unlinks `service`. Returns `false` if it was not linked.
	pub fn remove_service(&self, service: &Ref<ServiceItem>) -> bool {
		let removed = {
			let mut services = self.services.lock();
			services
				.find(|s| Ref::ptr_eq(s, service))
				.and_then(|handle| services.remove(handle))
		};
		removed.is_some()
	}

	/// References every linked service.
	pub fn services(&self) -> Vec<Ref<ServiceItem>> {
		self.services.lock().iter().cloned().collect()
	}

	pub fn service_count(&self) -> usize {
		self.services.lock().len()
	}

	/// Unlinks and returns every linked service.
	pub(crate) fn take_services(&self) -> Vec<Ref<ServiceItem>> {
		self.services.lock().drain()
	}
}

impl Tracked for ProcessItem {
	type Key = u32;

	fn key(&self) -> &u32 {
		&self.pid
	}

	fn hash_key(key: &u32) -> u32 {
		hash_u32(*key)
	}

	fn key_eq(a: &u32, b: &u32) -> bool {
		a == b
	}
}

impl fmt::Debug for ProcessItem {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ProcessItem")
			.field("pid", &self.pid)
			.field("parent_pid", &self.parent_pid)
			.field("name", &self.name)
			.field("run_id", &self.run_id)
			.field("stats", &self.stats())
			.field("services", &self.service_count())
			.finish()
	}
}

/// Payload of the process "modified" event.
#[derive(Debug, Clone)]
pub struct ProcessModified {
	pub process: Ref<ProcessItem>,
	pub old: ProcessStats,
	pub new: ProcessStats,
}
