use std::fmt;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use vigil_object::{CreateFlags, ObjectError, ObjectType, Ref, TypeFlags, TypeRef};
use vigil_primitives::{hash_str_ignore_case, str_eq_ignore_case};

use super::types::{ServiceChange, ServiceConfig, ServiceRecord, ServiceState, ServiceStatus};
use crate::Tracked;

static SERVICE_ITEM_TYPE: OnceLock<TypeRef> = OnceLock::new();

fn service_item_type() -> Result<&'static TypeRef, ObjectError> {
	if let Some(ty) = SERVICE_ITEM_TYPE.get() {
		return Ok(ty);
	}
	let ty = ObjectType::with_delete_procedure::<ServiceItem, _>("ServiceItem", TypeFlags::DEFER_DELETE, |item, _| {
		tracing::trace!(service = %item.name, "service.item.delete");
	})?;
	Ok(SERVICE_ITEM_TYPE.get_or_init(|| ty))
}

/// A tracked service.
///
/// Name and display name are fixed at creation; status and configuration
/// are updated in place by the service provider.
pub struct ServiceItem {
	name: String,
	display_name: String,
	run_id: u64,
	status: RwLock<ServiceStatus>,
	config: RwLock<Option<ServiceConfig>>,
	/// Hosted by a process that is not tracked yet.
	pending_process: AtomicBool,
	needs_config_update: AtomicBool,
}

impl ServiceItem {
	/// Allocates a service item object for `record`.
	pub fn create(record: &ServiceRecord, run_id: u64) -> Result<Ref<Self>, ObjectError> {
		let item = Self {
			name: record.name.clone(),
			display_name: record.display_name.clone(),
			run_id,
			status: RwLock::new(record.status()),
			config: RwLock::new(None),
			pending_process: AtomicBool::new(false),
			needs_config_update: AtomicBool::new(false),
		};
		Ref::create(service_item_type()?, item, CreateFlags::empty(), 0)
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn display_name(&self) -> &str {
		&self.display_name
	}

	/// Run id of the cycle that created this item.
	pub fn run_id(&self) -> u64 {
		self.run_id
	}

	pub fn status(&self) -> ServiceStatus {
		*self.status.read()
	}

	pub fn state(&self) -> ServiceState {
		self.status.read().state
	}

	pub fn process_id(&self) -> u32 {
		self.status.read().process_id
	}

	pub fn config(&self) -> Option<ServiceConfig> {
		*self.config.read()
	}

	pub fn is_pending_process(&self) -> bool {
		self.pending_process.load(Ordering::Acquire)
	}

	/// Forces a configuration refresh (and a "modified" event) next cycle.
	pub fn mark_needs_config_update(&self) {
		self.needs_config_update.store(true, Ordering::Release);
	}

	pub fn needs_config_update(&self) -> bool {
		self.needs_config_update.load(Ordering::Acquire)
	}

	pub(crate) fn replace_status(&self, status: ServiceStatus) -> ServiceStatus {
		std::mem::replace(&mut *self.status.write(), status)
	}

	pub(crate) fn set_config(&self, config: Option<ServiceConfig>) {
		*self.config.write() = config;
	}

	pub(crate) fn set_pending_process(&self, pending: bool) {
		self.pending_process.store(pending, Ordering::Release);
	}

	/// Clears the pending flag, returning whether it was set.
	pub(crate) fn take_pending_process(&self) -> bool {
		self.pending_process.swap(false, Ordering::AcqRel)
	}

	pub(crate) fn take_needs_config_update(&self) -> bool {
		self.needs_config_update.swap(false, Ordering::AcqRel)
	}
}

impl Tracked for ServiceItem {
	type Key = str;

	fn key(&self) -> &str {
		&self.name
	}

	fn hash_key(key: &str) -> u32 {
		hash_str_ignore_case(key)
	}

	fn key_eq(a: &str, b: &str) -> bool {
		str_eq_ignore_case(a, b)
	}
}

impl fmt::Debug for ServiceItem {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ServiceItem")
			.field("name", &self.name)
			.field("display_name", &self.display_name)
			.field("run_id", &self.run_id)
			.field("status", &self.status())
			.field("config", &self.config())
			.field("pending_process", &self.is_pending_process())
			.finish()
	}
}

/// Payload of the service "modified" event.
#[derive(Debug, Clone)]
pub struct ServiceModified {
	pub service: Ref<ServiceItem>,
	pub old: ServiceStatus,
	pub new: ServiceStatus,
}

impl ServiceModified {
	pub fn change(&self) -> Option<ServiceChange> {
		ServiceChange::between(self.old.state, self.new.state)
	}
}
