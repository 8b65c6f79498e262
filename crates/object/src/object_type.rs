use std::any::{Any, TypeId, type_name};
use std::borrow::Cow;
use std::fmt;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::header::ObjectBox;
use crate::{CreateFlags, ObjectError, Ref, TypeFlags};

pub(crate) type DeleteProcedure = Box<dyn Fn(&(dyn Any + Send + Sync), CreateFlags) + Send + Sync>;

/// Strong handle to an object type.
pub type TypeRef = Ref<ObjectType>;

/// Descriptor shared by every object of one kind.
///
/// Holds an optional delete procedure, run before an instance's payload is
/// dropped, and a live-instance counter.
pub struct ObjectType {
	name: Cow<'static, str>,
	flags: TypeFlags,
	payload: TypeId,
	payload_name: &'static str,
	delete: Option<DeleteProcedure>,
	live_objects: AtomicUsize,
}

static TYPE_OF_TYPES: OnceLock<TypeRef> = OnceLock::new();

/// Creates the type of types if it does not exist yet.
pub fn initialize() {
	ObjectType::type_of_types();
}

impl ObjectType {
	/// The self-typed descriptor every type object is an instance of.
	pub fn type_of_types() -> &'static TypeRef {
		TYPE_OF_TYPES.get_or_init(|| {
			let descriptor = Self::descriptor::<ObjectType>("Type".into(), TypeFlags::empty(), None);
			// Counts itself as an instance.
			descriptor.live_objects.store(1, Ordering::Relaxed);
			let Ok(ptr) = ObjectBox::allocate(descriptor, CreateFlags::RAISE_ON_FAIL, None, 1) else {
				unreachable!("RAISE_ON_FAIL escalates allocation failure");
			};
			tracing::debug!("object.type_of_types.init");
			// SAFETY: freshly allocated with one reference, owned by the static.
			unsafe { Ref::from_box(ptr) }
		})
	}

	/// Creates a type for payloads of `T` with no delete procedure.
	pub fn create<T: Send + Sync + 'static>(
		name: impl Into<Cow<'static, str>>,
		flags: TypeFlags,
	) -> Result<TypeRef, ObjectError> {
		Self::register(Self::descriptor::<T>(name.into(), flags, None))
	}

	/// Creates a type for payloads of `T` whose instances run `delete`
	/// before their payload is dropped.
	pub fn with_delete_procedure<T, F>(
		name: impl Into<Cow<'static, str>>,
		flags: TypeFlags,
		delete: F,
	) -> Result<TypeRef, ObjectError>
	where
		T: Send + Sync + 'static,
		F: Fn(&T, CreateFlags) + Send + Sync + 'static,
	{
		let delete: DeleteProcedure = Box::new(move |body, flags| {
			if let Some(body) = body.downcast_ref::<T>() {
				delete(body, flags);
			}
		});
		Self::register(Self::descriptor::<T>(name.into(), flags, Some(delete)))
	}

	fn descriptor<T: 'static>(name: Cow<'static, str>, flags: TypeFlags, delete: Option<DeleteProcedure>) -> Self {
		Self {
			name,
			flags,
			payload: TypeId::of::<T>(),
			payload_name: type_name::<T>(),
			delete,
			live_objects: AtomicUsize::new(0),
		}
	}

	fn register(descriptor: Self) -> Result<TypeRef, ObjectError> {
		let name = descriptor.name.clone();
		let ty = Ref::create(Self::type_of_types(), descriptor, CreateFlags::empty(), 0)?;
		tracing::debug!(object_type = %name, "object.type.create");
		Ok(ty)
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn flags(&self) -> TypeFlags {
		self.flags
	}

	/// Number of instances allocated and not yet freed.
	pub fn live_objects(&self) -> usize {
		self.live_objects.load(Ordering::Acquire)
	}

	pub(crate) fn check_payload<T: 'static>(&self) -> Result<(), ObjectError> {
		if self.payload == TypeId::of::<T>() {
			return Ok(());
		}
		Err(ObjectError::TypeMismatch {
			type_name: self.name.to_string(),
			expected: self.payload_name,
			found: type_name::<T>(),
		})
	}

	pub(crate) fn object_created(&self) {
		self.live_objects.fetch_add(1, Ordering::AcqRel);
	}

	pub(crate) fn object_freed(&self) {
		self.live_objects.fetch_sub(1, Ordering::AcqRel);
	}

	pub(crate) fn delete_procedure(&self) -> Option<&DeleteProcedure> {
		self.delete.as_ref()
	}
}

impl fmt::Debug for ObjectType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ObjectType")
			.field("name", &self.name)
			.field("flags", &self.flags)
			.field("payload", &self.payload_name)
			.field("live_objects", &self.live_objects())
			.finish_non_exhaustive()
	}
}
