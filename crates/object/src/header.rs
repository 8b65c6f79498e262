use std::alloc::{Layout, alloc, dealloc, handle_alloc_error};
use std::any::Any;
use std::ptr::{self, NonNull};
use std::sync::atomic::{self, AtomicIsize, AtomicPtr, Ordering};

use crate::violation::violation;
use crate::{ContractViolation, CreateFlags, DeleteMode, ObjectError, ObjectType};

type AnyBody = dyn Any + Send + Sync;

/// Per-payload operations, so headers can be freed without knowing `T`.
pub(crate) struct HeaderVTable {
	body: unsafe fn(NonNull<ObjectHeader>) -> *const AnyBody,
	destroy: unsafe fn(NonNull<ObjectHeader>),
}

#[repr(C)]
pub(crate) struct ObjectHeader {
	ref_count: AtomicIsize,
	flags: CreateFlags,
	size: usize,
	/// Header of the type object. Points at itself for the type of types.
	ty: NonNull<ObjectHeader>,
	/// Link in the deferred free list.
	pub(crate) next_to_free: AtomicPtr<ObjectHeader>,
	vtable: &'static HeaderVTable,
}

#[repr(C)]
pub(crate) struct ObjectBox<T> {
	pub(crate) header: ObjectHeader,
	pub(crate) body: T,
}

impl<T: Send + Sync + 'static> ObjectBox<T> {
	const VTABLE: HeaderVTable = HeaderVTable {
		body: Self::body_any,
		destroy: Self::destroy,
	};

	/// Allocates a box with `ref_count` initial references.
	///
	/// `ty` of `None` makes the object its own type. The caller accounts
	/// for the reference the object holds on `ty`.
	pub(crate) fn allocate(
		value: T,
		flags: CreateFlags,
		ty: Option<NonNull<ObjectHeader>>,
		ref_count: isize,
	) -> Result<NonNull<Self>, ObjectError> {
		let layout = Layout::new::<Self>();
		// SAFETY: the layout is never zero-sized since it contains the header.
		let raw = unsafe { alloc(layout) }.cast::<Self>();
		let Some(ptr) = NonNull::new(raw) else {
			if flags.contains(CreateFlags::RAISE_ON_FAIL) {
				handle_alloc_error(layout);
			}
			return Err(ObjectError::AllocationFailed { size: layout.size() });
		};

		let header = ObjectHeader {
			ref_count: AtomicIsize::new(ref_count),
			flags,
			size: size_of::<T>(),
			ty: ty.unwrap_or(ptr.cast()),
			next_to_free: AtomicPtr::new(ptr::null_mut()),
			vtable: &Self::VTABLE,
		};
		// SAFETY: freshly allocated with the layout of `Self`.
		unsafe { ptr.as_ptr().write(ObjectBox { header, body: value }) };
		Ok(ptr)
	}

	unsafe fn body_any(header: NonNull<ObjectHeader>) -> *const AnyBody {
		let ptr = header.cast::<Self>().as_ptr();
		// SAFETY: the header is the first field of a live `ObjectBox<T>`.
		unsafe { &raw const (*ptr).body as *const AnyBody }
	}

	unsafe fn destroy(header: NonNull<ObjectHeader>) {
		let ptr = header.cast::<Self>().as_ptr();
		// SAFETY: called once, after the last reference is gone.
		unsafe {
			ptr::drop_in_place(ptr);
			dealloc(ptr.cast(), Layout::new::<Self>());
		}
	}
}

impl ObjectHeader {
	pub(crate) fn ref_count(&self) -> isize {
		self.ref_count.load(Ordering::Acquire)
	}

	pub(crate) fn flags(&self) -> CreateFlags {
		self.flags
	}

	pub(crate) fn size(&self) -> usize {
		self.size
	}

	pub(crate) fn type_header(&self) -> NonNull<ObjectHeader> {
		self.ty
	}

	/// Body of this object's type.
	pub(crate) fn object_type(&self) -> &ObjectType {
		// SAFETY: every object holds a reference on its type, so the type
		// outlives `self`.
		unsafe { &(*self.ty.cast::<ObjectBox<ObjectType>>().as_ptr()).body }
	}

	pub(crate) fn default_delete_mode(&self) -> DeleteMode {
		DeleteMode::for_type(self.object_type().flags())
	}

	/// Adds `delta` references and returns the new count.
	pub(crate) fn reference_by(&self, delta: isize) -> isize {
		if delta < 0 {
			violation(ContractViolation::NegativeDelta { delta });
		}
		let old = self.ref_count.fetch_add(delta, Ordering::Relaxed);
		match old.checked_add(delta) {
			Some(new) => new,
			None => violation(ContractViolation::CountOverflow),
		}
	}

	/// Adds one reference unless the count already reached zero.
	pub(crate) fn try_reference(&self) -> bool {
		let mut current = self.ref_count.load(Ordering::Relaxed);
		loop {
			if current <= 0 {
				return false;
			}
			match self.ref_count.compare_exchange_weak(
				current,
				current + 1,
				Ordering::Acquire,
				Ordering::Relaxed,
			) {
				Ok(_) => return true,
				Err(actual) => current = actual,
			}
		}
	}

	/// Drops `delta` references, freeing the object on the transition to zero.
	///
	/// # Safety
	///
	/// The caller must own `delta` references to `header` and must not touch
	/// the object afterwards unless it still owns one.
	pub(crate) unsafe fn release(header: NonNull<Self>, delta: isize, mode: DeleteMode) -> isize {
		if delta < 1 {
			violation(ContractViolation::InvalidDelta { delta });
		}
		// SAFETY: the caller owns at least one reference.
		let old = unsafe { header.as_ref() }.ref_count.fetch_sub(delta, Ordering::Release);
		let new = old - delta;
		if new == 0 {
			atomic::fence(Ordering::Acquire);
			match mode {
				// SAFETY: this decrement observed the transition to zero.
				DeleteMode::Immediate => unsafe { free_object(header) },
				DeleteMode::Deferred => crate::deferred::defer_free(header),
			}
		} else if new < 0 {
			violation(ContractViolation::CountBelowZero { count: new });
		}
		new
	}
}

/// Runs the delete procedure, drops the payload and releases storage.
///
/// # Safety
///
/// `header` must have reached zero references and be freed exactly once.
pub(crate) unsafe fn free_object(header: NonNull<ObjectHeader>) {
	// SAFETY: storage is valid until `destroy` below.
	let (ty_header, vtable, flags) = unsafe {
		let h = header.as_ref();
		(h.ty, h.vtable, h.flags)
	};
	let self_typed = ty_header == header;

	{
		// SAFETY: the type outlives its instances.
		let ty = unsafe { &(*ty_header.cast::<ObjectBox<ObjectType>>().as_ptr()).body };
		ty.object_freed();
		if let Some(delete) = ty.delete_procedure() {
			// SAFETY: body is still initialized.
			let body = unsafe { &*(vtable.body)(header) };
			delete(body, flags);
		}
	}

	// SAFETY: last use of this object.
	unsafe { (vtable.destroy)(header) };

	if !self_typed {
		// SAFETY: the instance's reference on its type is released here.
		unsafe { ObjectHeader::release(ty_header, 1, DeleteMode::Immediate) };
	}
}
