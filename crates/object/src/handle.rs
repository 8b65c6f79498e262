use std::fmt;
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::ops::Deref;
use std::ptr::NonNull;

use crate::header::{ObjectBox, ObjectHeader};
use crate::violation::violation;
use crate::{ContractViolation, CreateFlags, DeleteMode, ObjectError, TypeRef};

/// Owning handle to a reference-counted object.
///
/// Cloning adds a reference. Dropping releases it, freeing the object when
/// the count reaches zero (through the deferred path for types created with
/// [`crate::TypeFlags::DEFER_DELETE`]).
pub struct Ref<T: Send + Sync + 'static> {
	ptr: NonNull<ObjectBox<T>>,
	_marker: PhantomData<ObjectBox<T>>,
}

// SAFETY: the count is atomic and the payload is `Send + Sync`.
unsafe impl<T: Send + Sync + 'static> Send for Ref<T> {}
// SAFETY: as above.
unsafe impl<T: Send + Sync + 'static> Sync for Ref<T> {}

impl<T: Send + Sync + 'static> Ref<T> {
	/// Allocates an object of type `ty` holding `value`.
	///
	/// The count starts at `1 + additional`. The extra references are not
	/// represented by handles; reclaim them with [`Ref::from_raw`] or drop
	/// them with [`Ref::dereference_by`].
	pub fn create(ty: &TypeRef, value: T, flags: CreateFlags, additional: usize) -> Result<Self, ObjectError> {
		ty.check_payload::<T>()?;
		let Some(count) = isize::try_from(additional).ok().and_then(|n| n.checked_add(1)) else {
			violation(ContractViolation::CountOverflow);
		};

		let type_header = ty.header_ptr();
		let ptr = ObjectBox::allocate(value, flags, Some(type_header), count)?;
		ty.header().reference_by(1);
		ty.object_created();
		// SAFETY: freshly allocated and initialized.
		Ok(unsafe { Self::from_box(ptr) })
	}

	/// # Safety
	///
	/// `ptr` must be a live box and the caller must transfer one reference.
	pub(crate) unsafe fn from_box(ptr: NonNull<ObjectBox<T>>) -> Self {
		Self {
			ptr,
			_marker: PhantomData,
		}
	}

	pub(crate) fn header(&self) -> &ObjectHeader {
		// SAFETY: the handle keeps the box alive.
		unsafe { &self.ptr.as_ref().header }
	}

	pub(crate) fn header_ptr(&self) -> NonNull<ObjectHeader> {
		self.ptr.cast()
	}

	/// Current reference count. Only a snapshot under concurrency.
	pub fn ref_count(&self) -> isize {
		self.header().ref_count()
	}

	pub fn create_flags(&self) -> CreateFlags {
		self.header().flags()
	}

	/// Size of the object body in bytes.
	pub fn size(&self) -> usize {
		self.header().size()
	}

	/// Returns a strong handle to this object's type.
	pub fn object_type(&self) -> TypeRef {
		let ty = self.header().type_header();
		// SAFETY: the type is alive while this instance is; we add the
		// reference the new handle owns.
		unsafe {
			ty.as_ref().reference_by(1);
			Ref::from_box(ty.cast())
		}
	}

	/// Adds `delta` unowned references and returns the new count.
	///
	/// Each must later be released through [`Ref::dereference_by`] or
	/// [`Ref::from_raw`]. A negative delta is a contract violation.
	pub fn reference_by(&self, delta: isize) -> isize {
		self.header().reference_by(delta)
	}

	/// Releases `delta` references, one of which is this handle, and
	/// returns the new count.
	///
	/// # Safety
	///
	/// The caller must own the `delta - 1` references beyond this handle,
	/// typically created by [`Ref::reference_by`] or `additional` at
	/// creation.
	pub unsafe fn dereference_by(self, delta: isize, mode: DeleteMode) -> isize {
		let this = ManuallyDrop::new(self);
		// SAFETY: forwarded from the caller.
		unsafe { ObjectHeader::release(this.header_ptr(), delta, mode) }
	}

	/// Releases this handle, queueing the object on the deferred free list
	/// if the count reached zero. Returns whether it did.
	pub fn dereference_defer(self) -> bool {
		// SAFETY: releases exactly the reference this handle owns.
		unsafe { self.dereference_by(1, DeleteMode::Deferred) == 0 }
	}

	pub fn ptr_eq(this: &Self, other: &Self) -> bool {
		this.ptr == other.ptr
	}

	/// Non-owning pointer to this object.
	pub fn as_ptr(&self) -> ObjectPtr<T> {
		ObjectPtr { ptr: self.ptr }
	}

	/// Converts the handle into a raw pointer without releasing it.
	pub fn into_raw(self) -> ObjectPtr<T> {
		ManuallyDrop::new(self).as_ptr()
	}

	/// Takes ownership of one reference held through `ptr`.
	///
	/// # Safety
	///
	/// The caller must own a reference not represented by another handle.
	pub unsafe fn from_raw(ptr: ObjectPtr<T>) -> Self {
		// SAFETY: forwarded from the caller.
		unsafe { Self::from_box(ptr.ptr) }
	}

	pub(crate) fn into_erased(self) -> ErasedRef {
		ErasedRef {
			header: ManuallyDrop::new(self).header_ptr(),
		}
	}
}

impl<T: Send + Sync + 'static> Clone for Ref<T> {
	fn clone(&self) -> Self {
		self.header().reference_by(1);
		// SAFETY: the reference added above is owned by the clone.
		unsafe { Self::from_box(self.ptr) }
	}
}

impl<T: Send + Sync + 'static> Drop for Ref<T> {
	fn drop(&mut self) {
		let mode = self.header().default_delete_mode();
		// SAFETY: releases the reference this handle owns.
		unsafe { ObjectHeader::release(self.header_ptr(), 1, mode) };
	}
}

impl<T: Send + Sync + 'static> Deref for Ref<T> {
	type Target = T;

	fn deref(&self) -> &T {
		// SAFETY: the handle keeps the body alive.
		unsafe { &self.ptr.as_ref().body }
	}
}

impl<T: Send + Sync + fmt::Debug + 'static> fmt::Debug for Ref<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(&**self, f)
	}
}

/// Non-owning pointer to an object.
///
/// Carries no reference; every access is `unsafe` and relies on an
/// external guarantee that the object has not been freed.
pub struct ObjectPtr<T: Send + Sync + 'static> {
	ptr: NonNull<ObjectBox<T>>,
}

// SAFETY: the pointer is only an address; dereferencing is `unsafe`.
unsafe impl<T: Send + Sync + 'static> Send for ObjectPtr<T> {}
// SAFETY: as above.
unsafe impl<T: Send + Sync + 'static> Sync for ObjectPtr<T> {}

impl<T: Send + Sync + 'static> Clone for ObjectPtr<T> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<T: Send + Sync + 'static> Copy for ObjectPtr<T> {}

impl<T: Send + Sync + 'static> PartialEq for ObjectPtr<T> {
	fn eq(&self, other: &Self) -> bool {
		self.ptr == other.ptr
	}
}

impl<T: Send + Sync + 'static> Eq for ObjectPtr<T> {}

impl<T: Send + Sync + 'static> fmt::Debug for ObjectPtr<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "ObjectPtr({:p})", self.ptr)
	}
}

impl<T: Send + Sync + 'static> ObjectPtr<T> {
	/// References the object unless its count already reached zero.
	///
	/// Use when the pointer is published under a lock that the type's
	/// delete procedure also takes: holding the lock keeps the storage valid
	/// while a zero count means destruction has begun.
	///
	/// # Safety
	///
	/// The object's storage must not have been freed yet.
	pub unsafe fn reference_if_live(self) -> Option<Ref<T>> {
		// SAFETY: storage is valid per the caller.
		let header = unsafe { &self.ptr.as_ref().header };
		// SAFETY: the reference just taken is owned by the new handle.
		header.try_reference().then(|| unsafe { Ref::from_box(self.ptr) })
	}

	/// Borrows the body.
	///
	/// # Safety
	///
	/// The object must stay alive for `'a`.
	pub unsafe fn as_ref<'a>(self) -> &'a T {
		// SAFETY: forwarded from the caller.
		unsafe { &(*self.ptr.as_ptr()).body }
	}
}

/// Type-erased owned reference, released when dropped.
pub(crate) struct ErasedRef {
	header: NonNull<ObjectHeader>,
}

impl Drop for ErasedRef {
	fn drop(&mut self) {
		// SAFETY: owns one reference; the header is alive until released.
		unsafe {
			let mode = self.header.as_ref().default_delete_mode();
			ObjectHeader::release(self.header, 1, mode);
		}
	}
}
