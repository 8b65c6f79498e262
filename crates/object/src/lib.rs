//! Object lifetime runtime.
//!
//! Objects are heap values preceded by a hidden header carrying an atomic
//! reference count, creation flags and a reference to their [`ObjectType`].
//! Types are objects themselves; the distinguished type of types is its own
//! type. [`Ref`] is the owning handle: cloning references, dropping
//! dereferences. A reference count reaching zero runs the type's delete
//! procedure and frees storage, either inline or through the process-wide
//! deferred free list drained on the `vigil-worker` blocking pool.
//!
//! [`AutoPool`] provides thread-scoped batch release for temporaries.

mod autopool;
mod deferred;
mod error;
mod handle;
mod header;
mod object_type;
mod violation;

pub use autopool::{AutoPool, autorelease, pool_depth};
pub use deferred::{deferred_pending, flush_deferred};
pub use error::{ContractViolation, ObjectError};
pub use handle::{ObjectPtr, Ref};
pub use object_type::{ObjectType, TypeRef, initialize};

use bitflags::bitflags;

bitflags! {
	/// Flags recorded on an object at creation.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct CreateFlags: u32 {
		/// Escalate allocation failure to the global allocation error handler.
		const RAISE_ON_FAIL = 0x1;
	}
}

bitflags! {
	/// Flags describing an object type.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct TypeFlags: u32 {
		/// Dropping a handle of this type releases through the deferred path.
		const DEFER_DELETE = 0x1;
	}
}

/// How an object reaching zero references is freed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
	/// Free on the releasing thread.
	Immediate,
	/// Queue on the deferred free list for a background pass.
	Deferred,
}

impl DeleteMode {
	pub(crate) fn for_type(flags: TypeFlags) -> Self {
		if flags.contains(TypeFlags::DEFER_DELETE) {
			Self::Deferred
		} else {
			Self::Immediate
		}
	}
}
