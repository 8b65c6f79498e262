use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::task::JoinHandle;

use crate::TaskClass;

const DEFAULT_BLOCKING_THREADS: usize = 2;

static BLOCKING_THREADS: AtomicUsize = AtomicUsize::new(DEFAULT_BLOCKING_THREADS);
static POOL: OnceLock<tokio::runtime::Runtime> = OnceLock::new();

/// Sets the upper bound on blocking pool threads.
///
/// Only effective before the pool is first used. Returns `false` when the
/// pool already exists and the limit was ignored.
pub fn set_blocking_pool_limit(threads: usize) -> bool {
	BLOCKING_THREADS.store(threads.max(1), Ordering::Release);
	POOL.get().is_none()
}

/// Returns the configured blocking pool bound.
pub fn blocking_pool_limit() -> usize {
	BLOCKING_THREADS.load(Ordering::Acquire)
}

fn pool_handle() -> tokio::runtime::Handle {
	let runtime = POOL.get_or_init(|| {
		let threads = blocking_pool_limit();
		tracing::debug!(threads, "worker.pool.init");
		tokio::runtime::Builder::new_multi_thread()
			.worker_threads(1)
			.max_blocking_threads(threads)
			.thread_name("vigil-worker")
			.build()
			.unwrap_or_else(|err| panic!("failed to build vigil-worker blocking pool: {err}"))
	});
	runtime.handle().clone()
}

/// Runs blocking work on the bounded process-wide pool.
///
/// The pool is independent of any runtime the caller happens to be inside,
/// so work submitted here is never starved by a single-threaded test
/// runtime.
pub fn spawn_blocking<F, R>(class: TaskClass, f: F) -> JoinHandle<R>
where
	F: FnOnce() -> R + Send + 'static,
	R: Send + 'static,
{
	tracing::trace!(worker_class = class.as_str(), "worker.spawn_blocking");
	pool_handle().spawn_blocking(f)
}

/// Spawns a dedicated OS thread.
pub fn spawn_thread<F, R>(class: TaskClass, f: F) -> std::thread::JoinHandle<R>
where
	F: FnOnce() -> R + Send + 'static,
	R: Send + 'static,
{
	tracing::trace!(worker_class = class.as_str(), "worker.spawn_thread");
	std::thread::spawn(f)
}

/// Spawns a dedicated named OS thread.
pub fn spawn_named_thread<F, R>(class: TaskClass, name: impl Into<String>, f: F) -> std::io::Result<std::thread::JoinHandle<R>>
where
	F: FnOnce() -> R + Send + 'static,
	R: Send + 'static,
{
	let name = name.into();
	tracing::trace!(worker_class = class.as_str(), thread = %name, "worker.spawn_named_thread");
	std::thread::Builder::new().name(name).spawn(f)
}
