/// Execution classes used for worker scheduling and observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Periodic enumerate-diff-notify loops.
	Provider,
	/// Deferred object reclamation passes.
	Reclaim,
	/// Other short blocking jobs that may be delayed under pressure.
	Background,
}

impl TaskClass {
	/// Stable label used in log fields and worker records.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Provider => "provider",
			Self::Reclaim => "reclaim",
			Self::Background => "background",
		}
	}
}

impl std::fmt::Display for TaskClass {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}
