/// Execution classes used for worker scheduling and observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Short timer tasks that wait out a debounce window.
	Debounce,
	/// Calls into an external analysis service whose latency is unbounded.
	Analysis,
}

impl TaskClass {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Debounce => "debounce",
			Self::Analysis => "analysis",
		}
	}
}
