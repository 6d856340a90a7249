use std::future::Future;
use std::sync::OnceLock;

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::TaskClass;

/// Runtime used when the owner thread is not inside a tokio context.
static FALLBACK: OnceLock<Runtime> = OnceLock::new();

/// Picks the ambient runtime, or the lazily built fallback.
///
/// Hosts that drive highlighting from a plain UI thread still get debounce
/// timers and analysis calls serviced.
fn handle() -> Handle {
	Handle::try_current().unwrap_or_else(|_| {
		FALLBACK
			.get_or_init(|| {
				Builder::new_multi_thread()
					.enable_all()
					.worker_threads(2)
					.thread_name("tint-worker")
					.build()
					.expect("failed to build tint-worker fallback runtime")
			})
			.handle()
			.clone()
	})
}

/// Spawns `fut` inside a `worker.task` span tagged with its class.
pub fn spawn<F>(class: TaskClass, fut: F) -> JoinHandle<F::Output>
where
	F: Future + Send + 'static,
	F::Output: Send + 'static,
{
	tracing::trace!(worker_class = class.as_str(), "worker.spawn");
	let span = tracing::trace_span!("worker.task", worker_class = class.as_str());
	handle().spawn(fut.instrument(span))
}
