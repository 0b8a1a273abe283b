//! Execution contexts: labelled serial worker queues and the UI main context.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub mod main_queue;
pub mod serial_queue;

use main_queue::MainContext;

/// A unit of work handed to a queue.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Post `f` to `main`; it runs only if `alive` is still set at that point.
///
/// Components clear their flag on drop, so nothing queued before the drop can
/// call back into a caller that has already torn the component down.
pub(crate) fn post_if_alive<F>(main: &Arc<dyn MainContext>, alive: &Arc<AtomicBool>, f: F)
where
    F: FnOnce() + Send + 'static,
{
    let alive = Arc::clone(alive);
    main.post(Box::new(move || {
        if alive.load(Ordering::Acquire) {
            f();
        }
    }));
}
