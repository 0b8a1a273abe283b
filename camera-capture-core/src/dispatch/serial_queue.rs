use std::panic::{self, AssertUnwindSafe};
use std::thread;

use crossbeam_channel::{unbounded, Sender};

use super::Task;
use crate::models::error::CaptureError;

/// A labelled worker thread that runs tasks one at a time, in submission order.
///
/// Dropping the queue closes its mailbox. Tasks already queued still run; the
/// thread exits once the mailbox is drained. Drop does not join the thread,
/// so it never blocks the UI on an in-flight task.
pub struct SerialQueue {
    label: String,
    sender: Option<Sender<Task>>,
    thread_id: thread::ThreadId,
}

impl SerialQueue {
    pub fn new(label: &str) -> Result<Self, CaptureError> {
        let (sender, receiver) = unbounded::<Task>();
        let thread_label = label.to_string();

        let handle = thread::Builder::new()
            .name(label.into())
            .spawn(move || {
                for task in receiver.iter() {
                    if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                        log::error!("Task on queue {} panicked", thread_label);
                    }
                }
                log::debug!("Queue {} drained", thread_label);
            })
            .map_err(|e| CaptureError::Unknown(format!("failed to spawn queue {}: {}", label, e)))?;

        Ok(Self {
            label: label.to_string(),
            sender: Some(sender),
            thread_id: handle.thread().id(),
        })
    }

    /// Enqueue `task` behind everything already submitted.
    pub fn dispatch<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let Some(sender) = &self.sender else {
            return;
        };
        if sender.send(Box::new(task)).is_err() {
            log::warn!("Queue {} is gone, dropping task", self.label);
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the caller is running on this queue's worker thread.
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.thread_id
    }
}

impl Drop for SerialQueue {
    fn drop(&mut self) {
        self.sender.take();
    }
}
