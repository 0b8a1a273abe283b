use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};

use super::Task;

/// The execution context that receives every completion and event.
///
/// Stands in for the UI thread: the core never calls a delegate or completion
/// directly, it posts a task here.
pub trait MainContext: Send + Sync {
    fn post(&self, task: Task);
}

/// Channel-backed [`MainContext`] drained by the thread that created it.
///
/// Tasks run in the order they were posted. Draining from any thread other
/// than the owner is a programming error and panics in debug builds.
pub struct MainQueue {
    sender: Sender<Task>,
    receiver: Receiver<Task>,
    owner: thread::ThreadId,
}

impl MainQueue {
    /// Create a queue owned by the calling thread.
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            owner: thread::current().id(),
        }
    }

    /// Run every task that is already waiting. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        self.assert_owner();
        let mut ran = 0;
        while let Ok(task) = self.receiver.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// Wait up to `timeout` for one task and run it.
    pub fn run_next(&self, timeout: Duration) -> bool {
        self.assert_owner();
        match self.receiver.recv_timeout(timeout) {
            Ok(task) => {
                task();
                true
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Run tasks as they arrive until `done` returns true or `timeout` elapses.
    ///
    /// Returns the final value of `done`.
    pub fn run_until<F>(&self, timeout: Duration, mut done: F) -> bool
    where
        F: FnMut() -> bool,
    {
        let deadline = Instant::now() + timeout;
        while !done() {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            self.run_next(deadline - now);
        }
        true
    }

    /// Keep running tasks until none arrives for `quiet`.
    pub fn run_for_quiet(&self, quiet: Duration) -> usize {
        let mut ran = 0;
        while self.run_next(quiet) {
            ran += 1;
        }
        ran
    }

    pub fn is_owner_thread(&self) -> bool {
        thread::current().id() == self.owner
    }

    fn assert_owner(&self) {
        debug_assert!(self.is_owner_thread(), "main queue drained off its owner thread");
    }
}

impl Default for MainQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MainContext for MainQueue {
    fn post(&self, task: Task) {
        // The receiver lives in `self`, so the channel can't be disconnected here.
        let _ = self.sender.send(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use parking_lot::Mutex;

    #[test]
    fn posted_tasks_run_on_owner_in_order() {
        let main = Arc::new(MainQueue::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let owner = thread::current().id();

        let handles: Vec<_> = (0..3)
            .map(|i| {
                let main = Arc::clone(&main);
                let seen = Arc::clone(&seen);
                thread::spawn(move || {
                    main.post(Box::new(move || {
                        assert_eq!(thread::current().id(), owner);
                        seen.lock().push(i);
                    }));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(main.run_pending(), 3);
        let mut seen = seen.lock().clone();
        seen.sort();
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[test]
    fn run_until_times_out() {
        let main = MainQueue::new();
        assert!(!main.run_until(Duration::from_millis(20), || false));
    }

    #[test]
    fn run_until_stops_when_done() {
        let main = Arc::new(MainQueue::new());
        let flag = Arc::new(Mutex::new(false));

        let poster = Arc::clone(&main);
        let inner = Arc::clone(&flag);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            poster.post(Box::new(move || *inner.lock() = true));
        });

        assert!(main.run_until(Duration::from_secs(5), || *flag.lock()));
    }
}
