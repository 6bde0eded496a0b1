//! Tokio-backed host timers.
//!
//! Each scheduled item is a spawned sleep that posts an event back onto the
//! runtime channel. Abort handles are kept so a cancel stops the sleep before
//! it fires; a firing that races a cancel is dropped by the receiver's id check.

use core_events::{Event, TaskId, TimerId};
use core_page::PageTask;
use core_session::TimerHost;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tokio::task::AbortHandle;
use tracing::trace;

fn spawn_delayed(tx: &Sender<Event>, after: Duration, event: Event) -> AbortHandle {
    let tx = tx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        // receiver gone means the runtime is shutting down
        let _ = tx.send(event).await;
    })
    .abort_handle()
}

#[derive(Debug)]
struct Pending<K> {
    handles: HashMap<K, AbortHandle>,
}

impl<K: Eq + Hash> Pending<K> {
    fn new() -> Self {
        Self {
            handles: HashMap::new(),
        }
    }

    fn insert(&mut self, key: K, handle: AbortHandle) {
        self.handles.retain(|_, h| !h.is_finished());
        if let Some(old) = self.handles.insert(key, handle) {
            old.abort();
        }
    }

    fn cancel(&mut self, key: &K) -> bool {
        match self.handles.remove(key) {
            Some(h) => {
                h.abort();
                true
            }
            None => false,
        }
    }

    fn abort_all(&mut self) {
        for (_, h) in self.handles.drain() {
            h.abort();
        }
    }

    fn live(&self) -> usize {
        self.handles.values().filter(|h| !h.is_finished()).count()
    }
}

/// `TimerHost` delivering `Event::Timeout(id)`.
#[derive(Debug)]
pub struct TokioTimerHost {
    tx: Sender<Event>,
    pending: Pending<TimerId>,
}

impl TokioTimerHost {
    pub fn new(tx: Sender<Event>) -> Self {
        Self {
            tx,
            pending: Pending::new(),
        }
    }

    /// Timers scheduled and neither fired nor cancelled.
    pub fn live(&self) -> usize {
        self.pending.live()
    }
}

impl TimerHost for TokioTimerHost {
    fn schedule(&mut self, id: TimerId, after: Duration) {
        trace!(
            target: "runtime",
            timer = %id,
            after_ms = u64::try_from(after.as_millis()).unwrap_or(u64::MAX),
            "timer_scheduled"
        );
        let handle = spawn_delayed(&self.tx, after, Event::Timeout(id));
        self.pending.insert(id, handle);
    }

    fn cancel(&mut self, id: TimerId) {
        if self.pending.cancel(&id) {
            trace!(target: "runtime", timer = %id, "timer_cancelled");
        }
    }
}

impl Drop for TokioTimerHost {
    fn drop(&mut self) {
        self.pending.abort_all();
    }
}

/// Runs deferred page work by posting `Event::PageTask(id)` when due.
#[derive(Debug)]
pub struct PageTaskScheduler {
    tx: Sender<Event>,
    pending: Pending<TaskId>,
}

impl PageTaskScheduler {
    pub fn new(tx: Sender<Event>) -> Self {
        Self {
            tx,
            pending: Pending::new(),
        }
    }

    pub fn schedule(&mut self, task: PageTask) {
        trace!(
            target: "runtime",
            task = task.id.0,
            after_ms = u64::try_from(task.after.as_millis()).unwrap_or(u64::MAX),
            "page_task_scheduled"
        );
        let handle = spawn_delayed(&self.tx, task.after, Event::PageTask(task.id));
        self.pending.insert(task.id, handle);
    }

    /// Drop everything still queued (navigation).
    pub fn clear(&mut self) {
        self.pending.abort_all();
    }
}

impl Drop for PageTaskScheduler {
    fn drop(&mut self) {
        self.pending.abort_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    #[tokio::test]
    async fn scheduled_timer_fires_once() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut host = TokioTimerHost::new(tx);
        host.schedule(TimerId(1), Duration::from_millis(5));
        let ev = timeout(Duration::from_secs(2), rx.recv()).await.unwrap();
        assert!(matches!(ev, Some(Event::Timeout(TimerId(1)))));
        assert!(
            timeout(Duration::from_millis(30), rx.recv())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn cancelled_timer_never_fires() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut host = TokioTimerHost::new(tx);
        host.schedule(TimerId(2), Duration::from_millis(20));
        host.cancel(TimerId(2));
        host.cancel(TimerId(99));
        assert_eq!(host.live(), 0);
        assert!(
            timeout(Duration::from_millis(60), rx.recv())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn page_tasks_are_dropped_on_clear() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut tasks = PageTaskScheduler::new(tx);
        tasks.schedule(PageTask {
            id: TaskId(1),
            after: Duration::from_millis(20),
        });
        tasks.clear();
        assert!(
            timeout(Duration::from_millis(60), rx.recv())
                .await
                .is_err()
        );
    }
}
