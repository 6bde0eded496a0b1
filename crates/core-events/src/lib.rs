//! Core event types and channel helpers for tapwatch.
//!
//! Every producer (terminal input, timeout timers, deferred page work) funnels
//! into one bounded channel consumed by the host event loop.
//! Handlers therefore never run concurrently with each other.

use std::fmt;
use std::sync::atomic::AtomicU64;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

// -------------------------------------------------------------------------------------------------
// Channel Policy
// -------------------------------------------------------------------------------------------------
// Bounded mpsc sized by `EVENT_CHANNEL_CAP`. Producers await `send`, so a slow consumer applies
// backpressure instead of dropping pointer transitions. Timer tasks hold their own sender clone and
// exit quietly when the channel is closed during shutdown.
// -------------------------------------------------------------------------------------------------
pub const EVENT_CHANNEL_CAP: usize = 1024;

// -------------------------------------------------------------------------------------------------
// Telemetry
// -------------------------------------------------------------------------------------------------
// Relaxed atomic counters, inspected by tests and logged at shutdown.
// -------------------------------------------------------------------------------------------------
pub static CHANNEL_SEND_FAILURES: AtomicU64 = AtomicU64::new(0);
pub static CHANNEL_SENDS: AtomicU64 = AtomicU64::new(0);
pub static POINTER_PRESSES: AtomicU64 = AtomicU64::new(0);
pub static POINTER_RELEASES: AtomicU64 = AtomicU64::new(0);
pub static KEYPRESS_TOTAL: AtomicU64 = AtomicU64::new(0);
// Async input task lifecycle telemetry
pub static ASYNC_INPUT_STARTS: AtomicU64 = AtomicU64::new(0);
pub static ASYNC_INPUT_STOP_SIGNAL: AtomicU64 = AtomicU64::new(0);
pub static ASYNC_INPUT_STOP_CHANNEL: AtomicU64 = AtomicU64::new(0);
pub static ASYNC_INPUT_STOP_STREAM: AtomicU64 = AtomicU64::new(0);
pub static ASYNC_INPUT_STOP_ERROR: AtomicU64 = AtomicU64::new(0);

/// Top-level event enum consumed by the central event loop.
#[derive(Debug, Clone)]
pub enum Event {
    Input(InputEvent),
    /// A scheduled timeout elapsed. The id lets the owner drop stale firings.
    Timeout(TimerId),
    /// Deferred page work (simulated async app logic) is due.
    PageTask(TaskId),
    /// Wire-encoded notification from an instrumented page to the activation shell.
    /// `instance` names the activation that sent it, so messages from a replaced
    /// activation can be told apart.
    ShellMessage {
        page: u64,
        instance: u64,
        payload: String,
    },
}

/// Identity of one scheduled timeout. Allocated by the timer owner, never reused
/// within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Identity of one deferred page task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

// -------------------------------------------------------------------------------------------------
// Async Event Sources
// -------------------------------------------------------------------------------------------------
// Uniform registration for background producers. Each source owns its task lifecycle and must
// terminate promptly once `tx.send(..)` fails (consumer dropped).

/// Trait implemented by any async event producer. Implementors usually hold configuration and
/// spawn one background task that pushes `Event`s into the shared channel.
pub trait AsyncEventSource: Send + 'static {
    /// Human-readable stable identifier (used for logging / diagnostics).
    fn name(&self) -> &'static str;
    /// Consume self and spawn the background task, returning a JoinHandle. Implementors should
    /// stop when `tx.send(..).await` returns Err (channel closed) or on their own internal stop
    /// condition.
    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()>;
}

/// Registry of event sources spawned together at startup.
pub struct EventSourceRegistry {
    sources: Vec<Box<dyn AsyncEventSource>>,
}

impl Default for EventSourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSourceRegistry {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }
    pub fn register<S: AsyncEventSource>(&mut self, src: S) {
        self.sources.push(Box::new(src));
    }
    /// Spawn all registered sources, returning their JoinHandles. Each source receives its own
    /// clone of `tx`; the registry keeps no sender once this returns.
    ///
    /// During shutdown the caller should drop its final `Sender` clone before awaiting the
    /// returned handles so the sources observe the closed channel and exit cooperatively.
    pub fn spawn_all(&mut self, tx: &Sender<Event>) -> Vec<JoinHandle<()>> {
        // Drain so a second call cannot spawn duplicates.
        let mut out = Vec::with_capacity(self.sources.len());
        for src in self.sources.drain(..) {
            let name = src.name();
            tracing::info!(target: "runtime.events", source = name, "spawning event source");
            out.push(src.spawn(tx.clone()));
        }
        out
    }
}

/// Normalized input events.
#[derive(Debug, Clone)]
pub enum InputEvent {
    /// Pointer press or release at a cell position.
    Pointer(PointerEvent),
    Key(KeyEvent),
    /// Terminal resize (columns, rows).
    Resize(u16, u16),
    /// Synthetic interrupt (Ctrl-C) surfaced distinctly.
    CtrlC,
    FocusGained,
    FocusLost,
}

/// A pointer transition in terminal cell coordinates (column, row; origin top-left).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub button: MouseButton,
    pub column: u16,
    pub row: u16,
    pub mods: ModMask,
}

impl PointerEvent {
    pub fn press(column: u16, row: u16) -> Self {
        Self {
            kind: PointerKind::Press,
            button: MouseButton::Left,
            column,
            row,
            mods: ModMask::empty(),
        }
    }

    pub fn release(column: u16, row: u16) -> Self {
        Self {
            kind: PointerKind::Release,
            ..Self::press(column, row)
        }
    }

    pub fn position(&self) -> (u16, u16) {
        (self.column, self.row)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerKind {
    Press,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ModMask: u16 { const CTRL=1; const ALT=2; const SHIFT=4; }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub mods: ModMask,
}

impl KeyEvent {
    pub fn plain(code: KeyCode) -> Self {
        Self {
            code,
            mods: ModMask::empty(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Esc,
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}{:?}", self.code, self.mods)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[test]
    fn key_event_display() {
        let k = KeyEvent {
            code: KeyCode::Char('x'),
            mods: ModMask::CTRL,
        };
        let s = format!("{}", k);
        assert!(s.contains("Char"));
    }

    #[test]
    fn pointer_constructors_share_position() {
        let p = PointerEvent::press(4, 7);
        let r = PointerEvent::release(4, 7);
        assert_eq!(p.kind, PointerKind::Press);
        assert_eq!(r.kind, PointerKind::Release);
        assert_eq!(p.position(), r.position());
        assert_eq!(r.button, MouseButton::Left);
    }

    #[test]
    fn timer_id_display_is_stable() {
        assert_eq!(TimerId(3).to_string(), "timer#3");
    }

    struct MockOnceSource;

    impl AsyncEventSource for MockOnceSource {
        fn name(&self) -> &'static str {
            "mock_once"
        }
        fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
            tokio::spawn(async move {
                let _ = tx.send(Event::Input(InputEvent::FocusGained)).await;
            })
        }
    }

    #[tokio::test]
    async fn registry_spawns_and_emits() {
        let (tx, mut rx) = mpsc::channel::<Event>(8);
        let mut reg = EventSourceRegistry::new();
        reg.register(MockOnceSource);
        let handles = reg.spawn_all(&tx);
        let ev = tokio::time::timeout(Duration::from_millis(200), rx.recv())
            .await
            .expect("source emits within deadline");
        assert!(matches!(ev, Some(Event::Input(InputEvent::FocusGained))));

        drop(tx);
        for handle in handles {
            handle.await.expect("source task joins");
        }
    }

    struct MockCloseSource {
        flag: Arc<AtomicBool>,
    }

    impl AsyncEventSource for MockCloseSource {
        fn name(&self) -> &'static str {
            "mock_close"
        }

        fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
            let flag = self.flag;
            tokio::spawn(async move {
                tx.closed().await;
                flag.store(true, Ordering::SeqCst);
            })
        }
    }

    #[tokio::test]
    async fn registry_sources_exit_on_channel_drop() {
        let (tx, rx) = mpsc::channel::<Event>(8);
        let mut reg = EventSourceRegistry::new();
        let flag = Arc::new(AtomicBool::new(false));
        reg.register(MockCloseSource { flag: flag.clone() });
        let handles = reg.spawn_all(&tx);

        drop(tx);
        drop(rx);

        for handle in handles {
            match tokio::time::timeout(Duration::from_millis(50), handle).await {
                Ok(join_res) => join_res.expect("source task should exit cleanly"),
                Err(_) => panic!("source task did not observe channel closure"),
            }
        }

        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn spawn_all_drains_registry() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        rt.block_on(async {
            let (tx, _rx) = mpsc::channel::<Event>(8);
            let mut reg = EventSourceRegistry::new();
            reg.register(MockOnceSource);
            assert_eq!(reg.spawn_all(&tx).len(), 1);
            assert!(reg.spawn_all(&tx).is_empty(), "second spawn must not duplicate");
        });
    }
}
