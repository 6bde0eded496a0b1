use crate::{map_key, map_mouse};
use core_events::{
    ASYNC_INPUT_STARTS, ASYNC_INPUT_STOP_CHANNEL, ASYNC_INPUT_STOP_ERROR, ASYNC_INPUT_STOP_SIGNAL,
    ASYNC_INPUT_STOP_STREAM, AsyncEventSource, CHANNEL_SEND_FAILURES, CHANNEL_SENDS, Event,
    InputEvent, KEYPRESS_TOTAL, POINTER_PRESSES, POINTER_RELEASES, PointerKind,
};
use crossterm::event::{Event as CEvent, EventStream};
use std::io;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::Sender;
use tokio::sync::watch;
use tokio::task;
use tokio_stream::{Stream, StreamExt};
use tracing::{info, trace, warn};

/// Handle used by the host to stop the input task during shutdown.
#[derive(Clone, Debug)]
pub struct AsyncInputShutdown {
    stop: watch::Sender<bool>,
}

impl AsyncInputShutdown {
    pub fn signal(&self) {
        self.stop.send_replace(true);
    }
}

fn shutdown_pair() -> (AsyncInputShutdown, watch::Receiver<bool>) {
    let (stop, stopped) = watch::channel(false);
    (AsyncInputShutdown { stop }, stopped)
}

/// Terminal input as an event source: a task forwarding crossterm's
/// `EventStream` into the event channel until signalled or the channel closes.
pub struct TerminalInputSource {
    stopped: watch::Receiver<bool>,
}

impl TerminalInputSource {
    /// The source plus the handle that stops its task.
    pub fn with_shutdown() -> (Self, AsyncInputShutdown) {
        let (shutdown, stopped) = shutdown_pair();
        (Self { stopped }, shutdown)
    }
}

impl AsyncEventSource for TerminalInputSource {
    fn name(&self) -> &'static str {
        "terminal_input"
    }

    fn spawn(self: Box<Self>, tx: Sender<Event>) -> task::JoinHandle<()> {
        let stopped = self.stopped;
        task::spawn(async move {
            let span = tracing::debug_span!(target: "input.thread", "input_async_task");
            let _enter = span.enter();
            InputPump::new(tx, EventStream::new(), stopped).run().await;
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StopReason {
    Signal,
    ChannelClosed,
    StreamEnded,
    StreamError(io::ErrorKind),
}

impl StopReason {
    fn as_str(&self) -> &'static str {
        match self {
            StopReason::Signal => "shutdown_signal",
            StopReason::ChannelClosed => "channel_closed",
            StopReason::StreamEnded => "stream_ended",
            StopReason::StreamError(_) => "stream_error",
        }
    }

    fn counter(&self) -> &'static AtomicU64 {
        match self {
            StopReason::Signal => &ASYNC_INPUT_STOP_SIGNAL,
            StopReason::ChannelClosed => &ASYNC_INPUT_STOP_CHANNEL,
            StopReason::StreamEnded => &ASYNC_INPUT_STOP_STREAM,
            StopReason::StreamError(_) => &ASYNC_INPUT_STOP_ERROR,
        }
    }
}

/// Pulls terminal events off a stream and forwards the translated ones.
struct InputPump<S> {
    sender: Sender<Event>,
    stream: S,
    stopped: watch::Receiver<bool>,
}

impl<S> InputPump<S>
where
    S: Stream<Item = io::Result<CEvent>> + Send + Unpin + 'static,
{
    fn new(sender: Sender<Event>, stream: S, stopped: watch::Receiver<bool>) -> Self {
        Self {
            sender,
            stream,
            stopped,
        }
    }

    async fn run(mut self) -> StopReason {
        info!(target: "input.thread", "async_input_task_started");
        ASYNC_INPUT_STARTS.fetch_add(1, Ordering::Relaxed);

        let reason = loop {
            let next = tokio::select! {
                biased;
                Ok(_) = self.stopped.wait_for(|stop| *stop) => break StopReason::Signal,
                next = self.stream.next() => next,
            };
            let flow = match next {
                None => ControlFlow::Break(StopReason::StreamEnded),
                Some(Err(err)) => ControlFlow::Break(StopReason::StreamError(err.kind())),
                Some(Ok(event)) => self.forward(event).await,
            };
            if let ControlFlow::Break(reason) = flow {
                break reason;
            }
        };

        reason.counter().fetch_add(1, Ordering::Relaxed);
        if let StopReason::StreamError(kind) = reason {
            warn!(target: "input.thread", error_kind = ?kind, "async_input_task_stream_error");
        }
        info!(target: "input.thread", reason = reason.as_str(), "async_input_task_stopped");
        reason
    }

    async fn forward(&mut self, event: CEvent) -> ControlFlow<StopReason> {
        match event {
            CEvent::Mouse(m) => {
                let Some(pointer) = map_mouse(m) else {
                    return ControlFlow::Continue(());
                };
                // coordinates only; never which widget or what text sits there
                trace!(
                    target: "input.event",
                    kind = "pointer",
                    press = pointer.kind == PointerKind::Press,
                    column = pointer.column,
                    row = pointer.row
                );
                self.send(Event::Input(InputEvent::Pointer(pointer))).await?;
                let counter = match pointer.kind {
                    PointerKind::Press => &POINTER_PRESSES,
                    PointerKind::Release => &POINTER_RELEASES,
                };
                counter.fetch_add(1, Ordering::Relaxed);
            }
            CEvent::Key(k) => {
                let Some(input) = map_key(k) else {
                    return ControlFlow::Continue(());
                };
                let ctrl_c = matches!(input, InputEvent::CtrlC);
                trace!(target: "input.event", kind = "keypress", ctrl_c);
                self.send(Event::Input(input)).await?;
                if !ctrl_c {
                    KEYPRESS_TOTAL.fetch_add(1, Ordering::Relaxed);
                }
            }
            other => {
                if let Some(ev) = crate::translate(other) {
                    trace!(target: "input.event", kind = "terminal", event = ?ev);
                    self.send(ev).await?;
                }
            }
        }
        ControlFlow::Continue(())
    }

    async fn send(&mut self, event: Event) -> ControlFlow<StopReason> {
        match self.sender.send(event).await {
            Ok(()) => {
                CHANNEL_SENDS.fetch_add(1, Ordering::Relaxed);
                ControlFlow::Continue(())
            }
            Err(_) => {
                CHANNEL_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
                ControlFlow::Break(StopReason::ChannelClosed)
            }
        }
    }
}
