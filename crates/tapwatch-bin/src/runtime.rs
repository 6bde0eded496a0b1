//! Event handling for one hosted page.
//!
//! `Runtime` is the synchronous half of the event loop: `main` owns the
//! channel and terminal, pulls events and hands each one to `handle`. Pending
//! mutation batches are flushed after every event, before the next one is
//! taken, so a page change always reaches the instrumentation ahead of any
//! timeout that was queued behind it.
//!
//! Pointer transitions follow the page's registered listeners: capture-phase
//! listeners run before the page acts on the event, bubble-phase ones after.
//! Only listeners the instrumentation installed reach it, and presses or clicks
//! on the overlay stop before the page.

use crate::host::{PageTaskScheduler, TokioTimerHost};
use crate::shell::{ShellPort, StatusShell};
use anyhow::{Result, bail};
use core_events::{Event, InputEvent, KeyCode, KeyEvent, ModMask, PointerEvent, TimerId};
use core_lifecycle::{
    ActivationRegistry, Instrumentation, ListenPhase, ListenerId, ListenerKind, PageId,
    PointerDispatch,
};
use core_overlay::{OverlayElement, Viewport};
use core_page::{Page, PageHandle};
use core_render::{
    Frame, RenderEngine, RenderKind, StatusContext, build_status, paint_overlay, paint_page,
    paint_status,
};
use core_session::{Clock, InteractionController, SessionSettings};
use std::fmt;
use std::io::Write;
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tracing::{debug, info, trace, warn};

/// Rows reserved below the page for the status line.
pub const STATUS_ROWS: u16 = 1;
pub const HOSTED_PAGE: PageId = PageId(1);
const ACTIVATION_FAILED: &str = "activation failed";

pub type PageInstrumentation<C> =
    Instrumentation<PageHandle, TokioTimerHost, C, PageHandle, ShellPort>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Break { reason: ShutdownReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    CtrlC,
    KeyQuit,
    ChannelClosed,
}

impl ShutdownReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShutdownReason::CtrlC => "ctrl_c",
            ShutdownReason::KeyQuit => "key_quit",
            ShutdownReason::ChannelClosed => "channel_closed",
        }
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct Runtime<C: Clock + Clone> {
    page: PageHandle,
    registry: ActivationRegistry<PageInstrumentation<C>>,
    shell: StatusShell,
    tasks: PageTaskScheduler,
    tx: Sender<Event>,
    clock: C,
    settings: SessionSettings,
    size: (u16, u16),
    message: Option<String>,
    next_instance: u64,
    engine: RenderEngine,
}

impl<C: Clock + Clone> Runtime<C> {
    pub fn new(
        tx: Sender<Event>,
        clock: C,
        settings: SessionSettings,
        load_delay: Duration,
        size: (u16, u16),
    ) -> Self {
        Self {
            page: PageHandle::new(Page::new(HOSTED_PAGE, load_delay)),
            registry: ActivationRegistry::new(),
            shell: StatusShell::new(),
            tasks: PageTaskScheduler::new(tx.clone()),
            tx,
            clock,
            settings,
            size,
            message: None,
            next_instance: 0,
            engine: RenderEngine::new(),
        }
    }

    pub fn page(&self) -> &PageHandle {
        &self.page
    }

    pub fn shell(&self) -> &StatusShell {
        &self.shell
    }

    pub fn instrumentation(&self) -> Option<&PageInstrumentation<C>> {
        self.registry.get(HOSTED_PAGE)
    }

    pub fn is_instrumented(&self) -> bool {
        self.registry.is_instrumented(HOSTED_PAGE)
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn overlay(&self) -> Option<&OverlayElement> {
        self.instrumentation()
            .and_then(|i| i.controller().presenter().element())
    }

    pub fn engine(&self) -> &RenderEngine {
        &self.engine
    }

    /// Area the overlay may occupy: everything above the status line.
    fn content_viewport(&self) -> Viewport {
        Viewport::new(self.size.0, self.size.1.saturating_sub(STATUS_ROWS))
    }

    pub fn handle(&mut self, event: &Event) -> LoopControl {
        let control = match event {
            Event::Input(input) => self.handle_input(input),
            Event::Timeout(id) => self.handle_timeout(*id),
            Event::PageTask(id) => {
                self.page.borrow_mut().run_task(*id);
                LoopControl::Continue
            }
            Event::ShellMessage {
                page,
                instance,
                payload,
            } => {
                self.shell.receive(PageId(*page), *instance, payload);
                LoopControl::Continue
            }
        };
        self.flush_mutations();
        control
    }

    fn handle_input(&mut self, input: &InputEvent) -> LoopControl {
        match input {
            InputEvent::Pointer(p) => self.handle_pointer(p),
            InputEvent::Key(key) => self.handle_key(key),
            InputEvent::CtrlC => self.quit(ShutdownReason::CtrlC),
            InputEvent::Resize(w, h) => self.handle_resize(*w, *h),
            InputEvent::FocusGained | InputEvent::FocusLost => LoopControl::Continue,
        }
    }

    fn handle_key(&mut self, key: &KeyEvent) -> LoopControl {
        if key.mods.intersects(ModMask::CTRL | ModMask::ALT) {
            return LoopControl::Continue;
        }
        match key.code {
            KeyCode::Char('a') => self.activate(),
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char('q') | KeyCode::Esc => return self.quit(ShutdownReason::KeyQuit),
            _ => trace!(target: "runtime", key = %key, "key_unbound"),
        }
        LoopControl::Continue
    }

    fn handle_pointer(&mut self, event: &PointerEvent) -> LoopControl {
        let order = self
            .page
            .borrow()
            .listeners()
            .dispatch_order(event.kind.into());
        let (capture, bubble): (Vec<_>, Vec<_>) = order
            .into_iter()
            .partition(|(_, phase)| *phase == ListenPhase::Capture);

        let mut dispatch = self.deliver_pointer(&capture, event);
        if !dispatch.is_some_and(|d| d.consumed_by_overlay()) {
            let task = self.page.borrow_mut().pointer(event);
            if let Some(task) = task {
                self.tasks.schedule(task);
            }
            if dispatch.is_none() {
                dispatch = self.deliver_pointer(&bubble, event);
            }
        }
        if dispatch.is_some_and(|d| d.requests_teardown()) {
            info!(target: "runtime", page = %HOSTED_PAGE, "disable_requested");
            self.registry.deactivate(HOSTED_PAGE);
        }
        LoopControl::Continue
    }

    /// Run the instrumentation's own entries among `listeners`. The page has no
    /// other pointer listeners with a host-side handler.
    fn deliver_pointer(
        &mut self,
        listeners: &[(ListenerId, ListenPhase)],
        event: &PointerEvent,
    ) -> Option<PointerDispatch> {
        let instance = self.registry.get_mut(HOSTED_PAGE)?;
        let mut dispatch = None;
        for (id, _) in listeners {
            if instance.owns_listener(*id) {
                dispatch = instance.handle_pointer(event);
            }
        }
        dispatch
    }

    fn handle_timeout(&mut self, id: TimerId) -> LoopControl {
        match self.registry.get_mut(HOSTED_PAGE) {
            Some(instance) => instance.handle_timeout(id),
            None => trace!(target: "runtime", timer = %id, "timeout_without_instance"),
        }
        LoopControl::Continue
    }

    fn handle_resize(&mut self, width: u16, height: u16) -> LoopControl {
        self.size = (width, height);
        let viewport = self.content_viewport();
        if let Some(instance) = self.registry.get_mut(HOSTED_PAGE) {
            instance.controller_mut().set_viewport(viewport);
        }
        self.engine.invalidate();
        debug!(target: "runtime", width, height, "resized");
        LoopControl::Continue
    }

    /// Toolbar action: install (or reinstall) instrumentation on the page.
    pub fn activate(&mut self) {
        self.next_instance += 1;
        let instance = self.next_instance;
        let tx = self.tx.clone();
        let page = self.page.clone();
        let clock = self.clock.clone();
        let settings = self.settings.clone();
        let viewport = self.content_viewport();
        let installed = self.registry.activate(HOSTED_PAGE, move || -> Result<_> {
            if tx.is_closed() {
                bail!("event channel closed");
            }
            let controller = InteractionController::new(
                page.clone(),
                TokioTimerHost::new(tx.clone()),
                clock,
                viewport,
                settings,
            );
            Ok(Instrumentation::install(
                HOSTED_PAGE,
                controller,
                page,
                ShellPort::new(tx, instance),
            ))
        });
        match installed {
            Ok(_) => {
                self.shell.mark_active(HOSTED_PAGE, instance);
                self.message = None;
            }
            Err(e) => {
                warn!(target: "runtime", page = %HOSTED_PAGE, error = %e, "activation_failed");
                self.shell.mark_inactive(HOSTED_PAGE);
                self.message = Some(ACTIVATION_FAILED.to_string());
            }
        }
    }

    /// Fire a lifecycle event at the page; a listener the instrumentation
    /// installed for it means teardown.
    fn dispatch_lifecycle(&mut self, kind: ListenerKind) {
        let order = self.page.borrow().listeners().dispatch_order(kind);
        let listening = self
            .registry
            .get(HOSTED_PAGE)
            .is_some_and(|i| order.iter().any(|(id, _)| i.owns_listener(*id)));
        if listening {
            debug!(target: "runtime", page = %HOSTED_PAGE, ?kind, "lifecycle_dispatched");
            self.registry.deactivate(HOSTED_PAGE);
        }
    }

    pub fn reload(&mut self) {
        self.dispatch_lifecycle(ListenerKind::PageHide);
        self.shell.mark_inactive(HOSTED_PAGE);
        self.tasks.clear();
        self.page.borrow_mut().navigate();
        self.message = None;
    }

    fn quit(&mut self, reason: ShutdownReason) -> LoopControl {
        self.dispatch_lifecycle(ListenerKind::BeforeUnload);
        info!(target: "runtime", reason = reason.as_str(), "shutdown");
        LoopControl::Break { reason }
    }

    /// Tear down anything still installed (shutdown paths that skip before-unload).
    pub fn teardown_all(&mut self) -> usize {
        self.registry.deactivate_all()
    }

    fn flush_mutations(&mut self) {
        let batches = self.page.borrow_mut().take_batches();
        if batches.is_empty() {
            return;
        }
        match self.registry.get_mut(HOSTED_PAGE) {
            Some(instance) => {
                for batch in &batches {
                    instance.handle_mutations(batch);
                }
            }
            None => trace!(target: "runtime", batches = batches.len(), "batches_without_instance"),
        }
    }

    pub fn compose_frame(&self) -> Frame {
        let (width, height) = self.size;
        let mut frame = Frame::new(width, height);
        let page = self.page.borrow();
        paint_page(&mut frame, &page);
        if let Some(element) = self.overlay() {
            paint_overlay(&mut frame, element);
        }
        let status = build_status(&StatusContext {
            active: self.shell.is_active(page.id()),
            page: page.id().0,
            generation: page.generation(),
            message: self.message.as_deref(),
        });
        paint_status(&mut frame, &status);
        frame
    }

    pub fn render<W: Write>(&mut self, out: &mut W) -> Result<RenderKind> {
        let frame = self.compose_frame();
        self.engine.render(frame, out)
    }
}
