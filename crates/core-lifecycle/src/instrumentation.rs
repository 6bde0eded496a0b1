//! One page's installed instrumentation: controller, listeners and shell link.

use crate::input::{InputSource, ListenPhase, ListenerId, ListenerKind};
use crate::registry::Teardown;
use crate::shell::{ActivationShell, ShellError, ShellMessage};
use crate::PageId;
use core_events::{PointerEvent, PointerKind};
use core_overlay::OverlayControl;
use core_session::{Clock, InteractionController, PressOutcome, ReleaseOutcome, TimerHost};
use core_watch::{ChangeSource, MutationBatch};
use tracing::{debug, error, info};

/// What a pointer transition did once routed through the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerDispatch {
    Press(PressOutcome),
    Release(ReleaseOutcome),
}

impl PointerDispatch {
    /// The disable control was clicked: the owner should tear this page down.
    pub fn requests_teardown(&self) -> bool {
        matches!(
            self,
            PointerDispatch::Release(ReleaseOutcome::Control(OverlayControl::Disable))
        )
    }

    /// The pointer landed on the overlay, so the page underneath must not see it.
    pub fn consumed_by_overlay(&self) -> bool {
        matches!(
            self,
            PointerDispatch::Press(PressOutcome::Overlay(_))
                | PointerDispatch::Release(ReleaseOutcome::Control(_))
        )
    }
}

pub struct Instrumentation<S, T, C, I, H>
where
    S: ChangeSource,
    T: TimerHost,
    C: Clock,
    I: InputSource,
    H: ActivationShell,
{
    page: PageId,
    controller: InteractionController<S, T, C>,
    input: I,
    shell: H,
    listeners: Vec<ListenerId>,
    installed: bool,
}

impl<S, T, C, I, H> Instrumentation<S, T, C, I, H>
where
    S: ChangeSource,
    T: TimerHost,
    C: Clock,
    I: InputSource,
    H: ActivationShell,
{
    /// Install capture-phase press/release listeners plus page-hide and
    /// before-unload listeners that trigger teardown.
    pub fn install(
        page: PageId,
        controller: InteractionController<S, T, C>,
        mut input: I,
        shell: H,
    ) -> Self {
        let listeners = vec![
            input.add_listener(ListenerKind::Press, ListenPhase::Capture),
            input.add_listener(ListenerKind::Release, ListenPhase::Capture),
            input.add_listener(ListenerKind::PageHide, ListenPhase::Bubble),
            input.add_listener(ListenerKind::BeforeUnload, ListenPhase::Bubble),
        ];
        info!(target: "lifecycle", %page, listeners = listeners.len(), "instrumentation_installed");
        Self {
            page,
            controller,
            input,
            shell,
            listeners,
            installed: true,
        }
    }

    pub fn page(&self) -> PageId {
        self.page
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }

    pub fn controller(&self) -> &InteractionController<S, T, C> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut InteractionController<S, T, C> {
        &mut self.controller
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    /// Whether `id` is one of the listeners this instance installed.
    pub fn owns_listener(&self, id: ListenerId) -> bool {
        self.installed && self.listeners.contains(&id)
    }

    pub fn handle_pointer(&mut self, event: &PointerEvent) -> Option<PointerDispatch> {
        if !self.installed {
            return None;
        }
        let dispatch = match event.kind {
            PointerKind::Press => PointerDispatch::Press(self.controller.on_press(event)),
            PointerKind::Release => PointerDispatch::Release(self.controller.on_release(event)),
        };
        Some(dispatch)
    }

    pub fn handle_mutations(&mut self, batch: &MutationBatch) {
        if self.installed {
            self.controller.on_mutations(batch);
        }
    }

    pub fn handle_timeout(&mut self, id: core_events::TimerId) {
        if self.installed {
            self.controller.on_timeout(id);
        }
    }

    fn notify_shell(&mut self) {
        match self.shell.deliver(self.page, ShellMessage::ScriptInactive) {
            Ok(()) => debug!(target: "lifecycle.shell", page = %self.page, "shell_notified_inactive"),
            Err(ShellError::ContextInvalidated) => {
                debug!(target: "lifecycle.shell", page = %self.page, "shell_context_gone")
            }
            Err(e) => {
                error!(target: "lifecycle.shell", page = %self.page, error = %e, "shell_notify_failed")
            }
        }
    }
}

impl<S, T, C, I, H> Teardown for Instrumentation<S, T, C, I, H>
where
    S: ChangeSource,
    T: TimerHost,
    C: Clock,
    I: InputSource,
    H: ActivationShell,
{
    fn teardown(&mut self) {
        if !self.installed {
            return;
        }
        self.installed = false;
        self.notify_shell();
        for id in self.listeners.drain(..) {
            self.input.remove_listener(id);
        }
        self.controller.reset();
        let m = self.controller.metrics();
        info!(
            target: "lifecycle",
            page = %self.page,
            sessions_started = m.sessions_started,
            presses_ignored = m.presses_ignored,
            resolved_by_mutation = m.resolved_by_mutation,
            resolved_by_timeout = m.resolved_by_timeout,
            stale_batches = m.stale_batches,
            stale_timeouts = m.stale_timeouts,
            "instrumentation_torn_down"
        );
    }
}
