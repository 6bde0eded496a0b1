//! Interaction timing state machine.
//!
//! ```text
//! Idle --press--> Armed --first accepted mutation batch--> (show results) Idle
//!                   |  \--timeout----------------------> (show notice)  Idle
//!                   \--release: record time, show status, stay Armed
//! ```
//!
//! A press always resets first, so at most one session, one subscription and
//! one pending timeout exist. The mutation and timeout paths race; each checks
//! that its own subscription / timer id is still current and a session still
//! exists before acting, so the loser becomes a no-op.

use crate::clock::{Clock, TimerHost};
use crate::settings::SessionSettings;
use core_events::{PointerEvent, TimerId};
use core_overlay::{OverlayContent, OverlayControl, OverlayHit, OverlayPresenter, Point, Viewport};
use core_timing::{
    PRESS_STATUS, RELEASE_STATUS, ResultsDisplay, duration_ms, format_results, timeout_notice,
    whole_ms,
};
use core_watch::{ChangeSource, MutationBatch, MutationWatcher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

// Process-wide so a re-activated controller can never mistake a queued firing
// from its predecessor for its own.
static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);

fn next_timer_id() -> TimerId {
    TimerId(NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Armed,
}

/// One press (and optional release) awaiting resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionSession {
    pub pressed_at: Instant,
    pub released_at: Option<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    pub press_to_mutation: Duration,
    pub release_to_mutation: Option<Duration>,
}

impl Measurement {
    pub fn display(&self, settings: &SessionSettings) -> ResultsDisplay {
        format_results(
            Some(duration_ms(self.press_to_mutation)),
            self.release_to_mutation.map(duration_ms),
            &settings.frame_targets,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Measured(Measurement),
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressOutcome {
    /// New session started.
    Armed,
    /// Press landed on the overlay; timing untouched.
    Overlay(OverlayHit),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Recorded,
    /// No armed session and no control click.
    Ignored,
    /// Press and release both landed on this control. `Close` has already
    /// hidden the overlay; `Disable` is left to the lifecycle owner.
    Control(OverlayControl),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControllerMetrics {
    pub sessions_started: u64,
    pub presses_ignored: u64,
    pub releases_recorded: u64,
    pub resolved_by_mutation: u64,
    pub resolved_by_timeout: u64,
    pub stale_batches: u64,
    pub stale_timeouts: u64,
    pub resets: u64,
}

pub struct InteractionController<S, T, C>
where
    S: ChangeSource,
    T: TimerHost,
    C: Clock,
{
    changes: S,
    timers: T,
    clock: C,
    presenter: OverlayPresenter,
    settings: SessionSettings,
    session: Option<InteractionSession>,
    watcher: MutationWatcher,
    timeout: Option<TimerId>,
    pressed_control: Option<OverlayControl>,
    metrics: ControllerMetrics,
}

impl<S, T, C> InteractionController<S, T, C>
where
    S: ChangeSource,
    T: TimerHost,
    C: Clock,
{
    pub fn new(changes: S, timers: T, clock: C, viewport: Viewport, settings: SessionSettings) -> Self {
        let presenter = OverlayPresenter::new(viewport, settings.overlay_offset);
        Self {
            changes,
            timers,
            clock,
            presenter,
            settings,
            session: None,
            watcher: MutationWatcher::new(),
            timeout: None,
            pressed_control: None,
            metrics: ControllerMetrics::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        if self.session.is_some() {
            Phase::Armed
        } else {
            Phase::Idle
        }
    }

    pub fn session(&self) -> Option<&InteractionSession> {
        self.session.as_ref()
    }

    pub fn presenter(&self) -> &OverlayPresenter {
        &self.presenter
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn metrics(&self) -> ControllerMetrics {
        self.metrics
    }

    pub fn watcher_active(&self) -> bool {
        self.watcher.is_active()
    }

    pub fn pending_timeout(&self) -> Option<TimerId> {
        self.timeout
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.presenter.set_viewport(viewport);
    }

    pub fn on_press(&mut self, event: &PointerEvent) -> PressOutcome {
        let point = Point::from(event.position());
        if let Some(hit) = self.presenter.hit_test(point) {
            self.metrics.presses_ignored += 1;
            self.pressed_control = match hit {
                OverlayHit::Control(c) => Some(c),
                OverlayHit::Body => None,
            };
            debug!(target: "session", ?hit, "press_on_overlay_ignored");
            return PressOutcome::Overlay(hit);
        }

        self.reset();
        let pressed_at = self.clock.now();
        self.session = Some(InteractionSession {
            pressed_at,
            released_at: None,
        });
        self.presenter
            .show(OverlayContent::Status(PRESS_STATUS.to_string()), Some(point));
        self.watcher.start(&mut self.changes);
        self.arm_timeout();
        self.metrics.sessions_started += 1;
        info!(
            target: "session",
            column = event.column,
            row = event.row,
            "session_armed"
        );
        PressOutcome::Armed
    }

    pub fn on_release(&mut self, event: &PointerEvent) -> ReleaseOutcome {
        let point = Point::from(event.position());
        if let Some(control) = self.pressed_control.take()
            && self.presenter.hit_test(point) == Some(OverlayHit::Control(control))
        {
            // the release still ends the user's gesture on an armed session
            let recorded = self.record_release();
            if control == OverlayControl::Close {
                self.presenter.hide();
            }
            debug!(target: "session", ?control, recorded, "overlay_control_clicked");
            return ReleaseOutcome::Control(control);
        }

        if !self.record_release() {
            trace!(target: "session", "release_without_session");
            return ReleaseOutcome::Ignored;
        }
        self.presenter
            .show(OverlayContent::Status(RELEASE_STATUS.to_string()), Some(point));
        debug!(target: "session", column = event.column, row = event.row, "release_recorded");
        ReleaseOutcome::Recorded
    }

    fn record_release(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        session.released_at = Some(self.clock.now());
        self.metrics.releases_recorded += 1;
        true
    }

    /// Handle a delivered change batch. Only the first accepted batch of a
    /// session resolves it.
    pub fn on_mutations(&mut self, batch: &MutationBatch) -> Option<Resolution> {
        let resolved_at = self.clock.now();
        if !self.watcher.accepts(batch) {
            self.metrics.stale_batches += 1;
            return None;
        }
        self.watcher.stop(&mut self.changes);
        let Some(session) = self.session.take() else {
            self.metrics.stale_batches += 1;
            return None;
        };
        self.cancel_timeout();

        let measurement = Measurement {
            press_to_mutation: resolved_at.saturating_duration_since(session.pressed_at),
            release_to_mutation: session
                .released_at
                .map(|r| resolved_at.saturating_duration_since(r)),
        };
        self.presenter.show(
            OverlayContent::Results(measurement.display(&self.settings)),
            None,
        );
        self.metrics.resolved_by_mutation += 1;
        info!(
            target: "session",
            press_ms = duration_ms(measurement.press_to_mutation),
            release_ms = measurement.release_to_mutation.map(duration_ms),
            records = batch.records.len(),
            first_kind = batch.records.first().map(|r| r.kind.label()),
            "session_resolved_mutation"
        );
        Some(Resolution::Measured(measurement))
    }

    pub fn on_timeout(&mut self, id: TimerId) -> Option<Resolution> {
        if self.timeout != Some(id) {
            self.metrics.stale_timeouts += 1;
            trace!(target: "session.timeout", timer = %id, "stale_timeout_ignored");
            return None;
        }
        self.cancel_timeout();
        if self.session.take().is_none() {
            self.metrics.stale_timeouts += 1;
            return None;
        }
        self.watcher.stop(&mut self.changes);
        self.presenter.show(
            OverlayContent::Notice(timeout_notice(self.settings.timeout)),
            None,
        );
        self.metrics.resolved_by_timeout += 1;
        info!(
            target: "session.timeout",
            timeout_ms = whole_ms(self.settings.timeout),
            "session_timed_out"
        );
        Some(Resolution::TimedOut)
    }

    /// Cancel timer, stop watcher, hide overlay, clear session. Idempotent.
    pub fn reset(&mut self) {
        self.cancel_timeout();
        self.watcher.stop(&mut self.changes);
        self.presenter.hide();
        self.session = None;
        self.pressed_control = None;
        self.metrics.resets += 1;
    }

    fn arm_timeout(&mut self) {
        self.cancel_timeout();
        let id = next_timer_id();
        self.timers.schedule(id, self.settings.timeout);
        self.timeout = Some(id);
        trace!(target: "session.timeout", timer = %id, "timeout_armed");
    }

    fn cancel_timeout(&mut self) {
        if let Some(id) = self.timeout.take() {
            self.timers.cancel(id);
        }
    }
}
