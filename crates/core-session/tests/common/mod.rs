#![allow(dead_code)] // Each test binary uses a subset of helpers.

use core_events::{PointerEvent, TimerId};
use core_overlay::Viewport;
use core_session::{InteractionController, ManualClock, SessionSettings, TimerHost};
use core_watch::{
    ChangeSource, MutationBatch, MutationKind, MutationRecord, NodeId, SubscriptionId,
    SubscriptionTable, WatchOptions,
};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;
use std::time::Duration;

pub const ROOT: NodeId = NodeId(0);

/// Document stand-in shared between the controller and the test body.
#[derive(Clone)]
pub struct SharedTable(pub Rc<RefCell<SubscriptionTable>>);

impl SharedTable {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(SubscriptionTable::new(ROOT))))
    }

    pub fn live(&self) -> usize {
        self.0.borrow().live()
    }

    /// Mutate a text node below the root and drain what observers would see.
    pub fn mutate_text(&self) -> Vec<MutationBatch> {
        let mut table = self.0.borrow_mut();
        table.notify(MutationRecord {
            target: NodeId(7),
            kind: MutationKind::CharacterData,
        });
        table.take_batches()
    }
}

impl ChangeSource for SharedTable {
    fn subscribe(&mut self, options: WatchOptions) -> SubscriptionId {
        self.0.borrow_mut().subscribe(options)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.0.borrow_mut().unsubscribe(id)
    }
}

#[derive(Default)]
pub struct TimerLog {
    pub pending: BTreeSet<TimerId>,
    pub scheduled: Vec<(TimerId, Duration)>,
    pub cancelled: Vec<TimerId>,
}

#[derive(Clone, Default)]
pub struct FakeTimers(pub Rc<RefCell<TimerLog>>);

impl FakeTimers {
    pub fn pending(&self) -> usize {
        self.0.borrow().pending.len()
    }

    pub fn last_scheduled(&self) -> Option<(TimerId, Duration)> {
        self.0.borrow().scheduled.last().copied()
    }
}

impl TimerHost for FakeTimers {
    fn schedule(&mut self, id: TimerId, after: Duration) {
        let mut log = self.0.borrow_mut();
        log.pending.insert(id);
        log.scheduled.push((id, after));
    }

    fn cancel(&mut self, id: TimerId) {
        let mut log = self.0.borrow_mut();
        if log.pending.remove(&id) {
            log.cancelled.push(id);
        }
    }
}

pub type TestController = InteractionController<SharedTable, FakeTimers, ManualClock>;

pub struct Harness {
    pub controller: TestController,
    pub table: SharedTable,
    pub timers: FakeTimers,
    pub clock: ManualClock,
}

pub fn harness() -> Harness {
    harness_with(SessionSettings::default())
}

pub fn harness_with(settings: SessionSettings) -> Harness {
    let table = SharedTable::new();
    let timers = FakeTimers::default();
    let clock = ManualClock::new();
    let controller = InteractionController::new(
        table.clone(),
        timers.clone(),
        clock.clone(),
        Viewport::new(80, 24),
        settings,
    );
    Harness {
        controller,
        table,
        timers,
        clock,
    }
}

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

pub fn press(column: u16, row: u16) -> PointerEvent {
    PointerEvent::press(column, row)
}

pub fn release(column: u16, row: u16) -> PointerEvent {
    PointerEvent::release(column, row)
}
