//! Demo document hosted by the terminal.
//!
//! `Page` is a tiny retained document: a title, four widgets and an activity
//! list. It satisfies both host capabilities the instrumentation needs:
//! `ChangeSource` (every content change is queued as a mutation record) and
//! `InputSource` (listener registration with capture/bubble phases).
//!
//! Records queue until the host calls `take_batches` after handling an event,
//! mirroring a microtask checkpoint. Deferred work (the load widget) is
//! returned to the host as `PageTask` requests and comes back via `run_task`.

pub mod widget;

pub use widget::{BOX_HEIGHT, Widget, WidgetKind};

use core_events::{PointerEvent, PointerKind, TaskId};
use core_lifecycle::{InputSource, ListenPhase, ListenerId, ListenerKind, ListenerTable, PageId};
use core_overlay::Point;
use core_watch::{
    ChangeSource, MutationBatch, MutationKind, MutationRecord, NodeId, SubscriptionId,
    SubscriptionTable, WatchOptions,
};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashSet;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info, trace};

pub const ROOT: NodeId = NodeId(0);
pub const ACTIVITY_LIST: NodeId = NodeId(2);
pub const TITLE: &str = "tapwatch demo page";
pub const ACTIVITY_LIMIT: usize = 6;

const WIDGET_ROW: u16 = 2;
const WIDGET_LEFT: u16 = 2;
const WIDGET_GAP: u16 = 2;
const FIRST_WIDGET_NODE: u32 = 10;

/// Deferred page work the host must schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTask {
    pub id: TaskId,
    pub after: Duration,
}

#[derive(Debug)]
pub struct Page {
    id: PageId,
    widgets: Vec<Widget>,
    activity: Vec<String>,
    loaded: u32,
    changes: SubscriptionTable,
    listeners: ListenerTable,
    pressed: Option<usize>,
    pending: HashSet<TaskId>,
    next_task: u64,
    load_delay: Duration,
    generation: u32,
}

impl Page {
    pub fn new(id: PageId, load_delay: Duration) -> Self {
        let mut x = WIDGET_LEFT;
        let widgets = WidgetKind::ALL
            .iter()
            .enumerate()
            .map(|(i, kind)| {
                let w = Widget::new(*kind, NodeId(FIRST_WIDGET_NODE + i as u32), x, WIDGET_ROW);
                x = x.saturating_add(w.rect.width + WIDGET_GAP);
                w
            })
            .collect();
        Self {
            id,
            widgets,
            activity: Vec::new(),
            loaded: 0,
            changes: SubscriptionTable::new(ROOT),
            listeners: ListenerTable::new(),
            pressed: None,
            pending: HashSet::new(),
            next_task: 0,
            load_delay,
            generation: 0,
        }
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    pub fn widgets(&self) -> &[Widget] {
        &self.widgets
    }

    pub fn activity(&self) -> &[String] {
        &self.activity
    }

    /// Row of the "Activity" heading; items follow on the rows below.
    pub fn activity_row(&self) -> u16 {
        WIDGET_ROW + BOX_HEIGHT + 1
    }

    /// Bumped on every navigation.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn listeners(&self) -> &ListenerTable {
        &self.listeners
    }

    pub fn subscriptions(&self) -> usize {
        self.changes.live()
    }

    pub fn widget_at(&self, p: Point) -> Option<usize> {
        self.widgets.iter().position(|w| w.rect.contains(p))
    }

    /// Page-level (bubble phase) handling of a pointer transition.
    pub fn pointer(&mut self, event: &PointerEvent) -> Option<PageTask> {
        let hit = self.widget_at(Point::from(event.position()));
        match event.kind {
            PointerKind::Press => {
                self.pressed = hit;
                if let Some(i) = hit
                    && self.widgets[i].kind == WidgetKind::Toggle
                {
                    self.flip_toggle(i);
                }
                None
            }
            PointerKind::Release => {
                let pressed = self.pressed.take();
                match (pressed, hit) {
                    (Some(a), Some(b)) if a == b => self.click(a),
                    _ => None,
                }
            }
        }
    }

    fn click(&mut self, i: usize) -> Option<PageTask> {
        match self.widgets[i].kind {
            WidgetKind::Counter => {
                self.widgets[i].count += 1;
                let node = self.widgets[i].node;
                self.record(node, MutationKind::CharacterData);
                None
            }
            WidgetKind::Load => {
                self.next_task += 1;
                let id = TaskId(self.next_task);
                self.pending.insert(id);
                debug!(
                    target: "page",
                    task = id.0,
                    delay_ms = u64::try_from(self.load_delay.as_millis()).unwrap_or(u64::MAX),
                    "load_scheduled"
                );
                Some(PageTask {
                    id,
                    after: self.load_delay,
                })
            }
            WidgetKind::Toggle | WidgetKind::Inert => None,
        }
    }

    fn flip_toggle(&mut self, i: usize) {
        self.widgets[i].on = !self.widgets[i].on;
        let node = self.widgets[i].node;
        self.record(
            node,
            MutationKind::Attribute {
                name: "aria-pressed".to_string(),
            },
        );
    }

    /// Run deferred work. Tasks from before a navigation are dropped.
    pub fn run_task(&mut self, id: TaskId) -> bool {
        if !self.pending.remove(&id) {
            trace!(target: "page", task = id.0, "stale_task_ignored");
            return false;
        }
        self.loaded += 1;
        self.activity.push(format!("Loaded item #{}", self.loaded));
        let removed = if self.activity.len() > ACTIVITY_LIMIT {
            self.activity.remove(0);
            1
        } else {
            0
        };
        self.record(ACTIVITY_LIST, MutationKind::ChildList { added: 1, removed });
        true
    }

    fn record(&mut self, target: NodeId, kind: MutationKind) {
        trace!(target: "page", node = target.0, kind = kind.label(), "page_mutated");
        self.changes.notify(MutationRecord { target, kind });
    }

    pub fn has_pending_changes(&self) -> bool {
        self.changes.has_pending()
    }

    pub fn take_batches(&mut self) -> Vec<MutationBatch> {
        self.changes.take_batches()
    }

    /// Replace the document (reload). The caller dispatches page-hide first;
    /// any listener or subscription still registered is dropped here.
    pub fn navigate(&mut self) {
        self.generation += 1;
        self.changes.clear();
        self.listeners.clear();
        self.pending.clear();
        self.pressed = None;
        self.activity.clear();
        self.loaded = 0;
        for w in &mut self.widgets {
            w.reset();
        }
        info!(target: "page", page = %self.id, generation = self.generation, "page_navigated");
    }
}

impl ChangeSource for Page {
    fn subscribe(&mut self, options: WatchOptions) -> SubscriptionId {
        self.changes.subscribe(options)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.changes.unsubscribe(id)
    }
}

impl InputSource for Page {
    fn add_listener(&mut self, kind: ListenerKind, phase: ListenPhase) -> ListenerId {
        self.listeners.add_listener(kind, phase)
    }

    fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove_listener(id)
    }

    fn listener_count(&self, kind: ListenerKind) -> usize {
        self.listeners.listener_count(kind)
    }
}

/// Shared handle used by the host loop and the instrumentation at once.
/// Only ever touched from the loop task.
#[derive(Debug, Clone)]
pub struct PageHandle(Rc<RefCell<Page>>);

impl PageHandle {
    pub fn new(page: Page) -> Self {
        Self(Rc::new(RefCell::new(page)))
    }

    pub fn borrow(&self) -> Ref<'_, Page> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Page> {
        self.0.borrow_mut()
    }
}

impl ChangeSource for PageHandle {
    fn subscribe(&mut self, options: WatchOptions) -> SubscriptionId {
        self.0.borrow_mut().subscribe(options)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.0.borrow_mut().unsubscribe(id)
    }
}

impl InputSource for PageHandle {
    fn add_listener(&mut self, kind: ListenerKind, phase: ListenPhase) -> ListenerId {
        self.0.borrow_mut().add_listener(kind, phase)
    }

    fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.0.borrow_mut().remove_listener(id)
    }

    fn listener_count(&self, kind: ListenerKind) -> usize {
        self.0.borrow().listener_count(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Page {
        Page::new(PageId(1), Duration::from_millis(350))
    }

    fn centre(p: &Page, kind: WidgetKind) -> (u16, u16) {
        let w = p.widgets().iter().find(|w| w.kind == kind).unwrap();
        (w.rect.x + 1, w.rect.y + 1)
    }

    #[test]
    fn widgets_do_not_overlap() {
        let p = page();
        for pair in p.widgets().windows(2) {
            assert!(pair[0].rect.right() < u32::from(pair[1].rect.x));
        }
    }

    #[test]
    fn unobserved_changes_are_not_queued() {
        let mut p = page();
        let (c, r) = centre(&p, WidgetKind::Counter);
        p.pointer(&PointerEvent::press(c, r));
        p.pointer(&PointerEvent::release(c, r));
        assert_eq!(p.widgets()[0].count, 1);
        assert!(!p.has_pending_changes());
    }

    #[test]
    fn release_elsewhere_is_not_a_click() {
        let mut p = page();
        p.subscribe(WatchOptions::document());
        let (c, r) = centre(&p, WidgetKind::Counter);
        p.pointer(&PointerEvent::press(c, r));
        p.pointer(&PointerEvent::release(0, 20));
        assert!(p.take_batches().is_empty());
    }
}
