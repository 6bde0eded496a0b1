//! Input listener capability.

use core_events::PointerKind;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    Press,
    Release,
    PageHide,
    BeforeUnload,
}

impl From<PointerKind> for ListenerKind {
    fn from(kind: PointerKind) -> Self {
        match kind {
            PointerKind::Press => ListenerKind::Press,
            PointerKind::Release => ListenerKind::Release,
        }
    }
}

/// Dispatch phase. Capture listeners run before any page-level handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenPhase {
    Capture,
    Bubble,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Host capability: register interest in page input and lifecycle events.
pub trait InputSource {
    fn add_listener(&mut self, kind: ListenerKind, phase: ListenPhase) -> ListenerId;
    /// Remove a listener. Returns false for unknown ids.
    fn remove_listener(&mut self, id: ListenerId) -> bool;
    fn listener_count(&self, kind: ListenerKind) -> usize;
}

impl<T: InputSource + ?Sized> InputSource for &mut T {
    fn add_listener(&mut self, kind: ListenerKind, phase: ListenPhase) -> ListenerId {
        (**self).add_listener(kind, phase)
    }
    fn remove_listener(&mut self, id: ListenerId) -> bool {
        (**self).remove_listener(id)
    }
    fn listener_count(&self, kind: ListenerKind) -> usize {
        (**self).listener_count(kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Listener {
    id: ListenerId,
    kind: ListenerKind,
    phase: ListenPhase,
}

/// Listener bookkeeping for a host document.
#[derive(Debug, Default)]
pub struct ListenerTable {
    next_id: u64,
    entries: Vec<Listener>,
}

impl ListenerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listener ids for `kind`, capture phase first, then registration order.
    pub fn dispatch_order(&self, kind: ListenerKind) -> Vec<(ListenerId, ListenPhase)> {
        let mut out: Vec<_> = self
            .entries
            .iter()
            .filter(|l| l.kind == kind)
            .map(|l| (l.id, l.phase))
            .collect();
        out.sort_by_key(|(_, phase)| *phase != ListenPhase::Capture);
        out
    }

    pub fn has_capture(&self, kind: ListenerKind) -> bool {
        self.entries
            .iter()
            .any(|l| l.kind == kind && l.phase == ListenPhase::Capture)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl InputSource for ListenerTable {
    fn add_listener(&mut self, kind: ListenerKind, phase: ListenPhase) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.entries.push(Listener { id, kind, phase });
        trace!(target: "lifecycle", listener = id.0, ?kind, ?phase, "listener_added");
        id
    }

    fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|l| l.id != id);
        before != self.entries.len()
    }

    fn listener_count(&self, kind: ListenerKind) -> usize {
        self.entries.iter().filter(|l| l.kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_listeners_dispatch_first() {
        let mut t = ListenerTable::new();
        let bubble = t.add_listener(ListenerKind::Press, ListenPhase::Bubble);
        let capture = t.add_listener(ListenerKind::Press, ListenPhase::Capture);
        t.add_listener(ListenerKind::Release, ListenPhase::Capture);
        let order: Vec<_> = t
            .dispatch_order(ListenerKind::Press)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(order, vec![capture, bubble]);
        assert!(t.has_capture(ListenerKind::Release));
        assert!(!t.has_capture(ListenerKind::PageHide));
    }

    #[test]
    fn pointer_kinds_map_to_listener_kinds() {
        assert_eq!(ListenerKind::from(PointerKind::Press), ListenerKind::Press);
        assert_eq!(ListenerKind::from(PointerKind::Release), ListenerKind::Release);
    }

    #[test]
    fn remove_unknown_is_false() {
        let mut t = ListenerTable::new();
        let id = t.add_listener(ListenerKind::PageHide, ListenPhase::Bubble);
        assert!(t.remove_listener(id));
        assert!(!t.remove_listener(id));
        assert!(t.is_empty());
    }
}
