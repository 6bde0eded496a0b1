//! Mutation watching.
//!
//! `ChangeSource` is the capability a host page exposes for content-change
//! notifications. `MutationWatcher` keeps at most one live subscription on it:
//! starting always releases the previous subscription first. Hosts that keep
//! their own document model can embed `SubscriptionTable`, which implements
//! `ChangeSource` and queues records per subscription until the host delivers
//! them as batches.
//!
//! Delivery is pull-based on the host side (`SubscriptionTable::take_batches`)
//! and push-based toward the consumer (the host hands each `MutationBatch` to
//! whoever owns the watcher). The consumer checks `MutationWatcher::accepts`
//! so batches for a released subscription are ignored.

use tracing::{debug, trace};

bitflags::bitflags! {
    /// Which kinds of change a subscription wants to hear about.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct WatchOptions: u8 {
        const CHILD_LIST     = 0b0001;
        const ATTRIBUTES     = 0b0010;
        const CHARACTER_DATA = 0b0100;
        /// Include changes on descendants of the observed root, not only the root itself.
        const SUBTREE        = 0b1000;
    }
}

impl WatchOptions {
    /// Everything under the document root.
    pub const fn document() -> Self {
        Self::all()
    }
}

/// Node identity inside a host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationKind {
    ChildList { added: u32, removed: u32 },
    Attribute { name: String },
    CharacterData,
}

impl MutationKind {
    fn required(&self) -> WatchOptions {
        match self {
            MutationKind::ChildList { .. } => WatchOptions::CHILD_LIST,
            MutationKind::Attribute { .. } => WatchOptions::ATTRIBUTES,
            MutationKind::CharacterData => WatchOptions::CHARACTER_DATA,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MutationKind::ChildList { .. } => "child_list",
            MutationKind::Attribute { .. } => "attributes",
            MutationKind::CharacterData => "character_data",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeId,
    pub kind: MutationKind,
}

/// Records queued for one subscription since the previous delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationBatch {
    pub subscription: SubscriptionId,
    pub records: Vec<MutationRecord>,
}

/// Host capability: document-level change subscriptions.
pub trait ChangeSource {
    fn subscribe(&mut self, options: WatchOptions) -> SubscriptionId;
    /// Cancel a subscription and discard its queued records. Unknown ids are ignored.
    fn unsubscribe(&mut self, id: SubscriptionId);
}

impl<T: ChangeSource + ?Sized> ChangeSource for &mut T {
    fn subscribe(&mut self, options: WatchOptions) -> SubscriptionId {
        (**self).subscribe(options)
    }
    fn unsubscribe(&mut self, id: SubscriptionId) {
        (**self).unsubscribe(id)
    }
}

/// Owner of the (single) document subscription used to detect the first change
/// after an interaction.
#[derive(Debug, Default)]
pub struct MutationWatcher {
    active: Option<SubscriptionId>,
}

impl MutationWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any existing subscription with a fresh whole-document one.
    pub fn start<S: ChangeSource + ?Sized>(&mut self, source: &mut S) -> SubscriptionId {
        self.stop(source);
        let id = source.subscribe(WatchOptions::document());
        debug!(target: "watch", subscription = id.0, "watch_started");
        self.active = Some(id);
        id
    }

    /// Cancel the subscription if present. Returns whether one was live.
    pub fn stop<S: ChangeSource + ?Sized>(&mut self, source: &mut S) -> bool {
        match self.active.take() {
            Some(id) => {
                source.unsubscribe(id);
                debug!(target: "watch", subscription = id.0, "watch_stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn subscription(&self) -> Option<SubscriptionId> {
        self.active
    }

    /// True when `batch` belongs to the live subscription and carries records.
    pub fn accepts(&self, batch: &MutationBatch) -> bool {
        let ok = self.active == Some(batch.subscription) && !batch.records.is_empty();
        if !ok {
            trace!(
                target: "watch",
                subscription = batch.subscription.0,
                records = batch.records.len(),
                "batch_ignored"
            );
        }
        ok
    }
}

#[derive(Debug)]
struct Subscription {
    id: SubscriptionId,
    options: WatchOptions,
    pending: Vec<MutationRecord>,
}

/// Subscription bookkeeping for a host document rooted at `root`.
#[derive(Debug)]
pub struct SubscriptionTable {
    root: NodeId,
    next_id: u64,
    entries: Vec<Subscription>,
}

impl SubscriptionTable {
    pub fn new(root: NodeId) -> Self {
        Self {
            root,
            next_id: 1,
            entries: Vec::new(),
        }
    }

    /// Number of live subscriptions.
    pub fn live(&self) -> usize {
        self.entries.len()
    }

    pub fn has_pending(&self) -> bool {
        self.entries.iter().any(|s| !s.pending.is_empty())
    }

    /// Queue `record` for every subscription whose options cover it.
    pub fn notify(&mut self, record: MutationRecord) {
        let on_root = record.target == self.root;
        let needed = record.kind.required();
        for sub in &mut self.entries {
            if !sub.options.contains(needed) {
                continue;
            }
            if !on_root && !sub.options.contains(WatchOptions::SUBTREE) {
                continue;
            }
            sub.pending.push(record.clone());
        }
    }

    /// Drain queued records, one batch per subscription that has any.
    pub fn take_batches(&mut self) -> Vec<MutationBatch> {
        self.entries
            .iter_mut()
            .filter(|s| !s.pending.is_empty())
            .map(|s| MutationBatch {
                subscription: s.id,
                records: std::mem::take(&mut s.pending),
            })
            .collect()
    }

    /// Drop every subscription (document replaced).
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl ChangeSource for SubscriptionTable {
    fn subscribe(&mut self, options: WatchOptions) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push(Subscription {
            id,
            options,
            pending: Vec::new(),
        });
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.entries.retain(|s| s.id != id);
    }
}
