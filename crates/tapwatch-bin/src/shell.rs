//! Activation shell: the host-side counterpart of an instrumented page.
//!
//! `ShellPort` is the page's end. It encodes messages to wire JSON and posts
//! them on the runtime channel, so delivery is asynchronous. `StatusShell` is
//! the receiving end and owns the active/inactive indicator.
//!
//! Every activation gets a fresh instance number. A replaced activation's
//! `scriptInactive` can arrive after its successor went live, so the shell only
//! honours messages from the instance it currently considers active.

use core_events::Event;
use core_lifecycle::{ActivationShell, PageId, ShellError, ShellMessage};
use std::collections::HashMap;
use tokio::sync::mpsc::Sender;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ShellPort {
    tx: Sender<Event>,
    instance: u64,
}

impl ShellPort {
    pub fn new(tx: Sender<Event>, instance: u64) -> Self {
        Self { tx, instance }
    }
}

impl ActivationShell for ShellPort {
    fn deliver(&mut self, page: PageId, message: ShellMessage) -> Result<(), ShellError> {
        let payload = message.to_wire()?;
        match self.tx.try_send(Event::ShellMessage {
            page: page.0,
            instance: self.instance,
            payload,
        }) {
            Ok(()) => Ok(()),
            Err(TrySendError::Closed(_)) => Err(ShellError::ContextInvalidated),
            Err(TrySendError::Full(_)) => Err(ShellError::Delivery("event channel full".into())),
        }
    }
}

#[derive(Debug, Default)]
pub struct StatusShell {
    /// Active page -> instance currently installed there.
    active: HashMap<PageId, u64>,
}

impl StatusShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self, page: PageId) -> bool {
        self.active.contains_key(&page)
    }

    pub fn mark_active(&mut self, page: PageId, instance: u64) {
        self.active.insert(page, instance);
        info!(target: "lifecycle.shell", %page, instance, "indicator_active");
    }

    pub fn mark_inactive(&mut self, page: PageId) {
        if self.active.remove(&page).is_some() {
            info!(target: "lifecycle.shell", %page, "indicator_inactive");
        }
    }

    /// Handle a wire message posted by a page. Undecodable payloads are logged and dropped.
    pub fn receive(&mut self, page: PageId, instance: u64, payload: &str) {
        match ShellMessage::from_wire(payload) {
            Ok(ShellMessage::ScriptInactive) => {
                if self.active.get(&page) == Some(&instance) {
                    debug!(target: "lifecycle.shell", %page, instance, "script_inactive_received");
                    self.mark_inactive(page);
                } else {
                    debug!(target: "lifecycle.shell", %page, instance, "stale_script_inactive_ignored");
                }
            }
            Err(e) => warn!(target: "lifecycle.shell", %page, error = %e, "shell_message_rejected"),
        }
    }
}
