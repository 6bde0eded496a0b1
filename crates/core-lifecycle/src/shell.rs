//! Outbound notifications to the activation shell.

use crate::PageId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Messages an instrumented page sends to its activation shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ShellMessage {
    /// Instrumentation on the sending page is no longer active.
    ScriptInactive,
}

impl ShellMessage {
    pub fn to_wire(&self) -> Result<String, ShellError> {
        serde_json::to_string(self).map_err(|e| ShellError::Encode(e.to_string()))
    }

    pub fn from_wire(payload: &str) -> Result<Self, ShellError> {
        serde_json::from_str(payload).map_err(|e| ShellError::Encode(e.to_string()))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShellError {
    /// The shell side is gone (page closing, channel dropped). Expected during teardown.
    #[error("activation shell context invalidated")]
    ContextInvalidated,
    #[error("shell delivery failed: {0}")]
    Delivery(String),
    #[error("shell message encoding failed: {0}")]
    Encode(String),
}

/// Host capability: deliver a message to the activation shell.
pub trait ActivationShell {
    fn deliver(&mut self, page: PageId, message: ShellMessage) -> Result<(), ShellError>;
}

impl<T: ActivationShell + ?Sized> ActivationShell for &mut T {
    fn deliver(&mut self, page: PageId, message: ShellMessage) -> Result<(), ShellError> {
        (**self).deliver(page, message)
    }
}
