//! Lifecycle manager: activation, listener installation and teardown for one
//! instrumented page.
//!
//! Activation is idempotent per page. `ActivationRegistry` tears down any prior
//! instance before installing a new one, so listeners are never duplicated.

pub mod input;
pub mod instrumentation;
pub mod registry;
pub mod shell;

pub use input::{InputSource, ListenPhase, ListenerId, ListenerKind, ListenerTable};
pub use instrumentation::{Instrumentation, PointerDispatch};
pub use registry::{ActivationRegistry, Teardown};
pub use shell::{ActivationShell, ShellError, ShellMessage};

use std::fmt;

/// Identity of one hosted page (document instance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u64);

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page#{}", self.0)
    }
}
