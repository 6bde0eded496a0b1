//! tapwatch host: runs the demo page in the terminal and drives the
//! interaction timing core from real mouse input.

pub mod host;
pub mod runtime;
pub mod shell;

pub use host::{PageTaskScheduler, TokioTimerHost};
pub use runtime::{HOSTED_PAGE, LoopControl, PageInstrumentation, Runtime, STATUS_ROWS, ShutdownReason};
pub use shell::{ShellPort, StatusShell};
