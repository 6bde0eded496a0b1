//! Interaction-to-mutation timing.
//!
//! `InteractionController` is the single owner of the timing session, the
//! document subscription and the pending timeout for one instrumented page.
//! It reaches the outside world only through three capabilities:
//! `ChangeSource` (document changes), `TimerHost` (timeouts) and `Clock`.

pub mod clock;
pub mod controller;
pub mod settings;

pub use clock::{Clock, ManualClock, MonotonicClock, TimerHost};
pub use controller::{
    ControllerMetrics, InteractionController, InteractionSession, Measurement, Phase,
    PressOutcome, ReleaseOutcome, Resolution,
};
pub use settings::SessionSettings;
