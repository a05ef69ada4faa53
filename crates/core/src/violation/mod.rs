//! Integrity-violation detection.
//!
//! Each channel owns an independent `ViolationMonitor`; all of them share the
//! same terminal consequence, decided by the session controller.

mod event;
mod monitor;
mod selection;

pub use event::{DEVTOOLS_PAUSE_THRESHOLD, Detection, EnvironmentEvent, KeyCombo};
pub use monitor::{
    ViolationChannel, ViolationMonitor, ViolationMonitors, ViolationNotice, ViolationOutcome,
    ViolationPolicy,
};
pub use selection::{SelectionControl, SelectionLock};
