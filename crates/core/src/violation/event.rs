use std::time::Duration;

use super::ViolationChannel;

/// Debugger pauses longer than this are taken as open developer tools.
pub const DEVTOOLS_PAUSE_THRESHOLD: Duration = Duration::from_millis(10);

/// A key press as reported by the host environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCombo {
    pub key: String,
    pub ctrl: bool,
    pub shift: bool,
}

impl KeyCombo {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ctrl: false,
            shift: false,
        }
    }

    #[must_use]
    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    #[must_use]
    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    /// F12, Ctrl+Shift+I/J/C and Ctrl+U.
    #[must_use]
    pub fn opens_devtools(&self) -> bool {
        let key = self.key.as_str();
        key == "F12"
            || (self.ctrl && self.shift && matches!(key, "I" | "J" | "C"))
            || (self.ctrl && key == "U")
    }
}

/// Raw signal from the host environment, produced by the UI layer's adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentEvent {
    VisibilityHidden,
    VisibilityVisible,
    WindowBlur,
    Copy,
    Cut,
    Paste,
    ContextMenu,
    KeyDown(KeyCombo),
    /// Measured skew across a breakpoint-like pause; probed once per second.
    DebuggerPause(Duration),
    FullscreenExited,
}

/// A classified violation, ready for the channel's monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub channel: ViolationChannel,
    pub reason: String,
}

impl Detection {
    fn new(channel: ViolationChannel, reason: impl Into<String>) -> Self {
        Self {
            channel,
            reason: reason.into(),
        }
    }
}

impl EnvironmentEvent {
    /// Map the event onto a channel, or `None` when it is harmless.
    #[must_use]
    pub fn classify(&self) -> Option<Detection> {
        match self {
            EnvironmentEvent::VisibilityHidden | EnvironmentEvent::WindowBlur => Some(
                Detection::new(
                    ViolationChannel::TabSwitch,
                    "Switching tabs or minimizing is not allowed!",
                ),
            ),
            EnvironmentEvent::VisibilityVisible => None,
            EnvironmentEvent::Copy => Some(clipboard("copy")),
            EnvironmentEvent::Cut => Some(clipboard("cut")),
            EnvironmentEvent::Paste => Some(clipboard("paste")),
            EnvironmentEvent::ContextMenu => Some(Detection::new(
                ViolationChannel::DevTools,
                "Right-click is disabled!",
            )),
            EnvironmentEvent::KeyDown(combo) if combo.opens_devtools() => Some(Detection::new(
                ViolationChannel::DevTools,
                "Developer tools are not allowed!",
            )),
            EnvironmentEvent::KeyDown(_) => None,
            EnvironmentEvent::DebuggerPause(pause) if *pause > DEVTOOLS_PAUSE_THRESHOLD => Some(
                Detection::new(ViolationChannel::DevTools, "DevTools detected! Please close it."),
            ),
            EnvironmentEvent::DebuggerPause(_) => None,
            EnvironmentEvent::FullscreenExited => Some(Detection::new(
                ViolationChannel::Fullscreen,
                "You must stay in fullscreen mode!",
            )),
        }
    }
}

fn clipboard(kind: &str) -> Detection {
    Detection::new(
        ViolationChannel::Clipboard,
        format!("\"{kind}\" action is not allowed!"),
    )
}
