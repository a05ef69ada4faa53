use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

//
// ─── CHANNEL ──────────────────────────────────────────────────────────────────
//

/// One category of suspected cheating behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ViolationChannel {
    /// Document hidden or window lost focus.
    TabSwitch,
    /// Copy, cut or paste attempts.
    Clipboard,
    /// Context menu, devtools shortcuts, debugger-pause heuristic.
    DevTools,
    /// Leaving fullscreen mode.
    Fullscreen,
}

impl ViolationChannel {
    pub const ALL: [ViolationChannel; 4] = [
        ViolationChannel::TabSwitch,
        ViolationChannel::Clipboard,
        ViolationChannel::DevTools,
        ViolationChannel::Fullscreen,
    ];

    fn index(self) -> usize {
        match self {
            ViolationChannel::TabSwitch => 0,
            ViolationChannel::Clipboard => 1,
            ViolationChannel::DevTools => 2,
            ViolationChannel::Fullscreen => 3,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ViolationChannel::TabSwitch => "tab_switch",
            ViolationChannel::Clipboard => "clipboard",
            ViolationChannel::DevTools => "devtools",
            ViolationChannel::Fullscreen => "fullscreen",
        }
    }

    /// Policy the channel runs with unless configured otherwise.
    #[must_use]
    pub fn default_policy(self) -> ViolationPolicy {
        match self {
            ViolationChannel::Fullscreen => ViolationPolicy::fullscreen(),
            _ => ViolationPolicy::standard(),
        }
    }
}

impl fmt::Display for ViolationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── POLICY ───────────────────────────────────────────────────────────────────
//

/// Debounce window and warning budget for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViolationPolicy {
    debounce: Duration,
    allowed_warnings: u32,
}

impl ViolationPolicy {
    pub const STANDARD_DEBOUNCE_MS: i64 = 1_000;
    pub const STANDARD_ALLOWED_WARNINGS: u32 = 2;
    pub const FULLSCREEN_ALLOWED_WARNINGS: u32 = 4;

    /// `allowed_warnings` violations are tolerated; the next one escalates.
    /// A negative debounce is treated as zero.
    #[must_use]
    pub fn new(debounce: Duration, allowed_warnings: u32) -> Self {
        Self {
            debounce: debounce.max(Duration::zero()),
            allowed_warnings,
        }
    }

    /// 1 second debounce, escalation on the 3rd violation.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(
            Duration::milliseconds(Self::STANDARD_DEBOUNCE_MS),
            Self::STANDARD_ALLOWED_WARNINGS,
        )
    }

    /// No debounce, escalation on the 5th fullscreen exit.
    #[must_use]
    pub fn fullscreen() -> Self {
        Self::new(Duration::zero(), Self::FULLSCREEN_ALLOWED_WARNINGS)
    }

    #[must_use]
    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    #[must_use]
    pub fn allowed_warnings(&self) -> u32 {
        self.allowed_warnings
    }

    /// Count at which the channel escalates.
    #[must_use]
    pub fn threshold(&self) -> u32 {
        self.allowed_warnings.saturating_add(1)
    }
}

impl Default for ViolationPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

//
// ─── MONITOR ──────────────────────────────────────────────────────────────────
//

/// What a registered violation looked like, for the warning surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolationNotice {
    pub channel: ViolationChannel,
    pub reason: String,
    pub count: u32,
    /// Violations still tolerated before escalation; zero when escalating.
    pub remaining: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationOutcome {
    /// Monitor no longer attached to a live session.
    Detached,
    /// Arrived inside the debounce window and was dropped.
    Suppressed,
    Warning(ViolationNotice),
    /// Threshold crossed. Returned once per monitor.
    Escalated(ViolationNotice),
    /// Registered after the monitor had already escalated.
    AlreadyEscalated { count: u32 },
}

impl ViolationOutcome {
    #[must_use]
    pub fn is_escalation(&self) -> bool {
        matches!(self, ViolationOutcome::Escalated(_))
    }
}

/// Debounced violation counter for a single channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolationMonitor {
    channel: ViolationChannel,
    policy: ViolationPolicy,
    count: u32,
    last_registered_at: Option<DateTime<Utc>>,
    escalated: bool,
    attached: bool,
}

impl ViolationMonitor {
    #[must_use]
    pub fn new(channel: ViolationChannel, policy: ViolationPolicy) -> Self {
        Self {
            channel,
            policy,
            count: 0,
            last_registered_at: None,
            escalated: false,
            attached: true,
        }
    }

    #[must_use]
    pub fn channel(&self) -> ViolationChannel {
        self.channel
    }

    #[must_use]
    pub fn policy(&self) -> ViolationPolicy {
        self.policy
    }

    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    #[must_use]
    pub fn last_registered_at(&self) -> Option<DateTime<Utc>> {
        self.last_registered_at
    }

    #[must_use]
    pub fn has_escalated(&self) -> bool {
        self.escalated
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Stop accepting reports. Idempotent.
    pub fn detach(&mut self) {
        self.attached = false;
    }

    /// Register a violation observed at `now`.
    pub fn report(&mut self, reason: &str, now: DateTime<Utc>) -> ViolationOutcome {
        if !self.attached {
            return ViolationOutcome::Detached;
        }
        if let Some(last) = self.last_registered_at {
            if now - last < self.policy.debounce {
                return ViolationOutcome::Suppressed;
            }
        }

        self.count = self.count.saturating_add(1);
        self.last_registered_at = Some(now);

        if self.escalated {
            return ViolationOutcome::AlreadyEscalated { count: self.count };
        }

        let remaining = self.policy.threshold().saturating_sub(self.count);
        let notice = ViolationNotice {
            channel: self.channel,
            reason: reason.to_string(),
            count: self.count,
            remaining,
        };
        if remaining > 0 {
            ViolationOutcome::Warning(notice)
        } else {
            self.escalated = true;
            ViolationOutcome::Escalated(notice)
        }
    }
}

//
// ─── MONITOR SET ──────────────────────────────────────────────────────────────
//

/// One monitor per channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolationMonitors {
    monitors: [ViolationMonitor; 4],
}

impl ViolationMonitors {
    /// Monitors for every channel, each with its default policy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            monitors: ViolationChannel::ALL
                .map(|channel| ViolationMonitor::new(channel, channel.default_policy())),
        }
    }

    /// Replace the policy of one channel, resetting its state.
    #[must_use]
    pub fn with_policy(mut self, channel: ViolationChannel, policy: ViolationPolicy) -> Self {
        self.monitors[channel.index()] = ViolationMonitor::new(channel, policy);
        self
    }

    #[must_use]
    pub fn get(&self, channel: ViolationChannel) -> &ViolationMonitor {
        &self.monitors[channel.index()]
    }

    pub fn report(
        &mut self,
        channel: ViolationChannel,
        reason: &str,
        now: DateTime<Utc>,
    ) -> ViolationOutcome {
        self.monitors[channel.index()].report(reason, now)
    }

    pub fn detach_all(&mut self) {
        for monitor in &mut self.monitors {
            monitor.detach();
        }
    }

    /// Registered violations summed across every channel.
    #[must_use]
    pub fn total_count(&self) -> u32 {
        self.monitors
            .iter()
            .fold(0_u32, |acc, m| acc.saturating_add(m.count()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ViolationMonitor> {
        self.monitors.iter()
    }
}

impl Default for ViolationMonitors {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn at(ms: i64) -> DateTime<Utc> {
        fixed_now() + Duration::milliseconds(ms)
    }

    #[test]
    fn reports_inside_debounce_window_count_once() {
        let mut monitor = ViolationMonitor::new(ViolationChannel::TabSwitch, ViolationPolicy::standard());
        assert!(matches!(monitor.report("blur", at(0)), ViolationOutcome::Warning(_)));
        assert_eq!(monitor.report("blur", at(400)), ViolationOutcome::Suppressed);
        assert_eq!(monitor.count(), 1);
        assert_eq!(monitor.last_registered_at(), Some(at(0)));
    }

    #[test]
    fn reports_outside_debounce_window_count_twice() {
        let mut monitor = ViolationMonitor::new(ViolationChannel::Clipboard, ViolationPolicy::standard());
        monitor.report("copy", at(0));
        monitor.report("copy", at(1_001));
        assert_eq!(monitor.count(), 2);
    }

    #[test]
    fn debounce_boundary_is_inclusive_of_full_window() {
        let mut monitor = ViolationMonitor::new(ViolationChannel::Clipboard, ViolationPolicy::standard());
        monitor.report("copy", at(0));
        monitor.report("copy", at(1_000));
        assert_eq!(monitor.count(), 2);
    }

    #[test]
    fn escalates_on_third_violation_once() {
        let mut monitor = ViolationMonitor::new(ViolationChannel::DevTools, ViolationPolicy::standard());

        let first = monitor.report("F12", at(0));
        let ViolationOutcome::Warning(notice) = first else {
            panic!("expected warning, got {first:?}");
        };
        assert_eq!(notice.remaining, 2);
        assert_eq!(notice.reason, "F12");

        let ViolationOutcome::Warning(notice) = monitor.report("F12", at(2_000)) else {
            panic!("expected warning");
        };
        assert_eq!(notice.remaining, 1);

        let third = monitor.report("F12", at(4_000));
        assert!(third.is_escalation());
        assert!(monitor.has_escalated());

        assert_eq!(
            monitor.report("F12", at(6_000)),
            ViolationOutcome::AlreadyEscalated { count: 4 }
        );
        assert_eq!(monitor.count(), 4);
    }

    #[test]
    fn zero_allowed_warnings_escalates_immediately() {
        let mut monitor = ViolationMonitor::new(
            ViolationChannel::TabSwitch,
            ViolationPolicy::new(Duration::zero(), 0),
        );
        assert!(monitor.report("blur", at(0)).is_escalation());
    }

    #[test]
    fn fullscreen_tolerates_four_exits_without_debounce() {
        let mut monitor =
            ViolationMonitor::new(ViolationChannel::Fullscreen, ViolationChannel::Fullscreen.default_policy());
        for _ in 0..4 {
            assert!(matches!(monitor.report("exit", at(0)), ViolationOutcome::Warning(_)));
        }
        assert!(monitor.report("exit", at(0)).is_escalation());
    }

    #[test]
    fn detached_monitor_ignores_reports() {
        let mut monitor = ViolationMonitor::new(ViolationChannel::TabSwitch, ViolationPolicy::standard());
        monitor.detach();
        monitor.detach();
        assert_eq!(monitor.report("blur", at(0)), ViolationOutcome::Detached);
        assert_eq!(monitor.count(), 0);
    }

    #[test]
    fn channels_count_independently_into_global_total() {
        let mut monitors = ViolationMonitors::new();
        monitors.report(ViolationChannel::TabSwitch, "blur", at(0));
        monitors.report(ViolationChannel::Clipboard, "copy", at(10));
        monitors.report(ViolationChannel::Clipboard, "paste", at(20));

        assert_eq!(monitors.get(ViolationChannel::TabSwitch).count(), 1);
        assert_eq!(monitors.get(ViolationChannel::Clipboard).count(), 1);
        assert_eq!(monitors.total_count(), 2);

        monitors.detach_all();
        assert!(monitors.iter().all(|m| !m.is_attached()));
    }

    #[test]
    fn custom_policy_replaces_default() {
        let monitors = ViolationMonitors::new()
            .with_policy(ViolationChannel::DevTools, ViolationPolicy::new(Duration::zero(), 7));
        assert_eq!(monitors.get(ViolationChannel::DevTools).policy().threshold(), 8);
    }
}
