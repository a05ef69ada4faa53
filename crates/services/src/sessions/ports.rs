use quiz_core::violation::ViolationNotice;
use tracing::warn;

/// Moves the participant to the results view once a session is completed.
pub trait Navigator: Send + Sync {
    fn show_results(&self);
}

/// Surface that shows violation warnings to the participant.
pub trait ViolationNotifier: Send + Sync {
    /// A violation was registered but the session continues.
    fn warn(&self, notice: &ViolationNotice);

    /// The channel crossed its threshold; the session is being auto-submitted.
    fn disqualify(&self, notice: &ViolationNotice);
}

/// Notifier that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl ViolationNotifier for TracingNotifier {
    fn warn(&self, notice: &ViolationNotice) {
        warn!(
            channel = %notice.channel,
            count = notice.count,
            remaining = notice.remaining,
            "{}",
            notice.reason
        );
    }

    fn disqualify(&self, notice: &ViolationNotice) {
        warn!(
            channel = %notice.channel,
            count = notice.count,
            "{} Too many violations, submitting the quiz.",
            notice.reason
        );
    }
}
