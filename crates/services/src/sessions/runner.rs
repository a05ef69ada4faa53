use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use quiz_core::model::{Answer, AnswerKey, Question, SessionResult, SessionState};
use quiz_core::violation::{EnvironmentEvent, ViolationChannel};

use super::controller::QuizSessionController;
use crate::error::SessionError;

const COMMAND_BUFFER: usize = 64;

/// One user action or host signal for a running session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Select(AnswerKey),
    Clear,
    Next,
    Previous,
    Finish,
    Event(EnvironmentEvent),
    Violation {
        channel: ViolationChannel,
        reason: String,
    },
}

/// What a renderer needs after every processed stimulus.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub current: usize,
    pub total: usize,
    pub answered: usize,
    pub remaining_secs: u64,
    pub remaining_ratio: f64,
    pub violations: u32,
    pub question: Option<Question>,
    pub answer: Answer,
}

impl SessionSnapshot {
    fn capture(controller: &QuizSessionController) -> Self {
        let progress = controller.progress();
        Self {
            state: controller.state(),
            current: progress.current,
            total: progress.total,
            answered: progress.answered,
            remaining_secs: progress.remaining_secs,
            remaining_ratio: controller.countdown().remaining_ratio(),
            violations: controller.violation_count(),
            question: controller.current_question().cloned(),
            answer: controller.current_answer(),
        }
    }
}

/// Cloneable sender side of a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// Queue a command for the session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::RunnerClosed` once the runner has stopped.
    pub async fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SessionError::RunnerClosed)
    }

    /// # Errors
    ///
    /// Returns `SessionError::RunnerClosed` once the runner has stopped.
    pub async fn select(&self, key: AnswerKey) -> Result<(), SessionError> {
        self.send(SessionCommand::Select(key)).await
    }

    /// # Errors
    ///
    /// Returns `SessionError::RunnerClosed` once the runner has stopped.
    pub async fn event(&self, event: EnvironmentEvent) -> Result<(), SessionError> {
        self.send(SessionCommand::Event(event)).await
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Resolves once the runner has stopped accepting commands.
    pub async fn closed(&self) {
        self.commands.closed().await;
    }
}

/// Drives a controller from one task: a command queue plus a one-second tick.
///
/// Stimuli are applied strictly one at a time, so the controller needs no
/// locking.
///
/// Remaining time counts processed ticks, while per-question seconds come
/// from the controller's clock (wall time by default). The two drift apart
/// when the interval falls behind.
pub struct SessionRunner {
    controller: QuizSessionController,
    commands: mpsc::Receiver<SessionCommand>,
    snapshots: watch::Sender<SessionSnapshot>,
    tick_period: Duration,
}

impl SessionRunner {
    #[must_use]
    pub fn new(controller: QuizSessionController) -> (Self, SessionHandle) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshots, _) = watch::channel(SessionSnapshot::capture(&controller));
        let runner = Self {
            controller,
            commands: rx,
            snapshots,
            tick_period: Duration::from_secs(1),
        };
        (runner, SessionHandle { commands: tx })
    }

    #[must_use]
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    #[must_use]
    pub fn controller(&self) -> &QuizSessionController {
        &self.controller
    }

    /// Load the session if needed and process stimuli until it leaves
    /// `InProgress`.
    ///
    /// A session left in `Completing` by a persistence failure gets one
    /// retry before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` when loading fails or the result cannot be
    /// persisted.
    pub async fn run(mut self) -> Result<SessionResult, SessionError> {
        self.controller.load().await?;
        self.publish();

        let mut interval = tokio::time::interval(self.tick_period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick resolves immediately.
        interval.tick().await;

        let mut failure = None;
        while self.controller.state() == SessionState::InProgress {
            let step = tokio::select! {
                _ = interval.tick() => self.controller.tick().await.map(|_| ()),
                command = self.commands.recv() => match command {
                    Some(command) => self.apply(command).await,
                    None => {
                        info!(
                            session = %self.controller.session_id(),
                            "every session handle dropped, submitting"
                        );
                        self.controller.complete(true).await.map(|_| ())
                    }
                },
            };
            self.publish();

            if let Err(err) = step {
                if err.is_recoverable() {
                    debug!(session = %self.controller.session_id(), %err, "command rejected");
                } else {
                    failure = Some(err);
                    break;
                }
            }
        }

        if self.controller.state() == SessionState::Completing {
            warn!(session = %self.controller.session_id(), "retrying result persistence");
            let retried = self.controller.finalize_result().await;
            self.publish();
            retried?;
        } else if let Some(err) = failure {
            return Err(err);
        }

        self.controller.result().cloned().ok_or(SessionError::NoResult)
    }

    async fn apply(&mut self, command: SessionCommand) -> Result<(), SessionError> {
        match command {
            SessionCommand::Select(key) => self.controller.select_answer(key),
            SessionCommand::Clear => self.controller.clear_answer(),
            SessionCommand::Next => self.controller.next_question().map(|_| ()),
            SessionCommand::Previous => self.controller.previous_question().map(|_| ()),
            SessionCommand::Finish => self.controller.finish().await.map(|_| ()),
            SessionCommand::Event(event) => self.controller.handle_event(&event).await.map(|_| ()),
            SessionCommand::Violation { channel, reason } => self
                .controller
                .report_violation(channel, &reason)
                .await
                .map(|_| ()),
        }
    }

    fn publish(&self) {
        self.snapshots
            .send_replace(SessionSnapshot::capture(&self.controller));
    }
}
