use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use quiz_core::ledger::AnswerLedger;
use quiz_core::model::{
    Answer, AnswerKey, Question, QuestionCount, QuestionSet, SessionId, SessionResult,
    SessionState,
};
use quiz_core::violation::{
    EnvironmentEvent, SelectionControl, SelectionLock, ViolationChannel, ViolationMonitors,
    ViolationOutcome, ViolationPolicy,
};
use quiz_core::{Clock, Countdown, Tick};
use storage::PersistenceGateway;
use storage::repository::{QuestionBankSource, StorageError};

use super::draw::QuestionDraw;
use super::ports::{Navigator, TracingNotifier, ViolationNotifier};
use super::progress::SessionProgress;
use crate::error::{LoadFailure, SessionError};

//
// ─── COMPLETION ────────────────────────────────────────────────────────────────
//

/// Outcome of a completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// This call moved the session to `Completed`.
    Completed(SessionResult),
    /// Another trigger already completed (or is completing) the session.
    AlreadyCompleted,
}

impl Completion {
    #[must_use]
    pub fn result(&self) -> Option<&SessionResult> {
        match self {
            Completion::Completed(result) => Some(result),
            Completion::AlreadyCompleted => None,
        }
    }
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// State machine for one proctored quiz attempt.
///
/// Owns the countdown, the violation monitors and the answer ledger. Every
/// mutating method takes `&mut self`; stimuli are expected to arrive one at a
/// time from a single owner (see `SessionRunner`).
pub struct QuizSessionController {
    id: SessionId,
    clock: Clock,
    state: SessionState,
    bank: Arc<dyn QuestionBankSource>,
    gateway: PersistenceGateway,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn ViolationNotifier>,
    selection: Option<Arc<dyn SelectionControl>>,
    draw: QuestionDraw,
    questions: QuestionSet,
    ledger: AnswerLedger,
    countdown: Countdown,
    monitors: ViolationMonitors,
    current: usize,
    selection_lock: Option<SelectionLock>,
    result: Option<SessionResult>,
    load_error: Option<LoadFailure>,
}

impl QuizSessionController {
    #[must_use]
    pub fn new(
        bank: Arc<dyn QuestionBankSource>,
        gateway: PersistenceGateway,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            id: SessionId::new_random(),
            clock: Clock::default(),
            state: SessionState::Loading,
            bank,
            gateway,
            navigator,
            notifier: Arc::new(TracingNotifier),
            selection: None,
            draw: QuestionDraw::new(),
            questions: QuestionSet::default(),
            ledger: AnswerLedger::new(0),
            countdown: Countdown::new(),
            monitors: ViolationMonitors::new(),
            current: 0,
            selection_lock: None,
            result: None,
            load_error: None,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn ViolationNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Disable text selection through `control` while the session runs.
    #[must_use]
    pub fn with_selection_control(mut self, control: Arc<dyn SelectionControl>) -> Self {
        self.selection = Some(control);
        self
    }

    /// Override the debounce/threshold pair of one channel.
    #[must_use]
    pub fn with_policy(mut self, channel: ViolationChannel, policy: ViolationPolicy) -> Self {
        self.monitors = self.monitors.with_policy(channel, policy);
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.draw = self.draw.with_seed(seed);
        self
    }

    /// Mutable access to the clock, for advancing fixed clocks in tests and demos.
    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    //
    // ─── ACCESSORS ─────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn questions(&self) -> &QuestionSet {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn current_answer(&self) -> Answer {
        self.ledger.answer(self.current).unwrap_or_default()
    }

    #[must_use]
    pub fn ledger(&self) -> &AnswerLedger {
        &self.ledger
    }

    #[must_use]
    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    #[must_use]
    pub fn monitors(&self) -> &ViolationMonitors {
        &self.monitors
    }

    /// Violations registered across every channel.
    #[must_use]
    pub fn violation_count(&self) -> u32 {
        self.monitors.total_count()
    }

    #[must_use]
    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn load_error(&self) -> Option<&LoadFailure> {
        self.load_error.as_ref()
    }

    #[must_use]
    pub fn is_last_question(&self) -> bool {
        self.current + 1 >= self.questions.len()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.questions.len(),
            answered: self.ledger.answered_count(),
            current: self.current,
            remaining_secs: self.countdown.remaining_secs(),
            is_complete: self.state.is_terminal(),
        }
    }

    //
    // ─── LOADING ───────────────────────────────────────────────────────────────
    //

    /// Fetch the bank, draw the question set and start the session.
    ///
    /// Calling this after the session has left `Loading` does nothing. A
    /// failed load is final: later calls return the same failure.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Load` when the bank is unreachable, malformed or
    /// empty.
    pub async fn load(&mut self) -> Result<(), SessionError> {
        if let Some(failure) = &self.load_error {
            return Err(SessionError::Load(failure.clone()));
        }
        if self.state != SessionState::Loading {
            return Ok(());
        }

        let questions = match self.prepare_questions().await {
            Ok(questions) => questions,
            Err(failure) => {
                warn!(session = %self.id, %failure, "session failed to load");
                self.load_error = Some(failure.clone());
                return Err(SessionError::Load(failure));
            }
        };

        if let Err(err) = self.gateway.save_question_set(&questions).await {
            warn!(session = %self.id, %err, "could not persist drawn questions");
        }

        let len = questions.len();
        let now = self.clock.now();
        self.ledger = AnswerLedger::new(len);
        self.questions = questions;
        self.current = 0;
        self.countdown.start(QuestionCount::time_limit_secs(len), now);
        if let Some(control) = &self.selection {
            self.selection_lock = Some(SelectionLock::acquire(Arc::clone(control)));
        }
        self.state = SessionState::InProgress;

        info!(
            session = %self.id,
            questions = len,
            time_limit_secs = self.countdown.total_secs(),
            "session started"
        );
        Ok(())
    }

    async fn prepare_questions(&self) -> Result<QuestionSet, LoadFailure> {
        let records = self.bank.fetch_questions().await.map_err(|err| match err {
            StorageError::Serialization(msg) => LoadFailure::Malformed(msg),
            other => LoadFailure::Unreachable(other.to_string()),
        })?;
        if records.is_empty() {
            return Err(LoadFailure::Empty);
        }

        let bank = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                record
                    .into_question()
                    .map_err(|err| LoadFailure::Malformed(format!("question {index}: {err}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let count = self
            .gateway
            .question_count(bank.len())
            .await
            .map_err(|err| LoadFailure::Unreachable(err.to_string()))?;

        QuestionSet::new(self.draw.draw(bank, count)).map_err(|_| LoadFailure::Empty)
    }

    //
    // ─── ANSWERS & NAVIGATION ──────────────────────────────────────────────────
    //

    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` outside `InProgress`.
    pub fn select_answer(&mut self, key: AnswerKey) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        self.ledger.select_answer(self.current, key)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` outside `InProgress`.
    pub fn clear_answer(&mut self) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        self.ledger.clear_answer(self.current)?;
        Ok(())
    }

    /// Move forward one question. Returns `false` on the last question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` outside `InProgress`.
    pub fn next_question(&mut self) -> Result<bool, SessionError> {
        self.ensure_in_progress()?;
        if self.is_last_question() {
            return Ok(false);
        }
        self.leave_current()?;
        self.current += 1;
        Ok(true)
    }

    /// Move back one question. Returns `false` on the first question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` outside `InProgress`.
    pub fn previous_question(&mut self) -> Result<bool, SessionError> {
        self.ensure_in_progress()?;
        if self.current == 0 {
            return Ok(false);
        }
        self.leave_current()?;
        self.current -= 1;
        Ok(true)
    }

    /// Record time spent on the question being left and restart the mark.
    fn leave_current(&mut self) -> Result<(), SessionError> {
        let now = self.clock.now();
        let elapsed = self.countdown.elapsed_since_mark(now);
        self.ledger.record_elapsed(self.current, elapsed)?;
        self.countdown.mark(now);
        Ok(())
    }

    //
    // ─── STIMULI ───────────────────────────────────────────────────────────────
    //

    /// Advance the countdown by one second, auto-submitting on expiry.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if completion triggered by expiry fails.
    pub async fn tick(&mut self) -> Result<Tick, SessionError> {
        if self.state != SessionState::InProgress {
            return Ok(Tick::Idle);
        }
        let tick = self.countdown.tick();
        if tick == Tick::Expired {
            info!(session = %self.id, "time is up");
            self.complete(true).await?;
        }
        Ok(tick)
    }

    /// Route a violation to the channel's monitor.
    ///
    /// An escalation forces `complete(true)`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if completion triggered by escalation fails.
    pub async fn report_violation(
        &mut self,
        channel: ViolationChannel,
        reason: &str,
    ) -> Result<ViolationOutcome, SessionError> {
        if self.state != SessionState::InProgress {
            debug!(session = %self.id, %channel, state = ?self.state, "violation ignored");
            return Ok(ViolationOutcome::Detached);
        }

        let outcome = self.monitors.report(channel, reason, self.clock.now());
        match &outcome {
            ViolationOutcome::Warning(notice) => {
                warn!(
                    session = %self.id,
                    %channel,
                    count = notice.count,
                    remaining = notice.remaining,
                    "violation registered"
                );
                self.notifier.warn(notice);
            }
            ViolationOutcome::Escalated(notice) => {
                warn!(session = %self.id, %channel, count = notice.count, "violation threshold crossed");
                self.notifier.disqualify(notice);
                self.complete(true).await?;
            }
            ViolationOutcome::Suppressed => {
                debug!(session = %self.id, %channel, "violation suppressed by debounce");
            }
            ViolationOutcome::AlreadyEscalated { count } => {
                debug!(session = %self.id, %channel, count, "violation after escalation");
            }
            ViolationOutcome::Detached => {}
        }
        Ok(outcome)
    }

    /// Classify a raw host event and report it. Harmless events yield `None`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if completion triggered by escalation fails.
    pub async fn handle_event(
        &mut self,
        event: &EnvironmentEvent,
    ) -> Result<Option<ViolationOutcome>, SessionError> {
        let Some(detection) = event.classify() else {
            return Ok(None);
        };
        let outcome = self
            .report_violation(detection.channel, &detection.reason)
            .await?;
        Ok(Some(outcome))
    }

    /// Manual finish from the last question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotOnLastQuestion` anywhere else, and
    /// `SessionError::NotInProgress` outside `InProgress`.
    pub async fn finish(&mut self) -> Result<Completion, SessionError> {
        self.ensure_in_progress()?;
        if !self.is_last_question() {
            return Err(SessionError::NotOnLastQuestion {
                index: self.current,
                last: self.questions.len().saturating_sub(1),
            });
        }
        self.complete(false).await
    }

    //
    // ─── COMPLETION ────────────────────────────────────────────────────────────
    //

    /// Finish the session. Only the first call from `InProgress` has an
    /// effect; every later call returns `Completion::AlreadyCompleted`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` while loading and
    /// `SessionError::Storage` if the result cannot be persisted. In the latter
    /// case the session stays `Completing`; use `finalize_result` to retry.
    pub async fn complete(&mut self, auto_submitted: bool) -> Result<Completion, SessionError> {
        match self.state {
            SessionState::Loading => return Err(SessionError::NotStarted),
            SessionState::Completing | SessionState::Completed => {
                debug!(
                    session = %self.id,
                    auto_submitted,
                    state = ?self.state,
                    "duplicate completion absorbed"
                );
                return Ok(Completion::AlreadyCompleted);
            }
            SessionState::InProgress => {}
        }

        self.state = SessionState::Completing;
        let now = self.clock.now();
        let elapsed = self.countdown.elapsed_since_mark(now);
        self.teardown();

        self.ledger.record_elapsed(self.current, elapsed)?;
        let tally = self.ledger.finalize(&self.questions);
        let result = SessionResult::from_tally(tally, auto_submitted, now)?;
        info!(
            session = %self.id,
            score = result.final_score(),
            total = result.total_questions(),
            auto_submitted,
            "session completing"
        );
        self.result = Some(result);

        self.persist_result().await
    }

    /// Retry persisting a result after `complete` failed to store it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` while loading,
    /// `SessionError::NoResult` while still in progress, and
    /// `SessionError::Storage` if persistence fails again.
    pub async fn finalize_result(&mut self) -> Result<Completion, SessionError> {
        match self.state {
            SessionState::Loading => Err(SessionError::NotStarted),
            SessionState::InProgress => Err(SessionError::NoResult),
            SessionState::Completing => self.persist_result().await,
            SessionState::Completed => Ok(Completion::AlreadyCompleted),
        }
    }

    async fn persist_result(&mut self) -> Result<Completion, SessionError> {
        let result = self.result.clone().ok_or(SessionError::NoResult)?;
        if let Err(err) = self.gateway.save_result(&result).await {
            warn!(session = %self.id, %err, "could not persist session result");
            return Err(err.into());
        }

        self.state = SessionState::Completed;
        info!(session = %self.id, "session completed");
        self.navigator.show_results();
        Ok(Completion::Completed(result))
    }

    /// Stop everything that could produce further stimuli.
    fn teardown(&mut self) {
        self.countdown.stop();
        self.monitors.detach_all();
        if let Some(lock) = self.selection_lock.take() {
            lock.release();
        }
    }

    fn ensure_in_progress(&self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Loading => Err(SessionError::NotStarted),
            SessionState::InProgress => Ok(()),
            SessionState::Completing | SessionState::Completed => Err(SessionError::NotInProgress),
        }
    }
}

impl fmt::Debug for QuizSessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSessionController")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("countdown", &self.countdown)
            .field("violations", &self.monitors.total_count())
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
