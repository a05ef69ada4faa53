use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Duration;
use quiz_core::model::{AnswerKey, SessionState};
use quiz_core::time::fixed_clock;
use quiz_core::violation::{EnvironmentEvent, KeyCombo, ViolationChannel, ViolationPolicy};
use services::{
    LoadFailure, Navigator, QuizSessionController, SessionCommand, SessionError, SessionRunner,
};
use storage::PersistenceGateway;
use storage::gateway::keys;
use storage::repository::{InMemoryQuestionBank, InMemoryStore, KeyValueStore, QuestionRecord};

#[derive(Default)]
struct CountingNavigator {
    calls: AtomicUsize,
}

impl Navigator for CountingNavigator {
    fn show_results(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

fn bank(len: usize) -> Vec<QuestionRecord> {
    (0..len)
        .map(|i| QuestionRecord {
            question: format!("{i} + {i} = ?"),
            a: format!("{}", i * 2),
            b: format!("{}", i * 2 + 1),
            c: format!("{}", i * 2 + 2),
            d: format!("{}", i * 2 + 3),
            answer: "A".into(),
        })
        .collect()
}

fn controller(
    records: Vec<QuestionRecord>,
) -> (QuizSessionController, InMemoryStore, Arc<CountingNavigator>) {
    let store = InMemoryStore::new();
    let navigator = Arc::new(CountingNavigator::default());
    let controller = QuizSessionController::new(
        Arc::new(InMemoryQuestionBank::new(records)),
        PersistenceGateway::new(Arc::new(store.clone())),
        navigator.clone(),
    )
    .with_clock(fixed_clock());
    (controller, store, navigator)
}

#[tokio::test(start_paused = true)]
async fn queued_commands_finish_the_session() {
    let (controller, store, navigator) = controller(bank(2));
    let (runner, handle) = SessionRunner::new(controller);
    let snapshots = runner.subscribe();

    handle.select(AnswerKey::A).await.unwrap();
    handle.send(SessionCommand::Next).await.unwrap();
    handle.select(AnswerKey::B).await.unwrap();
    handle.send(SessionCommand::Finish).await.unwrap();

    let result = runner.run().await.unwrap();

    assert!(!result.auto_submitted());
    assert_eq!(result.total_questions(), 2);
    assert_eq!(result.final_score(), 1);
    assert_eq!(navigator.calls.load(Ordering::SeqCst), 1);
    assert_eq!(snapshots.borrow().state, SessionState::Completed);
    assert_eq!(store.get(keys::SCORE).await.unwrap().as_deref(), Some("1"));
    assert!(handle.is_closed());
}

#[tokio::test(start_paused = true)]
async fn finish_before_last_question_does_not_stop_the_runner() {
    let (controller, _, _) = controller(bank(2));
    let (runner, handle) = SessionRunner::new(controller);

    handle.send(SessionCommand::Finish).await.unwrap();
    handle.send(SessionCommand::Next).await.unwrap();
    handle.send(SessionCommand::Next).await.unwrap();
    handle.send(SessionCommand::Finish).await.unwrap();

    let result = runner.run().await.unwrap();
    assert!(!result.auto_submitted());
}

#[tokio::test(start_paused = true)]
async fn countdown_expiry_auto_submits() {
    let (controller, _, navigator) = controller(bank(2));
    let (runner, handle) = SessionRunner::new(controller);
    let snapshots = runner.subscribe();

    // The handle stays alive, so only the timer can end the session.
    let result = runner.run().await.unwrap();

    assert!(result.auto_submitted());
    assert_eq!(result.time_spent().len(), 2);
    assert_eq!(snapshots.borrow().remaining_secs, 0);
    assert_eq!(navigator.calls.load(Ordering::SeqCst), 1);
    drop(handle);
}

#[tokio::test(start_paused = true)]
async fn dropping_every_handle_auto_submits() {
    let (controller, _, _) = controller(bank(3));
    let (runner, handle) = SessionRunner::new(controller);
    let second = handle.clone();

    second.select(AnswerKey::A).await.unwrap();
    drop(handle);
    drop(second);

    let result = runner.run().await.unwrap();
    assert!(result.auto_submitted());
    assert_eq!(result.final_score(), 1);
}

#[tokio::test(start_paused = true)]
async fn escalation_through_events_auto_submits() {
    let (controller, store, navigator) = controller(bank(3));
    let controller = controller
        .with_policy(
            ViolationChannel::DevTools,
            ViolationPolicy::new(Duration::zero(), 2),
        );
    let (runner, handle) = SessionRunner::new(controller);

    handle
        .event(EnvironmentEvent::KeyDown(KeyCombo::new("F12")))
        .await
        .unwrap();
    handle.event(EnvironmentEvent::ContextMenu).await.unwrap();
    handle
        .event(EnvironmentEvent::KeyDown(
            KeyCombo::new("I").with_ctrl().with_shift(),
        ))
        .await
        .unwrap();

    let result = runner.run().await.unwrap();
    assert!(result.auto_submitted());
    assert_eq!(
        store.get(keys::AUTO_SUBMITTED).await.unwrap().as_deref(),
        Some("true")
    );
    assert_eq!(navigator.calls.load(Ordering::SeqCst), 1);

    // The runner is gone; further commands are refused.
    assert!(matches!(
        handle.send(SessionCommand::Clear).await,
        Err(SessionError::RunnerClosed)
    ));
}

#[tokio::test(start_paused = true)]
async fn load_failure_stops_the_runner() {
    let (controller, _, navigator) = controller(Vec::new());
    let (runner, _handle) = SessionRunner::new(controller);

    let err = runner.run().await.unwrap_err();
    assert!(matches!(err, SessionError::Load(LoadFailure::Empty)));
    assert_eq!(navigator.calls.load(Ordering::SeqCst), 0);
}
