use std::sync::Arc;

use quiz_core::ledger::LedgerTally;
use quiz_core::model::{Answer, AnswerKey, QuestionCount, SessionResult};
use quiz_core::time::fixed_now;
use storage::gateway::keys;
use storage::repository::{KeyValueStore, Storage};
use storage::sqlite::SqliteRepository;
use storage::PersistenceGateway;

#[tokio::test]
async fn sqlite_store_round_trips_values() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_kv_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    // Running migrations twice must be harmless.
    repo.migrate().await.expect("migrate again");

    assert_eq!(repo.get("missing").await.unwrap(), None);

    repo.set("questionCount", "20").await.unwrap();
    repo.set("questionCount", "30").await.unwrap();
    assert_eq!(repo.get("questionCount").await.unwrap().as_deref(), Some("30"));

    repo.remove("questionCount").await.unwrap();
    repo.remove("questionCount").await.unwrap();
    assert_eq!(repo.get("questionCount").await.unwrap(), None);

    repo.set("a", "1").await.unwrap();
    repo.set("b", "2").await.unwrap();
    repo.clear().await.unwrap();
    assert_eq!(repo.get("a").await.unwrap(), None);
    assert_eq!(repo.get("b").await.unwrap(), None);
}

#[tokio::test]
async fn gateway_persists_results_in_sqlite() {
    let storage = Storage::sqlite("sqlite:file:memdb_kv_gateway?mode=memory&cache=shared")
        .await
        .expect("storage");
    let gateway = PersistenceGateway::new(Arc::clone(&storage.store));

    gateway
        .set_question_count(QuestionCount::new(40).unwrap())
        .await
        .unwrap();
    assert_eq!(gateway.question_count(100).await.unwrap(), 40);

    let result = SessionResult::from_tally(
        LedgerTally {
            score: 2,
            answers: vec![
                Answer::Selected(AnswerKey::B),
                Answer::Selected(AnswerKey::C),
                Answer::Unanswered,
            ],
            time_spent: vec![3, 9, 0],
        },
        true,
        fixed_now(),
    )
    .unwrap();
    gateway.save_result(&result).await.unwrap();

    assert_eq!(gateway.score().await.unwrap(), 2);
    assert_eq!(gateway.total_questions().await.unwrap(), 3);
    assert_eq!(gateway.time_spent().await.unwrap(), vec![3, 9, 0]);
    assert_eq!(gateway.answers().await.unwrap(), result.answers().to_vec());
    assert!(gateway.auto_submitted().await.unwrap());
    assert_eq!(
        storage.store.get(keys::AUTO_SUBMITTED).await.unwrap().as_deref(),
        Some("true")
    );

    gateway.clear_results().await.unwrap();
    assert_eq!(gateway.score().await.unwrap(), 0);
    assert!(!gateway.auto_submitted().await.unwrap());
}
