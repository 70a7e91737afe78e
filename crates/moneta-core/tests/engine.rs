//! Chat engine integration tests against mock backends.

use moneta_core::{
    ChatEngine, ChatMode, ChatStore, ERROR_REPLY, FOLLOW_UP_PROMPT, JsonlChatStore, RiskCategory,
    Role, TurnOutcome,
};
use moneta_test_utils::{
    FailingBackend, FixedBackend, GatedBackend, MemoryChatStore, RecordingBackend,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tempfile::tempdir;

/// Submitted turns produce an alternating (user, assistant) log that a
/// reload reproduces exactly.
#[tokio::test]
async fn alternating_log_is_reproduced_on_reload() {
    let temp = tempdir().expect("tempdir");
    let store = Arc::new(JsonlChatStore::new(temp.path()).expect("store"));
    let engine = ChatEngine::new(
        store.clone(),
        Arc::new(FixedBackend::new("noted")),
        ChatMode::Assistant,
    );

    engine.submit("hello").await.expect("first turn");
    engine.submit("what is a bond?").await.expect("second turn");

    let roles: Vec<Role> = engine
        .history()
        .await
        .expect("history")
        .iter()
        .map(|message| message.role)
        .collect();
    assert_eq!(
        roles,
        vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
    );

    let reloaded = JsonlChatStore::new(temp.path()).expect("reopen");
    let replayed = ChatEngine::new(
        Arc::new(reloaded),
        Arc::new(FixedBackend::new("noted")),
        ChatMode::Assistant,
    );
    assert_eq!(
        replayed.history().await.expect("replayed history"),
        engine.history().await.expect("history")
    );
}

#[tokio::test]
async fn empty_submission_is_rejected_without_storing() {
    let store = Arc::new(MemoryChatStore::new());
    let engine = ChatEngine::new(
        store.clone(),
        Arc::new(FixedBackend::new("unused")),
        ChatMode::Assistant,
    );

    assert_eq!(engine.submit("   ").await.expect("submit"), TurnOutcome::Rejected);
    assert_eq!(engine.submit("").await.expect("submit"), TurnOutcome::Rejected);
    assert_eq!(engine.history().await.expect("history"), vec![]);
}

#[tokio::test]
async fn new_chat_clears_history_and_metadata() {
    let store = Arc::new(MemoryChatStore::new());
    let engine = ChatEngine::new(
        store.clone(),
        Arc::new(FixedBackend::new("reply").with_thread_id("t-1")),
        ChatMode::Assistant,
    );

    engine.submit("hello").await.expect("turn");
    assert_eq!(
        store.get_meta("thread_id").await.expect("meta"),
        Some("t-1".to_string())
    );

    engine.new_chat().await.expect("new chat");

    assert_eq!(engine.history().await.expect("history"), vec![]);
    assert_eq!(store.get_meta("thread_id").await.expect("meta"), None);
}

/// The stored conversation id is immutable: a later response with a
/// different id does not overwrite it, and the stored id rides along on
/// every request.
#[tokio::test]
async fn thread_id_is_first_write_wins() {
    let store = Arc::new(MemoryChatStore::new());

    let first = ChatEngine::new(
        store.clone(),
        Arc::new(FixedBackend::new("reply").with_thread_id("t-1")),
        ChatMode::Assistant,
    );
    first.submit("hello").await.expect("first turn");
    assert_eq!(
        store.get_meta("thread_id").await.expect("meta"),
        Some("t-1".to_string())
    );

    let later_backend = RecordingBackend::new("reply").with_thread_id("t-2");
    let requests = later_backend.assistant_requests.clone();
    let second = ChatEngine::new(store.clone(), Arc::new(later_backend), ChatMode::Assistant);
    second.submit("again").await.expect("second turn");

    assert_eq!(
        store.get_meta("thread_id").await.expect("meta"),
        Some("t-1".to_string())
    );
    assert_eq!(requests.lock()[0].thread_id, Some("t-1".to_string()));
}

/// A failed remote call appends exactly one assistant error notice and
/// leaves the user's message stored.
#[tokio::test]
async fn failed_turn_appends_single_error_notice() {
    let store = Arc::new(MemoryChatStore::new());
    let engine = ChatEngine::new(
        store.clone(),
        Arc::new(FailingBackend::with_status(502)),
        ChatMode::Assistant,
    );

    let notice = match engine.submit("hello").await.expect("submit") {
        TurnOutcome::Failed(notice) => notice,
        other => panic!("expected a failed turn, got {other:?}"),
    };
    assert_eq!(notice.content, ERROR_REPLY);

    let history = engine.history().await.expect("history");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[0].content, "hello");
    assert_eq!(history[1].role, Role::Assistant);
    assert_eq!(history[1].content, ERROR_REPLY);
}

/// The product choice set by the follow-up rides on the next plain-mode
/// request only.
#[tokio::test]
async fn pending_choice_is_single_use() {
    let store = Arc::new(MemoryChatStore::new());
    let backend = RecordingBackend::new("reply");
    let requests = backend.plain_requests.clone();
    let engine = ChatEngine::new(store.clone(), Arc::new(backend), ChatMode::Plain);

    let ack = engine
        .record_product_choice("ETF")
        .await
        .expect("record choice")
        .expect("ack message");
    assert_eq!(ack.content, "Would you like to know more about ETF?");
    assert_eq!(engine.pending_choice(), Some("ETF".to_string()));

    engine.submit("tell me more").await.expect("first turn");
    engine.submit("and fees?").await.expect("second turn");

    let requests = requests.lock();
    assert_eq!(requests[0].choice, Some("ETF".to_string()));
    assert_eq!(requests[1].choice, None);
    assert_eq!(engine.pending_choice(), None);
}

#[tokio::test]
async fn empty_product_choice_is_ignored() {
    let engine = ChatEngine::new(
        Arc::new(MemoryChatStore::new()),
        Arc::new(FixedBackend::new("unused")),
        ChatMode::Plain,
    );

    let ack = engine.record_product_choice("   ").await.expect("record");
    assert_eq!(ack, None);
    assert_eq!(engine.pending_choice(), None);
    assert_eq!(engine.history().await.expect("history"), vec![]);
}

/// A reply that settles after a new-chat reset is dropped instead of being
/// appended to the fresh conversation.
#[tokio::test]
async fn stale_reply_is_dropped_after_new_chat() {
    let store = Arc::new(MemoryChatStore::new());
    let backend = Arc::new(GatedBackend::new("late reply"));
    let engine = Arc::new(ChatEngine::new(
        store.clone(),
        backend.clone(),
        ChatMode::Assistant,
    ));

    let in_flight = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.submit("hello").await })
    };
    backend.wait_entered().await;

    engine.new_chat().await.expect("new chat");
    backend.release();

    let outcome = in_flight.await.expect("join").expect("submit");
    assert_eq!(outcome, TurnOutcome::Superseded);
    assert_eq!(engine.history().await.expect("history"), vec![]);
}

#[tokio::test]
async fn survey_report_appends_reply_and_follow_up() {
    let store = Arc::new(MemoryChatStore::new());
    let backend = RecordingBackend::new("a stable profile suits you");
    let reports = backend.reports.clone();
    let engine = ChatEngine::new(store.clone(), Arc::new(backend), ChatMode::Assistant);

    let report = engine
        .complete_survey(RiskCategory::Stable)
        .await
        .expect("report")
        .expect("report messages");

    assert_eq!(report.category, RiskCategory::Stable);
    assert_eq!(reports.lock()[0].investment_type, "stable");

    let history = engine.history().await.expect("history");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].content, "a stable profile suits you");
    assert_eq!(history[1].content, FOLLOW_UP_PROMPT);
}

/// Report failures are logged only: no messages, no error surfaced.
#[tokio::test]
async fn failed_survey_report_appends_nothing() {
    let store = Arc::new(MemoryChatStore::new());
    let engine = ChatEngine::new(
        store.clone(),
        Arc::new(FailingBackend::new()),
        ChatMode::Assistant,
    );

    let report = engine
        .complete_survey(RiskCategory::Aggressive)
        .await
        .expect("report call");
    assert_eq!(report, None);
    assert_eq!(engine.history().await.expect("history"), vec![]);
}
