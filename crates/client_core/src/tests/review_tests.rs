use super::*;
use crate::test_support::{closed_port_url, desk_for, intern, spawn_mock, MockState};

fn sample_requests() -> Vec<InternRequest> {
    vec![
        intern("1", "France", "Informatique", Some(false)),
        intern("2", "Maroc", "Finance", Some(true)),
        intern("3", "Tunisie", "Marketing", None),
        intern("4", "maroc", "Ressources humaines", None),
    ]
}

fn ids(rows: &[&InternRequest]) -> Vec<String> {
    rows.iter().map(|row| row.ids.to_string()).collect()
}

#[test]
fn search_is_case_insensitive_across_text_fields() {
    let requests = sample_requests();
    let found = filter_requests(&requests, "Maroc", StatusFilter::All);
    assert_eq!(ids(&found), vec!["2", "4"]);

    let found = filter_requests(&requests, "MARKET", StatusFilter::All);
    assert_eq!(ids(&found), vec!["3"]);

    let found = filter_requests(&requests, "stage PRATIQUE", StatusFilter::All);
    assert_eq!(found.len(), requests.len());
}

#[test]
fn pending_filter_returns_exactly_null_situations() {
    let requests = sample_requests();
    let found = filter_requests(&requests, "", StatusFilter::Only(RequestStatus::Pending));
    assert_eq!(ids(&found), vec!["3", "4"]);
    assert!(found.iter().all(|row| row.situation.is_none()));
}

#[test]
fn search_and_status_combine_with_and() {
    let requests = sample_requests();
    let found = filter_requests(&requests, "maroc", StatusFilter::Only(RequestStatus::Accepted));
    assert_eq!(ids(&found), vec!["2"]);

    let found = filter_requests(&requests, "france", StatusFilter::Only(RequestStatus::Pending));
    assert!(found.is_empty());
}

#[test]
fn empty_search_with_all_returns_everything() {
    let requests = sample_requests();
    assert_eq!(filter_requests(&requests, "", StatusFilter::All).len(), 4);
}

#[test]
fn stats_count_each_status() {
    let stats = RequestStats::from_requests(&sample_requests());
    assert_eq!(
        stats,
        RequestStats {
            total: 4,
            accepted: 1,
            rejected: 1,
            pending: 2,
        }
    );
}

#[tokio::test]
async fn load_then_filter_through_controller() {
    let mut state = MockState::default();
    state.dashboard = sample_requests();
    let (base_url, _mock) = spawn_mock(state).await;
    let (desk, _storage) = desk_for(&base_url);
    let review = desk.review();

    assert_eq!(review.load().await.expect("load"), 4);
    review.set_search("maroc").await;
    review
        .set_filter("pending".parse().expect("filter"))
        .await;

    let visible = review.visible().await;
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].ids, StudentId::new("4"));
    assert_eq!(review.stats().await.total, 4);
}

#[tokio::test]
async fn rejected_load_sets_message_and_keeps_list() {
    let mut state = MockState::default();
    state.dashboard = sample_requests();
    let (base_url, mock) = spawn_mock(state).await;
    let (desk, _storage) = desk_for(&base_url);
    let review = desk.review();
    review.load().await.expect("first load");

    mock.lock().await.dashboard_rejects = true;
    review.load().await.expect_err("rejected");
    assert_eq!(review.error().await.as_deref(), Some(LOAD_REJECTED_MESSAGE));
    assert_eq!(review.requests().await.len(), 4);
}

#[tokio::test]
async fn unreachable_service_sets_connection_message() {
    let (desk, _storage) = desk_for(&closed_port_url().await);
    let review = desk.review();
    review.load().await.expect_err("offline");
    assert_eq!(review.error().await.as_deref(), Some(LOAD_FAILED_MESSAGE));
}

#[tokio::test]
async fn accept_updates_row_after_server_confirms() {
    let mut state = MockState::default();
    state.dashboard = sample_requests();
    let (base_url, mock) = spawn_mock(state).await;
    let (desk, _storage) = desk_for(&base_url);
    let mut events = desk.subscribe_events();
    let review = desk.review();
    review.load().await.expect("load");

    let decision = review.accept(&StudentId::new("3")).await.expect("accept");
    assert_eq!(decision.status, RequestStatus::Accepted);
    assert_eq!(decision.notice, "Stagiaire accepté avec succès");
    assert_eq!(
        decision.server_message.as_deref(),
        Some("Situation mise à jour")
    );

    let row = review.select(&StudentId::new("3")).await.expect("row");
    assert_eq!(row.status(), RequestStatus::Accepted);
    assert_eq!(
        mock.lock().await.received_updates,
        vec![("3".to_string(), true)]
    );
    assert_eq!(
        events.recv().await.expect("event"),
        DeskEvent::RequestDecided {
            ids: StudentId::new("3"),
            status: RequestStatus::Accepted,
        }
    );
}

#[tokio::test]
async fn supervisor_may_overturn_a_decision_but_not_repeat_it() {
    let mut state = MockState::default();
    state.dashboard = sample_requests();
    let (base_url, mock) = spawn_mock(state).await;
    let (desk, _storage) = desk_for(&base_url);
    let review = desk.review();
    review.load().await.expect("load");

    let err = review
        .accept(&StudentId::new("2"))
        .await
        .expect_err("already accepted");
    assert!(matches!(
        err,
        ClientError::Validation(ValidationError::DecisionUnchanged("accepté"))
    ));

    let decision = review.reject(&StudentId::new("2")).await.expect("reject");
    assert_eq!(decision.notice, "Stagiaire refusé");

    let err = review
        .decide(&StudentId::new("2"), RequestStatus::Pending)
        .await
        .expect_err("no way back");
    assert!(matches!(
        err,
        ClientError::Validation(ValidationError::BackToPending)
    ));
    assert_eq!(mock.lock().await.received_updates.len(), 1);
}

#[tokio::test]
async fn failed_update_leaves_row_untouched() {
    let mut state = MockState::default();
    state.dashboard = sample_requests();
    state.update_rejects = true;
    let (base_url, _mock) = spawn_mock(state).await;
    let (desk, _storage) = desk_for(&base_url);
    let review = desk.review();
    review.load().await.expect("load");

    let err = review
        .reject(&StudentId::new("3"))
        .await
        .expect_err("server error");
    assert_eq!(err.server_message(), Some("base indisponible"));
    assert_eq!(review.error().await.as_deref(), Some(UPDATE_FAILED_MESSAGE));

    let row = review.select(&StudentId::new("3")).await.expect("row");
    assert_eq!(row.situation, None);
}

#[tokio::test]
async fn unknown_request_is_refused_locally() {
    let (base_url, mock) = spawn_mock(MockState::default()).await;
    let (desk, _storage) = desk_for(&base_url);
    let review = desk.review();
    review.load().await.expect("load");

    let err = review
        .accept(&StudentId::new("99"))
        .await
        .expect_err("unknown");
    assert!(matches!(
        err,
        ClientError::Validation(ValidationError::UnknownRequest(_))
    ));
    assert!(mock.lock().await.received_updates.is_empty());
}

#[tokio::test]
async fn selection_is_dropped_when_row_disappears() {
    let mut state = MockState::default();
    state.dashboard = sample_requests();
    let (base_url, mock) = spawn_mock(state).await;
    let (desk, _storage) = desk_for(&base_url);
    let review = desk.review();
    review.load().await.expect("load");

    review.select(&StudentId::new("1")).await.expect("row");
    assert!(review.selected().await.is_some());

    mock.lock().await.dashboard.retain(|row| row.ids != StudentId::new("1"));
    review.load().await.expect("reload");
    assert!(review.selected().await.is_none());
}
