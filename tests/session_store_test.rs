//! Session store and route gate against a hand-answered mock backend.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use url_trimmer::backend::mock::{create_mock_backend, expect_fetch_session};
use url_trimmer::backend::{Backend, BackendError};
use url_trimmer::gate::{Gated, HistoryNavigator, Route, RouteGate};
use url_trimmer::model::{Principal, AUTHENTICATED_ROLE};
use url_trimmer::session::{SessionPhase, SessionStore};

async fn within<F: Future>(future: F) -> F::Output {
    timeout(Duration::from_secs(2), future)
        .await
        .expect("timed out")
}

fn principal(id: &str) -> Principal {
    Principal::new(id, format!("{id}@example.com"), AUTHENTICATED_ROLE)
}

#[tokio::test]
async fn test_older_refresh_cannot_overwrite_newer() {
    let (client, mut requests) = create_mock_backend(10);
    let store = SessionStore::new(Arc::new(client));
    let mut watch = store.subscribe();

    let older = store.refresh();
    let newer = store.refresh();
    let older_respond_to = within(expect_fetch_session(&mut requests)).await.unwrap();
    let newer_respond_to = within(expect_fetch_session(&mut requests)).await.unwrap();

    newer_respond_to.send(Ok(None)).unwrap();
    let session = within(watch.settled()).await.unwrap();
    assert!(session.principal.is_none());

    older_respond_to.send(Ok(Some(principal("stale")))).unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(newer > older);
    assert_eq!(store.phase(), SessionPhase::Ready(None));
    assert!(!store.session().is_authenticated);
}

#[tokio::test]
async fn test_refresh_keeps_principal_while_loading() {
    let (client, mut requests) = create_mock_backend(10);
    let store = SessionStore::new(Arc::new(client));

    store.start();
    let respond_to = within(expect_fetch_session(&mut requests)).await.unwrap();
    respond_to.send(Ok(Some(principal("user_1")))).unwrap();
    within(store.subscribe().settled()).await.unwrap();

    store.refresh();
    let session = store.session();
    assert!(session.loading);
    assert_eq!(session.error, None);
    assert_eq!(session.principal, Some(principal("user_1")));
    assert_eq!(store.phase(), SessionPhase::Loading);

    let respond_to = within(expect_fetch_session(&mut requests)).await.unwrap();
    respond_to
        .send(Err(BackendError::Query("lookup failed".into())))
        .unwrap();
    let session = within(store.subscribe().settled()).await.unwrap();
    assert!(session.principal.is_none());
    assert!(!session.is_authenticated);
}

#[tokio::test]
async fn test_gate_follows_session_to_redirect() {
    let (client, mut requests) = create_mock_backend(10);
    let backend: Arc<dyn Backend> = Arc::new(client);
    let store = SessionStore::new(backend);
    let navigator = Arc::new(HistoryNavigator::new());
    let gate = RouteGate::new(navigator.clone());

    store.start();
    let mut watch = store.subscribe();
    assert_eq!(
        gate.render(&watch.current(), || "dashboard"),
        Gated::Placeholder
    );

    let respond_to = within(expect_fetch_session(&mut requests)).await.unwrap();
    respond_to.send(Ok(None)).unwrap();

    let gated = within(gate.guard(&mut watch, || "dashboard"))
        .await
        .unwrap();
    assert_eq!(gated, Gated::Redirected(Route::login()));
    // Re-rendering the same state does not navigate again
    gate.render(&store.session(), || "dashboard");
    assert_eq!(navigator.history(), vec![Route::login()]);
}

#[tokio::test]
async fn test_gate_renders_for_authenticated_session() {
    let (client, mut requests) = create_mock_backend(10);
    let store = SessionStore::new(Arc::new(client));
    let navigator = Arc::new(HistoryNavigator::new());
    let gate = RouteGate::new(navigator.clone());

    store.start();
    let mut watch = store.subscribe();
    let respond_to = within(expect_fetch_session(&mut requests)).await.unwrap();
    respond_to.send(Ok(Some(principal("user_1")))).unwrap();

    let gated = within(gate.guard(&mut watch, || "dashboard"))
        .await
        .unwrap();
    assert_eq!(gated.content(), Some("dashboard"));
    assert!(navigator.history().is_empty());
}
