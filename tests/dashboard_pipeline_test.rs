//! Real dashboard pipeline and session store against a hand-answered mock backend.
//!
//! The test decides when each backend response is delivered, which makes ordering
//! properties (stage chaining, stale results, resets) deterministic.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use url_trimmer::backend::mock::{
    create_mock_backend, expect_fetch_clicks, expect_fetch_links, expect_fetch_session,
};
use url_trimmer::backend::{Backend, BackendError, BackendRequest};
use url_trimmer::dashboard::DashboardPipeline;
use url_trimmer::framework::Status;
use url_trimmer::model::{Click, Link, LinkId, Principal, PrincipalId, AUTHENTICATED_ROLE};
use url_trimmer::session::SessionStore;

async fn within<F: Future>(future: F) -> F::Output {
    timeout(Duration::from_secs(2), future)
        .await
        .expect("timed out")
}

fn alice() -> Principal {
    Principal::new("user_1", "alice@example.com", AUTHENTICATED_ROLE)
}

fn link(id: &str, title: &str) -> Link {
    Link::new(id, title, PrincipalId::from("user_1"))
}

/// Signs alice in through the mock, then starts a pipeline following her session.
async fn setup() -> (
    SessionStore,
    DashboardPipeline,
    mpsc::Receiver<BackendRequest>,
) {
    let (client, mut requests) = create_mock_backend(10);
    let backend: Arc<dyn Backend> = Arc::new(client);
    let session = SessionStore::new(Arc::clone(&backend));

    let store = session.clone();
    let settle = tokio::spawn(async move { store.refresh_and_wait().await });
    let respond_to = within(expect_fetch_session(&mut requests)).await.unwrap();
    respond_to.send(Ok(Some(alice()))).unwrap();
    assert!(settle.await.unwrap().unwrap().is_authenticated);

    let pipeline = DashboardPipeline::new(backend, session.clone());
    (session, pipeline, requests)
}

async fn assert_no_request(requests: &mut mpsc::Receiver<BackendRequest>) {
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(requests.try_recv().is_err(), "unexpected backend request");
}

#[tokio::test]
async fn test_links_then_clicks_are_aggregated() {
    let (_session, pipeline, mut requests) = setup().await;
    let mut watch = pipeline.subscribe();

    let (owner_id, respond_to) = within(expect_fetch_links(&mut requests)).await.unwrap();
    assert_eq!(owner_id, alice().id);
    within(watch.wait_for(|s| s.loading)).await.unwrap();
    respond_to
        .send(Ok(vec![link("1", "Docs"), link("2", "Blog")]))
        .unwrap();

    let (link_ids, respond_to) = within(expect_fetch_clicks(&mut requests)).await.unwrap();
    assert_eq!(link_ids, vec![LinkId::from("1"), LinkId::from("2")]);
    // Links are visible while their clicks load
    let pending = within(watch.wait_for(|s| s.view.totals.link_count == 2))
        .await
        .unwrap();
    assert!(pending.loading);
    assert_eq!(pending.view.totals.click_count, 0);

    respond_to
        .send(Ok(vec![
            Click::new("c1", "1"),
            Click::new("c2", "1"),
            Click::new("c3", "2"),
        ]))
        .unwrap();

    let snapshot = within(watch.wait_for(|s| !s.loading)).await.unwrap();
    assert_eq!(
        snapshot.view.clicks_by_link,
        BTreeMap::from([(LinkId::from("1"), 2), (LinkId::from("2"), 1)])
    );
    assert_eq!(snapshot.view.totals.link_count, 2);
    assert_eq!(snapshot.view.totals.click_count, 3);
    assert!(snapshot.error.is_none());
}

#[tokio::test]
async fn test_empty_links_never_fetch_clicks() {
    let (_session, pipeline, mut requests) = setup().await;
    let mut watch = pipeline.subscribe();

    let (_, respond_to) = within(expect_fetch_links(&mut requests)).await.unwrap();
    respond_to.send(Ok(vec![])).unwrap();

    let snapshot = within(watch.wait_for(|s| !s.loading)).await.unwrap();
    assert_eq!(snapshot.view.totals.click_count, 0);
    assert_eq!(snapshot.view.totals.link_count, 0);
    assert_eq!(pipeline.links_state().status, Status::Succeeded);

    assert_no_request(&mut requests).await;
    assert_eq!(pipeline.clicks_state().status, Status::Idle);
}

#[tokio::test]
async fn test_links_failure_halts_pipeline() {
    let (_session, pipeline, mut requests) = setup().await;
    let mut watch = pipeline.subscribe();

    let (_, respond_to) = within(expect_fetch_links(&mut requests)).await.unwrap();
    respond_to
        .send(Err(BackendError::Query("Unable to load URLs".into())))
        .unwrap();

    let snapshot = within(watch.wait_for(|s| s.error.is_some())).await.unwrap();
    assert!(!snapshot.loading);
    assert_eq!(snapshot.error.unwrap().message, "Unable to load URLs");
    assert!(snapshot.view.links.is_empty());

    assert_no_request(&mut requests).await;
    assert_eq!(pipeline.clicks_state().status, Status::Idle);
}

#[tokio::test]
async fn test_clicks_failure_keeps_links_without_stale_counts() {
    let (_session, pipeline, mut requests) = setup().await;
    let mut watch = pipeline.subscribe();
    let links = vec![link("1", "Docs"), link("2", "Blog")];

    let (_, respond_to) = within(expect_fetch_links(&mut requests)).await.unwrap();
    respond_to.send(Ok(links.clone())).unwrap();
    let (_, respond_to) = within(expect_fetch_clicks(&mut requests)).await.unwrap();
    respond_to
        .send(Ok(vec![Click::new("c1", "1"), Click::new("c2", "2")]))
        .unwrap();
    let loaded = within(watch.wait_for(|s| !s.loading)).await.unwrap();
    assert_eq!(loaded.view.totals.click_count, 2);

    // Second round: links reload, clicks fail
    pipeline.refresh().unwrap();
    let (_, respond_to) = within(expect_fetch_links(&mut requests)).await.unwrap();
    respond_to.send(Ok(links)).unwrap();
    let (_, respond_to) = within(expect_fetch_clicks(&mut requests)).await.unwrap();
    respond_to
        .send(Err(BackendError::Query("Unable to load clicks".into())))
        .unwrap();

    let snapshot = within(watch.wait_for(|s| s.error.is_some())).await.unwrap();
    assert!(!snapshot.loading);
    assert_eq!(snapshot.error.unwrap().message, "Unable to load clicks");
    assert_eq!(snapshot.view.totals.link_count, 2);
    assert_eq!(snapshot.view.totals.click_count, 0);
    assert!(snapshot.view.filtered_links.iter().all(|s| s.click_count == 0));
}

#[tokio::test]
async fn test_filter_rederives_without_fetching() {
    let (_session, pipeline, mut requests) = setup().await;
    let mut watch = pipeline.subscribe();

    let (_, respond_to) = within(expect_fetch_links(&mut requests)).await.unwrap();
    respond_to
        .send(Ok(vec![link("1", "Foo bar"), link("2", "baz")]))
        .unwrap();
    let (_, respond_to) = within(expect_fetch_clicks(&mut requests)).await.unwrap();
    respond_to.send(Ok(vec![Click::new("c1", "1")])).unwrap();
    within(watch.wait_for(|s| !s.loading)).await.unwrap();

    pipeline.set_filter_text("foo");
    let snapshot = within(watch.wait_for(|s| s.view.filter_text == "foo"))
        .await
        .unwrap();
    let titles: Vec<_> = snapshot
        .view
        .filtered_links
        .iter()
        .map(|s| s.link.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Foo bar"]);
    assert_eq!(snapshot.view.filtered_links[0].click_count, 1);
    assert_eq!(snapshot.view.totals.link_count, 2);
    assert_eq!(pipeline.filter_text(), "foo");

    assert_no_request(&mut requests).await;
}

#[tokio::test]
async fn test_latest_refresh_wins_over_late_response() {
    let (_session, pipeline, mut requests) = setup().await;
    let mut watch = pipeline.subscribe();

    let (_, respond_to) = within(expect_fetch_links(&mut requests)).await.unwrap();
    respond_to.send(Ok(vec![link("1", "Old")])).unwrap();
    let (_, respond_to) = within(expect_fetch_clicks(&mut requests)).await.unwrap();
    respond_to.send(Ok(vec![])).unwrap();
    within(watch.wait_for(|s| !s.loading)).await.unwrap();

    let older = pipeline.refresh().unwrap();
    let newer = pipeline.refresh().unwrap();
    assert!(newer > older);
    let (_, older_respond_to) = within(expect_fetch_links(&mut requests)).await.unwrap();
    let (_, newer_respond_to) = within(expect_fetch_links(&mut requests)).await.unwrap();

    newer_respond_to.send(Ok(vec![link("3", "New")])).unwrap();
    let (link_ids, respond_to) = within(expect_fetch_clicks(&mut requests)).await.unwrap();
    assert_eq!(link_ids, vec![LinkId::from("3")]);
    respond_to.send(Ok(vec![Click::new("c9", "3")])).unwrap();

    // The older invocation settles last and must be ignored
    older_respond_to.send(Ok(vec![link("1", "Stale")])).unwrap();
    assert_no_request(&mut requests).await;

    let snapshot = within(watch.wait_for(|s| !s.loading)).await.unwrap();
    assert_eq!(pipeline.links_state().settled_seq, newer);
    assert_eq!(snapshot.view.links.len(), 1);
    assert_eq!(snapshot.view.links[0].title, "New");
    assert_eq!(snapshot.view.click_count(&LinkId::from("3")), 1);
}

#[tokio::test]
async fn test_signing_out_resets_both_stages() {
    let (session, pipeline, mut requests) = setup().await;
    let mut watch = pipeline.subscribe();

    let (_, respond_to) = within(expect_fetch_links(&mut requests)).await.unwrap();
    respond_to.send(Ok(vec![link("1", "Docs")])).unwrap();
    let (_, respond_to) = within(expect_fetch_clicks(&mut requests)).await.unwrap();
    respond_to.send(Ok(vec![Click::new("c1", "1")])).unwrap();
    within(watch.wait_for(|s| s.view.totals.click_count == 1 && !s.loading))
        .await
        .unwrap();

    session.refresh();
    let respond_to = within(expect_fetch_session(&mut requests)).await.unwrap();
    respond_to.send(Ok(None)).unwrap();

    let snapshot = within(watch.wait_for(|s| s.view.links.is_empty()))
        .await
        .unwrap();
    assert!(!snapshot.loading);
    assert_eq!(snapshot.view.totals.click_count, 0);
    assert!(pipeline.refresh().is_none());
    assert_eq!(pipeline.links_state().status, Status::Idle);
    assert_eq!(pipeline.clicks_state().status, Status::Idle);
    assert_no_request(&mut requests).await;
}

#[tokio::test]
async fn test_dropping_pipeline_abandons_in_flight_fetch() {
    let (_session, pipeline, mut requests) = setup().await;
    let mut watch = pipeline.subscribe();

    let (_, respond_to) = within(expect_fetch_links(&mut requests)).await.unwrap();
    drop(pipeline);

    // The fetch task is gone; nobody is left to receive the answer
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(respond_to.send(Ok(vec![link("1", "Late")])).is_err());
    let snapshot = watch.current();
    assert!(snapshot.view.links.is_empty());
    assert!(!snapshot.loading);
}

/// Answers every request immediately: each links fetch returns one fresh link, each
/// clicks fetch one click per requested link.
fn spawn_rotating_backend(mut requests: mpsc::Receiver<BackendRequest>) {
    let counter = AtomicU64::new(0);
    tokio::spawn(async move {
        while let Some(request) = requests.recv().await {
            match request {
                BackendRequest::FetchSession { respond_to } => {
                    let _ = respond_to.send(Ok(Some(alice())));
                }
                BackendRequest::FetchLinksByOwner { respond_to, .. } => {
                    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    let _ = respond_to.send(Ok(vec![link(&n.to_string(), "Rotating")]));
                }
                BackendRequest::FetchClicksForLinks {
                    link_ids,
                    respond_to,
                } => {
                    let clicks = link_ids
                        .into_iter()
                        .map(|id| Click::new(format!("c{}", id.0), id.0))
                        .collect();
                    let _ = respond_to.send(Ok(clicks));
                }
                _ => {}
            }
        }
    });
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_readers_never_see_clicks_from_another_link_list() {
    let (client, requests) = create_mock_backend(10);
    spawn_rotating_backend(requests);
    let backend: Arc<dyn Backend> = Arc::new(client);
    let session = SessionStore::new(Arc::clone(&backend));
    assert!(within(session.refresh_and_wait())
        .await
        .unwrap()
        .is_authenticated);

    let pipeline = Arc::new(DashboardPipeline::new(backend, session.clone()));
    let stop = Arc::new(AtomicBool::new(false));
    let readers: Vec<_> = (0..3)
        .map(|_| {
            let pipeline = Arc::clone(&pipeline);
            let stop = Arc::clone(&stop);
            tokio::spawn(async move {
                let mut mixed = 0;
                while !stop.load(Ordering::SeqCst) {
                    let snapshot = pipeline.snapshot();
                    let ids: BTreeSet<_> = snapshot.view.links.iter().map(|l| &l.id).collect();
                    if snapshot
                        .view
                        .clicks_by_link
                        .keys()
                        .any(|id| !ids.contains(id))
                    {
                        mixed += 1;
                    }
                    tokio::task::yield_now().await;
                }
                mixed
            })
        })
        .collect();

    let mut watch = pipeline.subscribe();
    for round in 0..300 {
        if round > 0 {
            pipeline.refresh().unwrap();
        }
        let expected = LinkId((round + 1).to_string());
        let snapshot = timeout(
            Duration::from_secs(5),
            watch.wait_for(|s| {
                !s.loading
                    && s.view.totals.click_count == 1
                    && s.view.links.first().map(|l| &l.id) == Some(&expected)
            }),
        )
        .await
        .expect("timed out")
        .unwrap();
        assert_eq!(snapshot.view.totals.link_count, 1);
    }

    stop.store(true, Ordering::SeqCst);
    for reader in readers {
        assert_eq!(reader.await.unwrap(), 0);
    }
}
