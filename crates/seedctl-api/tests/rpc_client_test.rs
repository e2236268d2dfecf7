#![allow(clippy::unwrap_used)]
// Integration tests for `RpcClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use seedctl_api::{Error, Ids, RpcClient, TorrentAction, TorrentSetArgs};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, RpcClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = RpcClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

const RPC: &str = "/transmission/rpc";

fn success(arguments: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "result": "success", "arguments": arguments }))
}

// ── Session handshake ───────────────────────────────────────────────

#[tokio::test]
async fn test_session_id_negotiated_on_409() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC))
        .and(header("X-Transmission-Session-Id", "abc123"))
        .respond_with(success(json!({ "version": "4.0.5", "rpc-version": 17 })))
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(RPC))
        .respond_with(ResponseTemplate::new(409).insert_header("X-Transmission-Session-Id", "abc123"))
        .with_priority(2)
        .mount(&server)
        .await;

    let info = client.session_get().await.unwrap();
    assert_eq!(info.version, "4.0.5");
    assert_eq!(info.rpc_version, 17);
    assert_eq!(client.session_id().as_deref(), Some("abc123"));
}

#[tokio::test]
async fn test_409_without_header_is_session_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let result = client.session_get().await;
    assert!(
        matches!(result, Err(Error::Session { .. })),
        "expected Session error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_repeated_409_gives_up_after_one_retry() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC))
        .respond_with(ResponseTemplate::new(409).insert_header("X-Transmission-Session-Id", "rotating"))
        .expect(2)
        .mount(&server)
        .await;

    let result = client.session_get().await;
    assert!(matches!(result, Err(Error::Session { .. })));
}

#[tokio::test]
async fn test_401_is_authentication_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let result = client.session_get().await;
    let err = result.unwrap_err();
    assert!(err.is_auth(), "expected auth error, got: {err:?}");
    assert!(!err.is_transient());
}

// ── torrent-get ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_torrent_get_parses_torrents() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC))
        .and(body_partial_json(json!({ "method": "torrent-get" })))
        .respond_with(success(json!({
            "torrents": [{
                "id": 7,
                "name": "ubuntu-24.04.iso",
                "status": 6,
                "percentDone": 1.0,
                "uploadRatio": 2.5,
                "sizeWhenDone": 5_000_000_000_i64,
                "trackerStats": [{ "id": 0, "host": "tracker.example.org:443", "seederCount": 60 }]
            }]
        })))
        .mount(&server)
        .await;

    let resp = client
        .torrent_get(&["id", "name"], &Ids::All)
        .await
        .unwrap();
    assert_eq!(resp.torrents.len(), 1);
    let t = &resp.torrents[0];
    assert_eq!(t.id, 7);
    assert_eq!(t.name, "ubuntu-24.04.iso");
    assert_eq!(t.status, 6);
    assert!((t.upload_ratio - 2.5).abs() < f64::EPSILON);
    assert_eq!(t.tracker_stats[0].seeder_count, 60);
    assert!(resp.removed.is_empty());
}

#[tokio::test]
async fn test_torrent_get_recently_active_sends_marker() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC))
        .and(body_partial_json(json!({
            "method": "torrent-get",
            "arguments": { "ids": "recently-active" }
        })))
        .respond_with(success(json!({ "torrents": [], "removed": [3, 4] })))
        .mount(&server)
        .await;

    let resp = client
        .torrent_get(&["id"], &Ids::RecentlyActive)
        .await
        .unwrap();
    assert_eq!(resp.removed, vec![3, 4]);
}

// ── Mutations ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_rpc_failure_result_is_rpc_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "result": "invalid or corrupt torrent file" })),
        )
        .mount(&server)
        .await;

    let err = client
        .torrent_action(TorrentAction::Start, &[1])
        .await
        .unwrap_err();
    assert_eq!(err.rpc_result(), Some("invalid or corrupt torrent file"));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_empty_id_list_skips_request() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(success(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    client.torrent_action(TorrentAction::Stop, &[]).await.unwrap();
    client.torrent_remove(&[], true).await.unwrap();
}

#[tokio::test]
async fn test_torrent_set_omits_unset_fields() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC))
        .and(body_partial_json(json!({
            "method": "torrent-set",
            "arguments": { "ids": [5], "priority-high": [0, 2] }
        })))
        .respond_with(success(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let args = TorrentSetArgs {
        priority_high: Some(vec![0, 2]),
        ..TorrentSetArgs::default()
    };
    client.torrent_set(&[5], &args).await.unwrap();
}

#[tokio::test]
async fn test_torrent_add_reports_duplicate() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC))
        .and(body_partial_json(json!({ "method": "torrent-add" })))
        .respond_with(success(json!({
            "torrent-duplicate": { "id": 9, "name": "debian.iso", "hashString": "ff00" }
        })))
        .mount(&server)
        .await;

    let resp = client
        .torrent_add("magnet:?xt=urn:btih:ff00", None, false)
        .await
        .unwrap();
    assert!(resp.torrent_added.is_none());
    assert_eq!(resp.torrent_duplicate.unwrap().id, 9);
}
