#![allow(clippy::unwrap_used)]
// Integration tests for `TransmissionRemote` against a mocked daemon.

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use seedctl_api::{RpcClient, TransportConfig};
use seedctl_core::model::EntityItems;
use seedctl_core::remote::{AddOptions, AddOutcome, Cause, Mutation, RateDirection, RemoteClient};
use seedctl_core::{ClientError, EntityId, EntityKind, FilePriority, TransmissionRemote};

// ── Helpers ─────────────────────────────────────────────────────────

const RPC: &str = "/transmission/rpc";

async fn setup() -> (MockServer, TransmissionRemote) {
    let server = MockServer::start().await;
    let url = Url::parse(&server.uri()).unwrap();
    let rpc = RpcClient::new(url, &TransportConfig::default()).unwrap();
    (server, TransmissionRemote::new(rpc))
}

fn success(arguments: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "result": "success", "arguments": arguments }))
}

fn failure(result: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "result": result, "arguments": {} }))
}

fn rpc_method(name: &str) -> wiremock::matchers::BodyPartialJsonMatcher {
    body_partial_json(json!({ "method": name }))
}

// ── Listings ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_full_torrent_listing() {
    let (server, remote) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC))
        .and(rpc_method("torrent-get"))
        .respond_with(success(json!({
            "torrents": [
                { "id": 1, "name": "ubuntu.iso", "status": 6, "percentDone": 1.0,
                  "totalSize": 4_000_000_000_i64, "uploadRatio": 2.5, "eta": -1 },
                { "id": 2, "name": "debian.iso", "status": 0, "percentDone": 0.5,
                  "totalSize": 600_000_000, "uploadRatio": -1, "eta": -2 }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let batch = remote.list_entities(EntityKind::Torrent, None).await.unwrap();
    assert!(batch.complete);
    assert!(batch.removed.is_empty());
    let EntityItems::Torrents(torrents) = batch.items else {
        panic!("expected torrents");
    };
    assert_eq!(torrents.len(), 2);
    assert_eq!(torrents[0].name, "ubuntu.iso");
    assert_eq!(torrents[0].eta, None);
    assert!(torrents[1].ratio.abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_incremental_listing_reports_removed() {
    let (server, remote) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC))
        .and(body_partial_json(json!({
            "method": "torrent-get",
            "arguments": { "ids": "recently-active" }
        })))
        .respond_with(success(json!({
            "torrents": [{ "id": 4, "name": "new", "status": 4 }],
            "removed": [3]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let batch = remote
        .list_entities(EntityKind::Torrent, Some(7))
        .await
        .unwrap();
    assert!(!batch.complete);
    assert_eq!(batch.removed, vec![EntityId::Torrent(3)]);
    assert_eq!(batch.items.len(), 1);
}

#[tokio::test]
async fn test_files_are_flattened_per_torrent() {
    let (server, remote) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC))
        .and(rpc_method("torrent-get"))
        .respond_with(success(json!({
            "torrents": [{
                "id": 9,
                "name": "album",
                "files": [
                    { "name": "album/cd1/01.flac", "length": 100, "bytesCompleted": 100 },
                    { "name": "album/cover.jpg", "length": 10, "bytesCompleted": 0 }
                ],
                "fileStats": [
                    { "bytesCompleted": 100, "wanted": true, "priority": 1 },
                    { "bytesCompleted": 0, "wanted": false, "priority": 0 }
                ]
            }]
        })))
        .mount(&server)
        .await;

    let batch = remote.list_entities(EntityKind::File, None).await.unwrap();
    assert!(batch.complete);
    let EntityItems::Files(files) = batch.items else {
        panic!("expected files");
    };
    assert_eq!(files.len(), 2);
    assert_eq!((files[0].path.as_str(), files[0].name.as_str()), ("album/cd1", "01.flac"));
    assert_eq!(files[0].priority, FilePriority::High);
    assert_eq!(files[1].priority, FilePriority::Off);
    assert_eq!(files[1].torrent_name, "album");
}

#[tokio::test]
async fn test_auth_failure_is_connectivity() {
    let (server, remote) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = remote
        .list_entities(EntityKind::Torrent, None)
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            ClientError::Connectivity {
                cause: Cause::Auth,
                ..
            }
        ),
        "expected auth connectivity error, got: {err:?}"
    );
}

// ── Mutations ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_stop_sends_one_call_for_all_ids() {
    let (server, remote) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC))
        .and(body_partial_json(json!({
            "method": "torrent-stop",
            "arguments": { "ids": [1, 2] }
        })))
        .respond_with(success(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let ids = [EntityId::Torrent(1), EntityId::Torrent(2)];
    let results = remote
        .mutate(EntityKind::Torrent, &ids, &Mutation::Stop)
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|(_, r)| r.is_ok()));
}

#[tokio::test]
async fn test_daemon_refusal_is_per_id_rejection() {
    let (server, remote) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC))
        .and(rpc_method("torrent-set-location"))
        .respond_with(failure("Invalid location"))
        .mount(&server)
        .await;

    let ids = [EntityId::Torrent(5)];
    let mutation = Mutation::Move {
        path: "relative".into(),
    };
    let results = remote
        .mutate(EntityKind::Torrent, &ids, &mutation)
        .await
        .unwrap();
    let (id, result) = &results[0];
    assert_eq!(*id, EntityId::Torrent(5));
    assert_eq!(result.as_ref().unwrap_err().reason, "Invalid location");
}

#[tokio::test]
async fn test_file_priority_is_grouped_per_torrent() {
    let (server, remote) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC))
        .and(body_partial_json(json!({
            "method": "torrent-set",
            "arguments": { "ids": [1], "files-unwanted": [0, 2] }
        })))
        .respond_with(success(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(RPC))
        .and(body_partial_json(json!({
            "method": "torrent-set",
            "arguments": { "ids": [2], "files-unwanted": [1] }
        })))
        .respond_with(success(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let ids = [
        EntityId::File {
            torrent: 1,
            index: 0,
        },
        EntityId::File {
            torrent: 2,
            index: 1,
        },
        EntityId::File {
            torrent: 1,
            index: 2,
        },
    ];
    let results = remote
        .mutate(
            EntityKind::File,
            &ids,
            &Mutation::SetPriority(FilePriority::Off),
        )
        .await
        .unwrap();
    assert_eq!(results.len(), 3);
}

#[tokio::test]
async fn test_rate_limit_rounds_up_to_whole_kilobytes() {
    let (server, remote) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC))
        .and(body_partial_json(json!({
            "method": "torrent-set",
            "arguments": { "ids": [3], "uploadLimited": true, "uploadLimit": 1 }
        })))
        .respond_with(success(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(RPC))
        .and(body_partial_json(json!({
            "method": "torrent-set",
            "arguments": { "ids": [3], "downloadLimited": true, "downloadLimit": 1501 }
        })))
        .respond_with(success(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let ids = [EntityId::Torrent(3)];
    for (direction, bytes) in [(RateDirection::Up, 500), (RateDirection::Down, 1_500_001)] {
        let mutation = Mutation::SetRateLimit {
            direction,
            limit: Some(bytes),
        };
        let results = remote
            .mutate(EntityKind::Torrent, &ids, &mutation)
            .await
            .unwrap();
        assert!(results[0].1.is_ok());
    }
}

#[tokio::test]
async fn test_seed_ratio_limit_overrides_session_mode() {
    let (server, remote) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC))
        .and(body_partial_json(json!({
            "method": "torrent-set",
            "arguments": { "ids": [4], "seedRatioLimit": 2.5, "seedRatioMode": 1 }
        })))
        .respond_with(success(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let results = remote
        .mutate(
            EntityKind::Torrent,
            &[EntityId::Torrent(4)],
            &Mutation::SetSeedRatioLimit(2.5),
        )
        .await
        .unwrap();
    assert!(results[0].1.is_ok());
}

#[tokio::test]
async fn test_unsupported_mutation_is_rejected() {
    let (_server, remote) = setup().await;
    let ids = [EntityId::Peer {
        torrent: 1,
        address: "10.0.0.1:51413".into(),
    }];
    let err = remote
        .mutate(EntityKind::Peer, &ids, &Mutation::Stop)
        .await
        .unwrap_err();
    assert_eq!(err, ClientError::rejected("peers cannot be stopped"));
}

// ── Adding ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_add_reports_duplicate() {
    let (server, remote) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC))
        .and(body_partial_json(json!({
            "method": "torrent-add",
            "arguments": { "filename": "magnet:?xt=urn:btih:abc", "paused": true }
        })))
        .respond_with(success(json!({
            "torrent-duplicate": { "id": 3, "name": "ubuntu.iso", "hashString": "abc" }
        })))
        .mount(&server)
        .await;

    let options = AddOptions {
        paused: true,
        path: None,
    };
    let outcome = remote
        .add_entity("magnet:?xt=urn:btih:abc", &options)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        AddOutcome::Duplicate {
            id: 3,
            name: "ubuntu.iso".into()
        }
    );
}

#[tokio::test]
async fn test_describe_names_daemon_version() {
    let (server, remote) = setup().await;

    Mock::given(method("POST"))
        .and(path(RPC))
        .and(rpc_method("session-get"))
        .respond_with(success(json!({ "version": "4.0.5 (a6fe2a64aa)", "rpc-version": 17 })))
        .mount(&server)
        .await;

    assert_eq!(
        remote.describe().await.unwrap(),
        "Transmission 4.0.5 (a6fe2a64aa) (RPC version 17)"
    );
}
