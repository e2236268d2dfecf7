// Torrent methods of the Transmission RPC API.

use serde_json::{Map, Value, json};

use crate::client::RpcClient;
use crate::error::Error;
use crate::models::{Ids, TorrentAddResponse, TorrentGetResponse, TorrentSetArgs};

/// Fields every torrent listing requests.
pub const TORRENT_FIELDS: &[&str] = &[
    "id",
    "hashString",
    "name",
    "status",
    "percentDone",
    "metadataPercentComplete",
    "rateDownload",
    "rateUpload",
    "eta",
    "uploadRatio",
    "sizeWhenDone",
    "totalSize",
    "leftUntilDone",
    "downloadedEver",
    "uploadedEver",
    "downloadDir",
    "comment",
    "isPrivate",
    "error",
    "errorString",
    "peersConnected",
    "peersSendingToUs",
    "peersGettingFromUs",
    "dateCreated",
    "addedDate",
    "startDate",
    "activityDate",
    "doneDate",
    "downloadLimited",
    "downloadLimit",
    "uploadLimited",
    "uploadLimit",
    "magnetLink",
    "seedRatioLimit",
    "seedRatioMode",
    "trackerStats",
];

/// Simple actions that only take `ids`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TorrentAction {
    Start,
    StartNow,
    Stop,
    Verify,
    Reannounce,
}

impl TorrentAction {
    pub fn method(self) -> &'static str {
        match self {
            Self::Start => "torrent-start",
            Self::StartNow => "torrent-start-now",
            Self::Stop => "torrent-stop",
            Self::Verify => "torrent-verify",
            Self::Reannounce => "torrent-reannounce",
        }
    }
}

fn with_ids(ids: &Ids, mut args: Map<String, Value>) -> Value {
    if let Some(value) = ids.to_value() {
        args.insert("ids".into(), value);
    }
    Value::Object(args)
}

impl RpcClient {
    /// `torrent-get` for the given fields and selection.
    pub async fn torrent_get(&self, fields: &[&str], ids: &Ids) -> Result<TorrentGetResponse, Error> {
        let mut args = Map::new();
        args.insert("fields".into(), json!(fields));
        self.call("torrent-get", Some(with_ids(ids, args))).await
    }

    /// Run a simple id-only action.
    pub async fn torrent_action(&self, action: TorrentAction, ids: &[i64]) -> Result<(), Error> {
        if ids.is_empty() {
            return Ok(());
        }
        self.call_raw(action.method(), Some(json!({ "ids": ids })))
            .await?;
        Ok(())
    }

    /// `torrent-remove`, optionally deleting downloaded data.
    pub async fn torrent_remove(&self, ids: &[i64], delete_local_data: bool) -> Result<(), Error> {
        if ids.is_empty() {
            return Ok(());
        }
        self.call_raw(
            "torrent-remove",
            Some(json!({ "ids": ids, "delete-local-data": delete_local_data })),
        )
        .await?;
        Ok(())
    }

    /// `torrent-set-location`, moving data on disk.
    pub async fn torrent_set_location(&self, ids: &[i64], location: &str) -> Result<(), Error> {
        self.call_raw(
            "torrent-set-location",
            Some(json!({ "ids": ids, "location": location, "move": true })),
        )
        .await?;
        Ok(())
    }

    /// `torrent-rename-path` for a single torrent.
    pub async fn torrent_rename_path(&self, id: i64, path: &str, name: &str) -> Result<(), Error> {
        self.call_raw(
            "torrent-rename-path",
            Some(json!({ "ids": [id], "path": path, "name": name })),
        )
        .await?;
        Ok(())
    }

    /// `torrent-set` with the given optional mutations.
    pub async fn torrent_set(&self, ids: &[i64], args: &TorrentSetArgs) -> Result<(), Error> {
        let Value::Object(mut map) = serde_json::to_value(args).map_err(|e| {
            Error::Deserialization {
                message: format!("torrent-set arguments: {e}"),
                body: String::new(),
            }
        })?
        else {
            return Ok(());
        };
        map.insert("ids".into(), json!(ids));
        self.call_raw("torrent-set", Some(Value::Object(map))).await?;
        Ok(())
    }

    /// `torrent-add` from a URL, magnet link, or daemon-local path.
    pub async fn torrent_add(
        &self,
        filename: &str,
        download_dir: Option<&str>,
        paused: bool,
    ) -> Result<TorrentAddResponse, Error> {
        let mut args = Map::new();
        args.insert("filename".into(), json!(filename));
        args.insert("paused".into(), json!(paused));
        if let Some(dir) = download_dir {
            args.insert("download-dir".into(), json!(dir));
        }
        self.call("torrent-add", Some(Value::Object(args))).await
    }
}
