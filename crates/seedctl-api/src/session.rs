// Session methods of the Transmission RPC API.

use serde_json::json;

use crate::client::RpcClient;
use crate::error::Error;
use crate::models::SessionInfo;

impl RpcClient {
    /// `session-get` limited to the fields the client displays.
    pub async fn session_get(&self) -> Result<SessionInfo, Error> {
        self.call(
            "session-get",
            Some(json!({ "fields": ["version", "rpc-version", "download-dir"] })),
        )
        .await
    }
}
