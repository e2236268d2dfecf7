// Transmission RPC HTTP client
//
// Wraps `reqwest::Client` with the Transmission request envelope,
// the `X-Transmission-Session-Id` CSRF handshake, and basic auth.
// Method-specific helpers live in `torrent.rs` and `session.rs` as
// inherent methods to keep this module focused on transport mechanics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{RpcRequest, RpcResponse};
use crate::transport::{Credentials, TransportConfig};

/// Header carrying the daemon's anti-CSRF session token.
pub const SESSION_ID_HEADER: &str = "X-Transmission-Session-Id";

/// Conventional RPC path appended when the configured URL has no path.
pub const DEFAULT_RPC_PATH: &str = "/transmission/rpc";

/// Raw async client for a Transmission daemon.
///
/// All calls go through [`call`](Self::call), which negotiates the session
/// id on `409 Conflict` (retrying once), maps `401` to an authentication
/// error, and unwraps the `{ result, arguments }` envelope.
pub struct RpcClient {
    http: reqwest::Client,
    endpoint: Url,
    credentials: Option<Credentials>,
    timeout: Duration,
    session_id: RwLock<Option<String>>,
    tag: AtomicU64,
}

impl RpcClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `endpoint` may be the daemon root (`http://host:9091`) or the full
    /// RPC URL; a bare root gets [`DEFAULT_RPC_PATH`] appended.
    pub fn new(endpoint: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            endpoint: normalize_endpoint(endpoint),
            credentials: transport.credentials.clone(),
            timeout: transport.timeout,
            session_id: RwLock::new(None),
            tag: AtomicU64::new(1),
        })
    }

    /// Create a client with a pre-built `reqwest::Client` and no credentials.
    pub fn with_client(http: reqwest::Client, endpoint: Url) -> Self {
        Self {
            http,
            endpoint: normalize_endpoint(endpoint),
            credentials: None,
            timeout: Duration::from_secs(10),
            session_id: RwLock::new(None),
            tag: AtomicU64::new(1),
        }
    }

    /// The RPC endpoint URL.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The session id negotiated so far, if any.
    pub fn session_id(&self) -> Option<String> {
        self.session_id
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Call `method` and deserialize its `arguments` object into `T`.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        arguments: Option<Value>,
    ) -> Result<T, Error> {
        let value = self.call_raw(method, arguments).await?;
        serde_json::from_value(value.clone()).map_err(|e| Error::Deserialization {
            message: format!("{method}: {e}"),
            body: value.to_string(),
        })
    }

    /// Call `method` and return its raw `arguments` (or `null`).
    pub async fn call_raw(&self, method: &str, arguments: Option<Value>) -> Result<Value, Error> {
        let payload = RpcRequest {
            method,
            arguments,
            tag: self.tag.fetch_add(1, Ordering::Relaxed),
        };
        debug!(method, tag = payload.tag, "POST {}", self.endpoint);

        let mut renegotiated = false;
        loop {
            let resp = self.send(&payload).await?;
            match resp.status() {
                StatusCode::CONFLICT => {
                    let token = resp
                        .headers()
                        .get(SESSION_ID_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .map(String::from);
                    match token {
                        Some(token) if !renegotiated => {
                            trace!("session id rotated");
                            *self
                                .session_id
                                .write()
                                .unwrap_or_else(PoisonError::into_inner) = Some(token);
                            renegotiated = true;
                        }
                        Some(_) => {
                            return Err(Error::Session {
                                message: "daemon rejected the renegotiated session id".into(),
                            });
                        }
                        None => {
                            return Err(Error::Session {
                                message: format!("409 without {SESSION_ID_HEADER} header"),
                            });
                        }
                    }
                }
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    return Err(Error::Authentication {
                        message: format!("HTTP {} from {}", resp.status().as_u16(), self.endpoint),
                    });
                }
                status if !status.is_success() => {
                    return Err(Error::HttpStatus {
                        status: status.as_u16(),
                    });
                }
                _ => return self.parse_envelope(method, resp).await,
            }
        }
    }

    async fn send(&self, payload: &RpcRequest<'_>) -> Result<reqwest::Response, Error> {
        let mut builder = self.http.post(self.endpoint.clone()).json(payload);
        if let Some(ref creds) = self.credentials {
            builder = builder.basic_auth(
                &creds.username,
                creds.password.as_ref().map(|p| p.expose_secret().to_owned()),
            );
        }
        if let Some(token) = self.session_id() {
            builder = builder.header(SESSION_ID_HEADER, token);
        }
        builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    timeout_secs: self.timeout.as_secs(),
                }
            } else {
                Error::Transport(e)
            }
        })
    }

    /// Unwrap `{ "result": "success", "arguments": {...} }`.
    async fn parse_envelope(&self, method: &str, resp: reqwest::Response) -> Result<Value, Error> {
        let body = resp.text().await.map_err(Error::Transport)?;
        let envelope: RpcResponse =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: body.clone(),
            })?;

        if envelope.result != "success" {
            return Err(Error::Rpc {
                method: method.to_owned(),
                result: envelope.result,
            });
        }
        Ok(envelope.arguments.unwrap_or(Value::Null))
    }
}

fn normalize_endpoint(mut url: Url) -> Url {
    if url.path().is_empty() || url.path() == "/" {
        url.set_path(DEFAULT_RPC_PATH);
    }
    url
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn bare_root_gets_rpc_path() {
        let url = normalize_endpoint(Url::parse("http://localhost:9091").unwrap());
        assert_eq!(url.as_str(), "http://localhost:9091/transmission/rpc");
    }

    #[test]
    fn explicit_path_is_kept() {
        let url = normalize_endpoint(Url::parse("http://nas/custom/rpc").unwrap());
        assert_eq!(url.path(), "/custom/rpc");
    }
}
