use thiserror::Error;

/// Top-level error type for the `seedctl-api` crate.
///
/// Covers every failure mode of a Transmission RPC exchange: transport,
/// authentication, session negotiation, and daemon-side RPC results.
/// `seedctl-core` maps these into connectivity vs. rejection failures.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// HTTP 401 from the daemon (bad or missing basic-auth credentials).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// HTTP 409 without a usable `X-Transmission-Session-Id`, or the
    /// daemon kept rotating the session id.
    #[error("Session negotiation failed: {message}")]
    Session { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Any non-success HTTP status not covered above.
    #[error("Unexpected HTTP status {status}")]
    HttpStatus { status: u16 },

    // ── RPC ─────────────────────────────────────────────────────────
    /// The daemon answered, but `result` was not `"success"`.
    #[error("RPC {method} failed: {result}")]
    Rpc { method: String, result: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the request never produced a daemon verdict:
    /// the network, the HTTP layer, or the session handshake failed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Timeout { .. } | Self::Session { .. } | Self::HttpStatus { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` for credential failures.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// The daemon's `result` string, if the daemon rejected the call.
    pub fn rpc_result(&self) -> Option<&str> {
        match self {
            Self::Rpc { result, .. } => Some(result),
            _ => None,
        }
    }
}
