// seedctl-api: Async Rust client for the Transmission RPC protocol

pub mod client;
pub mod error;
pub mod models;
pub mod session;
pub mod torrent;
pub mod transport;

pub use client::{DEFAULT_RPC_PATH, RpcClient, SESSION_ID_HEADER};
pub use error::Error;
pub use models::{
    FileStatWire, FileWire, Ids, PeerWire, SessionInfo, TorrentAddResponse, TorrentGetResponse,
    TorrentRef, TorrentSetArgs, TorrentWire, TrackerStatWire,
};
pub use torrent::{TORRENT_FIELDS, TorrentAction};
pub use transport::{Credentials, TlsMode, TransportConfig};
