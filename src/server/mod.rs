//! HTTP relay server
//!
//! Exposes the broker over plain HTTP:
//!
//! ```text
//! POST /pub?id=xyz            publish the body on channel xyz
//! GET  /sub?id=xyz            stream messages of channel xyz (chunked)
//! GET  /sub?id=xyz&nochunked  wait for one message, then close
//! GET  /del?id=xyz            delete channel xyz, ending its subscribers
//! GET  /gen?len=16            random channel id
//! ```
//!
//! `id` may be repeated, and `set=name` selects a channel set other than
//! the default one.

pub mod config;
pub mod handlers;
pub mod listener;
pub mod params;
pub mod sink;

pub use config::ServerConfig;
pub use handlers::{generate_channel_id, AppState, PublishReply};
pub use listener::RelayServer;
pub use params::RequestParams;
pub use sink::{HttpSink, PendingResponse};
