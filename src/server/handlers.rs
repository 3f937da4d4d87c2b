//! Request handlers
//!
//! - `/pub`: publish the request body on the listed channels
//! - `/sub`: stream messages of the listed channels
//! - `/del`: tear down channels, ending their subscribers' responses
//! - `/gen`: generate a random channel id

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode, Version};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use rand::Rng;
use serde::Serialize;

use crate::broker::message::{Abbrev, AbbrevList};
use crate::broker::{Broker, BrokerError, Message, DEFAULT_CONTENT_TYPE};
use crate::delivery::{self, DeliveryMode};

use super::config::ServerConfig;
use super::params::RequestParams;
use super::sink::HttpSink;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub broker: Arc<Broker>,
    pub config: Arc<ServerConfig>,
}

type QueryPairs = Query<Vec<(String, String)>>;

/// Reply to a publish request
#[derive(Debug, Serialize)]
pub struct PublishReply {
    /// Number of subscriber queues the message landed in
    pub succ: usize,
}

pub(crate) async fn publish(
    State(state): State<AppState>,
    Query(pairs): QueryPairs,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let params = RequestParams::from_pairs(pairs, &state.config);

    if body.is_empty() {
        tracing::warn!("Publish rejected: empty body");
        return StatusCode::BAD_REQUEST.into_response();
    }
    if params.channel_ids.is_empty() {
        tracing::warn!("Publish rejected: no channel ids");
        return StatusCode::BAD_REQUEST.into_response();
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(DEFAULT_CONTENT_TYPE);
    let msg = Message::new(body, content_type);

    match state
        .broker
        .publish(params.set(), &params.channel_ids, msg)
        .await
    {
        Ok(delivered) => Json(PublishReply { succ: delivered }).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Publish failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub(crate) async fn subscribe(
    State(state): State<AppState>,
    version: Version,
    Query(pairs): QueryPairs,
) -> Response {
    let params = RequestParams::from_pairs(pairs, &state.config);

    if params.channel_ids.is_empty() {
        tracing::warn!("Subscribe rejected: no channel ids");
        return StatusCode::BAD_REQUEST.into_response();
    }

    let (set, subscription) = match state
        .broker
        .subscribe(params.set(), &params.channel_ids)
        .await
    {
        Ok(pair) => pair,
        Err(e) => {
            tracing::warn!(error = %e, "Subscribe rejected");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let mode = if params.chunked {
        DeliveryMode::Chunked
    } else {
        DeliveryMode::Single
    };

    // HTTP/1.0 and older have no chunked transfer encoding
    let streaming = version >= Version::HTTP_11;
    let (mut sink, pending) = HttpSink::new(streaming);

    tokio::spawn(async move {
        delivery::run(&set, subscription, &mut sink, mode).await;
    });

    pending.into_response().await
}

pub(crate) async fn delete(State(state): State<AppState>, Query(pairs): QueryPairs) -> Response {
    let params = RequestParams::from_pairs(pairs, &state.config);

    if params.channel_ids.is_empty() {
        tracing::warn!("Delete rejected: no channel ids");
        return StatusCode::BAD_REQUEST.into_response();
    }

    match state
        .broker
        .delete_channels(params.set(), &params.channel_ids)
        .await
    {
        Ok(()) => StatusCode::OK.into_response(),
        Err(BrokerError::ChannelsNotFound(_)) => {
            tracing::debug!(
                set = %Abbrev::str(params.set().unwrap_or(state.broker.default_set_name())),
                channels = %AbbrevList(&params.channel_ids),
                "Delete found no channels"
            );
            StatusCode::NOT_FOUND.into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Delete rejected");
            StatusCode::BAD_REQUEST.into_response()
        }
    }
}

pub(crate) async fn generate(State(state): State<AppState>, Query(pairs): QueryPairs) -> Response {
    let params = RequestParams::from_pairs(pairs, &state.config);

    let len = match params.id_length.as_deref() {
        None | Some("") => state.config.default_id_length,
        Some(raw) => match raw.parse::<usize>() {
            Ok(len) => len.min(state.config.max_id_length),
            Err(_) => {
                tracing::warn!(length = raw, "Invalid channel id length");
                return StatusCode::BAD_REQUEST.into_response();
            }
        },
    };

    (
        [(header::CONTENT_TYPE, DEFAULT_CONTENT_TYPE)],
        generate_channel_id(len),
    )
        .into_response()
}

/// Random channel id of `len` lowercase ASCII letters
pub fn generate_channel_id(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.gen_range('a'..='z')).collect()
}
