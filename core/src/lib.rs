//! Synchronous client for the Pocket v3 API.
//!
//! # Overview
//! Covers the OAuth-like token exchange (request token, authorization URL,
//! access token) and the item endpoints: retrieve, add and batched modify.
//! Responses are returned as dynamic JSON objects since their shape varies by
//! call.
//!
//! # Design
//! - Each operation is split into `build_*` (produces an `HttpRequest`) and
//!   `parse_*` (consumes an `HttpResponse`); a `Transport` runs the round-trip
//!   in between. `UreqTransport` is the blocking default.
//! - Request parameters accumulate in owned builders (`RetrieveRequest`,
//!   `AddRequest`, `ModifyRequest`).
//! - Failures are reported through `X-Error-Code` / `X-Error` headers and
//!   surface as `ApiError::Service`.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use client::{check_status, Credentials, JsonObject, PocketClient};
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};
pub use types::{
    Action, ActionKind, AddRequest, ContentType, DetailType, ItemState, ModifyRequest,
    RetrieveRequest, SortKind,
};
