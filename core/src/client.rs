//! Request builder, response parser and blocking executor for the Pocket API.
//!
//! # Design
//! Every remote operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`. The
//! plain-named method (`retrieve`, `add`, ...) runs the two through the
//! client's `Transport`. Callers that want to own the I/O can use the split
//! halves directly.
//!
//! Credential checks happen in `build_*`, so an unauthenticated call fails
//! before anything reaches the transport.

use std::collections::BTreeMap;

use url::form_urlencoded;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{
    HttpMethod, HttpRequest, HttpResponse, CONTENT_TYPE_FORM, CONTENT_TYPE_JSON,
    ERROR_CODE_HEADER, ERROR_MESSAGE_HEADER,
};
use crate::transport::{Transport, UreqTransport};
use crate::types::{Action, AddRequest, ModifyRequest, RetrieveRequest};

const REQUEST_TOKEN_PATH: &str = "/v3/oauth/request";
const ACCESS_TOKEN_PATH: &str = "/v3/oauth/authorize";
const AUTHORIZATION_PATH: &str = "/auth/authorize";
const RETRIEVE_PATH: &str = "/v3/get";
const ADD_PATH: &str = "/v3/add";
const MODIFY_PATH: &str = "/v3/send";

/// Dynamic JSON object returned by the item endpoints.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// Result of the access-token exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: String,
    pub username: String,
}

/// Client for one Pocket application (consumer key) and at most one user.
#[derive(Debug, Clone)]
pub struct PocketClient<T = UreqTransport> {
    consumer_key: String,
    access_token: String,
    username: String,
    base_url: String,
    transport: T,
}

impl PocketClient<UreqTransport> {
    /// Unauthenticated client; run the token exchange before item calls.
    pub fn new(consumer_key: &str) -> Self {
        Self::with_config(consumer_key, &ClientConfig::default())
    }

    /// Client for a user whose access token is already known.
    pub fn with_access_token(consumer_key: &str, access_token: &str, username: &str) -> Self {
        Self::new(consumer_key).authenticated(access_token, username)
    }

    pub fn with_config(consumer_key: &str, config: &ClientConfig) -> Self {
        Self::with_transport(consumer_key, &config.base_url, UreqTransport::new(config))
    }
}

impl<T> PocketClient<T> {
    pub fn with_transport(consumer_key: &str, base_url: &str, transport: T) -> Self {
        Self {
            consumer_key: consumer_key.to_string(),
            access_token: String::new(),
            username: String::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
        }
    }

    pub fn authenticated(mut self, access_token: &str, username: &str) -> Self {
        self.access_token = access_token.to_string();
        self.username = username.to_string();
        self
    }

    pub fn consumer_key(&self) -> &str {
        &self.consumer_key
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn is_authenticated(&self) -> bool {
        !self.access_token.is_empty()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn require_access_token(&self) -> Result<(), ApiError> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(ApiError::MissingAccessToken)
        }
    }

    // --- OAuth-like token exchange ---

    pub fn build_request_token(&self, redirect_uri: &str) -> HttpRequest {
        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("consumer_key", &self.consumer_key)
            .append_pair("redirect_uri", redirect_uri)
            .finish();
        form_post(self.endpoint(REQUEST_TOKEN_PATH), body)
    }

    /// Extracts the request token from the `code` field. A response without
    /// `code` is an `ApiError::Decode`, never an empty token.
    pub fn parse_request_token(&self, response: HttpResponse) -> Result<String, ApiError> {
        let body = check_status(response)?;
        query_field(query_text(&body)?, "code")
    }

    /// URL the user must visit to approve `request_token`. Pure; no I/O.
    pub fn authorization_url(&self, request_token: &str, redirect_uri: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("request_token", request_token)
            .append_pair("redirect_uri", redirect_uri)
            .finish();
        format!("{}?{query}", self.endpoint(AUTHORIZATION_PATH))
    }

    pub fn build_access_token(&self, request_token: &str) -> HttpRequest {
        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("consumer_key", &self.consumer_key)
            .append_pair("code", request_token)
            .finish();
        form_post(self.endpoint(ACCESS_TOKEN_PATH), body)
    }

    pub fn parse_access_token(&self, response: HttpResponse) -> Result<Credentials, ApiError> {
        let body = check_status(response)?;
        let body = query_text(&body)?;
        let access_token = query_field(body, "access_token")?;
        let username = query_field(body, "username").unwrap_or_default();
        Ok(Credentials {
            access_token,
            username,
        })
    }

    // --- item API ---

    pub fn build_retrieve(&self, request: RetrieveRequest) -> Result<HttpRequest, ApiError> {
        self.require_access_token()?;
        let mut params = request.into_params();
        self.insert_credentials(&mut params);
        json_post(self.endpoint(RETRIEVE_PATH), &params)
    }

    pub fn parse_retrieve(&self, response: HttpResponse) -> Result<JsonObject, ApiError> {
        decode_object(response)
    }

    pub fn build_add(&self, request: &AddRequest) -> Result<HttpRequest, ApiError> {
        self.require_access_token()?;
        let mut params = request.params();
        self.insert_credentials(&mut params);
        json_post(self.endpoint(ADD_PATH), &params)
    }

    pub fn parse_add(&self, response: HttpResponse) -> Result<JsonObject, ApiError> {
        decode_object(response)
    }

    pub fn build_modify(&self, request: &ModifyRequest) -> Result<HttpRequest, ApiError> {
        self.require_access_token()?;
        let actions: Vec<serde_json::Value> = request.actions().iter().map(Action::to_json).collect();
        let actions = serde_json::to_string(&actions).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("consumer_key", &self.consumer_key)
            .append_pair("access_token", &self.access_token)
            .append_pair("actions", &actions)
            .finish();
        Ok(HttpRequest {
            method: HttpMethod::Get,
            url: format!("{}?{query}", self.endpoint(MODIFY_PATH)),
            headers: Vec::new(),
            body: None,
        })
    }

    pub fn parse_modify(&self, response: HttpResponse) -> Result<JsonObject, ApiError> {
        decode_object(response)
    }

    fn insert_credentials(&self, params: &mut BTreeMap<String, String>) {
        params.insert("consumer_key".to_string(), self.consumer_key.clone());
        params.insert("access_token".to_string(), self.access_token.clone());
    }
}

impl<T: Transport> PocketClient<T> {
    /// Step one of authentication: obtain a request token.
    pub fn request_token(&self, redirect_uri: &str) -> Result<String, ApiError> {
        let response = self.send("request_token", self.build_request_token(redirect_uri))?;
        self.parse_request_token(response)
    }

    /// Final step of authentication. Stores the access token and username on
    /// the client and returns them.
    pub fn fetch_access_token(&mut self, request_token: &str) -> Result<Credentials, ApiError> {
        let response = self.send("access_token", self.build_access_token(request_token))?;
        let credentials = self.parse_access_token(response)?;
        self.access_token = credentials.access_token.clone();
        self.username = credentials.username.clone();
        tracing::debug!(username = %self.username, "pocket access token obtained");
        Ok(credentials)
    }

    pub fn retrieve(&self, request: RetrieveRequest) -> Result<JsonObject, ApiError> {
        let response = self.send("retrieve", self.build_retrieve(request)?)?;
        self.parse_retrieve(response)
    }

    pub fn add(&self, request: &AddRequest) -> Result<JsonObject, ApiError> {
        let response = self.send("add", self.build_add(request)?)?;
        self.parse_add(response)
    }

    pub fn modify(&self, request: &ModifyRequest) -> Result<JsonObject, ApiError> {
        let response = self.send("modify", self.build_modify(request)?)?;
        self.parse_modify(response)
    }

    fn send(&self, operation: &'static str, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        // The URL is not logged: for modify it carries the access token.
        tracing::debug!(operation, method = ?request.method, "sending pocket request");
        let response = self.transport.execute(request)?;
        tracing::debug!(operation, status = response.status, "pocket response received");
        Ok(response)
    }
}

fn form_post(url: String, body: String) -> HttpRequest {
    HttpRequest {
        method: HttpMethod::Post,
        url,
        headers: vec![("content-type".to_string(), CONTENT_TYPE_FORM.to_string())],
        body: Some(body),
    }
}

fn json_post(url: String, params: &BTreeMap<String, String>) -> Result<HttpRequest, ApiError> {
    let body = serde_json::to_string(params).map_err(|e| ApiError::Serialization(e.to_string()))?;
    Ok(HttpRequest {
        method: HttpMethod::Post,
        url,
        headers: vec![("content-type".to_string(), CONTENT_TYPE_JSON.to_string())],
        body: Some(body),
    })
}

/// Return the body of a 200 response, or turn anything else into
/// `ApiError::Service` using Pocket's error headers. The error keeps the body,
/// decoded lossily.
pub fn check_status(response: HttpResponse) -> Result<Vec<u8>, ApiError> {
    if response.status == 200 {
        return Ok(response.body);
    }
    let code = response
        .header(ERROR_CODE_HEADER)
        .and_then(|value| value.trim().parse().ok());
    let message = response.header(ERROR_MESSAGE_HEADER).unwrap_or_default().to_string();
    tracing::debug!(status = response.status, code = ?code, %message, "pocket service error");
    Err(ApiError::Service {
        status: response.status,
        code,
        message,
        body: String::from_utf8_lossy(&response.body).into_owned(),
    })
}

fn decode_object(response: HttpResponse) -> Result<JsonObject, ApiError> {
    let body = check_status(response)?;
    match serde_json::from_slice(&body) {
        Ok(serde_json::Value::Object(object)) => Ok(object),
        Ok(other) => Err(ApiError::Decode(format!("expected a JSON object, got {other}"))),
        Err(e) => Err(ApiError::Decode(e.to_string())),
    }
}

fn query_text(body: &[u8]) -> Result<&str, ApiError> {
    std::str::from_utf8(body).map_err(|e| ApiError::Decode(format!("query string is not UTF-8: {e}")))
}

fn query_field(body: &str, key: &str) -> Result<String, ApiError> {
    form_urlencoded::parse(body.trim().as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
        .ok_or_else(|| ApiError::Decode(format!("missing field `{key}` in {body:?}")))
}
