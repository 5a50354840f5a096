//! In-memory stand-in for the Pocket v3 API.
//!
//! Implements the OAuth-like token exchange and the get/add/send endpoints
//! closely enough for the client's integration tests. Failures are signalled
//! the way Pocket does it: an HTTP status plus `X-Error-Code` and `X-Error`
//! headers, with an empty body.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const MOCK_CONSUMER_KEY: &str = "1234-abcd1234abcd1234abcd1234";
pub const MOCK_USERNAME: &str = "pocketuser";

const STATUS_UNREAD: u8 = 0;
const STATUS_ARCHIVED: u8 = 1;
const FIRST_ITEM_ID: u64 = 1000;
const EPOCH: u64 = 1_700_000_000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    pub item_id: u64,
    pub url: String,
    pub title: String,
    pub favorite: bool,
    pub status: u8,
    pub tags: BTreeSet<String>,
    pub time_added: u64,
}

impl Item {
    /// Pocket's string-typed item representation. `complete` adds tags.
    pub fn to_json(&self, sort_id: usize, complete: bool) -> Value {
        let id = self.item_id.to_string();
        let mut item = json!({
            "item_id": id,
            "resolved_id": id,
            "given_url": self.url,
            "resolved_url": self.url,
            "given_title": self.title,
            "resolved_title": self.title,
            "favorite": if self.favorite { "1" } else { "0" },
            "status": self.status.to_string(),
            "time_added": self.time_added.to_string(),
            "sort_id": sort_id,
        });
        if complete {
            let tags: serde_json::Map<String, Value> = self
                .tags
                .iter()
                .map(|tag| (tag.clone(), json!({ "item_id": id, "tag": tag })))
                .collect();
            item["tags"] = Value::Object(tags);
        }
        item
    }

    fn host(&self) -> &str {
        let rest = self.url.split_once("://").map_or(self.url.as_str(), |(_, rest)| rest);
        rest.split('/').next().unwrap_or(rest)
    }
}

pub struct Store {
    consumer_key: String,
    pending_codes: HashSet<String>,
    tokens: HashMap<String, String>,
    items: BTreeMap<u64, Item>,
    next_id: u64,
    clock: u64,
}

impl Store {
    pub fn new(consumer_key: &str) -> Self {
        Self {
            consumer_key: consumer_key.to_string(),
            pending_codes: HashSet::new(),
            tokens: HashMap::new(),
            items: BTreeMap::new(),
            next_id: FIRST_ITEM_ID,
            clock: EPOCH,
        }
    }

    pub fn insert_item(&mut self, url: &str, title: &str, tags: impl IntoIterator<Item = String>) -> Item {
        self.clock += 1;
        let item = Item {
            item_id: self.next_id,
            url: url.to_string(),
            title: title.to_string(),
            favorite: false,
            status: STATUS_UNREAD,
            tags: tags.into_iter().collect(),
            time_added: self.clock,
        };
        self.next_id += 1;
        self.items.insert(item.item_id, item.clone());
        item
    }

    pub fn item(&self, item_id: u64) -> Option<&Item> {
        self.items.get(&item_id)
    }

    fn check_credentials(&self, params: &HashMap<String, String>) -> Result<(), Response> {
        if params.get("consumer_key") != Some(&self.consumer_key) {
            return Err(pocket_error(StatusCode::FORBIDDEN, 152, "Invalid consumer key."));
        }
        match params.get("access_token") {
            Some(token) if self.tokens.contains_key(token) => Ok(()),
            _ => Err(pocket_error(StatusCode::UNAUTHORIZED, 107, "Invalid access token.")),
        }
    }

    /// Applies one `/v3/send` action. Returns the per-action result flag.
    pub fn apply_action(&mut self, action: &serde_json::Map<String, Value>) -> bool {
        let text = |key: &str| action.get(key).and_then(Value::as_str);

        match text("action") {
            Some("add") => match text("url") {
                Some(url) => {
                    let tags = split_tags(text("tags").unwrap_or_default());
                    self.insert_item(url, text("title").unwrap_or_default(), tags);
                    true
                }
                None => false,
            },
            Some("tag_rename") => match (text("old_tag"), text("new_tag")) {
                (Some(old), Some(new)) => {
                    for item in self.items.values_mut() {
                        if item.tags.remove(old) {
                            item.tags.insert(new.to_string());
                        }
                    }
                    true
                }
                _ => false,
            },
            Some(kind) => {
                let Some(item_id) = text("item_id").and_then(|id| id.parse::<u64>().ok()) else {
                    return false;
                };
                if kind == "delete" {
                    return self.items.remove(&item_id).is_some();
                }
                let Some(item) = self.items.get_mut(&item_id) else {
                    return false;
                };
                let tags = split_tags(text("tags").unwrap_or_default());
                match kind {
                    "archive" => item.status = STATUS_ARCHIVED,
                    "readd" => item.status = STATUS_UNREAD,
                    "favorite" => item.favorite = true,
                    "unfavorite" => item.favorite = false,
                    "tags_add" => item.tags.extend(tags),
                    "tags_remove" => {
                        for tag in tags {
                            item.tags.remove(&tag);
                        }
                    }
                    "tags_replace" => item.tags = tags.collect(),
                    "tags_clear" => item.tags.clear(),
                    _ => return false,
                }
                true
            }
            None => false,
        }
    }

    /// Items matching the `/v3/get` filters, in the requested order.
    fn select(&self, params: &HashMap<String, String>) -> Result<Vec<&Item>, Response> {
        let param = |key: &str| params.get(key).map(String::as_str);
        let number = |key: &str| -> Result<Option<u64>, Response> {
            param(key)
                .map(|value| value.parse::<u64>())
                .transpose()
                .map_err(|_| pocket_error(StatusCode::BAD_REQUEST, 199, "Invalid numeric parameter."))
        };
        let since = number("since")?;
        let offset = number("offset")?.unwrap_or(0) as usize;
        let count = number("count")?.map(|c| c as usize);

        let mut items: Vec<&Item> = self
            .items
            .values()
            .filter(|item| match param("state").unwrap_or("unread") {
                "archive" => item.status == STATUS_ARCHIVED,
                "all" => true,
                _ => item.status == STATUS_UNREAD,
            })
            .filter(|item| match param("favorite") {
                Some("1") => item.favorite,
                Some("0") => !item.favorite,
                _ => true,
            })
            .filter(|item| match param("tag") {
                Some("_untagged_") => item.tags.is_empty(),
                Some(tag) => item.tags.contains(tag),
                None => true,
            })
            .filter(|_| param("contentType").map_or(true, |kind| kind == "article"))
            .filter(|item| param("domain").map_or(true, |domain| item.host().ends_with(domain)))
            .filter(|item| {
                param("search").map_or(true, |query| {
                    let query = query.to_lowercase();
                    item.title.to_lowercase().contains(&query) || item.url.to_lowercase().contains(&query)
                })
            })
            .filter(|item| since.map_or(true, |since| item.time_added >= since))
            .collect();

        match param("sort").unwrap_or("newest") {
            "oldest" => items.sort_by_key(|item| item.time_added),
            "title" => items.sort_by(|a, b| a.title.cmp(&b.title)),
            "site" => items.sort_by(|a, b| a.url.cmp(&b.url)),
            _ => items.sort_by(|a, b| b.time_added.cmp(&a.time_added)),
        }

        let items = items.into_iter().skip(offset);
        Ok(match count {
            Some(count) => items.take(count).collect(),
            None => items.collect(),
        })
    }
}

pub type Db = Arc<RwLock<Store>>;

fn split_tags(tags: &str) -> impl Iterator<Item = String> + '_ {
    tags.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
}

/// Pocket-style failure: status plus error headers, empty body.
pub fn pocket_error(status: StatusCode, code: u32, message: &str) -> Response {
    (
        status,
        [("x-error-code", code.to_string()), ("x-error", message.to_string())],
        (),
    )
        .into_response()
}

fn form_response(body: String) -> Response {
    ([(header::CONTENT_TYPE, "application/x-www-form-urlencoded")], body).into_response()
}

pub fn app() -> Router {
    app_with_consumer_key(MOCK_CONSUMER_KEY)
}

pub fn app_with_consumer_key(consumer_key: &str) -> Router {
    let db: Db = Arc::new(RwLock::new(Store::new(consumer_key)));
    Router::new()
        .route("/v3/oauth/request", post(request_token))
        .route("/v3/oauth/authorize", post(authorize))
        .route("/v3/get", post(retrieve))
        .route("/v3/add", post(add))
        .route("/v3/send", get(send))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn request_token(State(db): State<Db>, Form(params): Form<HashMap<String, String>>) -> Response {
    let mut store = db.write().await;
    if params.get("consumer_key") != Some(&store.consumer_key) {
        return pocket_error(StatusCode::FORBIDDEN, 152, "Invalid consumer key.");
    }
    if params.get("redirect_uri").map_or(true, String::is_empty) {
        return pocket_error(StatusCode::BAD_REQUEST, 138, "Missing redirect url.");
    }
    let code = Uuid::new_v4().to_string();
    store.pending_codes.insert(code.clone());
    tracing::debug!(%code, "issued request token");
    form_response(format!("code={code}"))
}

async fn authorize(State(db): State<Db>, Form(params): Form<HashMap<String, String>>) -> Response {
    let mut store = db.write().await;
    if params.get("consumer_key") != Some(&store.consumer_key) {
        return pocket_error(StatusCode::FORBIDDEN, 152, "Invalid consumer key.");
    }
    let Some(code) = params.get("code").filter(|code| !code.is_empty()) else {
        return pocket_error(StatusCode::BAD_REQUEST, 182, "Missing code.");
    };
    if !store.pending_codes.remove(code) {
        return pocket_error(StatusCode::FORBIDDEN, 185, "User rejected code.");
    }
    let token = Uuid::new_v4().to_string();
    store.tokens.insert(token.clone(), MOCK_USERNAME.to_string());
    tracing::debug!(username = MOCK_USERNAME, "issued access token");
    form_response(format!("access_token={token}&username={MOCK_USERNAME}"))
}

async fn retrieve(State(db): State<Db>, Json(params): Json<HashMap<String, String>>) -> Response {
    let store = db.read().await;
    if let Err(response) = store.check_credentials(&params) {
        return response;
    }
    let items = match store.select(&params) {
        Ok(items) => items,
        Err(response) => return response,
    };
    let complete = params.get("detailType").map(String::as_str) == Some("complete");
    let list: serde_json::Map<String, Value> = items
        .iter()
        .enumerate()
        .map(|(sort_id, item)| (item.item_id.to_string(), item.to_json(sort_id, complete)))
        .collect();
    Json(json!({
        "status": 1,
        "complete": 1,
        "list": list,
        "since": store.clock,
    }))
    .into_response()
}

async fn add(State(db): State<Db>, Json(params): Json<HashMap<String, String>>) -> Response {
    let mut store = db.write().await;
    if let Err(response) = store.check_credentials(&params) {
        return response;
    }
    let Some(url) = params.get("url").filter(|url| !url.is_empty()) else {
        return pocket_error(StatusCode::BAD_REQUEST, 130, "Missing url.");
    };
    let title = params.get("title").map(String::as_str).unwrap_or_default();
    let tags = split_tags(params.get("tags").map(String::as_str).unwrap_or_default());
    let item = store.insert_item(url, title, tags);
    tracing::debug!(item_id = item.item_id, "added item");
    Json(json!({ "item": item.to_json(0, true), "status": 1 })).into_response()
}

async fn send(State(db): State<Db>, Query(params): Query<HashMap<String, String>>) -> Response {
    let mut store = db.write().await;
    if let Err(response) = store.check_credentials(&params) {
        return response;
    }
    let actions: Vec<serde_json::Map<String, Value>> =
        match params.get("actions").map(|raw| serde_json::from_str(raw)) {
            Some(Ok(actions)) => actions,
            _ => return pocket_error(StatusCode::BAD_REQUEST, 199, "Invalid actions."),
        };
    let results: Vec<bool> = actions.iter().map(|action| store.apply_action(action)).collect();
    tracing::debug!(actions = results.len(), "applied actions");
    Json(json!({ "status": 1, "action_results": results })).into_response()
}
