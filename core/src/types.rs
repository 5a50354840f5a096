//! Request builders for the Pocket item API.
//!
//! # Design
//! Builders are owned values moved through each setter, so a request reads as
//! one chained expression. Setters accept whatever they are given; checking
//! that a combination makes sense is left to the service. Every value ends up
//! as a string because Pocket's v3 API is string-typed on the wire.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Sort order for retrieved items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKind {
    Newest,
    Oldest,
    Title,
    Site,
}

impl SortKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SortKind::Newest => "newest",
            SortKind::Oldest => "oldest",
            SortKind::Title => "title",
            SortKind::Site => "site",
        }
    }
}

/// Content type filter for retrieved items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Article,
    Video,
    Image,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Article => "article",
            ContentType::Video => "video",
            ContentType::Image => "image",
        }
    }
}

/// Read state filter for retrieved items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Unread,
    Archive,
    All,
}

impl ItemState {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemState::Unread => "unread",
            ItemState::Archive => "archive",
            ItemState::All => "all",
        }
    }
}

/// How much detail the service returns per item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailType {
    Simple,
    Complete,
}

impl DetailType {
    pub fn as_str(self) -> &'static str {
        match self {
            DetailType::Simple => "simple",
            DetailType::Complete => "complete",
        }
    }
}

/// Tag value Pocket interprets as "items without any tag".
pub const UNTAGGED: &str = "_untagged_";

/// Parameters for a `/v3/get` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrieveRequest {
    params: BTreeMap<String, String>,
}

impl RetrieveRequest {
    pub fn new() -> Self {
        Self::default()
    }

    fn set(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn sort(self, kind: SortKind) -> Self {
        self.set("sort", kind.as_str())
    }

    pub fn detail_type(self, detail: DetailType) -> Self {
        self.set("detailType", detail.as_str())
    }

    pub fn simple_item_info(self) -> Self {
        self.detail_type(DetailType::Simple)
    }

    pub fn complete_item_info(self) -> Self {
        self.detail_type(DetailType::Complete)
    }

    pub fn only_content_type(self, kind: ContentType) -> Self {
        self.set("contentType", kind.as_str())
    }

    pub fn only_state(self, state: ItemState) -> Self {
        self.set("state", state.as_str())
    }

    pub fn only_favorited(self) -> Self {
        self.set("favorite", "1")
    }

    pub fn only_unfavorited(self) -> Self {
        self.set("favorite", "0")
    }

    pub fn only_tag(self, tag: &str) -> Self {
        self.set("tag", tag)
    }

    pub fn only_untagged(self) -> Self {
        self.set("tag", UNTAGGED)
    }

    pub fn count(self, count: u32) -> Self {
        self.set("count", count.to_string())
    }

    pub fn offset(self, offset: u32) -> Self {
        self.set("offset", offset.to_string())
    }

    /// Only items modified since the given unix timestamp (seconds).
    pub fn since(self, timestamp: u64) -> Self {
        self.set("since", timestamp.to_string())
    }

    pub fn only_domain(self, domain: &str) -> Self {
        self.set("domain", domain)
    }

    pub fn search(self, query: &str) -> Self {
        self.set("search", query)
    }

    /// The accumulated parameters, without credentials.
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub(crate) fn into_params(self) -> BTreeMap<String, String> {
        self.params
    }
}

/// Parameters for a `/v3/add` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddRequest {
    url: String,
    title: String,
    tags: Vec<String>,
    tweet_id: String,
}

impl AddRequest {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            title: String::new(),
            tags: Vec::new(),
            tweet_id: String::new(),
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }

    /// Appends tags after any already present. Duplicates are kept.
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Associates the saved item with a tweet.
    pub fn tweet_id(mut self, id: &str) -> Self {
        self.tweet_id = id.to_string();
        self
    }

    /// The wire parameters, without credentials. Empty optional fields are
    /// omitted.
    pub fn params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("url".to_string(), self.url.clone());
        if !self.title.is_empty() {
            params.insert("title".to_string(), self.title.clone());
        }
        if !self.tags.is_empty() {
            params.insert("tags".to_string(), self.tags.join(","));
        }
        if !self.tweet_id.is_empty() {
            params.insert("tweet_id".to_string(), self.tweet_id.clone());
        }
        params
    }
}

/// The closed set of mutations accepted by `/v3/send`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Add,
    Archive,
    Readd,
    Favorite,
    Unfavorite,
    Delete,
    TagsAdd,
    TagsRemove,
    TagsReplace,
    TagsClear,
    TagRename,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Add => "add",
            ActionKind::Archive => "archive",
            ActionKind::Readd => "readd",
            ActionKind::Favorite => "favorite",
            ActionKind::Unfavorite => "unfavorite",
            ActionKind::Delete => "delete",
            ActionKind::TagsAdd => "tags_add",
            ActionKind::TagsRemove => "tags_remove",
            ActionKind::TagsReplace => "tags_replace",
            ActionKind::TagsClear => "tags_clear",
            ActionKind::TagRename => "tag_rename",
        }
    }
}

/// A single mutation in a batched modify call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub kind: ActionKind,
    pub params: BTreeMap<String, String>,
}

impl Action {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            params: BTreeMap::new(),
        }
    }

    pub fn param(mut self, key: &str, value: &str) -> Self {
        self.params.insert(key.to_string(), value.to_string());
        self
    }

    fn on_item(kind: ActionKind, item_id: &str) -> Self {
        Self::new(kind).param("item_id", item_id)
    }

    pub fn add(url: &str) -> Self {
        Self::new(ActionKind::Add).param("url", url)
    }

    pub fn archive(item_id: &str) -> Self {
        Self::on_item(ActionKind::Archive, item_id)
    }

    pub fn readd(item_id: &str) -> Self {
        Self::on_item(ActionKind::Readd, item_id)
    }

    pub fn favorite(item_id: &str) -> Self {
        Self::on_item(ActionKind::Favorite, item_id)
    }

    pub fn unfavorite(item_id: &str) -> Self {
        Self::on_item(ActionKind::Unfavorite, item_id)
    }

    pub fn delete(item_id: &str) -> Self {
        Self::on_item(ActionKind::Delete, item_id)
    }

    pub fn tags_add(item_id: &str, tags: &[&str]) -> Self {
        Self::on_item(ActionKind::TagsAdd, item_id).param("tags", &tags.join(","))
    }

    pub fn tags_remove(item_id: &str, tags: &[&str]) -> Self {
        Self::on_item(ActionKind::TagsRemove, item_id).param("tags", &tags.join(","))
    }

    pub fn tags_replace(item_id: &str, tags: &[&str]) -> Self {
        Self::on_item(ActionKind::TagsReplace, item_id).param("tags", &tags.join(","))
    }

    pub fn tags_clear(item_id: &str) -> Self {
        Self::on_item(ActionKind::TagsClear, item_id)
    }

    /// Renames a tag across every item of the user.
    pub fn tag_rename(old_tag: &str, new_tag: &str) -> Self {
        Self::new(ActionKind::TagRename)
            .param("old_tag", old_tag)
            .param("new_tag", new_tag)
    }

    /// JSON form sent to the service. The `action` key always holds the kind,
    /// even if a parameter of the same name was set.
    pub fn to_json(&self) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        for (key, value) in &self.params {
            object.insert(key.clone(), serde_json::Value::String(value.clone()));
        }
        object.insert(
            "action".to_string(),
            serde_json::Value::String(self.kind.as_str().to_string()),
        );
        serde_json::Value::Object(object)
    }
}

/// An ordered batch of actions. Pocket applies them in sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModifyRequest {
    actions: Vec<Action>,
}

impl ModifyRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }
}
