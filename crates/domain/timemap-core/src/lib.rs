use serde::{Deserialize, Serialize};
use std::fmt;

pub mod tags;
pub mod timerange;

pub use tags::{TagFilter, TagFilters, TagNode, TagTree};
pub use timerange::{narrative_range, parse_timestamp, RangeError, TimeRange};

/// Endpoint payloads are owned by the data provider; only narratives are
/// inspected by the data layer, everything else stays opaque JSON.
pub type Event = serde_json::Value;
pub type Category = serde_json::Value;
pub type Site = serde_json::Value;
pub type Tag = serde_json::Value;
pub type Source = serde_json::Value;

/// Reference to an event, site or other renderable entity.
pub type EntityRef = serde_json::Value;
pub type CategoryId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Events,
    Categories,
    Narratives,
    Sites,
    Tags,
    Sources,
}

impl Domain {
    /// Every domain, in the field order of [`AggregatedDomain`].
    pub const ALL: [Domain; 6] = [
        Domain::Events,
        Domain::Categories,
        Domain::Narratives,
        Domain::Sites,
        Domain::Tags,
        Domain::Sources,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Domain::Events => "events",
            Domain::Categories => "categories",
            Domain::Narratives => "narratives",
            Domain::Sites => "sites",
            Domain::Tags => "tags",
            Domain::Sources => "sources",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeStep {
    pub timestamp: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub steps: Vec<NarrativeStep>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Error,
    Warning,
    Good,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Notification {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
            id: None,
        }
    }

    /// Error about a specific entity, e.g. `("event", "42", "not found")`
    /// gives the message `event 42: not found`.
    pub fn domain_error(kind: &str, id: &str, message: &str) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: format!("{kind} {id}: {message}"),
            id: Some(id.to_string()),
        }
    }

    pub fn fetch_failed(domain: Domain) -> Self {
        Self::error(format!(
            "Something went wrong fetching {domain}. Check the URL or try disabling them in the config file."
        ))
    }
}

/// Everything one domain fetch produced. Fields of failed or disabled
/// domains are empty, never partial.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedDomain {
    pub events: Vec<Event>,
    pub categories: Vec<Category>,
    pub narratives: Vec<Narrative>,
    pub sites: Vec<Site>,
    pub tags: Vec<Tag>,
    pub sources: Vec<Source>,
    pub notifications: Vec<Notification>,
}

impl AggregatedDomain {
    /// Number of records held for `domain`.
    pub fn len_of(&self, domain: Domain) -> usize {
        match domain {
            Domain::Events => self.events.len(),
            Domain::Categories => self.categories.len(),
            Domain::Narratives => self.narratives.len(),
            Domain::Sites => self.sites.len(),
            Domain::Tags => self.tags.len(),
            Domain::Sources => self.sources.len(),
        }
    }
}
