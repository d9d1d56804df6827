use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use timemap_core::{
    AggregatedDomain, CategoryId, EntityRef, Narrative, Notification, TagFilters, TimeRange,
};

/// Map layers shown on first load.
pub const DEFAULT_VIEWS: [(&str, bool); 3] = [("events", true), ("routes", false), ("sites", true)];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "es-MX")]
    EsMx,
}

impl Language {
    pub fn other(self) -> Self {
        match self {
            Language::EnUs => Language::EsMx,
            Language::EsMx => Language::EnUs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    pub tags: TagFilters,
    pub timerange: TimeRange,
    pub categories: Vec<CategoryId>,
    pub views: BTreeMap<String, bool>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            tags: TagFilters::new(),
            timerange: TimeRange::default_window(),
            categories: Vec::new(),
            views: DEFAULT_VIEWS
                .iter()
                .map(|(layer, on)| (layer.to_string(), *on))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flags {
    pub is_fetching_domain: bool,
    pub is_fetching_sources: bool,
    pub is_infopopup: bool,
    pub is_notification: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Errors {
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub highlighted: Option<EntityRef>,
    pub selected: Vec<EntityRef>,
    pub narrative: Option<Narrative>,
    pub language: Language,
    pub filters: FilterState,
    pub flags: Flags,
    pub notifications: Vec<Notification>,
    pub error: Option<String>,
    pub errors: Errors,

    /// Latest aggregated payload. Its notifications are moved into
    /// `notifications` when stored.
    pub domain: AggregatedDomain,
}
