use serde::{Deserialize, Serialize};

use timemap_core::{AggregatedDomain, EntityRef, Narrative, Source, TagNode, TimeRange};

use crate::domain::Language;

/// Every state transition the reducer understands. The serialized form uses
/// the action names the dashboard front end dispatches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    // Selection
    UpdateHighlighted {
        highlighted: Option<EntityRef>,
    },
    UpdateSelected {
        selected: Vec<EntityRef>,
    },

    // Filters
    #[serde(rename = "UPDATE_TAGFILTERS", alias = "UPDATE_TIMEFILTERS")]
    UpdateTagFilters {
        tag: TagNode,
    },
    #[serde(rename = "UPDATE_TIMERANGE")]
    UpdateTimeRange {
        timerange: TimeRange,
    },
    UpdateNarrative {
        narrative: Option<Narrative>,
    },
    #[serde(rename = "RESET_ALLFILTERS")]
    ResetAllFilters,

    // UI
    ToggleLanguage {
        #[serde(default)]
        language: Option<Language>,
    },
    #[serde(rename = "TOGGLE_MAPVIEW")]
    ToggleMapView {
        layer: String,
    },
    ToggleFetchingDomain,
    ToggleFetchingSources,
    #[serde(rename = "TOGGLE_INFOPOPUP")]
    ToggleInfoPopup,
    ToggleNotifications,
    MarkNotificationsRead,

    // Data
    UpdateDomain {
        domain: AggregatedDomain,
    },
    UpdateSources {
        sources: Vec<Source>,
    },

    // Errors
    FetchError {
        message: String,
    },
    FetchSourceError {
        msg: String,
    },

    /// Any action name this data layer does not handle.
    #[serde(other)]
    Unrecognized,
}
