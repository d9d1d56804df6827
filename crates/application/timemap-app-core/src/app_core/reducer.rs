use timemap_core::{narrative_range, Narrative, Notification, TagFilters, TagTree, TimeRange};

use crate::domain::AppState;

use super::intents::Intent;

pub fn reduce(mut state: AppState, intent: Intent) -> AppState {
    match intent {
        Intent::UpdateHighlighted { highlighted } => state.highlighted = highlighted,
        Intent::UpdateSelected { selected } => state.selected = selected,

        Intent::UpdateTagFilters { tag } => {
            let target = tag.active;
            let mut tree = TagTree::from_node(&tag);
            tree.cascade(&tag.key, target, &mut state.filters.tags);
        }

        Intent::UpdateTimeRange { timerange } => state.filters.timerange = timerange,

        Intent::UpdateNarrative { narrative: None } => state.narrative = None,
        Intent::UpdateNarrative {
            narrative: Some(narrative),
        } => apply_narrative(&mut state, narrative),

        Intent::ResetAllFilters => {
            state.filters.tags = TagFilters::new();
            state.filters.categories.clear();
            state.filters.timerange = TimeRange::default_window();
            state.selected.clear();
        }

        Intent::ToggleLanguage { language } => {
            state.language = language.unwrap_or_else(|| state.language.other());
        }

        Intent::ToggleMapView { layer } => {
            let shown = state.filters.views.entry(layer).or_insert(false);
            *shown = !*shown;
        }

        Intent::ToggleFetchingDomain => {
            state.flags.is_fetching_domain = !state.flags.is_fetching_domain;
        }
        Intent::ToggleFetchingSources => {
            state.flags.is_fetching_sources = !state.flags.is_fetching_sources;
        }
        Intent::ToggleInfoPopup => state.flags.is_infopopup = !state.flags.is_infopopup,
        Intent::ToggleNotifications => {
            state.flags.is_notification = !state.flags.is_notification;
        }
        Intent::MarkNotificationsRead => state.notifications.clear(),

        Intent::UpdateDomain { mut domain } => {
            state
                .notifications
                .extend(std::mem::take(&mut domain.notifications));
            if !state.notifications.is_empty() {
                state.flags.is_notification = true;
            }
            state.domain = domain;
        }
        Intent::UpdateSources { sources } => state.domain.sources = sources,

        // Replaces rather than appends; see DESIGN.md.
        Intent::FetchError { message } => {
            state.notifications = vec![Notification::error(message.clone())];
            state.error = Some(message);
        }
        Intent::FetchSourceError { msg } => state.errors.source = Some(msg),

        Intent::Unrecognized => {}
    }
    state
}

/// Focuses a narrative and narrows the time range to its steps. A narrative
/// whose window cannot be derived is rejected and leaves focus unchanged.
fn apply_narrative(state: &mut AppState, narrative: Narrative) {
    match narrative_range(&narrative.steps) {
        Ok(range) => {
            state.filters.timerange = range;
            state.narrative = Some(narrative);
        }
        Err(e) => {
            let message = e.to_string();
            state
                .notifications
                .push(Notification::domain_error("narrative", &narrative.id, &message));
            state.error = Some(format!("narrative {}: {message}", narrative.id));
        }
    }
}
