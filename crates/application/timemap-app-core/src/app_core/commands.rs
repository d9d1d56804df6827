use super::intents::Intent;

#[derive(Debug, Clone)]
pub enum AppCommand {
    // Data loading
    FetchDomain,
    FetchSources,

    // Direct state transitions
    Apply(Intent),
}
