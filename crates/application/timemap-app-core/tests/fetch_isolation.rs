mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{all_features, config, sample, Reply, ScriptedFetcher};
use timemap_app_core::{AppState, AppStore, DomainOrchestrator, Intent, OrchestratorError};
use timemap_config::FeatureFlags;
use timemap_core::{Domain, NotificationKind};
use tokio::sync::mpsc;

fn drain(rx: &mut mpsc::Receiver<Intent>) -> Vec<Intent> {
    let mut out = Vec::new();
    while let Ok(intent) = rx.try_recv() {
        out.push(intent);
    }
    out
}

#[tokio::test]
async fn healthy_domains_are_aggregated_in_field_order() {
    let fetcher = Arc::new(ScriptedFetcher::healthy());
    let (tx, mut rx) = mpsc::channel(32);
    let orchestrator = DomainOrchestrator::new(config(all_features()), fetcher.clone(), tx);

    let domain = orchestrator.fetch_domain().await.unwrap();

    assert_eq!(domain.events.len(), 2);
    assert_eq!(domain.categories.len(), 2);
    assert_eq!(domain.narratives[0].id, "n1");
    assert_eq!(domain.sites.len(), 1);
    assert_eq!(domain.tags.len(), 1, "single tag root is wrapped");
    assert_eq!(domain.sources.len(), 3);
    assert!(domain.notifications.is_empty());
    assert_eq!(fetcher.calls().len(), 6);

    assert_eq!(
        drain(&mut rx),
        vec![Intent::ToggleFetchingDomain, Intent::ToggleFetchingDomain]
    );
}

#[tokio::test]
async fn failing_domains_fall_back_to_empty_with_one_notification_each() {
    let fetcher = Arc::new(
        ScriptedFetcher::healthy()
            .reply(Domain::Categories, Reply::Status(500))
            .reply(Domain::Tags, Reply::Hang)
            .reply(Domain::Sites, Reply::Json(serde_json::json!("not a list"))),
    );
    let (tx, _rx) = mpsc::channel(32);
    let orchestrator = DomainOrchestrator::new(config(all_features()), fetcher, tx);

    let domain = orchestrator.fetch_domain().await.unwrap();

    assert!(domain.categories.is_empty());
    assert!(domain.tags.is_empty());
    assert!(domain.sites.is_empty());
    assert_eq!(domain.events.len(), 2);
    assert_eq!(domain.narratives.len(), 1);
    assert_eq!(domain.sources.len(), 3);

    assert_eq!(domain.notifications.len(), 3);
    for name in ["categories", "tags", "sites"] {
        assert!(
            domain
                .notifications
                .iter()
                .any(|n| n.kind == NotificationKind::Error && n.message.contains(name)),
            "missing notification for {name}"
        );
    }
}

#[tokio::test]
async fn every_required_domain_failing_still_resolves() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .reply(Domain::Events, Reply::Status(503))
            .reply(Domain::Categories, Reply::Status(500))
            .reply(Domain::Narratives, Reply::Hang),
    );
    let (tx, _rx) = mpsc::channel(32);
    let orchestrator = DomainOrchestrator::new(config(FeatureFlags::default()), fetcher, tx);

    let domain = orchestrator.fetch_domain().await.unwrap();
    assert_eq!(domain.notifications.len(), 3);
    assert!(Domain::ALL.iter().all(|d| domain.len_of(*d) == 0));
}

#[tokio::test]
async fn disabled_tags_are_never_requested() {
    let fetcher = Arc::new(ScriptedFetcher::healthy());
    let (tx, _rx) = mpsc::channel(32);
    let flags = FeatureFlags {
        use_tags: false,
        ..all_features()
    };
    let orchestrator = DomainOrchestrator::new(config(flags), fetcher.clone(), tx);

    let domain = orchestrator.fetch_domain().await.unwrap();

    assert_eq!(fetcher.calls_to(Domain::Tags), 0);
    assert!(domain.tags.is_empty());
    assert!(domain.notifications.is_empty());
}

#[tokio::test]
async fn enabled_tags_are_requested_exactly_once() {
    let fetcher = Arc::new(ScriptedFetcher::healthy());
    let (tx, _rx) = mpsc::channel(32);
    let flags = FeatureFlags {
        use_tags: true,
        ..FeatureFlags::default()
    };
    let orchestrator = DomainOrchestrator::new(config(flags), fetcher.clone(), tx);

    orchestrator.fetch_domain().await.unwrap();

    assert_eq!(fetcher.calls_to(Domain::Tags), 1);
    assert_eq!(fetcher.calls_to(Domain::Sites), 0);
    assert_eq!(fetcher.calls_to(Domain::Sources), 0);
}

#[tokio::test]
async fn unconfigured_domain_is_silently_empty() {
    let fetcher = Arc::new(ScriptedFetcher::healthy());
    let (tx, _rx) = mpsc::channel(32);
    let mut cfg = config(all_features());
    cfg.domain_paths.remove(&Domain::Narratives);
    cfg.domain_paths.insert(Domain::Sites, String::new());
    let orchestrator = DomainOrchestrator::new(cfg, fetcher.clone(), tx);

    let domain = orchestrator.fetch_domain().await.unwrap();

    assert!(domain.narratives.is_empty());
    assert!(domain.sites.is_empty());
    assert!(domain.notifications.is_empty());
    assert_eq!(fetcher.calls().len(), 4);
}

#[tokio::test]
async fn task_panic_reports_a_global_error_and_clears_the_flag() {
    let fetcher = Arc::new(ScriptedFetcher::healthy().reply(Domain::Events, Reply::Panic));
    let (tx, mut rx) = mpsc::channel(32);
    let orchestrator = DomainOrchestrator::new(config(all_features()), fetcher, tx);

    let err = orchestrator.fetch_domain().await.unwrap_err();
    assert!(matches!(
        err,
        OrchestratorError::Task {
            domain: Domain::Events,
            ..
        }
    ));

    let announced = drain(&mut rx);
    assert_eq!(announced.len(), 3);
    assert_eq!(announced[0], Intent::ToggleFetchingDomain);
    assert!(matches!(announced[1], Intent::FetchError { .. }));
    assert_eq!(announced[2], Intent::ToggleFetchingDomain);

    let store = AppStore::new(AppState::default());
    store.apply_all(announced);
    let state = store.state();
    assert!(!state.flags.is_fetching_domain);
    assert_eq!(state.notifications.len(), 1);
    assert!(state.error.is_some());
}

#[tokio::test]
async fn aggregated_result_flows_into_the_store() {
    let fetcher = Arc::new(ScriptedFetcher::healthy().reply(Domain::Sites, Reply::Status(500)));
    let (tx, mut rx) = mpsc::channel(32);
    let orchestrator = DomainOrchestrator::new(config(all_features()), fetcher, tx);

    let store = AppStore::new(AppState::default());
    let domain = orchestrator.fetch_domain().await.unwrap();
    store.apply_all(drain(&mut rx));
    store.apply(Intent::UpdateDomain { domain });

    let state = store.state();
    assert!(!state.flags.is_fetching_domain);
    assert!(state.flags.is_notification);
    assert_eq!(state.notifications.len(), 1);
    assert!(state.domain.notifications.is_empty());
    assert_eq!(
        serde_json::to_value(&state.domain.events).unwrap(),
        sample(Domain::Events)
    );
}

#[tokio::test]
async fn sources_without_endpoint_report_a_source_error() {
    let fetcher = Arc::new(ScriptedFetcher::healthy());
    let (tx, mut rx) = mpsc::channel(32);
    let mut cfg = config(all_features());
    cfg.domain_paths.remove(&Domain::Sources);
    let orchestrator = DomainOrchestrator::new(cfg, fetcher.clone(), tx);

    let err = orchestrator.fetch_sources().await.unwrap_err();
    assert!(matches!(err, OrchestratorError::NotConfigured(Domain::Sources)));
    assert!(fetcher.calls().is_empty());
    assert_eq!(
        drain(&mut rx),
        vec![Intent::FetchSourceError {
            msg: "No source extension specified.".into()
        }]
    );
}

#[tokio::test]
async fn sources_failure_sets_source_error_and_resets_flag() {
    let fetcher = Arc::new(ScriptedFetcher::healthy().reply(Domain::Sources, Reply::Status(404)));
    let (tx, mut rx) = mpsc::channel(32);
    let orchestrator = DomainOrchestrator::new(config(all_features()), fetcher, tx);

    assert!(orchestrator.fetch_sources().await.is_err());

    let store = AppStore::new(AppState {
        error: Some("earlier".into()),
        ..AppState::default()
    });
    store.apply_all(drain(&mut rx));
    let state = store.state();
    assert!(!state.flags.is_fetching_sources);
    assert!(state.errors.source.is_some());
    assert_eq!(state.error.as_deref(), Some("earlier"));
}

#[tokio::test]
async fn sources_success_updates_the_domain_slice() {
    let fetcher = Arc::new(ScriptedFetcher::healthy());
    let (tx, mut rx) = mpsc::channel(32);
    let orchestrator = DomainOrchestrator::new(config(all_features()), fetcher, tx);

    let sources = orchestrator.fetch_sources().await.unwrap();
    assert_eq!(sources.len(), 3);

    let store = AppStore::new(AppState::default());
    store.apply_all(drain(&mut rx));
    let state = store.state();
    assert_eq!(state.domain.sources.len(), 3);
    assert!(!state.flags.is_fetching_sources);
    assert_eq!(state.errors.source, None);
}

#[tokio::test]
async fn sources_task_panic_still_clears_the_flag() {
    let fetcher = Arc::new(ScriptedFetcher::healthy().reply(Domain::Sources, Reply::Panic));
    let (tx, mut rx) = mpsc::channel(32);
    let orchestrator = DomainOrchestrator::new(config(all_features()), fetcher, tx);

    let err = orchestrator.fetch_sources().await.unwrap_err();
    assert!(matches!(
        err,
        OrchestratorError::Unavailable {
            domain: Domain::Sources,
            ..
        }
    ));

    let announced = drain(&mut rx);
    assert_eq!(announced.first(), Some(&Intent::ToggleFetchingSources));
    assert_eq!(announced.last(), Some(&Intent::ToggleFetchingSources));

    let store = AppStore::new(AppState::default());
    store.apply_all(announced);
    let state = store.state();
    assert!(!state.flags.is_fetching_sources);
    assert!(state.errors.source.is_some());
}

#[tokio::test]
async fn undrained_channel_does_not_stall_the_fetch() {
    let fetcher = Arc::new(ScriptedFetcher::healthy());
    let (tx, mut rx) = mpsc::channel(1);
    let orchestrator = DomainOrchestrator::new(config(all_features()), fetcher, tx);

    let domain = tokio::time::timeout(Duration::from_secs(5), orchestrator.fetch_domain())
        .await
        .expect("fetch_domain waited on a full channel")
        .unwrap();
    assert_eq!(domain.events.len(), 2);

    let sources = tokio::time::timeout(Duration::from_secs(5), orchestrator.fetch_sources())
        .await
        .expect("fetch_sources waited on a full channel")
        .unwrap();
    assert_eq!(sources.len(), 3);

    // Only the very first announcement fit.
    assert_eq!(drain(&mut rx), vec![Intent::ToggleFetchingDomain]);
}
