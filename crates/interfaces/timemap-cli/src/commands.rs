use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use camino::Utf8PathBuf;
use timemap_app_core::{reduce, AppState, AppStore, DomainOrchestrator, Intent};
use timemap_config::DataLayerConfig;
use timemap_core::{narrative_range, AggregatedDomain, Domain, Narrative, Source, TimeRange};
use timemap_infra::HttpFetcher;
use tokio::sync::mpsc;

fn http_fetcher() -> Result<Arc<HttpFetcher>> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("timemap-cli/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;
    Ok(Arc::new(HttpFetcher::new(client)))
}

fn drain_into(store: &AppStore, rx: &mut mpsc::Receiver<Intent>) {
    while let Ok(intent) = rx.try_recv() {
        store.apply(intent);
    }
}

fn write_or_print(json: String, output: Option<Utf8PathBuf>) -> Result<()> {
    if let Some(out) = output {
        std::fs::write(&out, json).with_context(|| format!("Failed to write {out}"))?;
        println!(":: Saved to {}", out);
    } else {
        println!("{}", json);
    }
    Ok(())
}

pub fn cmd_endpoints(cfg: &DataLayerConfig) {
    println!(":: Endpoints (root: {})", cfg.server_root);
    for domain in Domain::ALL {
        let gate = if cfg.features.allows(domain) {
            "on "
        } else {
            "off"
        };
        match cfg.endpoint(domain) {
            Some(url) => println!("   [{gate}] {:<11} {}", domain.name(), url),
            None => println!("   [{gate}] {:<11} (not configured)", domain.name()),
        }
    }
    println!("   timeout: {} ms", cfg.fetch_timeout_ms);
}

/// Runs one aggregation and returns the state it leaves behind.
pub async fn fetch_domain_state(cfg: DataLayerConfig) -> Result<AppState> {
    let (tx, mut rx) = mpsc::channel(32);
    let orchestrator = DomainOrchestrator::new(cfg, http_fetcher()?, tx);
    let store = AppStore::new(AppState::default());

    let result = orchestrator.fetch_domain().await;
    drain_into(&store, &mut rx);

    match result {
        Ok(domain) => {
            store.apply(Intent::UpdateDomain { domain });
            Ok(store.state())
        }
        Err(e) => Err(anyhow!(e).context("Domain fetch aborted")),
    }
}

pub async fn cmd_fetch(cfg: DataLayerConfig, output: Option<Utf8PathBuf>) -> Result<AggregatedDomain> {
    println!(":: Fetching domain from {}", cfg.server_root);
    let state = fetch_domain_state(cfg).await?;

    for domain in Domain::ALL {
        println!("   {:<11} {}", domain.name(), state.domain.len_of(domain));
    }
    for n in &state.notifications {
        eprintln!("!! {}", n.message);
    }

    let mut domain = state.domain;
    domain.notifications = state.notifications;
    write_or_print(serde_json::to_string_pretty(&domain)?, output)?;
    Ok(domain)
}

pub async fn cmd_sources(cfg: DataLayerConfig) -> Result<Vec<Source>> {
    let (tx, mut rx) = mpsc::channel(8);
    let orchestrator = DomainOrchestrator::new(cfg, http_fetcher()?, tx);
    let store = AppStore::new(AppState::default());

    let result = orchestrator.fetch_sources().await;
    drain_into(&store, &mut rx);

    if let Some(msg) = store.state().errors.source {
        bail!("{msg}");
    }
    let sources = result?;
    println!("{}", serde_json::to_string_pretty(&sources)?);
    Ok(sources)
}

pub fn cmd_narrative_range(file: Utf8PathBuf, id: Option<String>) -> Result<TimeRange> {
    let raw = std::fs::read_to_string(&file).with_context(|| format!("Failed to read {file}"))?;
    let narratives: Vec<Narrative> =
        serde_json::from_str(&raw).with_context(|| format!("{file} is not a narrative list"))?;

    let narrative = match &id {
        Some(id) => narratives.iter().find(|n| &n.id == id),
        None => narratives.first(),
    }
    .ok_or_else(|| anyhow!("Narrative '{}' not found", id.as_deref().unwrap_or("<first>")))?;

    let range = narrative_range(&narrative.steps)
        .with_context(|| format!("Cannot derive a window for narrative '{}'", narrative.id))?;
    println!("{}  {}", range.start, range.end);
    Ok(range)
}

/// Folds a JSON list of dashboard actions over the initial state.
pub fn cmd_replay(file: Utf8PathBuf, output: Option<Utf8PathBuf>) -> Result<AppState> {
    let raw = std::fs::read_to_string(&file).with_context(|| format!("Failed to read {file}"))?;
    let intents: Vec<Intent> =
        serde_json::from_str(&raw).with_context(|| format!("{file} is not an action list"))?;

    let state = intents.into_iter().fold(AppState::default(), reduce);
    write_or_print(serde_json::to_string_pretty(&state)?, output)?;
    Ok(state)
}
