use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde_json::Value;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinError;
use tracing::{debug, error, info, warn};

use timemap_config::DataLayerConfig;
use timemap_core::{AggregatedDomain, Domain, Notification, Source};
use timemap_infra::{DomainFetcher, FetchError};

use crate::app_core::Intent;

pub const NO_SOURCE_ENDPOINT: &str = "No source extension specified.";
pub const SOURCES_UNAVAILABLE: &str =
    "No sources are available at the URL specified in the config.";

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("{domain} fetch task did not complete: {source}")]
    Task {
        domain: Domain,
        #[source]
        source: JoinError,
    },
    #[error("no endpoint configured for {0}")]
    NotConfigured(Domain),
    #[error("{domain} could not be loaded: {message}")]
    Unavailable { domain: Domain, message: String },
}

/// Why a single domain fell back to an empty sequence.
#[derive(Debug, thiserror::Error)]
enum DomainFailure {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("unexpected payload shape: {0}")]
    Shape(#[from] serde_json::Error),
    #[error("fetch task did not complete: {0}")]
    Task(JoinError),
}

/// Fetches every domain dataset and folds the outcomes into one
/// [`AggregatedDomain`]. Progress is announced as intents on `tx`.
pub struct DomainOrchestrator {
    config: DataLayerConfig,
    fetcher: Arc<dyn DomainFetcher>,
    tx: mpsc::Sender<Intent>,
}

impl DomainOrchestrator {
    pub fn new(
        config: DataLayerConfig,
        fetcher: Arc<dyn DomainFetcher>,
        tx: mpsc::Sender<Intent>,
    ) -> Self {
        Self {
            config,
            fetcher,
            tx,
        }
    }

    /// Never waits on the channel. A host that stops draining it loses
    /// intents rather than stalling the fetch.
    fn announce(&self, intent: Intent) {
        match self.tx.try_send(intent) {
            Ok(()) => {}
            Err(TrySendError::Full(intent)) => warn!("intent channel full, dropping {intent:?}"),
            Err(TrySendError::Closed(_)) => debug!("intent channel closed"),
        }
    }

    /// Runs one aggregation. Per-domain failures become notifications on the
    /// result; only a failure of the task group itself is returned as `Err`,
    /// after a `FetchError` intent has been announced. The fetching flag is
    /// toggled back in both cases.
    pub async fn fetch_domain(&self) -> Result<AggregatedDomain, OrchestratorError> {
        self.announce(Intent::ToggleFetchingDomain);

        let result = self.aggregate().await;
        if let Ok(domain) = &result {
            info!(
                events = domain.events.len(),
                categories = domain.categories.len(),
                narratives = domain.narratives.len(),
                sites = domain.sites.len(),
                tags = domain.tags.len(),
                sources = domain.sources.len(),
                failed = domain.notifications.len(),
                "domain fetch finished"
            );
        }

        if let Err(e) = &result {
            let message = e.to_string();
            error!("domain fetch aborted: {message}");
            self.announce(Intent::FetchError { message });
        }

        self.announce(Intent::ToggleFetchingDomain);
        result
    }

    async fn aggregate(&self) -> Result<AggregatedDomain, OrchestratorError> {
        let timeout = self.config.fetch_timeout();

        let (domains, tasks): (Vec<Domain>, Vec<_>) = Domain::ALL
            .into_iter()
            .filter(|d| self.config.features.allows(*d))
            .filter_map(|d| self.config.endpoint(d).map(|url| (d, url)))
            .map(|(domain, url)| {
                debug!("fetching {domain} from {url}");
                let fetcher = self.fetcher.clone();
                (
                    domain,
                    tokio::spawn(async move { fetch_with_timeout(fetcher, url, timeout).await }),
                )
            })
            .unzip();

        let settled = join_all(tasks).await;

        let mut out = AggregatedDomain::default();
        for (domain, joined) in domains.into_iter().zip(settled) {
            let outcome = joined.map_err(|source| OrchestratorError::Task { domain, source })?;
            let filled = outcome
                .map_err(DomainFailure::from)
                .and_then(|value| fill(&mut out, domain, value));
            if let Err(e) = filled {
                warn!("{domain} unavailable: {e}");
                out.notifications.push(Notification::fetch_failed(domain));
            }
        }
        Ok(out)
    }

    /// Loads only the sources endpoint, reporting through the sources flag
    /// and `errors.source` instead of the domain-wide notifications.
    pub async fn fetch_sources(&self) -> Result<Vec<Source>, OrchestratorError> {
        let Some(url) = self.config.endpoint(Domain::Sources) else {
            self.announce(Intent::FetchSourceError {
                msg: NO_SOURCE_ENDPOINT.to_string(),
            });
            return Err(OrchestratorError::NotConfigured(Domain::Sources));
        };

        self.announce(Intent::ToggleFetchingSources);

        let task = tokio::spawn(fetch_with_timeout(
            self.fetcher.clone(),
            url,
            self.config.fetch_timeout(),
        ));
        let outcome = match task.await {
            Ok(fetched) => fetched
                .map_err(DomainFailure::from)
                .and_then(|value| serde_json::from_value::<Vec<Source>>(value).map_err(Into::into)),
            Err(source) => Err(DomainFailure::Task(source)),
        };

        let result = match outcome {
            Ok(sources) => {
                debug!(count = sources.len(), "sources loaded");
                self.announce(Intent::UpdateSources {
                    sources: sources.clone(),
                });
                Ok(sources)
            }
            Err(e) => {
                warn!("sources unavailable: {e}");
                self.announce(Intent::FetchSourceError {
                    msg: SOURCES_UNAVAILABLE.to_string(),
                });
                Err(OrchestratorError::Unavailable {
                    domain: Domain::Sources,
                    message: e.to_string(),
                })
            }
        };

        self.announce(Intent::ToggleFetchingSources);
        result
    }
}

async fn fetch_with_timeout(
    fetcher: Arc<dyn DomainFetcher>,
    url: String,
    timeout: Duration,
) -> Result<Value, FetchError> {
    let res = tokio::time::timeout(timeout, fetcher.fetch_json(&url)).await;
    match res {
        Ok(inner) => inner,
        Err(_) => Err(FetchError::Timeout {
            url,
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}

/// Decodes `value` into the field for `domain`. The field is only written
/// when the whole payload decodes.
fn fill(out: &mut AggregatedDomain, domain: Domain, value: Value) -> Result<(), DomainFailure> {
    match domain {
        Domain::Events => out.events = serde_json::from_value(value)?,
        Domain::Categories => out.categories = serde_json::from_value(value)?,
        Domain::Narratives => out.narratives = serde_json::from_value(value)?,
        Domain::Sites => out.sites = serde_json::from_value(value)?,
        // Tag hierarchies are served either as a list of roots or as one root.
        Domain::Tags => {
            out.tags = match value {
                Value::Array(roots) => roots,
                root @ Value::Object(_) => vec![root],
                other => serde_json::from_value(other)?,
            }
        }
        Domain::Sources => out.sources = serde_json::from_value(value)?,
    }
    Ok(())
}
