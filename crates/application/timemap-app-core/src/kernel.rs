use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use timemap_config::DataLayerConfig;
use timemap_infra::DomainFetcher;

use crate::app_core::{AppCommand, AppStore, Intent};
use crate::orchestrator::DomainOrchestrator;

/// Turns commands into background fetches and intents. Workers report back
/// over a channel that [`AppKernel::tick`] drains into the store.
pub struct AppKernel {
    pub store: AppStore,
    orchestrator: Arc<DomainOrchestrator>,
    domain_in_flight: Arc<AtomicBool>,

    tx: mpsc::Sender<Intent>,
    rx: mpsc::Receiver<Intent>,
}

impl AppKernel {
    pub fn new(store: AppStore, config: DataLayerConfig, fetcher: Arc<dyn DomainFetcher>) -> Self {
        let (tx, rx) = mpsc::channel(100);
        let orchestrator = Arc::new(DomainOrchestrator::new(config, fetcher, tx.clone()));
        Self {
            store,
            orchestrator,
            domain_in_flight: Arc::new(AtomicBool::new(false)),
            tx,
            rx,
        }
    }

    pub fn dispatch(&mut self, cmd: AppCommand) {
        match cmd {
            AppCommand::FetchDomain => {
                if self.domain_in_flight.swap(true, Ordering::SeqCst) {
                    debug!("domain fetch already running, ignoring request");
                    return;
                }
                let orchestrator = self.orchestrator.clone();
                let tx = self.tx.clone();
                let in_flight = self.domain_in_flight.clone();
                self.spawn_worker("timemap-fetch-domain", async move {
                    if let Ok(domain) = orchestrator.fetch_domain().await {
                        if tx.try_send(Intent::UpdateDomain { domain }).is_err() {
                            warn!("intent channel unavailable, aggregated domain dropped");
                        }
                    }
                    in_flight.store(false, Ordering::SeqCst);
                });
            }

            AppCommand::FetchSources => {
                let orchestrator = self.orchestrator.clone();
                self.spawn_worker("timemap-fetch-sources", async move {
                    // Outcome is reported through intents.
                    let _ = orchestrator.fetch_sources().await;
                });
            }

            AppCommand::Apply(intent) => self.store.apply(intent),
        }
    }

    fn spawn_worker<F>(&self, name: &str, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let tx = self.tx.clone();
        let in_flight = self.domain_in_flight.clone();
        let spawn_res = std::thread::Builder::new()
            .name(name.into())
            .spawn(move || match crate::async_runtime::fetch_runtime() {
                Ok(rt) => rt.block_on(job),
                Err(e) => {
                    in_flight.store(false, Ordering::SeqCst);
                    let _ = tx.try_send(Intent::FetchError {
                        message: e.to_string(),
                    });
                }
            });

        if let Err(e) = spawn_res {
            self.domain_in_flight.store(false, Ordering::SeqCst);
            self.store.apply(Intent::FetchError {
                message: format!("Failed to start {name} worker thread: {e}"),
            });
        }
    }

    /// Applies every intent reported by workers since the last tick.
    pub fn tick(&mut self) {
        while let Ok(intent) = self.rx.try_recv() {
            self.store.apply(intent);
        }
    }

    pub fn sender(&self) -> mpsc::Sender<Intent> {
        self.tx.clone()
    }
}
