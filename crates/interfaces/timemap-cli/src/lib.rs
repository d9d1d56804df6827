pub mod commands;

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::Args;
use timemap_config::{clamp_timeout_ms, DataLayerConfig};

/// Where the data layer configuration comes from. Values given on the
/// command line override the file or environment.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// JSON config file; the process environment is used when absent
    #[arg(long, env = "TIMEMAP_CONFIG", global = true)]
    pub config: Option<Utf8PathBuf>,
    #[arg(long, global = true)]
    pub server_root: Option<String>,
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,
    #[arg(long, global = true)]
    pub use_sites: bool,
    #[arg(long, global = true)]
    pub use_tags: bool,
    #[arg(long, global = true)]
    pub use_sources: bool,
}

impl ConfigArgs {
    pub fn load(&self) -> Result<DataLayerConfig> {
        let mut cfg = match &self.config {
            Some(path) => DataLayerConfig::from_json_file(path.as_std_path())
                .with_context(|| format!("Failed to load config from {path}"))?,
            None => DataLayerConfig::from_env().context("Invalid environment configuration")?,
        };
        self.apply_overrides(&mut cfg);
        Ok(cfg)
    }

    pub fn apply_overrides(&self, cfg: &mut DataLayerConfig) {
        if let Some(root) = &self.server_root {
            cfg.server_root = root.clone();
        }
        if let Some(ms) = self.timeout_ms {
            cfg.fetch_timeout_ms = clamp_timeout_ms(ms);
        }
        cfg.features.use_sites |= self.use_sites;
        cfg.features.use_tags |= self.use_tags;
        cfg.features.use_sources |= self.use_sources;
    }
}
