#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use timemap_config::{DataLayerConfig, FeatureFlags};
use timemap_core::Domain;
use timemap_infra::{DomainFetcher, FetchError};

pub const ROOT: &str = "http://data.test";

#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Status(u16),
    Hang,
    Panic,
}

/// Fetcher answering from a fixed script and recording every URL it was asked for.
#[derive(Default)]
pub struct ScriptedFetcher {
    replies: HashMap<String, Reply>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, domain: Domain, reply: Reply) -> Self {
        self.replies.insert(url(domain), reply);
        self
    }

    /// Every domain answers with a small valid payload.
    pub fn healthy() -> Self {
        Domain::ALL
            .into_iter()
            .fold(Self::new(), |f, d| f.reply(d, Reply::Json(sample(d))))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, domain: Domain) -> usize {
        let target = url(domain);
        self.calls().iter().filter(|u| **u == target).count()
    }
}

#[async_trait]
impl DomainFetcher for ScriptedFetcher {
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.replies.get(url).cloned() {
            Some(Reply::Json(v)) => Ok(v),
            Some(Reply::Status(status)) => Err(FetchError::Status {
                url: url.to_string(),
                status,
            }),
            Some(Reply::Hang) => std::future::pending().await,
            Some(Reply::Panic) => panic!("scripted fetcher panic for {url}"),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

pub fn url(domain: Domain) -> String {
    format!("{ROOT}/{domain}")
}

pub fn sample(domain: Domain) -> Value {
    match domain {
        Domain::Events => json!([
            { "id": "e1", "timestamp": "2014-09-26T22:30:00" },
            { "id": "e2", "timestamp": "2014-09-27T01:00:00" }
        ]),
        Domain::Categories => json!([{ "category": "Police" }, { "category": "Military" }]),
        Domain::Narratives => json!([{
            "id": "n1",
            "label": "Route of bus 1568",
            "steps": [
                { "id": "e1", "timestamp": "2014-09-26T22:30:00" },
                { "id": "e2", "timestamp": "2014-09-27T01:00:00" }
            ]
        }]),
        Domain::Sites => json!([{ "site": "Palacio de Justicia" }]),
        Domain::Tags => json!({ "key": "root", "children": {} }),
        Domain::Sources => json!([{ "id": "s1" }, { "id": "s2" }, { "id": "s3" }]),
    }
}

pub fn config(features: FeatureFlags) -> DataLayerConfig {
    let cfg = DataLayerConfig {
        server_root: ROOT.to_string(),
        features,
        fetch_timeout_ms: 200,
        ..DataLayerConfig::default()
    };
    Domain::ALL
        .into_iter()
        .fold(cfg, |c, d| c.with_path(d, format!("/{d}")))
}

pub fn all_features() -> FeatureFlags {
    FeatureFlags {
        use_sites: true,
        use_tags: true,
        use_sources: true,
    }
}
