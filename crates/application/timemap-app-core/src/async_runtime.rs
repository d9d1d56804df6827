use std::sync::OnceLock;

use anyhow::anyhow;
use tokio::runtime::{Builder, Runtime};

static FETCH_RUNTIME: OnceLock<Result<Runtime, String>> = OnceLock::new();

/// Shared runtime driving fetch workers, so the kernel can be used from
/// threads that have no tokio context of their own.
pub(crate) fn fetch_runtime() -> anyhow::Result<&'static Runtime> {
    let built = FETCH_RUNTIME.get_or_init(|| {
        Builder::new_multi_thread()
            .thread_name("timemap-fetch")
            .enable_all()
            .build()
            .map_err(|e| e.to_string())
    });
    built
        .as_ref()
        .map_err(|message| anyhow!("failed to start fetch runtime: {message}"))
}
