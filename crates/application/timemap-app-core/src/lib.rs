pub mod app_core;
mod async_runtime;
pub mod domain;
pub mod kernel;
pub mod orchestrator;

pub use app_core::*;
pub use domain::{AppState, Errors, FilterState, Flags, Language};
pub use kernel::AppKernel;
pub use orchestrator::{DomainOrchestrator, OrchestratorError};
