pub mod net;

// Re-exports for convenience
pub use net::{DomainFetcher, FetchError, HttpFetcher};
