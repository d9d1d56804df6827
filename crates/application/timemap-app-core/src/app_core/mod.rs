pub mod commands;
pub mod intents;
pub mod reducer;
pub mod store;

pub use commands::AppCommand;
pub use intents::Intent;
pub use reducer::reduce;
pub use store::AppStore;
