//! CLI command implementations.

mod ask;
mod chat;
mod clear;
mod config;
mod ingest;
mod init;
mod search;

pub use ask::run_ask;
pub use chat::run_chat;
pub use clear::run_clear;
pub use config::run_config;
pub use ingest::run_ingest;
pub use init::run_init;
pub use search::run_search;
