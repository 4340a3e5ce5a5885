//! Infrastructure layer for conclave
//!
//! Adapters behind the application ports: the figment-based JSON config
//! loader, the filesystem session recorder and memory store, the system
//! clock and id generator, and the reference HTTP model client.

pub mod config;
pub mod providers;
pub mod runtime;
pub mod storage;

pub use config::{ConfigError, ConfigLoader};
pub use providers::http::HttpModelClient;
pub use runtime::{SequentialIdGenerator, SystemClock};
pub use storage::memory_store::FsMemoryStore;
pub use storage::session_store::FsSessionRecorder;
