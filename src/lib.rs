//! neotrack - block explorer tracking core
//!
//! Watches a chain node over JSON-RPC and keeps a paginated view of recent
//! blocks up to date for an embedded panel.
//!
//! ## Architecture
//!
//! - `source` / `source_rpc`: fallible height and block fetches
//! - `cache`: bounded FIFO cache of historical blocks (never the head)
//! - `window`: which block indices are visible
//! - `controller`: polling loop plus `pin` / `select` requests, emitting
//!   `ViewState` snapshots to a `sink::RenderSink`
//!
//! ## Usage
//!
//! ```bash
//! cargo run -- --rpc-url http://localhost:50012
//! ```

// Core modules
pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod messages;
pub mod sink;
pub mod source;
pub mod types;
pub mod window;

// JSON-RPC plumbing
pub mod net;
pub mod rpc_utils;
pub mod source_rpc;

// Re-export commonly used types
pub use cache::BlockCache;
pub use config::Config;
pub use controller::{
    ControllerState, CycleOutcome, TrackerController, TrackerHandle, TrackerOptions,
};
pub use error::RemoteError;
pub use sink::RenderSink;
pub use source::{BlockFetcher, ChainSource, HeightSource};
pub use types::{Block, TxLite, ViewState};
