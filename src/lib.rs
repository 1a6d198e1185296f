//! # newsline
//!
//! A command-line RSS reader with a per-day on-disk news cache.
//!
//! One invocation runs the pipeline to completion:
//!
//! ```text
//! fetch → parse → classify dates → reconcile with cache → persist → render
//! ```
//!
//! - [`feed`]: HTTP retrieval, RSS parsing, publication-date classification
//! - [`storage`]: date-partitioned JSON cache and the merge algorithm
//! - [`render`]: text / JSON / HTML output for the finalized item list
//! - [`app`]: wires the pieces together for one invocation
//!
//! Offline mode (`--date`, no source) replays cached partitions without
//! touching the network.

pub mod app;
pub mod config;
pub mod feed;
pub mod render;
pub mod storage;
pub mod util;
