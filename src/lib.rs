//! Memory graph engine: notes, symmetric relations, live search and an
//! interactive force-directed layout.
//!
//! Notes belong to one owner and are linked by undirected relations. The
//! store keeps each relation as two directed rows; the in-memory
//! [`graph::GraphModel`] folds them into one logical edge and never exposes a
//! one-sided relation.
//!
//! # Architecture
//!
//! Data flows leaf to root: [`repository`] → [`graph`] → {[`search`],
//! [`layout`]} → [`viewport`] → selection highlighting. [`session`] ties
//! these together behind the calls a UI makes, and [`engine`] runs store
//! calls and the tick loop on tokio without letting either interleave with a
//! half-applied mutation.
//!
//! # Modules
//!
//! - [`config`]: configuration loading from TOML files and environment variables
//! - [`db`]: SQLite database initialization, schema, migrations, and health checks
//! - [`note`]: notes, categories, relation records, drafts and chat transcripts
//! - [`repository`]: the data-access contract and its SQLite implementation
//! - [`graph`]: the graph model and neighborhood highlighting
//! - [`search`]: case-insensitive substring filtering over title, content and category
//! - [`layout`]: the force simulation
//! - [`viewport`]: zoom/pan transform, fit-to-view and gestures
//! - [`session`]: the single-threaded facade a UI drives
//! - [`engine`]: async reloads, store writes and the tick loop

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod graph;
pub mod layout;
pub mod note;
pub mod repository;
pub mod search;
pub mod session;
pub mod viewport;
