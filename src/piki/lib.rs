//! # Piki Architecture
//!
//! Piki is a **hierarchical, versioned wiki store** with full-text search. Pages are
//! addressed by slash-separated paths (`docs/setup/linux`), every change keeps the
//! previous state as a numbered history version, and every live page is searchable.
//! The `piki` binary is one client of the library, not the other way round.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (main.rs, args.rs)                                     │
//! │  - Parses arguments, prints results, sets exit codes        │
//! │  - Installs the tracing subscriber                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API (api.rs) and Commands (commands/*.rs)                  │
//! │  - One function per user-facing operation                   │
//! │  - Return CmdResult: data plus leveled messages             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Document Facade (facade.rs)                                │
//! │  - Read resolution, write protocol, per-page locking        │
//! │  - Keeps files, history and the search index in step        │
//! └─────────────────────────────────────────────────────────────┘
//!                 │                               │
//!                 ▼                               ▼
//! ┌───────────────────────────────┐ ┌───────────────────────────┐
//! │  Storage (store/)             │ │  Search (search/)         │
//! │  - PageStore, MetadataStore   │ │  - tantivy index          │
//! │  - HistoryManager, locks      │ │  - query language, dates  │
//! └───────────────────────────────┘ └───────────────────────────┘
//! ```
//!
//! ## On Disk
//!
//! Each page is a directory below the pages root, named by [`codec::encode`]:
//!
//! ```text
//! pages/
//!   docs::setup/
//!     page              live content
//!     meta.json         live metadata
//!     history/
//!       00001_page      oldest version
//!       00001_meta.json
//! ```
//!
//! A page is *available* when its live `page` file exists. Deleting a page removes
//! the live files and keeps `history/`.
//!
//! ## No I/O Assumptions Below the CLI
//!
//! From `api.rs` inward, code returns Rust values and never writes to stdout or
//! stderr. Logging goes through `tracing`; the binary decides where it ends up.
//!
//! ## Module Overview
//!
//! - [`api`]: Entry point for all operations
//! - [`commands`]: One module per operation
//! - [`facade`]: [`facade::DocumentFacade`], the consistency boundary
//! - [`store`]: Page content, metadata sidecars, history and locks
//! - [`search`]: The search index and its query language
//! - [`codec`]: Logical path to storage key mapping
//! - [`model`]: Core data types (`MetadataRecord`, `DocumentView`, `Revision`)
//! - [`tree`]: Prefix listings and tree rendering
//! - [`config`]: Configuration management
//! - [`init`]: Wires config, facade and API together for a data directory
//! - [`error`]: Error types

pub mod api;
pub mod codec;
pub mod commands;
pub mod config;
pub mod error;
pub mod facade;
pub mod init;
pub mod model;
pub mod search;
pub mod store;
pub mod tree;
