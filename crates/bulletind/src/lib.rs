//! Bulletin Daemon - Service registry, liveness prober and HTTP front end
//!
//! This crate provides the core infrastructure for the bulletin daemon:
//! - `registry` - Registry actor owning every service entry
//! - `store` - JSON file the registry writes through to on every change
//! - `prober` - Periodic HTTP liveness checks feeding statuses back
//! - `server` - HTTP server for add/delete requests and the listing page
//! - `config` - Paths, port and probe pacing
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      bulletind daemon                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  ┌─────────────────┐     ┌─────────────────────────────┐    │
//! │  │   HttpServer    │────▶│       RegistryActor         │    │
//! │  │   (tiny_http)   │     │  (service state owner)      │    │
//! │  └────────┬────────┘     └──────────────┬──────────────┘    │
//! │           │                     ▲       │                   │
//! │           │ requests            │       │ write-through     │
//! │           ▼                     │       ▼                   │
//! │  ┌─────────────────┐  ┌─────────┴───┐  ┌───────────────┐    │
//! │  │ RequestHandler  │  │StatusProber │  │ services.json │    │
//! │  │  (per request)  │  │ (every 5 s) │  └───────────────┘    │
//! │  └─────────────────┘  └─────────────┘                       │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! All production code in this crate follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations return `Result` or `Option`
//! - Channel operations handle closure gracefully

pub mod config;
pub mod prober;
pub mod registry;
pub mod server;
pub mod store;
