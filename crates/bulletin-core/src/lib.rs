//! Bulletin Core - Shared types for the service bulletin
//!
//! This crate provides the domain types shared between the registry,
//! its persistent store, the status prober and the HTTP front end.
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

pub mod error;
pub mod service;

// Re-exports for convenience
pub use error::{DomainError, DomainResult};
pub use service::{ServiceEntry, ServiceName, ServiceRecord, ServiceStatus};
