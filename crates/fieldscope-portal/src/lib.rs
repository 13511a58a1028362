//! Portal backend integration for fieldscope.
//!
//! This crate provides the portal-specific implementations:
//!
//! - `client` - PortalClient (HTTP client implementing `WriteApi`)
//! - `models` - API wire models
//! - `cache` - in-memory `RecordCache`
//! - `fake` - FakePortal in-memory backend for tests and offline mode

pub mod cache;
pub mod client;
pub mod fake;
pub mod models;

pub use cache::MemoryCache;
pub use client::PortalClient;
pub use fake::FakePortal;
pub use models::{ConflictBody, ExportResponse, ItemsPage, ScopeItemApi, UpdateItemRequest};
