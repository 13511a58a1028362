//! Shared types for the fieldscope engine.
//!
//! This crate holds the types that cross crate boundaries: the dynamic
//! [`Value`] used for record fields, the versioned [`Record`] itself, the
//! [`ApiError`] returned by the portal backend, and the notification types
//! the engine reports through.

pub mod error;
pub mod notify;
pub mod record;
pub mod value;

pub use error::ApiError;
pub use notify::{BroadcastSink, Notice, NoticeKind, NotificationSink, NullSink};
pub use record::Record;
pub use value::Value;
