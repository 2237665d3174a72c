//! # kbdesk-core
//!
//! Core types, traits, and view projections for the kbdesk document library
//! client.
//!
//! This crate provides the data model, the remote store boundary
//! ([`DocumentApi`]), progress and event plumbing, and the pure collection
//! view that the orchestration crate builds on.

pub mod collection;
pub mod defaults;
pub mod error;
pub mod events;
pub mod files;
pub mod models;
pub mod progress;
pub mod traits;
pub mod view;

// Re-export commonly used types at crate root
pub use collection::{DocumentCollection, SelectionSet};
pub use error::{Error, Result};
pub use events::{DeskEvent, EventBus, EventEnvelope, NoticeLevel};
pub use files::{file_type_from_name, format_bytes, size_label_mb, validate_upload};
pub use models::*;
pub use progress::{ProgressCallback, ProgressSink};
pub use traits::*;
pub use view::{page_numbers, project, ItemsPerPage, PageView, SelectAllState, ViewParams};
