//! # kbdesk-ops
//!
//! Batch operations over the kbdesk document collection.
//!
//! This crate provides:
//! - A confirmation gate in front of uploads and deletes
//! - Strictly sequential batch uploads with per-file failure collection
//! - Simulated or store-reported upload progress
//! - Optimistic deletes with full rollback
//! - Notices and events for the UI via a broadcast channel
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use kbdesk_client::HttpDocumentApi;
//! use kbdesk_core::{DeleteTarget, SourceFile};
//! use kbdesk_ops::{Desk, DeskConfig};
//!
//! let api = Arc::new(HttpDocumentApi::from_env()?);
//! let desk = Desk::new(api, DeskConfig::default())?;
//! desk.load().await?;
//!
//! // Listen for progress
//! let mut events = desk.events().subscribe();
//!
//! // Stage, then confirm
//! let batch = desk.stage_upload(vec![SourceFile::from_path("report.pdf").await?]).await?;
//! println!("{} file(s) to upload", batch.len());
//! desk.confirm().await?;
//! ```

pub mod config;
pub mod delete;
pub mod desk;
pub mod gate;
pub mod local;
pub mod notices;
pub mod simulator;
pub mod state;
pub mod strategy;
pub mod upload;

// Re-export core types
pub use kbdesk_core::*;

pub use config::DeskConfig;
pub use delete::{DeleteManager, DeleteReport};
pub use desk::{Confirmed, Desk, DeskBuilder, PageSnapshot};
pub use gate::{ConfirmationGate, Intent, PendingBatch, PendingDelete};
pub use local::{LocalDocumentStore, StoreOp};
pub use notices::{Notice, NoticeKind, Notices};
pub use simulator::{FixedIncrements, IncrementSource, ProgressSimulator, RandomIncrements};
pub use state::{ActiveBatch, DeskState, SharedState};
pub use strategy::{ProgressStrategy, ReportedProgress, SimulatedProgress};
pub use upload::{BatchReport, UploadOrchestrator, UPLOAD_SUCCESS_MESSAGE};
