//! # kbdesk-client
//!
//! HTTP implementation of [`kbdesk_core::DocumentApi`] for the kbdesk
//! document store.
//!
//! ## Example
//!
//! ```rust,ignore
//! use kbdesk_client::{ClientConfig, HttpDocumentApi};
//! use kbdesk_core::DocumentApi;
//!
//! let api = HttpDocumentApi::new(ClientConfig::from_env())?;
//! let page = api.list(None).await?;
//! println!("{} documents", page.documents.len());
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod types;

pub use config::ClientConfig;
pub use http::HttpDocumentApi;
