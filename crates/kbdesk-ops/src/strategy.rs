//! How an upload's progress indicator is driven while the call is pending.

use async_trait::async_trait;
use futures::future::BoxFuture;

use kbdesk_core::{Document, ProgressSink, Result};

use crate::simulator::ProgressSimulator;

/// Drives `sink` while `upload` is pending and returns its outcome.
///
/// Implementations never complete the sink; the orchestrator does that once
/// the upload has succeeded.
#[async_trait]
pub trait ProgressStrategy: Send + Sync {
    async fn drive(
        &self,
        sink: &ProgressSink,
        upload: BoxFuture<'_, Result<Document>>,
    ) -> Result<Document>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Random ticks toward a ceiling for stores that report no progress.
pub struct SimulatedProgress {
    simulator: ProgressSimulator,
}

impl SimulatedProgress {
    pub fn new(simulator: ProgressSimulator) -> Self {
        Self { simulator }
    }
}

#[async_trait]
impl ProgressStrategy for SimulatedProgress {
    async fn drive(
        &self,
        sink: &ProgressSink,
        upload: BoxFuture<'_, Result<Document>>,
    ) -> Result<Document> {
        self.simulator.track(sink, upload).await
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

/// Relies on the store reporting progress through the sink itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReportedProgress;

#[async_trait]
impl ProgressStrategy for ReportedProgress {
    async fn drive(
        &self,
        _sink: &ProgressSink,
        upload: BoxFuture<'_, Result<Document>>,
    ) -> Result<Document> {
        upload.await
    }

    fn name(&self) -> &'static str {
        "reported"
    }
}
