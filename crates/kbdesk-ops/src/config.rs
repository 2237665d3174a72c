//! Desk behaviour configuration.

use std::time::Duration;

use kbdesk_core::defaults;
use kbdesk_core::{Error, ItemsPerPage, Result};

/// Timing, progress, paging, and upload-acceptance settings for a [`Desk`](crate::Desk).
#[derive(Debug, Clone, PartialEq)]
pub struct DeskConfig {
    /// Pause after a successful upload before the next file starts.
    pub settle_delay_ms: u64,
    /// How long success notices stay visible.
    pub notice_ttl_ms: u64,
    /// Interval between simulated progress ticks.
    pub progress_tick_ms: u64,
    /// Lower bound of one simulated increment.
    pub progress_step_min: f64,
    /// Upper bound of one simulated increment.
    pub progress_step_max: f64,
    /// Highest simulated value while the upload is still pending.
    pub progress_ceiling: f64,
    /// Upper bound on one upload call; exceeding it fails that file.
    pub upload_timeout_secs: u64,
    pub items_per_page: ItemsPerPage,
    /// Lowercase extensions accepted for upload.
    pub accepted_extensions: Vec<String>,
    pub max_upload_bytes: u64,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: defaults::UPLOAD_SETTLE_MS,
            notice_ttl_ms: defaults::NOTICE_TTL_MS,
            progress_tick_ms: defaults::PROGRESS_TICK_MS,
            progress_step_min: defaults::PROGRESS_STEP_MIN,
            progress_step_max: defaults::PROGRESS_STEP_MAX,
            progress_ceiling: defaults::PROGRESS_CEILING,
            upload_timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
            items_per_page: ItemsPerPage::default(),
            accepted_extensions: defaults::ACCEPTED_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            max_upload_bytes: defaults::MAX_UPLOAD_BYTES,
        }
    }
}

impl DeskConfig {
    /// Set the post-upload settle delay.
    pub fn with_settle_delay(mut self, ms: u64) -> Self {
        self.settle_delay_ms = ms;
        self
    }

    /// Set how long success notices stay visible.
    pub fn with_notice_ttl(mut self, ms: u64) -> Self {
        self.notice_ttl_ms = ms;
        self
    }

    /// Set the simulated progress tick interval.
    pub fn with_progress_tick(mut self, ms: u64) -> Self {
        self.progress_tick_ms = ms;
        self
    }

    /// Set the simulated increment range.
    pub fn with_progress_steps(mut self, min: f64, max: f64) -> Self {
        self.progress_step_min = min;
        self.progress_step_max = max;
        self
    }

    /// Set the simulated progress ceiling.
    pub fn with_progress_ceiling(mut self, ceiling: f64) -> Self {
        self.progress_ceiling = ceiling;
        self
    }

    /// Set the per-file upload timeout.
    pub fn with_upload_timeout(mut self, secs: u64) -> Self {
        self.upload_timeout_secs = secs;
        self
    }

    /// Set the initial page size.
    pub fn with_items_per_page(mut self, items_per_page: ItemsPerPage) -> Self {
        self.items_per_page = items_per_page;
        self
    }

    /// Replace the accepted extension list (case-insensitive).
    pub fn with_accepted_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accepted_extensions = extensions
            .into_iter()
            .map(|e| e.into().trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    /// Set the largest accepted upload.
    pub fn with_max_upload_bytes(mut self, bytes: u64) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn notice_ttl(&self) -> Duration {
        Duration::from_millis(self.notice_ttl_ms)
    }

    pub fn progress_tick(&self) -> Duration {
        Duration::from_millis(self.progress_tick_ms)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }

    /// Check the settings are usable.
    pub fn validate(&self) -> Result<()> {
        if self.settle_delay_ms == 0 {
            return Err(Error::Config("settle_delay_ms must be non-zero".into()));
        }
        if self.progress_tick_ms == 0 {
            return Err(Error::Config("progress_tick_ms must be non-zero".into()));
        }
        if self.upload_timeout_secs == 0 {
            return Err(Error::Config("upload_timeout_secs must be non-zero".into()));
        }
        if !(self.progress_step_min >= 0.0
            && self.progress_step_min <= self.progress_step_max
            && self.progress_step_max > 0.0)
        {
            return Err(Error::Config(format!(
                "invalid progress step range {}..={}",
                self.progress_step_min, self.progress_step_max
            )));
        }
        if !(self.progress_ceiling > 0.0 && self.progress_ceiling < 100.0) {
            return Err(Error::Config(format!(
                "progress_ceiling must be in (0, 100), got {}",
                self.progress_ceiling
            )));
        }
        if self.accepted_extensions.is_empty() {
            return Err(Error::Config("accepted_extensions must not be empty".into()));
        }
        Ok(())
    }
}
