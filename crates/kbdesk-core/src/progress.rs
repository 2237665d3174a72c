//! Progress reporting for the item currently being uploaded.
//!
//! A [`ProgressSink`] is handed to [`DocumentApi::upload`](crate::DocumentApi::upload)
//! and to whatever drives simulated progress. It enforces the display rules
//! in one place: the value never decreases, stays below 100 while the call is
//! pending, and is set to exactly 100 only by [`ProgressSink::complete`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Highest value reported before the upload resolves.
pub const MAX_UNRESOLVED: f64 = 99.0;

/// Progress callback type, invoked with every accepted value.
pub type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// Monotonic progress value shared between the uploader and its observers.
#[derive(Clone)]
pub struct ProgressSink {
    inner: Arc<SinkInner>,
}

struct SinkInner {
    bits: AtomicU64,
    completed: AtomicBool,
    callback: Option<ProgressCallback>,
}

impl std::fmt::Debug for ProgressSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressSink")
            .field("value", &self.value())
            .field("completed", &self.is_completed())
            .finish()
    }
}

impl ProgressSink {
    /// Sink that notifies `callback` on every change.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        Self::build(Some(Arc::new(callback)))
    }

    /// Sink with no observer.
    pub fn detached() -> Self {
        Self::build(None)
    }

    fn build(callback: Option<ProgressCallback>) -> Self {
        Self {
            inner: Arc::new(SinkInner {
                bits: AtomicU64::new(0f64.to_bits()),
                completed: AtomicBool::new(false),
                callback,
            }),
        }
    }

    /// Current value.
    pub fn value(&self) -> f64 {
        f64::from_bits(self.inner.bits.load(Ordering::Acquire))
    }

    pub fn is_completed(&self) -> bool {
        self.inner.completed.load(Ordering::Acquire)
    }

    /// Report an absolute value from a real progress signal.
    ///
    /// Values below the current one are ignored and values at or above 100
    /// are held at [`MAX_UNRESOLVED`] until [`complete`](Self::complete).
    pub fn report(&self, value: f64) {
        if value.is_nan() {
            return;
        }
        self.raise_to(value.min(MAX_UNRESOLVED));
    }

    /// Add `delta` without passing `ceiling` (itself capped at [`MAX_UNRESOLVED`]).
    pub fn advance(&self, delta: f64, ceiling: f64) {
        if delta.is_nan() || delta <= 0.0 {
            return;
        }
        let target = (self.value() + delta).min(ceiling.min(MAX_UNRESOLVED));
        self.raise_to(target);
    }

    /// Snap to exactly 100. Idempotent.
    pub fn complete(&self) {
        if self.inner.completed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.bits.store(100f64.to_bits(), Ordering::Release);
        self.notify(100.0);
    }

    fn raise_to(&self, target: f64) {
        if self.is_completed() {
            return;
        }
        let updated = self
            .inner
            .bits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                (target > f64::from_bits(bits)).then(|| target.to_bits())
            });
        if updated.is_ok() {
            self.notify(target);
        }
    }

    fn notify(&self, value: f64) {
        if let Some(ref callback) = self.inner.callback {
            callback(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recording() -> (ProgressSink, Arc<Mutex<Vec<f64>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = seen.clone();
        let sink = ProgressSink::new(move |v| sink_seen.lock().unwrap().push(v));
        (sink, seen)
    }

    #[test]
    fn test_report_is_monotonic() {
        let (sink, seen) = recording();
        sink.report(30.0);
        sink.report(10.0);
        sink.report(45.0);
        assert_eq!(sink.value(), 45.0);
        assert_eq!(*seen.lock().unwrap(), vec![30.0, 45.0]);
    }

    #[test]
    fn test_report_holds_below_hundred() {
        let sink = ProgressSink::detached();
        sink.report(100.0);
        assert_eq!(sink.value(), MAX_UNRESOLVED);
        assert!(!sink.is_completed());
        sink.report(250.0);
        assert_eq!(sink.value(), MAX_UNRESOLVED);
    }

    #[test]
    fn test_advance_respects_ceiling() {
        let sink = ProgressSink::detached();
        sink.advance(50.0, 90.0);
        sink.advance(50.0, 90.0);
        assert_eq!(sink.value(), 90.0);
        sink.advance(-5.0, 90.0);
        assert_eq!(sink.value(), 90.0);
    }

    #[test]
    fn test_complete_snaps_to_hundred_once() {
        let (sink, seen) = recording();
        sink.advance(20.0, 90.0);
        sink.complete();
        sink.complete();
        sink.report(50.0);
        assert_eq!(sink.value(), 100.0);
        assert!(sink.is_completed());
        assert_eq!(*seen.lock().unwrap(), vec![20.0, 100.0]);
    }

    #[test]
    fn test_nan_is_ignored() {
        let sink = ProgressSink::detached();
        sink.report(f64::NAN);
        sink.advance(f64::NAN, 90.0);
        assert_eq!(sink.value(), 0.0);
    }

    #[test]
    fn test_clones_share_state() {
        let sink = ProgressSink::detached();
        let other = sink.clone();
        other.report(12.5);
        assert_eq!(sink.value(), 12.5);
    }
}
