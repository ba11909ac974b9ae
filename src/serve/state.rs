//! Shared orchestrator state.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use arc_swap::ArcSwapOption;

use crate::pipeline::SharedResult;

/// State shared between the build loop, the WebSocket layer, and the HTTP
/// preview server.
#[derive(Debug, Default)]
pub struct DevState {
    /// True while a pipeline pass is in flight.
    building: AtomicBool,
    /// Monotonically increasing rebuild sequence number. Never decreases,
    /// never repeats.
    sequence: AtomicU64,
    /// Unix millis of the last finished build (success or failure).
    last_build_timestamp: AtomicU64,
    /// Last finished result (success or failure).
    last_result: ArcSwapOption<crate::pipeline::BuildResult>,
    /// Last successful result. Only replaced by a later success, so a
    /// failed build never tears down a working preview.
    last_success: ArcSwapOption<crate::pipeline::BuildResult>,
}

impl DevState {
    /// Claim the next rebuild sequence number.
    pub fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn set_building(&self, building: bool) {
        self.building.store(building, Ordering::SeqCst);
    }

    pub fn is_building(&self) -> bool {
        self.building.load(Ordering::SeqCst)
    }

    /// Record a finished build.
    pub fn publish(&self, result: SharedResult) {
        self.last_build_timestamp
            .store(unix_millis(), Ordering::SeqCst);
        if result.success {
            self.last_success.store(Some(result.clone()));
        }
        self.last_result.store(Some(result));
    }

    pub fn last_build_timestamp(&self) -> u64 {
        self.last_build_timestamp.load(Ordering::SeqCst)
    }

    pub fn last_success(&self) -> Option<SharedResult> {
        self.last_success.load_full()
    }

    pub fn last_result(&self) -> Option<SharedResult> {
        self.last_result.load_full()
    }
}

fn unix_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::BuildResult;
    use std::sync::Arc;
    use std::time::Duration;

    fn result(success: bool, document: &str) -> SharedResult {
        Arc::new(BuildResult {
            document: document.to_string(),
            issues: vec![],
            byte_size: document.len(),
            duration: Duration::from_millis(1),
            success,
        })
    }

    #[test]
    fn test_sequence_is_monotonic() {
        let state = DevState::default();
        let a = state.next_sequence();
        let b = state.next_sequence();
        let c = state.next_sequence();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_failed_build_keeps_last_success() {
        let state = DevState::default();
        state.publish(result(true, "good"));
        state.publish(result(false, "bad"));

        assert_eq!(state.last_success().unwrap().document, "good");
        assert_eq!(state.last_result().unwrap().document, "bad");

        state.publish(result(true, "fixed"));
        assert_eq!(state.last_success().unwrap().document, "fixed");
    }

    #[test]
    fn test_timestamp_set_on_publish() {
        let state = DevState::default();
        assert_eq!(state.last_build_timestamp(), 0);
        state.publish(result(true, "x"));
        assert!(state.last_build_timestamp() > 0);
    }
}
