use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::admission::AdmissionValidator;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub validator: Arc<AdmissionValidator>,
    counters: Arc<Counters>,
}

#[derive(Default)]
struct Counters {
    admitted: AtomicU64,
    rejected: AtomicU64,
}

/// Running totals since the server started
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct AdmissionCounts {
    pub admitted: u64,
    pub rejected: u64,
}

impl AppState {
    pub fn new(validator: AdmissionValidator) -> Self {
        Self {
            validator: Arc::new(validator),
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn record(&self, admitted: bool) {
        let counter = if admitted {
            &self.counters.admitted
        } else {
            &self.counters.rejected
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn counts(&self) -> AdmissionCounts {
        AdmissionCounts {
            admitted: self.counters.admitted.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
        }
    }
}
