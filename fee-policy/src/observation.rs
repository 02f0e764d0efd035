use ledger_exec_ledger::FeeRate;
use log::{debug, info, warn};
use serde_derive::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const DEFAULT_MEMORY_CAPACITY: usize = 10;
const SLOW_CONFIRMATION_MS: u64 = 60_000;
const VERY_SLOW_CONFIRMATION_MS: u64 = 90_000;
/// at most one snapshot log line per 30 seconds
const SNAPSHOT_LOG_INTERVAL_MS: u64 = 30_000;

/// One confirmed transaction: what it paid and how long it took.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasSample {
    pub priority_fee: Option<FeeRate>,
    pub max_fee: Option<FeeRate>,
    pub confirmation_latency_ms: u64,
    /// unix millis when the sample was taken
    pub timestamp: u64,
    pub context: Option<String>,
}

impl GasSample {
    pub fn new(confirmation_latency_ms: u64) -> Self {
        GasSample {
            priority_fee: None,
            max_fee: None,
            confirmation_latency_ms,
            timestamp: faketime::unix_time_as_millis(),
            context: None,
        }
    }

    pub fn priority_fee(mut self, fee: FeeRate) -> Self {
        self.priority_fee = Some(fee);
        self
    }

    pub fn max_fee(mut self, fee: FeeRate) -> Self {
        self.max_fee = Some(fee);
        self
    }

    pub fn context<S: Into<String>>(mut self, context: S) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Medians over the current window. Each field is `None` when no sample
/// in the window carries it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MemoryStats {
    pub median_priority_fee: Option<FeeRate>,
    pub median_max_fee: Option<FeeRate>,
    pub median_confirmation_ms: Option<u64>,
}

/// Bounded FIFO of recent confirmation outcomes.
///
/// The memory holds no lock of its own. Hosts that share it between tasks
/// wrap it in a mutex and must not hold the guard across an await point.
pub struct ObservationMemory {
    samples: VecDeque<GasSample>,
    capacity: usize,
    last_snapshot_ms: Option<u64>,
}

impl Default for ObservationMemory {
    fn default() -> Self {
        ObservationMemory::new()
    }
}

impl ObservationMemory {
    pub fn new() -> Self {
        ObservationMemory::with_capacity(DEFAULT_MEMORY_CAPACITY)
    }

    /// A zero capacity is bumped to 1.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        ObservationMemory {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            last_snapshot_ms: None,
        }
    }

    pub fn add(&mut self, sample: GasSample) {
        let latency = sample.confirmation_latency_ms;
        if let Some(label) = slowness(latency) {
            warn!(
                target: "fee_policy",
                "{} confirmation: {}ms, context: {:?}", label, latency, sample.context
            );
        }
        debug!(target: "fee_policy", "record sample {:?}", sample);

        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
        self.log_snapshot(faketime::unix_time_as_millis());
    }

    pub fn stats(&self) -> MemoryStats {
        if self.samples.is_empty() {
            return MemoryStats::default();
        }
        MemoryStats {
            median_priority_fee: median(
                self.samples.iter().filter_map(|s| s.priority_fee).collect(),
                FeeRate::midpoint,
            ),
            median_max_fee: median(
                self.samples.iter().filter_map(|s| s.max_fee).collect(),
                FeeRate::midpoint,
            ),
            median_confirmation_ms: median(
                self.samples
                    .iter()
                    .map(|s| s.confirmation_latency_ms)
                    .collect(),
                |a, b| a.min(b) + (a.max(b) - a.min(b)) / 2,
            ),
        }
    }

    pub fn reset(&mut self) {
        self.samples.clear();
        self.last_snapshot_ms = None;
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub fn samples(&self) -> impl Iterator<Item = &GasSample> {
        self.samples.iter()
    }

    // returns whether a snapshot line was emitted
    fn log_snapshot(&mut self, now_ms: u64) -> bool {
        let due = self
            .last_snapshot_ms
            .map_or(true, |last| now_ms.saturating_sub(last) >= SNAPSHOT_LOG_INTERVAL_MS);
        if !due {
            return false;
        }
        self.last_snapshot_ms = Some(now_ms);
        let stats = self.stats();
        info!(
            target: "fee_policy",
            "observation memory: samples {}/{}, median priority fee {:?}, \
             median max fee {:?}, median confirmation {:?}ms",
            self.samples.len(),
            self.capacity,
            stats.median_priority_fee,
            stats.median_max_fee,
            stats.median_confirmation_ms
        );
        true
    }
}

fn slowness(latency_ms: u64) -> Option<&'static str> {
    if latency_ms >= VERY_SLOW_CONFIRMATION_MS {
        Some("very slow")
    } else if latency_ms >= SLOW_CONFIRMATION_MS {
        Some("slow")
    } else {
        None
    }
}

/// Median of `values`; an even count takes `midpoint` of the two middle values.
fn median<T, F>(mut values: Vec<T>, midpoint: F) -> Option<T>
where
    T: Ord + Copy,
    F: Fn(T, T) -> T,
{
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some(midpoint(values[mid - 1], values[mid]))
    } else {
        Some(values[mid])
    }
}
