//! Shared helpers for integration tests

#![allow(dead_code)]

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use tickwindow::IndexedMinHeap;

/// Fixed epoch so test output is reproducible
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// `epoch() + hours`
pub fn at_hour(hours: i64) -> DateTime<Utc> {
    epoch() + TimeDelta::hours(hours)
}

/// Extract every key, checking the heap invariants after each step
pub fn drain_keys<V>(heap: &mut IndexedMinHeap<i64, V>) -> Vec<i64> {
    let mut keys = Vec::with_capacity(heap.len());
    while !heap.is_empty() {
        let (key, _) = heap.extract().expect("non-empty heap extracts");
        heap.verify().expect("heap invariants hold after extract");
        keys.push(key);
    }
    keys
}

/// Brute-force (min, max, average) over `prices`
pub fn brute_stats(prices: &[f64]) -> (f64, f64, f64) {
    let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let average = prices.iter().sum::<f64>() / prices.len() as f64;
    (min, max, average)
}
