//! Sliding-window price statistics
//!
//! Per observation:
//! 1. Range-query the history tree for timestamps that just left the window
//! 2. Delete their min-heap and max-heap entries through stored handles
//! 3. Insert the new price into both heaps (max-heap keyed by -price)
//! 4. Read min/max from the heap roots, average from the running sum
//! 5. Store the snapshot in the history tree under the timestamp
//!
//! The history tree keeps every snapshot ever written; only the heaps and
//! the running sum track the live window.

mod config;

pub use config::{WindowConfig, DEFAULT_WINDOW_DAYS};

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::heap::IndexedMinHeap;
use crate::link::NodeId;
use crate::tree::{range_query, AvlTree, OrderedKeyTree};
use crate::{Result, StructureError};

/// Statistics as of one observation
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowSnapshot {
    /// Observed price
    pub price: f64,
    /// Minimum price in the window
    pub min: f64,
    /// Maximum price in the window
    pub max: f64,
    /// Mean price in the window
    pub average: f64,
}

impl WindowSnapshot {
    /// Snapshot of a window holding a single price
    pub fn single(price: f64) -> Self {
        Self {
            price,
            min: price,
            max: price,
            average: price,
        }
    }
}

/// Rolling min/max/average over a trailing time window
#[derive(Debug)]
pub struct SlidingWindow {
    config: WindowConfig,

    /// Every snapshot written, keyed by observation time
    history: AvlTree<DateTime<Utc>, WindowSnapshot>,

    /// Live prices for the minimum
    min_heap: IndexedMinHeap<f64, DateTime<Utc>>,

    /// Live negated prices for the maximum
    max_heap: IndexedMinHeap<f64, DateTime<Utc>>,

    min_handles: HashMap<DateTime<Utc>, NodeId>,
    max_handles: HashMap<DateTime<Utc>, NodeId>,

    /// Running sum of live prices
    sum: f64,

    /// Number of live prices
    count: usize,

    latest: Option<DateTime<Utc>>,
}

impl SlidingWindow {
    /// Create an empty window
    pub fn new(config: WindowConfig) -> Self {
        Self {
            config,
            history: AvlTree::new(),
            min_heap: IndexedMinHeap::new(),
            max_heap: IndexedMinHeap::new(),
            min_handles: HashMap::new(),
            max_handles: HashMap::new(),
            sum: 0.0,
            count: 0,
            latest: None,
        }
    }

    /// Window configuration
    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// Timestamp of the most recent observation
    pub fn latest(&self) -> Option<DateTime<Utc>> {
        self.latest
    }

    /// Number of observations inside the window
    pub fn len(&self) -> usize {
        self.count
    }

    /// No observation inside the window
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of stored snapshots, live or not
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Snapshot written by the most recent observation
    pub fn current(&self) -> Option<WindowSnapshot> {
        let latest = self.latest?;
        self.history.get_value(&latest).ok().copied()
    }

    /// Record a price and return the window statistics as of `time`
    ///
    /// Observations must arrive in time order. Re-adding the latest
    /// timestamp replaces that observation.
    pub fn add(&mut self, time: DateTime<Utc>, price: f64) -> Result<WindowSnapshot> {
        if !price.is_finite() {
            return Err(StructureError::InvalidObservation { price });
        }

        if let Some(latest) = self.latest {
            if time < latest {
                return Err(StructureError::OutOfOrder { time, latest });
            }

            let old_bound = self.lower_bound(latest);
            let new_bound = self.lower_bound(time);
            let stale = range_query(&self.history, &old_bound, &new_bound);
            let mut evicted = 0;
            for (stamp, snapshot) in stale {
                if self.evict(stamp, snapshot.price)? {
                    evicted += 1;
                }
            }
            if evicted > 0 {
                debug!(%time, evicted, live = self.count, "evicted stale observations");
            }

            if time == latest {
                let previous = self.history.get_value(&time)?.price;
                self.evict(time, previous)?;
                trace!(%time, previous, "replacing observation");
            }
        }

        let min_handle = self.min_heap.insert(price, time)?;
        let max_handle = self.max_heap.insert(-price, time)?;
        self.min_handles.insert(time, min_handle);
        self.max_handles.insert(time, max_handle);
        self.sum += price;
        self.count += 1;

        let min = self.min_heap.peek().map_or(price, |(key, _)| *key);
        let max = self.max_heap.peek().map_or(price, |(key, _)| -*key);
        let snapshot = WindowSnapshot {
            price,
            min,
            max,
            average: self.sum / self.count as f64,
        };

        self.history.insert(time, snapshot)?;
        self.latest = Some(time);
        trace!(%time, price, min, max, live = self.count, "snapshot stored");

        Ok(snapshot)
    }

    /// Oldest timestamp no longer inside a window ending at `time`
    fn lower_bound(&self, time: DateTime<Utc>) -> DateTime<Utc> {
        time.checked_sub_signed(self.config.duration)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Drop one live observation; `false` if it was not live
    fn evict(&mut self, stamp: DateTime<Utc>, price: f64) -> Result<bool> {
        let Some(min_handle) = self.min_handles.remove(&stamp) else {
            return Ok(false);
        };
        self.min_heap.delete(min_handle)?;
        if let Some(max_handle) = self.max_handles.remove(&stamp) {
            self.max_heap.delete(max_handle)?;
        }

        self.count -= 1;
        self.sum = if self.count == 0 { 0.0 } else { self.sum - price };
        trace!(%stamp, price, "evicted");
        Ok(true)
    }

    /// Stored snapshots with `start <= time <= end`, ascending
    pub fn get_data(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<(DateTime<Utc>, WindowSnapshot)> {
        range_query(&self.history, &start, &end)
    }

    /// Delete stored snapshots older than `before` that are outside the
    /// live window; returns how many were removed
    pub fn prune_history(&mut self, before: DateTime<Utc>) -> Result<usize> {
        let Some(latest) = self.latest else {
            return Ok(0);
        };
        let live_bound = self.lower_bound(latest);
        let upper = before.min(live_bound);

        let doomed: Vec<_> = range_query(&self.history, &DateTime::<Utc>::MIN_UTC, &upper)
            .into_iter()
            .map(|(stamp, _)| stamp)
            .filter(|stamp| *stamp < before && !self.min_handles.contains_key(stamp))
            .collect();

        for stamp in &doomed {
            self.history.delete(stamp)?;
        }
        if !doomed.is_empty() {
            debug!(removed = doomed.len(), %upper, "pruned snapshot history");
        }
        Ok(doomed.len())
    }
}

impl Default for SlidingWindow {
    fn default() -> Self {
        Self::new(WindowConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    fn day(n: i64) -> DateTime<Utc> {
        t0() + TimeDelta::days(n)
    }

    #[test]
    fn test_first_observation() {
        let mut window = SlidingWindow::default();
        assert_eq!(window.config(), &WindowConfig::default());
        let snapshot = window.add(t0(), 42.0).unwrap();
        assert_eq!(snapshot, WindowSnapshot::single(42.0));
        assert_eq!(window.len(), 1);
        assert_eq!(window.current(), Some(snapshot));
    }

    #[test]
    fn test_two_observations_within_window() {
        let mut window = SlidingWindow::default();
        window.add(day(0), 10.0).unwrap();
        let snapshot = window.add(day(1), 20.0).unwrap();

        assert_eq!(snapshot.price, 20.0);
        assert_eq!(snapshot.min, 10.0);
        assert_eq!(snapshot.max, 20.0);
        assert_eq!(snapshot.average, 15.0);
    }

    #[test]
    fn test_eviction_uses_evicted_price() {
        let mut window = SlidingWindow::new(WindowConfig::days(10).unwrap());
        window.add(day(0), 100.0).unwrap();
        window.add(day(5), 10.0).unwrap();

        // Day 0 sits exactly on the lower bound and leaves the window
        let snapshot = window.add(day(10), 20.0).unwrap();
        assert_eq!(window.len(), 2);
        assert_eq!(snapshot.min, 10.0);
        assert_eq!(snapshot.max, 20.0);
        assert_eq!(snapshot.average, 15.0);
    }

    #[test]
    fn test_window_can_fully_drain() {
        let mut window = SlidingWindow::default();
        window.add(day(0), 5.0).unwrap();
        window.add(day(1), 7.0).unwrap();
        let snapshot = window.add(day(40), 3.0).unwrap();

        assert_eq!(snapshot, WindowSnapshot::single(3.0));
        assert_eq!(window.len(), 1);
        assert_eq!(window.history_len(), 3);
    }

    #[test]
    fn test_rejects_bad_observations() {
        let mut window = SlidingWindow::default();
        window.add(day(3), 1.0).unwrap();

        assert!(matches!(
            window.add(day(4), f64::NAN),
            Err(StructureError::InvalidObservation { .. })
        ));
        assert!(matches!(
            window.add(day(2), 1.0),
            Err(StructureError::OutOfOrder { .. })
        ));
        assert_eq!(window.len(), 1);
        assert_eq!(window.latest(), Some(day(3)));
    }

    #[test]
    fn test_same_timestamp_replaces() {
        let mut window = SlidingWindow::default();
        window.add(day(0), 10.0).unwrap();
        window.add(day(1), 30.0).unwrap();
        let snapshot = window.add(day(1), 20.0).unwrap();

        assert_eq!(window.len(), 2);
        assert_eq!(snapshot.max, 20.0);
        assert_eq!(snapshot.average, 15.0);
    }

    #[test]
    fn test_get_data_ranges() {
        let mut window = SlidingWindow::default();
        assert!(window.get_data(day(0), day(10)).is_empty());

        for n in 0..5 {
            window.add(day(n), n as f64).unwrap();
        }
        let data = window.get_data(day(1), day(3));
        let stamps: Vec<_> = data.iter().map(|(t, _)| *t).collect();
        assert_eq!(stamps, vec![day(1), day(2), day(3)]);
        assert!(window.get_data(day(3), day(1)).is_empty());
    }

    #[test]
    fn test_prune_keeps_live_snapshots() {
        let mut window = SlidingWindow::default();
        for n in 0..30 {
            window.add(day(n), 1.0).unwrap();
        }
        // Live window: (day 19, day 29]
        let removed = window.prune_history(day(25)).unwrap();
        assert_eq!(removed, 20);
        assert_eq!(window.history_len(), 10);
        assert_eq!(window.get_data(day(0), day(30)).first().map(|(t, _)| *t), Some(day(20)));

        // Pruning again is a no-op
        assert_eq!(window.prune_history(day(25)).unwrap(), 0);
        window.add(day(30), 2.0).unwrap();
        assert_eq!(window.len(), 10);
    }
}
