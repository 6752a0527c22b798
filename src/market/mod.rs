//! Per-series window tracking
//!
//! One [`SlidingWindow`] per series name, created on first use.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::window::{SlidingWindow, WindowConfig, WindowSnapshot};
use crate::{Result, StructureError};

/// Windows keyed by series name
#[derive(Debug, Default)]
pub struct MarketTracker {
    config: WindowConfig,
    windows: HashMap<String, SlidingWindow>,
}

impl MarketTracker {
    /// Create an empty tracker; new series use `config`
    pub fn new(config: WindowConfig) -> Self {
        Self {
            config,
            windows: HashMap::new(),
        }
    }

    /// Record a price for `name`, creating its window if unseen
    pub fn add(&mut self, name: &str, time: DateTime<Utc>, price: f64) -> Result<WindowSnapshot> {
        if !self.windows.contains_key(name) {
            debug!(series = name, "tracking new series");
        }
        let config = self.config;
        self.windows
            .entry(name.to_string())
            .or_insert_with(|| SlidingWindow::new(config))
            .add(time, price)
    }

    /// Stored snapshots of `name` in `[start, end]`
    pub fn get_data(
        &self,
        name: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<(DateTime<Utc>, WindowSnapshot)>> {
        self.window(name)
            .map(|window| window.get_data(start, end))
            .ok_or_else(|| StructureError::not_found(format!("series '{name}' is not tracked")))
    }

    /// Window of a series
    pub fn window(&self, name: &str) -> Option<&SlidingWindow> {
        self.windows.get(name)
    }

    /// Tracked series names, sorted
    pub fn series(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.windows.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
