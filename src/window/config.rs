//! Window configuration

use chrono::TimeDelta;

use crate::{Result, StructureError};

/// Default trailing window length in days
pub const DEFAULT_WINDOW_DAYS: i64 = 10;

/// Configuration parameters for a sliding window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    /// Trailing span over which statistics are computed
    pub duration: TimeDelta,
}

impl WindowConfig {
    /// Construct configuration with an explicit duration (must be > 0)
    pub fn new(duration: TimeDelta) -> Result<Self> {
        if duration <= TimeDelta::zero() {
            return Err(StructureError::InvalidConfiguration(format!(
                "window duration must be > 0, got {duration}"
            )));
        }
        Ok(Self { duration })
    }

    /// Window of a whole number of days
    pub fn days(days: i64) -> Result<Self> {
        let duration = TimeDelta::try_days(days).ok_or_else(|| {
            StructureError::InvalidConfiguration(format!("{days} days is out of range"))
        })?;
        Self::new(duration)
    }

    /// Replace the duration, keeping validation
    pub fn with_duration(self, duration: TimeDelta) -> Result<Self> {
        Self::new(duration)
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            duration: TimeDelta::days(DEFAULT_WINDOW_DAYS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_ten_days() {
        assert_eq!(WindowConfig::default().duration, TimeDelta::days(10));
        assert_eq!(WindowConfig::days(10).unwrap(), WindowConfig::default());
    }

    #[test]
    fn test_rejects_non_positive_duration() {
        assert!(matches!(
            WindowConfig::new(TimeDelta::zero()),
            Err(StructureError::InvalidConfiguration(_))
        ));
        assert!(WindowConfig::days(-1).is_err());
        assert!(WindowConfig::days(i64::MAX).is_err());

        let config = WindowConfig::default()
            .with_duration(TimeDelta::hours(6))
            .unwrap();
        assert_eq!(config.duration, TimeDelta::hours(6));
    }
}
