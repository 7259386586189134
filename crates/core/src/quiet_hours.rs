//! Quiet-hours window evaluated on the wall clock of a fixed reference zone.

use chrono::{FixedOffset, Offset, Timelike, Utc};

use crate::types::Timestamp;

/// A daily window of whole hours during which pushes are suppressed.
///
/// When `start_hour > end_hour` the window wraps midnight (22 -> 8 covers
/// 22:00..23:59 and 00:00..07:59). Equal hours describe an empty window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuietHours {
    pub start_hour: u32,
    pub end_hour: u32,
    pub offset: FixedOffset,
}

impl QuietHours {
    pub fn new(start_hour: u32, end_hour: u32, offset: FixedOffset) -> Self {
        debug_assert!(start_hour < 24 && end_hour < 24);
        Self {
            start_hour,
            end_hour,
            offset,
        }
    }

    /// Window evaluated in UTC.
    pub fn utc(start_hour: u32, end_hour: u32) -> Self {
        Self::new(start_hour, end_hour, Utc.fix())
    }

    /// Whether `now` falls inside the window.
    pub fn contains(&self, now: Timestamp) -> bool {
        let hour = now.with_timezone(&self.offset).hour();
        is_quiet_hour(hour, self.start_hour, self.end_hour)
    }
}

/// Hour-of-day membership test for a possibly wrapping window.
pub fn is_quiet_hour(hour: u32, start_hour: u32, end_hour: u32) -> bool {
    if start_hour > end_hour {
        hour >= start_hour || hour < end_hour
    } else {
        start_hour <= hour && hour < end_hour
    }
}
