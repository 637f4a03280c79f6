use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use anyhow::{Error, Result};
use chrono::{NaiveDateTime, NaiveTime, Timelike};

pub const MINUTES_PER_DAY: usize = 24 * 60;
/// How far on either side of the selected minute a time filter reaches
pub const WINDOW_RADIUS_MINUTES: usize = 60;

/// A minute of the day, from 00:00 (0) to 23:59 (1439). Also the index of a bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MinuteOfDay(usize);

impl MinuteOfDay {
    pub fn new(minute: usize) -> Result<Self> {
        if minute >= MINUTES_PER_DAY {
            bail!("{minute} isn't a minute of the day");
        }
        Ok(Self(minute))
    }

    /// Ignores the date and any seconds.
    pub fn of(time: &NaiveDateTime) -> Self {
        Self((time.hour() * 60 + time.minute()) as usize)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for MinuteOfDay {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl FromStr for MinuteOfDay {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        let time = NaiveTime::parse_from_str(raw.trim(), "%H:%M")
            .map_err(|err| anyhow!("{raw:?} isn't a time like 08:30: {err}"))?;
        Ok(Self((time.hour() * 60 + time.minute()) as usize))
    }
}

/// Which trips count towards station traffic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeFilter {
    /// Every trip
    None,
    /// Trips within an hour of this minute, wrapping around midnight
    Around(MinuteOfDay),
}

impl TimeFilter {
    /// Interprets a time-of-day slider, where -1 means no filter.
    pub fn from_slider(value: i32) -> Result<Self> {
        if value == -1 {
            return Ok(TimeFilter::None);
        }
        if value < 0 {
            bail!("Slider value {value} should be -1 or a minute of the day");
        }
        Ok(TimeFilter::Around(MinuteOfDay::new(value as usize)?))
    }

    pub fn is_filtered(self) -> bool {
        self != TimeFilter::None
    }

    /// The buckets selected by this filter, as one or two inclusive ranges. A window crossing
    /// midnight is split into the piece before and the piece after.
    pub fn buckets(self) -> Vec<RangeInclusive<usize>> {
        let center = match self {
            TimeFilter::None => {
                return vec![0..=MINUTES_PER_DAY - 1];
            }
            TimeFilter::Around(m) => m.index(),
        };
        let low = (center + MINUTES_PER_DAY - WINDOW_RADIUS_MINUTES) % MINUTES_PER_DAY;
        let high = (center + WINDOW_RADIUS_MINUTES) % MINUTES_PER_DAY;
        if low <= high {
            vec![low..=high]
        } else {
            vec![low..=MINUTES_PER_DAY - 1, 0..=high]
        }
    }

    /// How many minutes of the day this filter covers
    pub fn bucket_count(self) -> usize {
        self.buckets().into_iter().map(|range| range.count()).sum()
    }

    pub fn contains(self, minute: MinuteOfDay) -> bool {
        self.buckets()
            .iter()
            .any(|range| range.contains(&minute.index()))
    }

    pub fn describe(self) -> String {
        match self {
            TimeFilter::None => "all day".to_string(),
            TimeFilter::Around(m) => format!("within an hour of {m}"),
        }
    }
}
