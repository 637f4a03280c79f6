use bikeshare::{Trip, TripID};

use crate::{MinuteOfDay, TimeFilter, MINUTES_PER_DAY};

/// Every trip, bucketed by the minute of the day it departs and arrives. Built once; a time filter
/// then only has to look at the buckets inside its window.
pub struct MinuteIndex {
    departures: Vec<Vec<TripID>>,
    arrivals: Vec<Vec<TripID>>,
}

impl MinuteIndex {
    /// The IDs handed back are positions in `trips`.
    pub fn new(trips: &[Trip]) -> Self {
        let mut departures = vec![Vec::new(); MINUTES_PER_DAY];
        let mut arrivals = vec![Vec::new(); MINUTES_PER_DAY];
        for (idx, trip) in trips.iter().enumerate() {
            departures[MinuteOfDay::of(&trip.started_at).index()].push(TripID(idx));
            arrivals[MinuteOfDay::of(&trip.ended_at).index()].push(TripID(idx));
        }
        Self {
            departures,
            arrivals,
        }
    }

    /// Trips departing inside the filter's window. Buckets outside of it aren't touched.
    pub fn departures_in(&self, filter: TimeFilter) -> impl Iterator<Item = TripID> + '_ {
        select(&self.departures, filter)
    }

    pub fn arrivals_in(&self, filter: TimeFilter) -> impl Iterator<Item = TripID> + '_ {
        select(&self.arrivals, filter)
    }

    /// The number of trips indexed
    pub fn len(&self) -> usize {
        self.departures.iter().map(|bucket| bucket.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn select(buckets: &[Vec<TripID>], filter: TimeFilter) -> impl Iterator<Item = TripID> + '_ {
    filter
        .buckets()
        .into_iter()
        .flat_map(move |range| buckets[range].iter().flatten().copied())
}
