#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod aggregate;
mod index;
mod scale;
mod time;

use bikeshare::Network;

pub use self::aggregate::{recompute, StationTraffic, TrafficSnapshot};
pub use self::index::MinuteIndex;
pub use self::scale::{FlowScale, RadiusScale};
pub use self::time::{MinuteOfDay, TimeFilter, MINUTES_PER_DAY, WINDOW_RADIUS_MINUTES};

/// Owns the loaded network, the per-minute index built from it, and the traffic for the current
/// time filter. The filter only changes through `set_filter`.
pub struct TrafficModel {
    network: Network,
    index: MinuteIndex,
    snapshot: TrafficSnapshot,
}

impl TrafficModel {
    /// Starts out unfiltered.
    pub fn new(network: Network) -> Self {
        let index = MinuteIndex::new(&network.trips);
        info!(
            "Indexed {} trips by minute of the day, across {} stations",
            index.len(),
            network.stations.len()
        );
        let snapshot = TrafficSnapshot::new(&network, &index, TimeFilter::None);
        Self {
            network,
            index,
            snapshot,
        }
    }

    /// Recalculates traffic for a new filter. Setting the filter that's already active does
    /// nothing.
    pub fn set_filter(&mut self, filter: TimeFilter) -> &TrafficSnapshot {
        if filter != self.snapshot.filter {
            self.snapshot = TrafficSnapshot::new(&self.network, &self.index, filter);
            debug!(
                "Traffic {}: {} departures, {} arrivals",
                filter.describe(),
                self.snapshot.total_departures(),
                self.snapshot.total_arrivals()
            );
        }
        &self.snapshot
    }

    pub fn filter(&self) -> TimeFilter {
        self.snapshot.filter
    }

    pub fn snapshot(&self) -> &TrafficSnapshot {
        &self.snapshot
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn index(&self) -> &MinuteIndex {
        &self.index
    }
}
