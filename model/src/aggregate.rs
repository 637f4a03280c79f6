use abstutil::Counter;
use bikeshare::{Network, Station, StationID, Trip};
use geom::LonLat;

use crate::{FlowScale, MinuteIndex, RadiusScale, TimeFilter};

/// One station's traffic under some time filter.
#[derive(Clone)]
pub struct StationTraffic {
    /// Index into `Network::stations`
    pub station: usize,
    pub id: Option<StationID>,
    pub pos: LonLat,
    pub departures: usize,
    pub arrivals: usize,
    /// Always departures + arrivals
    pub total_traffic: usize,
}

/// Counts departures and arrivals per station, only looking at trips inside the filter's window.
/// The result lines up with `stations`. `index` must have been built from this same `trips`
/// slice. A trip with a blank station only counts for the end that's known.
pub fn recompute(
    stations: &[Station],
    trips: &[Trip],
    index: &MinuteIndex,
    filter: TimeFilter,
) -> Vec<StationTraffic> {
    let mut departures: Counter<&StationID> = Counter::new();
    for id in index.departures_in(filter) {
        if let Some(ref station) = trips[id.0].start_station {
            departures.inc(station);
        }
    }
    let mut arrivals: Counter<&StationID> = Counter::new();
    for id in index.arrivals_in(filter) {
        if let Some(ref station) = trips[id.0].end_station {
            arrivals.inc(station);
        }
    }

    stations
        .iter()
        .enumerate()
        .map(|(idx, station)| {
            let (departures, arrivals) = match station.id {
                Some(ref id) => (departures.get(id), arrivals.get(id)),
                None => (0, 0),
            };
            StationTraffic {
                station: idx,
                id: station.id.clone(),
                pos: station.pos,
                departures,
                arrivals,
                total_traffic: departures + arrivals,
            }
        })
        .collect()
}

/// Everything a renderer needs for one time filter: per-station traffic and the scales to draw it
/// with. Replaced as a whole when the filter changes.
#[derive(Clone)]
pub struct TrafficSnapshot {
    pub filter: TimeFilter,
    pub stations: Vec<StationTraffic>,
    pub radius: RadiusScale,
    pub flow: FlowScale,
}

impl TrafficSnapshot {
    pub fn new(network: &Network, index: &MinuteIndex, filter: TimeFilter) -> Self {
        let stations = recompute(&network.stations, &network.trips, index, filter);
        let max_traffic = stations.iter().map(|s| s.total_traffic).max().unwrap_or(0);
        Self {
            filter,
            stations,
            radius: RadiusScale::new(max_traffic, filter),
            flow: FlowScale::new(),
        }
    }

    pub fn radius_of(&self, station: &StationTraffic) -> f64 {
        self.radius.radius(station.total_traffic)
    }

    pub fn flow_of(&self, station: &StationTraffic) -> f64 {
        self.flow.flow(station.departures, station.total_traffic)
    }

    pub fn total_departures(&self) -> usize {
        self.stations.iter().map(|s| s.departures).sum()
    }

    pub fn total_arrivals(&self) -> usize {
        self.stations.iter().map(|s| s.arrivals).sum()
    }

    /// The stations with the most traffic, busiest first. Ties keep station order.
    pub fn busiest(&self, n: usize) -> Vec<&StationTraffic> {
        let mut list: Vec<&StationTraffic> = self.stations.iter().collect();
        list.sort_by_key(|s| std::cmp::Reverse(s.total_traffic));
        list.truncate(n);
        list
    }
}
