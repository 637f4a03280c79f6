#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod ids;
mod stations;
mod trips;

use std::collections::BTreeSet;

use abstutil::Timer;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub use ids::{orig, StationID, TripID};
pub use stations::Station;
pub use trips::Trip;

/// All stations and trips for one bike-share system. Loaded once and never modified.
#[derive(Clone, Serialize, Deserialize)]
pub struct Network {
    pub stations: Vec<Station>,
    // Indexed by TripID
    pub trips: Vec<Trip>,
}

#[derive(Clone, Default)]
pub struct LoadOptions {
    /// Fail the whole load on a trip with an unusable timestamp or a repeated ride ID, instead of
    /// skipping it.
    pub strict: bool,
}

/// Data quality problems noticed while loading. None of these are fatal.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadReport {
    pub skipped_trips: usize,
    pub stations_without_id: usize,
    /// Trips starting or ending at a station that isn't in the station list
    pub trips_with_unknown_station: usize,
    /// Trips with a blank start or end station. They still count for the end that's known.
    pub trips_missing_station: usize,
}

impl Network {
    /// Both inputs have to load successfully; there's no partial network.
    pub fn load<R1: std::io::Read, R2: std::io::Read>(
        stations_reader: R1,
        trips_reader: R2,
        opts: &LoadOptions,
    ) -> Result<(Self, LoadReport)> {
        let (stations, stations_without_id) =
            stations::load(stations_reader).context("loading stations")?;
        let (trips, skipped_trips) =
            trips::load(trips_reader, opts.strict).context("loading trips")?;
        let network = Self { stations, trips };

        let report = LoadReport {
            skipped_trips,
            stations_without_id,
            trips_with_unknown_station: network.trips_with_unknown_station(),
            trips_missing_station: network
                .trips
                .iter()
                .filter(|t| t.start_station.is_none() || t.end_station.is_none())
                .count(),
        };
        report.log(&network);
        Ok((network, report))
    }

    pub fn load_from_paths(
        stations_path: &str,
        trips_path: &str,
        opts: &LoadOptions,
        timer: &mut Timer,
    ) -> Result<(Self, LoadReport)> {
        timer.start("open inputs");
        let stations_file = fs_err::File::open(stations_path)?;
        let trips_file = fs_err::File::open(trips_path)?;
        timer.stop("open inputs");

        timer.start("parse inputs");
        let result = Self::load(
            std::io::BufReader::new(stations_file),
            std::io::BufReader::new(trips_file),
            opts,
        )
        .with_context(|| format!("{stations_path} and {trips_path}"));
        timer.stop("parse inputs");
        result
    }

    fn trips_with_unknown_station(&self) -> usize {
        let known: BTreeSet<&StationID> = self
            .stations
            .iter()
            .filter_map(|s| s.id.as_ref())
            .collect();
        // A blank station isn't unknown, just missing
        self.trips
            .iter()
            .filter(|t| {
                [&t.start_station, &t.end_station]
                    .into_iter()
                    .flatten()
                    .any(|id| !known.contains(id))
            })
            .count()
    }
}

impl LoadReport {
    fn log(&self, network: &Network) {
        info!(
            "Loaded {} stations and {} trips",
            network.stations.len(),
            network.trips.len()
        );
        if self.skipped_trips > 0 {
            warn!("Skipped {} trips with bad data", self.skipped_trips);
        }
        if self.stations_without_id > 0 {
            warn!(
                "{} stations have no short_name, station_id, or Number, and won't match any trips",
                self.stations_without_id
            );
        }
        if self.trips_with_unknown_station > 0 {
            warn!(
                "{} trips start or end at a station missing from the station list",
                self.trips_with_unknown_station
            );
        }
        if self.trips_missing_station > 0 {
            warn!("{} trips have a blank start or end station", self.trips_missing_station);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATIONS: &str = r#"{"data": {"stations": [
        {"short_name": "A32", "name": "Central Square", "lat": 42.365, "lon": -71.103},
        {"station_id": "B10", "name": "Kendall", "lat": 42.362, "lon": -71.086},
        {"name": "Temporary valet", "lat": 42.36, "lon": -71.09}
    ]}}"#;

    const TRIPS: &str = "ride_id,started_at,ended_at,start_station_id,end_station_id
r1,2024-03-01 08:01:00,2024-03-01 08:15:00,A32,B10
r2,2024-03-01 08:20:00,2024-03-01 08:31:00,B10,Z99
r3,2024-03-01 bad,2024-03-01 08:31:00,B10,A32
r4,2024-03-01 08:40:00,2024-03-01 09:02:00,A32,
";

    #[test]
    fn report() {
        let (network, report) =
            Network::load(STATIONS.as_bytes(), TRIPS.as_bytes(), &LoadOptions::default())
                .unwrap();
        assert_eq!(network.stations.len(), 3);
        assert_eq!(network.trips.len(), 3);
        assert_eq!(
            report,
            LoadReport {
                skipped_trips: 1,
                stations_without_id: 1,
                trips_with_unknown_station: 1,
                trips_missing_station: 1,
            }
        );
        assert_eq!(network.trips[1].end_station, Some(StationID::new("Z99")));
        assert_eq!(network.trips[2].id, TripID(2));
        assert!(network.trips[2].end_station.is_none());
    }

    #[test]
    fn strict_load_fails() {
        let opts = LoadOptions { strict: true };
        assert!(Network::load(STATIONS.as_bytes(), TRIPS.as_bytes(), &opts).is_err());
    }

    #[test]
    fn either_input_failing_fails_the_load() {
        let opts = LoadOptions::default();
        assert!(Network::load("[".as_bytes(), TRIPS.as_bytes(), &opts).is_err());
        assert!(Network::load(STATIONS.as_bytes(), "started_at\nx\n".as_bytes(), &opts).is_err());
    }

    #[test]
    fn missing_files_fail() {
        let mut timer = Timer::throwaway();
        assert!(Network::load_from_paths(
            "/nonexistent/stations.json",
            "/nonexistent/trips.csv",
            &LoadOptions::default(),
            &mut timer
        )
        .is_err());
    }
}
