use std::collections::BTreeSet;

use anyhow::Result;
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{orig, StationID, TripID};

// Only the first few bad records are logged individually
const MAX_WARNINGS: usize = 5;

const TIMESTAMP_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Trip {
    pub id: TripID,
    pub ride_id: Option<orig::RideID>,
    /// Blank in the source for some trips, like bikes that were never docked. The trip still counts
    /// for whichever end is known.
    pub start_station: Option<StationID>,
    pub end_station: Option<StationID>,
    pub started_at: NaiveDateTime,
    pub ended_at: NaiveDateTime,
}

/// Returns the trips, plus how many records were skipped for an unusable timestamp or a repeated
/// ride ID. When `strict` is set, any such record fails the whole load instead.
pub fn load<R: std::io::Read>(reader: R, strict: bool) -> Result<(Vec<Trip>, usize)> {
    let mut trips = Vec::new();
    let mut ride_ids = BTreeSet::new();
    let mut skipped = 0;
    for (idx, rec) in csv::Reader::from_reader(reader).deserialize().enumerate() {
        let rec: Record = rec?;
        // The header is line 1
        let line = idx + 2;

        let parsed = rec.parse().and_then(|times| {
            if let Some(ref ride_id) = rec.ride_id {
                if !ride_ids.insert(ride_id.clone()) {
                    bail!("duplicate {:?}", ride_id);
                }
            }
            Ok(times)
        });
        let (started_at, ended_at) = match parsed {
            Ok(x) => x,
            Err(err) => {
                if strict {
                    bail!("Trip on line {line}: {err}");
                }
                skipped += 1;
                if skipped <= MAX_WARNINGS {
                    warn!("Skipping trip on line {line}: {err}");
                }
                continue;
            }
        };

        trips.push(Trip {
            id: TripID(trips.len()),
            ride_id: rec.ride_id,
            start_station: rec.start_station_id,
            end_station: rec.end_station_id,
            started_at,
            ended_at,
        });
    }
    if skipped > MAX_WARNINGS {
        warn!("... and {} more unusable trips", skipped - MAX_WARNINGS);
    }
    Ok((trips, skipped))
}

fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    for format in TIMESTAMP_FORMATS {
        if let Ok(t) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(t);
        }
    }
    // Keep the local wall clock time; the offset doesn't change which minute of the day it is
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Ok(t.naive_local());
    }
    bail!("Unknown timestamp format {:?}", raw)
}

#[derive(Deserialize)]
struct Record {
    ride_id: Option<orig::RideID>,
    start_station_id: Option<StationID>,
    end_station_id: Option<StationID>,
    started_at: String,
    ended_at: String,
}

impl Record {
    fn parse(&self) -> Result<(NaiveDateTime, NaiveDateTime)> {
        Ok((
            parse_timestamp(&self.started_at)?,
            parse_timestamp(&self.ended_at)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Timelike;

    use super::*;

    #[test]
    fn timestamp_formats() {
        for (raw, hour, minute) in [
            ("2024-03-01 00:05:12", 0, 5),
            ("2024-03-01 17:42:09.123", 17, 42),
            ("2024-03-01 23:59", 23, 59),
            ("2024-03-01T08:30:00", 8, 30),
            ("2024-03-01T08:30:00-05:00", 8, 30),
            (" 2024-03-01 12:00:00 ", 12, 0),
        ] {
            let t = parse_timestamp(raw).unwrap();
            assert_eq!((t.hour(), t.minute()), (hour, minute), "{raw}");
        }
        assert!(parse_timestamp("yesterday").is_err());
        assert!(parse_timestamp("2024-03-01 25:00:00").is_err());
    }

    const CSV: &str = "ride_id,bike_type,started_at,ended_at,start_station_id,end_station_id,is_member
r1,classic,2024-03-01 00:05:12,2024-03-01 00:20:00,A32,B10,1
r2,electric,not a time,2024-03-01 00:20:00,A32,B10,0
r3,classic,2024-03-01 13:20:00,2024-03-01 13:41:30,B10,A32,1
r4,classic,2024-03-01 13:20:00,2024-03-01 13:41:30,,A32,1
";

    #[test]
    fn bad_timestamps_are_skipped() {
        let (trips, skipped) = load(CSV.as_bytes(), false).unwrap();
        assert_eq!(skipped, 1);
        assert_eq!(trips.len(), 3);
        assert_eq!(trips[0].id, TripID(0));
        assert_eq!(trips[1].id, TripID(1));
        assert_eq!(trips[1].start_station, Some(StationID::new("B10")));
        assert_eq!(trips[1].end_station, Some(StationID::new("A32")));
    }

    #[test]
    fn blank_stations_are_kept() {
        let (trips, _) = load(CSV.as_bytes(), false).unwrap();
        assert_eq!(trips[2].id, TripID(2));
        assert!(trips[2].ride_id.is_some());
        assert!(trips[2].start_station.is_none());
        assert_eq!(trips[2].end_station, Some(StationID::new("A32")));

        let csv = "started_at,ended_at,start_station_id,end_station_id
2024-03-01 08:00:00,2024-03-01 08:20:00,A,
";
        let (trips, skipped) = load(csv.as_bytes(), true).unwrap();
        assert_eq!(skipped, 0);
        assert_eq!(trips[0].start_station, Some(StationID::new("A")));
        assert!(trips[0].end_station.is_none());
    }

    #[test]
    fn strict_mode_fails() {
        let err = load(CSV.as_bytes(), true).unwrap_err();
        assert!(err.to_string().contains("line 3"), "{err}");
    }

    #[test]
    fn duplicate_rides() {
        let csv = "ride_id,started_at,ended_at,start_station_id,end_station_id
r1,2024-03-01 00:05:12,2024-03-01 00:20:00,A32,B10
r1,2024-03-01 00:06:12,2024-03-01 00:21:00,B10,A32
r2,2024-03-01 00:07:12,2024-03-01 00:22:00,B10,A32
";
        // The first one wins
        let (trips, skipped) = load(csv.as_bytes(), false).unwrap();
        assert_eq!(skipped, 1);
        assert_eq!(trips.len(), 2);
        assert_eq!(trips[0].start_station, Some(StationID::new("A32")));
        assert_eq!(trips[1].id, TripID(1));
        assert_eq!(trips[1].started_at.minute(), 7);

        let err = load(csv.as_bytes(), true).unwrap_err();
        assert!(err.to_string().contains("line 3"), "{err}");
    }

    #[test]
    fn ride_id_is_optional() {
        let csv = "started_at,ended_at,start_station_id,end_station_id
2024-03-01 00:05:12,2024-03-01 00:20:00,A32,B10
2024-03-01 00:05:12,2024-03-01 00:20:00,A32,B10
";
        let (trips, skipped) = load(csv.as_bytes(), false).unwrap();
        assert_eq!(trips.len(), 2);
        assert_eq!(skipped, 0);
        assert!(trips[0].ride_id.is_none());
    }

    #[test]
    fn missing_columns_fail() {
        let csv = "started_at,start_station_id
2024-03-01 00:05:12,A32
";
        assert!(load(csv.as_bytes(), false).is_err());
    }
}
