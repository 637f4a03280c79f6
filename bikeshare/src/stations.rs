use anyhow::Result;
use geom::LonLat;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::StationID;

#[derive(Clone, Serialize, Deserialize)]
pub struct Station {
    /// Stations with no identifier can't be matched against any trip, so they never see traffic.
    pub id: Option<StationID>,
    pub name: Option<String>,
    pub pos: LonLat,
    pub capacity: Option<usize>,
}

impl Station {
    pub fn describe(&self) -> String {
        match (&self.id, &self.name) {
            (Some(id), Some(name)) => format!("{id} ({name})"),
            (Some(id), None) => id.to_string(),
            (None, Some(name)) => name.clone(),
            (None, None) => format!("unnamed station at ({}, {})", self.pos.x(), self.pos.y()),
        }
    }
}

/// Returns all stations, plus how many of them have no identifier.
pub fn load<R: std::io::Read>(reader: R) -> Result<(Vec<Station>, usize)> {
    let records = match serde_json::from_reader(reader)? {
        Input::Envelope { data } => data.stations,
        Input::List(list) => list,
    };

    let mut stations = Vec::new();
    let mut without_id = 0;
    for rec in records {
        let id = resolve_id([rec.short_name, rec.station_id, rec.number]);
        let name = rec.name.or(rec.name_upper);
        let (lon, lat) = match (rec.lon.or(rec.long), rec.lat.or(rec.lat_upper)) {
            (Some(lon), Some(lat)) => (lon, lat),
            _ => bail!(
                "Station {:?} / {:?} has no coordinates",
                id.as_ref().map(|id| id.to_string()),
                name
            ),
        };
        if id.is_none() {
            without_id += 1;
        }
        stations.push(Station {
            id,
            name,
            pos: LonLat::new(lon, lat),
            capacity: rec
                .capacity
                .or(rec.total_docks)
                .and_then(|x| x.as_u64())
                .map(|x| x as usize),
        });
    }
    Ok((stations, without_id))
}

// The first candidate holding a string or a number wins. Numbers become their decimal string, so
// they match the station ID columns in the trip CSV.
fn resolve_id(candidates: [Option<Value>; 3]) -> Option<StationID> {
    candidates.into_iter().flatten().find_map(|value| match value {
        Value::String(x) => Some(StationID::new(x)),
        Value::Number(x) => Some(StationID::new(x.to_string())),
        _ => None,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Input {
    Envelope { data: Data },
    List(Vec<Record>),
}

#[derive(Deserialize)]
struct Data {
    stations: Vec<Record>,
}

// Both the GBFS station_information names and the older open data export names show up in the wild
#[derive(Deserialize)]
struct Record {
    short_name: Option<Value>,
    station_id: Option<Value>,
    #[serde(rename = "Number")]
    number: Option<Value>,
    name: Option<String>,
    #[serde(rename = "NAME")]
    name_upper: Option<String>,
    lat: Option<f64>,
    #[serde(rename = "Lat")]
    lat_upper: Option<f64>,
    lon: Option<f64>,
    #[serde(rename = "Long")]
    long: Option<f64>,
    capacity: Option<Value>,
    #[serde(rename = "Total docks")]
    total_docks: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(json: &str) -> Vec<Option<String>> {
        let (stations, _) = load(json.as_bytes()).unwrap();
        stations
            .into_iter()
            .map(|s| s.id.map(|id| id.as_str().to_string()))
            .collect()
    }

    #[test]
    fn short_name_wins_over_other_ids() {
        let json = r#"[
            {"short_name": "A32", "station_id": "uuid-1", "Number": "N1", "lat": 42.3, "lon": -71.1},
            {"station_id": "uuid-2", "Number": "N2", "lat": 42.3, "lon": -71.1},
            {"short_name": null, "Number": "N3", "lat": 42.3, "lon": -71.1}
        ]"#;
        assert_eq!(
            ids(json),
            vec![
                Some("A32".to_string()),
                Some("uuid-2".to_string()),
                Some("N3".to_string())
            ]
        );
    }

    #[test]
    fn numeric_ids_become_strings() {
        let json = r#"[{"Number": 67, "Lat": 42.3, "Long": -71.1}]"#;
        assert_eq!(ids(json), vec![Some("67".to_string())]);
    }

    #[test]
    fn gbfs_envelope() {
        let json = r#"{"data": {"stations": [
            {"short_name": "M32006", "name": "MIT at Mass Ave", "lat": 42.358, "lon": -71.093, "capacity": 27}
        ]}}"#;
        let (stations, without_id) = load(json.as_bytes()).unwrap();
        assert_eq!(without_id, 0);
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].name.as_deref(), Some("MIT at Mass Ave"));
        assert_eq!(stations[0].capacity, Some(27));
        assert_eq!(stations[0].pos.x(), -71.093);
        assert_eq!(stations[0].pos.y(), 42.358);
    }

    #[test]
    fn missing_ids_are_counted() {
        let json = r#"[
            {"name": "Mystery", "lat": 42.3, "lon": -71.1},
            {"short_name": "B1", "lat": 42.3, "lon": -71.1}
        ]"#;
        let (stations, without_id) = load(json.as_bytes()).unwrap();
        assert_eq!(stations.len(), 2);
        assert_eq!(without_id, 1);
        assert!(stations[0].id.is_none());
    }

    #[test]
    fn missing_coordinates_fail() {
        let json = r#"[{"short_name": "B1", "lat": 42.3}]"#;
        assert!(load(json.as_bytes()).is_err());
    }

    #[test]
    fn malformed_json_fails() {
        assert!(load("{\"data\": ".as_bytes()).is_err());
    }
}
