use std::io::Write;
use std::str::FromStr;

use anyhow::{Error, Result};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value};
use serde::Serialize;

use bikeshare::Network;
use model::TrafficSnapshot;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Format {
    Csv,
    GeoJson,
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.to_lowercase().as_ref() {
            "csv" => Ok(Format::Csv),
            "geojson" | "json" => Ok(Format::GeoJson),
            _ => bail!("Unknown format {raw}; use csv or geojson"),
        }
    }
}

/// Writes every station with its traffic and the marker size and flow a map would draw it with.
pub fn write<W: Write>(
    writer: W,
    format: Format,
    network: &Network,
    snapshot: &TrafficSnapshot,
) -> Result<()> {
    let rows = rows(network, snapshot);
    match format {
        Format::Csv => write_csv(writer, rows),
        Format::GeoJson => write_geojson(writer, rows),
    }
}

#[derive(Serialize)]
struct StationRow {
    id: String,
    name: String,
    lon: f64,
    lat: f64,
    departures: usize,
    arrivals: usize,
    total_traffic: usize,
    radius: f64,
    flow: f64,
}

fn rows(network: &Network, snapshot: &TrafficSnapshot) -> Vec<StationRow> {
    snapshot
        .stations
        .iter()
        .map(|s| StationRow {
            id: s.id.as_ref().map(|id| id.to_string()).unwrap_or_default(),
            name: network.stations[s.station].name.clone().unwrap_or_default(),
            lon: s.pos.x(),
            lat: s.pos.y(),
            departures: s.departures,
            arrivals: s.arrivals,
            total_traffic: s.total_traffic,
            radius: snapshot.radius_of(s),
            flow: snapshot.flow_of(s),
        })
        .collect()
}

fn write_csv<W: Write>(writer: W, rows: Vec<StationRow>) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_geojson<W: Write>(mut writer: W, rows: Vec<StationRow>) -> Result<()> {
    let mut features = Vec::new();
    for row in rows {
        let geometry = Geometry::new(Value::Point(vec![row.lon, row.lat]));
        let properties = match serde_json::to_value(&row)? {
            serde_json::Value::Object(map) => map,
            x => bail!("Station row serialized to {x}, not an object"),
        };
        features.push(Feature {
            bbox: None,
            geometry: Some(geometry),
            id: None,
            properties: Some(strip_position(properties)),
            foreign_members: None,
        });
    }
    let gj = GeoJson::FeatureCollection(FeatureCollection {
        features,
        bbox: None,
        foreign_members: None,
    });
    serde_json::to_writer(&mut writer, &gj)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

// The geometry already has the position
fn strip_position(mut properties: JsonObject) -> JsonObject {
    properties.remove("lon");
    properties.remove("lat");
    properties
}
