use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use itertools::Itertools;
use thiserror::Error;

use super::geometry::GeoPoint;
use super::metrics::EstimateError;


/// Anything that stops the dashboard from starting.  None of these are recoverable.
#[derive(Debug, Error)]
pub enum StartupDataError {
    #[error("couldn't open {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("malformed csv in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    #[error("{path} has no {column:?} column")]
    MissingColumn { path: PathBuf, column: String },
    #[error("{path} line {line}: bad value {value:?} in column {column:?}")]
    BadField { path: PathBuf, line: usize, column: String, value: String },
    #[error("bad config: {0}")]
    Config(String),
    #[error("bad metrics table: {0}")]
    MetricsTable(#[from] EstimateError),
}

#[derive(PartialEq, Debug, Clone)]
pub struct DemandPoint {
    pub id: String,
    pub pos: GeoPoint,
    // number of households (HUNV) in the tract
    pub weight: f64,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum FacilityType {
    Existing,
    Candidate,
}

impl FromStr for FacilityType {
    type Err = String;

    fn from_str(ss: &str) -> Result<Self, Self::Err> {
        match ss.trim() {
            "existing" => Ok(FacilityType::Existing),
            "candidate" => Ok(FacilityType::Candidate),
            other => Err(format!("unknown facility type {:?}", other)),
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct Facility {
    pub id: String,
    pub pos: GeoPoint,
    pub facility_type: FacilityType,
}

#[derive(PartialEq, Debug, Clone)]
pub struct TransitStop {
    pub id: String,
    pub pos: GeoPoint,
}

/// Everything drawn on the map, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct SiteData {
    pub demand: Vec<DemandPoint>,
    pub existing: Vec<Facility>,
    pub candidates: Vec<Facility>,
    pub stops: Vec<TransitStop>,
}

impl SiteData {
    pub fn from_csvs(demand_path: &Path, facilities_path: &Path, transit_edges_path: &Path)
                     -> Result<SiteData, StartupDataError> {
        let demand = demand_points_from_csv(demand_path)?;
        log::info!("Loaded {} food desert tracts", demand.len());

        let (existing, candidates) = facilities_from_csv(facilities_path)?;
        log::info!("Loaded {} existing stores, {} candidates", existing.len(), candidates.len());

        let stops = transit_stops_from_csv(transit_edges_path)?;
        log::info!("Loaded {} transit stops", stops.len());

        Ok(SiteData{demand, existing, candidates, stops})
    }

    pub fn total_weight(&self) -> f64 {
        self.demand.iter().map(|dp| dp.weight).sum()
    }
}


// A convenience type for parsing csv data
type Row = HashMap<String, String>;

/// Reads every row of a csv file as a column-name to value map, checking that the required
/// columns are present.  Rows are returned with their line number in the file.
fn read_rows(path: &Path, required: &[&str]) -> Result<Vec<(usize, Row)>, StartupDataError> {
    let file = File::open(path).map_err(|source| StartupDataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let csv_err = |source: csv::Error| StartupDataError::Csv{path: path.to_path_buf(), source};
    let mut reader = csv::Reader::from_reader(file);

    let headers = reader.headers().map_err(csv_err)?.clone();
    for column in required {
        if !headers.iter().any(|hh| hh.trim() == *column) {
            return Err(StartupDataError::MissingColumn {
                path: path.to_path_buf(),
                column: String::from(*column),
            });
        }
    }

    let mut rows = vec![];
    for (ii, result) in reader.deserialize().enumerate() {
        let row: Row = result.map_err(csv_err)?;
        let row = row.into_iter().map(|(kk, vv)| (String::from(kk.trim()), vv)).collect();
        // the header is line 1
        rows.push((ii + 2, row));
    }
    Ok(rows)
}

fn parse_field<TT: FromStr>(path: &Path, line: usize, row: &Row, column: &str)
                            -> Result<TT, StartupDataError> {
    let value = row.get(column).map(|vv| vv.trim()).unwrap_or("");
    value.parse().map_err(|_| StartupDataError::BadField {
        path: path.to_path_buf(),
        line,
        column: String::from(column),
        value: String::from(value),
    })
}

fn parse_pos(path: &Path, line: usize, row: &Row, lat_col: &str, lon_col: &str)
             -> Result<GeoPoint, StartupDataError> {
    let pos = GeoPoint::new(parse_field(path, line, row, lat_col)?,
                            parse_field(path, line, row, lon_col)?);
    if !pos.is_valid() {
        return Err(StartupDataError::BadField {
            path: path.to_path_buf(),
            line,
            column: format!("{}/{}", lat_col, lon_col),
            value: format!("{}, {}", pos.lat, pos.lon),
        });
    }
    Ok(pos)
}

fn parse_id(path: &Path, line: usize, row: &Row, column: &str) -> Result<String, StartupDataError> {
    let id: String = parse_field(path, line, row, column)?;
    if id.is_empty() {
        return Err(StartupDataError::BadField {
            path: path.to_path_buf(),
            line,
            column: String::from(column),
            value: id,
        });
    }
    Ok(id)
}

pub fn demand_points_from_csv(path: &Path) -> Result<Vec<DemandPoint>, StartupDataError> {
    let rows = read_rows(path, &["demand_id", "lat", "lon", "weight"])?;
    let mut points = vec![];
    for (line, row) in rows {
        let weight: f64 = parse_field(path, line, &row, "weight")?;
        if !weight.is_finite() || weight < 0.0 {
            return Err(StartupDataError::BadField {
                path: path.to_path_buf(),
                line,
                column: String::from("weight"),
                value: row["weight"].clone(),
            });
        }
        points.push(DemandPoint {
            id: parse_id(path, line, &row, "demand_id")?,
            pos: parse_pos(path, line, &row, "lat", "lon")?,
            weight,
        });
    }
    Ok(points)
}

/// Returns the existing and candidate facilities, in file order.
pub fn facilities_from_csv(path: &Path)
                           -> Result<(Vec<Facility>, Vec<Facility>), StartupDataError> {
    let rows = read_rows(path, &["facility_id", "lat", "lon", "facility_type"])?;
    let mut existing = vec![];
    let mut candidates = vec![];
    for (line, row) in rows {
        let facility_type = match row["facility_type"].parse::<FacilityType>() {
            Ok(ft) => ft,
            Err(msg) => {
                log::warn!("{} line {}: {}, skipping", path.display(), line, msg);
                continue;
            }
        };
        let facility = Facility {
            id: parse_id(path, line, &row, "facility_id")?,
            pos: parse_pos(path, line, &row, "lat", "lon")?,
            facility_type,
        };
        match facility_type {
            FacilityType::Existing => existing.push(facility),
            FacilityType::Candidate => candidates.push(facility),
        }
    }
    Ok((existing, candidates))
}

/// Builds the set of unique stops from a table of stop pairs.  The from-ends of every row come
/// before the to-ends, and the first position seen for an id is the one kept.
pub fn transit_stops_from_csv(path: &Path) -> Result<Vec<TransitStop>, StartupDataError> {
    let rows = read_rows(path, &["from_stop_id", "from_lat", "from_lon",
                                 "to_stop_id", "to_lat", "to_lon"])?;
    let mut from_stops = vec![];
    let mut to_stops = vec![];
    for (line, row) in &rows {
        from_stops.push(TransitStop {
            id: parse_id(path, *line, row, "from_stop_id")?,
            pos: parse_pos(path, *line, row, "from_lat", "from_lon")?,
        });
        to_stops.push(TransitStop {
            id: parse_id(path, *line, row, "to_stop_id")?,
            pos: parse_pos(path, *line, row, "to_lat", "to_lon")?,
        });
    }

    let stops: Vec<TransitStop> = from_stops.into_iter()
                                            .chain(to_stops.into_iter())
                                            .unique_by(|stop| stop.id.clone())
                                            .collect();
    log::debug!("{} stop pairs gave {} unique stops", rows.len(), stops.len());
    Ok(stops)
}
