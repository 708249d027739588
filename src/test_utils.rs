use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::geometry::GeoPoint;
use super::sites::{DemandPoint, Facility, FacilityType, SiteData, TransitStop};


/// Writes a csv file into the given directory and returns its path.
pub fn write_csv(dir: &Path, name: &str, contents: &str) -> std::io::Result<PathBuf> {
    let path = dir.join(name);
    let mut file = File::create(&path)?;
    file.write_all(contents.as_bytes())?;
    Ok(path)
}

/// Candidate facilities laid out along a line, with ids "C0", "C1", ...
pub fn make_candidates(count: usize) -> Vec<Facility> {
    (0..count).map(|ii| Facility {
        id: format!("C{}", ii),
        pos: GeoPoint::new(33.6 + 0.005 * ii as f64, -84.5 + 0.004 * ii as f64),
        facility_type: FacilityType::Candidate,
    }).collect()
}

/// A small site table with 57 tracts, so that the Atlanta metrics table saturates.
pub fn make_sites(num_candidates: usize) -> SiteData {
    let demand = (0..57).map(|ii| DemandPoint {
        id: format!("D{}", ii),
        pos: GeoPoint::new(33.7 + 0.001 * ii as f64, -84.4),
        weight: 250.0,
    }).collect();
    let existing = (0..3).map(|ii| Facility {
        id: format!("E{}", ii),
        pos: GeoPoint::new(33.8, -84.3 - 0.01 * ii as f64),
        facility_type: FacilityType::Existing,
    }).collect();
    let stops = (0..4).map(|ii| TransitStop {
        id: format!("{}", 900 + ii),
        pos: GeoPoint::new(33.75, -84.39 + 0.002 * ii as f64),
    }).collect();

    SiteData {
        demand,
        existing,
        candidates: make_candidates(num_candidates),
        stops,
    }
}
