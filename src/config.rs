use std::convert::TryFrom;
use std::path::{Path, PathBuf};

use yaml_rust::{Yaml, YamlLoader};

use super::config_utils;
use super::geometry::GeoPoint;
use super::metrics::{MetricsRecord, MetricsTable};
use super::selection::DEFAULT_SEED;
use super::sites::StartupDataError;


pub static DEFAULT_MAX_P: u32 = 57;
pub static DEFAULT_ZOOM: f64 = 9.5;
pub static DEFAULT_MAP_STYLE: &str = "carto-positron";

#[derive(Debug, Clone, PartialEq)]
pub struct MapSettings {
    // if not given, the map is centred on the demand points
    pub center: Option<GeoPoint>,
    pub zoom: f64,
    pub style: String,
}

impl Default for MapSettings {
    fn default() -> Self {
        MapSettings {
            center: None,
            zoom: DEFAULT_ZOOM,
            style: String::from(DEFAULT_MAP_STYLE),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub demand_path: PathBuf,
    pub facilities_path: PathBuf,
    pub transit_edges_path: PathBuf,
    pub seed: u64,
    pub max_p: u32,
    pub baseline_time: Option<f64>,
    pub map: MapSettings,
    pub metrics_table: MetricsTable,
}

impl DashboardConfig {
    pub fn from_file(path: &Path) -> Result<DashboardConfig, StartupDataError> {
        let file_contents = std::fs::read_to_string(path).map_err(|source| {
            StartupDataError::Io{path: path.to_path_buf(), source}
        })?;
        let config_dir = path.parent().unwrap_or_else(|| Path::new("."));
        log::info!("Reading config from {}", path.display());
        Self::from_yaml_str(&file_contents, config_dir)
    }

    /// Parses a yaml config.  Relative data paths are taken relative to config_dir.
    pub fn from_yaml_str(contents: &str, config_dir: &Path)
                         -> Result<DashboardConfig, StartupDataError> {
        let yaml_cfgs = YamlLoader::load_from_str(contents).map_err(|err| {
            StartupDataError::Config(format!("not valid yaml: {}", err))
        })?;
        let yaml_cfg = match yaml_cfgs.first() {
            Some(cfg) => cfg,
            None => return Err(StartupDataError::Config(String::from("config is empty"))),
        };

        let demand_path = config_utils::required_str(yaml_cfg, "demand_path")?;
        let demand_path = config_utils::str_to_absolute_path(demand_path, config_dir);

        let facilities_path = config_utils::required_str(yaml_cfg, "facilities_path")?;
        let facilities_path = config_utils::str_to_absolute_path(facilities_path, config_dir);

        let transit_edges_path = config_utils::required_str(yaml_cfg, "transit_edges_path")?;
        let transit_edges_path = config_utils::str_to_absolute_path(transit_edges_path,
                                                                    config_dir);

        let max_p = match config_utils::optional_u64(yaml_cfg, "max_p")? {
            Some(mp) => to_u32(mp, "max_p")?,
            None => DEFAULT_MAX_P,
        };

        let metrics_table = if yaml_cfg["metrics_table"].is_badvalue() {
            MetricsTable::atlanta()
        } else {
            parse_metrics_table(&yaml_cfg["metrics_table"])?
        };

        Ok(DashboardConfig {
            demand_path,
            facilities_path,
            transit_edges_path,
            seed: config_utils::optional_u64(yaml_cfg, "seed")?.unwrap_or(DEFAULT_SEED),
            max_p,
            baseline_time: config_utils::optional_f64(yaml_cfg, "baseline_time")?,
            map: parse_map_settings(&yaml_cfg["map"])?,
            metrics_table,
        })
    }
}

fn parse_map_settings(yaml_cfg: &Yaml) -> Result<MapSettings, StartupDataError> {
    let mut settings = MapSettings::default();
    if yaml_cfg.is_badvalue() {
        return Ok(settings);
    }

    let lat = config_utils::optional_f64(yaml_cfg, "center_lat")?;
    let lon = config_utils::optional_f64(yaml_cfg, "center_lon")?;
    settings.center = match (lat, lon) {
        (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
        (None, None) => None,
        _ => return Err(StartupDataError::Config(
            String::from("map center needs both center_lat and center_lon"))),
    };
    if let Some(zoom) = config_utils::optional_f64(yaml_cfg, "zoom")? {
        settings.zoom = zoom;
    }
    if let Some(style) = yaml_cfg["style"].as_str() {
        settings.style = String::from(style);
    }
    Ok(settings)
}

fn parse_metrics_table(yaml_cfg: &Yaml) -> Result<MetricsTable, StartupDataError> {
    let rows = match yaml_cfg.as_vec() {
        Some(rows) => rows,
        None => return Err(StartupDataError::Config(
            String::from("metrics_table must be a list"))),
    };

    let mut entries = vec![];
    for row in rows {
        let key = config_utils::optional_u64(row, "p")?;
        let time = config_utils::optional_f64(row, "time")?;
        let tracts = config_utils::optional_u64(row, "tracts")?;
        let hunv = config_utils::optional_u64(row, "hunv")?;
        match (key, time, tracts, hunv) {
            (Some(key), Some(time), Some(tracts), Some(hunv)) => {
                let record = MetricsRecord::new(time, to_u32(tracts, "tracts")?,
                                                to_u32(hunv, "hunv")?);
                entries.push((to_u32(key, "p")?, record));
            }
            _ => return Err(StartupDataError::Config(
                String::from("each metrics_table row needs p, time, tracts and hunv"))),
        }
    }
    Ok(MetricsTable::new(entries)?)
}

fn to_u32(value: u64, key: &str) -> Result<u32, StartupDataError> {
    u32::try_from(value).map_err(|_| {
        StartupDataError::Config(format!("{} {} is too big", key, value))
    })
}


#[cfg(test)]
mod tests {
    use approx::assert_ulps_eq;
    use super::*;
    use super::super::metrics::EstimateError;

    #[test]
    fn test_minimal_config() {
        let yaml = r#"
demand_path: demand.csv
facilities_path: /data/facilities.csv
transit_edges_path: edges.csv
"#;
        let cfg = DashboardConfig::from_yaml_str(yaml, Path::new("/srv")).unwrap();
        assert_eq!(cfg.demand_path, PathBuf::from("/srv/demand.csv"));
        assert_eq!(cfg.facilities_path, PathBuf::from("/data/facilities.csv"));
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.max_p, 57);
        assert_eq!(cfg.baseline_time, None);
        assert_eq!(cfg.map, MapSettings::default());
        assert_eq!(cfg.metrics_table, MetricsTable::atlanta());
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
demand_path: demand.csv
facilities_path: facilities.csv
transit_edges_path: edges.csv
seed: 7
max_p: 4
baseline_time: 30
map:
  center_lat: 33.749
  center_lon: -84.388
  zoom: 11
  style: open-street-map
metrics_table:
  - {p: 0, time: 30.0, tracts: 0, hunv: 0}
  - {p: 4, time: 22.5, tracts: 3, hunv: 900}
"#;
        let cfg = DashboardConfig::from_yaml_str(yaml, Path::new("/srv")).unwrap();
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.max_p, 4);
        assert_eq!(cfg.baseline_time, Some(30.0));
        assert_eq!(cfg.map.center, Some(GeoPoint::new(33.749, -84.388)));
        assert_ulps_eq!(cfg.map.zoom, 11.0);
        assert_eq!(cfg.map.style, "open-street-map");
        assert_eq!(cfg.metrics_table.max_key(), 4);
        assert_eq!(cfg.metrics_table.get(4), Some(&MetricsRecord::new(22.5, 3, 900)));
    }

    #[test]
    fn test_missing_path() {
        let yaml = "demand_path: demand.csv\nfacilities_path: facilities.csv\n";
        match DashboardConfig::from_yaml_str(yaml, Path::new("/srv")) {
            Err(StartupDataError::Config(msg)) => assert!(msg.contains("transit_edges_path")),
            other => panic!("expected a config error, got {:?}", other),
        }
    }

    #[test]
    fn test_half_a_center() {
        let yaml = r#"
demand_path: d.csv
facilities_path: f.csv
transit_edges_path: e.csv
map:
  center_lat: 33.7
"#;
        assert!(DashboardConfig::from_yaml_str(yaml, Path::new("/srv")).is_err());
    }

    #[test]
    fn test_non_monotone_table() {
        let yaml = r#"
demand_path: d.csv
facilities_path: f.csv
transit_edges_path: e.csv
metrics_table:
  - {p: 0, time: 30.0, tracts: 0, hunv: 0}
  - {p: 2, time: 31.0, tracts: 1, hunv: 10}
"#;
        match DashboardConfig::from_yaml_str(yaml, Path::new("/srv")) {
            Err(StartupDataError::MetricsTable(_)) => (),
            other => panic!("expected a metrics table error, got {:?}", other),
        }
    }

    #[test]
    fn test_oversized_numbers() {
        // 2^32 would wrap to 0 if it were cast
        let yaml = r#"
demand_path: d.csv
facilities_path: f.csv
transit_edges_path: e.csv
metrics_table:
  - {p: 0, time: 30.0, tracts: 0, hunv: 0}
  - {p: 4294967296, time: 25.0, tracts: 1, hunv: 10}
"#;
        match DashboardConfig::from_yaml_str(yaml, Path::new("/srv")) {
            Err(StartupDataError::Config(msg)) => assert!(msg.contains("4294967296"), "{}", msg),
            other => panic!("expected a config error, got {:?}", other),
        }

        let yaml = r#"
demand_path: d.csv
facilities_path: f.csv
transit_edges_path: e.csv
metrics_table:
  - {p: 0, time: 30.0, tracts: 0, hunv: 4294967296}
"#;
        assert!(matches!(DashboardConfig::from_yaml_str(yaml, Path::new("/srv")),
                         Err(StartupDataError::Config(_))));

        let yaml = r#"
demand_path: d.csv
facilities_path: f.csv
transit_edges_path: e.csv
max_p: 4294967296
"#;
        assert!(matches!(DashboardConfig::from_yaml_str(yaml, Path::new("/srv")),
                         Err(StartupDataError::Config(_))));
    }

    #[test]
    fn test_nan_time() {
        let yaml = r#"
demand_path: d.csv
facilities_path: f.csv
transit_edges_path: e.csv
metrics_table:
  - {p: 0, time: 30.0, tracts: 0, hunv: 0}
  - {p: 2, time: .nan, tracts: 1, hunv: 10}
  - {p: 4, time: 40.0, tracts: 2, hunv: 20}
"#;
        match DashboardConfig::from_yaml_str(yaml, Path::new("/srv")) {
            Err(StartupDataError::MetricsTable(EstimateError::NonFiniteTime(2))) => (),
            other => panic!("expected a non-finite time error, got {:?}", other),
        }
    }
}
