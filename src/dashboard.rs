use std::collections::HashMap;

use super::config::{DashboardConfig, MapSettings};
use super::geometry::{self, GeoPoint};
use super::metrics::{self, EstimateError, Metrics, MetricsTable, Totals};
use super::selection::SelectionOrder;
use super::sites::{Facility, SiteData, StartupDataError};


/// Falls back to downtown Atlanta when there's nothing to centre on.
pub static ATLANTA_CENTER: GeoPoint = GeoPoint{lat: 33.7490, lon: -84.3880};

/// All of the state the dashboard serves from.  It's built once before the server starts and is
/// never modified afterwards.
pub struct Dashboard {
    pub sites: SiteData,
    pub selection: SelectionOrder,
    pub table: MetricsTable,
    pub totals: Totals,
    pub center: GeoPoint,
    pub zoom: f64,
    pub map_style: String,
    pub max_p: u32,
    saturation_point: Option<u32>,
    candidate_idxs_by_id: HashMap<String, usize>,
}

impl Dashboard {
    pub fn from_config(config: &DashboardConfig) -> Result<Dashboard, StartupDataError> {
        let sites = SiteData::from_csvs(&config.demand_path, &config.facilities_path,
                                        &config.transit_edges_path)?;
        Self::new(sites, config.metrics_table.clone(), config.seed, config.max_p,
                  config.baseline_time, &config.map)
    }

    pub fn new(sites: SiteData, table: MetricsTable, seed: u64, max_p: u32,
               baseline_time: Option<f64>, map: &MapSettings)
               -> Result<Dashboard, StartupDataError> {
        if max_p < table.min_key() || max_p > table.max_key() {
            return Err(StartupDataError::Config(format!(
                "max_p {} is outside the metrics table's range [{}, {}]",
                max_p, table.min_key(), table.max_key())));
        }

        // these allow looking up a candidate facility from its id.
        let mut candidate_idxs_by_id = HashMap::new();
        for (ii, facility) in sites.candidates.iter().enumerate() {
            if candidate_idxs_by_id.insert(facility.id.clone(), ii).is_some() {
                return Err(StartupDataError::Config(format!(
                    "candidate facility id {} appears more than once", facility.id)));
            }
        }

        let selection = SelectionOrder::from_candidates(&sites.candidates, seed, max_p as usize);
        log::debug!("selection order: {:?}", selection.selected_for(max_p as usize));

        let baseline_time = match baseline_time {
            Some(bt) => bt,
            None => table.get(table.min_key()).map(|rec| rec.time).unwrap_or(0.0),
        };
        let totals = Totals {
            total_tracts: sites.demand.len() as u32,
            total_hunv: sites.total_weight() as u64,
            baseline_time,
        };
        let saturation_point = table.saturation_point(totals.total_tracts);

        let center = match map.center {
            Some(center) => center,
            None => geometry::centroid(sites.demand.iter().map(|dp| &dp.pos))
                    .unwrap_or(ATLANTA_CENTER),
        };

        Ok(Dashboard {
            sites,
            selection,
            table,
            totals,
            center,
            zoom: map.zoom,
            map_style: map.style.clone(),
            max_p,
            saturation_point,
            candidate_idxs_by_id,
        })
    }

    pub fn min_p(&self) -> u32 {
        self.table.min_key()
    }

    pub fn get_candidate_by_id(&self, id: &str) -> Option<&Facility> {
        match self.candidate_idxs_by_id.get(id) {
            Some(idx) => self.sites.candidates.get(*idx),
            None => None,
        }
    }

    /// The facilities opened for p, in the order they were selected.
    pub fn selected_facilities(&self, p: usize) -> Vec<&Facility> {
        self.selection.selected_for(p).iter()
                      .filter_map(|id| self.get_candidate_by_id(id))
                      .collect()
    }

    /// The metrics for p.  p must lie on the slider, which may stop short of the table's last key.
    pub fn estimate(&self, p: i64) -> Result<Metrics, EstimateError> {
        if p > self.max_p as i64 {
            return Err(EstimateError::OutOfRange{p, min: self.min_p(), max: self.max_p});
        }
        metrics::estimate(p, &self.table, &self.totals)
    }

    /// The smallest p that serves every tract, if any does.
    pub fn saturation_point(&self) -> Option<u32> {
        self.saturation_point
    }
}


#[cfg(test)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_ulps_eq};
    use super::*;
    use super::super::metrics::MetricsRecord;
    use super::super::test_utils::make_sites;

    fn make_dashboard(num_candidates: usize) -> Dashboard {
        Dashboard::new(make_sites(num_candidates), MetricsTable::atlanta(), 42, 57, None,
                       &MapSettings::default()).unwrap()
    }

    #[test]
    fn test_totals() {
        let dashboard = make_dashboard(60);
        assert_eq!(dashboard.totals.total_tracts, 57);
        assert_eq!(dashboard.totals.total_hunv, 57 * 250);
        assert_ulps_eq!(dashboard.totals.baseline_time, 48.02);
        assert_eq!(dashboard.saturation_point(), Some(40));
    }

    #[test]
    fn test_selected_facilities_follow_order() {
        let dashboard = make_dashboard(60);
        let selected = dashboard.selected_facilities(10);
        assert_eq!(selected.len(), 10);
        for (facility, id) in selected.iter().zip(dashboard.selection.selected_for(10)) {
            assert_eq!(&facility.id, id);
        }
    }

    #[test]
    fn test_center_defaults_to_demand_centroid() {
        let dashboard = make_dashboard(5);
        assert_abs_diff_eq!(dashboard.center.lon, -84.4, epsilon = 1e-9);
        assert!(dashboard.center.lat > 33.7 && dashboard.center.lat < 33.76);

        let empty = Dashboard::new(SiteData::default(), MetricsTable::atlanta(), 42, 57, None,
                                   &MapSettings::default()).unwrap();
        assert_eq!(empty.center, ATLANTA_CENTER);
        assert_eq!(empty.saturation_point(), None);
    }

    #[test]
    fn test_max_p_beyond_table() {
        let small = MetricsTable::new(vec![
            (0, MetricsRecord::new(10.0, 0, 0)),
            (5, MetricsRecord::new(8.0, 3, 30)),
        ]).unwrap();
        let result = Dashboard::new(make_sites(10), small, 42, 57, None, &MapSettings::default());
        assert!(matches!(result, Err(StartupDataError::Config(_))));
    }

    #[test]
    fn test_duplicate_candidate_ids() {
        let mut sites = make_sites(3);
        sites.candidates[2].id = sites.candidates[0].id.clone();
        let result = Dashboard::new(sites, MetricsTable::atlanta(), 42, 57, None,
                                    &MapSettings::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_estimate_stops_at_max_p() {
        let dashboard = Dashboard::new(make_sites(60), MetricsTable::atlanta(), 42, 30, None,
                                       &MapSettings::default()).unwrap();
        assert!(dashboard.estimate(30).is_ok());
        assert_eq!(dashboard.estimate(45).unwrap_err(),
                   EstimateError::OutOfRange{p: 45, min: 0, max: 30});
        assert_eq!(dashboard.estimate(-1).unwrap_err(),
                   EstimateError::OutOfRange{p: -1, min: 0, max: 57});
    }

    #[test]
    fn test_explicit_baseline() {
        let dashboard = Dashboard::new(make_sites(5), MetricsTable::atlanta(), 42, 57, Some(50.0),
                                       &MapSettings::default()).unwrap();
        let metrics = dashboard.estimate(0).unwrap();
        assert_ulps_eq!(metrics.improvement, 50.0 - 48.02);
    }
}
