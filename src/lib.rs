// imports of other modules from this crate
mod geometry;
pub use geometry::{centroid, GeoPoint};

mod config_utils;

mod config;
pub use config::{DashboardConfig, MapSettings};

mod sites;
pub use sites::{DemandPoint, Facility, FacilityType, SiteData, StartupDataError, TransitStop};

mod metrics;
pub use metrics::{estimate, EstimateError, Metrics, MetricsRecord, MetricsTable, Totals};

mod selection;
pub use selection::{SelectionOrder, DEFAULT_SEED};

mod dashboard;
pub use dashboard::{Dashboard, ATLANTA_CENTER};

pub mod render;
pub use render::{render, LayerKind, LayerToggles, MapView, MetricsView, PointLayer};

pub mod server;

pub mod cli;

#[cfg(test)]
mod test_utils;
