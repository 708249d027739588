use std::collections::HashSet;

use serde::Serialize;

use super::dashboard::Dashboard;
use super::geometry::GeoPoint;
use super::metrics::{EstimateError, Metrics};


static COLOR_FOOD_DESERT: &str = "#FF6B6B";
static COLOR_EXISTING_STORE: &str = "#FFA500";
static COLOR_NEW_FACILITY: &str = "#FFD700";
static COLOR_TRANSIT_STOP: &str = "#4A4A4A";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    FoodDeserts,
    Existing,
    Marta,
    New,
}

impl LayerKind {
    /// In the order they're listed in the controls.
    pub const ALL: [LayerKind; 4] =
        [LayerKind::FoodDeserts, LayerKind::Existing, LayerKind::Marta, LayerKind::New];

    pub fn tag(&self) -> &'static str {
        match self {
            LayerKind::FoodDeserts => "food_deserts",
            LayerKind::Existing => "existing",
            LayerKind::Marta => "marta",
            LayerKind::New => "new",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LayerKind::FoodDeserts => "Food Desert Centroids",
            LayerKind::Existing => "Existing Supermarkets",
            LayerKind::Marta => "MARTA Stops",
            LayerKind::New => "New Facilities",
        }
    }

    pub fn from_tag(tag: &str) -> Option<LayerKind> {
        LayerKind::ALL.iter().copied().find(|kind| kind.tag() == tag)
    }

    pub fn on_by_default(&self) -> bool {
        *self != LayerKind::Marta
    }
}

/// Which layers the user wants drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerToggles {
    active: HashSet<LayerKind>,
}

impl Default for LayerToggles {
    fn default() -> Self {
        LayerKind::ALL.iter().copied().filter(|kind| kind.on_by_default()).collect()
    }
}

impl std::iter::FromIterator<LayerKind> for LayerToggles {
    fn from_iter<II: IntoIterator<Item = LayerKind>>(iter: II) -> Self {
        LayerToggles{active: iter.into_iter().collect()}
    }
}

impl LayerToggles {
    pub fn none() -> LayerToggles {
        LayerToggles{active: HashSet::new()}
    }

    pub fn all() -> LayerToggles {
        LayerKind::ALL.iter().copied().collect()
    }

    /// Parses a comma-separated list of layer tags.  An empty string means no layers.
    pub fn parse(tags: &str) -> Result<LayerToggles, String> {
        let mut active = HashSet::new();
        for tag in tags.split(',').map(|tt| tt.trim()).filter(|tt| !tt.is_empty()) {
            match LayerKind::from_tag(tag) {
                Some(kind) => { active.insert(kind); }
                None => return Err(format!("unknown layer {:?}", tag)),
            }
        }
        Ok(LayerToggles{active})
    }

    pub fn contains(&self, kind: LayerKind) -> bool {
        self.active.contains(&kind)
    }

    pub fn with(mut self, kind: LayerKind) -> LayerToggles {
        self.active.insert(kind);
        self
    }

    pub fn without(mut self, kind: LayerKind) -> LayerToggles {
        self.active.remove(&kind);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outline {
    pub width: f64,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerStyle {
    pub size: f64,
    pub color: &'static str,
    pub opacity: f64,
    pub symbol: Option<&'static str>,
    pub outline: Option<Outline>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointLayer {
    pub kind: LayerKind,
    pub name: String,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    pub ids: Vec<String>,
    pub marker: MarkerStyle,
    // None means the layer shows nothing on hover
    pub hover_text: Option<Vec<String>>,
    // text drawn on top of each marker
    pub labels: Option<Vec<String>>,
}

impl PointLayer {
    fn new<'a, II>(kind: LayerKind, name: String, marker: MarkerStyle, points: II) -> PointLayer
        where II: IntoIterator<Item = (&'a str, &'a GeoPoint)>
    {
        let mut layer = PointLayer {
            kind,
            name,
            lat: vec![],
            lon: vec![],
            ids: vec![],
            marker,
            hover_text: None,
            labels: None,
        };
        for (id, pos) in points {
            layer.lat.push(pos.lat);
            layer.lon.push(pos.lon);
            layer.ids.push(String::from(id));
        }
        layer
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub center: GeoPoint,
    pub zoom: f64,
    pub style: String,
    pub layers: Vec<PointLayer>,
}

impl MapView {
    pub fn layer(&self, kind: LayerKind) -> Option<&PointLayer> {
        self.layers.iter().find(|ll| ll.kind == kind)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressBar {
    pub label: &'static str,
    pub text: String,
    pub value: f64,
    pub max: f64,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsView {
    pub heading: String,
    pub avg_time: String,
    pub improvement: String,
    pub tracts: ProgressBar,
    pub households: ProgressBar,
    pub baseline_note: String,
    pub saturation_note: Option<String>,
    pub metrics: Metrics,
}

/// Builds the map and metrics panel for p facilities and the given layers.  This is the whole
/// of the dashboard's per-request work.
pub fn render(p: i64, toggles: &LayerToggles, dashboard: &Dashboard)
              -> Result<(MapView, MetricsView), EstimateError> {
    let metrics = dashboard.estimate(p)?;
    // estimate rejects negative p
    let p = p as usize;

    let mut layers = vec![];

    if toggles.contains(LayerKind::Marta) {
        let marker = MarkerStyle {
            size: 3.0,
            color: COLOR_TRANSIT_STOP,
            opacity: 0.3,
            symbol: None,
            outline: None,
        };
        let stops = dashboard.sites.stops.iter().map(|ss| (ss.id.as_str(), &ss.pos));
        layers.push(PointLayer::new(LayerKind::Marta, String::from("MARTA Stops"), marker, stops));
    }

    if toggles.contains(LayerKind::Existing) {
        let existing = &dashboard.sites.existing;
        let marker = MarkerStyle {
            size: 6.0,
            color: COLOR_EXISTING_STORE,
            opacity: 1.0,
            symbol: None,
            outline: None,
        };
        let name = format!("Existing Stores (n={})", existing.len());
        let mut layer = PointLayer::new(LayerKind::Existing, name, marker,
                                        existing.iter().map(|ff| (ff.id.as_str(), &ff.pos)));
        layer.hover_text = Some(existing.iter().map(|ff| {
            format!("<b>Existing Store</b><br>ID: {}", escape_html(&ff.id))
        }).collect());
        layers.push(layer);
    }

    if toggles.contains(LayerKind::FoodDeserts) {
        let demand = &dashboard.sites.demand;
        let marker = MarkerStyle {
            size: 10.0,
            color: COLOR_FOOD_DESERT,
            opacity: 1.0,
            symbol: Some("diamond"),
            outline: Some(Outline{width: 1.0, color: "white"}),
        };
        let name = format!("Food Deserts (n={})", demand.len());
        let mut layer = PointLayer::new(LayerKind::FoodDeserts, name, marker,
                                        demand.iter().map(|dp| (dp.id.as_str(), &dp.pos)));
        layer.hover_text = Some(demand.iter().map(|dp| {
            format!("<b>Food Desert Tract</b><br>ID: {}<br>HUNV: {}", escape_html(&dp.id),
                    dp.weight)
        }).collect());
        layers.push(layer);
    }

    if toggles.contains(LayerKind::New) && p > 0 {
        let selected = dashboard.selected_facilities(p);
        let marker = MarkerStyle {
            size: 15.0,
            color: COLOR_NEW_FACILITY,
            opacity: 1.0,
            symbol: Some("star"),
            outline: Some(Outline{width: 2.0, color: "black"}),
        };
        let name = format!("New Facilities (p={})", p);
        let mut layer = PointLayer::new(LayerKind::New, name, marker,
                                        selected.iter().map(|ff| (ff.id.as_str(), &ff.pos)));
        layer.labels = Some((1..=selected.len()).map(|rank| rank.to_string()).collect());
        layer.hover_text = Some(selected.iter().enumerate().map(|(ii, ff)| {
            format!("<b>New Facility #{}</b><br>ID: {}", ii + 1, escape_html(&ff.id))
        }).collect());
        layers.push(layer);
    }

    let map = MapView {
        center: dashboard.center,
        zoom: dashboard.zoom,
        style: dashboard.map_style.clone(),
        layers,
    };

    Ok((map, metrics_view(p, metrics, dashboard.saturation_point())))
}

/// Hover text is drawn as HTML, so ids from the data files are escaped before going into it.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for cc in text.chars() {
        match cc {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(cc),
        }
    }
    escaped
}

fn metrics_view(p: usize, metrics: Metrics, saturation_point: Option<u32>) -> MetricsView {
    let tracts = ProgressBar {
        label: "Census Tracts Served:",
        text: format!("{} / {}", metrics.tracts_served, metrics.total_tracts),
        value: metrics.tracts_served as f64,
        max: metrics.total_tracts as f64,
        color: "info",
    };
    let households = ProgressBar {
        label: "Households (HUNV) Served:",
        text: format!("{} / {}", with_thousands_sep(metrics.hunv_served as u64),
                      with_thousands_sep(metrics.total_hunv)),
        value: metrics.hunv_served as f64,
        max: metrics.total_hunv as f64,
        color: "success",
    };

    MetricsView {
        heading: format!("Facilities Added: {}", p),
        avg_time: format!("{:.2} min", metrics.weighted_avg_time),
        improvement: format!("{:.2} min ({:.1}%)", metrics.improvement, metrics.improvement_pct),
        tracts,
        households,
        baseline_note: format!("Baseline: {:.2} min (no new facilities)", metrics.baseline_time),
        saturation_note: saturation_point.map(|sp| {
            format!("Phase transition at p={} (all tracts served)", sp)
        }),
        metrics,
    }
}

/// Formats 14232 as "14,232".
pub fn with_thousands_sep(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (ii, ch) in digits.chars().enumerate() {
        if ii > 0 && (digits.len() - ii) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
