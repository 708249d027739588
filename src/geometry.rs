use serde::Serialize;

/// A WGS84 position in degrees.
#[derive(PartialEq, Debug, Clone, Copy, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint{lat, lon}
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite() &&
            self.lat.abs() <= 90.0 && self.lon.abs() <= 180.0
    }
}


/// Computes the unweighted mean position of the points.  Returns None if there are no points.
pub fn centroid<'a, II>(points: II) -> Option<GeoPoint>
    where II: IntoIterator<Item = &'a GeoPoint>
{
    let mut count = 0;
    let mut lat_sum = 0.0;
    let mut lon_sum = 0.0;
    for point in points {
        lat_sum += point.lat;
        lon_sum += point.lon;
        count += 1;
    }

    if count == 0 {
        return None;
    }
    Some(GeoPoint::new(lat_sum / count as f64, lon_sum / count as f64))
}
