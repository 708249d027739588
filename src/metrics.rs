use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;


#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimateError {
    #[error("p = {p} is outside the range [{min}, {max}]")]
    OutOfRange { p: i64, min: u32, max: u32 },
    #[error("the metrics table has no entries")]
    EmptyTable,
    #[error("the metrics table has more than one entry for p = {0}")]
    DuplicateKey(u32),
    #[error("the metrics table gets worse at p = {0}")]
    NonMonotone(u32),
    #[error("the metrics table's time at p = {0} is not a finite number")]
    NonFiniteTime(u32),
}

/// One row of the precomputed results: average travel time in minutes, and how many tracts and
/// households are served.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsRecord {
    pub time: f64,
    pub tracts: u32,
    pub hunv: u32,
}

impl MetricsRecord {
    pub fn new(time: f64, tracts: u32, hunv: u32) -> MetricsRecord {
        MetricsRecord{time, tracts, hunv}
    }
}

/// Precomputed results for a sparse set of facility counts.  Entries are kept sorted by key, and
/// every entry is at least as good as the one before it.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsTable {
    entries: BTreeMap<u32, MetricsRecord>,
}

impl MetricsTable {
    pub fn new(entries: Vec<(u32, MetricsRecord)>) -> Result<MetricsTable, EstimateError> {
        if entries.is_empty() {
            return Err(EstimateError::EmptyTable);
        }

        let mut map = BTreeMap::new();
        for (key, record) in entries {
            if !record.time.is_finite() {
                return Err(EstimateError::NonFiniteTime(key));
            }
            if map.insert(key, record).is_some() {
                return Err(EstimateError::DuplicateKey(key));
            }
        }

        for ((_, prev), (key, next)) in map.iter().zip(map.iter().skip(1)) {
            if next.time > prev.time || next.tracts < prev.tracts || next.hunv < prev.hunv {
                return Err(EstimateError::NonMonotone(*key));
            }
        }

        Ok(MetricsTable{entries: map})
    }

    /// Results of the Atlanta food desert run.
    pub fn atlanta() -> MetricsTable {
        let entries = vec![
            (0, MetricsRecord::new(48.02, 0, 0)),
            (1, MetricsRecord::new(45.41, 2, 1220)),
            (2, MetricsRecord::new(43.04, 4, 1890)),
            (5, MetricsRecord::new(38.29, 11, 4427)),
            (10, MetricsRecord::new(33.86, 21, 7266)),
            (15, MetricsRecord::new(30.31, 31, 9273)),
            (20, MetricsRecord::new(27.87, 38, 11072)),
            (30, MetricsRecord::new(25.14, 49, 13349)),
            (40, MetricsRecord::new(23.01, 57, 14232)),
            (50, MetricsRecord::new(20.83, 57, 14232)),
            (57, MetricsRecord::new(20.00, 57, 14232)),
        ];
        MetricsTable {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn min_key(&self) -> u32 {
        // the constructors guarantee at least one entry
        self.entries.keys().next().copied().unwrap_or(0)
    }

    pub fn max_key(&self) -> u32 {
        self.entries.keys().next_back().copied().unwrap_or(0)
    }

    pub fn get(&self, key: u32) -> Option<&MetricsRecord> {
        self.entries.get(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&u32, &MetricsRecord)> {
        self.entries.iter()
    }

    /// Looks up the record for p, interpolating linearly between the nearest keys on either side.
    /// Tract and household counts are truncated towards zero.
    pub fn lookup(&self, p: i64) -> Result<MetricsRecord, EstimateError> {
        let (min, max) = (self.min_key(), self.max_key());
        if p < min as i64 || p > max as i64 {
            return Err(EstimateError::OutOfRange{p, min, max});
        }
        let p = p as u32;

        if let Some(record) = self.entries.get(&p) {
            return Ok(*record);
        }

        // p is strictly between two keys, so both of these exist
        let (lower, lo_rec) = match self.entries.range(..p).next_back() {
            Some(entry) => entry,
            None => return Err(EstimateError::OutOfRange{p: p as i64, min, max}),
        };
        let (upper, up_rec) = match self.entries.range(p..).next() {
            Some(entry) => entry,
            None => return Err(EstimateError::OutOfRange{p: p as i64, min, max}),
        };

        let ratio = if upper == lower {
            0.0
        } else {
            (p - lower) as f64 / (upper - lower) as f64
        };
        let lerp = |aa: f64, bb: f64| aa + ratio * (bb - aa);

        Ok(MetricsRecord {
            time: lerp(lo_rec.time, up_rec.time),
            tracts: lerp(lo_rec.tracts as f64, up_rec.tracts as f64) as u32,
            hunv: lerp(lo_rec.hunv as f64, up_rec.hunv as f64) as u32,
        })
    }

    /// The smallest facility count at which every tract is served, if there is one.
    pub fn saturation_point(&self, total_tracts: u32) -> Option<u32> {
        if total_tracts == 0 {
            return None;
        }
        (self.min_key()..=self.max_key()).find(|pp| {
            match self.lookup(*pp as i64) {
                Ok(record) => record.tracts >= total_tracts,
                Err(_) => false,
            }
        })
    }
}

/// Fixed quantities the per-p metrics are measured against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Totals {
    pub total_tracts: u32,
    pub total_hunv: u64,
    pub baseline_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub weighted_avg_time: f64,
    pub tracts_served: u32,
    pub hunv_served: u32,
    pub improvement: f64,
    pub improvement_pct: f64,
    pub total_tracts: u32,
    pub total_hunv: u64,
    pub baseline_time: f64,
}

pub fn estimate(p: i64, table: &MetricsTable, totals: &Totals) -> Result<Metrics, EstimateError> {
    let record = table.lookup(p)?;
    let improvement = totals.baseline_time - record.time;
    let improvement_pct = if totals.baseline_time == 0.0 {
        0.0
    } else {
        improvement / totals.baseline_time * 100.0
    };

    Ok(Metrics {
        weighted_avg_time: record.time,
        tracts_served: record.tracts,
        hunv_served: record.hunv,
        improvement,
        improvement_pct,
        total_tracts: totals.total_tracts,
        total_hunv: totals.total_hunv,
        baseline_time: totals.baseline_time,
    })
}
