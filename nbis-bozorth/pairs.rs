//! Rotation- and translation-invariant pair tables.

use nbis_core::XytRow;

use crate::params::BozorthParams;

#[inline]
pub fn normalize_degrees(a: f64) -> f64 {
    a.rem_euclid(360.0)
}

/// Circular distance between two angles in degrees, `[0, 180]`.
#[inline]
pub fn angle_distance(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

/// Minutia position in a y-up frame, with its direction in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
}

impl From<XytRow> for Point {
    fn from(row: XytRow) -> Self {
        Self {
            x: row.x as f64,
            y: -(row.y as f64),
            theta: normalize_degrees(row.theta as f64),
        }
    }
}

/// One tabled pair `(k, j)`, `k < j`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairEntry {
    pub distance: f64,
    /// Direction of the segment from `k` to `j`.
    pub line: f64,
    /// Direction of `k` relative to the segment.
    pub beta_k: f64,
    /// Direction of `j` relative to the segment.
    pub beta_j: f64,
    pub k: u16,
    pub j: u16,
}

/// All qualifying pairs of one print, sorted by ascending length.
#[derive(Debug, Clone, Default)]
pub struct PairTable {
    points: Vec<Point>,
    entries: Vec<PairEntry>,
}

impl PairTable {
    pub fn build(rows: &[XytRow], params: &BozorthParams) -> Self {
        let points: Vec<Point> = rows.iter().copied().map(Point::from).collect();
        let mut entries = Vec::new();
        for k in 0..points.len() {
            for j in (k + 1)..points.len() {
                let (a, b) = (points[k], points[j]);
                let dx = b.x - a.x;
                let dy = b.y - a.y;
                let distance = (dx * dx + dy * dy).sqrt();
                if distance < params.min_distance || distance > params.max_distance {
                    continue;
                }
                let line = normalize_degrees(dy.atan2(dx).to_degrees());
                entries.push(PairEntry {
                    distance,
                    line,
                    beta_k: normalize_degrees(a.theta - line),
                    beta_j: normalize_degrees(b.theta - line),
                    k: k as u16,
                    j: j as u16,
                });
            }
        }
        // Stable: equal lengths stay in (k, j) order.
        entries.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        entries.truncate(params.max_pairs);
        Self { points, entries }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn entries(&self) -> &[PairEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the first entry at least `distance` long.
    pub fn lower_bound(&self, distance: f64) -> usize {
        self.entries.partition_point(|e| e.distance < distance)
    }
}
