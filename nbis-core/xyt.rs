//! Fixed-capacity `(x, y, theta)` interchange format consumed by matchers.
//!
//! Conversion into the interchange record always keeps the earliest-found
//! minutiae when the input exceeds capacity; it never reorders by quality.

use serde_json::{Map, Value, json};
use tracing::debug;

use crate::error::{NbisError, NbisResult};
use crate::minutia::FeatureSet;

/// Global capacity of an [`XytRecord`].
pub const MAX_BOZORTH_MINUTIAE: usize = 200;

/// Three parallel columns plus a valid-row count.
///
/// Slots at or past `count` are never exposed.
#[derive(Debug, Clone)]
pub struct XytRecord {
    xcol: [i32; MAX_BOZORTH_MINUTIAE],
    ycol: [i32; MAX_BOZORTH_MINUTIAE],
    thetacol: [i32; MAX_BOZORTH_MINUTIAE],
    count: usize,
}

/// One interchange row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XytRow {
    pub x: i32,
    pub y: i32,
    pub theta: i32,
}

impl PartialEq for XytRecord {
    fn eq(&self, other: &Self) -> bool {
        self.xs() == other.xs() && self.ys() == other.ys() && self.thetas() == other.thetas()
    }
}

impl Eq for XytRecord {}

impl Default for XytRecord {
    fn default() -> Self {
        Self::empty()
    }
}

impl XytRecord {
    pub fn empty() -> Self {
        Self {
            xcol: [0; MAX_BOZORTH_MINUTIAE],
            ycol: [0; MAX_BOZORTH_MINUTIAE],
            thetacol: [0; MAX_BOZORTH_MINUTIAE],
            count: 0,
        }
    }

    /// Build from rows, keeping at most `capacity` of them in order.
    pub fn from_rows<I>(rows: I, capacity: usize) -> Self
    where
        I: IntoIterator<Item = XytRow>,
    {
        let cap = capacity.min(MAX_BOZORTH_MINUTIAE);
        let mut rec = Self::empty();
        for row in rows.into_iter().take(cap) {
            rec.push_unchecked(row);
        }
        rec
    }

    fn push_unchecked(&mut self, row: XytRow) {
        let i = self.count;
        self.xcol[i] = row.x;
        self.ycol[i] = row.y;
        self.thetacol[i] = row.theta;
        self.count += 1;
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn xs(&self) -> &[i32] {
        &self.xcol[..self.count]
    }

    pub fn ys(&self) -> &[i32] {
        &self.ycol[..self.count]
    }

    pub fn thetas(&self) -> &[i32] {
        &self.thetacol[..self.count]
    }

    pub fn row(&self, i: usize) -> Option<XytRow> {
        (i < self.count).then(|| XytRow {
            x: self.xcol[i],
            y: self.ycol[i],
            theta: self.thetacol[i],
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = XytRow> + '_ {
        (0..self.count).map(move |i| XytRow {
            x: self.xcol[i],
            y: self.ycol[i],
            theta: self.thetacol[i],
        })
    }

    /// Reverse mapping into loose records carrying `x`, `y` and `direction`.
    pub fn to_records(&self) -> Vec<Value> {
        self.rows()
            .map(|r| json!({ "x": r.x, "y": r.y, "direction": r.theta }))
            .collect()
    }

    /// Parse the NIST text layout: one `x y theta [quality]` row per line.
    pub fn parse_xyt_text(text: &str, capacity: usize) -> NbisResult<Self> {
        check_capacity(capacity)?;
        let mut rows = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 3 || fields.len() > 4 {
                return Err(NbisError::InvalidInput(format!(
                    "xyt line {}: expected 3 or 4 columns, got {}",
                    lineno + 1,
                    fields.len()
                )));
            }
            let parse = |s: &str| {
                s.parse::<i32>().map_err(|_| {
                    NbisError::InvalidInput(format!(
                        "xyt line {}: '{}' is not an integer",
                        lineno + 1,
                        s
                    ))
                })
            };
            rows.push(XytRow {
                x: parse(fields[0])?,
                y: parse(fields[1])?,
                theta: parse(fields[2])?,
            });
        }
        if rows.len() > capacity {
            debug!("xyt text has {} rows, keeping first {}", rows.len(), capacity);
        }
        Ok(Self::from_rows(rows, capacity))
    }

    pub fn write_xyt_text(&self) -> String {
        let mut out = String::with_capacity(self.count * 12);
        for r in self.rows() {
            out.push_str(&format!("{} {} {}\n", r.x, r.y, r.theta));
        }
        out
    }
}

/// Copy the first `min(len, capacity)` minutiae, in order, into an interchange record.
///
/// Capacity 0 and coordinates past `i32::MAX` are `InvalidInput`.
pub fn to_interchange(features: &FeatureSet, capacity: usize) -> NbisResult<XytRecord> {
    check_capacity(capacity)?;
    if features.len() > capacity {
        debug!(
            "truncating feature set from {} to {} minutiae (keep earliest)",
            features.len(),
            capacity
        );
    }
    let cap = capacity.min(MAX_BOZORTH_MINUTIAE);
    let rows = features
        .iter()
        .take(cap)
        .enumerate()
        .map(|(i, m)| {
            let coord = |v: u32, axis: &str| {
                i32::try_from(v).map_err(|_| {
                    NbisError::InvalidInput(format!("minutia {} {} = {} is out of range", i, axis, v))
                })
            };
            Ok(XytRow {
                x: coord(m.x, "x")?,
                y: coord(m.y, "y")?,
                theta: i32::from(m.direction),
            })
        })
        .collect::<NbisResult<Vec<_>>>()?;
    Ok(XytRecord::from_rows(rows, cap))
}

fn check_capacity(capacity: usize) -> NbisResult<()> {
    if capacity == 0 {
        return Err(NbisError::InvalidInput("capacity must be > 0".into()));
    }
    Ok(())
}

/// Parse loosely-typed records (`x`, `y`, `direction` required) into an interchange record.
///
/// Only the first `capacity` records are read, and all of them are validated
/// before any column is written. Coordinate bounds and direction range are
/// not checked. Capacity 0 is `InvalidInput`.
pub fn from_dict_list(records: &[Value], capacity: usize) -> NbisResult<XytRecord> {
    check_capacity(capacity)?;
    let retained = &records[..records.len().min(capacity.min(MAX_BOZORTH_MINUTIAE))];
    let mut rows = Vec::with_capacity(retained.len());
    for (index, item) in retained.iter().enumerate() {
        let obj = item.as_object().ok_or_else(|| {
            NbisError::InvalidInput(format!("minutia at index {} must be a mapping", index))
        })?;
        rows.push(XytRow {
            x: numeric_field(obj, index, "x")?,
            y: numeric_field(obj, index, "y")?,
            theta: numeric_field(obj, index, "direction")?,
        });
    }
    Ok(XytRecord::from_rows(rows, capacity))
}

fn numeric_field(obj: &Map<String, Value>, index: usize, field: &'static str) -> NbisResult<i32> {
    let value = obj.get(field).ok_or(NbisError::MalformedRecord {
        index,
        field,
        reason: "is missing",
    })?;
    let malformed = |reason| NbisError::MalformedRecord { index, field, reason };
    let wide = if let Some(i) = value.as_i64() {
        i
    } else if let Some(u) = value.as_u64() {
        i64::try_from(u).map_err(|_| malformed("is out of range"))?
    } else if let Some(f) = value.as_f64() {
        if !f.is_finite() {
            return Err(malformed("is not finite"));
        }
        f.trunc() as i64
    } else {
        return Err(malformed("is not numeric"));
    };
    i32::try_from(wide).map_err(|_| malformed("is out of range"))
}
