use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Closed classification of a detected minutia.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinutiaType {
    RidgeEnding,
    Bifurcation,
}

impl MinutiaType {
    /// Integer code used in loose records (0 = ending, 1 = bifurcation).
    pub fn code(self) -> i64 {
        match self {
            MinutiaType::RidgeEnding => 0,
            MinutiaType::Bifurcation => 1,
        }
    }

    /// Any code other than 1 reads as a ridge ending, matching the binding's dictionaries.
    pub fn from_code(code: i64) -> Self {
        if code == 1 {
            MinutiaType::Bifurcation
        } else {
            MinutiaType::RidgeEnding
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MinutiaType::RidgeEnding => "ending",
            MinutiaType::Bifurcation => "bifurcation",
        }
    }
}

/// One detected minutia.
///
/// `direction` is in integer degrees `[0, 360)`, counter-clockwise from +x
/// with the y axis pointing up (image rows grow downward, so row offsets are
/// negated). This is the quantization the matcher is calibrated for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Minutia {
    pub x: u32,
    pub y: u32,
    pub direction: u16,
    pub kind: MinutiaType,
    /// Detector confidence, higher is more reliable.
    pub reliability: f64,
}

impl Minutia {
    pub fn new(x: u32, y: u32, direction: u16, kind: MinutiaType, reliability: f64) -> Self {
        Self {
            x,
            y,
            direction: direction % 360,
            kind,
            reliability,
        }
    }

    /// Loose record form: `x`, `y`, `direction`, `type`, `quality`, `type_str`.
    pub fn to_record(&self) -> Value {
        json!({
            "x": self.x,
            "y": self.y,
            "direction": self.direction,
            "type": self.kind.code(),
            "quality": self.reliability,
            "type_str": self.kind.as_str(),
        })
    }
}

/// Minutiae in detection order. Not sorted by quality or position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSet {
    minutiae: Vec<Minutia>,
}

impl FeatureSet {
    pub fn new(minutiae: Vec<Minutia>) -> Self {
        Self { minutiae }
    }

    pub fn len(&self) -> usize {
        self.minutiae.len()
    }

    pub fn is_empty(&self) -> bool {
        self.minutiae.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Minutia> {
        self.minutiae.iter()
    }

    pub fn as_slice(&self) -> &[Minutia] {
        &self.minutiae
    }

    pub fn into_vec(self) -> Vec<Minutia> {
        self.minutiae
    }

    pub fn count_of(&self, kind: MinutiaType) -> usize {
        self.minutiae.iter().filter(|m| m.kind == kind).count()
    }

    pub fn to_records(&self) -> Vec<Value> {
        self.minutiae.iter().map(Minutia::to_record).collect()
    }
}

impl From<Vec<Minutia>> for FeatureSet {
    fn from(minutiae: Vec<Minutia>) -> Self {
        Self::new(minutiae)
    }
}

impl<'a> IntoIterator for &'a FeatureSet {
    type Item = &'a Minutia;
    type IntoIter = std::slice::Iter<'a, Minutia>;

    fn into_iter(self) -> Self::IntoIter {
        self.minutiae.iter()
    }
}
