use serde::{Deserialize, Serialize};

/// Best (1) to worst (5) quality class scale.
pub const BEST_QUALITY: u8 = 1;
pub const WORST_QUALITY: u8 = 5;

/// Quality class reported for a blank image.
pub const EMPTY_IMG_QUALITY: u8 = WORST_QUALITY;
pub const EMPTY_IMG_QUALITY_CONF: f32 = 1.0;
/// Quality class reported when too few minutiae were found.
pub const TOO_FEW_MINUTIAE_QUALITY: u8 = WORST_QUALITY;
pub const TOO_FEW_MINUTIAE_QUALITY_CONF: f32 = 1.0;

/// Non-negative quality status. Negative statuses are internal failures and
/// surface as `NbisError::QualityInternalError` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityStatus {
    Success,
    EmptyImage,
    TooFewMinutiae,
}

impl QualityStatus {
    pub fn code(self) -> i32 {
        match self {
            QualityStatus::Success => 0,
            QualityStatus::EmptyImage => 1,
            QualityStatus::TooFewMinutiae => 2,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(QualityStatus::Success),
            1 => Some(QualityStatus::EmptyImage),
            2 => Some(QualityStatus::TooFewMinutiae),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityResult {
    /// Quality class, 1 (best) ..= 5 (worst).
    pub quality: u8,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
    pub status: QualityStatus,
}

impl QualityResult {
    pub fn empty_image() -> Self {
        Self {
            quality: EMPTY_IMG_QUALITY,
            confidence: EMPTY_IMG_QUALITY_CONF,
            status: QualityStatus::EmptyImage,
        }
    }

    pub fn too_few_minutiae() -> Self {
        Self {
            quality: TOO_FEW_MINUTIAE_QUALITY,
            confidence: TOO_FEW_MINUTIAE_QUALITY_CONF,
            status: QualityStatus::TooFewMinutiae,
        }
    }

    /// Raw status code (0 success, positive degenerate condition).
    pub fn return_code(&self) -> i32 {
        self.status.code()
    }

    /// A recognised degenerate condition; the class is meaningful but low-confidence.
    pub fn is_degenerate(&self) -> bool {
        self.status != QualityStatus::Success
    }

    pub fn description(&self) -> &'static str {
        match self.quality {
            1 => "Excellent",
            2 => "Very Good",
            3 => "Good",
            4 => "Fair",
            5 => "Poor",
            _ => "Unknown",
        }
    }
}

impl std::fmt::Display for QualityResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Quality: {}/5 ({}), Confidence: {:.3}",
            self.quality,
            self.description(),
            self.confidence
        )
    }
}
