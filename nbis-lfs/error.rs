use nbis_core::NbisError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectError {
    #[error("Invalid detector parameters: {0}")]
    InvalidParams(String),

    #[error("Image {width}x{height} too small (minimum {min_size}x{min_size})")]
    ImageTooSmall {
        width: usize,
        height: usize,
        min_size: usize,
    },

    #[error("Invalid resolution: {0} ppi")]
    InvalidResolution(u32),
}

impl DetectError {
    /// Negative status code reported across the detector boundary.
    pub fn status(&self) -> i32 {
        match self {
            DetectError::InvalidParams(_) => -1,
            DetectError::ImageTooSmall { .. } => -2,
            DetectError::InvalidResolution(_) => -3,
        }
    }
}

impl From<DetectError> for NbisError {
    fn from(err: DetectError) -> Self {
        NbisError::DetectionFailed {
            role: None,
            status: err.status(),
        }
    }
}

pub type DetectResult<T> = Result<T, DetectError>;
