use crate::error::{NbisError, NbisResult};

/// Scan resolution assumed when the caller cannot supply one.
///
/// Feature-size heuristics in detection and quality assessment are calibrated
/// for this value; results computed under a mismatched assumption are unreliable.
pub const DEFAULT_PPI: u32 = 500;

/// Row-major 8-bit single-channel fingerprint image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayImage {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl GrayImage {
    /// Wrap raw grayscale pixels, validating dimensions against the buffer length.
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> NbisResult<Self> {
        if width == 0 || height == 0 {
            return Err(NbisError::InvalidInput(format!(
                "image dimensions must be > 0, got {}x{}",
                width, height
            )));
        }
        let expected = width * height;
        if data.len() != expected {
            return Err(NbisError::InvalidInput(format!(
                "image data length mismatch: expected {}, got {}",
                expected,
                data.len()
            )));
        }
        Ok(Self { width, height, data })
    }

    /// Accept an interleaved buffer only when it carries exactly one channel.
    ///
    /// Multi-channel input is rejected rather than averaged or reduced to
    /// channel 0.
    pub fn from_interleaved(
        width: usize,
        height: usize,
        channels: usize,
        data: Vec<u8>,
    ) -> NbisResult<Self> {
        if channels != 1 {
            return Err(NbisError::InvalidInput(format!(
                "image must be 2D grayscale, got {} channels (color images not supported, use grayscale)",
                channels
            )));
        }
        Self::new(width, height, data)
    }

    /// Uniform image, mostly useful for tests and demos.
    pub fn blank(width: usize, height: usize, value: u8) -> NbisResult<Self> {
        Self::new(width, height, vec![value; width * height])
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    /// Clamped pixel access for neighbourhood sampling near the border.
    #[inline]
    pub fn get_clamped(&self, x: i64, y: i64) -> u8 {
        let xx = x.clamp(0, self.width as i64 - 1) as usize;
        let yy = y.clamp(0, self.height as i64 - 1) as usize;
        self.data[yy * self.width + xx]
    }
}

impl From<image::GrayImage> for GrayImage {
    fn from(img: image::GrayImage) -> Self {
        let (w, h) = img.dimensions();
        Self {
            width: w as usize,
            height: h as usize,
            data: img.into_raw(),
        }
    }
}

impl TryFrom<image::DynamicImage> for GrayImage {
    type Error = NbisError;

    fn try_from(img: image::DynamicImage) -> NbisResult<Self> {
        match img {
            image::DynamicImage::ImageLuma8(gray) => Ok(gray.into()),
            other => Err(NbisError::InvalidInput(format!(
                "image must be 8-bit grayscale, got {:?}",
                other.color()
            ))),
        }
    }
}

impl From<&GrayImage> for image::GrayImage {
    fn from(img: &GrayImage) -> Self {
        image::GrayImage::from_raw(img.width as u32, img.height as u32, img.data.clone())
            .unwrap_or_else(|| image::GrayImage::new(img.width as u32, img.height as u32))
    }
}
