// THEORY:
// Errors in this engine fall into two groups. Input problems (a payload that
// will not decode, a buffer of the wrong size, a grid at the wrong resolution)
// stop the analysis of a single capture. Fusion problems (no usable sky at all)
// stop the whole attempt. A photo that decodes fine but does not show open sky
// is NOT an error: it is reported through `SkyAnalysisResult::is_valid_sky` so
// the caller can decide whether to ask for a recapture.

use crate::core_modules::direction::Direction;
use thiserror::Error;

/// Result type for every fallible operation in the engine.
pub type Result<T> = std::result::Result<T, SkyError>;

#[derive(Error, Debug)]
pub enum SkyError {
    /// The external decoder could not turn the payload into pixels.
    #[error("failed to decode image payload: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The decoded image has no pixels to sample.
    #[error("image has zero width or height")]
    EmptyImage,

    /// A raw pixel buffer does not match its declared dimensions.
    #[error("malformed pixel buffer: expected {expected} bytes, got {actual}")]
    MalformedBuffer { expected: usize, actual: usize },

    /// A grid reached the analysis stages at a non-canonical resolution.
    #[error(
        "pixel grid is {actual_width}x{actual_height}, \
         expected {expected_width}x{expected_height}"
    )]
    GridDimensionMismatch {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    /// Fusion was asked to run with zero valid sky readings.
    #[error("no valid sky data: every capture was rejected or failed validation")]
    NoValidSkyData,

    #[error("direction {0} was captured more than once")]
    DuplicateDirection(Direction),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An analysis worker disappeared before reporting back.
    #[error("analysis worker failed: {0}")]
    WorkerFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
