//! JSON-lines report records.
//!
//! One [`ImageRecord`] is produced per analysed image and serialized as
//! a single JSON line, so a batch run appends an easily greppable,
//! machine-parseable stream. This is a pure function with no I/O -- it
//! returns a `String`.

use serde::{Deserialize, Serialize};

use speck_pipeline::{Label, PixelCoord, ProcessResult, Window};

/// The per-image result record written to the dump file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Path of the analysed image, as given to the crawler.
    pub original_file: String,

    /// Filename of the overlay image, when one was written.
    pub segmented_file: Option<String>,

    /// Source image extent as `(width, height)`.
    pub image_size: (u32, u32),

    /// The clamped scan window actually used.
    pub window: Window,

    /// Total number of blobs found.
    pub blob_count: Label,

    /// One centroid per blob, in final label order.
    pub centroids: Vec<PixelCoord>,
}

impl ImageRecord {
    /// Build a record from a pipeline result.
    #[must_use]
    pub fn from_result(
        original_file: String,
        segmented_file: Option<String>,
        result: &ProcessResult,
    ) -> Self {
        Self {
            original_file,
            segmented_file,
            image_size: (result.dimensions.width, result.dimensions.height),
            window: result.window,
            blob_count: result.blob_count,
            centroids: result.centroids.clone(),
        }
    }
}

/// Serialize a record as one JSON line (no trailing newline).
///
/// # Errors
///
/// Returns a [`serde_json::Error`] if serialization fails; with this
/// record shape that does not happen in practice, but the signature
/// keeps the caller honest about handling it.
pub fn to_json_line(record: &ImageRecord) -> Result<String, serde_json::Error> {
    serde_json::to_string(record)
}
