//! speck-export: Pure result-record serializers (sans-IO)
//!
//! Converts per-image segmentation results into output records.
//! Currently supports JSON lines.

pub mod report;

pub use report::{ImageRecord, to_json_line};
