//! Connected-component labeling over a foreground mask.
//!
//! [`BlobSegmenter`] extracts blobs (maximal groups of foreground
//! pixels connected through the causal neighbourhood) in two passes:
//!
//! 1. A single forward raster scan assigns provisional labels from
//!    already-visited neighbours and feeds newly discovered label
//!    equivalences to an [`EquivalenceRegistry`].
//! 2. A consolidation pass collapses each equivalence class into one
//!    dense canonical label `1..=K`, rewriting the label grid and
//!    merging the per-label coordinate lists.
//!
//! One segmenter instance processes exactly one image. Blob queries are
//! rejected with [`SegmentError::NotSegmented`] until a full run has
//! completed.

use std::collections::BTreeSet;

use crate::equivalence::EquivalenceRegistry;
use crate::types::{BACKGROUND, Dimensions, ForegroundMask, Label, PixelCoord, Window, WindowSpec};

/// Errors surfaced by blob queries.
///
/// Both indicate caller misuse rather than transient conditions, and
/// neither is retried internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SegmentError {
    /// A blob query was made before segmentation completed.
    #[error("image has not been segmented before blob query")]
    NotSegmented,

    /// A blob query named a label outside the valid range.
    #[error("label {label} is not in valid range ({background} to {max})")]
    InvalidLabel {
        /// The offending label.
        label: Label,
        /// The current maximum canonical label.
        max: Label,
        /// The background sentinel, for a precise diagnostic.
        background: Label,
    },
}

/// Connected-component labeling engine for one image.
///
/// Owns the foreground mask, the label grid, the per-label coordinate
/// lists, and the equivalence partition exclusively; nothing is shared
/// between runs or instances. Re-running [`segment`](Self::segment)
/// rebuilds all state from scratch; runs do not compose.
#[derive(Debug, Clone)]
pub struct BlobSegmenter {
    mask: ForegroundMask,
    window: Window,
    labels: Vec<Label>,
    locations: Vec<Vec<PixelCoord>>,
    equivalences: EquivalenceRegistry,
    max_label: Option<Label>,
}

impl BlobSegmenter {
    /// Create a segmenter for `mask`, clamping the requested window to
    /// the mask extent.
    #[must_use]
    pub fn new(mask: ForegroundMask, window: WindowSpec) -> Self {
        let window = window.clamp(mask.dimensions());
        let area = mask.width() as usize * mask.height() as usize;
        Self {
            mask,
            window,
            labels: vec![BACKGROUND; area],
            locations: Vec::new(),
            equivalences: EquivalenceRegistry::new(),
            max_label: None,
        }
    }

    /// Run the full scan-and-consolidate pass.
    ///
    /// Visits the window pixels in column-major order (outer x, inner y)
    /// and runs to completion synchronously. After this returns, all
    /// blob queries succeed.
    pub fn segment(&mut self) {
        self.labels.fill(BACKGROUND);
        self.locations.clear();
        self.equivalences = EquivalenceRegistry::new();
        self.max_label = None;

        for x in self.window.x_min..self.window.x_max {
            for y in self.window.y_min..self.window.y_max {
                if self.mask.is_foreground(x, y) {
                    self.update_labels(x, y);
                }
            }
        }
        log::debug!(
            "forward scan: {} provisional labels, {} equivalence sets",
            self.locations.len(),
            self.equivalences.len(),
        );

        self.consolidate();
    }

    /// Label one foreground pixel from its causal neighbours.
    ///
    /// Inspects (x-1, y-1), (x-1, y), (x, y-1) and (x+1, y-1), each only
    /// if it lies inside the grid. The last of these sits ahead of the
    /// scan front in column-major order, so it reads background during a
    /// run; it is kept because the neighbourhood is defined this way.
    #[allow(clippy::cast_possible_truncation)]
    fn update_labels(&mut self, x: u32, y: u32) {
        let mut candidates = [BACKGROUND; 4];
        if x > 0 && y > 0 {
            candidates[0] = self.label_at(x - 1, y - 1);
        }
        if x > 0 {
            candidates[1] = self.label_at(x - 1, y);
        }
        if y > 0 {
            candidates[2] = self.label_at(x, y - 1);
        }
        if y > 0 && x + 1 < self.mask.width() {
            candidates[3] = self.label_at(x + 1, y - 1);
        }
        let neighbour_labels: BTreeSet<Label> = candidates
            .into_iter()
            .filter(|&label| label != BACKGROUND)
            .collect();

        let coord = PixelCoord::new(x, y);
        if let Some(&current) = neighbour_labels.last() {
            // Take the maximum neighbouring label; divergent numbering is
            // reconciled by the equivalence registry at consolidation.
            self.set_label(x, y, current);
            self.locations[(current - 1) as usize].push(coord);
            if neighbour_labels.len() > 1 {
                self.equivalences.insert_and_merge(neighbour_labels);
            }
        } else {
            // No labelled neighbours: open a fresh provisional label with
            // this pixel as its sole member.
            self.locations.push(vec![coord]);
            let label = self.locations.len() as Label;
            self.set_label(x, y, label);
        }
    }

    /// Collapse the equivalence partition into dense canonical labels.
    ///
    /// Provisional labels are visited in ascending order; each label not
    /// yet covered pulls its class from the registry (or forms a
    /// singleton class, since labels that never took part in a merge
    /// event have no registry entry) and receives the next canonical
    /// label. Class member coordinate lists are unioned in ascending
    /// member order and the grid is rewritten at those coordinates.
    #[allow(clippy::cast_possible_truncation)]
    fn consolidate(&mut self) {
        let provisional_count = self.locations.len() as Label;
        let mut canonical = vec![BACKGROUND; provisional_count as usize];
        let mut merged: Vec<Vec<PixelCoord>> = Vec::new();

        for provisional in 1..=provisional_count {
            if canonical[(provisional - 1) as usize] != BACKGROUND {
                continue;
            }
            let class = self
                .equivalences
                .take_class_of(provisional)
                .unwrap_or_else(|| BTreeSet::from([provisional]));
            let final_label = merged.len() as Label + 1;
            let mut coords = Vec::new();
            for &member in &class {
                canonical[(member - 1) as usize] = final_label;
                coords.append(&mut std::mem::take(
                    &mut self.locations[(member - 1) as usize],
                ));
            }
            merged.push(coords);
        }

        for (index, blob) in merged.iter().enumerate() {
            let final_label = index as Label + 1;
            for &coord in blob {
                self.set_label(coord.x, coord.y, final_label);
            }
        }

        log::debug!("consolidated into {} blobs", merged.len());
        self.locations = merged;
        self.max_label = Some(self.locations.len() as Label);
    }

    /// The label at `(x, y)`: provisional mid-scan, canonical after
    /// consolidation, [`BACKGROUND`] for unlabeled or out-of-range
    /// coordinates.
    #[must_use]
    pub fn label_at(&self, x: u32, y: u32) -> Label {
        if x < self.mask.width() && y < self.mask.height() {
            self.labels[y as usize * self.mask.width() as usize + x as usize]
        } else {
            BACKGROUND
        }
    }

    fn set_label(&mut self, x: u32, y: u32, label: Label) {
        self.labels[y as usize * self.mask.width() as usize + x as usize] = label;
    }

    /// Integer-truncated centroid of each blob, in final label order.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentError::NotSegmented`] before a completed run.
    pub fn centroids(&self) -> Result<Vec<PixelCoord>, SegmentError> {
        if self.max_label.is_none() {
            return Err(SegmentError::NotSegmented);
        }
        Ok(self.locations.iter().map(|blob| centroid(blob)).collect())
    }

    /// The number of blobs found (the maximum canonical label).
    ///
    /// # Errors
    ///
    /// Returns [`SegmentError::NotSegmented`] before a completed run.
    pub fn max_label(&self) -> Result<Label, SegmentError> {
        self.max_label.ok_or(SegmentError::NotSegmented)
    }

    /// The member coordinates of the blob with canonical `label`.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentError::NotSegmented`] before a completed run,
    /// and [`SegmentError::InvalidLabel`] when `label` is outside
    /// `1..=max_label`.
    pub fn blob(&self, label: Label) -> Result<&[PixelCoord], SegmentError> {
        let max = self.max_label.ok_or(SegmentError::NotSegmented)?;
        if label == BACKGROUND || label > max {
            return Err(SegmentError::InvalidLabel {
                label,
                max,
                background: BACKGROUND,
            });
        }
        Ok(&self.locations[(label - 1) as usize])
    }

    /// The clamped window actually scanned. Available regardless of
    /// segmentation state.
    #[must_use]
    pub const fn window(&self) -> Window {
        self.window
    }

    /// Dimensions of the underlying mask.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.mask.dimensions()
    }

    /// The foreground mask this segmenter owns.
    #[must_use]
    pub const fn mask(&self) -> &ForegroundMask {
        &self.mask
    }
}

/// Componentwise integer-truncated mean of the member coordinates.
#[allow(clippy::cast_possible_truncation)]
fn centroid(blob: &[PixelCoord]) -> PixelCoord {
    let count = blob.len().max(1) as u64;
    let (sum_x, sum_y) = blob.iter().fold((0u64, 0u64), |(sx, sy), coord| {
        (sx + u64::from(coord.x), sy + u64::from(coord.y))
    });
    PixelCoord::new((sum_x / count) as u32, (sum_y / count) as u32)
}
