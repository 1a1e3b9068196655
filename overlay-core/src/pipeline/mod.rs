//! Stateful cross-frame orchestration.
//!
//! The transform core is stateless per call; the per-session policy that the
//! surrounding capture loop needs (first-frame skip, duplicate-scan
//! suppression, redundant re-render suppression) lives here as an explicit
//! state struct, [`ScanPipeline`], owned by the caller and threaded through
//! invocations. Frame-rate throttling and cancellation stay with the caller.

use tracing::debug;

use crate::geometry::Size;
use crate::highlight::{CodeDetection, FrameGeometry, Highlight, HighlightMapper};

/// When the scan callback should fire for a non-empty detection batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    /// Fire for every non-empty batch.
    #[default]
    Continuous,
    /// Fire only when the batch's value sequence differs from the last
    /// non-empty batch.
    Once,
}

/// Session policy knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub mode: ScanMode,
    /// Skip the first frame's highlight pass. Some capture layers report the
    /// first frame with width and height inverted; until device telemetry
    /// settles how widespread that is, the skip stays on by default and
    /// remains overridable.
    pub skip_first_frame: bool,
    /// Compute highlight sets at all. Scan-callback behavior is unaffected.
    pub highlighting: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            mode: ScanMode::Continuous,
            skip_first_frame: true,
            highlighting: true,
        }
    }
}

/// What the caller should do after one frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameUpdate {
    /// New highlight set, present only when the overlay should re-render.
    pub highlights: Option<Vec<Highlight>>,
    /// Whether the scan callback should fire for this batch.
    pub emit_scan: bool,
}

/// Per-session state machine wrapping a [`HighlightMapper`].
#[derive(Debug, Clone)]
pub struct ScanPipeline {
    mapper: HighlightMapper,
    options: PipelineOptions,
    /// True until the first frame has been seen.
    pristine: bool,
    /// Highlight count emitted last, for re-render suppression.
    last_highlight_count: usize,
    /// Values of the last non-empty batch, for once-mode change detection.
    last_values: Vec<String>,
}

impl ScanPipeline {
    pub fn new(mapper: HighlightMapper, options: PipelineOptions) -> Self {
        Self {
            mapper,
            options,
            pristine: true,
            last_highlight_count: 0,
            last_values: Vec::new(),
        }
    }

    /// Feed in one frame's detections. Returns the highlight set to render
    /// (when it changed) and whether the scan callback should fire.
    pub fn process_frame(
        &mut self,
        detections: &[CodeDetection],
        frame: FrameGeometry,
        viewport: Size,
    ) -> FrameUpdate {
        let emit_scan = !detections.is_empty()
            && match self.options.mode {
                ScanMode::Continuous => true,
                ScanMode::Once => self.values_changed(detections),
            };

        if !detections.is_empty() {
            self.last_values.clear();
            self.last_values
                .extend(detections.iter().map(|d| d.value.clone()));
        }

        if !self.options.highlighting {
            return FrameUpdate {
                highlights: None,
                emit_scan,
            };
        }

        if self.pristine {
            self.pristine = false;
            if self.options.skip_first_frame {
                debug!("first frame, skipping highlight pass");
                return FrameUpdate {
                    highlights: None,
                    emit_scan,
                };
            }
        }

        let highlights = self.mapper.compute(detections, frame, viewport);

        // Spare consumers a re-render while the set stays empty.
        if self.last_highlight_count == 0 && highlights.is_empty() {
            return FrameUpdate {
                highlights: None,
                emit_scan,
            };
        }

        self.last_highlight_count = highlights.len();
        debug!(count = self.last_highlight_count, "highlight set updated");
        FrameUpdate {
            highlights: Some(highlights),
            emit_scan,
        }
    }

    /// Return to the initial state (component remount, camera restart).
    pub fn reset(&mut self) {
        self.pristine = true;
        self.last_highlight_count = 0;
        self.last_values.clear();
    }

    fn values_changed(&self, detections: &[CodeDetection]) -> bool {
        self.last_values.len() != detections.len()
            || !self
                .last_values
                .iter()
                .zip(detections)
                .all(|(last, detection)| *last == detection.value)
    }
}

impl Default for ScanPipeline {
    fn default() -> Self {
        Self::new(HighlightMapper::default(), PipelineOptions::default())
    }
}
