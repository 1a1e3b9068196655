//! overlay-core maps detected-code corner geometry from a camera sensor's
//! frame coordinate space into the coordinate space of an on-screen display
//! surface, so highlight overlays line up with the physical object.
//!
//! The stages, leaves first:
//!
//! 1. **Geometry** - pure scale (fill policy), rotate (sensor orientation),
//!    and bounding-box reduction over corner polygons.
//! 2. **Layout** - the device-class axis-swap quirk as an injected rule
//!    table.
//! 3. **Highlight** - per-frame composition of the stages into one
//!    [`highlight::Highlight`] per detection.
//! 4. **Pipeline** - the stateful cross-frame session policy (first-frame
//!    skip, scan-callback dedup, re-render suppression).
//!
//! Everything below the pipeline is pure and infallible; this crate defines
//! no error type. Capture, native detection, frame scheduling, and drawing
//! belong to the callers on either side.

pub mod geometry;
pub mod highlight;
pub mod layout;
pub mod pipeline;

pub use geometry::{FillPolicy, Orientation, Point, Rect, Size};
pub use highlight::{CodeDetection, FrameGeometry, Highlight, HighlightMapper};
pub use layout::{AxisRule, DeviceClass, LayoutTable, OrientationClass};
pub use pipeline::{FrameUpdate, PipelineOptions, ScanMode, ScanPipeline};
