//! Per-frame highlight computation.
//!
//! [`HighlightMapper`] composes the transform stages over every detection in
//! a frame: adjust the viewport (layout table), scale each corner point
//! (fill policy), rotate it (sensor orientation), reduce the polygon to an
//! axis-aligned rectangle, and tag it with a batch-stable key.
//!
//! The mapper is pure configuration; it holds no per-frame state and may be
//! shared freely across threads.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::geometry::{
    bounding_box, rotate_point, scale_point, FillPolicy, Orientation, Point, Rect, Size,
};
use crate::layout::{DeviceClass, LayoutTable};

// ── Wire types ───────────────────────────────────────────────────────────────

/// Sensor-frame descriptor as serialized out of the capture layer: raw
/// dimensions plus the orientation tag in effect for this frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameGeometry {
    pub width: f32,
    pub height: f32,
    pub orientation: Orientation,
}

impl FrameGeometry {
    pub fn new(width: f32, height: f32, orientation: Orientation) -> Self {
        Self {
            width,
            height,
            orientation,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// One detected code as supplied by the detection source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeDetection {
    /// Decoded payload, treated as opaque.
    pub value: String,
    /// Corner polygon in sensor-frame pixels, in detection order. The order
    /// is preserved through the transform, never re-wound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corner_points: Option<Vec<Point>>,
}

impl CodeDetection {
    pub fn new(value: impl Into<String>, corner_points: [Point; 4]) -> Self {
        Self {
            value: value.into(),
            corner_points: Some(corner_points.to_vec()),
        }
    }
}

/// A renderable highlight: one axis-aligned rectangle per valid detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    /// `"<value>.<index>"` where `index` is the detection's position in the
    /// input batch. Stable within one frame, not across frames.
    pub key: String,
    /// Echo of the decoded payload.
    pub value: String,
    pub rect: Rect,
}

// ── Mapper ───────────────────────────────────────────────────────────────────

/// Maps a batch of detections into viewport-space highlights.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HighlightMapper {
    pub fill_policy: FillPolicy,
    pub device_class: DeviceClass,
    pub layout: LayoutTable,
}

impl HighlightMapper {
    pub fn new(fill_policy: FillPolicy, device_class: DeviceClass) -> Self {
        Self {
            fill_policy,
            device_class,
            layout: LayoutTable::default(),
        }
    }

    /// Compute one highlight per detection carrying four corner points.
    ///
    /// An unmeasured viewport or a zero-area frame yields an empty set;
    /// detections with missing or non-quad corner data are skipped. Output
    /// order follows input order.
    pub fn compute(
        &self,
        detections: &[CodeDetection],
        frame: FrameGeometry,
        viewport: Size,
    ) -> Vec<Highlight> {
        // The viewport reports (0, 0) until its first layout pass.
        if viewport.is_zero() || frame.size().is_zero() {
            trace!(?viewport, "viewport or frame not measurable, no highlights");
            return Vec::new();
        }

        let reference = self
            .layout
            .adjust_viewport(viewport, self.device_class, frame.orientation);

        detections
            .iter()
            .enumerate()
            .filter_map(|(index, detection)| {
                let corners = match detection.corner_points.as_deref() {
                    Some(corners) if corners.len() == 4 => corners,
                    _ => {
                        trace!(index, value = %detection.value, "skipping detection without a corner quad");
                        return None;
                    }
                };

                let transformed: Vec<Point> = corners
                    .iter()
                    .map(|&corner| {
                        let scaled =
                            scale_point(corner, frame.size(), reference, self.fill_policy);
                        rotate_point(scaled, reference, frame.orientation)
                    })
                    .collect();

                Some(Highlight {
                    key: format!("{}.{}", detection.value, index),
                    value: detection.value.clone(),
                    rect: bounding_box(&transformed),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quad(x: f32, y: f32, w: f32, h: f32) -> [Point; 4] {
        [
            Point::new(x, y),
            Point::new(x + w, y),
            Point::new(x + w, y + h),
            Point::new(x, y + h),
        ]
    }

    #[test]
    fn zero_viewport_short_circuits() {
        let mapper = HighlightMapper::default();
        let frame = FrameGeometry::new(1280.0, 720.0, Orientation::Portrait);
        let detections = vec![CodeDetection::new("ABC", quad(10.0, 10.0, 50.0, 50.0))];
        assert!(mapper
            .compute(&detections, frame, Size::default())
            .is_empty());
        assert!(mapper
            .compute(&detections, frame, Size::new(100.0, 0.0))
            .is_empty());
    }

    #[test]
    fn zero_frame_short_circuits() {
        let mapper = HighlightMapper::default();
        let frame = FrameGeometry::new(0.0, 720.0, Orientation::Portrait);
        let detections = vec![CodeDetection::new("ABC", quad(10.0, 10.0, 50.0, 50.0))];
        assert!(mapper
            .compute(&detections, frame, Size::new(360.0, 640.0))
            .is_empty());
    }

    #[test]
    fn phone_landscape_uses_the_swapped_viewport() {
        // Frame 800x600, viewport 600x800: the reference for a phone is the
        // swapped viewport 800x600, so cover scale is exactly 1 and only the
        // rotation moves the corners.
        let mapper = HighlightMapper::new(FillPolicy::Cover, DeviceClass::Phone);
        let frame = FrameGeometry::new(800.0, 600.0, Orientation::LandscapeLeft);
        let detections = vec![CodeDetection::new("QR", quad(100.0, 100.0, 100.0, 100.0))];

        let highlights = mapper.compute(&detections, frame, Size::new(600.0, 800.0));
        assert_eq!(1, highlights.len());
        assert_eq!(Rect::new(100.0, 600.0, 100.0, 100.0), highlights[0].rect);
    }

    #[test]
    fn large_tablet_landscape_uses_the_viewport_as_is() {
        // Same inputs as above on a large tablet: reference stays 600x800,
        // cover scale becomes 800/600 and the corners land elsewhere.
        let mapper = HighlightMapper::new(FillPolicy::Cover, DeviceClass::LargeTablet);
        let frame = FrameGeometry::new(800.0, 600.0, Orientation::LandscapeLeft);
        let detections = vec![CodeDetection::new("QR", quad(100.0, 100.0, 100.0, 100.0))];

        let highlights = mapper.compute(&detections, frame, Size::new(600.0, 800.0));
        assert_eq!(1, highlights.len());
        let rect = highlights[0].rect;
        let s = 800.0 / 600.0;
        assert_relative_eq!(rect.x, 100.0 * s, epsilon = 1e-3);
        assert_relative_eq!(rect.y, 600.0 - 200.0 * s, epsilon = 1e-3);
        assert_relative_eq!(rect.width, 100.0 * s, epsilon = 1e-3);
        assert_relative_eq!(rect.height, 100.0 * s, epsilon = 1e-3);
    }

    #[test]
    fn duplicate_values_get_distinct_keys() {
        let mapper = HighlightMapper::default();
        let frame = FrameGeometry::new(640.0, 480.0, Orientation::Portrait);
        let detections = vec![
            CodeDetection::new("ABC", quad(0.0, 0.0, 10.0, 10.0)),
            CodeDetection::new("ABC", quad(100.0, 100.0, 10.0, 10.0)),
        ];

        let highlights = mapper.compute(&detections, frame, Size::new(480.0, 640.0));
        assert_eq!(
            vec!["ABC.0", "ABC.1"],
            highlights.iter().map(|h| h.key.as_str()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn detections_without_corners_are_skipped_not_fatal() {
        let mapper = HighlightMapper::default();
        let frame = FrameGeometry::new(640.0, 480.0, Orientation::Portrait);
        let detections = vec![
            CodeDetection {
                value: "missing".into(),
                corner_points: None,
            },
            CodeDetection::new("ok", quad(10.0, 10.0, 20.0, 20.0)),
            CodeDetection {
                value: "triangle".into(),
                corner_points: Some(vec![
                    Point::new(0.0, 0.0),
                    Point::new(1.0, 0.0),
                    Point::new(0.0, 1.0),
                ]),
            },
        ];

        let highlights = mapper.compute(&detections, frame, Size::new(480.0, 640.0));
        assert_eq!(1, highlights.len());
        assert_eq!("ok", highlights[0].value);
        // The skipped detection still consumed its batch index.
        assert_eq!("ok.1", highlights[0].key);
    }

    #[test]
    fn compute_is_deterministic() {
        let mapper = HighlightMapper::new(FillPolicy::Cover, DeviceClass::Phone);
        let frame = FrameGeometry::new(1920.0, 1080.0, Orientation::LandscapeRight);
        let viewport = Size::new(393.0, 852.0);
        let detections = vec![CodeDetection::new("ean-13", quad(503.7, 221.1, 311.9, 98.4))];

        let first = mapper.compute(&detections, frame, viewport);
        for _ in 0..8 {
            assert_eq!(first, mapper.compute(&detections, frame, viewport));
        }
    }

    #[test]
    fn degenerate_quads_yield_zero_size_highlights() {
        // A collapsed quad still produces a highlight; consumers decide
        // whether to draw zero-size rectangles.
        let mapper = HighlightMapper::default();
        let frame = FrameGeometry::new(100.0, 100.0, Orientation::Portrait);
        let p = Point::new(50.0, 50.0);
        let detections = vec![CodeDetection::new("dot", [p, p, p, p])];

        let highlights = mapper.compute(&detections, frame, Size::new(100.0, 100.0));
        assert_eq!(1, highlights.len());
        assert!(highlights[0].rect.is_empty());
    }
}
