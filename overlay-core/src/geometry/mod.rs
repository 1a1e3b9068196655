//! Pure transform stages between sensor-frame and viewport pixel space.
//!
//! Three stages position a highlight over a scanned code:
//!
//! 1. **Scale** ([`scale_point`]) maps a sensor-frame point into viewport
//!    space under a [`FillPolicy`].
//! 2. **Rotate** ([`rotate_point`]) remaps the scaled point into the
//!    viewport's visual frame of reference for the sensor [`Orientation`].
//! 3. **Reduce** ([`bounding_box`]) collapses the transformed corner polygon
//!    to an axis-aligned rectangle.
//!
//! Every function here is pure and infallible: bad input degrades to a
//! best-effort value instead of an error, because these run on the hot
//! per-frame path where a panic would take down a live camera overlay.

use serde::{Deserialize, Serialize};

// ── Value types ──────────────────────────────────────────────────────────────

/// A 2D point, unitless pixels in either sensor-frame or viewport space.
///
/// The two spaces are never mixed without an explicit transform step.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Width/height pair. `(0, 0)` is the valid "not yet measured" sentinel
/// reported by a viewport before its first layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// The same extent with its axes exchanged.
    pub fn swapped(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }

    /// True when either axis is zero (the unmeasured-viewport sentinel).
    pub fn is_zero(&self) -> bool {
        self.width == 0.0 || self.height == 0.0
    }

    /// True when both axes are strictly positive and finite.
    pub fn is_positive(&self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }
}

/// Axis-aligned rectangle, top-left origin, viewport space only.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True when the rectangle has no area. Consumers decide whether such
    /// highlights are worth drawing.
    pub fn is_empty(&self) -> bool {
        self.width == 0.0 || self.height == 0.0
    }
}

// ── Orientation ──────────────────────────────────────────────────────────────

/// Sensor mounting rotation relative to the display's "up" direction.
///
/// Tags match the capture API's wire strings; anything else deserializes to
/// [`Orientation::Unknown`], which the transform treats as identity so a
/// missing orientation degrades to "no rotation" rather than a crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", from = "String")]
pub enum Orientation {
    #[default]
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
    Unknown,
}

impl From<String> for Orientation {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "portrait" => Self::Portrait,
            "portrait-upside-down" => Self::PortraitUpsideDown,
            "landscape-left" => Self::LandscapeLeft,
            "landscape-right" => Self::LandscapeRight,
            _ => Self::Unknown,
        }
    }
}

impl Orientation {
    pub fn is_landscape(self) -> bool {
        matches!(self, Self::LandscapeLeft | Self::LandscapeRight)
    }
}

// ── Fill policy ──────────────────────────────────────────────────────────────

/// How a source frame of one aspect ratio maps onto a viewport of a possibly
/// different aspect ratio.
///
/// Each variant is a pure scale-factor rule; the per-policy math lives in
/// [`FillPolicy::scale_factors`] and nowhere else. An unrecognized wire tag
/// deserializes to the default, `Cover`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", from = "String")]
pub enum FillPolicy {
    /// Uniform scale, crop overflow, no letterboxing.
    #[default]
    Cover,
    /// Uniform scale, letterbox underflow.
    Contain,
    /// Independent per-axis scale, aspect ratio not preserved.
    Stretch,
}

impl From<String> for FillPolicy {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "contain" => Self::Contain,
            "stretch" => Self::Stretch,
            _ => Self::Cover,
        }
    }
}

impl FillPolicy {
    /// Per-axis factors mapping a frame of `frame` pixels onto `viewport`.
    ///
    /// Caller guarantees both sizes are strictly positive.
    pub fn scale_factors(self, frame: Size, viewport: Size) -> (f32, f32) {
        let rx = viewport.width / frame.width;
        let ry = viewport.height / frame.height;
        match self {
            Self::Cover => {
                let s = rx.max(ry);
                (s, s)
            }
            Self::Contain => {
                let s = rx.min(ry);
                (s, s)
            }
            Self::Stretch => (rx, ry),
        }
    }
}

// ── Transform stages ─────────────────────────────────────────────────────────

/// Map `point` from sensor-frame space into viewport space under `policy`.
///
/// Non-positive `frame` or `viewport` returns the point unscaled, a
/// degenerate but non-crashing fallback.
pub fn scale_point(point: Point, frame: Size, viewport: Size, policy: FillPolicy) -> Point {
    if !frame.is_positive() || !viewport.is_positive() {
        return point;
    }
    let (sx, sy) = policy.scale_factors(frame, viewport);
    Point {
        x: point.x * sx,
        y: point.y * sy,
    }
}

/// Remap a scaled point into the viewport's visual frame of reference.
///
/// `reference` is the layout-adjusted viewport extent acting as the rotation
/// pivot. The four known orientations are exhaustive; `Unknown` is identity.
pub fn rotate_point(point: Point, reference: Size, orientation: Orientation) -> Point {
    match orientation {
        Orientation::Portrait | Orientation::Unknown => point,
        Orientation::PortraitUpsideDown => Point {
            x: reference.width - point.x,
            y: reference.height - point.y,
        },
        Orientation::LandscapeLeft => Point {
            x: point.y,
            y: reference.width - point.x,
        },
        Orientation::LandscapeRight => Point {
            x: reference.height - point.y,
            y: point.x,
        },
    }
}

/// Reduce an already-transformed corner polygon to its axis-aligned bounds.
///
/// Degenerate input (fewer than 3 distinct points, or a NaN coordinate)
/// yields a zero-size rectangle at the first point; an empty slice yields a
/// zero rectangle at the origin.
pub fn bounding_box(points: &[Point]) -> Rect {
    let Some(&first) = points.first() else {
        return Rect::default();
    };

    if points.iter().any(|p| p.x.is_nan() || p.y.is_nan()) || distinct_points(points) < 3 {
        return Rect::new(first.x, first.y, 0.0, 0.0);
    }

    let mut min_x = first.x;
    let mut min_y = first.y;
    let mut max_x = first.x;
    let mut max_y = first.y;
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
}

/// Number of pairwise-distinct points. Quadratic, but corner polygons have
/// four vertices.
fn distinct_points(points: &[Point]) -> usize {
    let mut count = 0;
    for (i, p) in points.iter().enumerate() {
        if points[..i].iter().all(|q| q != p) {
            count += 1;
        }
    }
    count
}
