//! Shared types for the stitchpath pipeline.

use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::sample::SampleError;
use crate::stitcher::ShapeStitcherKind;

/// A 2D point (or displacement vector) in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position (grows downward, as in SVG user space).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Dot product with another vector.
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x.mul_add(other.x, self.y * other.y)
    }

    /// Squared Euclidean length.
    #[must_use]
    pub fn norm_squared(self) -> f64 {
        self.dot(self)
    }

    /// Euclidean length.
    #[must_use]
    pub fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Unit vector in the same direction, or `None` for the zero vector.
    #[must_use]
    pub fn normalized(self) -> Option<Self> {
        let len = self.norm();
        (len > 0.0 && len.is_finite()).then(|| self * (1.0 / len))
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        (self - other).norm_squared()
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Returns `true` when both coordinates are finite.
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Mul<Point> for f64 {
    type Output = Point;

    fn mul(self, rhs: Point) -> Point {
        rhs * self
    }
}

impl Neg for Point {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// A 2D affine transform `[a b c d e f]`.
///
/// Maps `(x, y)` to `(a*x + c*y + e, b*x + d*y + f)`, the same layout as
/// the SVG `matrix()` transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affine {
    /// Matrix coefficients `[a, b, c, d, e, f]`.
    pub coeffs: [f64; 6],
}

impl Affine {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        coeffs: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
    };

    /// Translation by `(dx, dy)`.
    #[must_use]
    pub const fn translate(dx: f64, dy: f64) -> Self {
        Self {
            coeffs: [1.0, 0.0, 0.0, 1.0, dx, dy],
        }
    }

    /// Non-uniform scale about the origin.
    #[must_use]
    pub const fn scale(sx: f64, sy: f64) -> Self {
        Self {
            coeffs: [sx, 0.0, 0.0, sy, 0.0, 0.0],
        }
    }

    /// Mirror about the x axis (`y -> -y`).
    ///
    /// Embroidery machines use a y-up coordinate system while vector
    /// sources are y-down.
    #[must_use]
    pub const fn flip_y() -> Self {
        Self::scale(1.0, -1.0)
    }

    /// Transform that applies `self` first, then `next`.
    #[must_use]
    pub fn then(self, next: Self) -> Self {
        let [a1, b1, c1, d1, e1, f1] = self.coeffs;
        let [a2, b2, c2, d2, e2, f2] = next.coeffs;
        Self {
            coeffs: [
                a2.mul_add(a1, c2 * b1),
                b2.mul_add(a1, d2 * b1),
                a2.mul_add(c1, c2 * d1),
                b2.mul_add(c1, d2 * d1),
                a2.mul_add(e1, c2.mul_add(f1, e2)),
                b2.mul_add(e1, d2.mul_add(f1, f2)),
            ],
        }
    }

    /// Apply the transform to a point.
    #[must_use]
    pub fn apply(self, p: Point) -> Point {
        let [a, b, c, d, e, f] = self.coeffs;
        Point::new(a.mul_add(p.x, c.mul_add(p.y, e)), b.mul_add(p.x, d.mul_add(p.y, f)))
    }
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// One continuous run of stitches with no jump inside it.
///
/// Directional: the first point is the front, the last point is the back.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StitchSegment(Vec<Point>);

impl StitchSegment {
    /// Create a new segment from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the segment has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of stitches in the segment.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the front (first) point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Point> {
        self.0.first()
    }

    /// Returns the back (last) point, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Point> {
        self.0.last()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Consumes the segment and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }

    /// The same stitches traversed back to front.
    #[must_use]
    pub fn reversed(mut self) -> Self {
        self.0.reverse();
        self
    }
}

/// Axis-aligned bounding box of a stitch set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Smallest x and y.
    pub min: Point,
    /// Largest x and y.
    pub max: Point,
}

impl Bounds {
    /// Bounding box of every point in `segments`, or `None` when there are
    /// no points.
    #[must_use]
    pub fn of(segments: &[StitchSegment]) -> Option<Self> {
        let mut points = segments.iter().flat_map(StitchSegment::points);
        let first = *points.next()?;
        Some(points.fold(
            Self {
                min: first,
                max: first,
            },
            |b, p| Self {
                min: Point::new(b.min.x.min(p.x), b.min.y.min(p.y)),
                max: Point::new(b.max.x.max(p.x), b.max.y.max(p.y)),
            },
        ))
    }

    /// Width of the box.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Height of the box.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

/// A stroked (and possibly filled) shape extracted from a vector source.
///
/// Each entry of `paths` is a flattened poly-Bézier: control points
/// `P0 P1 P2 P3 P4 P5 P6 ...` where consecutive cubic curves share their
/// end and start points, so a valid path has `3k + 1` points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// Source identifier (SVG `id`); some stitching strategies key on it.
    #[serde(default)]
    pub id: String,

    /// Hidden shapes are never stitched.
    #[serde(default = "default_visible")]
    pub visible: bool,

    /// Stroke width in millimetres, or `None` when the shape has no stroke.
    #[serde(default)]
    pub stroke_width: Option<f64>,

    /// Whether the shape has a fill paint.
    #[serde(default)]
    pub filled: bool,

    /// Poly-Bézier control point lists, one per sub-path.
    #[serde(default)]
    pub paths: Vec<Vec<Point>>,
}

const fn default_visible() -> bool {
    true
}

/// A straight wire between two points, as found in PCB wire lists.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wire {
    /// Start of the wire.
    pub from: Point,
    /// End of the wire.
    pub to: Point,
    /// `true` when `from` lands on a board/pad connection.
    #[serde(default)]
    pub from_pad: bool,
    /// `true` when `to` lands on a board/pad connection.
    #[serde(default)]
    pub to_pad: bool,
}

/// Already-extracted geometry handed to the pipeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeometryDocument {
    /// Vector shapes (stroked paths).
    #[serde(default)]
    pub shapes: Vec<Shape>,
    /// Straight wires with connectivity flags.
    #[serde(default)]
    pub wires: Vec<Wire>,
}

/// Configuration for the stitch pipeline.
///
/// Lengths are in millimetres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Target distance between consecutive stitches.
    pub pitch: f64,

    /// Diameter of junction markers (stars).
    pub star_size: f64,

    /// Strokes at least this wide are sewn as reinforced triple stitches.
    pub triple_stroke_width: f64,

    /// Number of sub-intervals in each curve's arc-length table.
    pub curve_segments: usize,

    /// Which shape stitching strategy to use.
    pub stitcher: ShapeStitcherKind,

    /// Reorder segments to minimise jumps. When `false` segments are
    /// emitted in input order.
    pub optimize_order: bool,
}

impl PipelineConfig {
    /// Default stitch pitch.
    pub const DEFAULT_PITCH: f64 = 2.0;
    /// Default junction marker diameter.
    pub const DEFAULT_STAR_SIZE: f64 = 2.0;
    /// Default stroke width threshold for triple stitching.
    pub const DEFAULT_TRIPLE_STROKE_WIDTH: f64 = 0.1;
    /// Default arc-length table resolution.
    pub const DEFAULT_CURVE_SEGMENTS: usize = 32;

    /// Check the invariants the pipeline relies on.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] when the pitch is not a
    /// positive finite number, the star size or triple threshold is
    /// negative or non-finite, or `curve_segments` is zero.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(self.pitch.is_finite() && self.pitch > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "pitch must be positive and finite, got {}",
                self.pitch
            )));
        }
        if !(self.star_size.is_finite() && self.star_size >= 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "star_size must be non-negative and finite, got {}",
                self.star_size
            )));
        }
        if !(self.triple_stroke_width.is_finite() && self.triple_stroke_width >= 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "triple_stroke_width must be non-negative and finite, got {}",
                self.triple_stroke_width
            )));
        }
        if self.curve_segments == 0 {
            return Err(PipelineError::InvalidConfig(
                "curve_segments must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            pitch: Self::DEFAULT_PITCH,
            star_size: Self::DEFAULT_STAR_SIZE,
            triple_stroke_width: Self::DEFAULT_TRIPLE_STROKE_WIDTH,
            curve_segments: Self::DEFAULT_CURVE_SEGMENTS,
            stitcher: ShapeStitcherKind::default(),
            optimize_order: true,
        }
    }
}

/// Result of running the full pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StitchResult {
    /// Ordered stitch segments; every boundary implies a trim and a jump.
    pub segments: Vec<StitchSegment>,

    /// Bounding box of all stitches.
    pub bounds: Bounds,
}

impl StitchResult {
    /// Total number of stitches across all segments.
    #[must_use]
    pub fn stitch_count(&self) -> usize {
        self.segments.iter().map(StitchSegment::len).sum()
    }
}

/// Errors that can occur during pipeline processing.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    /// A shape carried control points that do not form a poly-Bézier.
    #[error("malformed path in shape {shape:?}: {source}")]
    MalformedPath {
        /// Identifier of the offending shape.
        shape: String,
        /// What was wrong with the control points.
        #[source]
        source: SampleError,
    },

    /// The geometry produced no stitches.
    #[error("geometry produced no stitches")]
    NoStitches,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // --- Point tests ---

    #[test]
    fn point_arithmetic() {
        let a = Point::new(1.0, 2.0);
        let b = Point::new(3.0, -4.0);
        assert_eq!(a + b, Point::new(4.0, -2.0));
        assert_eq!(a - b, Point::new(-2.0, 6.0));
        assert_eq!(a * 2.0, Point::new(2.0, 4.0));
        assert_eq!(2.0 * a, Point::new(2.0, 4.0));
        assert_eq!(-a, Point::new(-1.0, -2.0));
    }

    #[test]
    fn point_dot_and_norm() {
        let a = Point::new(3.0, 4.0);
        assert!((a.dot(Point::new(1.0, 1.0)) - 7.0).abs() < f64::EPSILON);
        assert!((a.norm_squared() - 25.0).abs() < f64::EPSILON);
        assert!((a.norm() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn point_normalized() {
        let n = Point::new(3.0, 4.0).normalized().unwrap();
        assert!((n.norm() - 1.0).abs() < 1e-12);
        assert!((n.x - 0.6).abs() < 1e-12);
        assert!(Point::new(0.0, 0.0).normalized().is_none());
    }

    #[test]
    fn point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance_squared(b) - 25.0).abs() < f64::EPSILON);
        assert!((a.distance(b) - 5.0).abs() < f64::EPSILON);
    }

    // --- Affine tests ---

    #[test]
    fn affine_identity_is_noop() {
        let p = Point::new(1.5, -2.5);
        assert_eq!(Affine::IDENTITY.apply(p), p);
        assert_eq!(Affine::default(), Affine::IDENTITY);
    }

    #[test]
    fn affine_flip_y_negates_y() {
        assert_eq!(Affine::flip_y().apply(Point::new(2.0, 3.0)), Point::new(2.0, -3.0));
    }

    #[test]
    fn affine_then_applies_in_order() {
        // Scale by 2 then translate by (1, 0): (1, 1) -> (2, 2) -> (3, 2).
        let t = Affine::scale(2.0, 2.0).then(Affine::translate(1.0, 0.0));
        assert_eq!(t.apply(Point::new(1.0, 1.0)), Point::new(3.0, 2.0));

        // Reverse order: (1, 1) -> (2, 1) -> (4, 2).
        let t = Affine::translate(1.0, 0.0).then(Affine::scale(2.0, 2.0));
        assert_eq!(t.apply(Point::new(1.0, 1.0)), Point::new(4.0, 2.0));
    }

    // --- StitchSegment tests ---

    #[test]
    fn segment_front_and_back() {
        let s = StitchSegment::new(vec![
            Point::new(1.0, 2.0),
            Point::new(3.0, 4.0),
            Point::new(5.0, 6.0),
        ]);
        assert_eq!(s.len(), 3);
        assert_eq!(s.first(), Some(&Point::new(1.0, 2.0)));
        assert_eq!(s.last(), Some(&Point::new(5.0, 6.0)));

        let r = s.reversed();
        assert_eq!(r.first(), Some(&Point::new(5.0, 6.0)));
        assert_eq!(r.last(), Some(&Point::new(1.0, 2.0)));
    }

    #[test]
    fn segment_empty() {
        let s = StitchSegment::new(vec![]);
        assert!(s.is_empty());
        assert!(s.first().is_none());
        assert!(s.last().is_none());
    }

    // --- Bounds tests ---

    #[test]
    fn bounds_cover_all_points() {
        let segments = vec![
            StitchSegment::new(vec![Point::new(1.0, 5.0), Point::new(-2.0, 0.0)]),
            StitchSegment::new(vec![]),
            StitchSegment::new(vec![Point::new(4.0, -3.0)]),
        ];
        let b = Bounds::of(&segments).unwrap();
        assert_eq!(b.min, Point::new(-2.0, -3.0));
        assert_eq!(b.max, Point::new(4.0, 5.0));
        assert!((b.width() - 6.0).abs() < f64::EPSILON);
        assert!((b.height() - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn bounds_of_nothing_is_none() {
        assert!(Bounds::of(&[]).is_none());
        assert!(Bounds::of(&[StitchSegment::new(vec![])]).is_none());
    }

    // --- PipelineConfig tests ---

    #[test]
    fn pipeline_config_defaults() {
        let config = PipelineConfig::default();
        assert!((config.pitch - 2.0).abs() < f64::EPSILON);
        assert!((config.star_size - 2.0).abs() < f64::EPSILON);
        assert!((config.triple_stroke_width - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.curve_segments, 32);
        assert_eq!(config.stitcher, ShapeStitcherKind::Normal);
        assert!(config.optimize_order);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_non_positive_pitch() {
        for pitch in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = PipelineConfig {
                pitch,
                ..PipelineConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(PipelineError::InvalidConfig(_))),
                "pitch {pitch} should be rejected",
            );
        }
    }

    #[test]
    fn validate_rejects_zero_curve_segments() {
        let config = PipelineConfig {
            curve_segments: 0,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn validate_rejects_negative_star_size() {
        let config = PipelineConfig {
            star_size: -0.5,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn pipeline_config_partial_json_uses_defaults() {
        let config: PipelineConfig = serde_json::from_str(r#"{"pitch": 1.5}"#).unwrap();
        assert!((config.pitch - 1.5).abs() < f64::EPSILON);
        assert_eq!(config.curve_segments, PipelineConfig::DEFAULT_CURVE_SEGMENTS);
    }

    #[test]
    fn geometry_document_from_json() {
        let json = r#"{
            "shapes": [
                {"id": "wire1", "stroke_width": 0.5,
                 "paths": [[{"x":0,"y":0},{"x":1,"y":0},{"x":2,"y":0},{"x":3,"y":0}]]}
            ],
            "wires": [
                {"from": {"x":0,"y":0}, "to": {"x":5,"y":0}, "to_pad": true}
            ]
        }"#;
        let doc: GeometryDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.shapes.len(), 1);
        assert!(doc.shapes[0].visible);
        assert!(!doc.shapes[0].filled);
        assert_eq!(doc.shapes[0].paths[0].len(), 4);
        assert!(!doc.wires[0].from_pad);
        assert!(doc.wires[0].to_pad);
    }

    // --- PipelineError tests ---

    #[test]
    fn error_display() {
        assert_eq!(
            PipelineError::NoStitches.to_string(),
            "geometry produced no stitches"
        );
        assert_eq!(
            PipelineError::InvalidConfig("pitch".to_string()).to_string(),
            "invalid pipeline configuration: pitch",
        );
        let err = PipelineError::MalformedPath {
            shape: "path7".to_string(),
            source: SampleError::TooFewControlPoints(2),
        };
        assert!(err.to_string().contains("\"path7\""));
    }
}
